// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! SQLite-backed transaction and category store.
//!
//! Amounts are persisted as decimal strings and decoded into [`Decimal`] on
//! read; SQLite never does arithmetic on them.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{Category, NewTransaction, Transaction, TransactionPage, TxType};

pub const DEFAULT_PAGE_SIZE: u32 = 20;

const CREATED_AT_FMT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const TX_SELECT: &str = "SELECT t.id, t.amount, t.type, t.category_id, c.name, c.type, t.date, t.note, t.created_at
     FROM transactions t JOIN categories c ON t.category_id=c.id";

/// Range-filtered reads consumed by the aggregation service.
pub trait TransactionStore {
    /// All transactions with `start <= date < end`, optionally restricted to one type,
    /// ordered by date, creation time and id ascending.
    fn transactions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        kind: Option<TxType>,
    ) -> Result<Vec<Transaction>>;
}

impl TransactionStore for Connection {
    fn transactions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        kind: Option<TxType>,
    ) -> Result<Vec<Transaction>> {
        let mut sql = format!("{} WHERE t.date >= ?1 AND t.date < ?2", TX_SELECT);
        let mut args = vec![Value::Text(start.to_string()), Value::Text(end.to_string())];
        if let Some(k) = kind {
            sql.push_str(" AND t.type = ?3");
            args.push(Value::Text(k.as_str().to_string()));
        }
        sql.push_str(" ORDER BY t.date, t.created_at, t.id");

        let mut stmt = self.prepare(&sql)?;
        let raws = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), raw_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(%start, %end, ?kind, rows = raws.len(), "range read");
        raws.into_iter().map(RawRow::decode).collect()
    }
}

struct RawRow {
    id: i64,
    amount: String,
    r#type: String,
    category_id: i64,
    category_name: String,
    category_type: String,
    date: String,
    note: Option<String>,
    created_at: String,
}

fn raw_row(r: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: r.get(0)?,
        amount: r.get(1)?,
        r#type: r.get(2)?,
        category_id: r.get(3)?,
        category_name: r.get(4)?,
        category_type: r.get(5)?,
        date: r.get(6)?,
        note: r.get(7)?,
        created_at: r.get(8)?,
    })
}

fn decode_type(s: &str, what: &str) -> Result<TxType> {
    s.parse::<TxType>()
        .map_err(|_| Error::Corrupt(format!("invalid type '{}' on {}", s, what)))
}

impl RawRow {
    fn decode(self) -> Result<Transaction> {
        let what = format!("transaction {}", self.id);
        let amount = self
            .amount
            .parse::<Decimal>()
            .map_err(|_| Error::Corrupt(format!("invalid amount '{}' on {}", self.amount, what)))?;
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|_| Error::Corrupt(format!("invalid date '{}' on {}", self.date, what)))?;
        let created_at = NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%d %H:%M:%S%.f")
            .map_err(|_| {
                Error::Corrupt(format!("invalid created_at '{}' on {}", self.created_at, what))
            })?;
        Ok(Transaction {
            id: self.id,
            amount,
            r#type: decode_type(&self.r#type, &what)?,
            category_id: self.category_id,
            category: Category {
                id: self.category_id,
                name: self.category_name,
                r#type: decode_type(&self.category_type, &format!("category {}", self.category_id))?,
            },
            date,
            note: self.note,
            created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub kind: Option<TxType>,
    /// Restrict to a single calendar day.
    pub on: Option<NaiveDate>,
}

pub fn get_transaction(conn: &Connection, id: i64) -> Result<Transaction> {
    let raw = conn
        .query_row(&format!("{} WHERE t.id=?1", TX_SELECT), params![id], raw_row)
        .optional()?;
    match raw {
        Some(r) => r.decode(),
        None => Err(Error::NotFound("Transaction")),
    }
}

pub fn list_transactions(conn: &Connection, filter: &TransactionFilter) -> Result<TransactionPage> {
    let page = filter.page.filter(|p| *p > 0).unwrap_or(1);
    let limit = filter.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_SIZE);

    let mut clause = String::from(" WHERE 1=1");
    let mut args: Vec<Value> = Vec::new();
    if let Some(k) = filter.kind {
        clause.push_str(" AND t.type=?");
        args.push(Value::Text(k.as_str().to_string()));
    }
    if let Some(day) = filter.on {
        clause.push_str(" AND t.date=?");
        args.push(Value::Text(day.to_string()));
    }

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM transactions t{}", clause),
        rusqlite::params_from_iter(args.iter()),
        |r| r.get(0),
    )?;

    let sql = format!(
        "{}{} ORDER BY t.date DESC, t.created_at DESC, t.id DESC LIMIT ? OFFSET ?",
        TX_SELECT, clause
    );
    args.push(Value::Integer(i64::from(limit)));
    let offset = i64::from(page - 1)
        .checked_mul(i64::from(limit))
        .ok_or_else(|| Error::validation("Page is out of range"))?;
    args.push(Value::Integer(offset));
    let mut stmt = conn.prepare(&sql)?;
    let raws = stmt
        .query_map(rusqlite::params_from_iter(args.iter()), raw_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let items = raws
        .into_iter()
        .map(RawRow::decode)
        .collect::<Result<Vec<_>>>()?;

    let total_pages = u32::try_from((total + i64::from(limit) - 1) / i64::from(limit))
        .unwrap_or(u32::MAX);
    Ok(TransactionPage {
        items,
        total,
        page,
        total_pages,
    })
}

fn normalized_note(note: &Option<String>) -> Option<String> {
    note.as_ref()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

fn validate_transaction(conn: &Connection, input: &NewTransaction) -> Result<()> {
    if input.amount <= Decimal::ZERO {
        return Err(Error::validation("Amount must be greater than zero"));
    }
    let category = match get_category(conn, input.category_id) {
        Ok(c) => c,
        Err(Error::NotFound(_)) => {
            return Err(Error::validation(format!(
                "Category {} does not exist",
                input.category_id
            )));
        }
        Err(e) => return Err(e),
    };
    if category.r#type != input.r#type {
        return Err(Error::validation(format!(
            "Category '{}' is an {} category and cannot hold an {} transaction",
            category.name, category.r#type, input.r#type
        )));
    }
    Ok(())
}

pub fn add_transaction(conn: &Connection, input: &NewTransaction) -> Result<Transaction> {
    validate_transaction(conn, input)?;
    let created_at = Utc::now().naive_utc().format(CREATED_AT_FMT).to_string();
    conn.execute(
        "INSERT INTO transactions(amount, type, category_id, date, note, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            input.amount.to_string(),
            input.r#type.as_str(),
            input.category_id,
            input.date.to_string(),
            normalized_note(&input.note),
            created_at
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(id, amount = %input.amount, kind = %input.r#type, date = %input.date, "transaction added");
    get_transaction(conn, id)
}

pub fn update_transaction(conn: &Connection, id: i64, input: &NewTransaction) -> Result<Transaction> {
    validate_transaction(conn, input)?;
    let changed = conn.execute(
        "UPDATE transactions SET amount=?1, type=?2, category_id=?3, date=?4, note=?5 WHERE id=?6",
        params![
            input.amount.to_string(),
            input.r#type.as_str(),
            input.category_id,
            input.date.to_string(),
            normalized_note(&input.note),
            id
        ],
    )?;
    if changed == 0 {
        return Err(Error::NotFound("Transaction"));
    }
    info!(id, "transaction updated");
    get_transaction(conn, id)
}

pub fn delete_transaction(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    if changed == 0 {
        return Err(Error::NotFound("Transaction"));
    }
    info!(id, "transaction deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

fn category_row(r: &Row<'_>) -> rusqlite::Result<(i64, String, String)> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?))
}

fn decode_category((id, name, typ): (i64, String, String)) -> Result<Category> {
    let r#type = decode_type(&typ, &format!("category {}", id))?;
    Ok(Category { id, name, r#type })
}

pub fn list_categories(conn: &Connection, kind: Option<TxType>) -> Result<Vec<Category>> {
    let rows = match kind {
        Some(k) => {
            let mut stmt = conn.prepare(
                "SELECT id, name, type FROM categories WHERE type=?1 ORDER BY name COLLATE NOCASE, id",
            )?;
            let rows = stmt
                .query_map(params![k.as_str()], category_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
        None => {
            let mut stmt = conn
                .prepare("SELECT id, name, type FROM categories ORDER BY name COLLATE NOCASE, id")?;
            let rows = stmt
                .query_map([], category_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        }
    };
    rows.into_iter().map(decode_category).collect()
}

pub fn get_category(conn: &Connection, id: i64) -> Result<Category> {
    let row = conn
        .query_row(
            "SELECT id, name, type FROM categories WHERE id=?1",
            params![id],
            category_row,
        )
        .optional()?;
    match row {
        Some(r) => decode_category(r),
        None => Err(Error::NotFound("Category")),
    }
}

/// Case-insensitive lookup within one type.
pub fn find_category(conn: &Connection, name: &str, kind: TxType) -> Result<Option<Category>> {
    let row = conn
        .query_row(
            "SELECT id, name, type FROM categories WHERE name=?1 COLLATE NOCASE AND type=?2",
            params![name.trim(), kind.as_str()],
            category_row,
        )
        .optional()?;
    row.map(decode_category).transpose()
}

fn clean_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Category name is required"));
    }
    Ok(name.to_string())
}

fn name_taken(conn: &Connection, name: &str, kind: TxType, except: Option<i64>) -> Result<bool> {
    let hit: Option<i64> = conn
        .query_row(
            "SELECT id FROM categories WHERE name=?1 COLLATE NOCASE AND type=?2 AND id != ?3",
            params![name, kind.as_str(), except.unwrap_or(-1)],
            |r| r.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}

fn map_unique_violation(e: rusqlite::Error) -> Error {
    match e {
        rusqlite::Error::SqliteFailure(ref f, _) if f.code == ErrorCode::ConstraintViolation => {
            Error::CategoryExists
        }
        other => Error::Store(other),
    }
}

pub fn add_category(conn: &Connection, name: &str, kind: TxType) -> Result<Category> {
    let name = clean_name(name)?;
    if name_taken(conn, &name, kind, None)? {
        return Err(Error::CategoryExists);
    }
    conn.execute(
        "INSERT INTO categories(name, type) VALUES (?1, ?2)",
        params![name, kind.as_str()],
    )
    .map_err(map_unique_violation)?;
    let id = conn.last_insert_rowid();
    info!(id, name = %name, kind = %kind, "category added");
    Ok(Category {
        id,
        name,
        r#type: kind,
    })
}

pub fn rename_category(conn: &Connection, id: i64, name: &str) -> Result<Category> {
    let name = clean_name(name)?;
    let current = get_category(conn, id)?;
    if name_taken(conn, &name, current.r#type, Some(id))? {
        return Err(Error::CategoryExists);
    }
    conn.execute(
        "UPDATE categories SET name=?1 WHERE id=?2",
        params![name, id],
    )
    .map_err(map_unique_violation)?;
    info!(id, from = %current.name, to = %name, "category renamed");
    Ok(Category { name, ..current })
}

pub fn category_usage(conn: &Connection, id: i64) -> Result<i64> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE category_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    Ok(n)
}

pub fn delete_category(conn: &Connection, id: i64) -> Result<()> {
    let category = get_category(conn, id)?;
    let used = category_usage(conn, id)?;
    if used > 0 {
        debug!(id, used, "refusing to delete category in use");
        return Err(Error::CategoryInUse);
    }
    conn.execute("DELETE FROM categories WHERE id=?1", params![id])?;
    info!(id, name = %category.name, "category deleted");
    Ok(())
}
