// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{NewTransaction, Transaction, TransactionPage};
use crate::store::{self, TransactionFilter};
use crate::utils::{
    fmt_money, get_currency, id_for_category, maybe_print_json, parse_date, parse_decimal,
    parse_type, pretty_table,
};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            store::delete_transaction(conn, id)?;
            println!("Removed transaction {}", id);
        }
        _ => {}
    }
    Ok(())
}

/// Build a create/update body from flags, falling back to `existing` for
/// anything not given.
pub fn input_from(
    conn: &Connection,
    sub: &clap::ArgMatches,
    existing: Option<&Transaction>,
    today: NaiveDate,
) -> Result<NewTransaction> {
    let amount = match (sub.get_one::<String>("amount"), existing) {
        (Some(s), _) => parse_decimal(s)?,
        (None, Some(t)) => t.amount,
        (None, None) => anyhow::bail!("--amount is required"),
    };
    let kind = match (sub.get_one::<String>("type"), existing) {
        (Some(s), _) => parse_type(s)?,
        (None, Some(t)) => t.r#type,
        (None, None) => Default::default(),
    };
    let category_id = match (sub.get_one::<String>("category"), existing) {
        (Some(name), _) => id_for_category(conn, name, kind)?,
        (None, Some(t)) => t.category_id,
        (None, None) => anyhow::bail!("--category is required"),
    };
    let date = match (sub.get_one::<String>("date"), existing) {
        (Some(s), _) => parse_date(s)?,
        (None, Some(t)) => t.date,
        (None, None) => today,
    };
    let note = match sub.get_one::<String>("note") {
        Some(n) => Some(n.to_string()),
        None => existing.and_then(|t| t.note.clone()),
    };
    Ok(NewTransaction {
        amount,
        r#type: kind,
        category_id,
        date,
        note,
    })
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let input = input_from(conn, sub, None, Local::now().date_naive())?;
    let t = store::add_transaction(conn, &input)?;
    let ccy = get_currency(conn)?;
    println!(
        "Recorded {} {} on {} in '{}' (id {})",
        t.r#type,
        fmt_money(&t.amount, &ccy),
        t.date,
        t.category.name,
        t.id
    );
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let current = store::get_transaction(conn, id)?;
    let input = input_from(conn, sub, Some(&current), Local::now().date_naive())?;
    let t = store::update_transaction(conn, id, &input)?;
    println!("Updated transaction {}", t.id);
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let t = store::get_transaction(conn, id)?;
    if !maybe_print_json(sub.get_flag("json"), &t)? {
        let ccy = get_currency(conn)?;
        println!("{}", table(vec![t], &ccy));
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let page = query_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), &page)? {
        let ccy = get_currency(conn)?;
        let (n, of, total) = (page.page, page.total_pages, page.total);
        println!("{}", table(page.items, &ccy));
        println!("Page {} of {} ({} transactions)", n, of.max(1), total);
    }
    Ok(())
}

fn table(items: Vec<Transaction>, ccy: &str) -> comfy_table::Table {
    let rows = items
        .into_iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.date.to_string(),
                t.r#type.to_string(),
                t.category.name,
                fmt_money(&t.amount, ccy),
                t.note.unwrap_or_default(),
            ]
        })
        .collect();
    pretty_table(&["ID", "Date", "Type", "Category", "Amount", "Note"], rows)
}

pub fn filter_from(sub: &clap::ArgMatches, today: NaiveDate) -> Result<TransactionFilter> {
    Ok(TransactionFilter {
        page: sub.get_one::<u32>("page").copied(),
        limit: sub.get_one::<u32>("limit").copied(),
        kind: sub
            .get_one::<String>("type")
            .map(|s| parse_type(s))
            .transpose()?,
        on: sub.get_flag("today").then_some(today),
    })
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<TransactionPage> {
    let filter = filter_from(sub, Local::now().date_naive())?;
    Ok(store::list_transactions(conn, &filter)?)
}
