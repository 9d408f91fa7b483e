// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Income/expense aggregation over calendar windows.
//!
//! Every operation reads one snapshot of rows from a [`TransactionStore`] and
//! reduces it in memory. Nothing here writes, caches or rounds; presentation
//! decides how many decimals to show.

use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::models::TxType;
use crate::store::TransactionStore;

/// Half-open date range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    pub fn month(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidWindow(format!(
                "month {} is outside 1..=12",
                month
            )));
        }
        let (next_year, next_month) = if month == 12 {
            (year.checked_add(1), 1)
        } else {
            (Some(year), month + 1)
        };
        let start = NaiveDate::from_ymd_opt(year, month, 1);
        let end = next_year.and_then(|y| NaiveDate::from_ymd_opt(y, next_month, 1));
        match (start, end) {
            (Some(start), Some(end)) => Ok(Window { start, end }),
            _ => Err(Error::InvalidWindow(format!("year {} is out of range", year))),
        }
    }

    pub fn year(year: i32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1);
        let end = year
            .checked_add(1)
            .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1));
        match (start, end) {
            (Some(start), Some(end)) => Ok(Window { start, end }),
            _ => Err(Error::InvalidWindow(format!("year {} is out of range", year))),
        }
    }

    /// Number of calendar days covered.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

impl Summary {
    fn add(&mut self, kind: TxType, amount: Decimal) {
        match kind {
            TxType::Income => self.income += amount,
            _ => self.expense += amount,
        }
        self.balance = self.income - self.expense;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category_id: i64,
    pub name: String,
    pub total: Decimal,
}

/// Per-category totals, in order of first appearance in the window.
///
/// Buckets are keyed by category id; the name is only used when the
/// breakdown is rendered, where it serializes as a `name -> total` map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Breakdown {
    entries: Vec<CategoryTotal>,
}

impl Breakdown {
    pub fn entries(&self) -> &[CategoryTotal] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<Decimal> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.total)
    }

    pub fn total(&self) -> Decimal {
        self.entries.iter().map(|e| e.total).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn add(&mut self, category_id: i64, name: &str, amount: Decimal) {
        match self.entries.iter_mut().find(|e| e.category_id == category_id) {
            Some(e) => e.total += amount,
            None => self.entries.push(CategoryTotal {
                category_id,
                name: name.to_string(),
                total: amount,
            }),
        }
    }
}

impl Serialize for Breakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for e in &self.entries {
            map.serialize_entry(&e.name, &e.total)?;
        }
        map.end()
    }
}

/// Aggregation over a [`TransactionStore`], evaluated against a fixed "today".
pub struct Aggregator<'a, S: ?Sized> {
    store: &'a S,
    today: NaiveDate,
}

impl<'a, S: TransactionStore + ?Sized> Aggregator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Aggregator {
            store,
            today: Local::now().date_naive(),
        }
    }

    /// Pin the date used to decide whether a month is still in progress.
    pub fn as_of(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn totals(&self, window: Window, kind: Option<TxType>) -> Result<Summary> {
        let rows = self.store.transactions_between(window.start, window.end, kind)?;
        let mut summary = Summary::default();
        for tx in &rows {
            summary.add(tx.r#type, tx.amount);
        }
        Ok(summary)
    }

    pub fn breakdown(&self, window: Window, kind: TxType) -> Result<Breakdown> {
        let rows = self
            .store
            .transactions_between(window.start, window.end, Some(kind))?;
        let mut out = Breakdown::default();
        for tx in &rows {
            out.add(tx.category_id, &tx.category.name, tx.amount);
        }
        Ok(out)
    }

    pub fn financial_summary(&self, year: i32, month: u32) -> Result<Summary> {
        self.totals(Window::month(year, month)?, None)
    }

    pub fn yearly_summary(&self, year: i32) -> Result<Summary> {
        self.totals(Window::year(year)?, None)
    }

    pub fn category_breakdown(&self, year: i32, month: u32, kind: TxType) -> Result<Breakdown> {
        self.breakdown(Window::month(year, month)?, kind)
    }

    /// Days to divide a month's spending by: elapsed days for the current
    /// month, the full length otherwise. Never below 1.
    pub fn daily_divisor(&self, year: i32, month: u32) -> Result<u32> {
        let window = Window::month(year, month)?;
        let days = if self.today.year() == year && self.today.month() == month {
            self.today.day()
        } else {
            u32::try_from(window.days()).unwrap_or(1)
        };
        Ok(days.max(1))
    }

    pub fn average_daily_expense(&self, year: i32, month: u32) -> Result<Decimal> {
        let divisor = self.daily_divisor(year, month)?;
        let spent = self
            .totals(Window::month(year, month)?, Some(TxType::Expense))?
            .expense;
        Ok(spent / Decimal::from(divisor))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Month { year: i32, month: u32 },
    Year(i32),
}

/// Which monthly figure a caller wants; `Overview` bundles all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Overview,
    Summary,
    Breakdown,
    DailyAverage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub summary: Summary,
    pub breakdown: Breakdown,
    pub avg_daily: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatsPayload {
    Summary(Summary),
    Breakdown(Breakdown),
    DailyAverage(Decimal),
    Overview(Overview),
}

/// A fully-resolved statistics request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsQuery {
    pub period: Period,
    pub view: View,
    pub kind: TxType,
}

impl StatsQuery {
    pub fn monthly(year: i32, month: u32) -> Self {
        StatsQuery {
            period: Period::Month { year, month },
            view: View::Overview,
            kind: TxType::Expense,
        }
    }

    pub fn yearly(year: i32) -> Self {
        StatsQuery {
            period: Period::Year(year),
            view: View::Summary,
            kind: TxType::Expense,
        }
    }

    pub fn view(mut self, view: View) -> Self {
        self.view = view;
        self
    }

    /// Transaction type used by the breakdown.
    pub fn kind(mut self, kind: TxType) -> Self {
        self.kind = kind;
        self
    }

    pub fn run<S: TransactionStore + ?Sized>(&self, agg: &Aggregator<'_, S>) -> Result<StatsPayload> {
        let (year, month) = match self.period {
            // Yearly mode only reports totals.
            Period::Year(year) => return Ok(StatsPayload::Summary(agg.yearly_summary(year)?)),
            Period::Month { year, month } => (year, month),
        };
        let payload = match self.view {
            View::Summary => StatsPayload::Summary(agg.financial_summary(year, month)?),
            View::Breakdown => {
                StatsPayload::Breakdown(agg.category_breakdown(year, month, self.kind)?)
            }
            View::DailyAverage => {
                StatsPayload::DailyAverage(agg.average_daily_expense(year, month)?)
            }
            View::Overview => StatsPayload::Overview(Overview {
                summary: agg.financial_summary(year, month)?,
                breakdown: agg.category_breakdown(year, month, self.kind)?,
                avg_daily: agg.average_daily_expense(year, month)?,
            }),
        };
        Ok(payload)
    }
}
