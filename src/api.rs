// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Request parsing and the response envelope shared by the HTTP server and the CLI.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{TransactionPage, TxType};
use crate::stats::{StatsQuery, View};
use crate::store::TransactionFilter;

/// `{ success, data }` on success, `{ success, error }` on failure.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    pub total: i64,
    pub page: u32,
    pub total_pages: u32,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Envelope {
            success: true,
            data: Some(data),
            error: None,
            paging: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Envelope {
            success: false,
            data: None,
            error: Some(error.into()),
            paging: None,
        }
    }
}

impl Envelope<()> {
    /// Success with no payload, used by deletes.
    pub fn done() -> Self {
        Envelope {
            success: true,
            data: None,
            error: None,
            paging: None,
        }
    }
}

impl Envelope<Vec<crate::models::Transaction>> {
    pub fn page(page: TransactionPage) -> Self {
        Envelope {
            success: true,
            paging: Some(Paging {
                total: page.total,
                page: page.page,
                total_pages: page.total_pages,
            }),
            data: Some(page.items),
            error: None,
        }
    }
}

/// Raw statistics parameters, as they arrive on a query string or the command line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsParams {
    pub year: Option<String>,
    pub month: Option<String>,
    pub mode: Option<String>,
    pub view: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl StatsParams {
    pub fn resolve(&self) -> Result<StatsQuery> {
        let year = match present(&self.year).and_then(|y| y.parse::<i32>().ok()) {
            Some(y) if y != 0 => y,
            _ => return Err(Error::validation("Year is required")),
        };

        match present(&self.mode).unwrap_or("monthly") {
            "yearly" => return Ok(StatsQuery::yearly(year)),
            "monthly" => {}
            other => {
                return Err(Error::validation(format!(
                    "Unknown mode '{}', expected monthly or yearly",
                    other
                )));
            }
        }

        let month = match present(&self.month).and_then(|m| m.parse::<u32>().ok()) {
            Some(m) if m != 0 => m,
            _ => return Err(Error::validation("Month is required for monthly mode")),
        };

        let view = match present(&self.view) {
            None => View::Overview,
            Some("summary") => View::Summary,
            Some("breakdown") => View::Breakdown,
            Some("daily_avg") => View::DailyAverage,
            Some(other) => {
                return Err(Error::validation(format!(
                    "Unknown view '{}', expected summary, breakdown or daily_avg",
                    other
                )));
            }
        };
        let kind = match present(&self.kind) {
            Some(k) => k.parse::<TxType>()?,
            None => TxType::Expense,
        };

        Ok(StatsQuery::monthly(year, month).view(view).kind(kind))
    }
}

/// Raw listing parameters; unparseable page/limit fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub date: Option<String>,
}

impl ListParams {
    pub fn resolve(&self, today: NaiveDate) -> Result<TransactionFilter> {
        let number = |v: &Option<String>| present(v).and_then(|s| s.parse::<u32>().ok());
        let kind = present(&self.kind).map(str::parse::<TxType>).transpose()?;
        let on = match present(&self.date) {
            None | Some("all") => None,
            Some("today") => Some(today),
            Some(other) => {
                return Err(Error::validation(format!(
                    "Unknown date filter '{}', expected today or all",
                    other
                )));
            }
        };
        Ok(TransactionFilter {
            page: number(&self.page),
            limit: number(&self.limit),
            kind,
            on,
        })
    }
}

/// Optional `type` query parameter for category listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl CategoryParams {
    pub fn resolve(&self) -> Result<Option<TxType>> {
        present(&self.kind).map(str::parse::<TxType>).transpose()
    }
}
