// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::api::StatsParams;
use crate::stats::{Aggregator, Breakdown, StatsPayload, Summary};
use crate::utils::{fmt_money, fmt_money_whole, get_currency, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn params_from(sub: &clap::ArgMatches) -> StatsParams {
    let get = |id: &str| sub.get_one::<String>(id).cloned();
    StatsParams {
        year: get("year"),
        month: get("month"),
        mode: get("mode"),
        view: get("view"),
        kind: get("type"),
    }
}

/// Resolve flags exactly like the HTTP endpoint resolves its query string.
pub fn compute(conn: &Connection, sub: &clap::ArgMatches) -> Result<StatsPayload> {
    let query = params_from(sub).resolve()?;
    Ok(query.run(&Aggregator::new(conn))?)
}

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let payload = compute(conn, sub)?;
    if maybe_print_json(sub.get_flag("json"), &payload)? {
        return Ok(());
    }
    let ccy = get_currency(conn)?;
    match payload {
        StatsPayload::Summary(s) => print_summary(&s, &ccy),
        StatsPayload::Breakdown(b) => print_breakdown(&b, &ccy),
        StatsPayload::DailyAverage(avg) => {
            println!("Average daily expense: {}", fmt_money_whole(&avg, &ccy))
        }
        StatsPayload::Overview(o) => {
            print_summary(&o.summary, &ccy);
            println!(
                "Average daily expense: {}",
                fmt_money_whole(&o.avg_daily, &ccy)
            );
            print_breakdown(&o.breakdown, &ccy);
        }
    }
    Ok(())
}

fn print_summary(s: &Summary, ccy: &str) {
    let rows = vec![
        vec!["Income".to_string(), fmt_money(&s.income, ccy)],
        vec!["Expense".to_string(), fmt_money(&s.expense, ccy)],
        vec!["Balance".to_string(), fmt_money(&s.balance, ccy)],
    ];
    println!("{}", pretty_table(&["", "Amount"], rows));
}

fn print_breakdown(b: &Breakdown, ccy: &str) {
    if b.is_empty() {
        println!("No transactions in this period.");
        return;
    }
    let mut items: Vec<_> = b.entries().to_vec();
    items.sort_by(|x, y| y.total.cmp(&x.total));
    let rows = items
        .into_iter()
        .map(|e| vec![e.name, fmt_money(&e.total, ccy)])
        .collect();
    println!("{}", pretty_table(&["Category", "Total"], rows));
}
