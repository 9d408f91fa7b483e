// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use spendlog::error::Error;
use spendlog::models::{NewTransaction, TxType};
use spendlog::store::{self, TransactionFilter};
use spendlog::{cli, commands::transactions, db};
use tempfile::TempDir;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn input(amount: Decimal, kind: TxType, category_id: i64, date: NaiveDate) -> NewTransaction {
    NewTransaction {
        amount,
        r#type: kind,
        category_id,
        date,
        note: None,
    }
}

fn setup() -> (Connection, i64, i64) {
    let conn = db::open_in_memory().unwrap();
    let food = store::add_category(&conn, "Food", TxType::Expense).unwrap().id;
    let salary = store::add_category(&conn, "Salary", TxType::Income).unwrap().id;
    for i in 1..=3 {
        store::add_transaction(&conn, &input(dec!(10), TxType::Expense, food, d(2025, 1, i)))
            .unwrap();
    }
    (conn, food, salary)
}

#[test]
fn list_limit_respected() {
    let (conn, ..) = setup();
    let cli = cli::build_cli();
    let matches = cli.get_matches_from(["spendlog", "tx", "list", "--limit", "2"]);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = tx_m.subcommand() {
            let page = transactions::query_rows(&conn, list_m).unwrap();
            assert_eq!(page.items.len(), 2);
            assert_eq!(page.items[0].date, d(2025, 1, 3));
            assert_eq!(page.total, 3);
            assert_eq!(page.total_pages, 2);
        } else {
            panic!("no list subcommand");
        }
    } else {
        panic!("no tx subcommand");
    }
}

#[test]
fn pages_walk_newest_first() {
    let (conn, food, salary) = setup();
    store::add_transaction(&conn, &input(dec!(900), TxType::Income, salary, d(2025, 1, 2)))
        .unwrap();
    store::add_transaction(&conn, &input(dec!(1), TxType::Expense, food, d(2025, 1, 2))).unwrap();

    let filter = TransactionFilter {
        limit: Some(2),
        ..Default::default()
    };
    let first = store::list_transactions(&conn, &filter).unwrap();
    assert_eq!(first.total, 5);
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.page, 1);
    // same date: the later insert comes first
    assert_eq!(first.items[0].date, d(2025, 1, 3));
    assert_eq!(first.items[1].amount, dec!(1));

    let last = store::list_transactions(
        &conn,
        &TransactionFilter {
            page: Some(3),
            limit: Some(2),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.items[0].date, d(2025, 1, 1));
}

#[test]
fn filters_by_type_and_day() {
    let (conn, _, salary) = setup();
    store::add_transaction(&conn, &input(dec!(900), TxType::Income, salary, d(2025, 1, 2)))
        .unwrap();

    let income = store::list_transactions(
        &conn,
        &TransactionFilter {
            kind: Some(TxType::Income),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(income.total, 1);
    assert_eq!(income.items[0].category.name, "Salary");

    let day = store::list_transactions(
        &conn,
        &TransactionFilter {
            on: Some(d(2025, 1, 2)),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(day.total, 2);

    let empty = store::list_transactions(
        &conn,
        &TransactionFilter {
            on: Some(d(2030, 1, 1)),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(empty.total, 0);
    assert_eq!(empty.total_pages, 0);
    assert!(empty.items.is_empty());
}

#[test]
fn add_validates_amount_and_category() {
    let (conn, food, salary) = setup();

    for amount in [dec!(0), dec!(-5)] {
        let err = store::add_transaction(&conn, &input(amount, TxType::Expense, food, d(2025, 2, 1)))
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    let err = store::add_transaction(&conn, &input(dec!(5), TxType::Expense, salary, d(2025, 2, 1)))
        .unwrap_err();
    assert!(err.to_string().contains("cannot hold"), "{}", err);

    let err = store::add_transaction(&conn, &input(dec!(5), TxType::Expense, 404, d(2025, 2, 1)))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn get_joins_category_and_cleans_note() {
    let (conn, food, _) = setup();
    let mut body = input(dec!(12.75), TxType::Expense, food, d(2025, 2, 14));
    body.note = Some("  dinner  ".into());
    let t = store::add_transaction(&conn, &body).unwrap();

    let fetched = store::get_transaction(&conn, t.id).unwrap();
    assert_eq!(fetched.amount, dec!(12.75));
    assert_eq!(fetched.category.name, "Food");
    assert_eq!(fetched.category.r#type, TxType::Expense);
    assert_eq!(fetched.note.as_deref(), Some("dinner"));

    body.note = Some("   ".into());
    let blank = store::add_transaction(&conn, &body).unwrap();
    assert_eq!(blank.note, None);
}

#[test]
fn update_and_delete() {
    let (conn, food, salary) = setup();
    let t = store::add_transaction(&conn, &input(dec!(5), TxType::Expense, food, d(2025, 3, 1)))
        .unwrap();

    let updated = store::update_transaction(
        &conn,
        t.id,
        &input(dec!(2500), TxType::Income, salary, d(2025, 3, 2)),
    )
    .unwrap();
    assert_eq!(updated.amount, dec!(2500));
    assert_eq!(updated.r#type, TxType::Income);
    assert_eq!(updated.category.name, "Salary");
    assert_eq!(updated.created_at, t.created_at);

    store::delete_transaction(&conn, t.id).unwrap();
    assert!(matches!(
        store::get_transaction(&conn, t.id).unwrap_err(),
        Error::NotFound("Transaction")
    ));
    assert!(matches!(
        store::delete_transaction(&conn, t.id).unwrap_err(),
        Error::NotFound(_)
    ));
    assert!(matches!(
        store::update_transaction(&conn, t.id, &input(dec!(1), TxType::Expense, food, d(2025, 3, 1)))
            .unwrap_err(),
        Error::NotFound(_)
    ));
}

#[test]
fn tx_add_and_edit_through_cli() {
    let (conn, ..) = setup();
    let matches = cli::build_cli().get_matches_from([
        "spendlog", "tx", "add", "--amount", "42.10", "--category", "food", "--date",
        "2025-04-05", "--note", "market",
    ]);
    let Some(("tx", tx_m)) = matches.subcommand() else {
        panic!("no tx subcommand");
    };
    transactions::handle(&conn, tx_m).unwrap();

    let page = store::list_transactions(
        &conn,
        &TransactionFilter {
            on: Some(d(2025, 4, 5)),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(page.total, 1);
    let added = &page.items[0];
    assert_eq!(added.amount, dec!(42.10));
    assert_eq!(added.category.name, "Food");

    let id = added.id.to_string();
    let matches = cli::build_cli().get_matches_from([
        "spendlog", "tx", "edit", "--id", id.as_str(), "--amount", "50",
    ]);
    let Some(("tx", tx_m)) = matches.subcommand() else {
        panic!("no tx subcommand");
    };
    transactions::handle(&conn, tx_m).unwrap();

    let edited = store::get_transaction(&conn, added.id).unwrap();
    assert_eq!(edited.amount, dec!(50));
    assert_eq!(edited.date, d(2025, 4, 5));
    assert_eq!(edited.note.as_deref(), Some("market"));
}

#[test]
fn database_file_persists_between_opens() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("spendlog.sqlite");
    {
        let conn = db::open_at(&path).unwrap();
        store::add_category(&conn, "Food", TxType::Expense).unwrap();
    }
    let conn = db::open_at(&path).unwrap();
    assert_eq!(store::list_categories(&conn, None).unwrap().len(), 1);
}

#[test]
fn huge_page_is_rejected_not_overflowed() {
    let (conn, ..) = setup();
    let err = store::list_transactions(
        &conn,
        &TransactionFilter {
            page: Some(u32::MAX),
            limit: Some(u32::MAX),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "{:?}", err);

    // far past the end but still representable
    let empty = store::list_transactions(
        &conn,
        &TransactionFilter {
            page: Some(u32::MAX),
            limit: Some(1),
            ..Default::default()
        },
    )
    .unwrap();
    assert!(empty.items.is_empty());
    assert_eq!(empty.total, 3);
}
