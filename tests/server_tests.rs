// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use spendlog::models::{NewTransaction, TxType};
use spendlog::server::{AppState, router};
use spendlog::{db, store};
use tower::ServiceExt;

fn seeded() -> (Connection, i64, i64) {
    let conn = db::open_in_memory().unwrap();
    let food = store::add_category(&conn, "Food", TxType::Expense).unwrap().id;
    let salary = store::add_category(&conn, "Salary", TxType::Income).unwrap().id;
    let add = |amount: Decimal, kind: TxType, category_id: i64, day: u32| {
        store::add_transaction(
            &conn,
            &NewTransaction {
                amount,
                r#type: kind,
                category_id,
                date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
                note: None,
            },
        )
        .unwrap();
    };
    add(dec!(1000), TxType::Income, salary, 1);
    add(dec!(400), TxType::Expense, food, 15);
    (conn, food, salary)
}

fn app(conn: Connection) -> Router {
    router(AppState::new(conn))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn statistics_requires_year_and_month() {
    let (conn, ..) = seeded();
    let app = app(conn);

    let (status, body) = call(&app, Method::GET, "/api/statistics?month=3", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "Year is required"}));

    let (status, body) = call(&app, Method::GET, "/api/statistics?year=2024", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Month is required for monthly mode");

    let (status, body) = call(&app, Method::GET, "/api/statistics?year=2024&month=13", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid window"));
}

#[tokio::test]
async fn statistics_views() {
    let (conn, ..) = seeded();
    let app = app(conn);

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/statistics?year=2024&month=3&view=summary",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "data": {"income": 1000.0, "expense": 400.0, "balance": 600.0}})
    );

    let (_, body) = call(&app, Method::GET, "/api/statistics?year=2024&month=3", None).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["summary"]["balance"], 600.0);
    assert_eq!(body["data"]["breakdown"], json!({"Food": 400.0}));
    assert!(body["data"]["avgDaily"].is_number());

    let (_, body) = call(
        &app,
        Method::GET,
        "/api/statistics?year=2024&month=3&view=breakdown&type=INCOME",
        None,
    )
    .await;
    assert_eq!(body["data"], json!({"Salary": 1000.0}));

    let (_, body) = call(&app, Method::GET, "/api/statistics?year=2024&mode=yearly", None).await;
    assert_eq!(body["data"]["income"], 1000.0);
    assert_eq!(body["data"]["expense"], 400.0);
}

#[tokio::test]
async fn store_failure_is_a_generic_500() {
    let (conn, ..) = seeded();
    conn.execute_batch("DROP TABLE transactions").unwrap();
    let app = app(conn);

    let (status, body) = call(&app, Method::GET, "/api/statistics?year=2024&month=3", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"success": false, "error": "Failed to get statistics"})
    );
}

#[tokio::test]
async fn transaction_crud() {
    let (conn, food, salary) = seeded();
    let app = app(conn);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/transactions",
        Some(json!({"amount": 250.5, "type": "EXPENSE", "categoryId": food, "date": "2024-03-04", "note": "lunch"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["amount"], 250.5);
    assert_eq!(body["data"]["category"]["name"], "Food");
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/api/transactions/{}", id),
        Some(json!({"amount": 99, "type": "INCOME", "categoryId": salary, "date": "2024-03-05"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["type"], "INCOME");

    let (status, body) = call(&app, Method::GET, "/api/transactions?limit=2&page=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["date"], "2024-03-15");

    let (status, body) = call(&app, Method::DELETE, &format!("/api/transactions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (status, body) = call(&app, Method::GET, &format!("/api/transactions/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Transaction not found");
}

#[tokio::test]
async fn transaction_body_errors_use_envelope() {
    let (conn, food, ..) = seeded();
    let app = app(conn);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/transactions",
        Some(json!({"amount": "lots", "categoryId": food})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/transactions",
        Some(json!({"amount": 10, "type": "INCOME", "categoryId": food, "date": "2024-03-04"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("cannot hold"));
}

#[tokio::test]
async fn category_endpoints() {
    let (conn, food, ..) = seeded();
    let app = app(conn);

    let (status, body) = call(&app, Method::GET, "/api/categories?type=INCOME", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([{"id": 2, "name": "Salary", "type": "INCOME"}]));

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/categories",
        Some(json!({"name": "food"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Category already exists");

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/categories",
        Some(json!({"name": "Travel", "type": "EXPENSE"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let travel = body["data"]["id"].as_i64().unwrap();

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/api/categories/{}", travel),
        Some(json!({"name": "Trips"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Trips");

    let (status, body) = call(&app, Method::DELETE, &format!("/api/categories/{}", food), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Cannot delete category with associated transactions"
    );

    let (status, _) = call(&app, Method::DELETE, &format!("/api/categories/{}", travel), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = call(&app, Method::GET, "/api/categories?type=EXPENSE", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn huge_page_leaves_server_usable() {
    let (conn, ..) = seeded();
    let app = app(conn);

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/transactions?page=4294967295&limit=4294967295",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "Page is out of range"}));

    let (status, body) = call(&app, Method::GET, "/api/statistics?year=2024&month=3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn non_numeric_ids_use_envelope() {
    let (conn, ..) = seeded();
    let app = app(conn);

    for (method, uri, body) in [
        (Method::GET, "/api/transactions/abc", None),
        (Method::DELETE, "/api/transactions/abc", None),
        (
            Method::PUT,
            "/api/transactions/abc",
            Some(json!({"amount": 1, "categoryId": 1, "date": "2024-03-01"})),
        ),
        (Method::PUT, "/api/categories/abc", Some(json!({"name": "x"}))),
        (Method::DELETE, "/api/categories/abc", None),
    ] {
        let (status, body) = call(&app, method, uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid id"));
    }
}

#[tokio::test]
async fn non_numeric_year_reads_as_missing() {
    let (conn, ..) = seeded();
    let app = app(conn);

    let (status, body) = call(&app, Method::GET, "/api/statistics?year=abc&month=3", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Year is required");
}
