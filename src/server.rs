// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! JSON HTTP API over the store and the aggregation service.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Local;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{error, info};

use crate::api::{CategoryParams, Envelope, ListParams, StatsParams};
use crate::error::{Error, Result};
use crate::models::{CategoryRename, NewCategory, NewTransaction};
use crate::stats::Aggregator;
use crate::store;

#[derive(Clone)]
pub struct AppState {
    conn: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` with exclusive use of the connection. Store calls never leave a
    /// transaction open, so a lock poisoned by a panicking handler is reused.
    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&conn)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/statistics", get(statistics))
        .route(
            "/api/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route(
            "/api/transactions/:id",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
        .route("/api/categories", get(list_categories).post(create_category))
        .route(
            "/api/categories/:id",
            axum::routing::put(rename_category).delete(delete_category),
        )
        .with_state(state)
}

pub async fn serve(conn: Connection, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(AppState::new(conn));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn status_for(e: &Error) -> StatusCode {
    match e {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Client errors carry their own message; anything else is logged and
/// replaced by `fallback`.
fn failure(e: Error, fallback: &'static str) -> Response {
    let status = status_for(&e);
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("{}: {:?}", fallback, e);
        fallback.to_string()
    } else {
        e.to_string()
    };
    (status, Json(Envelope::<()>::fail(message))).into_response()
}

fn respond<T: Serialize>(result: Result<T>, on_error: &'static str) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(Envelope::ok(data))).into_response(),
        Err(e) => failure(e, on_error),
    }
}

fn bad_body(rejection: JsonRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(Envelope::<()>::fail(format!(
            "Invalid request body: {}",
            rejection.body_text()
        ))),
    )
        .into_response()
}

/// `:id` segment; rejections are answered with the envelope.
type IdParam = std::result::Result<Path<i64>, PathRejection>;

fn bad_id(rejection: PathRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(Envelope::<()>::fail(format!(
            "Invalid id: {}",
            rejection.body_text()
        ))),
    )
        .into_response()
}

async fn statistics(State(state): State<AppState>, Query(params): Query<StatsParams>) -> Response {
    info!("GET /api/statistics - query: {:?}", params);
    let result = params.resolve().and_then(|query| {
        state.with_conn(|conn| query.run(&Aggregator::new(conn)))
    });
    respond(result, "Failed to get statistics")
}

async fn list_transactions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    info!("GET /api/transactions - query: {:?}", params);
    let result = params
        .resolve(Local::now().date_naive())
        .and_then(|filter| state.with_conn(|conn| store::list_transactions(conn, &filter)));
    match result {
        Ok(page) => (StatusCode::OK, Json(Envelope::page(page))).into_response(),
        Err(e) => failure(e, "Failed to get transactions"),
    }
}

async fn create_transaction(
    State(state): State<AppState>,
    body: std::result::Result<Json<NewTransaction>, JsonRejection>,
) -> Response {
    let Json(input) = match body {
        Ok(b) => b,
        Err(rejection) => return bad_body(rejection),
    };
    info!("POST /api/transactions - request: {:?}", input);
    let result = state.with_conn(|conn| store::add_transaction(conn, &input));
    respond(result, "Failed to add transaction")
}

async fn get_transaction(State(state): State<AppState>, id: IdParam) -> Response {
    let Path(id) = match id {
        Ok(p) => p,
        Err(rejection) => return bad_id(rejection),
    };
    info!("GET /api/transactions/{}", id);
    let result = state.with_conn(|conn| store::get_transaction(conn, id));
    respond(result, "Failed to get transaction")
}

async fn update_transaction(
    State(state): State<AppState>,
    id: IdParam,
    body: std::result::Result<Json<NewTransaction>, JsonRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(p) => p,
        Err(rejection) => return bad_id(rejection),
    };
    let Json(input) = match body {
        Ok(b) => b,
        Err(rejection) => return bad_body(rejection),
    };
    info!("PUT /api/transactions/{} - request: {:?}", id, input);
    let result = state.with_conn(|conn| store::update_transaction(conn, id, &input));
    respond(result, "Failed to update transaction")
}

async fn delete_transaction(State(state): State<AppState>, id: IdParam) -> Response {
    let Path(id) = match id {
        Ok(p) => p,
        Err(rejection) => return bad_id(rejection),
    };
    info!("DELETE /api/transactions/{}", id);
    match state.with_conn(|conn| store::delete_transaction(conn, id)) {
        Ok(()) => (StatusCode::OK, Json(Envelope::done())).into_response(),
        Err(e) => failure(e, "Failed to delete transaction"),
    }
}

async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<CategoryParams>,
) -> Response {
    info!("GET /api/categories - query: {:?}", params);
    let result = params
        .resolve()
        .and_then(|kind| state.with_conn(|conn| store::list_categories(conn, kind)));
    respond(result, "Failed to get categories")
}

async fn create_category(
    State(state): State<AppState>,
    body: std::result::Result<Json<NewCategory>, JsonRejection>,
) -> Response {
    let Json(input) = match body {
        Ok(b) => b,
        Err(rejection) => return bad_body(rejection),
    };
    info!("POST /api/categories - request: {:?}", input);
    let result = state.with_conn(|conn| store::add_category(conn, &input.name, input.r#type));
    respond(result, "Failed to add category")
}

async fn rename_category(
    State(state): State<AppState>,
    id: IdParam,
    body: std::result::Result<Json<CategoryRename>, JsonRejection>,
) -> Response {
    let Path(id) = match id {
        Ok(p) => p,
        Err(rejection) => return bad_id(rejection),
    };
    let Json(input) = match body {
        Ok(b) => b,
        Err(rejection) => return bad_body(rejection),
    };
    info!("PUT /api/categories/{} - request: {:?}", id, input);
    let result = state.with_conn(|conn| store::rename_category(conn, id, &input.name));
    respond(result, "Failed to update category")
}

async fn delete_category(State(state): State<AppState>, id: IdParam) -> Response {
    let Path(id) = match id {
        Ok(p) => p,
        Err(rejection) => return bad_id(rejection),
    };
    info!("DELETE /api/categories/{}", id);
    match state.with_conn(|conn| store::delete_category(conn, id)) {
        Ok(()) => (StatusCode::OK, Json(Envelope::done())).into_response(),
        Err(e) => failure(e, "Failed to delete category"),
    }
}
