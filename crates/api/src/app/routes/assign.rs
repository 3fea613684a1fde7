//! Issue/return ledger endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use schoolhub_core::IssueRecordId;

use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/issue", post(issue_item))
        .route("/return/:id", patch(return_item))
        .route("/issued", get(list_currently_issued))
        .route("/history", get(list_history))
}

pub async fn issue_item(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::IssueItemRequest>, JsonRejection>,
) -> axum::response::Response {
    let (item_id, staff_id, quantity) = match dto::json_body(payload).and_then(|b| b.into_parts()) {
        Ok(parts) => parts,
        Err(resp) => return resp,
    };

    match services.ledger().issue_item(item_id, staff_id, quantity).await {
        Ok(record) => (StatusCode::CREATED, Json(dto::record_to_json(&record))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn return_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::ReturnItemRequest>, JsonRejection>,
) -> axum::response::Response {
    let record_id: IssueRecordId = match parse_id(&id, "issue record") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let quantity = match dto::json_body(payload).and_then(|b| b.quantity()) {
        Ok(q) => q,
        Err(resp) => return resp,
    };

    match services.ledger().return_item(record_id, quantity).await {
        Ok(record) => (StatusCode::OK, Json(dto::record_to_json(&record))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list_currently_issued(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.ledger().list_currently_issued().await {
        Ok(entries) => {
            let body: Vec<_> = entries.iter().map(dto::entry_to_json).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list_history(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.ledger().list_history().await {
        Ok(entries) => {
            let body: Vec<_> = entries.iter().map(dto::entry_to_json).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}
