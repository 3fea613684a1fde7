//! Item catalogue endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use schoolhub_core::ItemId;
use schoolhub_inventory::ItemPatch;

use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:id", get(get_item).patch(update_item).delete(delete_item))
        .route("/:id/movements", get(list_item_movements))
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::CreateItemRequest>, JsonRejection>,
) -> axum::response::Response {
    let new_item = match dto::json_body(payload).and_then(|b| b.into_new_item()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger().create_item(new_item).await {
        Ok(item) => (StatusCode::CREATED, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list_items(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.ledger().list_items().await {
        Ok(items) => {
            let body: Vec<_> = items.iter().map(dto::item_to_json).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let item_id: ItemId = match parse_id(&id, "item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger().get_item(item_id).await {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<dto::UpdateItemRequest>, JsonRejection>,
) -> axum::response::Response {
    let item_id: ItemId = match parse_id(&id, "item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let patch: ItemPatch = match dto::json_body(payload) {
        Ok(body) => body.into(),
        Err(resp) => return resp,
    };

    match services.ledger().update_item(item_id, patch).await {
        Ok(item) => (StatusCode::OK, Json(dto::item_to_json(&item))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let item_id: ItemId = match parse_id(&id, "item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger().delete_item(item_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list_item_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let item_id: ItemId = match parse_id(&id, "item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger().list_item_movements(item_id).await {
        Ok(movements) => {
            let body: Vec<_> = movements.iter().map(dto::movement_to_json).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}
