use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use schoolhub_core::StaffId;

use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_staff).post(register_staff))
        .route("/:id", get(get_staff))
}

pub async fn register_staff(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::RegisterStaffRequest>, JsonRejection>,
) -> axum::response::Response {
    let new_staff = match dto::json_body(payload).and_then(|b| b.into_new_staff()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger().register_staff(new_staff).await {
        Ok(member) => (StatusCode::CREATED, Json(dto::staff_to_json(&member))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list_staff(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.ledger().list_staff().await {
        Ok(staff) => {
            let body: Vec<_> = staff.iter().map(dto::staff_to_json).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_staff(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let staff_id: StaffId = match parse_id(&id, "staff") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.ledger().get_staff(staff_id).await {
        Ok(member) => (StatusCode::OK, Json(dto::staff_to_json(&member))).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
