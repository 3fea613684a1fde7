use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use schoolhub_core::DomainError;
use schoolhub_infra::LedgerError;

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    match err {
        LedgerError::Domain(e) => domain_error_to_response(e),
        LedgerError::Store(msg) => {
            tracing::error!(error = %msg, "ledger store failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "the inventory store failed to complete the request",
            )
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let status = match &err {
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::ItemInUse { .. } => StatusCode::CONFLICT,
        DomainError::InvalidInput(_)
        | DomainError::InsufficientStock { .. }
        | DomainError::OverReturn { .. }
        | DomainError::BelowIssued { .. } => StatusCode::BAD_REQUEST,
    };

    let details = match &err {
        DomainError::InsufficientStock { requested, available } => {
            json!({ "requested": requested, "available": available })
        }
        DomainError::OverReturn { requested, issued } => {
            json!({ "requested": requested, "issued": issued })
        }
        DomainError::BelowIssued { requested_total, issued } => {
            json!({ "requested_total": requested_total, "issued": issued })
        }
        DomainError::ItemInUse { issued } => json!({ "issued": issued }),
        DomainError::InvalidInput(_) | DomainError::NotFound(_) => json!({}),
    };

    json_error_with(status, err.code(), err.to_string(), details)
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    json_error_with(status, code, message, json!({}))
}

/// Error body with extra fields merged next to `error` and `message`.
pub fn json_error_with(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
    details: serde_json::Value,
) -> axum::response::Response {
    let mut body = json!({
        "error": code,
        "message": message.into(),
    });
    if let (Some(body), serde_json::Value::Object(extra)) = (body.as_object_mut(), details) {
        body.extend(extra);
    }
    (status, axum::Json(body)).into_response()
}
