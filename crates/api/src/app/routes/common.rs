use std::str::FromStr;

use axum::http::StatusCode;

use crate::app::errors;

/// Parse a numeric path id, answering 400 `invalid_id` when it is not one.
pub fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, axum::response::Response> {
    raw.parse::<T>().map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            format!("invalid {what} id '{raw}'"),
        )
    })
}
