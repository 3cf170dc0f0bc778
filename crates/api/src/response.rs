//! Response envelope helpers.
//!
//! Every endpoint responds with the same envelope:
//! `{ "status": "success" | "error", "message": ..., "data" | "error": ... }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use kasira_shared::AppError;

/// Builds a success envelope.
pub fn success(status: StatusCode, message: &str, data: impl Serialize) -> Response {
    (
        status,
        Json(json!({
            "status": "success",
            "message": message,
            "data": data,
        })),
    )
        .into_response()
}

/// Builds an error envelope from an application error.
///
/// Internal errors have already been logged where they occurred; the
/// caller only ever sees a generic message for those.
pub fn failure(err: &AppError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = if err.is_internal() {
        "An internal error occurred".to_string()
    } else {
        err.to_string()
    };

    (
        status,
        Json(json!({
            "status": "error",
            "message": message,
            "error": err.error_code(),
        })),
    )
        .into_response()
}
