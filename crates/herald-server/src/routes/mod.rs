//! HTTP route handlers.
//!
//! Every endpoint answers with the [`ApiResponse`] envelope; validation
//! failures keep HTTP 200 and report through `errCode`/`errMessage`.

pub mod cid;
pub mod push;
pub mod status;

use axum::Json;
use axum::response::{IntoResponse, Response};
use herald_core::{ApiError, ApiResponse};
use serde::Serialize;
use serde_json::Value;

/// Successful envelope with a payload.
pub(crate) fn reply_ok<T: Serialize>(data: T) -> Response {
    Json(ApiResponse::ok(data)).into_response()
}

/// Successful envelope without a payload.
pub(crate) fn reply_ok_empty() -> Response {
    Json(ApiResponse::<Value>::ok_empty()).into_response()
}

/// Failure envelope (HTTP 200, outcome in the body).
pub(crate) fn reply_err(error: &ApiError) -> Response {
    Json(ApiResponse::<Value>::failure(error)).into_response()
}
