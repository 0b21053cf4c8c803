//! Push endpoint.
//!
//! `POST /notifications/push` validates the request shape, resolves the
//! target set against the registry, and fans the envelope out. Once
//! validation passes the caller sees success regardless of how many
//! recipients were actually reached — delivery is best-effort and send
//! failures are handled locally by eviction.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Response;
use herald_core::ApiError;
use serde_json::Value;
use tracing::debug;

use crate::routes::{reply_err, reply_ok_empty};
use crate::state::AppState;
use crate::ws::dispatch;

/// Handle `POST /notifications/push`.
pub async fn push(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return reply_err(&ApiError::params_missing());
    };

    match dispatch::validate(&body) {
        Err(err) => reply_err(&err),
        Ok((request, data)) => {
            let report = dispatch::route(&state.registry, &request, data);
            debug!(
                matched = report.matched,
                delivered = report.delivered,
                evicted = report.evicted,
                "push dispatched"
            );
            reply_ok_empty()
        }
    }
}
