//! Status, liveness, and debug endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use serde_json::{Value, json};

use crate::state::AppState;

/// `GET /` — service summary.
pub async fn index(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSecs": state.started_at.elapsed().as_secs(),
        "connections": state.registry.len(),
    }))
}

/// `GET /health` — liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// `GET /debug` — echoes the caller's `User-Agent`.
pub async fn debug(headers: HeaderMap) -> Json<Value> {
    let ua = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    Json(json!({"userAgent": ua}))
}
