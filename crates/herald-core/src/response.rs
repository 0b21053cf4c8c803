//! JSON response envelope.
//!
//! Every HTTP endpoint answers with the same `{success, errCode?, errMessage?,
//! data?}` shape. Validation failures keep HTTP 200 — the envelope, not the
//! status line, carries the outcome.

use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, ApiErrorCode};

/// Wire envelope for all gateway responses.
///
/// `errCode`/`errMessage` are present only on failure; `data` only when the
/// operation produced a payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T = serde_json::Value> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Machine-readable failure code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err_code: Option<ApiErrorCode>,
    /// Human-readable failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err_message: Option<String>,
    /// Operation payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Successful response with a payload.
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            err_code: None,
            err_message: None,
            data: Some(data),
        }
    }

    /// Successful response without a payload.
    #[must_use]
    pub fn ok_empty() -> Self {
        Self {
            success: true,
            err_code: None,
            err_message: None,
            data: None,
        }
    }

    /// Failed response carrying the error's code and message.
    #[must_use]
    pub fn failure(error: &ApiError) -> Self {
        Self {
            success: false,
            err_code: Some(error.code),
            err_message: Some(error.message.clone()),
            data: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
