//! Boundary error types.
//!
//! Typed error taxonomy for the gateway's request handlers. Every failure a
//! handler can report carries a machine-readable code; none of them escape
//! the handler as an uncaught fault.

use serde::{Deserialize, Serialize};
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Error codes
// ─────────────────────────────────────────────────────────────────────────────

/// Centralized API error codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiErrorCode {
    // Request shape
    /// A required parameter is absent.
    #[serde(rename = "PARAMS_MISSING")]
    ParamsMissing,
    /// A parameter has the wrong JSON type.
    #[serde(rename = "PARAMS_TYPE_ERROR")]
    ParamsTypeError,
    /// A parameter exceeds its length cap.
    #[serde(rename = "PARAMS_LENGTH_ERROR")]
    ParamsLengthError,

    // Client metadata
    /// `clientType` is not one of the accepted values.
    #[serde(rename = "CLIENT_TYPE_ERROR")]
    ClientTypeError,
    /// `clientFlag` is not one of the accepted values.
    #[serde(rename = "CLIENT_FLAG_ERROR")]
    ClientFlagError,
    /// `os` is present but not a string.
    #[serde(rename = "OS_TYPE_ERROR")]
    OsTypeError,

    // CID lifecycle
    /// Supplied CID failed signature verification.
    #[serde(rename = "CID_VERIFY_ERROR")]
    CidVerifyError,
    /// CID issuance failed (no secret for the current version).
    #[serde(rename = "CID_CREATE_ERROR")]
    CidCreateError,

    // Registration forwarding
    /// `manageSiteId` does not resolve to a backend domain.
    #[serde(rename = "DOMAIN_NOT_FOUND")]
    DomainNotFound,
    /// The upstream backend rejected the registration or was unreachable.
    #[serde(rename = "REGISTER_CID_ERROR")]
    RegisterCidError,

    // Realtime upgrade
    /// The request did not negotiate a WebSocket upgrade.
    #[serde(rename = "NOT_WEBSOCKET")]
    NotWebsocket,
    /// The `id` query parameter is absent.
    #[serde(rename = "ID_MISSING")]
    IdMissing,
    /// The `idType` query parameter is absent.
    #[serde(rename = "ID_TYPE_MISSING")]
    IdTypeMissing,
    /// The `idType` query parameter is not `user-id` or `cid`.
    #[serde(rename = "ID_TYPE_ERROR")]
    IdTypeError,
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_string(self).unwrap_or_else(|_| "UNKNOWN".to_owned());
        // Strip surrounding quotes
        write!(f, "{}", s.trim_matches('"'))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// API error
// ─────────────────────────────────────────────────────────────────────────────

/// A structured handler failure: code + human-readable message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiError {
    /// Machine-readable error code.
    pub code: ApiErrorCode,
    /// Human-readable message.
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Create a new API error.
    #[must_use]
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// A required parameter is absent.
    #[must_use]
    pub fn params_missing() -> Self {
        Self::new(ApiErrorCode::ParamsMissing, "required params are missing")
    }

    /// A parameter has the wrong type.
    #[must_use]
    pub fn params_type() -> Self {
        Self::new(ApiErrorCode::ParamsTypeError, "param has the wrong type")
    }

    /// A parameter exceeds its length cap.
    #[must_use]
    pub fn params_length() -> Self {
        Self::new(ApiErrorCode::ParamsLengthError, "param exceeds length cap")
    }

    /// `clientType` outside the accepted set.
    #[must_use]
    pub fn client_type() -> Self {
        Self::new(ApiErrorCode::ClientTypeError, "unknown clientType")
    }

    /// `clientFlag` outside the accepted set.
    #[must_use]
    pub fn client_flag() -> Self {
        Self::new(ApiErrorCode::ClientFlagError, "unknown clientFlag")
    }

    /// `os` present but not a string.
    #[must_use]
    pub fn os_type() -> Self {
        Self::new(ApiErrorCode::OsTypeError, "os must be a string")
    }

    /// CID signature verification failed.
    #[must_use]
    pub fn cid_verify() -> Self {
        Self::new(ApiErrorCode::CidVerifyError, "cid failed verification")
    }

    /// CID issuance failed.
    #[must_use]
    pub fn cid_create() -> Self {
        Self::new(ApiErrorCode::CidCreateError, "cid could not be created")
    }

    /// `manageSiteId` unknown to the site directory.
    #[must_use]
    pub fn domain_not_found(site_id: &str) -> Self {
        Self::new(
            ApiErrorCode::DomainNotFound,
            format!("no backend domain for site: {site_id}"),
        )
    }

    /// Upstream registration rejection or transport failure.
    #[must_use]
    pub fn register_cid(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::RegisterCidError, message)
    }

    /// Request is not a WebSocket upgrade.
    #[must_use]
    pub fn not_websocket() -> Self {
        Self::new(ApiErrorCode::NotWebsocket, "not a websocket request")
    }

    /// Upgrade query is missing `id`.
    #[must_use]
    pub fn id_missing() -> Self {
        Self::new(ApiErrorCode::IdMissing, "missing id")
    }

    /// Upgrade query is missing `idType`.
    #[must_use]
    pub fn id_type_missing() -> Self {
        Self::new(ApiErrorCode::IdTypeMissing, "missing idType")
    }

    /// Upgrade query carries an unknown `idType`.
    #[must_use]
    pub fn id_type_error() -> Self {
        Self::new(ApiErrorCode::IdTypeError, "idType must be user-id or cid")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
