//! Business-site directory and registration forwarding.
//!
//! The gateway never owns registrations: after validating and verifying a
//! CID, it resolves the caller's `manageSiteId` to a backend domain through a
//! static directory and forwards the registration there. Losing the upstream
//! is the only externally triggered fatal condition, and it is caught and
//! reported — never allowed to crash the handler.

use std::time::Duration;

use herald_core::{ClientFlag, ClientType};
use herald_settings::SiteSettings;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Static `manageSiteId` → backend mapping, loaded from settings.
#[derive(Clone, Debug, Default)]
pub struct SiteDirectory {
    sites: Vec<SiteSettings>,
}

impl SiteDirectory {
    /// Build a directory from configured sites.
    #[must_use]
    pub fn new(sites: Vec<SiteSettings>) -> Self {
        Self { sites }
    }

    /// Look up a site by its id.
    #[must_use]
    pub fn resolve(&self, site_id: &str) -> Option<&SiteSettings> {
        self.sites.iter().find(|s| s.id == site_id)
    }
}

/// Forwarding failures.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {reason}")]
    ClientBuild {
        /// Builder error detail.
        reason: String,
    },

    /// The backend was unreachable or the transport failed mid-request.
    #[error("transport failure talking to {url}: {reason}")]
    Transport {
        /// Request URL.
        url: String,
        /// Transport error detail.
        reason: String,
    },

    /// The backend answered but did not accept the registration.
    #[error("backend rejected registration: {reason}")]
    Rejected {
        /// Rejection detail (backend error code or body shape).
        reason: String,
    },
}

/// One registration to forward upstream.
#[derive(Clone, Copy, Debug)]
pub struct RegistrationForward<'a> {
    /// Backend base URL from the site directory.
    pub domain: &'a str,
    /// The verified CID, sent as the `cid` header.
    pub cid: &'a str,
    /// Caller's `User-Agent`, forwarded verbatim when present.
    pub user_agent: Option<&'a str>,
    /// Validated client category.
    pub client_type: ClientType,
    /// Validated terminal marker.
    pub client_flag: ClientFlag,
    /// Caller-supplied OS description, when present.
    pub os: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ForwardBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    ua: Option<&'a str>,
    client_type: ClientType,
    client_flag: ClientFlag,
    os: &'a str,
}

/// Forwards CID registrations to the business backend.
#[derive(Clone, Debug)]
pub struct RegistrationForwarder {
    client: reqwest::Client,
    register_path: String,
}

impl RegistrationForwarder {
    /// Build a forwarder with the configured registration path and timeout.
    pub fn new(register_path: impl Into<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::ClientBuild {
                reason: e.to_string(),
            })?;
        Ok(Self {
            client,
            register_path: register_path.into(),
        })
    }

    /// Forward one registration. `Ok(())` only when the backend answered
    /// `{"success": true}`.
    pub async fn forward(&self, forward: RegistrationForward<'_>) -> Result<(), UpstreamError> {
        let url = format!(
            "{}{}",
            forward.domain.trim_end_matches('/'),
            self.register_path
        );
        let body = ForwardBody {
            ua: forward.user_agent,
            client_type: forward.client_type,
            client_flag: forward.client_flag,
            // The backend wants a descriptive string; fall back to the raw
            // user agent when the caller did not supply `os`.
            os: forward.os.or(forward.user_agent).unwrap_or("unknown"),
        };

        let response = self
            .client
            .post(&url)
            .header("cid", forward.cid)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let reply: Value =
            response
                .json()
                .await
                .map_err(|e| UpstreamError::Transport {
                    url: url.clone(),
                    reason: format!("invalid response body ({status}): {e}"),
                })?;

        if reply.get("success").and_then(Value::as_bool) == Some(true) {
            debug!(%url, "registration forwarded");
            Ok(())
        } else {
            let reason = reply
                .get("errCode")
                .and_then(Value::as_str)
                .unwrap_or("success != true")
                .to_owned();
            Err(UpstreamError::Rejected { reason })
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
