//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` to match the JSON wire
//! format, and `#[serde(default)]` so partial files deep-merge cleanly over
//! compiled defaults.

use herald_core::SecretRecord;
use serde::{Deserialize, Serialize};

/// Root settings for the Herald gateway.
///
/// Loaded from `~/.herald/settings.json` with defaults applied for missing
/// fields; `HERALD_*` environment variables override individual values.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeraldSettings {
    /// Settings schema version.
    pub version: String,
    /// Service name reported on the status page.
    pub name: String,
    /// Network settings.
    pub server: ServerSettings,
    /// CID signing configuration.
    pub cid: CidSettings,
    /// Business-site directory for registration forwarding.
    pub sites: Vec<SiteSettings>,
    /// Upstream forwarding options.
    pub upstream: UpstreamSettings,
}

impl Default for HeraldSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_owned(),
            name: "herald".to_owned(),
            server: ServerSettings::default(),
            cid: CidSettings::default(),
            sites: Vec::new(),
            upstream: UpstreamSettings::default(),
        }
    }
}

/// Server network settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Host to bind.
    pub host: String,
    /// Port to bind (0 for auto-assign).
    pub port: u16,
    /// Per-connection outbound message buffer. A connection that lets this
    /// many messages pile up is treated as dead and evicted.
    pub ws_buffer: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8787,
            ws_buffer: 64,
        }
    }
}

/// CID signing configuration: the versioned secret table and the version new
/// CIDs are signed under. Read-only inputs to the core.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CidSettings {
    /// Version label new CIDs are signed under.
    pub current_secret_version: String,
    /// Versioned secret table. Older versions stay listed so previously
    /// issued CIDs keep verifying after rotation.
    pub secrets: Vec<SecretRecord>,
}

impl Default for CidSettings {
    fn default() -> Self {
        Self {
            current_secret_version: "1".to_owned(),
            secrets: vec![SecretRecord {
                version: "1".to_owned(),
                key: "herald-dev-secret".to_owned(),
            }],
        }
    }
}

/// One business site: resolves a `manageSiteId` to its backend domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    /// Site identifier carried by clients (`manageSiteId`).
    pub id: String,
    /// Operator-facing label.
    pub name: String,
    /// Backend base URL registrations are forwarded to.
    pub domain: String,
    /// Secret version this site's CIDs are expected under. Informational;
    /// issuance uses the global current version.
    #[serde(default)]
    pub cid_current_secret_key_version: Option<u32>,
}

/// Upstream registration-forwarding options.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamSettings {
    /// Path appended to the site domain for CID registration.
    pub register_path: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            register_path: "/biz-client/biz/login/regCid".to_owned(),
            timeout_ms: 10_000,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
