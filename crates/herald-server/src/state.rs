//! Shared handler state.

use std::sync::Arc;
use std::time::Instant;

use herald_core::{CidCodec, SecretKeyStore, SnowflakeGenerator};
use herald_settings::HeraldSettings;
use tokio_util::sync::CancellationToken;

use crate::upstream::{RegistrationForwarder, SiteDirectory, UpstreamError};
use crate::ws::registry::ConnectionRegistry;

/// Everything the route handlers share.
///
/// Constructed once at startup: the generator and registry are deliberately
/// built here rather than lazily so exactly one of each exists for the
/// process lifetime.
#[derive(Clone)]
pub struct AppState {
    /// CID signing/verification over the configured secret store.
    pub codec: Arc<CidCodec>,
    /// The process-wide ID generator.
    pub ids: Arc<SnowflakeGenerator>,
    /// Live-connection table.
    pub registry: Arc<ConnectionRegistry>,
    /// `manageSiteId` → backend directory.
    pub directory: Arc<SiteDirectory>,
    /// Upstream registration forwarder.
    pub forwarder: Arc<RegistrationForwarder>,
    /// Service name reported on the status page.
    pub service_name: String,
    /// Per-connection outbound buffer size.
    pub ws_buffer: usize,
    /// Process start, for uptime reporting.
    pub started_at: Instant,
    /// Cancelled at shutdown; live connection tasks watch it so they end
    /// with the server instead of lingering on open sockets.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Build the full state from loaded settings.
    pub fn from_settings(settings: &HeraldSettings) -> Result<Self, UpstreamError> {
        let store = SecretKeyStore::new(
            settings.cid.secrets.clone(),
            settings.cid.current_secret_version.clone(),
        );
        let forwarder = RegistrationForwarder::new(
            settings.upstream.register_path.clone(),
            std::time::Duration::from_millis(settings.upstream.timeout_ms),
        )?;
        Ok(Self {
            codec: Arc::new(CidCodec::new(store)),
            ids: Arc::new(SnowflakeGenerator::from_entropy()),
            registry: Arc::new(ConnectionRegistry::new()),
            directory: Arc::new(SiteDirectory::new(settings.sites.clone())),
            forwarder: Arc::new(forwarder),
            service_name: settings.name.clone(),
            // A zero buffer would make every connection look backpressured.
            ws_buffer: settings.server.ws_buffer.max(1),
            started_at: Instant::now(),
            shutdown: CancellationToken::new(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_settings_wires_codec_and_registry() {
        let settings = HeraldSettings::default();
        let state = AppState::from_settings(&settings).unwrap();
        assert_eq!(state.service_name, "herald");
        assert!(state.registry.is_empty());
        let cid = state.codec.issue(&state.ids).unwrap();
        assert!(state.codec.verify(&cid.to_string()));
    }

    #[test]
    fn ws_buffer_is_clamped_to_at_least_one() {
        let mut settings = HeraldSettings::default();
        settings.server.ws_buffer = 0;
        let state = AppState::from_settings(&settings).unwrap();
        assert_eq!(state.ws_buffer, 1);
    }
}
