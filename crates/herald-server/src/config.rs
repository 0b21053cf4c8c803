//! Server network configuration.

use herald_settings::HeraldSettings;

/// Bind address and socket options for the gateway server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host to bind.
    pub host: String,
    /// Port to bind (0 for auto-assign).
    pub port: u16,
}

impl ServerConfig {
    /// Network options from loaded settings.
    #[must_use]
    pub fn from_settings(settings: &HeraldSettings) -> Self {
        Self {
            host: settings.server.host.clone(),
            port: settings.server.port,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 0,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
