//! # herald-gateway
//!
//! Herald gateway binary — loads settings, builds the server state once
//! (generator, registry, codec), and drives the HTTP/WebSocket server
//! lifecycle.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use herald_server::{AppState, HeraldServer, ServerConfig};
use tracing_subscriber::EnvFilter;

/// Herald gateway server.
#[derive(Parser, Debug)]
#[command(
    name = "herald-gateway",
    about = "Signed client identifiers + realtime push gateway"
)]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings; 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Path to `settings.json` (defaults to `~/.herald/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();
    let settings_path = args.settings.unwrap_or_else(herald_settings::settings_path);
    let mut settings = herald_settings::load_settings_from_path(&settings_path)
        .context("Failed to load settings")?;
    if let Some(host) = args.host {
        settings.server.host = host;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }

    if settings
        .cid
        .secrets
        .iter()
        .all(|r| r.version != settings.cid.current_secret_version)
    {
        tracing::warn!(
            version = %settings.cid.current_secret_version,
            "no secret configured for the current version — /cid will fail until one is added"
        );
    }
    if settings.sites.is_empty() {
        tracing::info!("site directory is empty — /register-cid will report DOMAIN_NOT_FOUND");
    }

    // One generator and one registry per process, built here and nowhere else.
    let state = AppState::from_settings(&settings).context("Failed to build gateway state")?;
    tracing::info!(
        node = state.ids.node(),
        secrets = settings.cid.secrets.len(),
        sites = settings.sites.len(),
        "gateway state initialized"
    );

    let server = HeraldServer::new(ServerConfig::from_settings(&settings), state);
    let (addr, handle) = server.listen().await.context("Failed to bind server")?;
    tracing::info!("herald gateway listening on http://{addr}");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    server.shutdown().shutdown();
    let _ = handle.await;
    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_to_settings_values() {
        let cli = Cli::parse_from(["herald-gateway"]);
        assert_eq!(cli.host, None);
        assert_eq!(cli.port, None);
        assert_eq!(cli.settings, None);
    }

    #[test]
    fn cli_custom_host_and_port() {
        let cli = Cli::parse_from(["herald-gateway", "--host", "0.0.0.0", "--port", "9001"]);
        assert_eq!(cli.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(cli.port, Some(9001));
    }

    #[test]
    fn cli_settings_path() {
        let cli = Cli::parse_from(["herald-gateway", "--settings", "/tmp/s.json"]);
        assert_eq!(cli.settings, Some(PathBuf::from("/tmp/s.json")));
    }

    #[tokio::test]
    async fn server_boots_from_settings_file_and_responds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{
                "server": {"host": "127.0.0.1", "port": 0},
                "cid": {
                    "currentSecretVersion": "7",
                    "secrets": [{"version": "7", "key": "boot-key"}]
                }
            }"#,
        )
        .unwrap();

        let settings = herald_settings::load_settings_from_path(&path).unwrap();
        let state = AppState::from_settings(&settings).unwrap();
        let server = HeraldServer::new(ServerConfig::from_settings(&settings), state);
        let (addr, handle) = server.listen().await.unwrap();

        let health: serde_json::Value = reqwest::get(format!("http://{addr}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");

        // The configured secret version is in effect.
        let body: serde_json::Value = reqwest::get(format!("http://{addr}/cid"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let cid = body["data"]["cid"].as_str().unwrap();
        assert_eq!(cid.split('.').nth(1), Some("7"));

        server.shutdown().shutdown();
        let _ = handle.await;
    }
}
