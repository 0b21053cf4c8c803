//! Server assembly: router construction, listening, graceful shutdown.

use std::io;
use std::net::SocketAddr;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;
use crate::ws;

/// Build the gateway router over shared state.
///
/// CORS allows any origin: the gateway fronts browser clients served from
/// arbitrary business-site domains.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::status::index))
        .route("/health", get(routes::status::health))
        .route("/debug", get(routes::status::debug))
        .route("/cid", get(routes::cid::get_cid))
        .route("/register-cid", post(routes::cid::register_cid))
        .route("/notifications/push", post(routes::push::push))
        .route("/notifications/websocket", get(ws::upgrade::websocket))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Handle for requesting server shutdown.
#[derive(Clone, Debug)]
pub struct ShutdownHandle(CancellationToken);

impl ShutdownHandle {
    /// Ask the server to stop accepting and drain.
    pub fn shutdown(&self) {
        self.0.cancel();
    }
}

/// The gateway HTTP/WebSocket server.
pub struct HeraldServer {
    config: ServerConfig,
    state: AppState,
}

impl HeraldServer {
    /// Create a server over prepared state.
    #[must_use]
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// The shared state (tests reach the registry through this).
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// A handle that stops the server when triggered.
    ///
    /// Cancellation drains the HTTP acceptor and ends every live connection
    /// task, so shutdown never hangs on open sockets.
    #[must_use]
    pub fn shutdown(&self) -> ShutdownHandle {
        ShutdownHandle(self.state.shutdown.clone())
    }

    /// Bind and start serving. Returns the bound address and the serve task.
    pub async fn listen(&self) -> io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener =
            TcpListener::bind(format!("{}:{}", self.config.host, self.config.port)).await?;
        let addr = listener.local_addr()?;
        let app = build_router(self.state.clone());
        let token = self.state.shutdown.clone();
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned())
                .await;
            if let Err(e) = result {
                error!(error = %e, "server terminated abnormally");
            }
        });
        info!(%addr, "herald gateway listening");
        Ok((addr, handle))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
