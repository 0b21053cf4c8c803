//! # herald-server
//!
//! Axum HTTP + WebSocket gateway for the Herald system: CID issuance and
//! registration endpoints, the admission-controlled connection registry, push
//! validation and fan-out, and the upstream registration forwarder.
//!
//! The binary crate (`herald-gateway`) wires settings into [`AppState`],
//! builds a [`HeraldServer`], and drives its lifecycle.

#![deny(unsafe_code)]

pub mod config;
pub mod routes;
pub mod server;
pub mod state;
pub mod upstream;
pub mod ws;

pub use config::ServerConfig;
pub use server::{HeraldServer, ShutdownHandle, build_router};
pub use state::AppState;
