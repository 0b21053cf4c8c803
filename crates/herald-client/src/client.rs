//! Reconnecting WebSocket client.
//!
//! Presents a fixed, caller-supplied identity on every (re)connect; the
//! server applies its admission rule on each attempt. Lifecycle:
//! `Disconnected -> Connecting -> Open -> (Closing|Erroring) -> Disconnected`,
//! and on every non-initial `Disconnected` the client waits out the rejoin
//! gate before starting exactly one new attempt.

use std::time::Instant;

use futures::StreamExt;
use herald_core::{ClientFlag, ClientType, IdentifierKind};
use rand::Rng;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::gate::{ConnectionPhase, RejoinGate};

/// Connection parameters, fixed for the client's lifetime.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// WebSocket endpoint, e.g. `ws://host:port/notifications/websocket`.
    pub endpoint: String,
    /// Identity presented on every attempt (session-scoped token or CID).
    pub identifier: String,
    /// Which kind of identity it is.
    pub kind: IdentifierKind,
    /// Business site to attach to.
    pub manage_site_id: Option<String>,
    /// Client category to attach.
    pub client_type: Option<ClientType>,
    /// Terminal marker to attach.
    pub client_flag: Option<ClientFlag>,
}

impl ClientConfig {
    fn url(&self) -> String {
        let mut url = format!(
            "{}?id={}&idType={}",
            self.endpoint, self.identifier, self.kind
        );
        if let Some(site) = &self.manage_site_id {
            url.push_str("&manageSiteId=");
            url.push_str(site);
        }
        if let Some(client_type) = self.client_type {
            url.push_str("&clientType=");
            url.push_str(client_type.as_str());
        }
        if let Some(flag) = self.client_flag {
            url.push_str("&clientFlag=");
            url.push_str(flag.as_str());
        }
        url
    }
}

/// A short random session-scoped identifier, for clients that have no CID.
#[must_use]
pub fn random_identifier() -> String {
    rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(7)
        .map(char::from)
        .collect()
}

/// Events surfaced to the owner of the client.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientEvent {
    /// A connection was established.
    Open,
    /// A pushed message envelope arrived.
    Message(Value),
    /// The connection ended; a rejoin is scheduled.
    Closed,
}

/// The reconnecting client. Create, subscribe to [`phase`], then [`run`].
///
/// [`phase`]: Self::phase
/// [`run`]: Self::run
pub struct ReconnectingClient {
    config: ClientConfig,
    phase: watch::Sender<ConnectionPhase>,
}

impl ReconnectingClient {
    /// Create a client over fixed connection parameters.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let (phase, _) = watch::channel(ConnectionPhase::Disconnected);
        Self { config, phase }
    }

    /// Observe lifecycle phases.
    #[must_use]
    pub fn phase(&self) -> watch::Receiver<ConnectionPhase> {
        self.phase.subscribe()
    }

    /// Drive the connect/rejoin loop until `events`' receiver is dropped.
    pub async fn run(self, events: mpsc::Sender<ClientEvent>) {
        loop {
            let mut gate = RejoinGate::begin(Instant::now());
            let _ = self.phase.send_replace(ConnectionPhase::Connecting);

            match connect_async(self.config.url()).await {
                Ok((mut ws, _)) => {
                    let _ = self.phase.send_replace(ConnectionPhase::Open);
                    debug!(identifier = %self.config.identifier, "connection open");
                    if events.send(ClientEvent::Open).await.is_err() {
                        return;
                    }

                    let mut erroring = false;
                    while let Some(frame) = ws.next().await {
                        match frame {
                            Ok(Message::Text(text)) => {
                                match serde_json::from_str::<Value>(text.as_str()) {
                                    Ok(message) => {
                                        if events.send(ClientEvent::Message(message)).await.is_err()
                                        {
                                            return;
                                        }
                                    }
                                    Err(e) => {
                                        warn!(error = %e, "dropping non-JSON frame");
                                    }
                                }
                            }
                            Ok(Message::Close(_)) => break,
                            Ok(_) => {}
                            Err(e) => {
                                warn!(error = %e, "websocket failed");
                                erroring = true;
                                break;
                            }
                        }
                    }
                    let _ = self.phase.send_replace(if erroring {
                        ConnectionPhase::Erroring
                    } else {
                        ConnectionPhase::Closing
                    });
                }
                Err(e) => {
                    debug!(error = %e, "connection attempt failed");
                    let _ = self.phase.send_replace(ConnectionPhase::Erroring);
                }
            }

            let _ = self.phase.send_replace(ConnectionPhase::Disconnected);
            if events.send(ClientEvent::Closed).await.is_err() {
                return;
            }

            // Exactly one rejoin per attempt, no sooner than 5 s after the
            // attempt began.
            if gate.try_rejoin() {
                let delay = gate.delay_until_rejoin(Instant::now());
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
