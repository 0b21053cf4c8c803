//! Live-connection registry.
//!
//! Tracks every open realtime connection keyed by `(identifier, kind)` and
//! enforces at most one live connection per key: a second upgrade attempt for
//! a held key is rejected and the existing holder keeps its session.
//!
//! A single mutex guards the whole table, and dispatch runs under the same
//! mutex, so admission, eviction, and push are each atomic relative to one
//! another — no further locking discipline is needed anywhere above this.

use std::collections::HashMap;
use std::sync::Arc;

use herald_core::{ClientFlag, ClientType, IdentifierKind};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

/// Identity under which a connection is admitted. Unique among live
/// connections at any instant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionKey {
    /// The user id or CID string.
    pub identifier: String,
    /// Which of the two it is.
    pub kind: IdentifierKind,
}

/// Routing metadata carried alongside a live socket.
///
/// Stored as an explicit struct in the registry entry rather than serialized
/// onto the connection itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attachment {
    /// Business site the connection belongs to. Optional at admission; a
    /// connection without a site is invisible to site-scoped pushes.
    pub manage_site_id: Option<String>,
    /// Client application category, when supplied and recognized.
    pub client_type: Option<ClientType>,
    /// Terminal marker, when supplied and recognized.
    pub client_flag: Option<ClientFlag>,
}

/// Outbound channel handle for one connection. Dropping it (via eviction)
/// ends the connection task.
pub type OutboundSender = mpsc::Sender<Arc<String>>;

/// Admission failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdmitError {
    /// A live connection already holds this `(identifier, kind)`.
    #[error("a live connection already holds this identity")]
    Duplicate,
}

/// Outcome counts for one dispatch pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Connections that matched the target set.
    pub matched: usize,
    /// Matches whose channel accepted the message.
    pub delivered: usize,
    /// Matches evicted because their channel was full or closed.
    pub evicted: usize,
}

struct Registered {
    serial: u64,
    attachment: Attachment,
    sender: OutboundSender,
}

struct RegistryInner {
    connections: HashMap<ConnectionKey, Registered>,
    next_serial: u64,
}

/// The mutex-guarded connection table.
pub struct ConnectionRegistry {
    inner: Mutex<RegistryInner>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                connections: HashMap::new(),
                next_serial: 0,
            }),
        }
    }

    /// Admit a connection under `key`, or reject it when the key is held.
    ///
    /// Returns a serial that must be presented back to [`evict`] so a stale
    /// close task cannot remove a newer connection that reused the key.
    ///
    /// [`evict`]: Self::evict
    pub fn admit(
        &self,
        key: ConnectionKey,
        attachment: Attachment,
        sender: OutboundSender,
    ) -> Result<u64, AdmitError> {
        let mut inner = self.inner.lock();
        if inner.connections.contains_key(&key) {
            return Err(AdmitError::Duplicate);
        }
        inner.next_serial += 1;
        let serial = inner.next_serial;
        debug!(identifier = %key.identifier, kind = %key.kind, serial, "connection admitted");
        let _ = inner.connections.insert(
            key,
            Registered {
                serial,
                attachment,
                sender,
            },
        );
        Ok(serial)
    }

    /// Remove the entry for `key` if it still belongs to `serial`.
    ///
    /// Idempotent: evicting an absent or superseded entry is a no-op.
    /// Returns whether an entry was removed.
    pub fn evict(&self, key: &ConnectionKey, serial: u64) -> bool {
        let mut inner = self.inner.lock();
        let matches = inner
            .connections
            .get(key)
            .is_some_and(|c| c.serial == serial);
        if matches {
            let _ = inner.connections.remove(key);
            debug!(identifier = %key.identifier, kind = %key.kind, serial, "connection evicted");
        }
        matches
    }

    /// Whether a live connection holds `key`.
    #[must_use]
    pub fn contains(&self, key: &ConnectionKey) -> bool {
        self.inner.lock().connections.contains_key(key)
    }

    /// Number of live connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().connections.len()
    }

    /// Whether no connections are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `payload` to every connection accepted by `matches`.
    ///
    /// Runs entirely under the registry mutex: the match set is a consistent
    /// point-in-time view, and a send failure (full or closed channel) evicts
    /// that connection in the same pass without aborting delivery to the
    /// remaining matches.
    pub fn dispatch(
        &self,
        matches: impl Fn(&ConnectionKey, &Attachment) -> bool,
        payload: &Arc<String>,
    ) -> DispatchReport {
        let mut inner = self.inner.lock();
        let mut report = DispatchReport::default();
        let mut dead = Vec::new();
        for (key, conn) in &inner.connections {
            if !matches(key, &conn.attachment) {
                continue;
            }
            report.matched += 1;
            if conn.sender.try_send(Arc::clone(payload)).is_ok() {
                report.delivered += 1;
            } else {
                dead.push(key.clone());
            }
        }
        for key in &dead {
            let _ = inner.connections.remove(key);
            debug!(identifier = %key.identifier, kind = %key.kind, "connection evicted on failed send");
        }
        report.evicted = dead.len();
        report
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
