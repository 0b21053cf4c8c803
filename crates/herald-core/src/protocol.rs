//! Push-protocol vocabulary: client metadata enums, identifier kinds,
//! addressing targets, and the server→client message envelope.
//!
//! Wire values match the business backend's conventions exactly
//! (`S_WEB`/`C_APP`/…, `w`/`h`/`a`/`i`, `user-id`/`cid`, codes 2001/2002).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Server→client unicast/multicast message code.
pub const CODE_PEER: u16 = 2001;
/// Server→client broadcast message code.
pub const CODE_BROADCAST: u16 = 2002;

// ─────────────────────────────────────────────────────────────────────────────
// Client metadata
// ─────────────────────────────────────────────────────────────────────────────

/// Client application category. Several may be logged in at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientType {
    /// Super-admin management console.
    #[serde(rename = "S_WEB")]
    AdminWeb,
    /// Native mobile application.
    #[serde(rename = "C_APP")]
    MobileApp,
    /// Desktop web client.
    #[serde(rename = "C_WEB")]
    DesktopWeb,
    /// Mobile web (H5) client.
    #[serde(rename = "C_H5")]
    MobileWeb,
}

impl ClientType {
    /// The wire value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AdminWeb => "S_WEB",
            Self::MobileApp => "C_APP",
            Self::DesktopWeb => "C_WEB",
            Self::MobileWeb => "C_H5",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S_WEB" => Ok(Self::AdminWeb),
            "C_APP" => Ok(Self::MobileApp),
            "C_WEB" => Ok(Self::DesktopWeb),
            "C_H5" => Ok(Self::MobileWeb),
            _ => Err(()),
        }
    }
}

/// Terminal marker. Several may be logged in at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientFlag {
    /// Web browser.
    #[serde(rename = "w")]
    Web,
    /// Mobile web (H5).
    #[serde(rename = "h")]
    H5,
    /// Android.
    #[serde(rename = "a")]
    Android,
    /// iOS.
    #[serde(rename = "i")]
    Ios,
}

impl ClientFlag {
    /// The wire value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Web => "w",
            Self::H5 => "h",
            Self::Android => "a",
            Self::Ios => "i",
        }
    }
}

impl fmt::Display for ClientFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientFlag {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "w" => Ok(Self::Web),
            "h" => Ok(Self::H5),
            "a" => Ok(Self::Android),
            "i" => Ok(Self::Ios),
            _ => Err(()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identifier kinds
// ─────────────────────────────────────────────────────────────────────────────

/// How a realtime connection identifies itself: by user id or by CID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierKind {
    /// Identified by the business user id.
    #[serde(rename = "user-id")]
    UserId,
    /// Identified by the signed client identifier.
    #[serde(rename = "cid")]
    Cid,
}

impl IdentifierKind {
    /// The wire value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserId => "user-id",
            Self::Cid => "cid",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user-id" => Ok(Self::UserId),
            "cid" => Ok(Self::Cid),
            _ => Err(()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Push targets
// ─────────────────────────────────────────────────────────────────────────────

/// Unicast/multicast addressing tuple.
///
/// `manageSiteId` is always required. At least one of `userId`/`cid` must be
/// set; `userId` takes precedence when both are. `clientFlag`/`clientType`,
/// when present, restrict matches to connections whose own metadata equals
/// them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct P2PTarget {
    /// Business site the target connection belongs to.
    pub manage_site_id: String,
    /// Match connections registered under this user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Match connections registered under this CID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    /// Optional terminal-marker filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_flag: Option<ClientFlag>,
    /// Optional client-category filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_type: Option<ClientType>,
}

/// Broadcast addressing tuple: every live connection under a site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastTarget {
    /// Business site whose connections all match.
    pub manage_site_id: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Message envelope
// ─────────────────────────────────────────────────────────────────────────────

/// The transient server→client message. Dispatched and discarded; never
/// persisted or replayed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PushEnvelope {
    /// Message code: [`CODE_PEER`] or [`CODE_BROADCAST`].
    pub code: u16,
    /// Caller-supplied payload, forwarded opaquely.
    pub data: Value,
    /// Dispatch wall-clock time, Unix milliseconds.
    pub timestamp: i64,
}

impl PushEnvelope {
    /// Envelope for a unicast/multicast push.
    #[must_use]
    pub fn peer(data: Value, timestamp: i64) -> Self {
        Self {
            code: CODE_PEER,
            data,
            timestamp,
        }
    }

    /// Envelope for a broadcast push.
    #[must_use]
    pub fn broadcast(data: Value, timestamp: i64) -> Self {
        Self {
            code: CODE_BROADCAST,
            data,
            timestamp,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
