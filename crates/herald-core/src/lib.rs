//! # herald-core
//!
//! Protocol vocabulary and the algorithmic core of the Herald gateway:
//! the boundary error taxonomy, the JSON response envelope, client and
//! identifier enums, push-target types, the versioned signing-secret store,
//! CID signing/verification, and the snowflake ID generator.
//!
//! Everything here is transport-agnostic — the HTTP/WebSocket surface lives
//! in `herald-server`.

#![deny(unsafe_code)]

pub mod cid;
pub mod errors;
pub mod protocol;
pub mod response;
pub mod secrets;
pub mod snowflake;

pub use cid::{Cid, CidCodec, CidError};
pub use errors::{ApiError, ApiErrorCode};
pub use protocol::{
    BroadcastTarget, CODE_BROADCAST, CODE_PEER, ClientFlag, ClientType, IdentifierKind, P2PTarget,
    PushEnvelope,
};
pub use response::ApiResponse;
pub use secrets::{SecretKeyStore, SecretRecord};
pub use snowflake::SnowflakeGenerator;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
