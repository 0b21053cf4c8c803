//! Client identifier (CID) signing and verification.
//!
//! A CID is `random.version.signature` where `signature` is the lowercase-hex
//! SHA-1 of the random component concatenated with the signing secret for
//! `version`. The signature provides integrity/authenticity, not
//! confidentiality — the random component is public. Verification works for
//! ANY version still present in the store, so rotating the current version
//! never invalidates CIDs issued under older versions.

use sha1::{Digest, Sha1};
use std::fmt;
use thiserror::Error;

use crate::secrets::SecretKeyStore;
use crate::snowflake::SnowflakeGenerator;

/// A parsed three-part client identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cid {
    /// Time-ordered random component (decimal snowflake ID).
    pub random: String,
    /// Secret version the signature was computed under.
    pub version: String,
    /// Lowercase-hex SHA-1 over `random ++ secret`.
    pub signature: String,
}

impl Cid {
    /// Parse `random.version.signature`; `None` unless exactly three
    /// non-empty parts.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split('.');
        let random = parts.next()?;
        let version = parts.next()?;
        let signature = parts.next()?;
        if parts.next().is_some() || random.is_empty() || version.is_empty() || signature.is_empty()
        {
            return None;
        }
        Some(Self {
            random: random.to_owned(),
            version: version.to_owned(),
            signature: signature.to_owned(),
        })
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.random, self.version, self.signature)
    }
}

/// CID issuance failures.
#[derive(Debug, Error)]
pub enum CidError {
    /// The store has no secret for the current version.
    #[error("no signing secret configured for current version {version}")]
    NoCurrentSecret {
        /// The version issuance was attempted under.
        version: String,
    },
}

/// Single-round signature: lowercase-hex SHA-1 over `random ++ key`.
#[must_use]
pub fn sign(random: &str, key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(random.as_bytes());
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Builds and verifies CID strings against a [`SecretKeyStore`].
#[derive(Clone, Debug)]
pub struct CidCodec {
    store: SecretKeyStore,
}

impl CidCodec {
    /// Create a codec over the given store.
    #[must_use]
    pub fn new(store: SecretKeyStore) -> Self {
        Self { store }
    }

    /// Issue a fresh CID under the store's current version.
    ///
    /// Fails only when no secret is configured for the current version.
    pub fn issue(&self, ids: &SnowflakeGenerator) -> Result<Cid, CidError> {
        let Some(secret) = self.store.current_secret() else {
            return Err(CidError::NoCurrentSecret {
                version: self.store.current_version().to_owned(),
            });
        };
        let random = ids.next_string();
        let signature = sign(&random, &secret.key);
        Ok(Cid {
            random,
            version: secret.version.clone(),
            signature,
        })
    }

    /// Verify a CID string. Returns `false` — never errors — on malformed
    /// input, an unknown version, or a signature mismatch.
    #[must_use]
    pub fn verify(&self, raw: &str) -> bool {
        let Some(cid) = Cid::parse(raw) else {
            return false;
        };
        let Some(secret) = self.store.secret_for(&cid.version) else {
            return false;
        };
        sign(&cid.random, &secret.key) == cid.signature
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
