//! Versioned signing-secret store.
//!
//! Multiple secret versions coexist so rotation never invalidates previously
//! issued CIDs: verification consults whichever version a CID names, while
//! issuance always uses the externally supplied current version. The store is
//! built once from configuration and never mutated at runtime.

use serde::{Deserialize, Serialize};

/// One signing secret under a version label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRecord {
    /// Version label carried inside issued CIDs.
    pub version: String,
    /// The signing secret itself.
    pub key: String,
}

/// Ordered version→secret mapping plus the current-version pointer.
#[derive(Clone, Debug)]
pub struct SecretKeyStore {
    records: Vec<SecretRecord>,
    current_version: String,
}

impl SecretKeyStore {
    /// Build a store from configured records and the current version label.
    ///
    /// The current version is allowed to be absent from `records`; issuance
    /// will then fail while verification of older versions keeps working.
    #[must_use]
    pub fn new(records: Vec<SecretRecord>, current_version: impl Into<String>) -> Self {
        Self {
            records,
            current_version: current_version.into(),
        }
    }

    /// The version label new CIDs are signed under.
    #[must_use]
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// The secret for the current version, if configured.
    #[must_use]
    pub fn current_secret(&self) -> Option<&SecretRecord> {
        self.secret_for(&self.current_version)
    }

    /// The secret for an arbitrary version, if configured.
    #[must_use]
    pub fn secret_for(&self, version: &str) -> Option<&SecretRecord> {
        self.records.iter().find(|r| r.version == version)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
