//! # herald-settings
//!
//! Configuration management with layered sources for the Herald gateway.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`HeraldSettings::default()`]
//! 2. **User file** — `~/.herald/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `HERALD_*` overrides (highest priority)
//!
//! The secret table, the current secret version, and the business-site
//! directory all live here; the core treats them as read-only inputs.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
