//! Snowflake-style ID generation.
//!
//! 64-bit layout: 41 bits of milliseconds since the Herald epoch, 10 bits of
//! node discriminator, 12 bits of per-millisecond sequence, rendered as a
//! decimal string. IDs trend monotonically and are collision-resistant within
//! a process.
//!
//! Exactly one generator exists per process, constructed explicitly at
//! startup and shared from there. A restart resets the sequence component —
//! acceptable for CID issuance, where the signature rather than the raw ID
//! determines validity.

use parking_lot::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Herald epoch: 2020-01-01T00:00:00Z, Unix milliseconds.
const EPOCH_MS: u64 = 1_577_836_800_000;

const NODE_BITS: u32 = 10;
const SEQ_BITS: u32 = 12;
const NODE_MASK: u64 = (1 << NODE_BITS) - 1;
const SEQ_MASK: u64 = (1 << SEQ_BITS) - 1;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[derive(Debug)]
struct GeneratorState {
    last_ms: u64,
    sequence: u64,
}

/// Time-ordered unique ID generator.
#[derive(Debug)]
pub struct SnowflakeGenerator {
    node: u64,
    state: Mutex<GeneratorState>,
}

impl SnowflakeGenerator {
    /// Create a generator with a fixed node discriminator (low 10 bits kept).
    #[must_use]
    pub fn new(node: u16) -> Self {
        Self {
            node: u64::from(node) & NODE_MASK,
            state: Mutex::new(GeneratorState {
                last_ms: 0,
                sequence: 0,
            }),
        }
    }

    /// Create a generator with a random node discriminator.
    ///
    /// Used at startup when no node id is configured; randomness keeps two
    /// concurrently running processes from minting the same ID stream.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::random_range(0u16..1 << NODE_BITS))
    }

    /// The node discriminator baked into every ID.
    #[must_use]
    pub fn node(&self) -> u16 {
        // Always fits: masked to 10 bits at construction.
        u16::try_from(self.node).unwrap_or(0)
    }

    /// Produce the next ID.
    ///
    /// Rolls the sequence within a millisecond and spins to the next
    /// millisecond on overflow (at most ~1 ms under a normal clock). A clock
    /// stepping backwards keeps issuing on the last-seen millisecond rather
    /// than going back in time.
    pub fn next_id(&self) -> u64 {
        let mut state = self.state.lock();
        let mut now = now_ms();
        if now < state.last_ms {
            // Clock stepped back; stay on the last-seen millisecond.
            now = state.last_ms;
        }
        if now == state.last_ms {
            state.sequence = (state.sequence + 1) & SEQ_MASK;
            if state.sequence == 0 {
                // Sequence exhausted for this millisecond.
                while now <= state.last_ms {
                    now = now_ms();
                }
            }
        } else {
            state.sequence = 0;
        }
        state.last_ms = now;
        ((now - EPOCH_MS) << (NODE_BITS + SEQ_BITS)) | (self.node << SEQ_BITS) | state.sequence
    }

    /// Produce the next ID as the decimal string carried inside CIDs.
    #[must_use]
    pub fn next_string(&self) -> String {
        self.next_id().to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
