//! Reconnect pacing and exclusivity.
//!
//! One [`RejoinGate`] exists per connection attempt. It remembers when the
//! attempt began, enforces the 5-second floor between attempt starts, and
//! latches so a single attempt schedules at most one rejoin — the transport
//! may surface both an error and a close for the same failure, and only the
//! first may trigger the retry chain.

use std::time::{Duration, Instant};

/// Minimum interval between the starts of two connection attempts.
pub const MIN_REJOIN_DELAY: Duration = Duration::from_secs(5);

/// Lifecycle phases of a realtime connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// No connection and no attempt in flight.
    Disconnected,
    /// Attempt in flight, upgrade not yet accepted.
    Connecting,
    /// Upgrade accepted; messages may arrive.
    Open,
    /// Server or client initiated an orderly close.
    Closing,
    /// The connection or an attempt failed.
    Erroring,
}

/// Per-attempt rejoin gate.
#[derive(Debug)]
pub struct RejoinGate {
    started: Instant,
    rejoined: bool,
}

impl RejoinGate {
    /// Open a gate for an attempt that begins now.
    #[must_use]
    pub fn begin(now: Instant) -> Self {
        Self {
            started: now,
            rejoined: false,
        }
    }

    /// Claim the single rejoin this attempt is allowed. The first caller gets
    /// `true`; everyone after gets `false`.
    pub fn try_rejoin(&mut self) -> bool {
        if self.rejoined {
            return false;
        }
        self.rejoined = true;
        true
    }

    /// How much longer to wait before the next attempt may begin: the
    /// remainder of the 5-second floor measured from this attempt's start.
    #[must_use]
    pub fn delay_until_rejoin(&self, now: Instant) -> Duration {
        MIN_REJOIN_DELAY.saturating_sub(now.duration_since(self.started))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_is_single_shot() {
        let mut gate = RejoinGate::begin(Instant::now());
        assert!(gate.try_rejoin());
        assert!(!gate.try_rejoin());
        assert!(!gate.try_rejoin());
    }

    #[test]
    fn delay_counts_from_attempt_start() {
        let start = Instant::now();
        let gate = RejoinGate::begin(start);

        // One second into the attempt: four seconds left of the floor.
        let remaining = gate.delay_until_rejoin(start + Duration::from_secs(1));
        assert_eq!(remaining, Duration::from_secs(4));

        // A long-lived connection owes no wait at all.
        let remaining = gate.delay_until_rejoin(start + Duration::from_secs(90));
        assert_eq!(remaining, Duration::ZERO);
    }

    #[test]
    fn delay_at_floor_boundary_is_zero() {
        let start = Instant::now();
        let gate = RejoinGate::begin(start);
        assert_eq!(gate.delay_until_rejoin(start + MIN_REJOIN_DELAY), Duration::ZERO);
    }

    #[test]
    fn immediate_failure_waits_full_floor() {
        let start = Instant::now();
        let gate = RejoinGate::begin(start);
        assert_eq!(gate.delay_until_rejoin(start), MIN_REJOIN_DELAY);
    }
}
