//! Timestamp type used for claim registration times.
//!
//! Timestamps are Unix epoch seconds (UTC). The registry never reads the
//! clock itself; the caller's context carries the logical time of the call.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero). Also the `registered_at` of an absent claim.
    pub const EPOCH: Self = Self(0);

    pub const fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Current system time. A clock set before the epoch reads as the epoch.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// Absolute distance in seconds between two timestamps.
    pub fn distance(&self, other: Timestamp) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Source of the current time for call contexts.
///
/// Production code uses [`SystemClock`]; tests substitute a controllable
/// clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The operating system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}
