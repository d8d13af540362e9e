//! Expiration Policy Module
//!
//! Resolves TTL requests into absolute expiration timestamps and decides
//! whether a timestamp has passed.
//!
//! Timestamps are nanoseconds since the Unix epoch. A timestamp of `0` (or
//! anything negative) means the entry never expires.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

// == Ttl ==
/// Expiration request attached to a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ttl {
    /// The entry never expires.
    Never,
    /// Use the cache's configured default expiration.
    #[default]
    Default,
    /// The entry expires this long after the write.
    After(Duration),
}

/// Entry never expires.
pub const NO_EXPIRATION: Ttl = Ttl::Never;

/// Substitute the cache-level default expiration.
pub const DEFAULT_EXPIRATION: Ttl = Ttl::Default;

impl Ttl {
    // == Resolve ==
    /// Returns the absolute expiration for a write happening at `now`.
    ///
    /// `Default` (and a zero `After`) is replaced by `default`. Anything that
    /// does not resolve to a positive duration yields `0`, i.e. never expires.
    pub fn expiration_at(self, default: Ttl, now: i64) -> i64 {
        let resolved = if self.is_default() { default } else { self };

        match resolved {
            Ttl::After(duration) if !duration.is_zero() => now.saturating_add(duration_nanos(duration)),
            _ => 0,
        }
    }

    fn is_default(self) -> bool {
        match self {
            Ttl::Default => true,
            Ttl::After(duration) => duration.is_zero(),
            Ttl::Never => false,
        }
    }
}

impl From<Duration> for Ttl {
    /// A zero duration is the "use default" sentinel.
    fn from(duration: Duration) -> Self {
        if duration.is_zero() {
            Ttl::Default
        } else {
            Ttl::After(duration)
        }
    }
}

// == Expired ==
/// Returns true when `expiration` is set and `now` is strictly past it.
pub fn is_expired(expiration: i64, now: i64) -> bool {
    expiration > 0 && now > expiration
}

// == Utility Functions ==
/// Returns the current Unix timestamp in nanoseconds.
pub fn now_nanos() -> i64 {
    // Out of range only after the year 2262.
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

fn duration_nanos(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX)
}
