//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use serde::{Deserialize, Serialize};

use crate::cache::expiration::{is_expired, now_nanos};

// == Cache Entry ==
/// A stored value plus its absolute expiration timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry<V> {
    /// The stored value
    pub object: V,
    /// Expiration timestamp (Unix nanoseconds), 0 = no expiration
    pub expiration: i64,
}

impl<V> Entry<V> {
    // == Constructor ==
    /// Creates a new entry expiring at `expiration`.
    pub fn new(object: V, expiration: i64) -> Self {
        Self { object, expiration }
    }

    // == Is Expired ==
    /// Checks if the entry has expired as of `now`.
    ///
    /// Boundary condition: the entry stays live while `now` equals the
    /// expiration and is expired once `now` is strictly greater.
    pub fn is_expired_at(&self, now: i64) -> bool {
        is_expired(self.expiration, now)
    }

    /// Checks if the entry has expired against the wall clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_nanos())
    }

    /// Returns true if the entry has no expiration.
    pub fn is_persistent(&self) -> bool {
        self.expiration <= 0
    }
}
