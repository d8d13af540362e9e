//! Configuration Module
//!
//! Construction parameters for a [`crate::Cache`].

use std::time::Duration;

use crate::cache::Ttl;

/// Cache configuration parameters.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use ttl_cache::{CacheConfig, Ttl};
///
/// let config = CacheConfig::default()
///     .with_default_expiration(Ttl::After(Duration::from_secs(300)))
///     .with_gc_interval(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Expiration applied when a write asks for [`Ttl::Default`]
    pub default_expiration: Ttl,
    /// Period between background sweeps, zero disables the sweeper
    pub gc_interval: Duration,
}

impl CacheConfig {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the expiration substituted for [`Ttl::Default`] writes.
    pub fn with_default_expiration(mut self, default_expiration: impl Into<Ttl>) -> Self {
        self.default_expiration = default_expiration.into();
        self
    }

    /// Sets how often the background sweeper removes expired entries.
    pub fn with_gc_interval(mut self, gc_interval: Duration) -> Self {
        self.gc_interval = gc_interval;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_expiration: Ttl::Never,
            gc_interval: Duration::from_secs(60),
        }
    }
}
