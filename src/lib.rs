//! TTL Cache - An embedded in-process key-value cache
//!
//! Provides per-entry expiration, a background GC sweeper and snapshot
//! persistence to any byte stream.
//!
//! ```rust
//! use std::time::Duration;
//! use ttl_cache::{Cache, Value, DEFAULT_EXPIRATION, NO_EXPIRATION};
//!
//! let cache: Cache<Value> = Cache::new(Duration::from_secs(300), Duration::from_secs(60));
//!
//! cache.set("session", Value::from("abc"), DEFAULT_EXPIRATION);
//! cache.set("config", Value::from(42), NO_EXPIRATION);
//! assert_eq!(cache.get("config"), Some(Value::Int(42)));
//!
//! cache.stop_gc();
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{
    Cache, CacheStats, Entry, Ttl, Value, DEFAULT_EXPIRATION, NO_EXPIRATION,
};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
