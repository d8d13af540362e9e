//! Cache Module
//!
//! In-memory entry store with TTL expiration, the thread-safe `Cache`
//! handle, and snapshot persistence.

mod engine;
mod entry;
mod expiration;
mod snapshot;
mod stats;
mod store;
mod value;


// Re-export public types
pub use engine::Cache;
pub use entry::Entry;
pub use expiration::{is_expired, now_nanos, Ttl, DEFAULT_EXPIRATION, NO_EXPIRATION};
pub use stats::CacheStats;
pub use store::EntryStore;
pub use value::Value;
