//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// `add` on a key that holds a live entry
    #[error("Key already exists: {0}")]
    KeyAlreadyExists(String),

    /// `update` on a key with no live entry
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// A stored value could not be encoded into a snapshot
    #[error("Snapshot encoding failed: {0}")]
    SnapshotEncoding(String),

    /// Underlying stream or file failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or truncated snapshot data
    #[error("CBOR decode error: {0}")]
    CborDecode(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
