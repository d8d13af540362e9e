//! Cache Store Module
//!
//! The unlocked entry map. Every time-dependent operation takes `now`
//! (Unix nanoseconds) from the caller; locking lives in [`crate::Cache`].

use std::collections::HashMap;

use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheStats, Entry};
use crate::error::{CacheError, Result};

// == Entry Store ==
/// Key to entry mapping with TTL semantics.
#[derive(Debug)]
pub struct EntryStore<V> {
    /// Key-value storage
    entries: HashMap<String, Entry<V>>,
    /// Activity counters
    stats: StatsRecorder,
}

impl<V> Default for EntryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> EntryStore<V> {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            stats: StatsRecorder::default(),
        }
    }

    // == Set ==
    /// Inserts or overwrites `key` unconditionally.
    pub fn set(&mut self, key: String, object: V, expiration: i64) {
        self.entries.insert(key, Entry::new(object, expiration));
    }

    // == Add ==
    /// Inserts `key` unless it holds a live entry.
    ///
    /// An expired entry that has not been swept yet is overwritten.
    pub fn add(&mut self, key: String, object: V, expiration: i64, now: i64) -> Result<()> {
        if self.live_entry(&key, now).is_some() {
            return Err(CacheError::KeyAlreadyExists(key));
        }
        self.set(key, object, expiration);
        Ok(())
    }

    // == Update ==
    /// Overwrites `key` only if it holds a live entry.
    pub fn update(&mut self, key: String, object: V, expiration: i64, now: i64) -> Result<()> {
        if self.live_entry(&key, now).is_none() {
            return Err(CacheError::KeyNotFound(key));
        }
        self.set(key, object, expiration);
        Ok(())
    }

    // == Get ==
    /// Returns a copy of the value if the entry exists and is live.
    ///
    /// Expired entries read as absent even before a sweep removes them.
    pub fn get(&self, key: &str, now: i64) -> Option<V>
    where
        V: Clone,
    {
        match self.live_entry(key, now) {
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.object.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    fn live_entry(&self, key: &str, now: i64) -> Option<&Entry<V>> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
    }

    // == Delete ==
    /// Removes `key` if present.
    pub fn delete(&mut self, key: &str) {
        self.entries.remove(key);
    }

    // == Delete Expired ==
    /// Removes every entry expired as of `now`.
    ///
    /// Returns the number of entries removed.
    pub fn delete_expired(&mut self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));

        let removed = before - self.entries.len();
        self.stats.record_expired(removed);
        removed
    }

    // == Merge ==
    /// Installs loaded entries without clobbering live ones.
    ///
    /// A loaded key is taken only when the key is absent or its current
    /// entry is expired. Returns the number of entries installed.
    pub fn merge(&mut self, items: HashMap<String, Entry<V>>, now: i64) -> usize {
        let mut installed = 0;

        for (key, entry) in items {
            if self.live_entry(&key, now).is_none() {
                self.entries.insert(key, entry);
                installed += 1;
            }
        }

        installed
    }

    // == Flush ==
    /// Replaces the whole map with an empty one.
    pub fn flush(&mut self) {
        self.entries = HashMap::new();
    }

    /// Read access to the raw map, expired entries included.
    pub fn items(&self) -> &HashMap<String, Entry<V>> {
        &self.entries
    }

    // == Length ==
    /// Returns the raw number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.entries.len())
    }
}
