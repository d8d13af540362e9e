//! Cache Engine Module
//!
//! Thread-safe cache handle: one `RwLock` around the entry store, a
//! background GC sweeper, and snapshot save/load.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::cache::{now_nanos, snapshot, CacheStats, EntryStore, Ttl, Value};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::tasks::{spawn_sweeper, SweeperHandle};

// == Cache ==
/// In-process key-value cache with per-entry TTL.
///
/// Every public operation takes the store lock exactly once: exclusive for
/// writes, shared for reads. Values are cloned out of the cache on `get`.
///
/// A sweeper removing expired entries starts with the cache and stops on
/// [`Cache::stop_gc`] or when the cache is dropped.
pub struct Cache<V = Value> {
    store: Arc<RwLock<EntryStore<V>>>,
    default_expiration: Ttl,
    stop_tx: watch::Sender<bool>,
    sweeper: Option<SweeperHandle>,
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache and starts its background sweeper.
    ///
    /// The sweeper runs on its own thread, independent of any tokio runtime
    /// the caller is on, so it survives the runtime that created the cache.
    ///
    /// # Arguments
    /// * `default_expiration` - Expiration used for writes requesting [`Ttl::Default`]
    /// * `gc_interval` - Period between sweeps, zero disables the sweeper
    pub fn new(default_expiration: impl Into<Ttl>, gc_interval: Duration) -> Self {
        Self::with_config(
            CacheConfig::new()
                .with_default_expiration(default_expiration)
                .with_gc_interval(gc_interval),
        )
    }

    /// Creates a cache from a [`CacheConfig`].
    pub fn with_config(config: CacheConfig) -> Self {
        let store = Arc::new(RwLock::new(EntryStore::new()));
        let (stop_tx, stop_rx) = watch::channel(false);
        let sweeper = spawn_sweeper(&store, config.gc_interval, stop_rx);

        Self {
            store,
            default_expiration: config.default_expiration,
            stop_tx,
            sweeper,
        }
    }

    // == Set ==
    /// Inserts or overwrites `key`.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: impl Into<Ttl>) {
        let now = now_nanos();
        let expiration = ttl.into().expiration_at(self.default_expiration, now);
        self.store.write().set(key.into(), value, expiration);
    }

    // == Add ==
    /// Inserts `key` only if it has no live entry.
    ///
    /// # Errors
    /// [`CacheError::KeyAlreadyExists`](crate::CacheError::KeyAlreadyExists)
    /// if a live entry is present; the stored value is left untouched.
    pub fn add(&self, key: impl Into<String>, value: V, ttl: impl Into<Ttl>) -> Result<()> {
        let now = now_nanos();
        let expiration = ttl.into().expiration_at(self.default_expiration, now);
        self.store.write().add(key.into(), value, expiration, now)
    }

    // == Update ==
    /// Replaces the value of `key` only if it has a live entry.
    ///
    /// # Errors
    /// [`CacheError::KeyNotFound`](crate::CacheError::KeyNotFound) if the key
    /// is absent or expired; nothing is inserted.
    pub fn update(&self, key: impl Into<String>, value: V, ttl: impl Into<Ttl>) -> Result<()> {
        let now = now_nanos();
        let expiration = ttl.into().expiration_at(self.default_expiration, now);
        self.store.write().update(key.into(), value, expiration, now)
    }

    // == Get ==
    /// Returns a copy of the value if `key` holds a live entry.
    pub fn get(&self, key: &str) -> Option<V> {
        self.store.read().get(key, now_nanos())
    }

    // == Delete ==
    /// Removes `key` if present.
    pub fn delete(&self, key: &str) {
        self.store.write().delete(key);
    }

    // == Count ==
    /// Returns the raw number of stored entries, including expired entries
    /// that have not been swept yet.
    pub fn count(&self) -> usize {
        self.store.read().len()
    }

    // == Flush ==
    /// Removes every entry.
    pub fn flush(&self) {
        self.store.write().flush();
    }

    // == Delete Expired ==
    /// Runs one sweep now. Returns the number of entries removed.
    pub fn delete_expired(&self) -> usize {
        self.store.write().delete_expired(now_nanos())
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.store.read().stats()
    }
}

impl<V> Cache<V> {
    /// Expiration substituted for [`Ttl::Default`] writes.
    pub fn default_expiration(&self) -> Ttl {
        self.default_expiration
    }

    // == Stop GC ==
    /// Signals the background sweeper to stop.
    ///
    /// Never blocks and may be called any number of times, including after
    /// the sweeper has exited or when none was started.
    pub fn stop_gc(&self) {
        if !self.stop_tx.send_replace(true) {
            info!("GC sweeper stop requested");
        }
    }

    /// Returns true while the background sweeper loop is alive.
    pub fn is_gc_running(&self) -> bool {
        self.sweeper
            .as_ref()
            .is_some_and(|sweeper| !sweeper.is_finished())
    }
}

impl<V> Cache<V>
where
    V: Serialize,
{
    // == Save ==
    /// Writes a snapshot of every stored entry to `writer`.
    ///
    /// The map is encoded under the shared lock, so the snapshot is a
    /// consistent point-in-time view. Expired-but-unswept entries are included.
    ///
    /// # Errors
    /// [`CacheError::SnapshotEncoding`](crate::CacheError::SnapshotEncoding)
    /// if a value cannot be encoded, or an I/O error from `writer`.
    pub fn save<W: Write>(&self, mut writer: W) -> Result<()> {
        let bytes = {
            let store = self.store.read();
            snapshot::encode(store.items())?
        };

        writer.write_all(&bytes)?;
        writer.flush()?;

        debug!("Snapshot saved: {} bytes", bytes.len());
        Ok(())
    }

    /// Creates (or truncates) `path` and saves a snapshot into it.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.save(&mut writer)?;

        let file = writer.into_inner().map_err(|err| err.into_error())?;
        file.sync_all()?;
        Ok(())
    }
}

impl<V> Cache<V>
where
    V: DeserializeOwned,
{
    // == Load ==
    /// Reads a snapshot from `reader` and merges it into the cache.
    ///
    /// Loaded entries never replace a live entry; they only fill absent keys
    /// or keys whose current entry has expired.
    ///
    /// # Errors
    /// A decode error if the stream is malformed. The cache is unchanged in
    /// that case.
    pub fn load<R: Read>(&self, reader: R) -> Result<()> {
        let items = snapshot::decode(reader)?;
        let decoded = items.len();

        let installed = self.store.write().merge(items, now_nanos());

        debug!(
            "Snapshot loaded: {} entries decoded, {} installed",
            decoded, installed
        );
        Ok(())
    }

    /// Opens `path` and loads a snapshot from it.
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::open(path.as_ref())?;
        self.load(BufReader::new(file))
    }
}

impl<V> Drop for Cache<V> {
    fn drop(&mut self) {
        self.stop_tx.send_replace(true);
    }
}
