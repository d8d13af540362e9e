//! GC Sweeper Task
//!
//! Background task that periodically removes expired cache entries.

use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::cache::{now_nanos, EntryStore};

// == Sweeper Handle ==
/// Owner-side handle of a running sweeper thread.
#[derive(Debug)]
pub struct SweeperHandle {
    thread: thread::JoinHandle<()>,
}

impl SweeperHandle {
    /// Returns true once the sweeper loop has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the sweeper thread to exit.
    pub fn join(self) -> thread::Result<()> {
        self.thread.join()
    }
}

/// Spawns a background sweeper that removes expired entries every `interval`.
///
/// The sweeper runs until `true` is published on `stop_rx`, the sender side
/// is dropped, or the store itself is dropped. It only keeps a weak
/// reference to the store.
///
/// It always runs on a dedicated named thread driving its own
/// current-thread runtime, never on the caller's runtime. A cache built
/// inside a short-lived `block_on`, or on a runtime whose callers block the
/// worker thread, keeps sweeping.
///
/// # Returns
/// `None` when `interval` is zero (sweeping disabled) or the thread could
/// not be started.
///
/// # Example
/// ```ignore
/// let store = Arc::new(RwLock::new(EntryStore::<i32>::new()));
/// let (stop_tx, stop_rx) = watch::channel(false);
/// let handle = spawn_sweeper(&store, Duration::from_secs(1), stop_rx);
/// // Later:
/// stop_tx.send_replace(true);
/// ```
pub fn spawn_sweeper<V>(
    store: &Arc<RwLock<EntryStore<V>>>,
    interval: Duration,
    stop_rx: watch::Receiver<bool>,
) -> Option<SweeperHandle>
where
    V: Send + Sync + 'static,
{
    if interval.is_zero() {
        info!("GC interval is zero, background sweeping disabled");
        return None;
    }

    let sweep = run_sweeper(Arc::downgrade(store), interval, stop_rx);

    let spawned = thread::Builder::new()
        .name("ttl-cache-sweeper".to_string())
        .spawn(move || {
            match tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
            {
                Ok(runtime) => runtime.block_on(sweep),
                Err(err) => error!("Failed to build GC sweeper runtime: {}", err),
            }
        });

    match spawned {
        Ok(thread) => Some(SweeperHandle { thread }),
        Err(err) => {
            error!("Failed to spawn GC sweeper thread: {}", err);
            None
        }
    }
}

async fn run_sweeper<V>(
    store: Weak<RwLock<EntryStore<V>>>,
    interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    info!("Starting GC sweeper with interval of {:?}", interval);

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(store) = store.upgrade() else {
                    break;
                };

                let removed = store.write().delete_expired(now_nanos());

                if removed > 0 {
                    info!("GC sweep: removed {} expired entries", removed);
                } else {
                    debug!("GC sweep: no expired entries found");
                }
            }
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }

    info!("GC sweeper stopped");
}
