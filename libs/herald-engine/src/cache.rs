use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use herald_api::Event;

use crate::error::EngineError;

struct CorrelationEntry {
    events: Vec<Arc<Event>>,
    last_write: Instant,
}

/// Correlation id → events in arrival order, expiring on idle.
///
/// An entry expires `idle` after its last append. Reads never extend it.
/// Expired entries are invisible to `get` straight away and are dropped
/// from memory by `purge_expired`.
///
/// Mutation is meant to go through a single [`CacheWriter`] task; the lock
/// only separates that writer from concurrent readers.
pub struct CorrelationCache {
    entries: RwLock<HashMap<String, CorrelationEntry>>,
    idle: Duration,
}

impl std::fmt::Debug for CorrelationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelationCache")
            .field("idle", &self.idle)
            .field("entries", &self.read().len())
            .finish()
    }
}

impl CorrelationCache {
    pub fn new(idle: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            idle,
        }
    }

    /// Append `event` under `correlation_id`, creating the entry if it is
    /// absent and starting it over if it had expired.
    pub fn append(&self, correlation_id: &str, event: Arc<Event>) {
        let now = Instant::now();
        let mut guard = self.write();
        match guard.get_mut(correlation_id) {
            Some(entry) if !self.is_expired(entry, now) => {
                entry.events.push(event);
                entry.last_write = now;
            }
            _ => {
                guard.insert(
                    correlation_id.to_string(),
                    CorrelationEntry {
                        events: vec![event],
                        last_write: now,
                    },
                );
            }
        }
    }

    /// Events recorded for `correlation_id`, oldest first.
    pub fn get(&self, correlation_id: &str) -> Option<Vec<Arc<Event>>> {
        let now = Instant::now();
        let guard = self.read();
        guard
            .get(correlation_id)
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| entry.events.clone())
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.write();
        let before = guard.len();
        guard.retain(|_, entry| !self.is_expired(entry, now));
        before - guard.len()
    }

    /// Number of entries held, expired or not.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, entry: &CorrelationEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.last_write) >= self.idle
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CorrelationEntry>> {
        match self.entries.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("correlation cache read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CorrelationEntry>> {
        match self.entries.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("correlation cache write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Writer task: the only path that mutates the cache
// ---------------------------------------------------------------------------

struct Append {
    correlation_id: String,
    event: Arc<Event>,
}

/// Handle to the cache writer task. Cheap to clone.
#[derive(Clone)]
pub struct CacheWriter {
    tx: mpsc::Sender<Append>,
}

impl CacheWriter {
    /// Queue an append. Waits only while the hand-off channel is full.
    pub async fn append(&self, correlation_id: String, event: Arc<Event>) -> Result<(), EngineError> {
        self.tx
            .send(Append {
                correlation_id,
                event,
            })
            .await
            .map_err(|_| EngineError::CacheClosed)
    }
}

/// Spawn the task that owns all cache mutation.
///
/// It applies queued appends in arrival order and sweeps expired entries
/// every `cleanup_interval`. On cancellation it drains what is already
/// queued and exits.
pub fn spawn_cache_writer(
    cache: Arc<CorrelationCache>,
    capacity: usize,
    cleanup_interval: Duration,
    shutdown: CancellationToken,
) -> (CacheWriter, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Append>(capacity);

    let handle = tokio::spawn(async move {
        let mut sweep = tokio::time::interval_at(Instant::now() + cleanup_interval, cleanup_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    rx.close();
                    while let Some(append) = rx.recv().await {
                        cache.append(&append.correlation_id, append.event);
                    }
                    break;
                }

                _ = sweep.tick() => {
                    let purged = cache.purge_expired();
                    tracing::debug!(purged, remaining = cache.len(), "correlation cache swept");
                }

                msg = rx.recv() => match msg {
                    Some(append) => cache.append(&append.correlation_id, append.event),
                    None => break,
                },
            }
        }

        tracing::info!("cache writer stopped");
    });

    (CacheWriter { tx }, handle)
}
