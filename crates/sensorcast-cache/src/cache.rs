//! TTL cache with lazy expiry on read and periodic physical removal.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::entry::CacheEntry;

/// Shared key/value cache of serialized payloads.
///
/// Cloning is cheap and every clone sees the same entries.
///
/// - Reads never observe an expired value: [`get`](Self::get) treats an
///   entry at or past its deadline as absent.
/// - Reads never remove anything. Expired entries stay resident until a
///   sweep runs, either via [`sweep_expired`](Self::sweep_expired) or the
///   task started by [`spawn_sweeper`](Self::spawn_sweeper).
/// - Readers share the lock; every mutation holds it exclusively for one
///   critical section.
#[derive(Clone)]
pub struct TtlCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    config: CacheConfig,
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl TtlCache {
    /// Create an empty cache.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Store `value` under `key`, replacing any prior entry and its deadline.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Bytes>, ttl: Duration) {
        let key = key.into();
        let entry = CacheEntry::new(value.into(), ttl);
        trace!(key = %key, ttl_ms = ttl.as_millis() as u64, "Cache set");
        self.entries.write().insert(key, entry);
    }

    /// Look up a live entry.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if entry.is_expired() {
            trace!(key = %key, "Cache entry expired");
            return None;
        }
        Some(entry.value().clone())
    }

    /// Remove an entry. Removing an absent key is a no-op.
    pub fn delete(&self, key: &str) {
        self.entries.write().remove(key);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of resident entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no entries are resident.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Physically remove every expired entry. Returns the number removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, entry| {
            let keep = !entry.is_expired_at(now);
            if !keep {
                trace!(key = %key, "Sweeping expired cache entry");
            }
            keep
        });
        before - entries.len()
    }

    /// Run [`sweep_expired`](Self::sweep_expired) every `period` until
    /// `shutdown` is cancelled.
    ///
    /// The first sweep happens one full period after spawning.
    pub fn spawn_sweeper(&self, period: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let cache = self.clone();
        let period = period.max(Duration::from_millis(1));
        let start = Instant::now() + period;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            debug!(period_secs = period.as_secs(), "Cache sweeper started");

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = cache.sweep_expired();
                        if removed > 0 {
                            debug!(removed, remaining = cache.len(), "Swept expired cache entries");
                        }
                    }
                }
            }

            debug!("Cache sweeper stopped");
        })
    }
}
