//! Generic TTL+LRU key/value cache with single-flight computation.
//!
//! Expiry uses `tokio::time::Instant`, so tests can drive it with paused
//! time. Expired entries are dropped lazily on access and purged ahead of
//! any eviction-by-recency, matching the policy: expired first, then
//! least-recently-used.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tokio::time::{Duration, Instant};
use tracing::trace;

struct Slot<V> {
    value: V,
    expires_at: Instant,
    last_used: Instant,
}

/// Hit/miss counters and current size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache. 0.0 when untouched.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

/// Bounded TTL+LRU cache shared across all sessions.
///
/// Concurrent misses on the same key share a single computation: the first
/// caller runs `compute` inside a per-key `OnceCell` while later callers
/// await the same cell. Failed computations are not cached, so the next
/// miss retries.
pub struct ResponseCache<V> {
    capacity: usize,
    default_ttl: Duration,
    entries: Mutex<HashMap<String, Slot<V>>>,
    inflight: DashMap<String, Arc<OnceCell<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone + Send + Sync + 'static> ResponseCache<V> {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            capacity,
            default_ttl,
            entries: Mutex::new(HashMap::new()),
            inflight: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Return the cached value for `key`, or compute and store it.
    ///
    /// A hit refreshes `last_used`. On a miss, `compute` runs under
    /// single-flight semantics and the result is stored with
    /// `expires_at = now + ttl`. Errors from `compute` are returned to
    /// every waiting caller and nothing is stored.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.lookup(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key, "cache hit");
            return Ok(value);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(key, "cache miss");
        self.compute_shared(key, ttl, compute).await
    }

    /// Run `compute` for `key` under single-flight semantics.
    ///
    /// The value is stored before any in-flight cell is dropped, and the
    /// cell re-checks the cache before computing, so a caller that raced
    /// a just-finished computation picks up the stored value instead of
    /// recomputing it.
    async fn compute_shared<F, Fut, E>(&self, key: &str, ttl: Duration, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = self
            .inflight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let result = cell
            .get_or_try_init(|| async {
                if let Some(value) = self.lookup(key) {
                    return Ok(value);
                }
                let value = compute().await?;
                self.insert(key, value.clone(), ttl);
                Ok(value)
            })
            .await
            .cloned();

        // Drop only this round's cell; a newer cell under the same key
        // belongs to a later computation.
        self.inflight
            .remove_if(key, |_, existing| Arc::ptr_eq(existing, &cell));
        result
    }

    /// Drop a key's cached value, if any.
    pub fn invalidate(&self, key: &str) {
        self.lock_entries().remove(key);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.lock_entries().len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn lookup(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.lock_entries();
        match entries.get_mut(key) {
            Some(slot) if slot.expires_at > now => {
                slot.last_used = now;
                Some(slot.value.clone())
            }
            Some(_) => {
                // Expired: never serve it, drop it on the spot
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn insert(&self, key: &str, value: V, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.lock_entries();

        // Expired entries go first, before any eviction by recency
        entries.retain(|_, slot| slot.expires_at > now);

        while entries.len() >= self.capacity && !entries.contains_key(key) {
            let lru_key = entries
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(k, _)| k.clone());
            match lru_key {
                Some(k) => {
                    trace!(key = %k, "evicting least-recently-used cache entry");
                    entries.remove(&k);
                }
                None => break,
            }
        }

        entries.insert(
            key.to_string(),
            Slot {
                value,
                expires_at: now + ttl,
                last_used: now,
            },
        );
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, Slot<V>>> {
        // A poisoned lock only means a panicked holder; the map itself is
        // still usable.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
