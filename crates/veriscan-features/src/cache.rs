//! Bounded LRU memoization keyed by chunk text
//!
//! Chunk-level values (embeddings, perplexity) are expensive to compute and
//! recur whenever the same text is classified again. The cache is shared
//! across concurrent requests; lookups take a short exclusive lock because a
//! hit refreshes recency.

use linked_hash_map::LinkedHashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for cache effectiveness
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheMetrics {
    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time view of a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, 0 when nothing was looked up
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Thread-safe LRU map from text to a cloneable value.
///
/// A capacity of zero disables memoization entirely.
pub struct BoundedCache<V> {
    entries: Mutex<LinkedHashMap<String, V>>,
    capacity: usize,
    metrics: CacheMetrics,
}

impl<V: Clone> BoundedCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(LinkedHashMap::new()),
            capacity,
            metrics: CacheMetrics::default(),
        }
    }

    /// Look up `key`, marking it most recently used on a hit
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock();
        match entries.get_refresh(key) {
            Some(value) => {
                self.metrics.record_hit();
                Some(value.clone())
            }
            None => {
                self.metrics.record_miss();
                None
            }
        }
    }

    /// Insert or replace `key`, evicting least recently used entries
    pub fn insert(&self, key: impl Into<String>, value: V) {
        if self.capacity == 0 {
            return;
        }

        let mut entries = self.entries.lock();
        entries.insert(key.into(), value);
        let mut evicted = 0;
        while entries.len() > self.capacity {
            if entries.pop_front().is_none() {
                break;
            }
            self.metrics.record_eviction();
            evicted += 1;
        }
        if evicted > 0 {
            tracing::debug!(evicted, capacity = self.capacity, "Evicted least recently used entries");
        }
    }

    /// Return the cached value, or compute it and store it only on success
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &str,
        compute: impl FnOnce() -> std::result::Result<V, E>,
    ) -> std::result::Result<V, E> {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        // Computed outside the lock; racing computations of one key are
        // idempotent and the later insert wins.
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all entries and zero the counters
    pub fn clear(&self) {
        self.entries.lock().clear();
        self.metrics.reset();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            capacity: self.capacity,
            hits: self.metrics.hits.load(Ordering::Relaxed),
            misses: self.metrics.misses.load(Ordering::Relaxed),
            evictions: self.metrics.evictions.load(Ordering::Relaxed),
        }
    }
}

impl<V> std::fmt::Debug for BoundedCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedCache")
            .field("capacity", &self.capacity)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = BoundedCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);

        // Touch "a" so "b" becomes the eviction candidate
        assert_eq!(cache.get("a"), Some(1));
        cache.insert("c", 3);

        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("c"), Some(3));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_zero_capacity_never_stores() {
        let cache = BoundedCache::new(0);
        cache.insert("a", 1.0f32);
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_get_or_try_insert_with_computes_once() {
        let cache = BoundedCache::new(8);
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ()>(42)
        };

        assert_eq!(cache.get_or_try_insert_with("k", compute), Ok(42));
        assert_eq!(cache.get_or_try_insert_with("k", compute), Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_failed_computation_is_not_stored() {
        let cache: BoundedCache<f32> = BoundedCache::new(8);

        assert_eq!(cache.get_or_try_insert_with("k", || Err("offline")), Err("offline"));
        assert!(cache.is_empty());

        assert_eq!(cache.get_or_try_insert_with("k", || Ok::<_, &str>(3.5)), Ok(3.5));
        assert_eq!(cache.get("k"), Some(3.5));
    }

    #[test]
    fn test_clear_resets_stats() {
        let cache = BoundedCache::new(4);
        cache.insert("a", 1);
        let _ = cache.get("a");
        cache.clear();

        let stats = cache.stats();
        assert_eq!(stats.entries, 0);
        assert_eq!(stats.hits, 0);
    }
}
