//! TTL cache: bounded LRU whose entries expire a fixed time after insertion.
//!
//! Used for the "all categories" read and the connection check. Time is
//! `tokio::time::Instant`, so paused-clock tests can step past the TTL.

use lru::LruCache;
use parking_lot::Mutex;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// LRU cache with a per-entry time-to-live.
pub struct TimedCache<K: Hash + Eq, V> {
    inner: Mutex<LruCache<K, Entry<V>>>,
    ttl: Duration,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_ratio: f64,
}

impl<K: Hash + Eq + Clone, V: Clone> TimedCache<K, V> {
    /// Capacity below 1 is raised to 1.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(cap)),
            ttl,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// Fresh value for `key`, evicting it if expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut cache = self.inner.lock();
        let fresh = match cache.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                cache.pop(key);
                None
            }
            None => None,
        };

        if fresh.is_some() {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.miss_count.fetch_add(1, Ordering::Relaxed);
        }
        fresh
    }

    pub fn insert(&self, key: K, value: V) {
        let mut cache = self.inner.lock();
        cache.put(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Cached value, or compute, store and return a new one.
    ///
    /// The lock is not held while `compute` runs, so concurrent misses may
    /// compute twice; the last to finish is kept.
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(value) = self.get(&key) {
            return value;
        }
        let value = compute().await;
        self.insert(key, value.clone());
        value
    }

    /// Drop every entry and reset counters.
    pub fn clear(&self) {
        self.inner.lock().clear();
        self.hit_count.store(0, Ordering::Relaxed);
        self.miss_count.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hit_count.load(Ordering::Relaxed);
        let misses = self.miss_count.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            hits,
            misses,
            hit_ratio: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache = TimedCache::new(4, Duration::from_secs(30));
        cache.insert("all", vec![1, 2]);
        assert_eq!(cache.get(&"all"), Some(vec![1, 2]));

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(cache.get(&"all"), Some(vec![1, 2]));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get(&"all"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn get_or_compute_runs_once_within_ttl() {
        let cache = TimedCache::new(1, Duration::from_secs(5));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let v = cache
                .get_or_compute((), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    true
                })
                .await;
            assert!(v);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(6)).await;
        cache.get_or_compute((), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            true
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn zero_ttl_never_hits() {
        let cache = TimedCache::new(1, Duration::ZERO);
        cache.insert(1, "x");
        assert_eq!(cache.get(&1), None);
    }

    #[test]
    fn lru_capacity_bound() {
        let cache = TimedCache::new(2, Duration::from_secs(60));
        cache.insert(1, "a");
        cache.insert(2, "b");
        cache.insert(3, "c");
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&3), Some("c"));
    }

    #[test]
    fn stats_and_clear() {
        let cache = TimedCache::new(2, Duration::from_secs(60));
        cache.insert("k", 1);
        cache.get(&"k");
        cache.get(&"k");
        cache.get(&"missing");
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (2, 1));
        assert!((stats.hit_ratio - 0.666).abs() < 0.01);

        cache.clear();
        assert_eq!(cache.stats().hits, 0);
        assert_eq!(cache.get(&"k"), None);
    }
}
