//! In-process query cache
//!
//! Provides:
//! - Bounded LRU storage (reads refresh recency)
//! - Async mutual exclusion independent of any other repository lock
//! - Hit/miss accounting for diagnostics

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::metrics::record_cache;

/// Query cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate in 0.0 - 1.0, 0.0 before any lookup
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Inner<K: Hash + Eq, V> {
    entries: LruCache<K, V>,
    stats: CacheStats,
}

/// LRU cache guarded by an async mutex
pub struct QueryCache<K: Hash + Eq, V: Clone> {
    inner: Mutex<Inner<K, V>>,
    name: &'static str,
}

impl<K: Hash + Eq, V: Clone> QueryCache<K, V> {
    /// Create a cache holding at most `capacity` entries
    pub fn new(name: &'static str, capacity: NonZeroUsize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
            name,
        }
    }

    /// Look up a value, marking it most recently used
    pub async fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock().await;
        let value = inner.entries.get(key).cloned();
        if value.is_some() {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        drop(inner);

        record_cache(value.is_some(), self.name);
        debug!(cache = self.name, hit = value.is_some(), "Cache lookup");
        value
    }

    /// Insert or update; evicts the least recently used entry when full
    pub async fn put(&self, key: K, value: V) {
        let mut inner = self.inner.lock().await;
        let replaced_existing = inner.entries.contains(&key);
        if inner.entries.push(key, value).is_some() && !replaced_existing {
            inner.stats.evictions += 1;
            debug!(cache = self.name, "Evicted least recently used entry");
        }
    }

    /// Drop every entry; statistics are kept
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        let dropped = inner.entries.len();
        inner.entries.clear();
        debug!(cache = self.name, dropped, "Cache cleared");
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entries.is_empty()
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.lock().await.stats
    }

    pub async fn capacity(&self) -> usize {
        self.inner.lock().await.entries.cap().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> QueryCache<String, u32> {
        QueryCache::new("test", NonZeroUsize::new(capacity).unwrap())
    }

    #[tokio::test]
    async fn test_get_put() {
        let cache = cache(2);
        assert!(cache.get(&"a".to_string()).await.is_none());
        cache.put("a".to_string(), 1).await;
        assert_eq!(cache.get(&"a".to_string()).await, Some(1));

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_evicts_least_recently_used() {
        let cache = cache(3);
        for (i, key) in ["q1", "q2", "q3"].iter().enumerate() {
            cache.put(key.to_string(), i as u32).await;
        }

        // Touch q1 so q2 becomes the oldest
        assert!(cache.get(&"q1".to_string()).await.is_some());
        cache.put("q4".to_string(), 4).await;

        assert_eq!(cache.len().await, 3);
        assert_eq!(cache.stats().await.evictions, 1);
        assert!(cache.get(&"q2".to_string()).await.is_none());
        for key in ["q1", "q3", "q4"] {
            assert!(cache.get(&key.to_string()).await.is_some());
        }
    }

    #[tokio::test]
    async fn test_update_does_not_evict() {
        let cache = cache(2);
        cache.put("a".to_string(), 1).await;
        cache.put("b".to_string(), 2).await;
        cache.put("a".to_string(), 3).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get(&"a".to_string()).await, Some(3));
        assert_eq!(cache.stats().await.evictions, 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = cache(2);
        cache.put("a".to_string(), 1).await;
        cache.clear().await;
        assert!(cache.is_empty().await);
        assert_eq!(cache.capacity().await, 2);
    }
}
