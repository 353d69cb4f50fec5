use indexmap::IndexMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::metrics::MetricTile;
use crate::types::MetricId;

/// Memoization key: which dataset, which filter selection, which metric.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// [`crate::Dataset::identity`] of the installed upload.
    pub dataset: u64,
    /// [`crate::FilterSpec::stable_hash`] of the active filters.
    pub filters: u64,
    /// Metric id.
    pub metric_id: MetricId,
}

/// Hit/miss/eviction counters since construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that required computation.
    pub misses: u64,
    /// Entries dropped to respect capacity.
    pub evictions: u64,
}

/// Thread-safe bounded cache of evaluated metric tiles.
///
/// Clones share storage. Entries are evicted oldest-inserted first.
#[derive(Clone)]
pub struct MetricCache {
    inner: Arc<RwLock<MetricCacheInner>>,
    counters: Arc<Counters>,
}

struct MetricCacheInner {
    entries: IndexMap<CacheKey, MetricTile>,
    order: VecDeque<CacheKey>,
    capacity: usize,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl MetricCache {
    /// Create a cache holding at most `capacity` tiles; `0` disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricCacheInner {
                entries: IndexMap::new(),
                order: VecDeque::new(),
                capacity,
            })),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Cached tile for `key`, if any.
    pub fn get(&self, key: &CacheKey) -> Option<MetricTile> {
        let inner = self.inner.read().expect("metric cache poisoned");
        let found = inner.entries.get(key).cloned();
        drop(inner);
        if found.is_some() {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!("[cockpit:cache] hit metric={}", key.metric_id);
        } else {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Store `tile` under `key`, replacing any previous entry.
    pub fn insert(&self, key: CacheKey, tile: MetricTile) {
        let mut inner = self.inner.write().expect("metric cache poisoned");
        let evicted = inner.insert(key, tile);
        drop(inner);
        if evicted > 0 {
            self.counters
                .evictions
                .fetch_add(evicted as u64, Ordering::Relaxed);
            debug!("[cockpit:cache] evicted {} entries", evicted);
        }
    }

    /// Cached tile for `key`, computing and storing it on a miss.
    pub fn get_or_insert_with<F>(&self, key: CacheKey, compute: F) -> MetricTile
    where
        F: FnOnce() -> MetricTile,
    {
        if let Some(tile) = self.get(&key) {
            return tile;
        }
        let tile = compute();
        self.insert(key, tile.clone());
        tile
    }

    /// Drop every entry computed against `dataset`; returns how many were removed.
    pub fn invalidate_dataset(&self, dataset: u64) -> usize {
        let mut inner = self.inner.write().expect("metric cache poisoned");
        let before = inner.entries.len();
        inner.entries.retain(|key, _| key.dataset != dataset);
        inner.order.retain(|key| key.dataset != dataset);
        let removed = before - inner.entries.len();
        if removed > 0 {
            debug!("[cockpit:cache] invalidated {} entries", removed);
        }
        removed
    }

    /// Remove all entries.
    pub fn clear(&self) {
        let mut inner = self.inner.write().expect("metric cache poisoned");
        inner.entries.clear();
        inner.order.clear();
    }

    /// Number of cached tiles.
    pub fn len(&self) -> usize {
        self.inner.read().expect("metric cache poisoned").entries.len()
    }

    /// Returns `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.inner
            .read()
            .expect("metric cache poisoned")
            .entries
            .is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.inner.read().expect("metric cache poisoned").capacity
    }

    /// Counters since construction.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }
}

impl MetricCacheInner {
    fn insert(&mut self, key: CacheKey, tile: MetricTile) -> usize {
        if self.entries.insert(key.clone(), tile).is_some()
            && let Some(pos) = self.order.iter().position(|existing| *existing == key)
        {
            self.order.remove(pos);
        }
        self.order.push_back(key);
        self.enforce_limit()
    }

    fn enforce_limit(&mut self) -> usize {
        let mut evicted = 0;
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if self.entries.swap_remove(&oldest).is_some() {
                evicted += 1;
            }
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricRegistry;

    fn key(dataset: u64, metric_id: &str) -> CacheKey {
        CacheKey {
            dataset,
            filters: 7,
            metric_id: metric_id.to_string(),
        }
    }

    fn tile(metric_id: &str) -> MetricTile {
        let registry = MetricRegistry::standard();
        MetricTile::placeholder(registry.get(metric_id).unwrap())
    }

    const SKILL: &str = "metric.readiness.skill_readiness";
    const POOL: &str = "metric.readiness.pool_variety";
    const COST: &str = "metric.economics.cost_per_acquisition";

    #[test]
    fn get_or_insert_computes_once() {
        let cache = MetricCache::new(4);
        let mut calls = 0;
        let first = cache.get_or_insert_with(key(1, SKILL), || {
            calls += 1;
            tile(SKILL)
        });
        let second = cache.get_or_insert_with(key(1, SKILL), || {
            calls += 1;
            tile(SKILL)
        });
        assert_eq!(calls, 1);
        assert_eq!(first, second);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[test]
    fn evicts_oldest_inserted_first() {
        let cache = MetricCache::new(2);
        cache.insert(key(1, SKILL), tile(SKILL));
        cache.insert(key(1, POOL), tile(POOL));
        // Reinsert refreshes position.
        cache.insert(key(1, SKILL), tile(SKILL));
        cache.insert(key(1, COST), tile(COST));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key(1, POOL)).is_none());
        assert!(cache.get(&key(1, SKILL)).is_some());
        assert!(cache.get(&key(1, COST)).is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let cache = MetricCache::new(0);
        cache.insert(key(1, SKILL), tile(SKILL));
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidation_is_per_dataset() {
        let cache = MetricCache::new(8);
        cache.insert(key(1, SKILL), tile(SKILL));
        cache.insert(key(1, POOL), tile(POOL));
        cache.insert(key(2, SKILL), tile(SKILL));
        assert_eq!(cache.invalidate_dataset(1), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&key(2, SKILL)).is_some());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn clones_share_storage() {
        let cache = MetricCache::new(8);
        let other = cache.clone();
        other.insert(key(3, SKILL), tile(SKILL));
        assert_eq!(cache.len(), 1);
    }
}
