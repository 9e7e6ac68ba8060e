// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

/// In-process LRU cache for resolved chunk payloads with metrics tracking
use crate::cache::CacheMetrics;
use crate::core::types::ChunkId;
use lru::LruCache;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock};

/// Thread-safe LRU cache keyed by chunk id. This is the fastest retrieval
/// tier; everything in it can be re-fetched, so eviction is always safe.
pub struct HotCache {
    cache: Arc<RwLock<LruCache<ChunkId, Value>>>,
    metrics: Arc<RwLock<CacheMetrics>>,
    capacity: usize,
}

impl HotCache {
    /// Create a new hot cache with specified capacity
    ///
    /// # Panics
    /// Panics if capacity is 0
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Cache capacity must be greater than 0");

        let non_zero_capacity = NonZeroUsize::new(capacity)
            .expect("Capacity must be non-zero");

        Self {
            cache: Arc::new(RwLock::new(LruCache::new(non_zero_capacity))),
            metrics: Arc::new(RwLock::new(CacheMetrics::new())),
            capacity,
        }
    }

    /// Insert or update a chunk payload
    ///
    /// If the cache is at capacity, the least recently used entry is evicted.
    pub fn put(&self, id: ChunkId, payload: Value) {
        let mut cache = self.cache.write().unwrap();

        // Check if we're at capacity and will evict
        if cache.len() == self.capacity && !cache.contains(&id) {
            let mut metrics = self.metrics.write().unwrap();
            metrics.evictions += 1;
        }

        cache.put(id, payload);
    }

    /// Retrieve a chunk payload, marking it as recently used.
    pub fn get(&self, id: ChunkId) -> Option<Value> {
        let mut cache = self.cache.write().unwrap();
        let mut metrics = self.metrics.write().unwrap();

        match cache.get(&id) {
            Some(payload) => {
                metrics.hits += 1;
                Some(payload.clone())
            }
            None => {
                metrics.misses += 1;
                None
            }
        }
    }

    /// Check for a chunk without updating LRU order or metrics.
    pub fn contains(&self, id: ChunkId) -> bool {
        let cache = self.cache.read().unwrap();
        cache.contains(&id)
    }

    /// Remove all entries. Metrics are NOT reset.
    pub fn clear(&self) {
        let mut cache = self.cache.write().unwrap();
        cache.clear();
    }

    pub fn len(&self) -> usize {
        let cache = self.cache.read().unwrap();
        cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get a snapshot of current cache metrics
    pub fn get_metrics(&self) -> CacheMetrics {
        let metrics = self.metrics.read().unwrap();
        metrics.clone()
    }

    /// Reset all metrics to zero
    pub fn reset_metrics(&self) {
        let mut metrics = self.metrics.write().unwrap();
        metrics.reset();
    }

    pub fn hit_rate(&self) -> f64 {
        let metrics = self.metrics.read().unwrap();
        metrics.hit_rate()
    }
}

// Clone shares the underlying cache, not a copy of it
impl Clone for HotCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            metrics: Arc::clone(&self.metrics),
            capacity: self.capacity,
        }
    }
}

impl std::fmt::Debug for HotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("metrics", &self.get_metrics())
            .finish()
    }
}
