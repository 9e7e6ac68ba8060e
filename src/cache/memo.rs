// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

/// Process-local memo of recent query results with TTL and metrics tracking
use crate::cache::CacheMetrics;
use crate::core::types::{ChunkId, QueryFingerprint};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct MemoEntry {
    /// Raw query vector, kept to rule out fingerprint collisions on hit.
    query: Vec<f32>,
    ids: Vec<ChunkId>,
    stored_at: Instant,
}

/// LRU memo keyed by (query fingerprint, k). Entries expire after a fixed
/// TTL and are verified against the full query bytes before a hit counts.
pub struct QueryMemo {
    entries: Arc<RwLock<LruCache<(QueryFingerprint, usize), MemoEntry>>>,
    metrics: Arc<RwLock<CacheMetrics>>,
    capacity: usize,
    ttl: Duration,
}

impl QueryMemo {
    /// # Panics
    /// Panics if capacity is 0
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        assert!(capacity > 0, "Memo capacity must be greater than 0");

        let non_zero_capacity = NonZeroUsize::new(capacity)
            .expect("Capacity must be non-zero");

        Self {
            entries: Arc::new(RwLock::new(LruCache::new(non_zero_capacity))),
            metrics: Arc::new(RwLock::new(CacheMetrics::new())),
            capacity,
            ttl,
        }
    }

    /// Look up a memoized result. Expired entries are dropped on access.
    /// A fingerprint collision (same digest, different query bytes) counts
    /// as a miss but leaves the stored entry in place.
    pub fn get(&self, fingerprint: &QueryFingerprint, query: &[f32], k: usize) -> Option<Vec<ChunkId>> {
        let key = (fingerprint.clone(), k);
        let mut entries = self.entries.write().unwrap();
        let mut metrics = self.metrics.write().unwrap();

        match entries.get(&key) {
            Some(entry) if entry.stored_at.elapsed() > self.ttl => {
                entries.pop(&key);
                metrics.misses += 1;
                None
            }
            Some(entry) if entry.query != query => {
                metrics.misses += 1;
                None
            }
            Some(entry) => {
                metrics.hits += 1;
                Some(entry.ids.clone())
            }
            None => {
                metrics.misses += 1;
                None
            }
        }
    }

    /// Memoize a result, stamping it with the current time.
    pub fn put(&self, fingerprint: QueryFingerprint, query: &[f32], k: usize, ids: Vec<ChunkId>) {
        let key = (fingerprint, k);
        let mut entries = self.entries.write().unwrap();

        if entries.len() == self.capacity && !entries.contains(&key) {
            let mut metrics = self.metrics.write().unwrap();
            metrics.evictions += 1;
        }

        entries.put(
            key,
            MemoEntry {
                query: query.to_vec(),
                ids,
                stored_at: Instant::now(),
            },
        );
    }

    /// Remove all entries. Metrics are NOT reset.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap();
        entries.clear();
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap();
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a snapshot of current memo metrics
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

impl Clone for QueryMemo {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            metrics: Arc::clone(&self.metrics),
            capacity: self.capacity,
            ttl: self.ttl,
        }
    }
}

impl std::fmt::Debug for QueryMemo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryMemo")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .field("len", &self.len())
            .field("metrics", &self.get_metrics())
            .finish()
    }
}
