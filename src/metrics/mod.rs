// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use crate::core::types::QueryFingerprint;
use crate::index::scale::{ExpectedLatencyBand, IndexScaleClass};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Per-call timing record. Search calls carry the query fingerprint and
/// index timing; chunk-resolution calls carry fetch timing instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMetrics {
    /// Present for search calls, absent for chunk-resolution calls.
    pub fingerprint: Option<QueryFingerprint>,
    pub total_ms: f64,
    pub index_search_ms: f64,
    pub distributed_ms: f64,
    pub fetch_ms: f64,
    /// True when the query memo answered without touching the index.
    pub memo_hit: bool,
    /// True when the distributed tier answered at least one lookup.
    pub distributed_hit: bool,
    /// True when the hot cache answered at least one chunk.
    pub hot_cache_hit: bool,
    pub chunks_resolved: usize,
    pub timestamp: DateTime<Utc>,
}

/// Fixed-capacity ring of recent [`SearchMetrics`]. The oldest entry is
/// dropped once the ring is full, so memory stays bounded no matter how
/// long the engine runs.
#[derive(Debug, Clone)]
pub struct MetricsHistory {
    entries: VecDeque<SearchMetrics>,
    capacity: usize,
}

impl MetricsHistory {
    /// # Panics
    /// Panics if capacity is 0
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "History capacity must be greater than 0");
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, entry: SearchMetrics) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&SearchMetrics> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SearchMetrics> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Nearest-rank percentile over an ascending slice.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (pct / 100.0) * (sorted.len() - 1) as f64;
    sorted[rank.round() as usize]
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Aggregate view of recent engine behavior, suitable for logging or
/// shipping to a dashboard as JSON. Hit rates are the fraction of
/// recorded calls that saw a hit in each tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub total_queries: usize,
    pub mean_latency_ms: f64,
    pub median_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub min_latency_ms: f64,
    pub max_latency_ms: f64,
    /// Index timing over calls that actually hit the index.
    pub mean_index_search_ms: f64,
    pub p95_index_search_ms: f64,
    pub hot_cache_hit_rate: f64,
    pub query_memo_hit_rate: f64,
    pub distributed_hit_rate: f64,
    pub index_type: String,
    pub vector_count: usize,
    pub expected_latency_band: ExpectedLatencyBand,
    /// Whether the p95 latency sits inside the scale class's band.
    pub p95_within_band: bool,
}

impl PerformanceReport {
    pub fn from_history(
        history: &MetricsHistory,
        scale_class: IndexScaleClass,
        vector_count: usize,
    ) -> Self {
        let mut latencies: Vec<f64> = history.iter().map(|m| m.total_ms).collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut index_times: Vec<f64> = history
            .iter()
            .filter(|m| m.index_search_ms > 0.0)
            .map(|m| m.index_search_ms)
            .collect();
        index_times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let total = history.len();
        let rate = |count: usize| {
            if total == 0 {
                0.0
            } else {
                count as f64 / total as f64
            }
        };
        let hot_hits = history.iter().filter(|m| m.hot_cache_hit).count();
        let memo_hits = history.iter().filter(|m| m.memo_hit).count();
        let distributed_hits = history.iter().filter(|m| m.distributed_hit).count();

        let band = scale_class.expected_latency();
        let p95 = percentile(&latencies, 95.0);

        Self {
            total_queries: total,
            mean_latency_ms: mean(&latencies),
            median_latency_ms: percentile(&latencies, 50.0),
            p95_latency_ms: p95,
            p99_latency_ms: percentile(&latencies, 99.0),
            min_latency_ms: latencies.first().copied().unwrap_or(0.0),
            max_latency_ms: latencies.last().copied().unwrap_or(0.0),
            mean_index_search_ms: mean(&index_times),
            p95_index_search_ms: percentile(&index_times, 95.0),
            hot_cache_hit_rate: rate(hot_hits),
            query_memo_hit_rate: rate(memo_hits),
            distributed_hit_rate: rate(distributed_hits),
            index_type: scale_class.name().to_string(),
            vector_count,
            expected_latency_band: band,
            // An empty history has nothing out of band.
            p95_within_band: latencies.is_empty() || band.meets_target(p95),
        }
    }
}
