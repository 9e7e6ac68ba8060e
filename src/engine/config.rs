// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use crate::index::ivf::IvfParams;
use crate::index::scale::IndexScaleClass;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Expected corpus size. Drives scale-class selection and is a hint,
    /// not a cap; the index accepts more vectors than this.
    pub vector_count: usize,
    pub embedding_dim: usize,
    pub hot_cache_size: usize,
    pub query_memo_size: usize,
    #[serde(with = "duration_serde")]
    pub chunk_cache_ttl: Duration,
    #[serde(with = "duration_serde")]
    pub query_cache_ttl: Duration,
    pub n_clusters: usize,
    pub n_subquantizers: usize,
    pub n_probe: usize,
    pub kmeans_iterations: usize,
    pub use_gpu: bool,
    /// Concurrent chunk fetches during resolution. 1 keeps strict
    /// sequential fetching.
    pub fetch_concurrency: usize,
    pub metrics_capacity: usize,
    /// Fixed calibration seed for reproducible runs.
    pub seed: Option<u64>,
}

// Helper module for std::time::Duration serialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(seconds))
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            vector_count: 0,
            embedding_dim: 768,
            hot_cache_size: 256,
            query_memo_size: 1024,
            chunk_cache_ttl: Duration::from_secs(3600), // 1 hour
            query_cache_ttl: Duration::from_secs(300),  // 5 minutes
            n_clusters: 100,
            n_subquantizers: 8,
            n_probe: 10,
            kmeans_iterations: 25,
            use_gpu: false,
            fetch_concurrency: 1,
            metrics_capacity: 4096,
            seed: None,
        }
    }
}

impl IndexConfig {
    pub fn is_valid(&self) -> bool {
        self.embedding_dim > 0
            && self.hot_cache_size > 0
            && self.query_memo_size > 0
            && self.n_clusters > 0
            && self.n_probe > 0
            && self.n_probe <= self.n_clusters
            && self.n_subquantizers > 0
            && self.embedding_dim % self.n_subquantizers == 0
            && self.kmeans_iterations > 0
            && self.fetch_concurrency >= 1
            && self.metrics_capacity > 0
    }

    /// Scale class implied by the expected corpus size and the GPU flag.
    pub fn scale_class(&self) -> IndexScaleClass {
        IndexScaleClass::classify(self.vector_count, self.use_gpu)
    }

    pub fn ivf_params(&self) -> IvfParams {
        IvfParams {
            n_clusters: self.n_clusters,
            n_probe: self.n_probe,
            max_iterations: self.kmeans_iterations,
            seed: self.seed,
        }
    }
}
