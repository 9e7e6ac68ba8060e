// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

pub mod config;

pub use config::IndexConfig;

use crate::cache::{CacheMetrics, HotCache, QueryMemo};
use crate::core::types::{ChunkId, ChunkIdMap, QueryFingerprint};
use crate::index::persistence::{load_snapshot, save_snapshot, SnapshotMetadata};
use crate::index::scale::{ExpectedLatencyBand, IndexScaleClass};
use crate::index::{IndexError, PersistenceError, VectorIndex};
use crate::metrics::{MetricsHistory, PerformanceReport, SearchMetrics};
use crate::tier::{chunk_key, query_key, DistributedCache};
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Failure reported by a caller's content fetcher for a single chunk.
#[derive(Error, Debug)]
#[error("Fetch failed: {message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Authoritative content source, supplied by the caller. Invoked only
/// when both cache tiers miss; must tolerate being called again for the
/// same id (the engine never retries internally).
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, id: ChunkId) -> Result<Value, FetchError>;
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Batch size mismatch: {vectors} vectors, {ids} chunk ids")]
    IdCountMismatch { vectors: usize, ids: usize },

    #[error("Batch is empty")]
    EmptyBatch,
}

/// End-to-end stats for one `retrieve_context` call.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalStats {
    pub total_latency_ms: f64,
    pub search_latency_ms: f64,
    pub fetch_latency_ms: f64,
    pub index_search_ms: f64,
    pub memo_hit: bool,
    pub distributed_hit: bool,
    pub hot_cache_hit: bool,
    pub chunks_returned: usize,
    /// Informational only: the call completes and returns its result
    /// even when the latency band was missed.
    pub target_met: bool,
    pub index_type: String,
    pub vector_count: usize,
}

struct ChunkResolution {
    payload: Option<Value>,
    hot_hit: bool,
    distributed_hit: bool,
    distributed_ms: f64,
    fetch_ms: f64,
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Multi-tier context retrieval: a shared distributed cache, a
/// process-local query memo and chunk hot cache, and a scale-adaptive
/// vector index, composed behind three async operations.
///
/// The distributed tier is optional and always best-effort: any failure
/// there is logged and treated as a miss, never surfaced to callers.
pub struct RetrievalEngine {
    config: Arc<RwLock<IndexConfig>>,
    scale_class: IndexScaleClass,
    index: Arc<RwLock<VectorIndex>>,
    id_map: Arc<RwLock<ChunkIdMap>>,
    hot_cache: HotCache,
    query_memo: QueryMemo,
    distributed: Option<Arc<dyn DistributedCache>>,
    distributed_stats: Arc<RwLock<CacheMetrics>>,
    history: Arc<RwLock<MetricsHistory>>,
}

impl RetrievalEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Snapshot of the current configuration. `vector_count` tracks the
    /// live index size, not the construction-time hint.
    pub fn config(&self) -> IndexConfig {
        self.config.read().unwrap().clone()
    }

    /// Fixed for the engine's lifetime; growing past a volume threshold
    /// never rebuilds in place (see [`EngineBuilder::from_snapshot`]).
    pub fn scale_class(&self) -> IndexScaleClass {
        self.scale_class
    }

    pub fn expected_latency(&self) -> ExpectedLatencyBand {
        self.scale_class.expected_latency()
    }

    pub fn vector_count(&self) -> usize {
        self.index.read().unwrap().len()
    }

    pub fn is_calibrated(&self) -> bool {
        self.index.read().unwrap().is_calibrated()
    }

    pub fn hot_cache_metrics(&self) -> CacheMetrics {
        self.hot_cache.get_metrics()
    }

    pub fn query_memo_metrics(&self) -> CacheMetrics {
        self.query_memo.get_metrics()
    }

    /// Hit/miss counters for the distributed tier as seen by this engine.
    pub fn distributed_metrics(&self) -> CacheMetrics {
        self.distributed_stats.read().unwrap().clone()
    }

    pub fn recent_metrics(&self) -> Vec<SearchMetrics> {
        self.history.read().unwrap().iter().cloned().collect()
    }

    /// Train cluster structure from a dedicated sample set. Optional:
    /// an uncalibrated index calibrates itself from the first
    /// `add_vectors` batch.
    pub fn calibrate(&self, samples: &[Vec<f32>]) -> Result<(), EngineError> {
        let mut index = self.index.write().unwrap();
        index.calibrate(samples)?;
        info!(samples = samples.len(), "index calibrated");
        Ok(())
    }

    /// Append a batch of vectors with their chunk ids. Ordinal `i` of the
    /// index permanently maps to `chunk_ids[i]` of this batch, offset by
    /// everything added before it.
    pub fn add_vectors(&self, vectors: &[Vec<f32>], chunk_ids: &[ChunkId]) -> Result<(), EngineError> {
        if vectors.is_empty() {
            return Err(EngineError::EmptyBatch);
        }
        if vectors.len() != chunk_ids.len() {
            return Err(EngineError::IdCountMismatch {
                vectors: vectors.len(),
                ids: chunk_ids.len(),
            });
        }

        let total = {
            let mut index = self.index.write().unwrap();
            index.add(vectors)?;
            index.len()
        };
        {
            let mut map = self.id_map.write().unwrap();
            map.extend_from(chunk_ids);
        }
        {
            let mut config = self.config.write().unwrap();
            config.vector_count = total;
        }

        info!(added = vectors.len(), total, "added vectors to index");
        Ok(())
    }

    /// Resolve a query vector to its k nearest chunk ids through three
    /// tiers: the shared query cache, the process-local memo, then the
    /// index itself. With `use_cache` false both query caches are
    /// bypassed on the read side and the index is always consulted.
    pub async fn search_context(
        &self,
        query: &[f32],
        k: usize,
        use_cache: bool,
    ) -> Result<(Vec<ChunkId>, SearchMetrics), EngineError> {
        let started = Instant::now();

        let embedding_dim = { self.config.read().unwrap().embedding_dim };
        if query.len() != embedding_dim {
            return Err(EngineError::Index(IndexError::DimensionMismatch {
                expected: embedding_dim,
                actual: query.len(),
            }));
        }

        let fingerprint = QueryFingerprint::from_query(query);
        let mut metrics = SearchMetrics {
            fingerprint: Some(fingerprint.clone()),
            total_ms: 0.0,
            index_search_ms: 0.0,
            distributed_ms: 0.0,
            fetch_ms: 0.0,
            memo_hit: false,
            distributed_hit: false,
            hot_cache_hit: false,
            chunks_resolved: 0,
            timestamp: Utc::now(),
        };

        if use_cache {
            // Shared tier first: a hit here is a hit for every process.
            if let Some(tier) = &self.distributed {
                let key = query_key(&fingerprint, k);
                let tier_started = Instant::now();
                match tier.get(&key).await {
                    Ok(Some(bytes)) => {
                        metrics.distributed_ms = elapsed_ms(tier_started);
                        match serde_cbor::from_slice::<Vec<ChunkId>>(&bytes) {
                            Ok(ids) => {
                                self.count_distributed(true);
                                metrics.distributed_hit = true;
                                metrics.total_ms = elapsed_ms(started);
                                debug!(fingerprint = %fingerprint, k, "distributed query cache hit");
                                self.record(metrics.clone());
                                return Ok((ids, metrics));
                            }
                            Err(e) => {
                                self.count_distributed(false);
                                warn!(key = %key, error = %e, "discarding undecodable cached query result");
                            }
                        }
                    }
                    Ok(None) => {
                        metrics.distributed_ms = elapsed_ms(tier_started);
                        self.count_distributed(false);
                    }
                    Err(e) => {
                        metrics.distributed_ms = elapsed_ms(tier_started);
                        self.count_distributed(false);
                        warn!(error = %e, "distributed query lookup failed");
                    }
                }
            }

            if let Some(ids) = self.query_memo.get(&fingerprint, query, k) {
                metrics.memo_hit = true;
                metrics.total_ms = elapsed_ms(started);
                debug!(fingerprint = %fingerprint, k, "query memo hit");
                self.record(metrics.clone());
                return Ok((ids, metrics));
            }
        }

        let index_started = Instant::now();
        let (hits, index_len) = {
            let index = self.index.read().unwrap();
            (index.search(query, k)?, index.len())
        };
        metrics.index_search_ms = elapsed_ms(index_started);

        let ids: Vec<ChunkId> = {
            let map = self.id_map.read().unwrap();
            hits.iter()
                // An out-of-range ordinal must never reach a caller.
                .filter(|hit| hit.ordinal < index_len)
                .map(|hit| map.translate_or_raw(hit.ordinal))
                .collect()
        };

        self.query_memo.put(fingerprint.clone(), query, k, ids.clone());

        if use_cache {
            if let Some(tier) = &self.distributed {
                let key = query_key(&fingerprint, k);
                match serde_cbor::to_vec(&ids) {
                    Ok(bytes) => {
                        let ttl = { self.config.read().unwrap().query_cache_ttl };
                        let tier_started = Instant::now();
                        if let Err(e) = tier.set(&key, bytes.into(), ttl).await {
                            warn!(error = %e, "failed to cache query result in distributed tier");
                        }
                        metrics.distributed_ms += elapsed_ms(tier_started);
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to encode query result for distributed tier")
                    }
                }
            }
        }

        metrics.total_ms = elapsed_ms(started);
        debug!(
            fingerprint = %fingerprint,
            index_search_ms = metrics.index_search_ms,
            total_ms = metrics.total_ms,
            "index search completed"
        );
        self.record(metrics.clone());
        Ok((ids, metrics))
    }

    /// Resolve chunk ids to payloads through the hot cache, the
    /// distributed tier, and finally the caller's fetcher. Ids whose
    /// fetch fails are dropped, so the output may be shorter than the
    /// input; successful results keep input order.
    pub async fn get_chunks(
        &self,
        chunk_ids: &[ChunkId],
        fetcher: &dyn ContentFetcher,
    ) -> Result<(Vec<Value>, SearchMetrics), EngineError> {
        let started = Instant::now();
        let mut metrics = SearchMetrics {
            fingerprint: None,
            total_ms: 0.0,
            index_search_ms: 0.0,
            distributed_ms: 0.0,
            fetch_ms: 0.0,
            memo_hit: false,
            distributed_hit: false,
            hot_cache_hit: false,
            chunks_resolved: 0,
            timestamp: Utc::now(),
        };

        let fetch_concurrency = { self.config.read().unwrap().fetch_concurrency };

        let resolutions: Vec<ChunkResolution> = if fetch_concurrency <= 1 {
            let mut out = Vec::with_capacity(chunk_ids.len());
            for id in chunk_ids {
                out.push(self.resolve_chunk(*id, fetcher).await);
            }
            out
        } else {
            // Bounded fan-out; `buffered` reassembles in input order.
            stream::iter(chunk_ids.iter().map(|id| self.resolve_chunk(*id, fetcher)))
                .buffered(fetch_concurrency)
                .collect()
                .await
        };

        let mut chunks = Vec::with_capacity(resolutions.len());
        for resolution in resolutions {
            metrics.hot_cache_hit |= resolution.hot_hit;
            metrics.distributed_hit |= resolution.distributed_hit;
            metrics.distributed_ms += resolution.distributed_ms;
            metrics.fetch_ms += resolution.fetch_ms;
            if let Some(payload) = resolution.payload {
                chunks.push(payload);
            }
        }

        metrics.chunks_resolved = chunks.len();
        metrics.total_ms = elapsed_ms(started);
        info!(
            requested = chunk_ids.len(),
            resolved = chunks.len(),
            hot = metrics.hot_cache_hit,
            distributed = metrics.distributed_hit,
            total_ms = metrics.total_ms,
            "resolved chunks"
        );
        self.record(metrics.clone());
        Ok((chunks, metrics))
    }

    async fn resolve_chunk(&self, id: ChunkId, fetcher: &dyn ContentFetcher) -> ChunkResolution {
        let mut resolution = ChunkResolution {
            payload: None,
            hot_hit: false,
            distributed_hit: false,
            distributed_ms: 0.0,
            fetch_ms: 0.0,
        };

        if let Some(payload) = self.hot_cache.get(id) {
            resolution.hot_hit = true;
            resolution.payload = Some(payload);
            return resolution;
        }

        if let Some(tier) = &self.distributed {
            let key = chunk_key(id);
            let tier_started = Instant::now();
            match tier.get(&key).await {
                Ok(Some(bytes)) => {
                    resolution.distributed_ms = elapsed_ms(tier_started);
                    match serde_cbor::from_slice::<Value>(&bytes) {
                        Ok(payload) => {
                            self.count_distributed(true);
                            self.hot_cache.put(id, payload.clone());
                            resolution.distributed_hit = true;
                            resolution.payload = Some(payload);
                            return resolution;
                        }
                        Err(e) => {
                            self.count_distributed(false);
                            warn!(chunk_id = %id, error = %e, "discarding undecodable cached chunk");
                        }
                    }
                }
                Ok(None) => {
                    resolution.distributed_ms = elapsed_ms(tier_started);
                    self.count_distributed(false);
                }
                Err(e) => {
                    resolution.distributed_ms = elapsed_ms(tier_started);
                    self.count_distributed(false);
                    warn!(chunk_id = %id, error = %e, "distributed chunk lookup failed");
                }
            }
        }

        let fetch_started = Instant::now();
        match fetcher.fetch(id).await {
            Ok(payload) => {
                resolution.fetch_ms = elapsed_ms(fetch_started);
                self.hot_cache.put(id, payload.clone());
                if let Some(tier) = &self.distributed {
                    match serde_cbor::to_vec(&payload) {
                        Ok(bytes) => {
                            let ttl = { self.config.read().unwrap().chunk_cache_ttl };
                            if let Err(e) = tier.set(&chunk_key(id), bytes.into(), ttl).await {
                                warn!(chunk_id = %id, error = %e, "failed to cache chunk in distributed tier");
                            }
                        }
                        Err(e) => {
                            warn!(chunk_id = %id, error = %e, "failed to encode chunk for distributed tier")
                        }
                    }
                }
                resolution.payload = Some(payload);
            }
            Err(e) => {
                resolution.fetch_ms = elapsed_ms(fetch_started);
                error!(chunk_id = %id, error = %e, "chunk fetch failed; dropping from result");
            }
        }
        resolution
    }

    /// Full pipeline: search for chunk ids, then resolve their payloads.
    /// Always completes and returns whatever was found; `target_met` in
    /// the stats is the only budget signal.
    pub async fn retrieve_context(
        &self,
        query: &[f32],
        k: usize,
        fetcher: &dyn ContentFetcher,
        use_cache: bool,
    ) -> Result<(Vec<Value>, RetrievalStats), EngineError> {
        let started = Instant::now();

        let (chunk_ids, search_metrics) = self.search_context(query, k, use_cache).await?;
        let (chunks, fetch_metrics) = self.get_chunks(&chunk_ids, fetcher).await?;

        let total_latency_ms = elapsed_ms(started);
        let band = self.scale_class.expected_latency();
        let stats = RetrievalStats {
            total_latency_ms,
            search_latency_ms: search_metrics.total_ms,
            fetch_latency_ms: fetch_metrics.total_ms,
            index_search_ms: search_metrics.index_search_ms,
            memo_hit: search_metrics.memo_hit,
            distributed_hit: search_metrics.distributed_hit || fetch_metrics.distributed_hit,
            hot_cache_hit: fetch_metrics.hot_cache_hit,
            chunks_returned: chunks.len(),
            target_met: band.meets_target(total_latency_ms),
            index_type: self.scale_class.name().to_string(),
            vector_count: self.vector_count(),
        };

        info!(
            total_ms = stats.total_latency_ms,
            search_ms = stats.search_latency_ms,
            fetch_ms = stats.fetch_latency_ms,
            chunks = stats.chunks_returned,
            target_met = stats.target_met,
            "context retrieval completed"
        );
        Ok((chunks, stats))
    }

    /// Write the index and its id mapping as two sibling artifacts:
    /// `path` and `path + ".mapping"`.
    pub fn save_index(&self, path: &Path) -> Result<SnapshotMetadata, EngineError> {
        let index = self.index.read().unwrap();
        let map = self.id_map.read().unwrap();
        let metadata = save_snapshot(path, self.scale_class, &index, &map)?;
        info!(path = %path.display(), n_vectors = metadata.n_vectors, "index snapshot saved");
        Ok(metadata)
    }

    /// Replace the live index from a snapshot of the same scale class and
    /// dimension. A missing mapping artifact degrades to raw ordinal ids
    /// instead of failing. Adopting a snapshot of a different scale class
    /// requires a new engine via [`EngineBuilder::from_snapshot`].
    pub fn load_index(&self, path: &Path) -> Result<(), EngineError> {
        let (metadata, index, id_map) = load_snapshot(path)?;

        let embedding_dim = { self.config.read().unwrap().embedding_dim };
        if metadata.dimension != embedding_dim {
            return Err(EngineError::InvalidConfig(format!(
                "snapshot dimension {} does not match configured dimension {}",
                metadata.dimension, embedding_dim
            )));
        }
        if metadata.scale_class != self.scale_class {
            return Err(EngineError::InvalidConfig(format!(
                "snapshot was written by a {} index but this engine is {}; use EngineBuilder::from_snapshot to change class",
                metadata.scale_class, self.scale_class
            )));
        }

        let id_map = match id_map {
            Some(map) => map,
            None => {
                warn!(path = %path.display(), "mapping artifact missing; searches will return raw ordinals");
                ChunkIdMap::new()
            }
        };

        let n_vectors = index.len();
        {
            let mut guard = self.index.write().unwrap();
            *guard = index;
        }
        {
            let mut guard = self.id_map.write().unwrap();
            *guard = id_map;
        }
        {
            let mut config = self.config.write().unwrap();
            config.vector_count = n_vectors;
        }
        // Memoized ids may refer to the replaced index. The hot cache is
        // keyed by true chunk id and stays valid.
        self.query_memo.clear();

        info!(path = %path.display(), n_vectors, "index snapshot loaded");
        Ok(())
    }

    /// Aggregate statistics over the recorded call history.
    pub fn get_performance_report(&self) -> PerformanceReport {
        let vector_count = self.vector_count();
        let history = self.history.read().unwrap();
        PerformanceReport::from_history(&history, self.scale_class, vector_count)
    }

    /// Drop the hot cache and query memo. The distributed tier is shared
    /// infrastructure and is left untouched.
    pub fn clear_caches(&self) {
        self.hot_cache.clear();
        self.query_memo.clear();
        info!("hot cache and query memo cleared");
    }

    fn record(&self, entry: SearchMetrics) {
        let mut history = self.history.write().unwrap();
        history.record(entry);
    }

    fn count_distributed(&self, hit: bool) {
        let mut stats = self.distributed_stats.write().unwrap();
        if hit {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
    }
}

// Clone shares all engine state, not a copy of it
impl Clone for RetrievalEngine {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            scale_class: self.scale_class,
            index: Arc::clone(&self.index),
            id_map: Arc::clone(&self.id_map),
            hot_cache: self.hot_cache.clone(),
            query_memo: self.query_memo.clone(),
            distributed: self.distributed.clone(),
            distributed_stats: Arc::clone(&self.distributed_stats),
            history: Arc::clone(&self.history),
        }
    }
}

impl std::fmt::Debug for RetrievalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalEngine")
            .field("scale_class", &self.scale_class)
            .field("vector_count", &self.vector_count())
            .field("hot_cache", &self.hot_cache)
            .field("query_memo", &self.query_memo)
            .field("has_distributed_tier", &self.distributed.is_some())
            .finish()
    }
}

/// Builds a [`RetrievalEngine`], either empty or restored from a
/// snapshot. Restoring re-evaluates the scale class against the restored
/// vector count, rebuilding the index when the class changed; this is the
/// only supported way to cross a scale threshold.
pub struct EngineBuilder {
    config: IndexConfig,
    distributed: Option<Arc<dyn DistributedCache>>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: IndexConfig::default(),
            distributed: None,
        }
    }

    pub fn config(mut self, config: IndexConfig) -> Self {
        self.config = config;
        self
    }

    pub fn embedding_dim(mut self, embedding_dim: usize) -> Self {
        self.config.embedding_dim = embedding_dim;
        self
    }

    pub fn expected_vectors(mut self, vector_count: usize) -> Self {
        self.config.vector_count = vector_count;
        self
    }

    pub fn use_gpu(mut self, use_gpu: bool) -> Self {
        self.config.use_gpu = use_gpu;
        self
    }

    pub fn distributed_cache(mut self, tier: Arc<dyn DistributedCache>) -> Self {
        self.distributed = Some(tier);
        self
    }

    pub fn build(self) -> Result<RetrievalEngine, EngineError> {
        let EngineBuilder {
            config,
            distributed,
        } = self;
        if !config.is_valid() {
            return Err(EngineError::InvalidConfig(
                "configuration failed validation (check dimensions, capacities, and probe counts)"
                    .to_string(),
            ));
        }

        let scale_class = config.scale_class();
        let index = VectorIndex::for_scale_class(
            scale_class,
            config.embedding_dim,
            config.ivf_params(),
            config.n_subquantizers,
        )?;

        info!(
            scale_class = %scale_class,
            embedding_dim = config.embedding_dim,
            expected_vectors = config.vector_count,
            "retrieval engine built"
        );
        Ok(assemble(config, scale_class, index, ChunkIdMap::new(), distributed))
    }

    pub fn from_snapshot(self, path: &Path) -> Result<RetrievalEngine, EngineError> {
        let EngineBuilder {
            mut config,
            distributed,
        } = self;
        if !config.is_valid() {
            return Err(EngineError::InvalidConfig(
                "configuration failed validation (check dimensions, capacities, and probe counts)"
                    .to_string(),
            ));
        }

        let (metadata, index, id_map) = load_snapshot(path)?;
        if metadata.dimension != config.embedding_dim {
            return Err(EngineError::InvalidConfig(format!(
                "snapshot dimension {} does not match configured dimension {}",
                metadata.dimension, config.embedding_dim
            )));
        }

        let effective_count = metadata.n_vectors.max(config.vector_count);
        let scale_class = IndexScaleClass::classify(effective_count, config.use_gpu);

        let index = if scale_class == metadata.scale_class {
            index
        } else {
            info!(from = %metadata.scale_class, to = %scale_class, "rebuilding index for new scale class");
            let vectors = index.export_vectors().ok_or_else(|| {
                EngineError::InvalidConfig(format!(
                    "cannot rebuild a {} snapshot as {}: quantized snapshots do not retain full vectors",
                    metadata.scale_class, scale_class
                ))
            })?;
            let mut rebuilt = VectorIndex::for_scale_class(
                scale_class,
                config.embedding_dim,
                config.ivf_params(),
                config.n_subquantizers,
            )?;
            if !vectors.is_empty() {
                rebuilt.add(&vectors)?;
            }
            rebuilt
        };

        let id_map = match id_map {
            Some(map) => map,
            None => {
                warn!(path = %path.display(), "mapping artifact missing; searches will return raw ordinals");
                ChunkIdMap::new()
            }
        };

        config.vector_count = index.len().max(config.vector_count);
        info!(
            path = %path.display(),
            n_vectors = index.len(),
            scale_class = %scale_class,
            "retrieval engine restored from snapshot"
        );
        Ok(assemble(config, scale_class, index, id_map, distributed))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn assemble(
    config: IndexConfig,
    scale_class: IndexScaleClass,
    index: VectorIndex,
    id_map: ChunkIdMap,
    distributed: Option<Arc<dyn DistributedCache>>,
) -> RetrievalEngine {
    RetrievalEngine {
        hot_cache: HotCache::new(config.hot_cache_size),
        query_memo: QueryMemo::new(config.query_memo_size, config.query_cache_ttl),
        history: Arc::new(RwLock::new(MetricsHistory::new(config.metrics_capacity))),
        distributed_stats: Arc::new(RwLock::new(CacheMetrics::new())),
        scale_class,
        index: Arc::new(RwLock::new(index)),
        id_map: Arc::new(RwLock::new(id_map)),
        distributed,
        config: Arc::new(RwLock::new(config)),
    }
}
