// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

pub mod cache;
pub mod core;
pub mod engine;
pub mod index;
pub mod metrics;
pub mod tier;

pub use crate::core::types::{ChunkId, ChunkIdMap, QueryFingerprint, SearchHit};
pub use engine::{
    ContentFetcher, EngineBuilder, EngineError, FetchError, IndexConfig, RetrievalEngine,
    RetrievalStats,
};
pub use index::scale::IndexScaleClass;
pub use metrics::{PerformanceReport, SearchMetrics};
pub use tier::{DistributedCache, HttpTier, HttpTierConfig, MemoryTier, TierError};
