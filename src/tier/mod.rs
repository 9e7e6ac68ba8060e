// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

pub mod http;
pub mod memory;

pub use http::{HttpTier, HttpTierConfig};
pub use memory::MemoryTier;

use crate::core::types::{ChunkId, QueryFingerprint};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TierError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Tier is closed")]
    Closed,
}

/// Shared cache tier reachable by every pipeline process. Entries carry a
/// TTL set by the writer; a missing key and an expired key are the same
/// thing to callers.
#[async_trait]
pub trait DistributedCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, TierError>;
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), TierError>;
    async fn close(&self) -> Result<(), TierError>;
}

/// Key for a memoized query result.
pub fn query_key(fingerprint: &QueryFingerprint, k: usize) -> String {
    format!("query:{}:k{}", fingerprint, k)
}

/// Key for one resolved chunk payload.
pub fn chunk_key(id: ChunkId) -> String {
    format!("chunk:{}", id)
}
