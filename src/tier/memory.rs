// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use crate::tier::{DistributedCache, TierError};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

struct StoredValue {
    data: Bytes,
    expires_at: Instant,
}

/// In-memory stand-in for the shared cache tier. Honors TTLs and counts
/// get calls per key so tests can assert which tiers were consulted.
pub struct MemoryTier {
    entries: Arc<RwLock<HashMap<String, StoredValue>>>,
    call_count: Arc<RwLock<HashMap<String, usize>>>,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            call_count: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of get calls observed for a key.
    pub async fn calls(&self, key: &str) -> usize {
        let counts = self.call_count.read().await;
        counts.get(key).copied().unwrap_or(0)
    }

    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.len()
    }
}

impl Default for MemoryTier {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryTier {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            call_count: Arc::clone(&self.call_count),
        }
    }
}

#[async_trait]
impl DistributedCache for MemoryTier {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, TierError> {
        let mut counts = self.call_count.write().await;
        *counts.entry(key.to_string()).or_insert(0) += 1;
        drop(counts);

        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(value) if value.expires_at <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some(value) => Ok(Some(value.data.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), TierError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            StoredValue {
                data: value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn close(&self) -> Result<(), TierError> {
        let mut entries = self.entries.write().await;
        entries.clear();
        Ok(())
    }
}
