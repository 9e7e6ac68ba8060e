// tests/engine/degraded.rs
// The engine must keep answering when the shared tier is down, entries
// are corrupt, or snapshot artifacts are incomplete.

use async_trait::async_trait;
use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use retrieval_cache::index::persistence::mapping_path;
use retrieval_cache::tier::{chunk_key, query_key};
use retrieval_cache::{
    ChunkId, ContentFetcher, DistributedCache, EngineBuilder, FetchError, MemoryTier,
    QueryFingerprint, RetrievalEngine, TierError,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const DIM: usize = 8;

/// Every operation fails, as if the cache gateway were unreachable.
struct DownTier;

#[async_trait]
impl DistributedCache for DownTier {
    async fn get(&self, _key: &str) -> Result<Option<Bytes>, TierError> {
        Err(TierError::NetworkError("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), TierError> {
        Err(TierError::NetworkError("connection refused".to_string()))
    }

    async fn close(&self) -> Result<(), TierError> {
        Ok(())
    }
}

struct CountingFetcher {
    calls: AtomicUsize,
}

impl CountingFetcher {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentFetcher for CountingFetcher {
    async fn fetch(&self, id: ChunkId) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({ "id": id.as_u64() }))
    }
}

fn random_vectors(n: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..DIM).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect()
}

fn chunk_ids(range: std::ops::Range<u64>) -> Vec<ChunkId> {
    range.map(ChunkId::from).collect()
}

fn populated_engine(tier: Arc<dyn DistributedCache>) -> (RetrievalEngine, Vec<Vec<f32>>) {
    let engine = EngineBuilder::new()
        .embedding_dim(DIM)
        .distributed_cache(tier)
        .build()
        .unwrap();
    let vectors = random_vectors(30, 41);
    engine.add_vectors(&vectors, &chunk_ids(0..30)).unwrap();
    (engine, vectors)
}

#[cfg(test)]
mod degraded_tier_tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_tier_never_surfaces() {
        let (engine, vectors) = populated_engine(Arc::new(DownTier));
        let fetcher = CountingFetcher::new();

        let (chunks, stats) = engine
            .retrieve_context(&vectors[5], 3, &fetcher, true)
            .await
            .unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], json!({ "id": 5 }));
        assert!(!stats.distributed_hit);
        assert_eq!(engine.distributed_metrics().hits, 0);
        assert!(engine.distributed_metrics().misses > 0);

        // Local tiers still work while the shared one is down.
        let (_, stats) = engine
            .retrieve_context(&vectors[5], 3, &fetcher, true)
            .await
            .unwrap();
        assert!(stats.memo_hit);
        assert!(stats.hot_cache_hit);
        assert_eq!(fetcher.calls(), 3);
    }

    #[tokio::test]
    async fn test_corrupt_query_entry_falls_through_and_is_replaced() {
        let tier = MemoryTier::new();
        let (engine, vectors) = populated_engine(Arc::new(tier.clone()));

        let query = vectors[9].clone();
        let key = query_key(&QueryFingerprint::from_query(&query), 2);
        tier.set(&key, Bytes::from_static(b"not cbor"), Duration::from_secs(60))
            .await
            .unwrap();

        let (ids, metrics) = engine.search_context(&query, 2, true).await.unwrap();
        assert_eq!(ids[0], ChunkId::from(9));
        assert!(!metrics.distributed_hit);

        // The bad entry was overwritten with a decodable one.
        let (replay_ids, metrics) = {
            let reader = EngineBuilder::new()
                .embedding_dim(DIM)
                .distributed_cache(Arc::new(tier.clone()))
                .build()
                .unwrap();
            reader.search_context(&query, 2, true).await.unwrap()
        };
        assert_eq!(replay_ids, ids);
        assert!(metrics.distributed_hit);
    }

    #[tokio::test]
    async fn test_corrupt_chunk_entry_falls_through_to_fetcher() {
        let tier = MemoryTier::new();
        let (engine, _) = populated_engine(Arc::new(tier.clone()));

        let id = ChunkId::from(3);
        tier.set(
            &chunk_key(id),
            Bytes::from_static(b"not cbor"),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

        let fetcher = CountingFetcher::new();
        let (chunks, metrics) = engine.get_chunks(&[id], &fetcher).await.unwrap();
        assert_eq!(chunks, vec![json!({ "id": 3 })]);
        assert!(!metrics.distributed_hit);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_mapping_degrades_to_raw_ordinals() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("context.idx");

        let engine = EngineBuilder::new().embedding_dim(DIM).build().unwrap();
        let vectors = random_vectors(10, 43);
        engine.add_vectors(&vectors, &chunk_ids(500..510)).unwrap();
        engine.save_index(&path).unwrap();
        std::fs::remove_file(mapping_path(&path)).unwrap();

        let restored = EngineBuilder::new().embedding_dim(DIM).build().unwrap();
        restored.load_index(&path).unwrap();

        let (ids, _) = restored.search_context(&vectors[3], 1, true).await.unwrap();
        assert_eq!(ids, vec![ChunkId::from(3)]);
    }

    #[tokio::test]
    async fn test_from_snapshot_without_mapping_uses_raw_ordinals() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("context.idx");

        let engine = EngineBuilder::new().embedding_dim(DIM).build().unwrap();
        let vectors = random_vectors(10, 47);
        engine.add_vectors(&vectors, &chunk_ids(900..910)).unwrap();
        engine.save_index(&path).unwrap();
        std::fs::remove_file(mapping_path(&path)).unwrap();

        let restored = EngineBuilder::new()
            .embedding_dim(DIM)
            .from_snapshot(&path)
            .unwrap();
        let (ids, _) = restored.search_context(&vectors[7], 1, true).await.unwrap();
        assert_eq!(ids, vec![ChunkId::from(7)]);
    }
}
