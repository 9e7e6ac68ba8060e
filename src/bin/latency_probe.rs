// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use retrieval_cache::{
    ChunkId, ContentFetcher, FetchError, HttpTier, HttpTierConfig, RetrievalEngine,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Synthetic content store: fabricates a payload for any id.
struct SyntheticStore;

#[async_trait]
impl ContentFetcher for SyntheticStore {
    async fn fetch(&self, id: ChunkId) -> Result<Value, FetchError> {
        Ok(json!({ "id": id.as_u64(), "text": format!("synthetic chunk {}", id) }))
    }
}

struct ProbeConfig {
    embedding_dim: usize,
    vector_count: usize,
    queries: usize,
    k: usize,
    seed: u64,
    cache_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retrieval_cache=info".into()),
        )
        .init();

    let config = load_config();
    info!(
        embedding_dim = config.embedding_dim,
        vector_count = config.vector_count,
        queries = config.queries,
        k = config.k,
        "starting latency probe"
    );

    let mut builder = RetrievalEngine::builder()
        .embedding_dim(config.embedding_dim)
        .expected_vectors(config.vector_count);
    if let Some(url) = &config.cache_url {
        let tier = HttpTier::new(HttpTierConfig {
            base_url: url.clone(),
            ..Default::default()
        })?;
        builder = builder.distributed_cache(Arc::new(tier));
    }
    let engine = builder.build()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let vectors: Vec<Vec<f32>> = (0..config.vector_count)
        .map(|_| {
            (0..config.embedding_dim)
                .map(|_| rng.gen_range(-1.0..1.0))
                .collect()
        })
        .collect();
    let ids: Vec<ChunkId> = (0..config.vector_count as u64).map(ChunkId::from).collect();

    let load_started = Instant::now();
    engine.add_vectors(&vectors, &ids)?;
    info!(
        vectors = config.vector_count,
        elapsed_ms = load_started.elapsed().as_millis() as u64,
        scale_class = %engine.scale_class(),
        "index populated"
    );

    let store = SyntheticStore;
    for pass in ["cold", "warm"] {
        let pass_started = Instant::now();
        let mut cache_hits = 0usize;
        for i in 0..config.queries {
            let query = &vectors[i % vectors.len()];
            let (_chunks, stats) = engine
                .retrieve_context(query, config.k, &store, true)
                .await?;
            if stats.memo_hit || stats.distributed_hit || stats.hot_cache_hit {
                cache_hits += 1;
            }
        }
        info!(
            pass,
            queries = config.queries,
            cache_hits,
            elapsed_ms = pass_started.elapsed().as_millis() as u64,
            "probe pass complete"
        );
    }

    let report = engine.get_performance_report();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn load_config() -> ProbeConfig {
    ProbeConfig {
        embedding_dim: std::env::var("RETRIEVAL_DIM")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(64),
        vector_count: std::env::var("RETRIEVAL_VECTORS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1_000),
        queries: std::env::var("RETRIEVAL_QUERIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(200),
        k: std::env::var("RETRIEVAL_K")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5),
        seed: std::env::var("RETRIEVAL_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(42),
        cache_url: std::env::var("RETRIEVAL_CACHE_URL").ok(),
    }
}
