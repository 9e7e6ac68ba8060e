// tests/engine/snapshots.rs
// Saving, restoring, and reclassifying engines across snapshots.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use retrieval_cache::index::persistence::mapping_path;
use retrieval_cache::{
    ChunkId, EngineBuilder, EngineError, IndexConfig, IndexScaleClass, RetrievalEngine,
};
use tempfile::TempDir;

fn random_vectors(n: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect()
}

fn chunk_ids(range: std::ops::Range<u64>) -> Vec<ChunkId> {
    range.map(ChunkId::from).collect()
}

fn populated_flat_engine(dim: usize, n: usize) -> (RetrievalEngine, Vec<Vec<f32>>) {
    let engine = EngineBuilder::new().embedding_dim(dim).build().unwrap();
    let vectors = random_vectors(n, dim, 501);
    engine
        .add_vectors(&vectors, &chunk_ids(500..500 + n as u64))
        .unwrap();
    (engine, vectors)
}

#[cfg(test)]
mod snapshot_tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_preserves_search_results() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("context.idx");

        let (engine, vectors) = populated_flat_engine(8, 20);
        let metadata = engine.save_index(&path).unwrap();
        assert_eq!(metadata.n_vectors, 20);
        assert_eq!(metadata.dimension, 8);
        assert_eq!(metadata.scale_class, IndexScaleClass::Flat);

        let restored = EngineBuilder::new().embedding_dim(8).build().unwrap();
        restored.load_index(&path).unwrap();
        assert_eq!(restored.vector_count(), 20);
        assert_eq!(restored.config().vector_count, 20);

        for i in [0usize, 7, 19] {
            let (ids, _) = restored.search_context(&vectors[i], 1, true).await.unwrap();
            assert_eq!(ids, vec![ChunkId::from(500 + i as u64)]);
        }
    }

    #[test]
    fn test_snapshot_writes_mapping_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("context.idx");

        let (engine, _) = populated_flat_engine(8, 10);
        engine.save_index(&path).unwrap();

        assert!(path.exists());
        assert!(mapping_path(&path).exists());
    }

    #[test]
    fn test_load_rejects_dimension_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("context.idx");

        let (engine, _) = populated_flat_engine(8, 10);
        engine.save_index(&path).unwrap();

        let other = EngineBuilder::new().embedding_dim(16).build().unwrap();
        let err = other.load_index(&path).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_rejects_scale_class_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("context.idx");

        let (engine, _) = populated_flat_engine(8, 10);
        engine.save_index(&path).unwrap();

        let config = IndexConfig {
            embedding_dim: 8,
            vector_count: 200_000,
            n_clusters: 8,
            n_probe: 8,
            ..Default::default()
        };
        let larger = EngineBuilder::new().config(config).build().unwrap();
        assert_eq!(larger.scale_class(), IndexScaleClass::IvfFlat);

        let err = larger.load_index(&path).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_missing_snapshot_errors() {
        let dir = TempDir::new().unwrap();
        let engine = EngineBuilder::new().embedding_dim(8).build().unwrap();
        let err = engine.load_index(&dir.path().join("absent.idx")).unwrap_err();
        assert!(matches!(err, EngineError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_from_snapshot_restores_same_class() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("context.idx");

        let (engine, vectors) = populated_flat_engine(8, 20);
        engine.save_index(&path).unwrap();

        let restored = EngineBuilder::new()
            .embedding_dim(8)
            .from_snapshot(&path)
            .unwrap();
        assert_eq!(restored.scale_class(), IndexScaleClass::Flat);
        assert_eq!(restored.vector_count(), 20);
        assert!(restored.is_calibrated());

        let (ids, _) = restored.search_context(&vectors[3], 1, true).await.unwrap();
        assert_eq!(ids, vec![ChunkId::from(503)]);
    }

    #[tokio::test]
    async fn test_from_snapshot_reclassifies_flat_to_ivf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("context.idx");

        let (engine, vectors) = populated_flat_engine(8, 120);
        engine.save_index(&path).unwrap();

        // The vector-count hint pushes the restored engine over the flat
        // threshold, so the index is rebuilt as IVF from stored vectors.
        let config = IndexConfig {
            embedding_dim: 8,
            vector_count: 200_000,
            n_clusters: 8,
            n_probe: 8,
            seed: Some(42),
            ..Default::default()
        };
        let restored = EngineBuilder::new().config(config).from_snapshot(&path).unwrap();
        assert_eq!(restored.scale_class(), IndexScaleClass::IvfFlat);
        assert_eq!(restored.vector_count(), 120);
        assert_eq!(restored.config().vector_count, 200_000);

        // Probing every list keeps the rebuilt search exhaustive, so the
        // ordinal-to-id mapping must line up exactly.
        let (ids, _) = restored.search_context(&vectors[33], 1, true).await.unwrap();
        assert_eq!(ids, vec![ChunkId::from(533)]);
    }

    #[test]
    fn test_from_snapshot_cannot_expand_quantized_index() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("context.idx");

        let config = IndexConfig {
            embedding_dim: 16,
            vector_count: 2_000_000,
            n_clusters: 8,
            n_probe: 8,
            n_subquantizers: 4,
            seed: Some(42),
            ..Default::default()
        };
        let engine = EngineBuilder::new().config(config).build().unwrap();
        assert_eq!(engine.scale_class(), IndexScaleClass::IvfPq);

        let vectors = random_vectors(64, 16, 77);
        engine.add_vectors(&vectors, &chunk_ids(0..64)).unwrap();
        engine.save_index(&path).unwrap();

        // Codes cannot be decoded back into vectors, so shrinking the
        // class is refused rather than silently degraded.
        let err = EngineBuilder::new()
            .embedding_dim(16)
            .from_snapshot(&path)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }
}
