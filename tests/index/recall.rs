// tests/index/recall.rs
// IVF search quality measured against exact flat search on clustered
// data, the shape conversation embeddings actually have.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use retrieval_cache::index::scale::IndexScaleClass;
use retrieval_cache::index::{
    FlatIndex, IndexError, IvfFlatIndex, IvfParams, IvfPqIndex, VectorIndex,
};

const DIM: usize = 16;

/// Well-separated cluster centers with small per-point noise.
fn clustered_vectors(n_clusters: usize, per_cluster: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::new();
    for c in 0..n_clusters {
        let center: Vec<f32> = (0..DIM).map(|d| ((c * 7 + d) % 13) as f32 * 3.0).collect();
        for _ in 0..per_cluster {
            out.push(center.iter().map(|x| x + rng.gen_range(-0.25..0.25)).collect());
        }
    }
    out
}

fn seeded_params(n_clusters: usize, n_probe: usize) -> IvfParams {
    IvfParams {
        n_clusters,
        n_probe,
        seed: Some(7),
        ..Default::default()
    }
}

#[cfg(test)]
mod ivf_recall_tests {
    use super::*;

    #[test]
    fn test_ivf_flat_finds_stored_vector_with_partial_probe() {
        let vectors = clustered_vectors(4, 50, 3);
        let mut index = IvfFlatIndex::new(DIM, seeded_params(8, 2)).unwrap();
        index.calibrate(&vectors).unwrap();
        index.add(&vectors).unwrap();

        // A stored vector routes to its own list, which is always the
        // first one probed.
        for ordinal in [0usize, 57, 123, 199] {
            let hits = index.search(&vectors[ordinal], 1).unwrap();
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].ordinal, ordinal);
            assert!(hits[0].distance < 1e-3);
        }
    }

    #[test]
    fn test_probing_all_lists_matches_flat_search() {
        let vectors = clustered_vectors(4, 50, 5);

        let mut flat = FlatIndex::new(DIM);
        flat.add(&vectors).unwrap();

        let mut ivf = IvfFlatIndex::new(DIM, seeded_params(8, 8)).unwrap();
        ivf.calibrate(&vectors).unwrap();
        ivf.add(&vectors).unwrap();

        // A query near, but not identical to, a stored point.
        let query: Vec<f32> = vectors[10].iter().map(|x| x + 0.1).collect();
        let flat_hits = flat.search(&query, 5).unwrap();
        let ivf_hits = ivf.search(&query, 5).unwrap();

        let flat_ordinals: Vec<usize> = flat_hits.iter().map(|h| h.ordinal).collect();
        let ivf_ordinals: Vec<usize> = ivf_hits.iter().map(|h| h.ordinal).collect();
        assert_eq!(flat_ordinals, ivf_ordinals);
    }

    #[test]
    fn test_ivf_pq_keeps_stored_vectors_in_top_ten() {
        let vectors = clustered_vectors(4, 50, 11);
        let mut index = IvfPqIndex::new(DIM, seeded_params(4, 4), 4).unwrap();
        index.calibrate(&vectors).unwrap();
        index.add(&vectors).unwrap();

        for ordinal in (0..200).step_by(10) {
            let hits = index.search(&vectors[ordinal], 10).unwrap();
            assert!(
                hits.iter().any(|h| h.ordinal == ordinal),
                "ordinal {} missing from top 10",
                ordinal
            );
        }
    }

    #[test]
    fn test_ivf_pq_distances_are_sorted() {
        let vectors = clustered_vectors(4, 50, 13);
        let mut index = IvfPqIndex::new(DIM, seeded_params(4, 2), 4).unwrap();
        index.calibrate(&vectors).unwrap();
        index.add(&vectors).unwrap();

        let hits = index.search(&vectors[25], 20).unwrap();
        assert_eq!(hits.len(), 20);
        for pair in hits.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn test_vector_index_auto_calibrates_on_first_add() {
        let vectors = clustered_vectors(4, 50, 17);
        let mut index = VectorIndex::for_scale_class(
            IndexScaleClass::IvfFlat,
            DIM,
            seeded_params(4, 4),
            4,
        )
        .unwrap();
        assert!(!index.is_calibrated());

        index.add(&vectors).unwrap();
        assert!(index.is_calibrated());
        assert_eq!(index.len(), 200);

        let hits = index.search(&vectors[42], 1).unwrap();
        assert_eq!(hits[0].ordinal, 42);
    }

    #[test]
    fn test_insufficient_calibration_is_reported() {
        let vectors = clustered_vectors(1, 10, 19);
        let mut index = IvfFlatIndex::new(DIM, seeded_params(50, 5)).unwrap();

        let err = index.calibrate(&vectors).unwrap_err();
        assert!(matches!(
            err,
            IndexError::InsufficientCalibration { got: 10, need: 50 }
        ));
    }
}
