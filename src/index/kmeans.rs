// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use crate::core::vector_ops::{nearest_centroid, squared_euclidean};
use rand::rngs::StdRng;
use rand::Rng;

/// Lloyd's k-means with k-means++ seeding.
///
/// Callers must guarantee `data.len() >= k`, `k > 0`, and consistent
/// dimensions; both calibration paths validate before calling.
pub fn run_kmeans(
    data: &[Vec<f32>],
    k: usize,
    max_iterations: usize,
    rng: &mut StdRng,
) -> Vec<Vec<f32>> {
    debug_assert!(k > 0 && data.len() >= k);
    let dim = data[0].len();

    // k-means++ seeding: first centroid uniform, the rest weighted by
    // squared distance to the nearest centroid chosen so far.
    let mut centroids: Vec<Vec<f32>> = Vec::with_capacity(k);
    let first = rng.gen_range(0..data.len());
    centroids.push(data[first].clone());

    let mut weights = vec![f32::INFINITY; data.len()];
    while centroids.len() < k {
        let latest = &centroids[centroids.len() - 1];
        for (weight, point) in weights.iter_mut().zip(data) {
            let dist = squared_euclidean(point, latest);
            if dist < *weight {
                *weight = dist;
            }
        }

        let total: f32 = weights.iter().sum();
        if total <= 0.0 {
            // Remaining points coincide with existing centroids.
            let idx = rng.gen_range(0..data.len());
            centroids.push(data[idx].clone());
            continue;
        }

        let threshold = rng.gen::<f32>() * total;
        let mut cumulative = 0.0;
        let mut chosen = data.len() - 1;
        for (i, weight) in weights.iter().enumerate() {
            cumulative += weight;
            if cumulative >= threshold {
                chosen = i;
                break;
            }
        }
        centroids.push(data[chosen].clone());
    }

    // Assignment/update iterations.
    let mut assignments = vec![0usize; data.len()];
    for _ in 0..max_iterations {
        let mut changed = false;
        for (slot, point) in assignments.iter_mut().zip(data) {
            let nearest = nearest_centroid(point, &centroids);
            if nearest != *slot {
                *slot = nearest;
                changed = true;
            }
        }

        let mut sums = vec![vec![0.0f32; dim]; k];
        let mut counts = vec![0usize; k];
        for (point, &cluster) in data.iter().zip(&assignments) {
            counts[cluster] += 1;
            for (sum, value) in sums[cluster].iter_mut().zip(point) {
                *sum += value;
            }
        }

        for ((centroid, sum), &count) in centroids.iter_mut().zip(&sums).zip(&counts) {
            if count > 0 {
                for (c, s) in centroid.iter_mut().zip(sum) {
                    *c = s / count as f32;
                }
            }
        }

        if !changed {
            break;
        }
    }

    centroids
}
