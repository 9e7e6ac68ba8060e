// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use crate::index::kmeans::run_kmeans;
use crate::index::IndexError;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Upper bound on codes per subspace. One byte per subvector.
pub const PQ_CODEBOOK_SIZE: usize = 256;

/// Product quantizer over residual vectors. Each vector is split into
/// `n_subquantizers` contiguous subvectors and each subvector is replaced
/// by the id of its nearest codeword, so a d-dimensional f32 vector
/// compresses to `n_subquantizers` bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductQuantizer {
    /// codebooks[s][c] is codeword c of subspace s.
    codebooks: Vec<Vec<Vec<f32>>>,
    n_subquantizers: usize,
    subvector_dim: usize,
    dimension: usize,
}

impl ProductQuantizer {
    /// Train one codebook per subspace on the given samples. The codebook
    /// size shrinks to the sample count when fewer than
    /// [`PQ_CODEBOOK_SIZE`] samples are available.
    pub fn train(
        samples: &[Vec<f32>],
        dimension: usize,
        n_subquantizers: usize,
        max_iterations: usize,
        rng: &mut StdRng,
    ) -> Result<Self, IndexError> {
        if n_subquantizers == 0 || dimension % n_subquantizers != 0 {
            return Err(IndexError::InvalidConfig(format!(
                "dimension {} is not divisible into {} subquantizers",
                dimension, n_subquantizers
            )));
        }
        if samples.is_empty() {
            return Err(IndexError::InsufficientCalibration { got: 0, need: 1 });
        }
        for sample in samples {
            if sample.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: sample.len(),
                });
            }
        }

        let subvector_dim = dimension / n_subquantizers;
        let codebook_size = PQ_CODEBOOK_SIZE.min(samples.len());

        let mut codebooks = Vec::with_capacity(n_subquantizers);
        for s in 0..n_subquantizers {
            let start = s * subvector_dim;
            let end = start + subvector_dim;
            let sub_samples: Vec<Vec<f32>> =
                samples.iter().map(|v| v[start..end].to_vec()).collect();
            codebooks.push(run_kmeans(&sub_samples, codebook_size, max_iterations, rng));
        }

        Ok(Self {
            codebooks,
            n_subquantizers,
            subvector_dim,
            dimension,
        })
    }

    pub fn n_subquantizers(&self) -> usize {
        self.n_subquantizers
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Quantize a (residual) vector to one code byte per subspace.
    pub fn encode(&self, vector: &[f32]) -> Vec<u8> {
        let mut code = Vec::with_capacity(self.n_subquantizers);
        for (s, codebook) in self.codebooks.iter().enumerate() {
            let start = s * self.subvector_dim;
            let sub = &vector[start..start + self.subvector_dim];
            let nearest = crate::core::vector_ops::nearest_centroid(sub, codebook);
            code.push(nearest as u8);
        }
        code
    }

    /// Precompute squared distances from the query's subvectors to every
    /// codeword, so scoring a stored code is a table lookup per subspace.
    pub fn build_lookup_table(&self, query: &[f32]) -> Vec<Vec<f32>> {
        self.codebooks
            .iter()
            .enumerate()
            .map(|(s, codebook)| {
                let start = s * self.subvector_dim;
                let sub = &query[start..start + self.subvector_dim];
                codebook
                    .iter()
                    .map(|codeword| crate::core::vector_ops::squared_euclidean(sub, codeword))
                    .collect()
            })
            .collect()
    }

    /// Asymmetric distance: exact query subvectors against quantized
    /// stored codes, summed across subspaces.
    pub fn asymmetric_distance(table: &[Vec<f32>], code: &[u8]) -> f32 {
        code.iter()
            .enumerate()
            .map(|(s, &c)| table[s][c as usize])
            .sum()
    }
}
