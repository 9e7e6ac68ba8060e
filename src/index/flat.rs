// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use crate::core::types::SearchHit;
use crate::core::vector_ops::{squared_euclidean, top_k};
use crate::index::IndexError;
use serde::{Deserialize, Serialize};

/// Exact exhaustive index: every search scans every stored vector.
/// Ordinal of a vector is its insertion position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Append a batch. The whole batch is validated before anything is
    /// stored so a bad row never leaves a partial insert behind.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        for vector in vectors {
            if vector.len() != self.dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }
        self.vectors.extend(vectors.iter().cloned());
        Ok(())
    }

    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let candidates = self
            .vectors
            .iter()
            .enumerate()
            .map(|(ordinal, vector)| SearchHit::new(ordinal, squared_euclidean(query, vector)));

        Ok(top_k(candidates, k))
    }

    /// Stored vectors in ordinal order.
    pub fn export_vectors(&self) -> Vec<Vec<f32>> {
        self.vectors.clone()
    }
}
