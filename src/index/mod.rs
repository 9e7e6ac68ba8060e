// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

pub mod flat;
pub mod ivf;
pub mod kmeans;
pub mod persistence;
pub mod pq;
pub mod scale;

pub use flat::FlatIndex;
pub use ivf::{CoarseQuantizer, IvfFlatIndex, IvfParams, IvfPqIndex};
pub use persistence::{load_snapshot, save_snapshot, IndexSnapshot, PersistenceError, SnapshotMetadata};
pub use pq::ProductQuantizer;
pub use scale::{ExpectedLatencyBand, IndexScaleClass};

use crate::core::types::SearchHit;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Insufficient calibration data: got {got} samples, need at least {need}")]
    InsufficientCalibration { got: usize, need: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Index is not calibrated")]
    NotCalibrated,

    #[error("GPU acceleration requested but no GPU backend is available")]
    GpuUnavailable,
}

/// Concrete index behind the engine, chosen once from the scale class and
/// never changed for the engine's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VectorIndex {
    Flat(FlatIndex),
    IvfFlat(IvfFlatIndex),
    IvfPq(IvfPqIndex),
}

impl VectorIndex {
    /// Build an empty index of the shape the scale class calls for.
    pub fn for_scale_class(
        class: IndexScaleClass,
        dimension: usize,
        params: IvfParams,
        n_subquantizers: usize,
    ) -> Result<Self, IndexError> {
        match class {
            IndexScaleClass::Flat => Ok(Self::Flat(FlatIndex::new(dimension))),
            IndexScaleClass::IvfFlat => Ok(Self::IvfFlat(IvfFlatIndex::new(dimension, params)?)),
            IndexScaleClass::IvfPq => {
                Ok(Self::IvfPq(IvfPqIndex::new(dimension, params, n_subquantizers)?))
            }
            IndexScaleClass::IvfPqGpu => Err(IndexError::GpuUnavailable),
        }
    }

    pub fn dimension(&self) -> usize {
        match self {
            Self::Flat(index) => index.dimension(),
            Self::IvfFlat(index) => index.dimension(),
            Self::IvfPq(index) => index.dimension(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Flat(index) => index.len(),
            Self::IvfFlat(index) => index.len(),
            Self::IvfPq(index) => index.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat indexes need no calibration and always report true.
    pub fn is_calibrated(&self) -> bool {
        match self {
            Self::Flat(_) => true,
            Self::IvfFlat(index) => index.is_calibrated(),
            Self::IvfPq(index) => index.is_calibrated(),
        }
    }

    pub fn calibrate(&mut self, samples: &[Vec<f32>]) -> Result<(), IndexError> {
        match self {
            Self::Flat(_) => Ok(()),
            Self::IvfFlat(index) => index.calibrate(samples),
            Self::IvfPq(index) => index.calibrate(samples),
        }
    }

    /// Append a batch, calibrating from the batch itself on first use.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        if !self.is_calibrated() {
            self.calibrate(vectors)?;
        }
        match self {
            Self::Flat(index) => index.add(vectors),
            Self::IvfFlat(index) => index.add(vectors),
            Self::IvfPq(index) => index.add(vectors),
        }
    }

    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        match self {
            Self::Flat(index) => index.search(query, k),
            Self::IvfFlat(index) => index.search(query, k),
            Self::IvfPq(index) => index.search(query, k),
        }
    }

    /// Full-precision vectors in ordinal order, when the index keeps them.
    /// PQ indexes store only codes, so their content cannot be exported.
    pub fn export_vectors(&self) -> Option<Vec<Vec<f32>>> {
        match self {
            Self::Flat(index) => Some(index.export_vectors()),
            Self::IvfFlat(index) => Some(index.export_vectors()),
            Self::IvfPq(_) => None,
        }
    }

    pub fn scale_class_name(&self) -> &'static str {
        match self {
            Self::Flat(_) => IndexScaleClass::Flat.name(),
            Self::IvfFlat(_) => IndexScaleClass::IvfFlat.name(),
            Self::IvfPq(_) => IndexScaleClass::IvfPq.name(),
        }
    }
}
