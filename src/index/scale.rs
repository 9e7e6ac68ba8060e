// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use serde::{Deserialize, Serialize};
use std::fmt;

/// Vector counts at which the next index structure pays off.
pub const FLAT_MAX_VECTORS: usize = 100_000;
pub const IVF_FLAT_MAX_VECTORS: usize = 1_000_000;
pub const IVF_PQ_MAX_VECTORS: usize = 10_000_000;

/// Families of index structure, selected once from the expected vector
/// count. The class is fixed for an engine's lifetime: growing past a
/// threshold never rebuilds a live index, it only makes the next
/// engine built from a snapshot pick a different class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexScaleClass {
    /// Exact exhaustive search. Cheapest and simplest below 100K.
    Flat,
    /// Inverted-file index over full vectors.
    IvfFlat,
    /// Inverted-file index over product-quantized codes.
    IvfPq,
    /// Quantized inverted-file index resident on a GPU.
    IvfPqGpu,
}

/// Documented latency range for a scale class. Informational only:
/// used for post-hoc validation in reports and stats, never to change
/// search behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedLatencyBand {
    pub min_ms: f64,
    pub max_ms: f64,
}

impl ExpectedLatencyBand {
    /// Whether an observed latency stayed within budget. Finishing
    /// faster than the band's floor still counts as meeting it.
    pub fn meets_target(&self, latency_ms: f64) -> bool {
        latency_ms <= self.max_ms
    }
}

impl IndexScaleClass {
    /// Pick the class for an expected vector count. Pure and total:
    /// every count maps to exactly one class.
    pub fn classify(vector_count: usize, use_gpu: bool) -> Self {
        if vector_count < FLAT_MAX_VECTORS {
            IndexScaleClass::Flat
        } else if vector_count < IVF_FLAT_MAX_VECTORS {
            IndexScaleClass::IvfFlat
        } else if vector_count < IVF_PQ_MAX_VECTORS {
            IndexScaleClass::IvfPq
        } else if use_gpu {
            IndexScaleClass::IvfPqGpu
        } else {
            IndexScaleClass::IvfPq
        }
    }

    pub fn expected_latency(&self) -> ExpectedLatencyBand {
        match self {
            IndexScaleClass::Flat => ExpectedLatencyBand {
                min_ms: 1.0,
                max_ms: 5.0,
            },
            IndexScaleClass::IvfFlat => ExpectedLatencyBand {
                min_ms: 2.0,
                max_ms: 10.0,
            },
            IndexScaleClass::IvfPq => ExpectedLatencyBand {
                min_ms: 5.0,
                max_ms: 20.0,
            },
            IndexScaleClass::IvfPqGpu => ExpectedLatencyBand {
                min_ms: 2.0,
                max_ms: 10.0,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IndexScaleClass::Flat => "FLAT",
            IndexScaleClass::IvfFlat => "IVF_FLAT",
            IndexScaleClass::IvfPq => "IVF_PQ",
            IndexScaleClass::IvfPqGpu => "GPU_IVF_PQ",
        }
    }

    pub fn requires_gpu(&self) -> bool {
        matches!(self, IndexScaleClass::IvfPqGpu)
    }
}

impl fmt::Display for IndexScaleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
