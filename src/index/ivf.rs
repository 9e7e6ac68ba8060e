// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use crate::core::types::SearchHit;
use crate::core::vector_ops::{squared_euclidean, top_k};
use crate::index::kmeans::run_kmeans;
use crate::index::pq::ProductQuantizer;
use crate::index::IndexError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Tuning knobs shared by the IVF index variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IvfParams {
    /// Number of coarse clusters (inverted lists).
    pub n_clusters: usize,
    /// Lists probed per query.
    pub n_probe: usize,
    /// k-means iteration cap for calibration.
    pub max_iterations: usize,
    /// Fixed seed for reproducible calibration. None draws from entropy.
    pub seed: Option<u64>,
}

impl Default for IvfParams {
    fn default() -> Self {
        Self {
            n_clusters: 100,
            n_probe: 10,
            max_iterations: 25,
            seed: None,
        }
    }
}

impl IvfParams {
    pub fn is_valid(&self) -> bool {
        self.n_clusters > 0 && self.n_probe > 0 && self.n_probe <= self.n_clusters
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Coarse k-means quantizer: routes vectors and queries to inverted lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoarseQuantizer {
    centroids: Vec<Vec<f32>>,
}

impl CoarseQuantizer {
    fn train(samples: &[Vec<f32>], n_clusters: usize, max_iterations: usize, rng: &mut StdRng) -> Self {
        Self {
            centroids: run_kmeans(samples, n_clusters, max_iterations, rng),
        }
    }

    pub fn n_lists(&self) -> usize {
        self.centroids.len()
    }

    pub fn centroid(&self, list: usize) -> &[f32] {
        &self.centroids[list]
    }

    /// List whose centroid is closest to the vector.
    pub fn assign(&self, vector: &[f32]) -> usize {
        crate::core::vector_ops::nearest_centroid(vector, &self.centroids)
    }

    /// The `n_probe` lists closest to the query, nearest first.
    pub fn nearest_lists(&self, query: &[f32], n_probe: usize) -> Vec<usize> {
        let mut ranked: Vec<(usize, f32)> = self
            .centroids
            .iter()
            .enumerate()
            .map(|(i, c)| (i, squared_euclidean(query, c)))
            .collect();
        ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(n_probe);
        ranked.into_iter().map(|(i, _)| i).collect()
    }
}

/// One inverted list holding full vectors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct InvertedList {
    ordinals: Vec<usize>,
    vectors: Vec<Vec<f32>>,
}

/// One inverted list holding PQ codes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CodeList {
    ordinals: Vec<usize>,
    codes: Vec<Vec<u8>>,
}

/// IVF index with exact distances inside each probed list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IvfFlatIndex {
    dimension: usize,
    params: IvfParams,
    quantizer: Option<CoarseQuantizer>,
    lists: Vec<InvertedList>,
    len: usize,
}

impl IvfFlatIndex {
    pub fn new(dimension: usize, params: IvfParams) -> Result<Self, IndexError> {
        if !params.is_valid() {
            return Err(IndexError::InvalidConfig(format!(
                "invalid IVF params: n_clusters={}, n_probe={}",
                params.n_clusters, params.n_probe
            )));
        }
        Ok(Self {
            dimension,
            params,
            quantizer: None,
            lists: Vec::new(),
            len: 0,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_calibrated(&self) -> bool {
        self.quantizer.is_some()
    }

    /// Train the coarse quantizer. Requires at least `n_clusters` samples.
    pub fn calibrate(&mut self, samples: &[Vec<f32>]) -> Result<(), IndexError> {
        check_dimensions(samples, self.dimension)?;
        if samples.len() < self.params.n_clusters {
            return Err(IndexError::InsufficientCalibration {
                got: samples.len(),
                need: self.params.n_clusters,
            });
        }
        let mut rng = self.params.rng();
        let quantizer = CoarseQuantizer::train(
            samples,
            self.params.n_clusters,
            self.params.max_iterations,
            &mut rng,
        );
        self.lists = (0..quantizer.n_lists()).map(|_| InvertedList::default()).collect();
        self.quantizer = Some(quantizer);
        Ok(())
    }

    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        check_dimensions(vectors, self.dimension)?;
        let quantizer = self.quantizer.as_ref().ok_or(IndexError::NotCalibrated)?;
        for vector in vectors {
            let list = quantizer.assign(vector);
            self.lists[list].ordinals.push(self.len);
            self.lists[list].vectors.push(vector.clone());
            self.len += 1;
        }
        Ok(())
    }

    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        let quantizer = match &self.quantizer {
            Some(q) => q,
            None => return Ok(Vec::new()),
        };

        let mut candidates = Vec::new();
        for list in quantizer.nearest_lists(query, self.params.n_probe) {
            let inverted = &self.lists[list];
            for (ordinal, vector) in inverted.ordinals.iter().zip(&inverted.vectors) {
                candidates.push(SearchHit::new(*ordinal, squared_euclidean(query, vector)));
            }
        }
        Ok(top_k(candidates, k))
    }

    /// Stored vectors in ordinal order, for rebuilding under a different
    /// index shape.
    pub fn export_vectors(&self) -> Vec<Vec<f32>> {
        let mut out: Vec<(usize, Vec<f32>)> = Vec::with_capacity(self.len);
        for list in &self.lists {
            for (ordinal, vector) in list.ordinals.iter().zip(&list.vectors) {
                out.push((*ordinal, vector.clone()));
            }
        }
        out.sort_by_key(|(ordinal, _)| *ordinal);
        out.into_iter().map(|(_, v)| v).collect()
    }
}

/// IVF index with product-quantized residuals inside each list. Distances
/// are approximate; memory per vector drops to one byte per subquantizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IvfPqIndex {
    dimension: usize,
    params: IvfParams,
    n_subquantizers: usize,
    quantizer: Option<CoarseQuantizer>,
    pq: Option<ProductQuantizer>,
    lists: Vec<CodeList>,
    len: usize,
}

impl IvfPqIndex {
    pub fn new(
        dimension: usize,
        params: IvfParams,
        n_subquantizers: usize,
    ) -> Result<Self, IndexError> {
        if !params.is_valid() {
            return Err(IndexError::InvalidConfig(format!(
                "invalid IVF params: n_clusters={}, n_probe={}",
                params.n_clusters, params.n_probe
            )));
        }
        if n_subquantizers == 0 || dimension % n_subquantizers != 0 {
            return Err(IndexError::InvalidConfig(format!(
                "dimension {} is not divisible into {} subquantizers",
                dimension, n_subquantizers
            )));
        }
        Ok(Self {
            dimension,
            params,
            n_subquantizers,
            quantizer: None,
            pq: None,
            lists: Vec::new(),
            len: 0,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_calibrated(&self) -> bool {
        self.quantizer.is_some() && self.pq.is_some()
    }

    /// Train the coarse quantizer, then the product quantizer on the
    /// residuals of the calibration samples.
    pub fn calibrate(&mut self, samples: &[Vec<f32>]) -> Result<(), IndexError> {
        check_dimensions(samples, self.dimension)?;
        if samples.len() < self.params.n_clusters {
            return Err(IndexError::InsufficientCalibration {
                got: samples.len(),
                need: self.params.n_clusters,
            });
        }
        let mut rng = self.params.rng();
        let quantizer = CoarseQuantizer::train(
            samples,
            self.params.n_clusters,
            self.params.max_iterations,
            &mut rng,
        );

        let residuals: Vec<Vec<f32>> = samples
            .iter()
            .map(|v| residual(v, quantizer.centroid(quantizer.assign(v))))
            .collect();
        let pq = ProductQuantizer::train(
            &residuals,
            self.dimension,
            self.n_subquantizers,
            self.params.max_iterations,
            &mut rng,
        )?;

        self.lists = (0..quantizer.n_lists()).map(|_| CodeList::default()).collect();
        self.quantizer = Some(quantizer);
        self.pq = Some(pq);
        Ok(())
    }

    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        check_dimensions(vectors, self.dimension)?;
        let (quantizer, pq) = match (&self.quantizer, &self.pq) {
            (Some(q), Some(p)) => (q, p),
            _ => return Err(IndexError::NotCalibrated),
        };
        for vector in vectors {
            let list = quantizer.assign(vector);
            let code = pq.encode(&residual(vector, quantizer.centroid(list)));
            self.lists[list].ordinals.push(self.len);
            self.lists[list].codes.push(code);
            self.len += 1;
        }
        Ok(())
    }

    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        let (quantizer, pq) = match (&self.quantizer, &self.pq) {
            (Some(q), Some(p)) => (q, p),
            _ => return Ok(Vec::new()),
        };

        let mut candidates = Vec::new();
        for list in quantizer.nearest_lists(query, self.params.n_probe) {
            // Codes are residuals against this list's centroid, so the
            // lookup table must be built from the query's residual too.
            let table = pq.build_lookup_table(&residual(query, quantizer.centroid(list)));
            let code_list = &self.lists[list];
            for (ordinal, code) in code_list.ordinals.iter().zip(&code_list.codes) {
                candidates.push(SearchHit::new(
                    *ordinal,
                    ProductQuantizer::asymmetric_distance(&table, code),
                ));
            }
        }
        Ok(top_k(candidates, k))
    }
}

fn residual(vector: &[f32], centroid: &[f32]) -> Vec<f32> {
    vector.iter().zip(centroid).map(|(v, c)| v - c).collect()
}

fn check_dimensions(vectors: &[Vec<f32>], dimension: usize) -> Result<(), IndexError> {
    for vector in vectors {
        if vector.len() != dimension {
            return Err(IndexError::DimensionMismatch {
                expected: dimension,
                actual: vector.len(),
            });
        }
    }
    Ok(())
}
