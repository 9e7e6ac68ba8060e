// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

pub mod types;
pub mod vector_ops;

pub use types::{ChunkId, ChunkIdMap, QueryFingerprint, SearchHit};
