// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use crate::core::types::ChunkIdMap;
use crate::index::scale::IndexScaleClass;
use crate::index::VectorIndex;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Current snapshot format version. Bump on incompatible layout changes.
pub const SNAPSHOT_VERSION: u32 = 1;

/// zstd level for the index snapshot. The mapping sidecar is small and
/// stays uncompressed.
const COMPRESSION_LEVEL: i32 = 3;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Incompatible snapshot version: supported up to {expected}, found {found}")]
    IncompatibleVersion { expected: u32, found: u32 },

    #[error("Invalid snapshot data: {0}")]
    InvalidData(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub version: u32,
    pub scale_class: IndexScaleClass,
    pub dimension: usize,
    pub n_vectors: usize,
    pub timestamp: DateTime<Utc>,
}

/// Borrowing mirror of [`IndexSnapshot`] so saving never clones the index.
#[derive(Serialize)]
struct SnapshotParts<'a> {
    metadata: &'a SnapshotMetadata,
    index: &'a VectorIndex,
}

#[derive(Deserialize)]
pub struct IndexSnapshot {
    pub metadata: SnapshotMetadata,
    pub index: VectorIndex,
}

/// Sidecar path for the ordinal-to-chunk-id mapping: `<path>.mapping`.
pub fn mapping_path(path: &Path) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(".mapping");
    PathBuf::from(os)
}

/// Write the index as zstd-compressed CBOR at `path` and the id mapping
/// as plain CBOR at `<path>.mapping`.
pub fn save_snapshot(
    path: &Path,
    scale_class: IndexScaleClass,
    index: &VectorIndex,
    id_map: &ChunkIdMap,
) -> Result<SnapshotMetadata, PersistenceError> {
    let metadata = SnapshotMetadata {
        version: SNAPSHOT_VERSION,
        scale_class,
        dimension: index.dimension(),
        n_vectors: index.len(),
        timestamp: Utc::now(),
    };

    let parts = SnapshotParts {
        metadata: &metadata,
        index,
    };
    let cbor = serde_cbor::to_vec(&parts).map_err(|e| PersistenceError::Serialization(e.to_string()))?;
    let compressed = zstd::encode_all(&cbor[..], COMPRESSION_LEVEL)?;
    std::fs::write(path, &compressed)?;

    let mapping = id_map
        .to_cbor()
        .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
    std::fs::write(mapping_path(path), &mapping)?;

    debug!(
        path = %path.display(),
        n_vectors = metadata.n_vectors,
        compressed_bytes = compressed.len(),
        "saved index snapshot"
    );
    Ok(metadata)
}

/// Read a snapshot back. The mapping sidecar is optional: `None` means
/// the caller should run in degraded mode with raw ordinal ids.
pub fn load_snapshot(
    path: &Path,
) -> Result<(SnapshotMetadata, VectorIndex, Option<ChunkIdMap>), PersistenceError> {
    let compressed = std::fs::read(path)?;
    let cbor = zstd::decode_all(&compressed[..])?;
    let snapshot: IndexSnapshot =
        serde_cbor::from_slice(&cbor).map_err(|e| PersistenceError::Serialization(e.to_string()))?;

    if snapshot.metadata.version > SNAPSHOT_VERSION {
        return Err(PersistenceError::IncompatibleVersion {
            expected: SNAPSHOT_VERSION,
            found: snapshot.metadata.version,
        });
    }
    if snapshot.metadata.n_vectors != snapshot.index.len() {
        return Err(PersistenceError::InvalidData(format!(
            "metadata reports {} vectors but index holds {}",
            snapshot.metadata.n_vectors,
            snapshot.index.len()
        )));
    }

    let id_map = match std::fs::read(mapping_path(path)) {
        Ok(bytes) => Some(
            ChunkIdMap::from_cbor(&bytes)
                .map_err(|e| PersistenceError::Serialization(e.to_string()))?,
        ),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(PersistenceError::Io(e)),
    };

    Ok((snapshot.metadata, snapshot.index, id_map))
}
