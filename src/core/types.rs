use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a content chunk at the data owner. Opaque to the engine:
/// it is handed in through `add_vectors`, stored in the ordinal mapping,
/// and round-tripped back out of searches untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(pub u64);

impl ChunkId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChunkId {
    fn from(raw: u64) -> Self {
        ChunkId(raw)
    }
}

/// Append-only table from index ordinal to caller-supplied chunk id.
///
/// Ordinal `i` maps to the id supplied when vector `i` was inserted.
/// Entries are never reordered or removed; an index restored without its
/// mapping artifact simply runs with an empty table and serves raw
/// ordinals (degraded mode).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkIdMap {
    ids: Vec<ChunkId>,
}

impl ChunkIdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, id: ChunkId) {
        self.ids.push(id);
    }

    pub fn extend_from(&mut self, ids: &[ChunkId]) {
        self.ids.extend_from_slice(ids);
    }

    /// Id for the given ordinal, or None when the ordinal has no mapping
    /// (degraded mode after a mapping-less restore).
    pub fn translate(&self, ordinal: usize) -> Option<ChunkId> {
        self.ids.get(ordinal).copied()
    }

    /// Translate an ordinal, falling back to the raw ordinal as an id.
    pub fn translate_or_raw(&self, ordinal: usize) -> ChunkId {
        self.translate(ordinal)
            .unwrap_or(ChunkId(ordinal as u64))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }

    pub fn from_cbor(data: &[u8]) -> Result<Self, serde_cbor::Error> {
        serde_cbor::from_slice(data)
    }
}

/// Deterministic short identifier for a query vector, derived from its
/// raw little-endian bytes. Used as the cache key for the query-result
/// keyspace; collisions are guarded by comparing the raw bytes in the
/// process-local memo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryFingerprint(String);

impl QueryFingerprint {
    pub fn from_query(query: &[f32]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for value in query {
            hasher.update(&value.to_le_bytes());
        }
        let hash = hasher.finalize();
        QueryFingerprint(hex::encode(&hash.as_bytes()[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One raw search result: insertion position inside the index plus the
/// squared-Euclidean distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub ordinal: usize,
    pub distance: f32,
}

impl SearchHit {
    pub fn new(ordinal: usize, distance: f32) -> Self {
        SearchHit { ordinal, distance }
    }
}

impl PartialOrd for SearchHit {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.distance.partial_cmp(&other.distance)
    }
}

impl Ord for SearchHit {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.distance
            .partial_cmp(&other.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

impl Eq for SearchHit {}
