use crate::core::types::SearchHit;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Squared Euclidean distance between two equal-length vectors.
///
/// All index structures rank by this; the square root is never taken
/// because it preserves ordering.
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Index of the centroid nearest to `point`. Assumes `centroids` is
/// non-empty.
pub fn nearest_centroid(point: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;

    for (i, centroid) in centroids.iter().enumerate() {
        let dist = squared_euclidean(point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }

    best
}

// Max-heap entry so the worst retained candidate sits on top.
struct HeapEntry(SearchHit);

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.0.distance == other.0.distance
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.distance.partial_cmp(&other.0.distance)
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

/// Keep the k nearest hits from a candidate stream, sorted ascending by
/// distance. A bounded heap avoids materializing every candidate.
pub fn top_k(candidates: impl IntoIterator<Item = SearchHit>, k: usize) -> Vec<SearchHit> {
    if k == 0 {
        return Vec::new();
    }

    let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::with_capacity(k + 1);
    for hit in candidates {
        heap.push(HeapEntry(hit));
        if heap.len() > k {
            heap.pop();
        }
    }

    let mut hits: Vec<SearchHit> = heap.into_iter().map(|entry| entry.0).collect();
    hits.sort();
    hits
}
