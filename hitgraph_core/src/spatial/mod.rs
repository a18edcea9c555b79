//! Spatial indices for exact k-nearest-neighbour queries.
//!
//! - [`KdTree`]: median-split tree with bounding-box pruning, O(log n) average queries
//! - [`BruteForce`]: linear scan, used for tiny clouds and as a reference

mod brute;
mod kdtree;

pub use brute::BruteForce;
pub use kdtree::KdTree;

use core::cmp::Ordering;

/// A candidate neighbour ordered by `(distance, index)`.
///
/// The index tie-break makes the neighbour set identical across index
/// implementations, even with duplicate points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Candidate {
    pub dist_sq: f32,
    pub index: usize,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist_sq
            .total_cmp(&other.dist_sq)
            .then(self.index.cmp(&other.index))
    }
}
