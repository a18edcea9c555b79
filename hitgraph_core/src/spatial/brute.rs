//! Linear-scan neighbour search.

use super::Candidate;
use crate::traits::{distance_squared, NeighborIndex};

/// O(N) per query neighbour search over borrowed row-major features.
pub struct BruteForce<'a> {
    features: &'a [f32],
    num_features: usize,
}

impl<'a> BruteForce<'a> {
    /// Index `features` (row-major, `num_features` per point).
    pub fn new(features: &'a [f32], num_features: usize) -> Self {
        Self {
            features,
            num_features,
        }
    }
}

impl NeighborIndex for BruteForce<'_> {
    fn len(&self) -> usize {
        if self.num_features == 0 {
            0
        } else {
            self.features.len() / self.num_features
        }
    }

    fn k_nearest(&self, query: &[f32], k: usize) -> Vec<usize> {
        let mut candidates: Vec<Candidate> = self
            .features
            .chunks_exact(self.num_features.max(1))
            .enumerate()
            .map(|(index, point)| Candidate {
                dist_sq: distance_squared(point, query),
                index,
            })
            .collect();

        let k = k.min(candidates.len());
        if k == 0 {
            return Vec::new();
        }
        candidates.select_nth_unstable(k - 1);
        candidates.truncate(k);
        candidates.sort_unstable();
        candidates.into_iter().map(|c| c.index).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brute_force_order() {
        let features = [0.0, 3.0, 1.0, 1.0, 10.0];
        let index = BruteForce::new(&features, 1);

        assert_eq!(index.len(), 5);
        assert_eq!(index.k_nearest(&[0.9], 3), vec![2, 3, 0]);
        assert_eq!(index.k_nearest(&[0.0], 10).len(), 5);
        assert!(index.k_nearest(&[0.0], 0).is_empty());
    }
}
