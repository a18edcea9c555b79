//! Traits for neighbour search abstraction in hitgraph_core.
//!
//! The graph builder only needs exact k-nearest-neighbour queries, so any
//! index structure (tree, brute force, an external library) can plug in here.

/// Exact k-nearest-neighbour search over a fixed set of feature vectors.
pub trait NeighborIndex {
    /// Number of indexed points.
    fn len(&self) -> usize;

    /// Check if the index holds no points.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the `k` indexed points closest to `query`.
    ///
    /// # Returns
    /// Point indices ordered by ascending squared Euclidean distance, ties
    /// broken by ascending index. At most `min(k, len)` entries. A query
    /// equal to an indexed point includes that point itself.
    fn k_nearest(&self, query: &[f32], k: usize) -> Vec<usize>;
}

/// Squared Euclidean distance between two feature vectors of equal length.
#[inline]
pub fn distance_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_squared() {
        assert_eq!(distance_squared(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_eq!(distance_squared(&[1.0], &[1.0]), 0.0);
    }
}
