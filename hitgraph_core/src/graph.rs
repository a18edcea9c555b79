//! k-nearest-neighbour graph construction with matched-pair edge labels.
//!
//! Every point is connected to its `k` nearest neighbours in feature space
//! (the point itself counts among the `k` and is then dropped), giving at
//! most `N * k` directed edges without self-loops. An edge carries the shared
//! label of its endpoints when they agree, and [`UNMATCHED_LABEL`] otherwise.

use crate::error::{HitGraphError, Result};
use crate::spatial::{BruteForce, KdTree};
use crate::traits::NeighborIndex;
use crate::types::{GraphRecord, RawSample, UNMATCHED_LABEL};

/// Default number of neighbours per point.
pub const DEFAULT_K: usize = 4;

/// Clouds at or below this size use the linear scan under [`NeighborAlgorithm::Auto`].
pub const BRUTE_FORCE_THRESHOLD: usize = 32;

/// Neighbour search strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NeighborAlgorithm {
    /// Linear scan for tiny clouds, k-d tree otherwise.
    #[default]
    Auto,
    /// Always use the k-d tree.
    KdTree,
    /// Always use the linear scan.
    BruteForce,
}

/// Configuration for [`GraphBuilder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphBuilderConfig {
    /// Neighbours per point, including the point itself.
    pub k: usize,
    /// Neighbour search strategy.
    pub algorithm: NeighborAlgorithm,
}

impl Default for GraphBuilderConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            algorithm: NeighborAlgorithm::Auto,
        }
    }
}

impl GraphBuilderConfig {
    /// Set the neighbour count.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set the neighbour search strategy.
    pub fn with_algorithm(mut self, algorithm: NeighborAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

/// Converts raw samples into labeled k-NN graph records.
#[derive(Clone, Copy, Debug, Default)]
pub struct GraphBuilder {
    config: GraphBuilderConfig,
}

impl GraphBuilder {
    /// Create a builder, rejecting `k == 0`.
    pub fn new(config: GraphBuilderConfig) -> Result<Self> {
        if config.k == 0 {
            return Err(HitGraphError::ZeroNeighbors);
        }
        Ok(Self { config })
    }

    /// Builder configuration.
    pub fn config(&self) -> &GraphBuilderConfig {
        &self.config
    }

    /// Build the graph record for one sample.
    ///
    /// Edges are ordered by `(source, target)`.
    pub fn build(&self, sample: &RawSample) -> Result<GraphRecord> {
        let num_points = sample.num_points();
        let num_features = sample.num_features();
        let features = sample.features();

        let use_tree = match self.config.algorithm {
            NeighborAlgorithm::KdTree => true,
            NeighborAlgorithm::BruteForce => false,
            NeighborAlgorithm::Auto => num_points > BRUTE_FORCE_THRESHOLD,
        };

        let adjacency = if use_tree {
            self.adjacency(&KdTree::build(features, num_features), sample)
        } else {
            self.adjacency(&BruteForce::new(features, num_features), sample)
        };

        let labels = sample.labels();
        let mut edge_sources = Vec::with_capacity(adjacency.len());
        let mut edge_targets = Vec::with_capacity(adjacency.len());
        let mut edge_labels = Vec::with_capacity(adjacency.len());

        for (src, dst) in adjacency {
            edge_sources.push(src);
            edge_targets.push(dst);
            edge_labels.push(edge_label(labels[src], labels[dst]));
        }

        GraphRecord::new(
            features.to_vec(),
            num_features,
            edge_sources,
            edge_targets,
            edge_labels,
            labels.to_vec(),
        )
    }

    /// Sorted, deduplicated `(source, target)` pairs without self-loops.
    fn adjacency<I: NeighborIndex>(&self, index: &I, sample: &RawSample) -> Vec<(usize, usize)> {
        let mut pairs = Vec::with_capacity(sample.num_points() * self.config.k);

        for src in 0..sample.num_points() {
            for dst in index.k_nearest(sample.point(src), self.config.k) {
                if dst != src {
                    pairs.push((src, dst));
                }
            }
        }

        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }
}

/// Matched-pair rule: shared label when endpoints agree, else unmatched.
#[inline]
pub fn edge_label(source_label: i64, target_label: i64) -> i64 {
    if source_label == target_label {
        source_label
    } else {
        UNMATCHED_LABEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_sample() -> RawSample {
        // Two clusters far apart: {0, 1} label 1, {2, 3, 4} label 2
        let features = vec![
            0.0, 0.0, //
            0.1, 0.0, //
            10.0, 10.0, //
            10.1, 10.0, //
            10.0, 10.1, //
        ];
        RawSample::new(features, 2, vec![1, 1, 2, 2, 2]).unwrap()
    }

    #[test]
    fn test_zero_k_rejected() {
        let err = GraphBuilder::new(GraphBuilderConfig::default().with_k(0)).unwrap_err();
        assert_eq!(err, HitGraphError::ZeroNeighbors);
    }

    #[test]
    fn test_toy_cloud_k2() {
        let builder = GraphBuilder::new(GraphBuilderConfig::default().with_k(2)).unwrap();
        let record = builder.build(&toy_sample()).unwrap();

        // k=2 includes self, so each point keeps exactly one neighbour
        assert_eq!(record.num_edges(), 5);
        assert_eq!(record.edge_sources, vec![0, 1, 2, 3, 4]);
        assert_eq!(record.edge_targets, vec![1, 0, 3, 2, 2]);
        assert_eq!(record.edge_labels, vec![1, 1, 2, 2, 2]);
        assert_eq!(record.node_labels, vec![1, 1, 2, 2, 2]);
    }

    #[test]
    fn test_cross_cluster_edges_unmatched() {
        let builder = GraphBuilder::new(GraphBuilderConfig::default().with_k(4)).unwrap();
        let record = builder.build(&toy_sample()).unwrap();

        for (i, (s, t)) in record.edges().enumerate() {
            assert_ne!(s, t);
            let cross = (s < 2) != (t < 2);
            if cross {
                assert_eq!(record.edge_labels[i], UNMATCHED_LABEL);
            } else {
                assert_ne!(record.edge_labels[i], UNMATCHED_LABEL);
            }
        }
        assert!(record.num_edges() <= 5 * 4);
    }

    #[test]
    fn test_single_point_has_no_edges() {
        let sample = RawSample::new(vec![1.0, 2.0, 3.0], 3, vec![7]).unwrap();
        let record = GraphBuilder::default().build(&sample).unwrap();
        assert_eq!(record.num_edges(), 0);
        assert_eq!(record.num_nodes(), 1);
    }

    #[test]
    fn test_algorithms_agree() {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..64 {
            let t = i as f32 * 0.37;
            features.extend_from_slice(&[t.sin() * 3.0, t.cos() * 2.0, (t * 0.5).sin()]);
            labels.push((i % 3) as i64);
        }
        let sample = RawSample::new(features, 3, labels).unwrap();

        let tree = GraphBuilder::new(
            GraphBuilderConfig::default().with_algorithm(NeighborAlgorithm::KdTree),
        )
        .unwrap();
        let brute = GraphBuilder::new(
            GraphBuilderConfig::default().with_algorithm(NeighborAlgorithm::BruteForce),
        )
        .unwrap();

        assert_eq!(tree.build(&sample).unwrap(), brute.build(&sample).unwrap());
    }
}
