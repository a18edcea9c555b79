//! Core data types for hit samples and their k-NN graphs.
//!
//! Feature matrices are stored row-major in flat `Vec<f32>` buffers
//! (`num_points * num_features`), labels as `i64` to match the tensor
//! integer type used downstream.

use std::collections::HashSet;

use crate::error::{HitGraphError, Result};

/// Label assigned to edges whose endpoints belong to different classes.
pub const UNMATCHED_LABEL: i64 = 0;

/// One raw detector sample: a labeled point cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    /// Row-major point features, `num_points * num_features` values.
    features: Vec<f32>,
    /// Number of features per point.
    num_features: usize,
    /// Ground-truth label per point.
    labels: Vec<i64>,
}

impl RawSample {
    /// Create a sample from row-major features (points × features).
    pub fn new(features: Vec<f32>, num_features: usize, labels: Vec<i64>) -> Result<Self> {
        if num_features == 0 {
            return Err(HitGraphError::EmptyFeatures);
        }
        if features.len() % num_features != 0 {
            return Err(HitGraphError::RaggedFeatures {
                len: features.len(),
                num_features,
            });
        }
        let num_points = features.len() / num_features;
        if labels.len() != num_points {
            return Err(HitGraphError::LabelCountMismatch {
                points: num_points,
                labels: labels.len(),
            });
        }
        if let Some(pos) = features.iter().position(|v| !v.is_finite()) {
            return Err(HitGraphError::NonFiniteFeature {
                point: pos / num_features,
                feature: pos % num_features,
            });
        }

        Ok(Self {
            features,
            num_features,
            labels,
        })
    }

    /// Create a sample from column-major storage (features × points), the
    /// on-disk layout of raw sample files.
    pub fn from_columns(
        columns: &[f32],
        num_features: usize,
        num_points: usize,
        labels: Vec<i64>,
    ) -> Result<Self> {
        if num_features == 0 {
            return Err(HitGraphError::EmptyFeatures);
        }
        if columns.len() != num_features * num_points {
            return Err(HitGraphError::RaggedFeatures {
                len: columns.len(),
                num_features,
            });
        }
        if labels.len() != num_points {
            return Err(HitGraphError::LabelCountMismatch {
                points: num_points,
                labels: labels.len(),
            });
        }

        let mut features = vec![0.0f32; columns.len()];
        for f in 0..num_features {
            for p in 0..num_points {
                features[p * num_features + f] = columns[f * num_points + p];
            }
        }

        Self::new(features, num_features, labels)
    }

    /// Transpose the features back to column-major order (features × points).
    pub fn to_columns(&self) -> Vec<f32> {
        let n = self.num_points();
        let mut columns = vec![0.0f32; self.features.len()];
        for p in 0..n {
            for f in 0..self.num_features {
                columns[f * n + p] = self.features[p * self.num_features + f];
            }
        }
        columns
    }

    /// Number of points.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.labels.len()
    }

    /// Number of features per point.
    #[inline]
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Feature vector of a single point.
    #[inline]
    pub fn point(&self, index: usize) -> &[f32] {
        let start = index * self.num_features;
        &self.features[start..start + self.num_features]
    }

    /// Row-major feature buffer.
    #[inline]
    pub fn features(&self) -> &[f32] {
        &self.features
    }

    /// Per-point labels.
    #[inline]
    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    /// Check if the sample has no points.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A labeled k-NN graph derived from one [`RawSample`].
///
/// Edges are directed `(source, target)` pairs stored as two parallel vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRecord {
    /// Row-major node features, `num_nodes * num_features` values.
    pub x: Vec<f32>,
    /// Number of features per node.
    pub num_features: usize,
    /// Edge source node indices.
    pub edge_sources: Vec<usize>,
    /// Edge target node indices.
    pub edge_targets: Vec<usize>,
    /// Per-edge class label (`UNMATCHED_LABEL` across classes).
    pub edge_labels: Vec<i64>,
    /// Per-node ground-truth label.
    pub node_labels: Vec<i64>,
}

impl GraphRecord {
    /// Assemble a record, checking that every buffer is consistent.
    pub fn new(
        x: Vec<f32>,
        num_features: usize,
        edge_sources: Vec<usize>,
        edge_targets: Vec<usize>,
        edge_labels: Vec<i64>,
        node_labels: Vec<i64>,
    ) -> Result<Self> {
        let record = Self {
            x,
            num_features,
            edge_sources,
            edge_targets,
            edge_labels,
            node_labels,
        };
        record.validate()?;
        Ok(record)
    }

    /// Validate buffer lengths and edge bounds.
    pub fn validate(&self) -> Result<()> {
        if self.num_features == 0 {
            return Err(HitGraphError::EmptyFeatures);
        }
        if self.x.len() != self.node_labels.len() * self.num_features {
            return Err(HitGraphError::LabelCountMismatch {
                points: self.x.len() / self.num_features,
                labels: self.node_labels.len(),
            });
        }
        let num_edges = self.edge_sources.len();
        if self.edge_targets.len() != num_edges || self.edge_labels.len() != num_edges {
            return Err(HitGraphError::LabelCountMismatch {
                points: num_edges,
                labels: self.edge_labels.len().min(self.edge_targets.len()),
            });
        }
        let num_nodes = self.num_nodes();
        for &index in self.edge_sources.iter().chain(self.edge_targets.iter()) {
            if index >= num_nodes {
                return Err(HitGraphError::EdgeOutOfBounds { index, num_nodes });
            }
        }
        Ok(())
    }

    /// Number of nodes.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.node_labels.len()
    }

    /// Number of directed edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edge_sources.len()
    }

    /// Iterate over `(source, target)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edge_sources
            .iter()
            .copied()
            .zip(self.edge_targets.iter().copied())
    }

    /// Feature vector of a single node.
    #[inline]
    pub fn node_features(&self, index: usize) -> &[f32] {
        let start = index * self.num_features;
        &self.x[start..start + self.num_features]
    }

    /// Largest label present on nodes or edges, if any.
    pub fn max_label(&self) -> Option<i64> {
        self.node_labels
            .iter()
            .chain(self.edge_labels.iter())
            .copied()
            .max()
    }

    /// Check whether every edge has its reverse.
    pub fn is_undirected(&self) -> bool {
        let set: HashSet<(usize, usize)> = self.edges().collect();
        self.edges().all(|(s, t)| set.contains(&(t, s)))
    }

    /// Return a copy where every edge missing its reverse gets one appended.
    ///
    /// Reverse edges carry the label of their forward edge; the matched-pair
    /// rule is symmetric so this keeps the label invariant.
    pub fn to_undirected(&self) -> Self {
        let set: HashSet<(usize, usize)> = self.edges().collect();
        let mut out = self.clone();

        for (i, (s, t)) in self.edges().enumerate() {
            if !set.contains(&(t, s)) {
                out.edge_sources.push(t);
                out.edge_targets.push(s);
                out.edge_labels.push(self.edge_labels[i]);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_sample_validation() {
        let sample = RawSample::new(vec![0.0, 1.0, 2.0, 3.0], 2, vec![1, 2]).unwrap();
        assert_eq!(sample.num_points(), 2);
        assert_eq!(sample.point(1), &[2.0, 3.0]);

        let err = RawSample::new(vec![0.0, 1.0, 2.0], 2, vec![1]).unwrap_err();
        assert!(matches!(err, HitGraphError::RaggedFeatures { .. }));

        let err = RawSample::new(vec![0.0, 1.0], 2, vec![1, 2]).unwrap_err();
        assert_eq!(
            err,
            HitGraphError::LabelCountMismatch {
                points: 1,
                labels: 2
            }
        );

        let err = RawSample::new(vec![0.0, f32::NAN], 2, vec![1]).unwrap_err();
        assert_eq!(err, HitGraphError::NonFiniteFeature { point: 0, feature: 1 });
    }

    #[test]
    fn test_columns_transpose() {
        // 2 dims x 3 points
        let columns = vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0];
        let sample = RawSample::from_columns(&columns, 2, 3, vec![0, 0, 1]).unwrap();

        assert_eq!(sample.point(0), &[0.0, 10.0]);
        assert_eq!(sample.point(2), &[2.0, 12.0]);
        assert_eq!(sample.to_columns(), columns);
    }

    #[test]
    fn test_record_validation() {
        let err = GraphRecord::new(vec![0.0, 0.0], 1, vec![0], vec![2], vec![0], vec![1, 1])
            .unwrap_err();
        assert_eq!(err, HitGraphError::EdgeOutOfBounds { index: 2, num_nodes: 2 });
    }

    #[test]
    fn test_to_undirected() {
        let record = GraphRecord::new(
            vec![0.0, 1.0, 2.0],
            1,
            vec![0, 1, 2],
            vec![1, 0, 0],
            vec![3, 3, 0],
            vec![3, 3, 1],
        )
        .unwrap();
        assert!(!record.is_undirected());

        let undirected = record.to_undirected();
        assert!(undirected.is_undirected());
        assert_eq!(undirected.num_edges(), 4);
        assert_eq!(undirected.edge_sources[3], 0);
        assert_eq!(undirected.edge_targets[3], 2);
        assert_eq!(undirected.edge_labels[3], 0);
    }
}
