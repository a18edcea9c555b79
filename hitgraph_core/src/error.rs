//! Error types for hitgraph_core operations.
//!
//! Provides a simple error enum with no external dependencies.

use core::fmt;

/// Errors that can occur while validating samples or building graphs.
#[derive(Debug, Clone, PartialEq)]
pub enum HitGraphError {
    /// The number of labels does not match the number of points.
    LabelCountMismatch {
        /// Number of points in the sample.
        points: usize,
        /// Number of labels in the sample.
        labels: usize,
    },
    /// The flat feature buffer is not a whole number of rows.
    RaggedFeatures {
        /// Length of the flat feature buffer.
        len: usize,
        /// Declared number of features per point.
        num_features: usize,
    },
    /// A sample declared zero features per point.
    EmptyFeatures,
    /// A feature value is NaN or infinite.
    NonFiniteFeature {
        /// Point index holding the value.
        point: usize,
        /// Feature index within the point.
        feature: usize,
    },
    /// The neighbour count must be at least one.
    ZeroNeighbors,
    /// An edge references a node outside the graph.
    EdgeOutOfBounds {
        /// The offending node index.
        index: usize,
        /// Number of nodes in the graph.
        num_nodes: usize,
    },
}

impl fmt::Display for HitGraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HitGraphError::LabelCountMismatch { points, labels } => {
                write!(f, "label count {} does not match point count {}", labels, points)
            }
            HitGraphError::RaggedFeatures { len, num_features } => {
                write!(
                    f,
                    "feature buffer of length {} is not divisible by {} features",
                    len, num_features
                )
            }
            HitGraphError::EmptyFeatures => write!(f, "samples must have at least one feature"),
            HitGraphError::NonFiniteFeature { point, feature } => {
                write!(f, "non-finite value at point {} feature {}", point, feature)
            }
            HitGraphError::ZeroNeighbors => write!(f, "k must be at least 1"),
            HitGraphError::EdgeOutOfBounds { index, num_nodes } => {
                write!(f, "edge endpoint {} out of bounds for {} nodes", index, num_nodes)
            }
        }
    }
}

impl std::error::Error for HitGraphError {}

/// Result type alias for hitgraph_core operations.
pub type Result<T> = core::result::Result<T, HitGraphError>;
