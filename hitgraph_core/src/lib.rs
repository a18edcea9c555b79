//! # hitgraph_core
//!
//! Pure algorithms for turning labeled detector hit clouds into k-NN graphs.
//!
//! This crate has no dependencies. Storage lives in `hitgraph_io`, training in
//! `hitgraph_train`.
//!
//! ## Modules
//!
//! - [`types`]: Core data types (RawSample, GraphRecord)
//! - [`traits`]: Neighbour search abstraction (NeighborIndex)
//! - [`spatial`]: Exact k-NN indices (KdTree, BruteForce)
//! - [`graph`]: Graph construction with the matched-pair edge label rule
//! - [`hash`]: FNV-1a fingerprints
//! - [`error`]: Error types
//!
//! ## Usage
//!
//! ```
//! use hitgraph_core::prelude::*;
//!
//! let sample = RawSample::new(vec![0.0, 0.0, 0.1, 0.0, 5.0, 5.0], 2, vec![1, 1, 2]).unwrap();
//! let builder = GraphBuilder::new(GraphBuilderConfig::default().with_k(2)).unwrap();
//! let record = builder.build(&sample).unwrap();
//!
//! assert_eq!(record.num_nodes(), 3);
//! assert!(record.edges().all(|(s, t)| s != t));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod graph;
pub mod hash;
pub mod spatial;
pub mod traits;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{HitGraphError, Result};
    pub use crate::graph::{
        edge_label, GraphBuilder, GraphBuilderConfig, NeighborAlgorithm, DEFAULT_K,
    };
    pub use crate::hash::{fingerprint_hex, fnv1a_64, Fnv1a64, FINGERPRINT_LEN};
    pub use crate::spatial::{BruteForce, KdTree};
    pub use crate::traits::NeighborIndex;
    pub use crate::types::{GraphRecord, RawSample, UNMATCHED_LABEL};
}

pub use error::HitGraphError;
pub use graph::{edge_label, GraphBuilder, GraphBuilderConfig, NeighborAlgorithm, DEFAULT_K};
pub use hash::{fingerprint_hex, fnv1a_64, Fnv1a64, FINGERPRINT_LEN};
pub use spatial::{BruteForce, KdTree};
pub use traits::NeighborIndex;
pub use types::{GraphRecord, RawSample, UNMATCHED_LABEL};
