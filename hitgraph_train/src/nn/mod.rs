//! Graph models.
//!
//! - [`EdgeNet`]: iterative edge network, classifies edges
//! - [`PointCloudNet`]: per-point classifier with a pooled global feature
//! - [`Mlp`]: shared fully connected block

mod edgenet;
pub mod mlp;
mod pointcloud;

use burn::prelude::*;

use crate::config::ModelKind;
use crate::data::GraphBatch;

pub use edgenet::EdgeNet;
pub use mlp::{elu, Mlp, MlpConfig};
pub use pointcloud::PointCloudNet;

/// What a model's output rows correspond to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// One row per edge, trained on edge labels.
    Edges,
    /// One row per node, trained on node labels.
    Nodes,
}

/// A model mapping a graph batch to per-row class log-probabilities.
pub trait GraphModel<B: Backend> {
    /// Log-probabilities of shape `[rows, num_classes]`.
    fn forward(&self, batch: &GraphBatch<B>) -> Tensor<B, 2>;

    /// Rows produced by [`forward`](Self::forward).
    fn target(&self) -> Target;

    /// Model family.
    fn kind(&self) -> ModelKind;

    /// One-line architecture description for logs.
    fn describe(&self) -> String;
}

impl Target {
    /// Labels this target is trained on.
    pub fn labels<'a, B: Backend>(&self, batch: &'a GraphBatch<B>) -> (&'a [i64], Tensor<B, 1, Int>) {
        match self {
            Target::Edges => (&batch.host_edge_labels, batch.edge_labels.clone()),
            Target::Nodes => (&batch.host_node_labels, batch.node_labels.clone()),
        }
    }
}
