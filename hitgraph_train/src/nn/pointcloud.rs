//! Point-cloud classifier.

use burn::module::Module;
use burn::prelude::*;
use burn::tensor::activation::log_softmax;

use super::mlp::{Mlp, MlpConfig};
use super::{GraphModel, Target};
use crate::config::{ModelKind, PointCloudNetConfig};
use crate::data::GraphBatch;

/// Per-point classifier.
///
/// A shared point network embeds every point; the per-graph max over those
/// embeddings is appended back onto each point before the classification head.
/// Edges are ignored.
#[derive(Module, Debug)]
pub struct PointCloudNet<B: Backend> {
    point_network: Mlp<B>,
    head: Mlp<B>,
    input_dim: usize,
    hidden_dim: usize,
    num_classes: usize,
}

impl<B: Backend> PointCloudNet<B> {
    /// Create a point-cloud classifier.
    pub fn new(config: &PointCloudNetConfig, device: &B::Device) -> Self {
        let point_network = MlpConfig::new(config.input_dim, config.hidden_dim)
            .with_hidden_dims(vec![config.hidden_dim])
            .with_final_activation(true)
            .init(device);
        let head = MlpConfig::new(2 * config.hidden_dim, config.num_classes)
            .with_hidden_dims(vec![config.hidden_dim])
            .init(device);

        Self {
            point_network,
            head,
            input_dim: config.input_dim,
            hidden_dim: config.hidden_dim,
            num_classes: config.num_classes,
        }
    }

    /// Node log-probabilities.
    ///
    /// `graph_ptr` holds node offsets per graph and `node_graph` the graph
    /// index of every node. Output shape: `[nodes, num_classes]`.
    pub fn forward_points(
        &self,
        x: Tensor<B, 2>,
        graph_ptr: &[usize],
        node_graph: Tensor<B, 1, Int>,
    ) -> Tensor<B, 2> {
        let features = self.point_network.forward(x);

        // pool on the last axis: autodiff max backward scatters along it
        let pooled: Vec<Tensor<B, 2>> = graph_ptr
            .windows(2)
            .map(|w| {
                features
                    .clone()
                    .slice([w[0]..w[1], 0..self.hidden_dim])
                    .transpose()
                    .max_dim(1)
                    .reshape([1, self.hidden_dim])
            })
            .collect();
        let global = Tensor::cat(pooled, 0).select(0, node_graph);

        log_softmax(self.head.forward(Tensor::cat(vec![features, global], 1)), 1)
    }
}

impl<B: Backend> GraphModel<B> for PointCloudNet<B> {
    fn forward(&self, batch: &GraphBatch<B>) -> Tensor<B, 2> {
        self.forward_points(batch.x.clone(), &batch.graph_ptr, batch.node_graph.clone())
    }

    fn target(&self) -> Target {
        Target::Nodes
    }

    fn kind(&self) -> ModelKind {
        ModelKind::PointCloudNet
    }

    fn describe(&self) -> String {
        format!(
            "PointCloudNet(input_dim={}, point_network=[{}->{}->{}], pool=max, head=[{}->{}->{}])",
            self.input_dim,
            self.input_dim,
            self.hidden_dim,
            self.hidden_dim,
            2 * self.hidden_dim,
            self.hidden_dim,
            self.num_classes,
        )
    }
}
