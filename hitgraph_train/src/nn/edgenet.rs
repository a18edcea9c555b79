//! Iterative edge network with edge categories.

use burn::module::{Module, Param};
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::{log_softmax, tanh};

use super::mlp::{Mlp, MlpConfig};
use super::{GraphModel, Target};
use crate::config::{EdgeNetConfig, ModelKind};
use crate::data::GraphBatch;
use crate::error::{HitTrainError, Result};

/// Edge classifier with `n_iters` rounds of summed neighbour messages.
///
/// Inputs are scaled by a trainable `norm` vector and projected to the hidden
/// width; every round rebuilds node states from messages
/// `node_network([x_target, x_source - x_target])` summed at the target, and
/// the edge network scores `[x_source, x_target]` pairs.
#[derive(Module, Debug)]
pub struct EdgeNet<B: Backend> {
    norm: Param<Tensor<B, 1>>,
    input_network: Linear<B>,
    node_network: Mlp<B>,
    edge_network: Mlp<B>,
    input_dim: usize,
    hidden_dim: usize,
    output_dim: usize,
    n_iters: usize,
}

impl<B: Backend> EdgeNet<B> {
    /// Create an edge network.
    ///
    /// # Errors
    /// `InvalidConfig` when the norm vector length differs from the input dimension.
    pub fn new(config: &EdgeNetConfig, device: &B::Device) -> Result<Self> {
        let norm = config
            .norm
            .clone()
            .unwrap_or_else(|| vec![1.0; config.input_dim]);
        if norm.len() != config.input_dim {
            return Err(HitTrainError::invalid_config(format!(
                "norm has {} entries for {} input features",
                norm.len(),
                config.input_dim
            )));
        }

        let state_dim = config.hidden_dim + config.input_dim;
        let node_network = MlpConfig::new(2 * state_dim, config.hidden_dim)
            .with_hidden_dims(vec![config.hidden_dim, config.hidden_dim])
            .with_final_activation(true)
            .init(device);
        let edge_network = MlpConfig::new(2 * state_dim, config.output_dim)
            .with_hidden_dims(vec![2 * config.hidden_dim])
            .init(device);

        Ok(Self {
            norm: Param::from_tensor(Tensor::from_data(
                TensorData::new(norm, [config.input_dim]),
                device,
            )),
            input_network: LinearConfig::new(config.input_dim, config.hidden_dim).init(device),
            node_network,
            edge_network,
            input_dim: config.input_dim,
            hidden_dim: config.hidden_dim,
            output_dim: config.output_dim,
            n_iters: config.n_iters,
        })
    }

    /// Edge log-probabilities for one (possibly merged) graph.
    ///
    /// Input shapes: x `[nodes, input_dim]`, sources/targets `[edges]`.
    /// Output shape: `[edges, output_dim]`.
    pub fn forward_graph(
        &self,
        x: Tensor<B, 2>,
        sources: Tensor<B, 1, Int>,
        targets: Tensor<B, 1, Int>,
    ) -> Tensor<B, 2> {
        let [num_nodes, num_features] = x.dims();
        let device = x.device();

        let scaled = x * self.norm.val().reshape([1, num_features]);
        let hidden = tanh(self.input_network.forward(scaled.clone()));
        let mut state = Tensor::cat(vec![hidden, scaled.clone()], 1);

        for _ in 0..self.n_iters {
            let at_target = state.clone().select(0, targets.clone());
            let at_source = state.select(0, sources.clone());
            let messages = self.node_network.forward(Tensor::cat(
                vec![at_target.clone(), at_source - at_target],
                1,
            ));

            let hidden = Tensor::zeros([num_nodes, self.hidden_dim], &device).select_assign(
                0,
                targets.clone(),
                messages,
            );
            state = Tensor::cat(vec![hidden, scaled.clone()], 1);
        }

        let pairs = Tensor::cat(
            vec![state.clone().select(0, sources), state.select(0, targets)],
            1,
        );
        log_softmax(self.edge_network.forward(pairs), 1)
    }

    /// Current per-feature scaling.
    pub fn norm(&self) -> Tensor<B, 1> {
        self.norm.val()
    }
}

impl<B: Backend> GraphModel<B> for EdgeNet<B> {
    fn forward(&self, batch: &GraphBatch<B>) -> Tensor<B, 2> {
        self.forward_graph(
            batch.x.clone(),
            batch.edge_sources.clone(),
            batch.edge_targets.clone(),
        )
    }

    fn target(&self) -> Target {
        Target::Edges
    }

    fn kind(&self) -> ModelKind {
        ModelKind::EdgeNetWithCategories
    }

    fn describe(&self) -> String {
        format!(
            "EdgeNet(input_dim={}, hidden_dim={}, n_iters={}, output_dim={}, \
             node_network=[{}->{}->{}->{}], edge_network=[{}->{}->{}])",
            self.input_dim,
            self.hidden_dim,
            self.n_iters,
            self.output_dim,
            2 * (self.hidden_dim + self.input_dim),
            self.hidden_dim,
            self.hidden_dim,
            self.hidden_dim,
            2 * (self.hidden_dim + self.input_dim),
            2 * self.hidden_dim,
            self.output_dim,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn edges(list: &[(i64, i64)]) -> (Tensor<TestBackend, 1, Int>, Tensor<TestBackend, 1, Int>) {
        let device = Default::default();
        let sources: Vec<i64> = list.iter().map(|e| e.0).collect();
        let targets: Vec<i64> = list.iter().map(|e| e.1).collect();
        (
            Tensor::from_data(TensorData::new(sources, [list.len()]), &device),
            Tensor::from_data(TensorData::new(targets, [list.len()]), &device),
        )
    }

    #[test]
    fn test_output_shape_and_normalization() {
        let device = Default::default();
        let config = EdgeNetConfig::new(2, 4).with_hidden_dim(8).with_n_iters(2);
        let model = EdgeNet::<TestBackend>::new(&config, &device).unwrap();

        let x = Tensor::<TestBackend, 2>::from_floats(
            [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
            &device,
        );
        let (sources, targets) = edges(&[(0, 1), (1, 0), (2, 3), (3, 2), (1, 3)]);
        let output = model.forward_graph(x, sources, targets);
        assert_eq!(output.dims(), [5, 4]);

        let sums: Vec<f32> = output.exp().sum_dim(1).into_data().to_vec().unwrap();
        for sum in sums {
            assert!((sum - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_norm_length_checked() {
        let device = Default::default();
        let config = EdgeNetConfig::new(3, 4).with_norm(Some(vec![0.1, 0.1]));
        assert!(matches!(
            EdgeNet::<TestBackend>::new(&config, &device),
            Err(HitTrainError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_norm_initialized_from_config() {
        let device = Default::default();
        let config = EdgeNetConfig::new(2, 4).with_norm(Some(vec![0.1, 0.5]));
        let model = EdgeNet::<TestBackend>::new(&config, &device).unwrap();
        let norm: Vec<f32> = model.norm().into_data().to_vec().unwrap();
        assert_eq!(norm, vec![0.1, 0.5]);
    }
}
