//! Fully connected building blocks with ELU activations.

use burn::config::Config;
use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;

/// Exponential linear unit with `alpha = 1`.
pub fn elu<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, D> {
    x.clone().clamp_min(0.0) + (x.clamp_max(0.0).exp() - 1.0)
}

/// Configuration for an MLP.
#[derive(Config, Debug)]
pub struct MlpConfig {
    /// Input dimension.
    pub input_dim: usize,
    /// Output dimension.
    pub output_dim: usize,
    /// Hidden layer dimensions.
    #[config(default = "vec![]")]
    pub hidden_dims: Vec<usize>,
    /// Whether to apply the activation after the output layer.
    #[config(default = false)]
    pub final_activation: bool,
}

impl MlpConfig {
    /// Initialize the MLP.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Mlp<B> {
        let mut layers = Vec::with_capacity(self.hidden_dims.len());
        let mut in_dim = self.input_dim;

        for &out_dim in &self.hidden_dims {
            layers.push(LinearConfig::new(in_dim, out_dim).init(device));
            in_dim = out_dim;
        }

        Mlp {
            layers,
            output: LinearConfig::new(in_dim, self.output_dim).init(device),
            final_activation: self.final_activation,
        }
    }
}

/// Multi-layer perceptron: `Linear, ELU` per hidden layer, then the output layer.
#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    layers: Vec<Linear<B>>,
    output: Linear<B>,
    final_activation: bool,
}

impl<B: Backend> Mlp<B> {
    /// Forward pass.
    ///
    /// Input shape: [batch, input_dim]
    /// Output shape: [batch, output_dim]
    pub fn forward(&self, mut x: Tensor<B, 2>) -> Tensor<B, 2> {
        for layer in &self.layers {
            x = elu(layer.forward(x));
        }

        x = self.output.forward(x);

        if self.final_activation {
            x = elu(x);
        }
        x
    }

    /// Output dimension.
    pub fn output_dim(&self) -> usize {
        self.output.weight.val().dims()[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_mlp_forward() {
        let device = Default::default();
        let mlp = MlpConfig::new(3, 2)
            .with_hidden_dims(vec![8, 8])
            .init::<TestBackend>(&device);

        let output = mlp.forward(Tensor::zeros([5, 3], &device));
        assert_eq!(output.dims(), [5, 2]);
        assert_eq!(mlp.output_dim(), 2);
    }

    #[test]
    fn test_elu_values() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 1>::from_floats([-1.0, 0.0, 2.0], &device);
        let y: Vec<f32> = elu(x).into_data().to_vec().unwrap();

        assert!((y[0] - ((-1.0f32).exp() - 1.0)).abs() < 1e-6);
        assert!(y[1].abs() < 1e-6);
        assert!((y[2] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_final_activation_bounds_output() {
        let device = Default::default();
        let mlp = MlpConfig::new(4, 6)
            .with_final_activation(true)
            .init::<TestBackend>(&device);

        let input = Tensor::<TestBackend, 2>::random(
            [16, 4],
            burn::tensor::Distribution::Uniform(-5.0, 5.0),
            &device,
        );
        let output: Vec<f32> = mlp.forward(input).into_data().to_vec().unwrap();
        assert!(output.iter().all(|&v| v >= -1.0));
    }
}
