//! Classification losses over per-row log-probabilities.

use burn::prelude::*;
use burn::tensor::activation::log_softmax;

use crate::config::LossKind;
use crate::error::{HitTrainError, Result};

/// Class-weighted negative log-likelihood.
///
/// `sum_i w[t_i] * -log_probs[i, t_i] / sum_i w[t_i]`
///
/// Shapes: log_probs `[rows, classes]`, targets `[rows]`, weights `[classes]`.
pub fn weighted_nll<B: Backend>(
    log_probs: Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
    weights: Tensor<B, 1>,
) -> Tensor<B, 1> {
    let [rows, _] = log_probs.dims();
    let picked = log_probs
        .gather(1, targets.clone().reshape([rows, 1]))
        .reshape([rows]);
    let row_weights = weights.select(0, targets);

    (picked * row_weights.clone()).sum().neg() / row_weights.sum()
}

/// Loss function with its per-class weights.
#[derive(Debug, Clone)]
pub struct GraphLoss {
    kind: LossKind,
    weights: Vec<f32>,
}

impl GraphLoss {
    /// Create a loss with explicit class weights.
    pub fn new(kind: LossKind, weights: Vec<f32>) -> Self {
        Self { kind, weights }
    }

    /// Create a loss with unit weights for `num_classes` classes.
    pub fn uniform(kind: LossKind, num_classes: usize) -> Self {
        Self::new(kind, vec![1.0; num_classes])
    }

    /// Number of classes.
    pub fn num_classes(&self) -> usize {
        self.weights.len()
    }

    /// Loss kind.
    pub fn kind(&self) -> LossKind {
        self.kind
    }

    /// Check that every label is a valid class index.
    pub fn check_labels(&self, labels: &[i64]) -> Result<()> {
        let classes = self.num_classes() as i64;
        match labels.iter().find(|&&l| l < 0 || l >= classes) {
            Some(label) => Err(HitTrainError::training(format!(
                "label {} outside [0, {}); raise forced_categories",
                label, classes
            ))),
            None => Ok(()),
        }
    }

    /// Scalar loss for model `output` and `targets`.
    ///
    /// `NllLoss` expects log-probabilities; `CrossEntropy` applies a
    /// log-softmax first.
    pub fn forward<B: Backend>(&self, output: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
        let device = output.device();
        let weights = Tensor::from_data(
            TensorData::new(self.weights.clone(), [self.weights.len()]),
            &device,
        );
        let log_probs = match self.kind {
            LossKind::NllLoss => output,
            LossKind::CrossEntropy => log_softmax(output, 1),
        };
        weighted_nll(log_probs, targets, weights)
    }
}
