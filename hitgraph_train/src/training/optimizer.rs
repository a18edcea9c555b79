//! Optimizer construction.

use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, AdamWConfig, GradientsParams, Optimizer, SgdConfig};
use burn::tensor::backend::AutodiffBackend;

use crate::config::OptimizerKind;

/// Decoupled weight decay used by [`OptimizerKind::AdamW`].
pub const ADAMW_WEIGHT_DECAY: f32 = 0.01;

/// Object-safe view of a burn optimizer for a fixed module type.
pub trait ModelOptimizer<M, B>: Send
where
    M: AutodiffModule<B>,
    B: AutodiffBackend,
{
    /// Apply `grads` to `module` with learning rate `lr`.
    fn step(&mut self, lr: f64, module: M, grads: GradientsParams) -> M;
}

impl<M, B, O> ModelOptimizer<M, B> for O
where
    M: AutodiffModule<B>,
    B: AutodiffBackend,
    O: Optimizer<M, B>,
{
    fn step(&mut self, lr: f64, module: M, grads: GradientsParams) -> M {
        Optimizer::step(self, lr, module, grads)
    }
}

/// Build the optimizer for `kind`.
pub fn build_optimizer<M, B>(kind: OptimizerKind) -> Box<dyn ModelOptimizer<M, B>>
where
    M: AutodiffModule<B> + 'static,
    B: AutodiffBackend,
{
    match kind {
        OptimizerKind::Adam => Box::new(AdamConfig::new().init::<B, M>()),
        OptimizerKind::AdamW => Box::new(
            AdamWConfig::new()
                .with_weight_decay(ADAMW_WEIGHT_DECAY)
                .init::<B, M>(),
        ),
        OptimizerKind::Sgd => Box::new(SgdConfig::new().init::<B, M>()),
    }
}
