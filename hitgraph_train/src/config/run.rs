//! Run configuration.

use std::path::{Path, PathBuf};

use burn::config::Config;
use serde::{Deserialize, Serialize};

use hitgraph_io::SplitPolicy;

use super::model::ModelKind;
use crate::error::HitTrainError;

/// Optimizer family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OptimizerKind {
    /// Adam without weight decay.
    Adam,
    /// Adam with decoupled weight decay (0.01).
    #[default]
    AdamW,
    /// Plain stochastic gradient descent.
    Sgd,
}

/// Training loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LossKind {
    /// Weighted negative log-likelihood on log-probabilities.
    #[default]
    NllLoss,
    /// Log-softmax followed by weighted negative log-likelihood.
    CrossEntropy,
}

/// Reduce-on-plateau learning rate schedule.
#[derive(Config, Debug)]
pub struct PlateauConfig {
    /// Multiplier applied to the rate on a plateau.
    #[config(default = 0.2)]
    pub factor: f64,

    /// Epochs without improvement before reducing.
    #[config(default = 5)]
    pub patience: usize,

    /// Relative improvement needed to reset patience.
    #[config(default = 0.05)]
    pub threshold: f64,

    /// Lower bound on the rate.
    #[config(default = 5e-7)]
    pub min_lr: f64,

    /// Epochs to wait after a reduction before counting again.
    #[config(default = 0)]
    pub cooldown: usize,
}

impl Default for PlateauConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Declarative description of one training session.
#[derive(Config, Debug)]
pub struct RunConfig {
    /// Dataset root holding `raw/` and `processed/`.
    pub dataset: PathBuf,

    /// Debug mode: verbose logging, and the debug presets below.
    #[config(default = false)]
    pub debug: bool,

    /// Model family.
    #[config(default = "ModelKind::EdgeNetWithCategories")]
    pub model: ModelKind,

    /// Hidden width.
    #[config(default = 64)]
    pub hidden_dim: usize,

    /// Message-passing iterations (edge network only).
    #[config(default = 6)]
    pub n_iters: usize,

    /// Initial per-feature input scaling (edge network only).
    #[config(default = "Some(vec![0.1, 0.1])")]
    pub norm: Option<Vec<f32>>,

    /// Initial learning rate.
    #[config(default = 1e-3)]
    pub learning_rate: f64,

    /// Optimizer family.
    #[config(default = "OptimizerKind::AdamW")]
    pub optimizer: OptimizerKind,

    /// Loss function.
    #[config(default = "LossKind::NllLoss")]
    pub loss: LossKind,

    /// Graphs per training batch.
    #[config(default = 1)]
    pub train_batch_size: usize,

    /// Graphs per validation batch.
    #[config(default = 1)]
    pub valid_batch_size: usize,

    /// Number of training epochs.
    #[config(default = 30)]
    pub epochs: usize,

    /// Neighbours per point in the k-NN graph.
    #[config(default = 4)]
    pub k: usize,

    /// Validation fraction for the proportional split.
    #[config(default = 0.2)]
    pub valid_fraction: f64,

    /// Explicit `[train_start, train_end, valid_end]` boundaries.
    pub split_boundaries: Option<[usize; 3]>,

    /// Discard processed records before building the dataset.
    #[config(default = false)]
    pub force_reprocess: bool,

    /// Keep the k-NN edges directed. When false, reverse edges are added at load time.
    #[config(default = false)]
    pub directed: bool,

    /// Fixed number of classes. Derived from the first record when unset.
    #[config(default = "Some(4)")]
    pub forced_categories: Option<usize>,

    /// Per-class loss weights. All ones when unset.
    pub category_weights: Option<Vec<f32>>,

    /// Shuffle the training loader with `seed + epoch`. No shuffling when unset.
    pub shuffle_seed: Option<u64>,

    /// Seed for parameter initialization.
    #[config(default = 42)]
    pub seed: u64,

    /// Number of validation graphs used by `evaluate`.
    #[config(default = 10)]
    pub eval_samples: usize,

    /// Directory for checkpoints and summaries.
    #[config(default = "PathBuf::from(\"output\")")]
    pub output_dir: PathBuf,

    /// Checkpoint to restore before training (path without extension).
    pub load_checkpoint: Option<PathBuf>,

    /// User tag embedded in checkpoint names.
    #[config(default = "String::from(\"hitgraph\")")]
    pub tag: String,

    /// Learning rate schedule.
    #[config(default = "PlateauConfig::new()")]
    pub plateau: PlateauConfig,
}

impl RunConfig {
    /// Small-dataset preset: 3 epochs, 7/3 split, forced reprocessing.
    pub fn debug(dataset: impl AsRef<Path>) -> Self {
        Self::new(dataset.as_ref().to_path_buf()).into_debug()
    }

    /// Apply the debug preset settings on top of this configuration.
    pub fn into_debug(self) -> Self {
        self.with_debug(true)
            .with_epochs(3)
            .with_split_boundaries(Some([0, 7, 10]))
            .with_force_reprocess(true)
    }

    /// Full-dataset preset. The user tag is taken from `$USER` when set.
    pub fn production(dataset: impl AsRef<Path>) -> Self {
        let config = Self::new(dataset.as_ref().to_path_buf());
        match std::env::var("USER") {
            Ok(user) if !user.is_empty() => config.with_tag(user),
            _ => config,
        }
    }

    /// Partition rule for this run.
    pub fn split_policy(&self) -> SplitPolicy {
        match self.split_boundaries {
            Some(boundaries) => SplitPolicy::Fixed { boundaries },
            None => SplitPolicy::Proportional {
                valid_fraction: self.valid_fraction,
            },
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.learning_rate <= 0.0 {
            return Err(HitTrainError::invalid_config("learning_rate must be positive"));
        }
        if self.train_batch_size == 0 || self.valid_batch_size == 0 {
            return Err(HitTrainError::invalid_config("batch sizes must be positive"));
        }
        if self.k == 0 {
            return Err(HitTrainError::invalid_config("k must be positive"));
        }
        if self.hidden_dim == 0 {
            return Err(HitTrainError::invalid_config("hidden_dim must be positive"));
        }
        if !(0.0..1.0).contains(&self.valid_fraction) {
            return Err(HitTrainError::invalid_config(format!(
                "valid_fraction must be in [0, 1), got {}",
                self.valid_fraction
            )));
        }
        if self.forced_categories == Some(0) {
            return Err(HitTrainError::invalid_config(
                "forced_categories must be positive",
            ));
        }
        if let (Some(weights), Some(classes)) = (&self.category_weights, self.forced_categories) {
            if weights.len() != classes {
                return Err(HitTrainError::invalid_config(format!(
                    "{} category weights for {} categories",
                    weights.len(),
                    classes
                )));
            }
        }
        if self.plateau.factor <= 0.0 || self.plateau.factor >= 1.0 {
            return Err(HitTrainError::invalid_config(
                "plateau factor must be in (0, 1)",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_debug_applied_to_loaded_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.json");
        RunConfig::new(PathBuf::from("data"))
            .with_epochs(50)
            .with_hidden_dim(16)
            .save(&path)
            .unwrap();

        let config = RunConfig::load(&path).unwrap().into_debug();
        assert!(config.debug);
        assert!(config.force_reprocess);
        assert_eq!(config.epochs, 3);
        assert_eq!(config.split_boundaries, Some([0, 7, 10]));
        assert_eq!(config.hidden_dim, 16);
    }

    #[test]
    fn test_defaults() {
        let config = RunConfig::new(PathBuf::from("data"));
        assert_eq!(config.model, ModelKind::EdgeNetWithCategories);
        assert_eq!(config.hidden_dim, 64);
        assert_eq!(config.n_iters, 6);
        assert_eq!(config.optimizer, OptimizerKind::AdamW);
        assert_eq!(config.loss, LossKind::NllLoss);
        assert_eq!(config.epochs, 30);
        assert_eq!(config.forced_categories, Some(4));
        assert_eq!(config.norm, Some(vec![0.1, 0.1]));
        assert_eq!(config.eval_samples, 10);
        assert!(!config.directed);
        assert!(config.shuffle_seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_preset() {
        let config = RunConfig::debug("data/small");
        assert!(config.debug);
        assert!(config.force_reprocess);
        assert_eq!(config.epochs, 3);
        assert_eq!(
            config.split_policy(),
            SplitPolicy::Fixed {
                boundaries: [0, 7, 10]
            }
        );
    }

    #[test]
    fn test_production_split_is_proportional() {
        let config = RunConfig::production("data/full");
        assert!(!config.force_reprocess);
        assert_eq!(
            config.split_policy(),
            SplitPolicy::Proportional {
                valid_fraction: 0.2
            }
        );
    }

    #[test]
    fn test_validate_rejects() {
        let base = RunConfig::new(PathBuf::from("data"));
        assert!(base.clone().with_learning_rate(0.0).validate().is_err());
        assert!(base.clone().with_train_batch_size(0).validate().is_err());
        assert!(base.clone().with_k(0).validate().is_err());
        assert!(base.clone().with_valid_fraction(1.0).validate().is_err());
        assert!(base
            .clone()
            .with_category_weights(Some(vec![1.0; 3]))
            .validate()
            .is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.json");

        let config = RunConfig::debug("data/small")
            .with_optimizer(OptimizerKind::Sgd)
            .with_shuffle_seed(Some(7));
        config.save(&path).unwrap();

        let loaded = RunConfig::load(&path).unwrap();
        assert_eq!(loaded.optimizer, OptimizerKind::Sgd);
        assert_eq!(loaded.shuffle_seed, Some(7));
        assert_eq!(loaded.split_boundaries, Some([0, 7, 10]));
        assert_eq!(loaded.dataset, PathBuf::from("data/small"));
    }
}
