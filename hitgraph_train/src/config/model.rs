//! Model family configuration.

use burn::config::Config;
use serde::{Deserialize, Serialize};

/// Model family selected by a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelKind {
    /// Per-point classifier with a max-pooled global feature.
    PointCloudNet,
    /// Iterative edge network classifying edges into categories.
    #[default]
    EdgeNetWithCategories,
}

impl ModelKind {
    /// Name used in logs and checkpoint file names.
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::PointCloudNet => "PointCloudNet",
            ModelKind::EdgeNetWithCategories => "EdgeNetWithCategories",
        }
    }

    /// Resolve by exact name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "PointCloudNet" => Some(ModelKind::PointCloudNet),
            "EdgeNetWithCategories" => Some(ModelKind::EdgeNetWithCategories),
            _ => None,
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration for the iterative edge network.
#[derive(Config, Debug)]
pub struct EdgeNetConfig {
    /// Node feature dimension.
    pub input_dim: usize,

    /// Number of edge categories.
    pub output_dim: usize,

    /// Hidden width of the node and edge networks.
    #[config(default = 64)]
    pub hidden_dim: usize,

    /// Number of message-passing iterations.
    #[config(default = 6)]
    pub n_iters: usize,

    /// Initial per-feature input scaling. Ones when unset.
    pub norm: Option<Vec<f32>>,
}

/// Configuration for the point-cloud classifier.
#[derive(Config, Debug)]
pub struct PointCloudNetConfig {
    /// Input channels per point.
    pub input_dim: usize,

    /// Number of node classes.
    pub num_classes: usize,

    /// Hidden width of the per-point network.
    #[config(default = 64)]
    pub hidden_dim: usize,
}

/// Hyperparameters of one model family, resolved from a [`ModelKind`].
#[derive(Debug, Clone)]
pub enum ModelSpec {
    /// Point-cloud classifier.
    PointCloudNet(PointCloudNetConfig),
    /// Iterative edge network.
    EdgeNet(EdgeNetConfig),
}

impl ModelSpec {
    /// Resolve hyperparameters for `kind`.
    ///
    /// The point-cloud classifier only takes input channels and class count;
    /// the edge network also takes the hidden width, iteration count and
    /// normalization vector.
    pub fn resolve(
        kind: ModelKind,
        num_features: usize,
        num_classes: usize,
        hidden_dim: usize,
        n_iters: usize,
        norm: Option<Vec<f32>>,
    ) -> Self {
        match kind {
            ModelKind::PointCloudNet => {
                ModelSpec::PointCloudNet(PointCloudNetConfig::new(num_features, num_classes))
            }
            ModelKind::EdgeNetWithCategories => ModelSpec::EdgeNet(
                EdgeNetConfig::new(num_features, num_classes)
                    .with_hidden_dim(hidden_dim)
                    .with_n_iters(n_iters)
                    .with_norm(norm),
            ),
        }
    }

    /// Model family of this spec.
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelSpec::PointCloudNet(_) => ModelKind::PointCloudNet,
            ModelSpec::EdgeNet(_) => ModelKind::EdgeNetWithCategories,
        }
    }
}
