//! Training infrastructure for graph models.
//!
//! This module provides:
//! - `GnnTrainer`: epoch loop, validation, evaluation and per-epoch checkpoints
//! - Weighted NLL / cross-entropy losses
//! - Optimizer construction and a reduce-on-plateau schedule
//! - Checkpoint save/load and epoch summaries

mod checkpoint;
mod loss;
mod metrics;
mod optimizer;
mod scheduler;
mod trainer;

pub use checkpoint::{
    checkpoint_base, checkpoint_exists, checkpoint_name, find_latest_checkpoint, load_checkpoint,
    metadata_path, param_shapes, params_path, read_metadata, save_checkpoint, CheckpointMetadata,
    CHECKPOINT_DIR, CHECKPOINT_VERSION,
};
pub use loss::{weighted_nll, GraphLoss};
pub use metrics::{
    read_summaries, write_summaries, EpochSummary, EvalSummary, MetricsTracker, SampleMetrics,
    TrainSummary,
};
pub use optimizer::{build_optimizer, ModelOptimizer, ADAMW_WEIGHT_DECAY};
pub use scheduler::ReduceOnPlateau;
pub use trainer::{count_correct, GnnTrainer, TrainerOptions, SUMMARIES_FILE};
