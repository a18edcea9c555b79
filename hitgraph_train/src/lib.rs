//! # hitgraph_train
//!
//! Graph neural network training over k-NN hit graphs, built on Burn.
//!
//! Raw detector samples are turned into labeled k-nearest-neighbour graphs by
//! `hitgraph_core`, cached on disk by `hitgraph_io`, and trained here with an
//! edge classifier or a point-cloud classifier.
//!
//! ## Features
//!
//! - **Session**: memoized dataset and trainer behind a small state machine
//! - **Models**: `EdgeNet` (iterative edge network) and `PointCloudNet`
//! - **Training**: weighted NLL / cross-entropy, Adam / AdamW / SGD,
//!   reduce-on-plateau schedule, per-epoch checkpoints and summaries
//! - **Tooling**: colored terminal logging and a `bash` command runner
//!
//! ## Quick Start
//!
//! ```no_run
//! use burn::backend::{Autodiff, NdArray};
//! use hitgraph_train::{RunConfig, Session};
//!
//! type MyBackend = Autodiff<NdArray>;
//!
//! let config = RunConfig::debug("data/small").with_output_dir("runs/debug".into());
//! let mut session = Session::<MyBackend>::new(config, Default::default())?;
//!
//! let summary = session.train()?;
//! println!("last epoch: {:?}", summary.last());
//!
//! let eval = session.evaluate()?;
//! println!("accuracy: {:?}", eval.accuracy);
//! session.finish();
//! # Ok::<(), hitgraph_train::HitTrainError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! hitgraph_core (graph construction)
//!     │
//!     ▼
//! hitgraph_io (raw/graph files, cache, splits)
//!     │
//!     ▼
//! hitgraph_train (models, trainer, session, CLI)
//! ```
//!
//! ## Feature Flags
//!
//! - `wgpu`: GPU backend for the `hitgraph` binary

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod command;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod nn;
pub mod session;
pub mod training;

pub use config::{LossKind, ModelKind, ModelSpec, OptimizerKind, PlateauConfig, RunConfig};
pub use error::{HitTrainError, Result};
pub use session::{DatasetSplits, Session, SessionState, SessionTrainer};
pub use training::{EvalSummary, GnnTrainer, TrainSummary};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::command::{BashRunner, CommandRunner};
    pub use crate::config::{
        EdgeNetConfig, LossKind, ModelKind, ModelSpec, OptimizerKind, PlateauConfig,
        PointCloudNetConfig, RunConfig,
    };
    pub use crate::data::{GraphBatch, GraphDataset, GraphLoader, GraphSubset};
    pub use crate::error::{HitTrainError, Result};
    pub use crate::logging::init_logger;
    pub use crate::nn::{EdgeNet, GraphModel, PointCloudNet, Target};
    pub use crate::session::{DatasetSplits, Memo, MemoState, Session, SessionState};
    pub use crate::training::{
        find_latest_checkpoint, load_checkpoint, save_checkpoint, CheckpointMetadata,
        EpochSummary, EvalSummary, GnnTrainer, GraphLoss, ReduceOnPlateau, TrainSummary,
    };

    pub use hitgraph_core::{GraphBuilder, GraphRecord, RawSample};
}
