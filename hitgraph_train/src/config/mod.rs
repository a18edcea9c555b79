//! Configuration types for hitgraph_train.
//!
//! Burn-style configuration structs for runs, models and the learning-rate
//! scheduler. Every struct round-trips through JSON via [`burn::config::Config`].

mod model;
mod run;

pub use model::{EdgeNetConfig, ModelKind, ModelSpec, PointCloudNetConfig};
pub use run::{LossKind, OptimizerKind, PlateauConfig, RunConfig};
