//! Checkpoint save/load.
//!
//! A checkpoint is two files sharing a base path:
//! - `<base>.mpk`: model parameters (burn named MessagePack record)
//! - `<base>.json`: [`CheckpointMetadata`]
//!
//! Optimizer state is not stored; a resumed run starts a fresh optimizer at
//! the saved learning rate.

use std::fs;
use std::path::{Path, PathBuf};

use burn::module::{Module, ModuleVisitor, ParamId};
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use serde::{Deserialize, Serialize};

use crate::config::ModelKind;
use crate::error::{HitTrainError, Result};

/// Format version written into every sidecar.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Subdirectory of the output directory holding checkpoints.
pub const CHECKPOINT_DIR: &str = "checkpoints";

const PARAMS_EXTENSION: &str = "mpk";
const METADATA_EXTENSION: &str = "json";

/// Checkpoint metadata stored as JSON next to the parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// Checkpoint version for compatibility.
    pub version: u32,
    /// Model family.
    pub model: ModelKind,
    /// Shapes of all parameters in module order.
    pub param_shapes: Vec<Vec<usize>>,
    /// Total parameter count.
    pub num_params: usize,
    /// Number of completed epochs.
    pub epoch: usize,
    /// Learning rate after the last completed epoch.
    pub learning_rate: f64,
    /// Mean training loss of the last epoch.
    pub train_loss: Option<f32>,
    /// Mean validation loss of the last epoch.
    pub valid_loss: Option<f32>,
}

impl CheckpointMetadata {
    /// Metadata describing `model` after `epoch` epochs.
    pub fn for_model<B: Backend, M: Module<B>>(kind: ModelKind, model: &M, epoch: usize) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            model: kind,
            param_shapes: param_shapes(model),
            num_params: model.num_params(),
            epoch,
            learning_rate: 0.0,
            train_loss: None,
            valid_loss: None,
        }
    }

    /// Set the learning rate.
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set the last epoch losses.
    pub fn with_losses(mut self, train_loss: Option<f32>, valid_loss: Option<f32>) -> Self {
        self.train_loss = train_loss;
        self.valid_loss = valid_loss;
        self
    }
}

struct ShapeCollector {
    shapes: Vec<Vec<usize>>,
}

impl<B: Backend> ModuleVisitor<B> for ShapeCollector {
    fn visit_float<const D: usize>(&mut self, _id: ParamId, tensor: &Tensor<B, D>) {
        self.shapes.push(tensor.dims().to_vec());
    }
}

/// Shapes of every float parameter of `model`, in visiting order.
pub fn param_shapes<B: Backend, M: Module<B>>(model: &M) -> Vec<Vec<usize>> {
    let mut collector = ShapeCollector { shapes: Vec::new() };
    model.visit(&mut collector);
    collector.shapes
}

/// Conventional checkpoint name.
///
/// `model_checkpoint_<model>_<num_params>_<fingerprint>_<tag>_<epoch:03>`
pub fn checkpoint_name(
    model: ModelKind,
    num_params: usize,
    fingerprint: &str,
    tag: &str,
    epoch: usize,
) -> String {
    format!(
        "model_checkpoint_{}_{}_{}_{}_{:03}",
        model, num_params, fingerprint, tag, epoch
    )
}

/// Base path with any `.mpk` or `.json` extension removed.
pub fn checkpoint_base(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(PARAMS_EXTENSION) | Some(METADATA_EXTENSION) => path.with_extension(""),
        _ => path.to_path_buf(),
    }
}

fn with_suffix(base: &Path, extension: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Path of the parameter archive for `base`.
pub fn params_path(base: &Path) -> PathBuf {
    with_suffix(base, PARAMS_EXTENSION)
}

/// Path of the metadata sidecar for `base`.
pub fn metadata_path(base: &Path) -> PathBuf {
    with_suffix(base, METADATA_EXTENSION)
}

/// Check if both checkpoint files exist.
pub fn checkpoint_exists(base: &Path) -> bool {
    params_path(base).is_file() && metadata_path(base).is_file()
}

/// Save `model` and `metadata` under `base`.
pub fn save_checkpoint<B: Backend, M: Module<B>>(
    base: &Path,
    model: &M,
    metadata: &CheckpointMetadata,
) -> Result<()> {
    if let Some(dir) = base.parent() {
        fs::create_dir_all(dir).map_err(|e| HitTrainError::storage(dir, e))?;
    }

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    model
        .clone()
        .save_file(params_path(base), &recorder)
        .map_err(|e| HitTrainError::checkpoint(base, format!("{:?}", e)))?;

    let sidecar = metadata_path(base);
    let json = serde_json::to_string_pretty(metadata)?;
    fs::write(&sidecar, json).map_err(|e| HitTrainError::storage(&sidecar, e))?;

    log::info!(
        "Saved checkpoint to {} (epoch {})",
        base.display(),
        metadata.epoch
    );
    Ok(())
}

/// Read the metadata sidecar of `base`.
pub fn read_metadata(base: &Path) -> Result<CheckpointMetadata> {
    let sidecar = metadata_path(base);
    let json = fs::read_to_string(&sidecar)
        .map_err(|e| HitTrainError::checkpoint(base, format!("cannot read metadata: {}", e)))?;
    serde_json::from_str(&json)
        .map_err(|e| HitTrainError::checkpoint(base, format!("invalid metadata: {}", e)))
}

/// Restore parameters saved under `base` into `model`.
///
/// Version, model family and every parameter shape are checked against the
/// sidecar before the parameters are read, and the loaded shapes again after.
pub fn load_checkpoint<B: Backend, M: Module<B>>(
    base: &Path,
    model: M,
    kind: ModelKind,
    device: &B::Device,
) -> Result<(M, CheckpointMetadata)> {
    let base = checkpoint_base(base);
    let metadata = read_metadata(&base)?;

    if metadata.version != CHECKPOINT_VERSION {
        return Err(HitTrainError::checkpoint(
            &base,
            format!(
                "version {} is not supported (expected {})",
                metadata.version, CHECKPOINT_VERSION
            ),
        ));
    }
    if metadata.model != kind {
        return Err(HitTrainError::checkpoint(
            &base,
            format!("saved for {}, not {}", metadata.model, kind),
        ));
    }

    let expected = param_shapes(&model);
    check_shapes(&base, "saved", &metadata.param_shapes, &expected)?;

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let model = model
        .load_file(params_path(&base), &recorder, device)
        .map_err(|e| HitTrainError::checkpoint(&base, format!("{:?}", e)))?;
    check_shapes(&base, "loaded", &param_shapes(&model), &expected)?;

    log::info!(
        "Loaded checkpoint from {} (epoch {})",
        base.display(),
        metadata.epoch
    );
    Ok((model, metadata))
}

fn check_shapes(base: &Path, origin: &str, found: &[Vec<usize>], expected: &[Vec<usize>]) -> Result<()> {
    if found.len() != expected.len() {
        return Err(HitTrainError::checkpoint(
            base,
            format!(
                "{} parameters {}, model has {}",
                found.len(),
                origin,
                expected.len()
            ),
        ));
    }
    if let Some((i, (got, wanted))) = found
        .iter()
        .zip(expected)
        .enumerate()
        .find(|(_, (got, wanted))| got != wanted)
    {
        return Err(HitTrainError::checkpoint(
            base,
            format!(
                "{} parameter {} has shape {:?}, model expects {:?}",
                origin, i, got, wanted
            ),
        ));
    }
    Ok(())
}

/// Checkpoint in `dir` with the highest saved epoch.
///
/// Epochs are read from the sidecars; file names are not parsed.
pub fn find_latest_checkpoint(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut latest: Option<(usize, PathBuf)> = None;

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(METADATA_EXTENSION) {
            continue;
        }
        let base = path.with_extension("");
        if !params_path(&base).is_file() {
            continue;
        }
        let Ok(metadata) = read_metadata(&base) else {
            log::warn!("Skipping unreadable checkpoint metadata {}", path.display());
            continue;
        };
        let newer = latest
            .as_ref()
            .map_or(true, |(epoch, _)| metadata.epoch > *epoch);
        if newer {
            latest = Some((metadata.epoch, base));
        }
    }

    latest.map(|(_, base)| base)
}
