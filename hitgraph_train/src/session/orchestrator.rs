//! Training session state machine.
//!
//! ```text
//! Unconfigured -> DatasetLoaded -> TrainerBuilt -> Training <-> Evaluating -> Finished
//!       ^                                                                        |
//!       +------------------------------ clear_cache -----------------------------+
//! ```

use std::path::Path;

use burn::tensor::backend::AutodiffBackend;

use hitgraph_core::{GraphBuilder, GraphBuilderConfig};
use hitgraph_io::{DatasetCache, HitIoError};

use super::memo::{clear_all, Memo, Resettable};
use crate::config::{ModelKind, ModelSpec, RunConfig};
use crate::data::{GraphDataset, GraphSubset};
use crate::error::{HitTrainError, Result};
use crate::nn::{EdgeNet, PointCloudNet};
use crate::training::{
    CheckpointMetadata, EpochSummary, EvalSummary, GnnTrainer, TrainSummary, TrainerOptions,
};

/// Lifecycle of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing derived yet.
    Unconfigured,
    /// Dataset processed and split.
    DatasetLoaded,
    /// Model, optimizer and schedule built.
    TrainerBuilt,
    /// Last operation was training.
    Training,
    /// Last operation was evaluation.
    Evaluating,
    /// No more training or evaluation.
    Finished,
}

impl SessionState {
    /// Lowercase state name.
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Unconfigured => "unconfigured",
            SessionState::DatasetLoaded => "dataset loaded",
            SessionState::TrainerBuilt => "trainer built",
            SessionState::Training => "training",
            SessionState::Evaluating => "evaluating",
            SessionState::Finished => "finished",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The full dataset with its train and validation subsets.
#[derive(Debug, Clone)]
pub struct DatasetSplits {
    /// All processed records.
    pub full: GraphDataset,
    /// Training subset.
    pub train: GraphSubset,
    /// Validation subset.
    pub valid: GraphSubset,
}

/// Trainer for whichever model family the run selected.
pub enum SessionTrainer<B: AutodiffBackend> {
    /// Iterative edge network.
    EdgeNet(GnnTrainer<B, EdgeNet<B>>),
    /// Point-cloud classifier.
    PointCloud(GnnTrainer<B, PointCloudNet<B>>),
}

macro_rules! with_trainer {
    ($self:expr, $trainer:ident => $body:expr) => {
        match $self {
            SessionTrainer::EdgeNet($trainer) => $body,
            SessionTrainer::PointCloud($trainer) => $body,
        }
    };
}

impl<B: AutodiffBackend> SessionTrainer<B> {
    /// Model family.
    pub fn kind(&self) -> ModelKind {
        match self {
            SessionTrainer::EdgeNet(_) => ModelKind::EdgeNetWithCategories,
            SessionTrainer::PointCloud(_) => ModelKind::PointCloudNet,
        }
    }

    /// Run the configured number of epochs.
    pub fn train(&mut self, train: &GraphSubset, valid: &GraphSubset) -> Result<TrainSummary> {
        with_trainer!(self, t => t.train(train, valid))
    }

    /// Evaluate on the first graphs of `valid`.
    pub fn evaluate(&self, valid: &GraphSubset) -> Result<EvalSummary> {
        with_trainer!(self, t => t.evaluate(valid))
    }

    /// Restore from a checkpoint.
    pub fn restore(&mut self, path: &Path) -> Result<CheckpointMetadata> {
        with_trainer!(self, t => t.restore(path))
    }

    /// Parameter count and architecture.
    pub fn summary(&self) -> String {
        with_trainer!(self, t => t.summary())
    }

    /// Number of completed epochs.
    pub fn epoch(&self) -> usize {
        with_trainer!(self, t => t.epoch())
    }

    /// Current learning rate.
    pub fn lr(&self) -> f64 {
        with_trainer!(self, t => t.lr())
    }

    /// Epoch summaries so far.
    pub fn history(&self) -> &[EpochSummary] {
        with_trainer!(self, t => t.history())
    }

    /// Trainable parameter count.
    pub fn num_params(&self) -> usize {
        use burn::module::Module;
        with_trainer!(self, t => t.model().num_params())
    }
}

/// Process the dataset under `config.dataset` and split it.
///
/// # Errors
/// `Path` when the dataset root is not a directory; dataset errors from the
/// cache abort the whole pass.
pub fn load_dataset(config: &RunConfig) -> Result<DatasetSplits> {
    if !config.dataset.is_dir() {
        return Err(HitTrainError::Path {
            path: config.dataset.clone(),
        });
    }

    let builder =
        GraphBuilder::new(GraphBuilderConfig::default().with_k(config.k)).map_err(HitIoError::from)?;
    let mut cache =
        DatasetCache::new(&config.dataset, builder)?.with_force_reprocess(config.force_reprocess);
    let raw = cache.discover_raw()?;
    let fingerprint = cache.fingerprint(&raw);
    let built = cache.ensure_processed(&raw)?;
    log::info!(
        "Dataset {} ready: {} records ({} newly processed), fingerprint {}",
        config.dataset.display(),
        cache.len(),
        built,
        fingerprint
    );

    let full = GraphDataset::new(cache, fingerprint, config.directed);
    let split = config.split_policy().split(full.len())?;
    log::info!(
        "Split: train {:?}, validation {:?}",
        split.train,
        split.valid
    );

    Ok(DatasetSplits {
        train: full.subset(split.train),
        valid: full.subset(split.valid),
        full,
    })
}

/// Build the model, optimizer and schedule for `config`, restoring the
/// configured checkpoint if any.
pub fn create_trainer<B: AutodiffBackend>(
    config: &RunConfig,
    fingerprint: &str,
    num_classes: usize,
    num_features: usize,
    device: &B::Device,
) -> Result<SessionTrainer<B>> {
    B::seed(config.seed);
    let options = TrainerOptions::from_run(config, fingerprint, num_classes)?;
    let spec = ModelSpec::resolve(
        config.model,
        num_features,
        num_classes,
        config.hidden_dim,
        config.n_iters,
        config.norm.clone(),
    );

    let mut trainer = match spec {
        ModelSpec::EdgeNet(model_config) => SessionTrainer::EdgeNet(GnnTrainer::new(
            EdgeNet::new(&model_config, device)?,
            options,
            device.clone(),
        )),
        ModelSpec::PointCloudNet(model_config) => SessionTrainer::PointCloud(GnnTrainer::new(
            PointCloudNet::new(&model_config, device),
            options,
            device.clone(),
        )),
    };

    if let Some(path) = &config.load_checkpoint {
        let metadata = trainer.restore(path)?;
        log::info!(
            "Resuming from epoch {} at lr {:.3e}",
            metadata.epoch,
            trainer.lr()
        );
    }

    log::info!("Model summary: {}", trainer.summary());
    Ok(trainer)
}

/// A configured training run.
///
/// Dataset and trainer are derived on first use and memoized until
/// [`clear_cache`](Self::clear_cache).
pub struct Session<B: AutodiffBackend> {
    config: RunConfig,
    device: B::Device,
    state: SessionState,
    dataset: Memo<DatasetSplits>,
    trainer: Memo<SessionTrainer<B>>,
}

impl<B: AutodiffBackend> Session<B> {
    /// Create a session after validating `config`.
    pub fn new(config: RunConfig, device: B::Device) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            device,
            state: SessionState::Unconfigured,
            dataset: Memo::new("get_dataset"),
            trainer: Memo::new("build_trainer"),
        })
    }

    /// Run configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Built trainer, if any.
    pub fn trainer(&self) -> Option<&SessionTrainer<B>> {
        self.trainer.get()
    }

    /// Full dataset with train and validation subsets.
    pub fn get_dataset(&mut self) -> Result<&DatasetSplits> {
        let config = &self.config;
        let splits = self.dataset.get_or_try_init(|| load_dataset(config))?;
        if self.state == SessionState::Unconfigured {
            self.state = SessionState::DatasetLoaded;
        }
        Ok(splits)
    }

    /// Model, optimizer and schedule for the given dimensions.
    ///
    /// Memoized: once built, later calls return the same trainer whatever
    /// their arguments.
    pub fn build_trainer(
        &mut self,
        num_classes: usize,
        num_features: usize,
    ) -> Result<&mut SessionTrainer<B>> {
        let fingerprint = self.get_dataset()?.full.fingerprint().to_string();
        let config = &self.config;
        let device = &self.device;
        let trainer = self.trainer.get_or_try_init_mut(|| {
            create_trainer(config, &fingerprint, num_classes, num_features, device)
        })?;
        if matches!(
            self.state,
            SessionState::Unconfigured | SessionState::DatasetLoaded
        ) {
            self.state = SessionState::TrainerBuilt;
        }
        Ok(trainer)
    }

    /// Trainer with dimensions derived from the dataset.
    pub fn get_trainer(&mut self) -> Result<&mut SessionTrainer<B>> {
        let forced = self.config.forced_categories;
        let (num_classes, num_features) = {
            let splits = self.get_dataset()?;
            (splits.full.num_classes(forced)?, splits.full.num_features()?)
        };
        self.build_trainer(num_classes, num_features)
    }

    /// Train on the training subset, validating after every epoch.
    pub fn train(&mut self) -> Result<TrainSummary> {
        self.check_active("train")?;
        let splits = self.get_dataset()?.clone();
        self.get_trainer()?;

        self.state = SessionState::Training;
        let trainer = self.built_trainer("train")?;
        trainer.train(&splits.train, &splits.valid)
    }

    /// Evaluate on the first `eval_samples` validation graphs.
    pub fn evaluate(&mut self) -> Result<EvalSummary> {
        self.check_active("evaluate")?;
        let splits = self.get_dataset()?.clone();
        self.get_trainer()?;

        self.state = SessionState::Evaluating;
        let trainer = self.built_trainer("evaluate")?;
        trainer.evaluate(&splits.valid)
    }

    /// End the session; later `train`/`evaluate` calls fail.
    pub fn finish(&mut self) {
        log::info!("Session finished in state {}", self.state);
        self.state = SessionState::Finished;
    }

    /// Drop the memoized dataset and trainer and return to `Unconfigured`.
    pub fn clear_cache(&mut self) {
        let mut memos: [&mut dyn Resettable; 2] = [&mut self.dataset, &mut self.trainer];
        clear_all(&mut memos);
        self.state = SessionState::Unconfigured;
    }

    fn check_active(&self, operation: &'static str) -> Result<()> {
        if self.state == SessionState::Finished {
            return Err(HitTrainError::InvalidState {
                operation,
                state: self.state.name(),
            });
        }
        Ok(())
    }

    fn built_trainer(&mut self, operation: &'static str) -> Result<&mut SessionTrainer<B>> {
        let state = self.state.name();
        self.trainer
            .get_mut()
            .ok_or(HitTrainError::InvalidState { operation, state })
    }
}
