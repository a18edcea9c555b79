//! Epoch loop for graph models.

use std::path::{Path, PathBuf};
use std::time::Instant;

use burn::module::AutodiffModule;
use burn::optim::GradientsParams;
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::ElementConversion;

use crate::config::{OptimizerKind, PlateauConfig, RunConfig};
use crate::data::{GraphLoader, GraphSubset};
use crate::error::{HitTrainError, Result};
use crate::nn::GraphModel;

use super::checkpoint::{
    checkpoint_name, load_checkpoint, save_checkpoint, CheckpointMetadata, CHECKPOINT_DIR,
};
use super::loss::GraphLoss;
use super::metrics::{
    write_summaries, EpochSummary, EvalSummary, MetricsTracker, SampleMetrics, TrainSummary,
};
use super::optimizer::{build_optimizer, ModelOptimizer};
use super::scheduler::ReduceOnPlateau;

/// File in the output directory holding the epoch summaries.
pub const SUMMARIES_FILE: &str = "summaries.json";

/// Settings of a [`GnnTrainer`], derived from a [`RunConfig`].
#[derive(Debug, Clone)]
pub struct TrainerOptions {
    /// Epochs per `train` call.
    pub epochs: usize,
    /// Initial learning rate.
    pub learning_rate: f64,
    /// Optimizer family.
    pub optimizer: OptimizerKind,
    /// Loss and class weights.
    pub loss: GraphLoss,
    /// Learning rate schedule.
    pub plateau: PlateauConfig,
    /// Graphs per training batch.
    pub train_batch_size: usize,
    /// Graphs per validation batch.
    pub valid_batch_size: usize,
    /// Training loader shuffle seed.
    pub shuffle_seed: Option<u64>,
    /// Validation graphs used by `evaluate`.
    pub eval_samples: usize,
    /// Directory for checkpoints and summaries.
    pub output_dir: PathBuf,
    /// Dataset fingerprint for checkpoint names.
    pub fingerprint: String,
    /// User tag for checkpoint names.
    pub tag: String,
}

impl TrainerOptions {
    /// Derive trainer settings for a dataset with `num_classes` classes.
    ///
    /// # Errors
    /// `InvalidConfig` when the category weights do not cover every class.
    pub fn from_run(config: &RunConfig, fingerprint: &str, num_classes: usize) -> Result<Self> {
        let weights = config
            .category_weights
            .clone()
            .unwrap_or_else(|| vec![1.0; num_classes]);
        if weights.len() != num_classes {
            return Err(HitTrainError::invalid_config(format!(
                "{} category weights for {} classes",
                weights.len(),
                num_classes
            )));
        }

        Ok(Self {
            epochs: config.epochs,
            learning_rate: config.learning_rate,
            optimizer: config.optimizer,
            loss: GraphLoss::new(config.loss, weights),
            plateau: config.plateau.clone(),
            train_batch_size: config.train_batch_size,
            valid_batch_size: config.valid_batch_size,
            shuffle_seed: config.shuffle_seed,
            eval_samples: config.eval_samples,
            output_dir: config.output_dir.clone(),
            fingerprint: fingerprint.to_string(),
            tag: config.tag.clone(),
        })
    }
}

/// Owns a model with its optimizer and schedule, and runs epochs over graph subsets.
pub struct GnnTrainer<B, M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    model: M,
    optimizer: Box<dyn ModelOptimizer<M, B>>,
    scheduler: ReduceOnPlateau,
    options: TrainerOptions,
    device: B::Device,
    epoch: usize,
    history: Vec<EpochSummary>,
}

impl<B, M> GnnTrainer<B, M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + GraphModel<B> + 'static,
    M::InnerModule: GraphModel<B::InnerBackend>,
{
    /// Create a trainer around a freshly initialized model.
    pub fn new(model: M, options: TrainerOptions, device: B::Device) -> Self {
        let optimizer = build_optimizer::<M, B>(options.optimizer);
        let scheduler = ReduceOnPlateau::new(options.plateau.clone(), options.learning_rate);
        Self {
            model,
            optimizer,
            scheduler,
            options,
            device,
            epoch: 0,
            history: Vec::new(),
        }
    }

    /// Restore model parameters, epoch count and learning rate from a checkpoint.
    pub fn restore(&mut self, path: &Path) -> Result<CheckpointMetadata> {
        let (model, metadata) =
            load_checkpoint(path, self.model.clone(), self.model.kind(), &self.device)?;
        self.model = model;
        self.epoch = metadata.epoch;
        if metadata.learning_rate > 0.0 {
            self.scheduler.set_lr(metadata.learning_rate);
        }
        Ok(metadata)
    }

    /// The model being trained.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Trainer settings.
    pub fn options(&self) -> &TrainerOptions {
        &self.options
    }

    /// Number of completed epochs.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Current learning rate.
    pub fn lr(&self) -> f64 {
        self.scheduler.lr()
    }

    /// Summaries of every epoch run by this trainer.
    pub fn history(&self) -> &[EpochSummary] {
        &self.history
    }

    /// Parameter count and architecture.
    pub fn summary(&self) -> String {
        format!(
            "{} with {} trainable parameters: {}",
            self.model.kind(),
            self.model.num_params(),
            self.model.describe()
        )
    }

    /// Run `epochs` more epochs on `train`, validating on `valid` after each.
    ///
    /// A checkpoint is written and the summaries file rewritten after every epoch.
    pub fn train(&mut self, train: &GraphSubset, valid: &GraphSubset) -> Result<TrainSummary> {
        let train_loader = GraphLoader::new(train.clone(), self.options.train_batch_size)
            .with_shuffle_seed(self.options.shuffle_seed);
        let valid_loader = GraphLoader::new(valid.clone(), self.options.valid_batch_size);

        if train_loader.is_empty() {
            return Err(HitTrainError::training("training subset is empty"));
        }

        log::info!(
            "Training for {} epochs on {} graphs ({} validation)",
            self.options.epochs,
            train_loader.len(),
            valid_loader.len()
        );

        let mut summary = TrainSummary::default();
        let first = self.epoch + 1;
        for epoch in first..first + self.options.epochs {
            let lr = self.scheduler.lr();

            let start = Instant::now();
            let train_metrics = self.train_epoch(&train_loader, epoch, lr)?;
            let train_time = start.elapsed().as_secs_f64();

            let start = Instant::now();
            let valid_metrics = self.validate(&valid_loader)?;
            let valid_time = start.elapsed().as_secs_f64();

            let epoch_summary = EpochSummary {
                epoch,
                lr,
                train_loss: train_metrics.mean_loss(),
                train_time,
                valid_loss: valid_metrics.mean_loss(),
                valid_accuracy: valid_metrics.accuracy(),
                valid_time,
            };
            epoch_summary.log();
            self.epoch = epoch;

            if let Some(monitored) = epoch_summary.valid_loss.or(epoch_summary.train_loss) {
                self.scheduler.step(f64::from(monitored));
            }

            summary.last_checkpoint = Some(self.save(&epoch_summary)?);
            self.history.push(epoch_summary.clone());
            summary.epochs.push(epoch_summary);
            write_summaries(&self.options.output_dir.join(SUMMARIES_FILE), &self.history)?;
        }

        Ok(summary)
    }

    /// One optimization pass over `loader`.
    pub fn train_epoch(&mut self, loader: &GraphLoader, epoch: usize, lr: f64) -> Result<MetricsTracker> {
        let mut tracker = MetricsTracker::new();
        let target = self.model.target();

        for (i, batch) in loader.iter::<B>(epoch, &self.device).enumerate() {
            let batch = batch?;
            let (labels, targets) = target.labels(&batch);
            if labels.is_empty() {
                log::debug!("Skipping batch {} without targets", i);
                continue;
            }
            self.options.loss.check_labels(labels)?;

            let output = self.model.forward(&batch);
            let correct = count_correct(output.clone(), labels)?;
            let loss = self.options.loss.forward(output, targets);
            let loss_value = loss.clone().into_scalar().elem::<f32>();
            if !loss_value.is_finite() {
                return Err(HitTrainError::training(format!(
                    "loss became {} at epoch {}, batch {}",
                    loss_value, epoch, i
                )));
            }

            let grads = GradientsParams::from_grads(loss.backward(), &self.model);
            self.model = self.optimizer.step(lr, self.model.clone(), grads);

            tracker.add(loss_value, correct, labels.len());
            log::debug!("Epoch {} batch {}: loss={:.5}", epoch, i, loss_value);
        }

        Ok(tracker)
    }

    /// Loss and accuracy over `loader` without updating the model.
    pub fn validate(&self, loader: &GraphLoader) -> Result<MetricsTracker> {
        let model = self.model.valid();
        let target = model.target();
        let mut tracker = MetricsTracker::new();

        for batch in loader.iter::<B::InnerBackend>(0, &self.device) {
            let batch = batch?;
            let (labels, targets) = target.labels(&batch);
            if labels.is_empty() {
                continue;
            }
            self.options.loss.check_labels(labels)?;

            let output = model.forward(&batch);
            let correct = count_correct(output.clone(), labels)?;
            let loss = self.options.loss.forward(output, targets);
            tracker.add(loss.into_scalar().elem::<f32>(), correct, labels.len());
        }

        Ok(tracker)
    }

    /// Per-graph metrics over the first `eval_samples` graphs of `valid`.
    pub fn evaluate(&self, valid: &GraphSubset) -> Result<EvalSummary> {
        let subset = valid.truncate(self.options.eval_samples);
        let first_index = subset.indices().start;
        let loader = GraphLoader::new(subset, 1);
        let model = self.model.valid();
        let target = model.target();

        let mut samples = Vec::with_capacity(loader.len());
        for (position, batch) in loader.iter::<B::InnerBackend>(0, &self.device).enumerate() {
            let batch = batch?;
            let index = first_index + position;
            let (labels, targets) = target.labels(&batch);
            if labels.is_empty() {
                log::debug!("Graph {} has nothing to classify", index);
                continue;
            }
            self.options.loss.check_labels(labels)?;

            let output = model.forward(&batch);
            let correct = count_correct(output.clone(), labels)?;
            let loss = self.options.loss.forward(output, targets).into_scalar().elem::<f32>();
            log::debug!("Graph {}: loss={:.5} correct={}/{}", index, loss, correct, labels.len());

            samples.push(SampleMetrics {
                index,
                loss,
                accuracy: correct as f32 / labels.len() as f32,
                rows: labels.len(),
            });
        }

        let summary = EvalSummary::from_samples(samples);
        log::info!(
            "Evaluated {} graphs: mean_loss={:?} accuracy={:?}",
            summary.samples.len(),
            summary.mean_loss,
            summary.accuracy
        );
        Ok(summary)
    }

    /// Path of the checkpoint for `epoch`.
    pub fn checkpoint_path(&self, epoch: usize) -> PathBuf {
        self.options.output_dir.join(CHECKPOINT_DIR).join(checkpoint_name(
            self.model.kind(),
            self.model.num_params(),
            &self.options.fingerprint,
            &self.options.tag,
            epoch,
        ))
    }

    fn save(&self, epoch_summary: &EpochSummary) -> Result<PathBuf> {
        let path = self.checkpoint_path(epoch_summary.epoch);
        let metadata = CheckpointMetadata::for_model(self.model.kind(), &self.model, epoch_summary.epoch)
            .with_learning_rate(self.scheduler.lr())
            .with_losses(epoch_summary.train_loss, epoch_summary.valid_loss);
        save_checkpoint(&path, &self.model, &metadata)?;
        Ok(path)
    }
}

/// Number of rows whose arg-max class equals the label.
pub fn count_correct<B: Backend>(output: Tensor<B, 2>, labels: &[i64]) -> Result<usize> {
    let predicted: Vec<i64> = output
        .argmax(1)
        .into_data()
        .convert::<i64>()
        .to_vec()
        .map_err(|e| HitTrainError::training(format!("cannot read predictions: {:?}", e)))?;
    Ok(predicted
        .iter()
        .zip(labels)
        .filter(|(p, l)| p == l)
        .count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_count_correct() {
        let device = Default::default();
        let output = Tensor::<NdArray, 2>::from_floats(
            [[-0.1, -3.0], [-2.0, -0.2], [-0.3, -1.5]],
            &device,
        );
        assert_eq!(count_correct(output, &[0, 1, 1]).unwrap(), 2);
    }

    #[test]
    fn test_options_reject_short_weights() {
        let config = RunConfig::new(PathBuf::from("data"))
            .with_forced_categories(None)
            .with_category_weights(Some(vec![1.0, 2.0]));
        assert!(TrainerOptions::from_run(&config, "abc", 2).is_ok());
        assert!(matches!(
            TrainerOptions::from_run(&config, "abc", 3),
            Err(HitTrainError::InvalidConfig { .. })
        ));
    }
}
