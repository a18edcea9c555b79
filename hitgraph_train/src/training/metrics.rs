//! Epoch and evaluation summaries.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HitTrainError, Result};

/// Running loss and accuracy over a sequence of batches.
#[derive(Debug, Clone, Default)]
pub struct MetricsTracker {
    loss_sum: f64,
    batches: usize,
    correct: usize,
    total: usize,
}

impl MetricsTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one batch.
    pub fn add(&mut self, loss: f32, correct: usize, total: usize) {
        self.loss_sum += f64::from(loss);
        self.batches += 1;
        self.correct += correct;
        self.total += total;
    }

    /// Mean batch loss, `None` before the first batch.
    pub fn mean_loss(&self) -> Option<f32> {
        (self.batches > 0).then(|| (self.loss_sum / self.batches as f64) as f32)
    }

    /// Fraction of correct predictions, `None` without predictions.
    pub fn accuracy(&self) -> Option<f32> {
        (self.total > 0).then(|| self.correct as f32 / self.total as f32)
    }

    /// Number of batches added.
    pub fn batches(&self) -> usize {
        self.batches
    }
}

/// Summary of one training epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    /// Epoch number, starting at 1.
    pub epoch: usize,
    /// Learning rate used during the epoch.
    pub lr: f64,
    /// Mean training loss.
    pub train_loss: Option<f32>,
    /// Training wall time in seconds.
    pub train_time: f64,
    /// Mean validation loss.
    pub valid_loss: Option<f32>,
    /// Validation accuracy.
    pub valid_accuracy: Option<f32>,
    /// Validation wall time in seconds.
    pub valid_time: f64,
}

impl EpochSummary {
    /// Log the summary.
    pub fn log(&self) {
        log::info!(
            "Epoch {}: lr={:.3e} train_loss={} ({:.2}s) valid_loss={} valid_acc={} ({:.2}s)",
            self.epoch,
            self.lr,
            fmt_metric(self.train_loss),
            self.train_time,
            fmt_metric(self.valid_loss),
            fmt_metric(self.valid_accuracy),
            self.valid_time,
        );
    }
}

/// History of a `train` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainSummary {
    /// Per-epoch summaries in order.
    pub epochs: Vec<EpochSummary>,
    /// Checkpoint written after the last epoch.
    pub last_checkpoint: Option<std::path::PathBuf>,
}

impl TrainSummary {
    /// Training loss of every epoch.
    pub fn train_losses(&self) -> Vec<Option<f32>> {
        self.epochs.iter().map(|e| e.train_loss).collect()
    }

    /// Summary of the last epoch.
    pub fn last(&self) -> Option<&EpochSummary> {
        self.epochs.last()
    }
}

/// Metrics of one evaluated graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleMetrics {
    /// Dataset index of the graph.
    pub index: usize,
    /// Loss of the graph.
    pub loss: f32,
    /// Fraction of correctly classified rows.
    pub accuracy: f32,
    /// Number of classified rows.
    pub rows: usize,
}

/// Result of an `evaluate` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalSummary {
    /// Per-graph metrics in subset order.
    pub samples: Vec<SampleMetrics>,
    /// Mean per-graph loss.
    pub mean_loss: Option<f32>,
    /// Accuracy over all rows of all graphs.
    pub accuracy: Option<f32>,
}

impl EvalSummary {
    /// Aggregate per-graph metrics.
    pub fn from_samples(samples: Vec<SampleMetrics>) -> Self {
        let mut tracker = MetricsTracker::new();
        for sample in &samples {
            let correct = (sample.accuracy * sample.rows as f32).round() as usize;
            tracker.add(sample.loss, correct, sample.rows);
        }
        Self {
            mean_loss: tracker.mean_loss(),
            accuracy: tracker.accuracy(),
            samples,
        }
    }
}

/// Write all epoch summaries so far to `path` as a JSON array.
pub fn write_summaries(path: &Path, summaries: &[EpochSummary]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| HitTrainError::storage(parent, e))?;
    }
    let json = serde_json::to_string_pretty(summaries)?;
    std::fs::write(path, json).map_err(|e| HitTrainError::storage(path, e))
}

/// Read epoch summaries written by [`write_summaries`].
pub fn read_summaries(path: &Path) -> Result<Vec<EpochSummary>> {
    let json = std::fs::read_to_string(path).map_err(|e| HitTrainError::storage(path, e))?;
    Ok(serde_json::from_str(&json)?)
}

fn fmt_metric(value: Option<f32>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.5}", v))
}
