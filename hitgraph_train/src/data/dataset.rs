//! Dataset views over the processed record cache.

use std::ops::Range;
use std::sync::Arc;

use hitgraph_io::{DatasetCache, GraphRecord};

use crate::error::{HitTrainError, Result};

/// Ordered collection of processed graph records.
///
/// Records are read from disk on access. Unless the dataset is directed,
/// every record is returned with its missing reverse edges added.
#[derive(Clone)]
pub struct GraphDataset {
    cache: Arc<DatasetCache>,
    fingerprint: String,
    directed: bool,
}

impl GraphDataset {
    /// Wrap a processed cache.
    pub fn new(cache: DatasetCache, fingerprint: impl Into<String>, directed: bool) -> Self {
        Self {
            cache: Arc::new(cache),
            fingerprint: fingerprint.into(),
            directed,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if the dataset has no records.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Fingerprint of the dataset root and raw file names.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Whether records keep only the k-NN direction.
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Load record `index`.
    pub fn get(&self, index: usize) -> Result<GraphRecord> {
        let record = self.cache.load(index)?;
        if self.directed {
            Ok(record)
        } else {
            Ok(record.to_undirected())
        }
    }

    /// Feature dimension, read from the first record.
    pub fn num_features(&self) -> Result<usize> {
        Ok(self.first()?.num_features)
    }

    /// Number of classes: `forced` when set, otherwise the largest label of
    /// the first record plus one.
    pub fn num_classes(&self, forced: Option<usize>) -> Result<usize> {
        if let Some(classes) = forced {
            return Ok(classes);
        }
        let max_label = self.first()?.max_label().unwrap_or(0);
        Ok(max_label.max(0) as usize + 1)
    }

    /// Positional subset `range`, clipped to the dataset length.
    pub fn subset(&self, range: Range<usize>) -> GraphSubset {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        GraphSubset {
            dataset: self.clone(),
            range: start..end,
        }
    }

    fn first(&self) -> Result<GraphRecord> {
        if self.is_empty() {
            return Err(HitTrainError::training("dataset has no records"));
        }
        self.get(0)
    }
}

impl std::fmt::Debug for GraphDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphDataset")
            .field("root", &self.cache.root())
            .field("len", &self.len())
            .field("fingerprint", &self.fingerprint)
            .field("directed", &self.directed)
            .finish()
    }
}

/// Contiguous slice of a [`GraphDataset`].
#[derive(Clone, Debug)]
pub struct GraphSubset {
    dataset: GraphDataset,
    range: Range<usize>,
}

impl GraphSubset {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Check if the subset is empty.
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Dataset indices covered by this subset.
    pub fn indices(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Load the `position`-th record of the subset.
    pub fn get(&self, position: usize) -> Result<GraphRecord> {
        if position >= self.len() {
            return Err(HitTrainError::training(format!(
                "position {} out of range for subset of {} records",
                position,
                self.len()
            )));
        }
        self.dataset.get(self.range.start + position)
    }

    /// Keep at most the first `len` records.
    pub fn truncate(&self, len: usize) -> Self {
        let end = self.range.start + len.min(self.len());
        Self {
            dataset: self.dataset.clone(),
            range: self.range.start..end,
        }
    }

    /// Underlying dataset.
    pub fn dataset(&self) -> &GraphDataset {
        &self.dataset
    }
}
