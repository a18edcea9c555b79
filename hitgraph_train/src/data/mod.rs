//! Graph datasets, subsets and batching.
//!
//! - [`GraphDataset`]: processed records behind a shared [`hitgraph_io::DatasetCache`]
//! - [`GraphSubset`]: a positional slice of a dataset
//! - [`GraphLoader`] / [`GraphBatch`]: fixed-order (or seeded) batches as tensors

mod batch;
mod dataset;

pub use batch::{GraphBatch, GraphLoader};
pub use dataset::{GraphDataset, GraphSubset};
