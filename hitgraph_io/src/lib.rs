//! hitgraph_io - file formats, dataset cache and splits for hit graphs.
//!
//! This crate is the storage layer between raw detector samples on disk and
//! the training code: it reads raw `.hit` samples, persists one processed
//! `.hgr` graph per sample, and partitions the processed records.
//!
//! # Core Types
//!
//! - [`DatasetCache`]: lazy raw → graph conversion with forced reprocessing
//! - [`SplitPolicy`] / [`Split`]: positional train/validation partitions
//! - [`format`]: binary readers and writers
//!
//! # Example
//!
//! ```no_run
//! use hitgraph_core::GraphBuilder;
//! use hitgraph_io::{DatasetCache, SplitPolicy};
//!
//! let mut cache = DatasetCache::new("data/shapes", GraphBuilder::default())?;
//! let raw = cache.discover_raw()?;
//! cache.ensure_processed(&raw)?;
//!
//! let split = SplitPolicy::default().split(cache.len())?;
//! let first = cache.load(split.train.start)?;
//! println!("{} nodes, {} edges", first.num_nodes(), first.num_edges());
//! # Ok::<(), hitgraph_io::HitIoError>(())
//! ```

pub mod cache;
pub mod error;
pub mod format;
pub mod split;

pub use hitgraph_core::{GraphRecord, RawSample};

pub use cache::{DatasetCache, PROCESSED_DIR, RAW_DIR};
pub use error::{HitIoError, Result};
pub use format::{load_raw_sample, save_raw_sample};
pub use split::{split, Split, SplitPolicy, DEFAULT_VALID_FRACTION};
