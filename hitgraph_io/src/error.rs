//! Error types for hitgraph_io operations.

use std::path::PathBuf;

use hitgraph_core::HitGraphError;
use thiserror::Error;

/// Errors that can occur while reading, caching or splitting datasets.
#[derive(Error, Debug)]
pub enum HitIoError {
    /// A dataset root or raw directory does not exist.
    #[error("path does not exist: {path}")]
    Path {
        /// The missing path.
        path: PathBuf,
    },

    /// A directory or file could not be created, written or read.
    #[error("storage error at {path}: {source}")]
    Storage {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A record was requested before it was processed.
    #[error("record {index} not found: run ensure_processed() first")]
    NotFound {
        /// Requested record index.
        index: usize,
    },

    /// A sample or graph file is malformed.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the problem.
        message: String,
    },

    /// Split boundaries are out of range or not ordered.
    #[error("invalid split: {message}")]
    InvalidSplit {
        /// Description of the problem.
        message: String,
    },

    /// Graph construction failed.
    #[error("graph error: {0}")]
    Graph(#[from] HitGraphError),

    /// I/O failure from a reader or writer without path context.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HitIoError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HitIoError::Storage {
            path: path.into(),
            source,
        }
    }

    /// Build an `InvalidInput` error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        HitIoError::InvalidInput {
            message: message.into(),
        }
    }
}

/// Result type alias for hitgraph_io operations.
pub type Result<T> = std::result::Result<T, HitIoError>;
