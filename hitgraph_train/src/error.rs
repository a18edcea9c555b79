//! Error types for hitgraph_train.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while configuring, training or evaluating a session.
#[derive(Error, Debug)]
pub enum HitTrainError {
    /// The dataset path does not exist or is not a directory.
    #[error("{path} is not a valid path")]
    Path {
        /// The offending path.
        path: PathBuf,
    },

    /// A checkpoint could not be read, written or applied to the model.
    #[error("checkpoint error at {path}: {message}")]
    Checkpoint {
        /// Checkpoint path (without extension).
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// A shell command batch exited with a non-zero status.
    #[error("command exited with status {status}: {command}")]
    CommandExecution {
        /// Last command sent to the shell.
        command: String,
        /// Exit status, -1 when terminated by a signal.
        status: i32,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Operation not allowed in the current session state.
    #[error("invalid session state: cannot {operation} while {state}")]
    InvalidState {
        /// Requested operation.
        operation: &'static str,
        /// Current state name.
        state: &'static str,
    },

    /// Training error.
    #[error("training error: {message}")]
    Training {
        /// Description of the error.
        message: String,
    },

    /// Dataset I/O error from hitgraph_io.
    #[error("dataset error: {0}")]
    Io(#[from] hitgraph_io::HitIoError),

    /// JSON (de)serialization failure for summaries or checkpoint metadata.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem failure outside the dataset cache.
    #[error("storage error at {path}: {source}")]
    Storage {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

impl HitTrainError {
    /// Build a `Checkpoint` error.
    pub fn checkpoint(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        HitTrainError::Checkpoint {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Build an `InvalidConfig` error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        HitTrainError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Build a `Training` error.
    pub fn training(message: impl Into<String>) -> Self {
        HitTrainError::Training {
            message: message.into(),
        }
    }

    /// Wrap an I/O error with the path it occurred on.
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HitTrainError::Storage {
            path: path.into(),
            source,
        }
    }
}

/// Result type for hitgraph_train operations.
pub type Result<T> = std::result::Result<T, HitTrainError>;
