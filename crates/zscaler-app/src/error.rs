//! Harness error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while preparing or recording a run.
#[derive(Debug, Error)]
pub enum AppError {
    /// A file could not be read or written.
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file did not contain the expected JSON.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The merged asset configuration is unusable.
    #[error("invalid asset configuration: {0}")]
    Config(String),
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, AppError>;
