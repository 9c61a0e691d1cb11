//! Errors surfaced by the command line.

use splicefs_core::CoreError;
use std::io;
use thiserror::Error;

/// Result type for command implementations.
pub type CliResult<T> = Result<T, CliError>;

/// Anything a command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    /// A core operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serializing output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Short name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Core(e) => e.kind(),
            Self::Io(_) => "IoError",
            Self::Json(_) => "JsonError",
        }
    }
}
