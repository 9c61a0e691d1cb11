//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A stored block is unreadable or inconsistent.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// Another process holds the store lock.
    #[error("store locked: another process has exclusive access to {}", path.display())]
    Locked {
        /// The store root.
        path: PathBuf,
    },

    /// The store root is not usable.
    #[error("invalid store location {}: {message}", path.display())]
    InvalidLocation {
        /// The offending path.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },
}
