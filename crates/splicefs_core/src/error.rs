//! Error types for splicefs core.

use splicefs_codec::Cid;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in splicefs core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] splicefs_storage::StorageError),

    /// Malformed or undecodable node bytes.
    #[error("format error: {0}")]
    Format(#[from] splicefs_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A file was required but the identifier designates a directory.
    #[error("{cid} is a directory, not a file")]
    NotAFile {
        /// The offending identifier.
        cid: Cid,
    },

    /// A directory was required but the identifier designates a file.
    #[error("{cid} is not a directory")]
    NotADirectory {
        /// The offending identifier.
        cid: Cid,
    },

    /// A directory was given where only files may be concatenated.
    #[error("{cid} is a directory and cannot be concatenated")]
    DirectoryNotAllowed {
        /// The offending identifier.
        cid: Cid,
    },

    /// Declared and produced subtree lengths disagree.
    #[error("size mismatch under {cid}: declared {expected} bytes, found {actual}")]
    SizeMismatch {
        /// The subtree whose length disagrees.
        cid: Cid,
        /// Length declared by the parent.
        expected: u64,
        /// Length actually produced.
        actual: u64,
    },

    /// Split offsets text matched no known format.
    #[error("unparsable split offsets: {message}")]
    UnparsableSplits {
        /// Description of the problem.
        message: String,
    },

    /// A split offset lies past the end of the source.
    #[error("split offset {offset} is past the end of a {total}-byte source")]
    SplitOutOfRange {
        /// The offending offset.
        offset: u64,
        /// Source length.
        total: u64,
    },

    /// Reading the ingestion source failed.
    #[error("failed to read source at offset {offset}: {source}")]
    SourceRead {
        /// Absolute source offset of the failed segment.
        offset: u64,
        /// Underlying error.
        source: io::Error,
    },

    /// Two equal interior split offsets would produce an empty segment.
    #[error("empty segment at offset {offset}")]
    EmptySegment {
        /// Offset of the empty segment.
        offset: u64,
    },

    /// The block store has no block for the identifier.
    #[error("block not found: {cid}")]
    NotFound {
        /// The missing identifier.
        cid: Cid,
    },

    /// A directory entry name collides with another.
    #[error("duplicate directory entry name: {name:?}")]
    DuplicateName {
        /// The colliding name.
        name: String,
    },

    /// A directory entry name is empty or contains a path separator.
    #[error("invalid directory entry name: {name:?}")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// An archive entry name does not fit a ZIP header.
    #[error("archive entry name of {len} bytes exceeds the 65535-byte limit")]
    EntryNameTooLong {
        /// Name length in bytes.
        len: usize,
    },

    /// Identifier text could not be parsed.
    #[error("invalid CID {text:?}: {message}")]
    InvalidCid {
        /// The text that failed to parse.
        text: String,
        /// Description of the problem.
        message: String,
    },

    /// An operation needing at least one input got none.
    #[error("no inputs given")]
    EmptyInput,

    /// A configuration value is out of range or malformed.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// An archive part stream opened or closed a file out of turn.
    #[error("unbalanced file marker in archive stream: {message}")]
    UnbalancedMarker {
        /// Description of the problem.
        message: String,
    },

    /// A caller-supplied callback stopped the operation.
    #[error("aborted: {reason}")]
    Aborted {
        /// Reason for abort.
        reason: String,
    },
}

impl CoreError {
    /// Creates an unparsable splits error.
    pub fn unparsable_splits(message: impl Into<String>) -> Self {
        Self::UnparsableSplits {
            message: message.into(),
        }
    }

    /// Creates an invalid CID error.
    pub fn invalid_cid(text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCid {
            text: text.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an aborted error.
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted {
            reason: reason.into(),
        }
    }

    /// Returns whether this error reports a missing block.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Short name of the error kind, as reported by the command line.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Storage(_) => "StorageError",
            Self::Format(_) => "FormatError",
            Self::Io(_) => "IoError",
            Self::NotAFile { .. } => "NotAFileError",
            Self::NotADirectory { .. } => "NotADirectoryError",
            Self::DirectoryNotAllowed { .. } => "DirectoryNotAllowedError",
            Self::SizeMismatch { .. } => "SizeMismatchError",
            Self::UnparsableSplits { .. } => "UnparsableSplitsError",
            Self::SplitOutOfRange { .. } => "SplitOutOfRangeError",
            Self::SourceRead { .. } => "SourceReadError",
            Self::EmptySegment { .. } => "EmptySegmentError",
            Self::NotFound { .. } => "NotFoundError",
            Self::DuplicateName { .. } => "DuplicateNameError",
            Self::InvalidName { .. } => "InvalidNameError",
            Self::EntryNameTooLong { .. } => "EntryNameTooLongError",
            Self::InvalidCid { .. } => "InvalidCidError",
            Self::EmptyInput => "EmptyInputError",
            Self::InvalidConfig { .. } => "InvalidConfigError",
            Self::UnbalancedMarker { .. } => "UnbalancedMarkerError",
            Self::Aborted { .. } => "AbortedError",
        }
    }
}
