//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while decoding nodes or identifiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A varint ran past 64 bits.
    #[error("varint overflows 64 bits")]
    VarintOverflow,

    /// A field carried a wire type other than the one its schema requires.
    #[error("{message}: field {field} has wire type {wire_type}")]
    InvalidWireType {
        /// The message being decoded.
        message: &'static str,
        /// Field number.
        field: u64,
        /// Wire type found in the input.
        wire_type: u8,
    },

    /// A field number not defined by the schema.
    #[error("{message}: unknown field {field}")]
    UnknownField {
        /// The message being decoded.
        message: &'static str,
        /// Field number.
        field: u64,
    },

    /// A required field is absent.
    #[error("{message}: missing required field {field}")]
    MissingField {
        /// The message being decoded.
        message: &'static str,
        /// Field name.
        field: &'static str,
    },

    /// Invalid UTF-8 string.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// Structurally invalid input.
    #[error("invalid structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },

    /// Node type this codec does not handle.
    #[error("unsupported node type: {type_name}")]
    UnsupportedType {
        /// Name of the unsupported type.
        type_name: String,
    },

    /// Malformed identifier.
    #[error("invalid CID: {message}")]
    InvalidCid {
        /// Description of the problem.
        message: String,
    },
}

impl CodecError {
    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Create an unsupported type error.
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    /// Create an invalid CID error.
    pub fn invalid_cid(message: impl Into<String>) -> Self {
        Self::InvalidCid {
            message: message.into(),
        }
    }
}
