//! # splicefs Testkit
//!
//! Test utilities for splicefs.
//!
//! This crate provides:
//! - Store fixtures for in-memory and file-backed tests
//! - Property-based test generators using proptest
//! - Known-answer vectors for node encodings and identifiers
//!
//! ## Usage
//!
//! ```rust
//! use splicefs_testkit::prelude::*;
//!
//! let store = TestStore::memory();
//! let cid = store.add_str("hello world");
//! assert_eq!(store.read_string(&cid), "hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use generators::*;
pub use vectors::*;
