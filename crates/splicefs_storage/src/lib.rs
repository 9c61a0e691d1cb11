//! # splicefs Storage
//!
//! Block storage backends for splicefs.
//!
//! This crate provides the lowest-level storage abstraction. Backends are
//! **opaque key/value block stores** - they do not interpret the keys or
//! the blocks they hold. Identifier derivation and node formats belong to
//! the layers above.
//!
//! ## Design Principles
//!
//! - Blocks are immutable: writing an existing key is a no-op
//! - Keys are arbitrary byte strings (binary identifiers in practice)
//! - Backends must be `Send + Sync` and usable through `&self`
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral stores
//! - [`FileBackend`] - Persistent, one file per block in a sharded directory
//!
//! ## Example
//!
//! ```rust
//! use splicefs_storage::{BlockBackend, InMemoryBackend};
//!
//! let backend = InMemoryBackend::new();
//! backend.put(b"key", b"hello world").unwrap();
//! let data = backend.get(b"key").unwrap().unwrap();
//! assert_eq!(&data[..], b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::BlockBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
