//! # splicefs Core
//!
//! Composite files and directories over a content-addressed block store.
//!
//! This crate provides:
//! - Composition: concatenating files and building directories from
//!   existing identifiers without copying content
//! - Chunked ingestion of a source split at caller-chosen offsets
//! - Lazy traversal of byte ranges and directory trees
//! - ZIP archives whose file data is linked, not copied
//!
//! Every operation takes the store as an explicit [`BlockStore`]
//! parameter.
//!
//! ## Usage
//!
//! ```
//! use splicefs_core::{concat, read_to_vec, BlockStore, Blockstore};
//!
//! let store = Blockstore::in_memory();
//! let hello = store.put(b"hello ").unwrap();
//! let world = store.put(b"world").unwrap();
//!
//! let joined = concat(&store, &[hello, world]).unwrap();
//! assert_eq!(read_to_vec(&store, &joined).unwrap(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod compose;
mod config;
mod error;
mod importer;
mod ingest;
mod reader;
mod size;
mod store;
mod traverse;
pub mod zip;

pub use compose::{add_to_dir, concat, concat_with_sizes, make_dir, DirEntryInput, KnownSizes};
pub use config::{
    ChecksumMode, Config, ImportOptions, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHILDREN,
    DEFAULT_READ_BUFFER_SIZE,
};
pub use error::{CoreError, CoreResult};
pub use importer::import;
pub use ingest::{
    parse_split_points, plan_segments, split_add, split_add_file, Segment, SegmentAdded,
    SplitAddOutput,
};
pub use reader::{read_to_vec, ContentReader};
pub use size::{load_node, resolve_size};
pub use store::{BlockStore, Blockstore, ByteStream};
pub use traverse::{
    parse_path, stat, traverse_directory, traverse_ranges, DirEntry, DirTraversal, EntryKind,
    RangeEntry, RangeTraversal, UNLIMITED_DEPTH,
};
pub use zip::{create_zip, ZipOutput};

pub use splicefs_codec::{Cid, Codec};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
