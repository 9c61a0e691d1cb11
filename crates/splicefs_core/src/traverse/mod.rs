//! Read-side traversal of composite trees.
//!
//! Both walks are lazy iterators over an explicit stack; dropping one
//! simply stops reading. Traversals only read immutable blocks, so any
//! number may run concurrently against the same store.

mod directory;
mod ranges;
mod stat;

pub use directory::{traverse_directory, DirEntry, DirTraversal};
pub use ranges::{traverse_ranges, EntryKind, RangeEntry, RangeTraversal, UNLIMITED_DEPTH};
pub use stat::{parse_path, stat};
