//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores and common
//! trees.

use bytes::Bytes;
use splicefs_codec::Cid;
use splicefs_core::{
    concat, make_dir, read_to_vec, BlockStore, Blockstore, ByteStream, CoreResult,
    DirEntryInput, ImportOptions,
};
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

/// A test store with automatic cleanup.
pub struct TestStore {
    store: Box<dyn BlockStore>,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a new in-memory test store.
    pub fn memory() -> Self {
        Self {
            store: Box::new(Blockstore::in_memory()),
            temp_dir: None,
        }
    }

    /// Creates a new file-backed test store in a temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Blockstore::open(temp_dir.path()).expect("Failed to open file store");
        Self {
            store: Box::new(store),
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the store directory if file-backed, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }

    /// Stores a string as a raw block.
    pub fn add_str(&self, text: &str) -> Cid {
        self.store.put(text.as_bytes()).expect("Failed to put block")
    }

    /// Reads a file back as UTF-8.
    pub fn read_string(&self, cid: &Cid) -> String {
        let bytes = read_to_vec(self, cid).expect("Failed to read file");
        String::from_utf8(bytes).expect("File is not UTF-8")
    }

    /// Stores each string and concatenates them.
    pub fn add_concat(&self, parts: &[&str]) -> Cid {
        let cids: Vec<Cid> = parts.iter().map(|p| self.add_str(p)).collect();
        concat(self, &cids).expect("Failed to concatenate")
    }
}

impl BlockStore for TestStore {
    fn get(&self, cid: &Cid) -> CoreResult<Bytes> {
        self.store.get(cid)
    }

    fn put(&self, data: &[u8]) -> CoreResult<Cid> {
        self.store.put(data)
    }

    fn put_composite(&self, node: &[u8]) -> CoreResult<Cid> {
        self.store.put_composite(node)
    }

    fn has(&self, cid: &Cid) -> CoreResult<bool> {
        self.store.has(cid)
    }

    fn ingest_chunked(
        &self,
        source: &mut dyn Read,
        options: &ImportOptions,
    ) -> CoreResult<(Cid, u64)> {
        self.store.ingest_chunked(source, options)
    }

    fn read_stream<'a>(&'a self, cid: &Cid) -> ByteStream<'a> {
        self.store.read_stream(cid)
    }
}

/// Runs a test with a temporary in-memory store.
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&TestStore) -> R,
{
    let store = TestStore::memory();
    f(&store)
}

/// Tree-building helpers.
pub mod scenarios {
    use super::*;

    /// Identifiers of the tree built by [`two_level_tree`].
    #[derive(Debug, Clone, Copy)]
    pub struct TwoLevelTree {
        /// The root directory.
        pub root: Cid,
        /// `/a`, holding `"aaa"`.
        pub a: Cid,
        /// `/sub`.
        pub sub: Cid,
        /// `/sub/b`, holding `"bbbbb"`.
        pub b: Cid,
        /// `/sub/c`, a concatenation of `"x"` and `"yy"`.
        pub c: Cid,
    }

    /// Builds `/a`, `/sub/b` and `/sub/c`.
    pub fn two_level_tree(store: &TestStore) -> TwoLevelTree {
        let a = store.add_str("aaa");
        let b = store.add_str("bbbbb");
        let c = store.add_concat(&["x", "yy"]);
        let sub = make_dir(
            store,
            vec![
                ("b".to_string(), DirEntryInput::new(b)),
                ("c".to_string(), DirEntryInput::new(c)),
            ],
        )
        .expect("Failed to make directory");
        let root = make_dir(
            store,
            vec![
                ("sub".to_string(), DirEntryInput::new(sub)),
                ("a".to_string(), DirEntryInput::new(a)),
            ],
        )
        .expect("Failed to make directory");
        TwoLevelTree { root, a, sub, b, c }
    }
}
