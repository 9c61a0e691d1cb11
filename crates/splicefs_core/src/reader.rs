//! Reading file content back out of the store.

use crate::error::{CoreError, CoreResult};
use crate::size::load_node;
use crate::store::BlockStore;
use crate::traverse::{traverse_ranges, EntryKind, RangeTraversal, UNLIMITED_DEPTH};
use bytes::Bytes;
use splicefs_codec::{Cid, Node};

/// Streams a file's bytes leaf by leaf.
///
/// This is the default [`BlockStore::read_stream`]. Raw leaves are
/// returned as stored; inline file nodes yield their data.
pub struct ContentReader<'a, S: BlockStore + ?Sized> {
    store: &'a S,
    ranges: RangeTraversal<'a, S>,
}

impl<'a, S: BlockStore + ?Sized> ContentReader<'a, S> {
    /// Starts reading `cid`.
    pub fn new(store: &'a S, cid: Cid) -> Self {
        Self {
            store,
            ranges: traverse_ranges(store, &cid, UNLIMITED_DEPTH),
        }
    }

    fn leaf(&self, cid: &Cid, kind: EntryKind) -> CoreResult<Bytes> {
        match kind {
            EntryKind::Raw => self.store.get(cid),
            EntryKind::Composite => match load_node(self.store, cid)? {
                Node::File(file) => Ok(Bytes::from(file.data)),
                Node::Directory(_) => Err(CoreError::NotAFile { cid: *cid }),
            },
        }
    }
}

impl<S: BlockStore + ?Sized> Iterator for ContentReader<'_, S> {
    type Item = CoreResult<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match self.ranges.next()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };
        Some(self.leaf(&entry.cid, entry.kind))
    }
}

/// Reads a whole file into memory.
///
/// # Errors
///
/// Returns an error if the identifier is a directory or a block is missing
/// or malformed.
pub fn read_to_vec<S: BlockStore + ?Sized>(store: &S, cid: &Cid) -> CoreResult<Vec<u8>> {
    let mut out = Vec::new();
    for chunk in store.read_stream(cid) {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}
