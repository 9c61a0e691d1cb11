//! Byte-range traversal of composite files.

use crate::error::{CoreError, CoreResult};
use crate::size::{load_node, resolve_size};
use crate::store::BlockStore;
use serde::Serialize;
use splicefs_codec::{Cid, FileChild, Node};

/// Depth limit that never stops descending.
pub const UNLIMITED_DEPTH: usize = usize::MAX;

/// What a range entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A raw block; its bytes are the content.
    Raw,
    /// A composite node, either holding inline data or not descended into.
    Composite,
}

/// A contiguous byte range of a file and the block that covers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RangeEntry {
    /// The covering block.
    pub cid: Cid,
    /// Offset of the range within the traversed file.
    pub offset: u64,
    /// Range length.
    pub length: u64,
    /// Block kind.
    pub kind: EntryKind,
}

impl RangeEntry {
    /// One past the last byte.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// Lists the byte ranges of a file, descending at most `max_depth`
/// composite levels.
///
/// With `max_depth = 0` the whole file is one entry; with `1` each of the
/// root's children is one entry; with [`UNLIMITED_DEPTH`] every leaf is
/// listed. Each child's produced length is checked against the size its
/// parent declares.
pub fn traverse_ranges<'a, S: BlockStore + ?Sized>(
    store: &'a S,
    cid: &Cid,
    max_depth: usize,
) -> RangeTraversal<'a, S> {
    RangeTraversal {
        store,
        stack: Vec::new(),
        pending: Some(Pending {
            cid: *cid,
            depth: max_depth,
            declared: None,
        }),
        offset: 0,
        done: false,
    }
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    cid: Cid,
    depth: usize,
    /// Size declared by the parent; `None` for the root.
    declared: Option<u64>,
}

struct Frame {
    children: Vec<FileChild>,
    next: usize,
    child_depth: usize,
    /// The child being produced and where it started.
    current: Option<(Cid, u64, u64)>,
}

/// Iterator returned by [`traverse_ranges`].
///
/// Walks with an explicit stack. After the first error it yields nothing.
pub struct RangeTraversal<'a, S: BlockStore + ?Sized> {
    store: &'a S,
    stack: Vec<Frame>,
    pending: Option<Pending>,
    offset: u64,
    done: bool,
}

impl<S: BlockStore + ?Sized> RangeTraversal<'_, S> {
    fn visit(&mut self, pending: Pending) -> CoreResult<Option<RangeEntry>> {
        let Pending {
            cid,
            depth,
            declared,
        } = pending;

        if cid.is_raw() {
            let length = self.store.get(&cid)?.len() as u64;
            return Ok(Some(self.emit(cid, length, EntryKind::Raw)));
        }

        if depth == 0 {
            let length = resolve_size(self.store, &cid, false)?;
            if let Some(expected) = declared.filter(|&expected| expected != length) {
                return Err(CoreError::SizeMismatch {
                    cid,
                    expected,
                    actual: length,
                });
            }
            return Ok(Some(self.emit(cid, length, EntryKind::Composite)));
        }

        match load_node(self.store, &cid)? {
            Node::Directory(_) => Err(CoreError::NotAFile { cid }),
            Node::File(file) if file.is_inline() => {
                Ok(Some(self.emit(cid, file.data.len() as u64, EntryKind::Composite)))
            }
            Node::File(file) => {
                self.stack.push(Frame {
                    children: file.children,
                    next: 0,
                    child_depth: depth - 1,
                    current: None,
                });
                Ok(None)
            }
        }
    }

    fn emit(&mut self, cid: Cid, length: u64, kind: EntryKind) -> RangeEntry {
        let entry = RangeEntry {
            cid,
            offset: self.offset,
            length,
            kind,
        };
        self.offset += length;
        entry
    }

    fn step(&mut self) -> CoreResult<Option<RangeEntry>> {
        loop {
            if let Some(pending) = self.pending.take() {
                if let Some(entry) = self.visit(pending)? {
                    return Ok(Some(entry));
                }
                continue;
            }

            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };

            if let Some((cid, start, expected)) = frame.current.take() {
                let actual = self.offset - start;
                if actual != expected {
                    return Err(CoreError::SizeMismatch {
                        cid,
                        expected,
                        actual,
                    });
                }
            }

            let Some(child) = frame.children.get(frame.next) else {
                self.stack.pop();
                continue;
            };
            frame.next += 1;
            frame.current = Some((child.cid, self.offset, child.blocksize));
            self.pending = Some(Pending {
                cid: child.cid,
                depth: frame.child_depth,
                declared: Some(child.blocksize),
            });
        }
    }
}

impl<S: BlockStore + ?Sized> Iterator for RangeTraversal<'_, S> {
    type Item = CoreResult<RangeEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<S: BlockStore + ?Sized> std::iter::FusedIterator for RangeTraversal<'_, S> {}
