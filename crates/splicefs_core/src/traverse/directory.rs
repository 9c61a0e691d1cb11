//! Depth-first directory walks.

use crate::error::CoreResult;
use crate::size::{load_node, resolve_size};
use crate::store::BlockStore;
use serde::Serialize;
use splicefs_codec::{Cid, DirLink, Node, UnixTime};

/// A file or directory reached by a directory walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    /// The entry's identifier.
    pub cid: Cid,
    /// Slash-separated path relative to the walk root, e.g. `/sub/b`.
    pub path: String,
    /// Logical size; `0` for directory markers.
    pub size: u64,
    /// Modification time in seconds since the epoch, `0` when unknown.
    pub mtime: i64,
    /// Whether this is a directory marker.
    pub is_dir: bool,
}

/// Walks a directory tree depth-first in link order.
///
/// Files (raw blocks or file nodes) are leaves. Each file's path is
/// `prefix` followed by `/name` for every directory level below the root.
/// When `include_dirs` is set, every directory below the root also yields
/// a marker entry before its contents.
///
/// A raw block linked from a directory takes its size from the link and is
/// not fetched. Composite nodes are always loaded.
pub fn traverse_directory<'a, S: BlockStore + ?Sized>(
    store: &'a S,
    cid: &Cid,
    prefix: &str,
    include_dirs: bool,
) -> DirTraversal<'a, S> {
    DirTraversal {
        store,
        include_dirs,
        stack: Vec::new(),
        pending: Some(Pending {
            cid: *cid,
            path: prefix.to_string(),
            link_size: None,
        }),
        done: false,
    }
}

struct Pending {
    cid: Cid,
    path: String,
    /// Size recorded on the parent's link; `None` for the root.
    link_size: Option<u64>,
}

struct DirFrame {
    path: String,
    links: std::vec::IntoIter<DirLink>,
}

/// Iterator returned by [`traverse_directory`]; fused after an error.
pub struct DirTraversal<'a, S: BlockStore + ?Sized> {
    store: &'a S,
    include_dirs: bool,
    stack: Vec<DirFrame>,
    pending: Option<Pending>,
    done: bool,
}

impl<S: BlockStore + ?Sized> DirTraversal<'_, S> {
    fn visit(&mut self, pending: Pending) -> CoreResult<Option<DirEntry>> {
        let Pending {
            cid,
            path,
            link_size,
        } = pending;
        let is_root = link_size.is_none();

        if cid.is_raw() {
            let size = match link_size {
                Some(size) => size,
                None => resolve_size(self.store, &cid, false)?,
            };
            return Ok(Some(file_entry(cid, path, size, None)));
        }

        match load_node(self.store, &cid)? {
            Node::File(file) => Ok(Some(file_entry(cid, path, file.file_size(), file.mtime))),
            Node::Directory(dir) => {
                let marker = (self.include_dirs && !is_root).then(|| DirEntry {
                    cid,
                    path: path.clone(),
                    size: 0,
                    mtime: seconds(dir.mtime),
                    is_dir: true,
                });
                self.stack.push(DirFrame {
                    path,
                    links: dir.links.into_iter(),
                });
                Ok(marker)
            }
        }
    }

    fn step(&mut self) -> CoreResult<Option<DirEntry>> {
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
            match frame.links.next() {
                Some(link) => {
                    self.pending = Some(Pending {
                        cid: link.cid,
                        path: format!("{}/{}", frame.path, link.name),
                        link_size: Some(link.tsize),
                    });
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

fn file_entry(cid: Cid, path: String, size: u64, mtime: Option<UnixTime>) -> DirEntry {
    DirEntry {
        cid,
        path,
        size,
        mtime: seconds(mtime),
        is_dir: false,
    }
}

pub(crate) fn seconds(mtime: Option<UnixTime>) -> i64 {
    mtime.map_or(0, |t| t.seconds)
}

impl<S: BlockStore + ?Sized> Iterator for DirTraversal<'_, S> {
    type Item = CoreResult<DirEntry>;

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

impl<S: BlockStore + ?Sized> std::iter::FusedIterator for DirTraversal<'_, S> {}
