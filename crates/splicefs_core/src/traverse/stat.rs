//! Path lookup below a root identifier.

use super::directory::{seconds, traverse_directory, DirEntry};
use crate::error::{CoreError, CoreResult};
use crate::size::load_node;
use crate::store::BlockStore;
use splicefs_codec::{Cid, Node};

/// Splits `<cid>[/<path>]` into the root identifier and a normalized path.
///
/// The path keeps its leading `/`; a trailing `/` is dropped and an empty
/// path means the root itself.
///
/// # Errors
///
/// Returns [`CoreError::InvalidCid`] if the root does not parse.
pub fn parse_path(text: &str) -> CoreResult<(Cid, String)> {
    let text = text.strip_prefix("/ipfs/").unwrap_or(text);
    let (root, rest) = match text.find('/') {
        Some(i) => text.split_at(i),
        None => (text, ""),
    };
    let cid = root
        .parse()
        .map_err(|e: splicefs_codec::CodecError| CoreError::invalid_cid(root, e.to_string()))?;
    Ok((cid, rest.trim_end_matches('/').to_string()))
}

/// Looks up `<cid>[/<path>]`.
///
/// Walks the root with directory markers included and returns the first
/// entry whose path matches. An empty path returns the root itself; a
/// directory root is reported with the sum of its entry sizes. Returns
/// `None` when nothing matches.
///
/// # Errors
///
/// Returns an error for an unparsable root or when a block on the walk is
/// missing or malformed.
pub fn stat<S: BlockStore + ?Sized>(store: &S, path: &str) -> CoreResult<Option<DirEntry>> {
    let (root, subpath) = parse_path(path)?;

    if subpath.is_empty() {
        return root_entry(store, root).map(Some);
    }

    for entry in traverse_directory(store, &root, "", true) {
        let entry = entry?;
        if entry.path == subpath {
            return Ok(Some(entry));
        }
    }
    Ok(None)
}

fn root_entry<S: BlockStore + ?Sized>(store: &S, cid: Cid) -> CoreResult<DirEntry> {
    if cid.is_raw() {
        return Ok(DirEntry {
            cid,
            path: String::new(),
            size: store.get(&cid)?.len() as u64,
            mtime: 0,
            is_dir: false,
        });
    }
    let node = load_node(store, &cid)?;
    let (size, is_dir) = match &node {
        Node::File(file) => (file.file_size(), false),
        Node::Directory(dir) => (dir.total_size(), true),
    };
    Ok(DirEntry {
        cid,
        path: String::new(),
        size,
        mtime: seconds(node.mtime()),
        is_dir,
    })
}
