//! Fixed-size chunked importer with a balanced layout.
//!
//! This is the default chunking policy behind
//! [`BlockStore::ingest_chunked`]. Leaves are raw blocks of
//! `chunk_size` bytes (the last may be shorter). Leaves are grouped into
//! file nodes of at most `max_children` links, level by level, until one
//! root remains. A single leaf is its own root.

use crate::config::ImportOptions;
use crate::error::CoreResult;
use crate::store::BlockStore;
use splicefs_codec::{Cid, Encode, FileChild, FileNode};
use std::io::{ErrorKind, Read};

/// A built subtree: its root, logical length, and cumulative encoded size.
#[derive(Debug, Clone, Copy)]
struct Subtree {
    cid: Cid,
    len: u64,
    tsize: u64,
}

/// Imports everything `source` yields.
///
/// Returns the root identifier and the number of bytes read. An empty
/// source produces the empty raw block.
///
/// # Errors
///
/// Returns an error on invalid options, source read failures, or store
/// write failures.
pub fn import<S: BlockStore + ?Sized>(
    store: &S,
    source: &mut dyn Read,
    options: &ImportOptions,
) -> CoreResult<(Cid, u64)> {
    options.validate()?;

    let mut level = Vec::new();
    let mut buf = vec![0u8; options.chunk_size];
    loop {
        let n = fill(source, &mut buf)?;
        if n == 0 && !level.is_empty() {
            break;
        }
        let cid = store.put(&buf[..n])?;
        level.push(Subtree {
            cid,
            len: n as u64,
            tsize: n as u64,
        });
        if n < buf.len() {
            break;
        }
    }

    while level.len() > 1 {
        level = level
            .chunks(options.max_children)
            .map(|group| build_parent(store, group))
            .collect::<CoreResult<_>>()?;
    }

    // The loop above always leaves exactly one subtree.
    let root = level[0];
    tracing::debug!(cid = %root.cid, len = root.len, "imported");
    Ok((root.cid, root.len))
}

fn build_parent<S: BlockStore + ?Sized>(store: &S, group: &[Subtree]) -> CoreResult<Subtree> {
    let node = FileNode::from_children(
        group
            .iter()
            .map(|s| FileChild {
                cid: s.cid,
                tsize: s.tsize,
                blocksize: s.len,
            })
            .collect(),
    );
    let bytes = node.encode();
    let cid = store.put_composite(&bytes)?;
    Ok(Subtree {
        cid,
        len: node.file_size(),
        tsize: bytes.len() as u64 + group.iter().map(|s| s.tsize).sum::<u64>(),
    })
}

/// Reads until `buf` is full or the source is exhausted.
fn fill(source: &mut dyn Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
