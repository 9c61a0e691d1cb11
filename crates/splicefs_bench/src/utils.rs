//! Benchmark utilities.

use rand::Rng;
use splicefs_codec::{Cid, Codec, DirLink, DirectoryNode, FileChild, FileNode};
use splicefs_core::{split_add, BlockStore, Config, CoreResult};
use std::io::Cursor;

/// Generate random content of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate random raw-block identifiers.
pub fn random_cids(count: usize) -> Vec<Cid> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| Cid::new_v1(Codec::Raw, rng.gen()))
        .collect()
}

/// A file node linking `count` children of `blocksize` bytes each.
pub fn wide_file(count: usize, blocksize: u64) -> FileNode {
    FileNode::from_children(
        random_cids(count)
            .into_iter()
            .map(|cid| FileChild {
                cid,
                tsize: blocksize,
                blocksize,
            })
            .collect(),
    )
}

/// A directory of `count` sorted entries.
pub fn wide_directory(count: usize) -> DirectoryNode {
    DirectoryNode {
        links: random_cids(count)
            .into_iter()
            .enumerate()
            .map(|(i, cid)| DirLink {
                name: format!("file_{i:06}"),
                cid,
                tsize: 1024,
            })
            .collect(),
        ..DirectoryNode::default()
    }
}

/// Stores `size` random bytes split every `segment` bytes.
pub fn store_segmented<S: BlockStore>(
    store: &S,
    size: usize,
    segment: usize,
    config: &Config,
) -> CoreResult<Cid> {
    let data = random_data(size);
    let offsets: Vec<u64> = (segment..size).step_by(segment.max(1)).map(|o| o as u64).collect();
    let out = split_add(store, Cursor::new(data), size as u64, &offsets, config, |_| Ok(()))?;
    Ok(out.cid)
}
