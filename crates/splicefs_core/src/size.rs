//! Node loading and logical size resolution.

use crate::error::{CoreError, CoreResult};
use crate::store::BlockStore;
use splicefs_codec::{Cid, Decode, Node};

/// Fetches and decodes a composite node.
///
/// # Errors
///
/// Returns [`CoreError::NotFound`] for a missing block and
/// [`CoreError::Format`] for undecodable bytes.
pub fn load_node<S: BlockStore + ?Sized>(store: &S, cid: &Cid) -> CoreResult<Node> {
    let bytes = store.get(cid)?;
    Ok(Node::decode(&bytes)?)
}

/// Computes the logical byte length an identifier represents.
///
/// Raw blocks are measured without decoding. Files report their inline
/// length or the sum of their children's logical sizes. Directories report
/// the sum of their entry sizes when `allow_dir` is set and fail with
/// [`CoreError::NotAFile`] otherwise. Nothing is cached.
///
/// # Errors
///
/// Returns an error if a block is missing or malformed, or on a directory
/// when directories are not allowed.
pub fn resolve_size<S: BlockStore + ?Sized>(
    store: &S,
    cid: &Cid,
    allow_dir: bool,
) -> CoreResult<u64> {
    if cid.is_raw() {
        return Ok(store.get(cid)?.len() as u64);
    }
    match load_node(store, cid)? {
        Node::File(file) => Ok(file.file_size()),
        Node::Directory(dir) if allow_dir => Ok(dir.total_size()),
        Node::Directory(_) => Err(CoreError::NotAFile { cid: *cid }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Blockstore;
    use splicefs_codec::{DirLink, DirectoryNode, Encode, FileChild, FileNode};

    #[test]
    fn raw_size_is_block_length() {
        let store = Blockstore::in_memory();
        let cid = store.put(b"twelve bytes").unwrap();
        assert_eq!(resolve_size(&store, &cid, false).unwrap(), 12);
    }

    #[test]
    fn inline_file_size() {
        let store = Blockstore::in_memory();
        let cid = store
            .put_composite(&FileNode::inline(b"abcde".to_vec()).encode())
            .unwrap();
        assert_eq!(resolve_size(&store, &cid, false).unwrap(), 5);
    }

    #[test]
    fn chunked_file_size_sums_blocksizes() {
        let store = Blockstore::in_memory();
        let a = store.put(b"abc").unwrap();
        let b = store.put(b"de").unwrap();
        let node = FileNode::from_children(vec![
            FileChild {
                cid: a,
                tsize: 3,
                blocksize: 3,
            },
            FileChild {
                cid: b,
                tsize: 2,
                blocksize: 2,
            },
        ]);
        let cid = store.put_composite(&node.encode()).unwrap();
        assert_eq!(resolve_size(&store, &cid, false).unwrap(), 5);
    }

    #[test]
    fn directory_needs_permission() {
        let store = Blockstore::in_memory();
        let file = store.put(b"x").unwrap();
        let dir = DirectoryNode {
            links: vec![DirLink {
                name: "x".into(),
                cid: file,
                tsize: 1,
            }],
            ..DirectoryNode::default()
        };
        let cid = store.put_composite(&dir.encode()).unwrap();

        assert!(matches!(
            resolve_size(&store, &cid, false),
            Err(CoreError::NotAFile { .. })
        ));
        assert_eq!(resolve_size(&store, &cid, true).unwrap(), 1);
    }

    #[test]
    fn malformed_node_is_format_error() {
        let store = Blockstore::in_memory();
        let cid = store.put_composite(b"\xff\xff").unwrap();
        assert!(matches!(
            resolve_size(&store, &cid, true),
            Err(CoreError::Format(_))
        ));
    }
}
