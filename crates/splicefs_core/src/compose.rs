//! Building new composite nodes from existing identifiers.
//!
//! Nothing here copies content. A concatenation is a file node whose
//! children are the inputs; a directory is a node of named links. Stored
//! nodes are never modified: [`add_to_dir`] produces a new directory and
//! leaves the old one addressable.

use crate::error::{CoreError, CoreResult};
use crate::size::{load_node, resolve_size};
use crate::store::BlockStore;
use splicefs_codec::{Cid, DirLink, DirectoryNode, Encode, FileChild, FileNode, Node};
use std::collections::{HashMap, HashSet};

/// Logical sizes already known to the caller, keyed by identifier.
pub type KnownSizes = HashMap<Cid, u64>;

/// An entry to place in a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntryInput {
    /// The file or directory to link.
    pub cid: Cid,
    /// Its logical size, resolved from the store when absent.
    pub size: Option<u64>,
}

impl DirEntryInput {
    /// An entry whose size will be resolved.
    #[must_use]
    pub const fn new(cid: Cid) -> Self {
        Self { cid, size: None }
    }

    /// An entry with a known size.
    #[must_use]
    pub const fn with_size(cid: Cid, size: u64) -> Self {
        Self {
            cid,
            size: Some(size),
        }
    }
}

/// Concatenates files in order, resolving every size from the store.
///
/// # Errors
///
/// See [`concat_with_sizes`].
pub fn concat<S: BlockStore + ?Sized>(store: &S, cids: &[Cid]) -> CoreResult<Cid> {
    concat_with_sizes(store, cids, &KnownSizes::new())
}

/// Concatenates files in order.
///
/// A single input is returned unchanged. Otherwise a file node is stored
/// whose blocksizes are the inputs' logical sizes, taken from `known` when
/// present and resolved from the store otherwise. Raw inputs with a known
/// size are not fetched; composite inputs are always loaded so that a
/// directory is never linked as file content.
///
/// # Errors
///
/// Returns [`CoreError::EmptyInput`] for no inputs and
/// [`CoreError::DirectoryNotAllowed`] if an input is a directory.
pub fn concat_with_sizes<S: BlockStore + ?Sized>(
    store: &S,
    cids: &[Cid],
    known: &KnownSizes,
) -> CoreResult<Cid> {
    match cids {
        [] => return Err(CoreError::EmptyInput),
        [single] => return Ok(*single),
        _ => {}
    }

    let mut children = Vec::with_capacity(cids.len());
    for cid in cids {
        let size = match (known.get(cid), cid.is_raw()) {
            (Some(&size), true) => size,
            (None, true) => resolve_size(store, cid, false)?,
            (known_size, false) => match load_node(store, cid)? {
                Node::Directory(_) => {
                    return Err(CoreError::DirectoryNotAllowed { cid: *cid });
                }
                Node::File(file) => known_size.copied().unwrap_or_else(|| file.file_size()),
            },
        };
        children.push(FileChild {
            cid: *cid,
            tsize: size,
            blocksize: size,
        });
    }

    let node = FileNode::from_children(children);
    let cid = store.put_composite(&node.encode())?;
    tracing::debug!(%cid, parts = cids.len(), size = node.file_size(), "concatenated");
    Ok(cid)
}

/// Creates a directory from named entries.
///
/// Links are sorted by name. Sizes are resolved from the store when not
/// given, with directories permitted as entries.
///
/// # Errors
///
/// Returns [`CoreError::InvalidName`] for an empty name or one containing
/// `/`, and [`CoreError::DuplicateName`] when two entries share a name.
pub fn make_dir<S: BlockStore + ?Sized>(
    store: &S,
    entries: Vec<(String, DirEntryInput)>,
) -> CoreResult<Cid> {
    let links = build_links(store, entries, &HashSet::new())?;
    store_dir(store, DirectoryNode {
        links,
        ..DirectoryNode::default()
    })
}

/// Adds named entries to an existing directory, returning the new one.
///
/// The directory's mode and modification time carry over.
///
/// # Errors
///
/// Returns [`CoreError::NotADirectory`] if `dir` is a raw block or file,
/// and the errors of [`make_dir`]; a new name equal to an existing entry
/// is a [`CoreError::DuplicateName`].
pub fn add_to_dir<S: BlockStore + ?Sized>(
    store: &S,
    dir: &Cid,
    entries: Vec<(String, DirEntryInput)>,
) -> CoreResult<Cid> {
    if dir.is_raw() {
        return Err(CoreError::NotADirectory { cid: *dir });
    }
    let Node::Directory(mut node) = load_node(store, dir)? else {
        return Err(CoreError::NotADirectory { cid: *dir });
    };

    let existing: HashSet<&str> = node.links.iter().map(|l| l.name.as_str()).collect();
    let added = build_links(store, entries, &existing)?;
    node.links.extend(added);
    node.links.sort_by(|a, b| a.name.cmp(&b.name));
    store_dir(store, node)
}

fn build_links<S: BlockStore + ?Sized>(
    store: &S,
    entries: Vec<(String, DirEntryInput)>,
    existing: &HashSet<&str>,
) -> CoreResult<Vec<DirLink>> {
    let mut seen = HashSet::with_capacity(entries.len());
    for (name, _) in &entries {
        if name.is_empty() || name.contains('/') {
            return Err(CoreError::InvalidName { name: name.clone() });
        }
        if existing.contains(name.as_str()) || !seen.insert(name.as_str()) {
            return Err(CoreError::DuplicateName { name: name.clone() });
        }
    }

    let mut links = entries
        .into_iter()
        .map(|(name, entry)| {
            let tsize = match entry.size {
                Some(size) => size,
                None => resolve_size(store, &entry.cid, true)?,
            };
            Ok(DirLink {
                name,
                cid: entry.cid,
                tsize,
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;
    links.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(links)
}

fn store_dir<S: BlockStore + ?Sized>(store: &S, node: DirectoryNode) -> CoreResult<Cid> {
    let cid = store.put_composite(&node.encode())?;
    tracing::debug!(%cid, entries = node.links.len(), "stored directory");
    Ok(cid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Blockstore;
    use splicefs_codec::{Codec, UnixTime};

    fn names(store: &impl BlockStore, dir: &Cid) -> Vec<String> {
        match load_node(store, dir).unwrap() {
            Node::Directory(d) => d.links.into_iter().map(|l| l.name).collect(),
            Node::File(_) => panic!("expected a directory"),
        }
    }

    #[test]
    fn concat_of_one_is_identity() {
        let store = Blockstore::in_memory();
        let cid = store.put(b"only").unwrap();
        assert_eq!(concat(&store, &[cid]).unwrap(), cid);
        assert_eq!(store.block_count().unwrap(), 1);
    }

    #[test]
    fn concat_of_none_fails() {
        let store = Blockstore::in_memory();
        assert!(matches!(concat(&store, &[]), Err(CoreError::EmptyInput)));
    }

    #[test]
    fn concat_matches_known_identifier() {
        let store = Blockstore::in_memory();
        let a = store.put(b"hello world").unwrap();
        let b = store.put(b"test data").unwrap();
        let cid = concat(&store, &[a, b]).unwrap();
        assert_eq!(
            cid.to_string(),
            "bafybeiguf2ugkz37l54ufmd5gta7bd6owxodcugjgxhtppgsqhulriykbu"
        );
        assert_eq!(resolve_size(&store, &cid, false).unwrap(), 20);
    }

    #[test]
    fn concat_uses_known_sizes_without_fetching() {
        let store = Blockstore::in_memory();
        // Neither block exists; sizes come from the map.
        let a = Cid::hash(Codec::Raw, b"aaaa");
        let b = Cid::hash(Codec::Raw, b"bb");
        let known = KnownSizes::from([(a, 4), (b, 2)]);
        let cid = concat_with_sizes(&store, &[a, b], &known).unwrap();
        assert_eq!(resolve_size(&store, &cid, false).unwrap(), 6);
    }

    #[test]
    fn concat_rejects_directories() {
        let store = Blockstore::in_memory();
        let dir = make_dir(&store, Vec::new()).unwrap();
        let file = store.put(b"x").unwrap();
        assert!(matches!(
            concat(&store, &[file, dir]),
            Err(CoreError::DirectoryNotAllowed { .. })
        ));
    }

    #[test]
    fn known_size_does_not_admit_a_directory() {
        let store = Blockstore::in_memory();
        let file = store.put(b"x").unwrap();
        let dir = make_dir(&store, vec![("x".into(), DirEntryInput::new(file))]).unwrap();
        let known = KnownSizes::from([(dir, 1)]);
        let err = concat_with_sizes(&store, &[file, dir], &known).unwrap_err();
        assert!(matches!(err, CoreError::DirectoryNotAllowed { cid } if cid == dir));
        assert_eq!(err.kind(), "DirectoryNotAllowedError");
    }

    #[test]
    fn make_dir_matches_known_identifier() {
        let store = Blockstore::in_memory();
        let file: Cid = "bafkreibgqhyupecf3om6wrya5hp6gflzey345qrb5nl2zcipx5ru5smiey"
            .parse()
            .unwrap();
        let cid = make_dir(
            &store,
            vec![("iana.cdxj".to_string(), DirEntryInput::with_size(file, 5866))],
        )
        .unwrap();
        assert_eq!(
            cid.to_string(),
            "bafybeiamyttrkfzdpwyfja5ilcfpc32ekxzqqz52jdmveeh64oerggjo34"
        );
    }

    #[test]
    fn make_dir_sorts_and_resolves_sizes() {
        let store = Blockstore::in_memory();
        let b = store.put(b"bbb").unwrap();
        let a = store.put(b"a").unwrap();
        let dir = make_dir(
            &store,
            vec![
                ("b.txt".into(), DirEntryInput::new(b)),
                ("a.txt".into(), DirEntryInput::new(a)),
            ],
        )
        .unwrap();
        assert_eq!(names(&store, &dir), ["a.txt", "b.txt"]);
        assert_eq!(resolve_size(&store, &dir, true).unwrap(), 4);
    }

    #[test]
    fn make_dir_rejects_duplicates_and_bad_names() {
        let store = Blockstore::in_memory();
        let f = store.put(b"f").unwrap();
        assert!(matches!(
            make_dir(
                &store,
                vec![
                    ("x".into(), DirEntryInput::new(f)),
                    ("x".into(), DirEntryInput::new(f)),
                ]
            ),
            Err(CoreError::DuplicateName { .. })
        ));
        assert!(matches!(
            make_dir(&store, vec![("a/b".into(), DirEntryInput::new(f))]),
            Err(CoreError::InvalidName { .. })
        ));
        assert!(matches!(
            make_dir(&store, vec![(String::new(), DirEntryInput::new(f))]),
            Err(CoreError::InvalidName { .. })
        ));
    }

    #[test]
    fn add_to_dir_keeps_name_order() {
        let store = Blockstore::in_memory();
        let f = store.put(b"f").unwrap();
        let g = store.put(b"g").unwrap();
        let h = store.put(b"h").unwrap();

        let empty = make_dir(&store, Vec::new()).unwrap();
        let one = add_to_dir(&store, &empty, vec![("x".into(), DirEntryInput::new(f))]).unwrap();
        assert_eq!(names(&store, &one), ["x"]);

        let two = add_to_dir(&store, &one, vec![("y".into(), DirEntryInput::new(g))]).unwrap();
        let three = add_to_dir(&store, &two, vec![("a".into(), DirEntryInput::new(h))]).unwrap();
        assert_eq!(names(&store, &three), ["a", "x", "y"]);

        // Earlier versions stay intact.
        assert_eq!(names(&store, &one), ["x"]);
    }

    #[test]
    fn add_to_dir_rejects_existing_name() {
        let store = Blockstore::in_memory();
        let f = store.put(b"f").unwrap();
        let dir = make_dir(&store, vec![("x".into(), DirEntryInput::new(f))]).unwrap();
        assert!(matches!(
            add_to_dir(&store, &dir, vec![("x".into(), DirEntryInput::new(f))]),
            Err(CoreError::DuplicateName { .. })
        ));
    }

    #[test]
    fn add_to_dir_rejects_files() {
        let store = Blockstore::in_memory();
        let raw = store.put(b"raw").unwrap();
        assert!(matches!(
            add_to_dir(&store, &raw, Vec::new()),
            Err(CoreError::NotADirectory { .. })
        ));

        let other = store.put(b"other").unwrap();
        let file = concat(&store, &[raw, other]).unwrap();
        assert!(matches!(
            add_to_dir(&store, &file, Vec::new()),
            Err(CoreError::NotADirectory { .. })
        ));
    }

    #[test]
    fn add_to_dir_preserves_metadata() {
        let store = Blockstore::in_memory();
        let base = DirectoryNode {
            links: Vec::new(),
            mode: Some(0o755),
            mtime: Some(UnixTime::from_seconds(1_600_000_000)),
        };
        let dir = store.put_composite(&base.encode()).unwrap();
        let f = store.put(b"f").unwrap();
        let updated = add_to_dir(&store, &dir, vec![("f".into(), DirEntryInput::new(f))]).unwrap();

        let Node::Directory(node) = load_node(&store, &updated).unwrap() else {
            panic!("expected a directory");
        };
        assert_eq!(node.mode, Some(0o755));
        assert_eq!(node.mtime, base.mtime);
    }

    #[test]
    fn nested_directories_count_their_contents() {
        let store = Blockstore::in_memory();
        let f = store.put(b"12345").unwrap();
        let inner = make_dir(&store, vec![("f".into(), DirEntryInput::new(f))]).unwrap();
        let outer = make_dir(&store, vec![("sub".into(), DirEntryInput::new(inner))]).unwrap();
        assert_eq!(resolve_size(&store, &outer, true).unwrap(), 5);
    }
}
