//! Integration tests across composition, ingestion, traversal and archives.

use proptest::prelude::*;
use splicefs_core::{
    add_to_dir, concat, create_zip, make_dir, parse_split_points, read_to_vec, resolve_size,
    split_add, stat, traverse_directory, traverse_ranges, BlockStore, Blockstore, Cid, Config,
    CoreError, DirEntryInput, Segment, UNLIMITED_DEPTH,
};
use splicefs_codec::{Decode, Node};
use std::io::{Cursor, Read};

fn named(name: &str, cid: Cid) -> (String, DirEntryInput) {
    (name.to_string(), DirEntryInput::new(cid))
}

fn link_names<S: BlockStore>(store: &S, dir: &Cid) -> Vec<String> {
    match Node::decode(&store.get(dir).unwrap()).unwrap() {
        Node::Directory(d) => d.links.into_iter().map(|l| l.name).collect(),
        Node::File(_) => panic!("expected a directory"),
    }
}

#[test]
fn concat_of_one_is_identity() {
    let store = Blockstore::in_memory();
    let raw = store.put(b"alone").unwrap();
    assert_eq!(concat(&store, &[raw]).unwrap(), raw);

    let a = store.put(b"a").unwrap();
    let joined = concat(&store, &[a, raw]).unwrap();
    assert_eq!(concat(&store, &[joined]).unwrap(), joined);
}

#[test]
fn concat_of_nothing_fails() {
    let store = Blockstore::in_memory();
    assert!(matches!(concat(&store, &[]), Err(CoreError::EmptyInput)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn concat_size_is_sum_of_parts(parts in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 1..8)) {
        let store = Blockstore::in_memory();
        let cids: Vec<Cid> = parts.iter().map(|p| store.put(p).unwrap()).collect();
        let joined = concat(&store, &cids).unwrap();

        let total: usize = parts.iter().map(Vec::len).sum();
        prop_assert_eq!(resolve_size(&store, &joined, false).unwrap(), total as u64);
        prop_assert_eq!(read_to_vec(&store, &joined).unwrap(), parts.concat());
    }
}

#[test]
fn ranges_are_running_prefix_sums() {
    let store = Blockstore::in_memory();
    let a = store.put(&[1; 13]).unwrap();
    let b = store.put(&[2; 7]).unwrap();
    let c = store.put(&[3; 21]).unwrap();
    let joined = concat(&store, &[a, b, c]).unwrap();

    let entries: Vec<_> = traverse_ranges(&store, &joined, 1)
        .map(Result::unwrap)
        .map(|e| (e.cid, e.offset, e.length))
        .collect();
    assert_eq!(entries, vec![(a, 0, 13), (b, 13, 7), (c, 20, 21)]);
}

#[test]
fn directory_links_stay_sorted() {
    let store = Blockstore::in_memory();
    let f = store.put(b"f").unwrap();
    let g = store.put(b"g").unwrap();
    let h = store.put(b"h").unwrap();

    let empty = make_dir(&store, Vec::new()).unwrap();
    let one = add_to_dir(&store, &empty, vec![named("x", f)]).unwrap();
    assert_eq!(link_names(&store, &one), ["x"]);

    let two = add_to_dir(&store, &one, vec![named("y", g)]).unwrap();
    let three = add_to_dir(&store, &two, vec![named("a", h)]).unwrap();
    assert_eq!(link_names(&store, &three), ["a", "x", "y"]);

    // earlier versions stay addressable
    assert_eq!(link_names(&store, &one), ["x"]);
}

#[test]
fn duplicate_names_are_rejected() {
    let store = Blockstore::in_memory();
    let f = store.put(b"f").unwrap();
    let dir = make_dir(&store, vec![named("x", f)]).unwrap();
    assert!(matches!(
        add_to_dir(&store, &dir, vec![named("x", f)]),
        Err(CoreError::DuplicateName { .. })
    ));
    assert!(matches!(
        make_dir(&store, vec![named("y", f), named("y", f)]),
        Err(CoreError::DuplicateName { .. })
    ));
}

#[test]
fn split_points_formats() {
    assert_eq!(parse_split_points("[10,20,50]").unwrap(), vec![10, 20, 50]);
    assert_eq!(
        parse_split_points("{\"offset\":10}\nprefix {\"offset\":20}\n").unwrap(),
        vec![10, 20]
    );
    assert_eq!(parse_split_points("10,20,50").unwrap(), vec![10, 20, 50]);
    assert!(matches!(
        parse_split_points("ten, twenty"),
        Err(CoreError::UnparsableSplits { .. })
    ));
}

#[test]
fn ingest_reproduces_source() {
    let store = Blockstore::in_memory();
    let data: Vec<u8> = (0..100u8).collect();
    let out = split_add(
        &store,
        Cursor::new(&data),
        100,
        &[40, 70],
        &Config::new(),
        |_| Ok(()),
    )
    .unwrap();

    let lengths: Vec<u64> = out.segments.iter().map(|s| s.length).collect();
    assert_eq!(lengths, vec![40, 30, 30]);
    assert_eq!(read_to_vec(&store, &out.cid).unwrap(), data);
    assert_eq!(
        splicefs_core::plan_segments(100, &[40, 70]).unwrap(),
        vec![
            Segment { start: 0, end: 40 },
            Segment { start: 40, end: 70 },
            Segment { start: 70, end: 100 },
        ]
    );
}

#[test]
fn ingest_then_walk_then_zip() {
    let store = Blockstore::in_memory();
    let data = b"The quick brown fox jumps over the lazy dog".to_vec();
    let out = split_add(
        &store,
        Cursor::new(&data),
        data.len() as u64,
        &[10, 20],
        &Config::new(),
        |_| Ok(()),
    )
    .unwrap();

    let notes = store.put(b"notes").unwrap();
    let sub = make_dir(&store, vec![named("fox.txt", out.cid)]).unwrap();
    let root = make_dir(&store, vec![named("sub", sub), named("a", notes)]).unwrap();

    let paths: Vec<String> = traverse_directory(&store, &root, "", false)
        .map(|e| e.unwrap().path)
        .collect();
    assert_eq!(paths, ["/a", "/sub/fox.txt"]);

    let found = stat(&store, &format!("{root}/sub/fox.txt")).unwrap().unwrap();
    assert_eq!(found.cid, out.cid);
    assert_eq!(found.size, data.len() as u64);
    assert!(stat(&store, &format!("{root}/sub/missing")).unwrap().is_none());

    let archive = create_zip(&store, &root, &Config::new()).unwrap();
    let linked: Vec<Cid> = archive.parts.iter().map(|p| p.0).collect();
    assert!(linked.contains(&notes));
    assert!(linked.contains(&out.cid));
    let metadata: Vec<&Cid> = linked.iter().filter(|c| **c != notes && **c != out.cid).collect();
    assert_eq!(metadata.len(), archive.parts.len() - 2);

    let bytes = read_to_vec(&store, &archive.cid).unwrap();
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut content = String::new();
    zip.by_name("sub/fox.txt")
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    assert_eq!(content.as_bytes(), data);
}

#[test]
fn deep_traversal_matches_content() {
    let store = Blockstore::in_memory();
    let data: Vec<u8> = (0..10_000u32).map(|i| (i * 7 % 256) as u8).collect();
    let config = Config::new().chunk_size(256);
    let out = split_add(
        &store,
        Cursor::new(&data),
        data.len() as u64,
        &[1000, 5000],
        &config,
        |_| Ok(()),
    )
    .unwrap();

    let mut expected_offset = 0;
    for entry in traverse_ranges(&store, &out.cid, UNLIMITED_DEPTH) {
        let entry = entry.unwrap();
        assert_eq!(entry.offset, expected_offset);
        let block = store.get(&entry.cid).unwrap();
        let start = entry.offset as usize;
        assert_eq!(&block[..], &data[start..start + entry.length as usize]);
        expected_offset = entry.end();
    }
    assert_eq!(expected_offset, data.len() as u64);
}

#[test]
fn file_backed_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let root = {
        let store = Blockstore::open(dir.path()).unwrap();
        let a = store.put(b"on disk").unwrap();
        let root = make_dir(&store, vec![named("a", a)]).unwrap();
        store.flush().unwrap();
        root
    };

    let store = Blockstore::open_read_only(dir.path()).unwrap();
    let entry = stat(&store, &format!("{root}/a")).unwrap().unwrap();
    assert_eq!(read_to_vec(&store, &entry.cid).unwrap(), b"on disk");
}
