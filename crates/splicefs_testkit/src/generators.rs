//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data that maintains the
//! node invariants: file nodes hold inline data or children but not both,
//! and directory links are sorted with unique names.

use proptest::prelude::*;
use splicefs_codec::{Cid, Codec, DirLink, DirectoryNode, FileChild, FileNode, Node, UnixTime};
use std::collections::BTreeMap;

/// Strategy for generating identifiers of either codec.
pub fn cid_strategy() -> impl Strategy<Value = Cid> {
    (
        prop_oneof![Just(Codec::Raw), Just(Codec::DagPb)],
        prop::array::uniform32(any::<u8>()),
    )
        .prop_map(|(codec, digest)| Cid::new_v1(codec, digest))
}

/// Strategy for generating valid directory entry names.
pub fn entry_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9._-][a-zA-Z0-9._ -]{0,23}").expect("Invalid regex")
}

/// Strategy for generating file content.
pub fn content_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..1024)
}

/// Strategy for generating optional modification times.
pub fn mtime_strategy() -> impl Strategy<Value = Option<UnixTime>> {
    prop::option::of(
        (any::<i64>(), prop::option::of(1u32..=999_999_999))
            .prop_map(|(seconds, nanos)| UnixTime { seconds, nanos }),
    )
}

/// Strategy for generating file node children.
pub fn file_child_strategy() -> impl Strategy<Value = FileChild> {
    (cid_strategy(), 0u64..1 << 40).prop_map(|(cid, blocksize)| FileChild {
        cid,
        tsize: blocksize,
        blocksize,
    })
}

/// Strategy for generating file nodes, inline or linked.
pub fn file_node_strategy() -> impl Strategy<Value = FileNode> {
    let body = prop_oneof![
        content_strategy().prop_map(|data| FileNode::inline(data)),
        prop::collection::vec(file_child_strategy(), 1..16).prop_map(FileNode::from_children),
    ];
    (body, prop::option::of(0u32..0o7777), mtime_strategy()).prop_map(|(mut node, mode, mtime)| {
        node.mode = mode;
        node.mtime = mtime;
        node
    })
}

/// Strategy for generating directory nodes with sorted, unique names.
pub fn directory_node_strategy() -> impl Strategy<Value = DirectoryNode> {
    (
        prop::collection::btree_map(entry_name_strategy(), (cid_strategy(), 0u64..1 << 48), 0..16),
        prop::option::of(0u32..0o7777),
        mtime_strategy(),
    )
        .prop_map(|(entries, mode, mtime): (BTreeMap<_, _>, _, _)| DirectoryNode {
            links: entries
                .into_iter()
                .map(|(name, (cid, tsize))| DirLink { name, cid, tsize })
                .collect(),
            mode,
            mtime,
        })
}

/// Strategy for generating nodes of either kind.
pub fn node_strategy() -> impl Strategy<Value = Node> {
    prop_oneof![
        file_node_strategy().prop_map(Node::File),
        directory_node_strategy().prop_map(Node::Directory),
    ]
}

/// Strategy for generating a source length with split offsets inside it.
///
/// Offsets are unsorted and may include the length itself, which
/// normalizes away; interior duplicates are avoided.
pub fn split_plan_strategy() -> impl Strategy<Value = (u64, Vec<u64>)> {
    (16u64..10_000).prop_flat_map(|total| {
        (
            Just(total),
            prop::collection::btree_set(1..=total, 0..8)
                .prop_map(|set| set.into_iter().collect::<Vec<_>>())
                .prop_shuffle(),
        )
    })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
