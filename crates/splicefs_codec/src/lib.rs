//! # splicefs Codec
//!
//! Content identifiers and the composite-node block format.
//!
//! Composite nodes are dag-pb blocks carrying a UnixFS `Data` payload, so
//! identifiers computed here match any other implementation that reads the
//! same logical tree. The crate is layered:
//!
//! - [`encoder`] / [`decoder`]: protobuf wire primitives
//! - [`pb`]: the dag-pb envelope (`PBNode`, `PBLink`)
//! - [`unixfs`]: the UnixFS `Data` message
//! - [`node`]: the semantic [`Node`] (file or directory)
//! - [`cid`]: sha2-256 content identifiers with base32 / base58 text forms
//!
//! ## Encoding Rules
//!
//! - Links are written before data
//! - Fields are written in field-number order
//! - File links always carry an empty name and a size
//! - Directory nodes carry no inline data
//!
//! ## Usage
//!
//! ```
//! use splicefs_codec::{Cid, Codec, Decode, DirLink, DirectoryNode, Encode, Node};
//!
//! let file = Cid::hash(Codec::Raw, b"hello world");
//! let dir = DirectoryNode {
//!     links: vec![DirLink { name: "hello.txt".into(), cid: file, tsize: 11 }],
//!     ..DirectoryNode::default()
//! };
//!
//! let bytes = dir.encode();
//! let decoded = Node::decode(&bytes).unwrap();
//! assert_eq!(decoded, Node::Directory(dir));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cid;
pub mod decoder;
pub mod encoder;
mod error;
mod multibase;
pub mod node;
pub mod pb;
pub mod unixfs;

pub use cid::{Cid, Codec, Version};
pub use error::{CodecError, CodecResult};
pub use multibase::{base32_decode, base32_encode, base58_decode, base58_encode};
pub use node::{DirLink, DirectoryNode, FileChild, FileNode, Node};
pub use pb::{PbLink, PbNode};
pub use unixfs::{DataType, UnixFsData, UnixTime};

/// Types with a deterministic binary encoding.
pub trait Encode {
    /// Encodes this value.
    fn encode(&self) -> Vec<u8>;
}

/// Types that can be decoded from their binary encoding.
pub trait Decode: Sized {
    /// Decodes a value from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid encoding.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

/// Encodes a node and derives its identifier.
#[must_use]
pub fn encode_node(node: &Node) -> (Cid, Vec<u8>) {
    let bytes = node.encode();
    (Cid::hash(Codec::DagPb, &bytes), bytes)
}
