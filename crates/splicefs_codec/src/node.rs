//! Composite nodes: chunked files and plain directories.
//!
//! A [`Node`] is the semantic view of a dag-pb block whose payload is a
//! UnixFS `Data` message. Encoding is deterministic, so equal nodes always
//! hash to the same identifier.

use crate::cid::Cid;
use crate::error::{CodecError, CodecResult};
use crate::pb::{PbLink, PbNode};
use crate::unixfs::{DataType, UnixFsData, UnixTime};
use crate::{Decode, Encode};

/// One child of a chunked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChild {
    /// The child block.
    pub cid: Cid,
    /// Link size hint written into the dag-pb link.
    pub tsize: u64,
    /// Logical byte length the child contributes to the file.
    pub blocksize: u64,
}

/// A file node.
///
/// Either holds its bytes inline or lists children whose logical sizes add
/// up to the file length. A node with neither is the empty file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileNode {
    /// Inline content.
    pub data: Vec<u8>,
    /// Ordered children.
    pub children: Vec<FileChild>,
    /// Unix permission bits.
    pub mode: Option<u32>,
    /// Modification time.
    pub mtime: Option<UnixTime>,
}

impl FileNode {
    /// A file holding `data` inline.
    #[must_use]
    pub fn inline(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// A file made of `children`, in order.
    #[must_use]
    pub fn from_children(children: Vec<FileChild>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    /// Returns whether the content lives in this node.
    #[must_use]
    pub fn is_inline(&self) -> bool {
        self.children.is_empty()
    }

    /// Logical file length.
    #[must_use]
    pub fn file_size(&self) -> u64 {
        if self.is_inline() {
            self.data.len() as u64
        } else {
            self.children.iter().map(|c| c.blocksize).sum()
        }
    }
}

/// A named directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirLink {
    /// Entry name; never empty and never containing `/`.
    pub name: String,
    /// Target file or directory.
    pub cid: Cid,
    /// Logical size of the target subtree.
    pub tsize: u64,
}

/// A plain directory node. Links are kept sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryNode {
    /// Entries, byte-wise ascending by name.
    pub links: Vec<DirLink>,
    /// Unix permission bits.
    pub mode: Option<u32>,
    /// Modification time.
    pub mtime: Option<UnixTime>,
}

impl DirectoryNode {
    /// Sum of the entries' sizes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.links.iter().map(|l| l.tsize).sum()
    }

    /// Finds an entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DirLink> {
        self.links
            .binary_search_by(|l| l.name.as_bytes().cmp(name.as_bytes()))
            .ok()
            .map(|i| &self.links[i])
    }
}

/// A decoded composite node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// File node.
    File(FileNode),
    /// Directory node.
    Directory(DirectoryNode),
}

impl Node {
    /// Returns whether this is a directory.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    /// Returns the modification time.
    #[must_use]
    pub fn mtime(&self) -> Option<UnixTime> {
        match self {
            Self::File(f) => f.mtime,
            Self::Directory(d) => d.mtime,
        }
    }
}

impl Encode for FileNode {
    fn encode(&self) -> Vec<u8> {
        let mut meta = UnixFsData::new(DataType::File);
        meta.data.clone_from(&self.data);
        meta.filesize = Some(self.file_size());
        meta.blocksizes = self.children.iter().map(|c| c.blocksize).collect();
        meta.mode = self.mode;
        meta.mtime = self.mtime;

        PbNode {
            links: self
                .children
                .iter()
                .map(|c| PbLink {
                    hash: c.cid,
                    name: Some(String::new()),
                    tsize: Some(c.tsize),
                })
                .collect(),
            data: Some(meta.encode()),
        }
        .encode()
    }
}

impl Encode for DirectoryNode {
    fn encode(&self) -> Vec<u8> {
        let mut meta = UnixFsData::new(DataType::Directory);
        meta.mode = self.mode;
        meta.mtime = self.mtime;

        PbNode {
            links: self
                .links
                .iter()
                .map(|l| PbLink {
                    hash: l.cid,
                    name: Some(l.name.clone()),
                    tsize: Some(l.tsize),
                })
                .collect(),
            data: Some(meta.encode()),
        }
        .encode()
    }
}

impl Encode for Node {
    fn encode(&self) -> Vec<u8> {
        match self {
            Self::File(f) => f.encode(),
            Self::Directory(d) => d.encode(),
        }
    }
}

impl Decode for Node {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let pb = PbNode::decode(bytes)?;
        let payload = pb
            .data
            .as_deref()
            .ok_or_else(|| CodecError::invalid_structure("dag-pb node without UnixFS data"))?;
        let meta = UnixFsData::decode(payload)?;

        match meta.data_type {
            DataType::File | DataType::Raw => decode_file(pb.links, meta).map(Self::File),
            DataType::Directory => Ok(Self::Directory(decode_directory(pb.links, meta))),
            DataType::Symlink => Err(CodecError::unsupported_type("symlink")),
            DataType::Metadata => Err(CodecError::unsupported_type("metadata")),
            DataType::HamtShard => Err(CodecError::unsupported_type("HAMT shard")),
        }
    }
}

fn decode_file(links: Vec<PbLink>, meta: UnixFsData) -> CodecResult<FileNode> {
    if links.len() != meta.blocksizes.len() {
        return Err(CodecError::invalid_structure(format!(
            "file node has {} links but {} blocksizes",
            links.len(),
            meta.blocksizes.len()
        )));
    }
    if !links.is_empty() && !meta.data.is_empty() {
        return Err(CodecError::invalid_structure(
            "file node mixes inline data with children",
        ));
    }

    let node = FileNode {
        children: links
            .into_iter()
            .zip(meta.blocksizes)
            .map(|(link, blocksize)| FileChild {
                cid: link.hash,
                tsize: link.tsize.unwrap_or(blocksize),
                blocksize,
            })
            .collect(),
        data: meta.data,
        mode: meta.mode,
        mtime: meta.mtime,
    };

    if let Some(declared) = meta.filesize {
        let actual = node.file_size();
        if declared != actual {
            return Err(CodecError::invalid_structure(format!(
                "file node declares {declared} bytes but holds {actual}"
            )));
        }
    }
    Ok(node)
}

fn decode_directory(links: Vec<PbLink>, meta: UnixFsData) -> DirectoryNode {
    DirectoryNode {
        links: links
            .into_iter()
            .map(|link| DirLink {
                name: link.name.unwrap_or_default(),
                cid: link.hash,
                tsize: link.tsize.unwrap_or(0),
            })
            .collect(),
        mode: meta.mode,
        mtime: meta.mtime,
    }
}
