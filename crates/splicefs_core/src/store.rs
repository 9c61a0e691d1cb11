//! The block store collaborator.
//!
//! Every composer, ingestion, traversal and synthesis call takes the store
//! as an explicit parameter. [`BlockStore`] is the narrow interface they
//! need; [`Blockstore`] implements it over any [`BlockBackend`].

use crate::config::ImportOptions;
use crate::error::{CoreError, CoreResult};
use crate::importer;
use crate::reader::ContentReader;
use bytes::Bytes;
use splicefs_codec::{Cid, Codec};
use splicefs_storage::{BlockBackend, FileBackend, InMemoryBackend, StorageError};
use std::io::Read;
use std::path::Path;

/// A lazy sequence of byte chunks.
pub type ByteStream<'a> = Box<dyn Iterator<Item = CoreResult<Bytes>> + 'a>;

/// A content-addressed block store.
///
/// Identifier derivation is store-owned and deterministic. Implementations
/// must be safe to share between threads; all operations take `&self`.
pub trait BlockStore: Send + Sync {
    /// Fetches a block.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the store has no such block.
    fn get(&self, cid: &Cid) -> CoreResult<Bytes>;

    /// Stores a raw block and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the block cannot be written.
    fn put(&self, data: &[u8]) -> CoreResult<Cid>;

    /// Stores an encoded composite node and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the block cannot be written.
    fn put_composite(&self, node: &[u8]) -> CoreResult<Cid>;

    /// Returns whether the store holds a block.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    fn has(&self, cid: &Cid) -> CoreResult<bool>;

    /// Chunks and stores everything `source` yields, returning the root
    /// identifier and the number of bytes stored.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the source or writing a block fails.
    fn ingest_chunked(
        &self,
        source: &mut dyn Read,
        options: &ImportOptions,
    ) -> CoreResult<(Cid, u64)> {
        importer::import(self, source, options)
    }

    /// Streams the content of a file in order.
    fn read_stream<'a>(&'a self, cid: &Cid) -> ByteStream<'a> {
        Box::new(ContentReader::new(self, *cid))
    }
}

impl<T: BlockStore + ?Sized> BlockStore for &T {
    fn get(&self, cid: &Cid) -> CoreResult<Bytes> {
        (**self).get(cid)
    }

    fn put(&self, data: &[u8]) -> CoreResult<Cid> {
        (**self).put(data)
    }

    fn put_composite(&self, node: &[u8]) -> CoreResult<Cid> {
        (**self).put_composite(node)
    }

    fn has(&self, cid: &Cid) -> CoreResult<bool> {
        (**self).has(cid)
    }

    fn ingest_chunked(
        &self,
        source: &mut dyn Read,
        options: &ImportOptions,
    ) -> CoreResult<(Cid, u64)> {
        (**self).ingest_chunked(source, options)
    }

    fn read_stream<'a>(&'a self, cid: &Cid) -> ByteStream<'a> {
        (**self).read_stream(cid)
    }
}

/// A local block store over a key/value backend.
///
/// Blocks are keyed by the binary form of their version-1 identifier, so
/// version-0 links resolve to the same blocks. Fetched blocks are checked
/// against their digest.
pub struct Blockstore<B: BlockBackend> {
    backend: B,
}

impl<B: BlockBackend> Blockstore<B> {
    /// Wraps a backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the number of stored blocks.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be enumerated.
    pub fn block_count(&self) -> CoreResult<usize> {
        Ok(self.backend.block_count()?)
    }

    /// Makes all writes durable.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to flush.
    pub fn flush(&self) -> CoreResult<()> {
        Ok(self.backend.flush()?)
    }

    fn store(&self, codec: Codec, data: &[u8]) -> CoreResult<Cid> {
        let cid = Cid::hash(codec, data);
        self.backend.put(&cid.to_bytes(), data)?;
        tracing::trace!(%cid, len = data.len(), "put block");
        Ok(cid)
    }
}

impl Blockstore<InMemoryBackend> {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(InMemoryBackend::new())
    }
}

impl Blockstore<FileBackend> {
    /// Opens or creates a store directory for writing.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be opened or is locked.
    pub fn open(path: &Path) -> CoreResult<Self> {
        Ok(Self::new(FileBackend::open(path)?))
    }

    /// Opens an existing store directory for reading.
    ///
    /// # Errors
    ///
    /// Returns an error if no store exists at `path` or a writer holds it.
    pub fn open_read_only(path: &Path) -> CoreResult<Self> {
        Ok(Self::new(FileBackend::open_read_only(path)?))
    }
}

impl<B: BlockBackend> BlockStore for Blockstore<B> {
    fn get(&self, cid: &Cid) -> CoreResult<Bytes> {
        let data = self
            .backend
            .get(&cid.to_v1().to_bytes())?
            .ok_or(CoreError::NotFound { cid: *cid })?;
        if !cid.verifies(&data) {
            return Err(StorageError::Corrupted(format!("block {cid} fails its digest")).into());
        }
        tracing::trace!(%cid, len = data.len(), "get block");
        Ok(data)
    }

    fn put(&self, data: &[u8]) -> CoreResult<Cid> {
        self.store(Codec::Raw, data)
    }

    fn put_composite(&self, node: &[u8]) -> CoreResult<Cid> {
        self.store(Codec::DagPb, node)
    }

    fn has(&self, cid: &Cid) -> CoreResult<bool> {
        Ok(self.backend.contains(&cid.to_v1().to_bytes())?)
    }
}
