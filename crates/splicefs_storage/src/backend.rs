//! Block backend trait definition.

use crate::error::StorageResult;
use bytes::Bytes;

/// A low-level block backend.
///
/// Backends are **opaque block stores** keyed by byte strings. They never
/// look inside a block and never derive keys themselves; the caller hands
/// in the key it computed for the block.
///
/// # Invariants
///
/// - `get` returns exactly the bytes previously passed to `put` for that key
/// - `put` of an already-present key leaves the stored block untouched
/// - A block, once stored, is never modified in place
/// - Backends must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait BlockBackend: Send + Sync {
    /// Returns the block stored under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the block exists but cannot be read.
    fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>>;

    /// Stores `data` under `key`.
    ///
    /// Storing a key that is already present succeeds without rewriting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the block cannot be written.
    fn put(&self, key: &[u8], data: &[u8]) -> StorageResult<()>;

    /// Returns whether a block is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if presence cannot be determined.
    fn contains(&self, key: &[u8]) -> StorageResult<bool>;

    /// Returns the number of stored blocks.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be enumerated.
    fn block_count(&self) -> StorageResult<usize>;

    /// Flushes pending writes to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&self) -> StorageResult<()>;
}
