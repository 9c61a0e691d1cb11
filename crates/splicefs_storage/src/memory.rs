//! In-memory block backend for testing.

use crate::backend::BlockBackend;
use crate::error::StorageResult;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory block backend.
///
/// This backend keeps every block in a hash map and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use splicefs_storage::{BlockBackend, InMemoryBackend};
///
/// let backend = InMemoryBackend::new();
/// backend.put(b"k", b"test data").unwrap();
/// assert!(backend.contains(b"k").unwrap());
/// assert_eq!(backend.block_count().unwrap(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    blocks: RwLock<HashMap<Vec<u8>, Bytes>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of bytes held across all blocks.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.blocks.read().values().map(Bytes::len).sum()
    }

    /// Returns a copy of all stored keys.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.blocks.read().keys().cloned().collect()
    }

    /// Removes every block.
    pub fn clear(&self) {
        self.blocks.write().clear();
    }
}

impl BlockBackend for InMemoryBackend {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        Ok(self.blocks.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], data: &[u8]) -> StorageResult<()> {
        let mut blocks = self.blocks.write();
        if !blocks.contains_key(key) {
            blocks.insert(key.to_vec(), Bytes::copy_from_slice(data));
        }
        Ok(())
    }

    fn contains(&self, key: &[u8]) -> StorageResult<bool> {
        Ok(self.blocks.read().contains_key(key))
    }

    fn block_count(&self) -> StorageResult<usize> {
        Ok(self.blocks.read().len())
    }

    fn flush(&self) -> StorageResult<()> {
        // Nothing is buffered
        Ok(())
    }
}
