//! File-based block backend for persistent storage.
//!
//! Layout of a store directory:
//!
//! ```text
//! <root>/
//! ├─ LOCK                      # Advisory lock (exclusive writer / shared readers)
//! └─ blocks/
//!    └─ <shard>/<hex key>.data # One file per block
//! ```
//!
//! The shard is the two hex digits preceding the last digit of the key, which
//! spreads keys that share a hash prefix evenly across directories.

use crate::backend::BlockBackend;
use crate::error::{StorageError, StorageResult};
use bytes::Bytes;
use fs2::FileExt;
use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

const LOCK_FILE: &str = "LOCK";
const BLOCKS_DIR: &str = "blocks";
const BLOCK_EXT: &str = "data";
const TMP_PREFIX: &str = ".tmp-";

/// A file-based block backend.
///
/// Each block lives in its own file; writes go to a temporary file that is
/// renamed into place, so a crash never leaves a partially written block
/// under its final name.
///
/// # Locking
///
/// [`FileBackend::open`] takes an exclusive advisory lock on the store and
/// [`FileBackend::open_read_only`] a shared one. Writers and readers from
/// other processes are refused with [`StorageError::Locked`].
///
/// # Example
///
/// ```no_run
/// use splicefs_storage::{BlockBackend, FileBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::open(Path::new(".splicefs")).unwrap();
/// backend.put(b"key", b"persistent data").unwrap();
/// backend.flush().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    root: PathBuf,
    read_only: bool,
    tmp_counter: AtomicU64,
    _lock_file: File,
}

impl FileBackend {
    /// Opens or creates a writable store rooted at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, if `path` is
    /// not a directory, or if another process holds the lock.
    pub fn open(path: &Path) -> StorageResult<Self> {
        fs::create_dir_all(path.join(BLOCKS_DIR))?;
        Self::open_inner(path, false)
    }

    /// Opens an existing store for reading only.
    ///
    /// # Errors
    ///
    /// Returns an error if the store does not exist or a writer holds the lock.
    pub fn open_read_only(path: &Path) -> StorageResult<Self> {
        if !path.join(BLOCKS_DIR).is_dir() {
            return Err(StorageError::InvalidLocation {
                path: path.to_path_buf(),
                message: "no block store found".to_string(),
            });
        }
        Self::open_inner(path, true)
    }

    fn open_inner(path: &Path, read_only: bool) -> StorageResult<Self> {
        if !path.is_dir() {
            return Err(StorageError::InvalidLocation {
                path: path.to_path_buf(),
                message: "not a directory".to_string(),
            });
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;

        let locked = if read_only {
            FileExt::try_lock_shared(&lock_file)
        } else {
            FileExt::try_lock_exclusive(&lock_file)
        };
        if locked.is_err() {
            return Err(StorageError::Locked {
                path: path.to_path_buf(),
            });
        }

        tracing::debug!(root = %path.display(), read_only, "opened file block store");

        Ok(Self {
            root: path.to_path_buf(),
            read_only,
            tmp_counter: AtomicU64::new(0),
            _lock_file: lock_file,
        })
    }

    /// Returns the store root directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Returns whether this handle refuses writes.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn block_path(&self, key: &[u8]) -> PathBuf {
        let name = hex_encode(key);
        let shard = shard_of(&name);
        self.root
            .join(BLOCKS_DIR)
            .join(shard)
            .join(format!("{name}.{BLOCK_EXT}"))
    }
}

impl BlockBackend for FileBackend {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Bytes>> {
        match fs::read(self.block_path(key)) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &[u8], data: &[u8]) -> StorageResult<()> {
        if self.read_only {
            return Err(StorageError::Io(std::io::Error::new(
                ErrorKind::PermissionDenied,
                "store opened read-only",
            )));
        }

        let path = self.block_path(key);
        if path.exists() {
            return Ok(());
        }
        let dir = path
            .parent()
            .ok_or_else(|| StorageError::Corrupted(format!("bad block path {}", path.display())))?;
        fs::create_dir_all(dir)?;

        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let tmp = dir.join(format!("{TMP_PREFIX}{}-{n}", std::process::id()));
        write_atomically(&tmp, &path, data)?;

        tracing::trace!(block = %path.display(), len = data.len(), "wrote block");
        Ok(())
    }

    fn contains(&self, key: &[u8]) -> StorageResult<bool> {
        Ok(self.block_path(key).is_file())
    }

    fn block_count(&self) -> StorageResult<usize> {
        let mut count = 0;
        for shard in fs::read_dir(self.root.join(BLOCKS_DIR))? {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            for entry in fs::read_dir(shard.path())? {
                let entry = entry?;
                if entry.path().extension().is_some_and(|ext| ext == BLOCK_EXT) {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    fn flush(&self) -> StorageResult<()> {
        // Blocks are synced as they are written; make the renames durable.
        #[cfg(unix)]
        {
            let blocks = self.root.join(BLOCKS_DIR);
            for shard in fs::read_dir(&blocks)? {
                let shard = shard?;
                if shard.file_type()?.is_dir() {
                    File::open(shard.path())?.sync_all()?;
                }
            }
            File::open(blocks)?.sync_all()?;
        }
        Ok(())
    }
}

/// Writes `data` to `tmp`, syncs it and renames it to `path`.
///
/// On failure the temporary file is removed.
fn write_atomically(tmp: &Path, path: &Path, data: &[u8]) -> StorageResult<()> {
    let result = File::create(tmp)
        .and_then(|mut file| {
            file.write_all(data)?;
            file.sync_data()
        })
        .and_then(|()| fs::rename(tmp, path));
    if let Err(e) = result {
        let _ = fs::remove_file(tmp);
        return Err(e.into());
    }
    Ok(())
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

fn shard_of(name: &str) -> &str {
    let len = name.len();
    if len < 3 {
        return "_";
    }
    &name[len - 3..len - 1]
}
