//! Configuration for ingestion, reading and archive synthesis.

use crate::error::{CoreError, CoreResult};

/// Default fixed chunk size of the importer (256 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// Default maximum number of links per importer-built file node.
pub const DEFAULT_MAX_CHILDREN: usize = 174;

/// Default buffer size for streaming ingestion sources (16 KiB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 16 * 1024;

/// Options of the store-owned chunked importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Fixed size of each leaf chunk.
    pub chunk_size: usize,
    /// Maximum number of links per file node in the balanced layout.
    pub max_children: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_children: DEFAULT_MAX_CHILDREN,
        }
    }
}

impl ImportOptions {
    /// Sets the leaf chunk size.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets the maximum links per node.
    #[must_use]
    pub const fn max_children(mut self, count: usize) -> Self {
        self.max_children = count;
        self
    }

    /// Parses a chunker description of the form `size-<bytes>`.
    ///
    /// # Errors
    ///
    /// Returns an error for any other form or a zero size.
    pub fn from_chunker(chunker: &str) -> CoreResult<Self> {
        let size = chunker
            .strip_prefix("size-")
            .ok_or_else(|| CoreError::invalid_config(format!("unsupported chunker {chunker:?}")))?;
        let size: usize = size
            .parse()
            .map_err(|_| CoreError::invalid_config(format!("bad chunk size in {chunker:?}")))?;
        let options = Self::default().chunk_size(size);
        options.validate()?;
        Ok(options)
    }

    /// Checks the options are usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk size is zero or fewer than two
    /// children are allowed per node.
    pub fn validate(&self) -> CoreResult<()> {
        if self.chunk_size == 0 {
            return Err(CoreError::invalid_config("chunk size must be positive"));
        }
        if self.max_children < 2 {
            return Err(CoreError::invalid_config(
                "nodes must allow at least two children",
            ));
        }
        Ok(())
    }
}

/// How the archive synthesizer fills in CRC-32 fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumMode {
    /// Stream each file's content to compute its CRC-32.
    #[default]
    Stream,
    /// Write zero checksums without reading any content.
    Skip,
}

/// Configuration shared by the core operations.
#[derive(Debug, Clone)]
pub struct Config {
    /// Importer options for ingested segments and archive metadata.
    pub import: ImportOptions,
    /// Archive checksum mode.
    pub checksum: ChecksumMode,
    /// Buffer size for reading ingestion sources.
    pub read_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            import: ImportOptions::default(),
            checksum: ChecksumMode::Stream,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the importer options.
    #[must_use]
    pub const fn import(mut self, import: ImportOptions) -> Self {
        self.import = import;
        self
    }

    /// Sets the importer chunk size.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.import.chunk_size = size;
        self
    }

    /// Sets the archive checksum mode.
    #[must_use]
    pub const fn checksum(mut self, mode: ChecksumMode) -> Self {
        self.checksum = mode;
        self
    }

    /// Sets the source read buffer size.
    #[must_use]
    pub const fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    pub(crate) fn buffer_size(&self) -> usize {
        if self.read_buffer_size == 0 {
            DEFAULT_READ_BUFFER_SIZE
        } else {
            self.read_buffer_size
        }
    }
}
