//! Chunked ingestion at caller-supplied offsets.
//!
//! The source is read once, front to back. Each segment between two split
//! offsets is handed to the store's chunked importer through a bounded
//! reader, and the resulting identifiers are concatenated into one file.
//! Blocks stored before a failure are not rolled back.

mod splits;

pub use splits::{parse_split_points, plan_segments, Segment};

use crate::compose::{concat_with_sizes, KnownSizes};
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::store::BlockStore;
use serde::Serialize;
use splicefs_codec::Cid;
use std::fs::{self, File};
use std::io::{self, BufReader, ErrorKind, Read};
use std::path::Path;

/// Progress report for one stored segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentAdded {
    /// Root of the stored segment.
    pub cid: Cid,
    /// Source offset of the segment.
    pub offset: u64,
    /// Segment length.
    pub length: u64,
    /// Source length.
    pub total_size: u64,
}

/// Result of [`split_add`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitAddOutput {
    /// The composite file.
    pub cid: Cid,
    /// Its length.
    pub total_size: u64,
    /// The stored segments, in source order.
    pub segments: Vec<SegmentAdded>,
}

/// Ingests `source` split at `offsets` and returns one composite file.
///
/// `offsets` are normalized by [`plan_segments`]. Each segment is stored
/// with [`BlockStore::ingest_chunked`] and reported to `progress`; an
/// error from `progress` aborts the ingestion. The segments are then
/// joined with [`concat_with_sizes`] using the stored lengths, so a single
/// segment yields its own identifier.
///
/// # Errors
///
/// Returns [`CoreError::SourceRead`] if the source fails or ends early,
/// the planning errors of [`plan_segments`], and any store or callback
/// error.
pub fn split_add<S, R, F>(
    store: &S,
    source: R,
    total: u64,
    offsets: &[u64],
    config: &Config,
    mut progress: F,
) -> CoreResult<SplitAddOutput>
where
    S: BlockStore + ?Sized,
    R: Read,
    F: FnMut(&SegmentAdded) -> CoreResult<()>,
{
    let plan = plan_segments(total, offsets)?;
    let mut source = BufReader::with_capacity(config.buffer_size(), source);
    let mut known = KnownSizes::with_capacity(plan.len());
    let mut segments = Vec::with_capacity(plan.len());

    for segment in &plan {
        let mut reader = SegmentReader::new(&mut source, segment.len());
        let stored = store.ingest_chunked(&mut reader, &config.import);
        let (cid, length) = match (stored, reader.failure.take()) {
            (Err(CoreError::Io(source)), Some(at)) => {
                return Err(CoreError::SourceRead {
                    offset: segment.start + at,
                    source,
                })
            }
            (stored, _) => stored?,
        };
        if length != segment.len() {
            return Err(CoreError::SizeMismatch {
                cid,
                expected: segment.len(),
                actual: length,
            });
        }

        let added = SegmentAdded {
            cid,
            offset: segment.start,
            length,
            total_size: total,
        };
        tracing::debug!(%cid, offset = added.offset, length, "stored segment");
        progress(&added)?;

        known.insert(cid, length);
        segments.push(added);
    }

    let cids: Vec<Cid> = segments.iter().map(|s| s.cid).collect();
    let cid = concat_with_sizes(store, &cids, &known)?;
    tracing::debug!(%cid, total, segments = segments.len(), "split add complete");

    Ok(SplitAddOutput {
        cid,
        total_size: total,
        segments,
    })
}

/// Ingests a file split at the offsets listed in a splits file.
///
/// # Errors
///
/// Returns an error if either file cannot be read, the splits do not
/// parse, or ingestion fails.
pub fn split_add_file<S, F>(
    store: &S,
    content: &Path,
    splits: &Path,
    config: &Config,
    progress: F,
) -> CoreResult<SplitAddOutput>
where
    S: BlockStore + ?Sized,
    F: FnMut(&SegmentAdded) -> CoreResult<()>,
{
    let offsets = parse_split_points(&fs::read_to_string(splits)?)?;
    let file = File::open(content)?;
    let total = file.metadata()?.len();
    split_add(store, file, total, &offsets, config, progress)
}

/// Reads exactly `remaining` bytes from the shared source.
///
/// Running out early is reported as an error rather than a short segment.
/// The position of the first failure is kept so the caller can tell source
/// failures apart from store failures.
struct SegmentReader<'a, R> {
    inner: &'a mut R,
    remaining: u64,
    consumed: u64,
    failure: Option<u64>,
}

impl<'a, R: Read> SegmentReader<'a, R> {
    fn new(inner: &'a mut R, len: u64) -> Self {
        Self {
            inner,
            remaining: len,
            consumed: 0,
            failure: None,
        }
    }
}

impl<R: Read> Read for SegmentReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let max = usize::try_from(self.remaining).map_or(buf.len(), |r| r.min(buf.len()));
        match self.inner.read(&mut buf[..max]) {
            Ok(0) => {
                self.failure = Some(self.consumed);
                Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("source ended {} bytes early", self.remaining),
                ))
            }
            Ok(n) => {
                self.remaining -= n as u64;
                self.consumed += n as u64;
                Ok(n)
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => Err(e),
            Err(e) => {
                self.failure = Some(self.consumed);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_to_vec;
    use crate::store::Blockstore;
    use crate::traverse::traverse_ranges;
    use std::io::Cursor;

    fn source(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn ingest_at_offsets() {
        let store = Blockstore::in_memory();
        let data = source(100);
        let mut seen = Vec::new();
        let out = split_add(
            &store,
            Cursor::new(&data),
            100,
            &[40, 70],
            &Config::new(),
            |added| {
                seen.push((added.offset, added.length, added.total_size));
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(seen, vec![(0, 40, 100), (40, 30, 100), (70, 30, 100)]);
        assert_eq!(out.total_size, 100);
        assert_eq!(read_to_vec(&store, &out.cid).unwrap(), data);

        let lengths: Vec<u64> = traverse_ranges(&store, &out.cid, 1)
            .map(|e| e.unwrap().length)
            .collect();
        assert_eq!(lengths, vec![40, 30, 30]);
    }

    #[test]
    fn single_segment_is_not_wrapped() {
        let store = Blockstore::in_memory();
        let out = split_add(
            &store,
            Cursor::new(b"hello world"),
            11,
            &[0],
            &Config::new(),
            |_| Ok(()),
        )
        .unwrap();
        assert_eq!(out.cid, out.segments[0].cid);
        assert!(out.cid.is_raw());
    }

    #[test]
    fn segments_larger_than_a_chunk() {
        let store = Blockstore::in_memory();
        let data = source(1000);
        let config = Config::new().chunk_size(64).read_buffer_size(7);
        let out = split_add(&store, Cursor::new(&data), 1000, &[300], &config, |_| Ok(())).unwrap();
        assert_eq!(read_to_vec(&store, &out.cid).unwrap(), data);
        assert!(!out.segments[0].cid.is_raw());
    }

    #[test]
    fn short_source_is_source_read_error() {
        let store = Blockstore::in_memory();
        let result = split_add(
            &store,
            Cursor::new(source(50)),
            100,
            &[40],
            &Config::new(),
            |_| Ok(()),
        );
        match result {
            Err(CoreError::SourceRead { offset, .. }) => assert_eq!(offset, 50),
            other => panic!("expected a source read error, got {other:?}"),
        }
    }

    #[test]
    fn failing_source_is_source_read_error() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(ErrorKind::Other, "disk on fire"))
            }
        }
        let store = Blockstore::in_memory();
        let result = split_add(&store, Broken, 10, &[], &Config::new(), |_| Ok(()));
        assert!(matches!(result, Err(CoreError::SourceRead { offset: 0, .. })));
    }

    #[test]
    fn callback_error_aborts() {
        let store = Blockstore::in_memory();
        let mut calls = 0;
        let result = split_add(
            &store,
            Cursor::new(source(100)),
            100,
            &[10, 20],
            &Config::new(),
            |_| {
                calls += 1;
                Err(CoreError::aborted("stop"))
            },
        );
        assert!(matches!(result, Err(CoreError::Aborted { .. })));
        assert_eq!(calls, 1);
    }

    #[test]
    fn empty_source() {
        let store = Blockstore::in_memory();
        let out = split_add(&store, Cursor::new(b""), 0, &[], &Config::new(), |_| Ok(())).unwrap();
        assert_eq!(out.total_size, 0);
        assert_eq!(
            out.cid.to_string(),
            "bafkreihdwdcefgh4dqkjv67uzcmw7ojee6xedzdetojuzjevtenxquvyku"
        );
    }

    #[test]
    fn split_files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("content.bin");
        let splits = dir.path().join("splits.json");
        fs::write(&content, source(64)).unwrap();
        fs::write(&splits, "[16, 32]").unwrap();

        let store = Blockstore::in_memory();
        let out = split_add_file(&store, &content, &splits, &Config::new(), |_| Ok(())).unwrap();
        assert_eq!(out.segments.len(), 3);
        assert_eq!(read_to_vec(&store, &out.cid).unwrap(), source(64));
    }
}
