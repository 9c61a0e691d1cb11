//! Splicing an encoded archive into a composite file.

use super::encoder::{ZipEncoder, ZipPart, ZipSource};
use crate::compose::{concat_with_sizes, KnownSizes};
use crate::config::{Config, ImportOptions};
use crate::error::{CoreError, CoreResult};
use crate::size::load_node;
use crate::store::BlockStore;
use crate::traverse::traverse_directory;
use serde::Serialize;
use splicefs_codec::Cid;

/// Result of [`create_zip`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZipOutput {
    /// The archive file.
    pub cid: Cid,
    /// Archive length in bytes.
    pub size: u64,
    /// The archive's parts in order: stored metadata runs and the
    /// untouched file identifiers between them.
    pub parts: Vec<(Cid, u64)>,
}

/// Builds a ZIP archive of a directory without copying file content.
///
/// Every file reachable from `dir` becomes an entry named by its path.
/// Only the archive metadata is stored; each file's identifier is linked
/// into the archive as is. With [`crate::ChecksumMode::Stream`] the file
/// content is read once to compute CRC-32 values; with
/// [`crate::ChecksumMode::Skip`] raw file blocks are never fetched.
///
/// # Errors
///
/// Returns [`CoreError::NotADirectory`] if `dir` is not a directory, and
/// any traversal, read or store error.
pub fn create_zip<S: BlockStore + ?Sized>(
    store: &S,
    dir: &Cid,
    config: &Config,
) -> CoreResult<ZipOutput> {
    if dir.is_raw() || !load_node(store, dir)?.is_directory() {
        return Err(CoreError::NotADirectory { cid: *dir });
    }

    let sources = traverse_directory(store, dir, "", false)
        .map(|entry| {
            entry.map(|e| ZipSource {
                name: e.path.trim_start_matches('/').to_string(),
                cid: e.cid,
                size: e.size,
                mtime: e.mtime,
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;
    tracing::debug!(%dir, files = sources.len(), "zipping directory");

    let encoder = ZipEncoder::new(store, sources, config.checksum);
    splice(store, encoder, &config.import)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Emitting,
    Skipping,
}

/// Turns a stream of archive parts into one composite file.
///
/// Bytes outside file markers are buffered and stored through the
/// chunked importer at each marker; bytes inside markers are dropped and
/// the marker's identifier is linked instead.
///
/// # Errors
///
/// Returns [`CoreError::UnbalancedMarker`] if markers do not alternate,
/// and any error carried by the stream or raised by the store.
pub fn splice<S, I>(store: &S, parts: I, options: &ImportOptions) -> CoreResult<ZipOutput>
where
    S: BlockStore + ?Sized,
    I: IntoIterator<Item = CoreResult<ZipPart>>,
{
    let mut mode = Mode::Emitting;
    let mut buffer = Vec::new();
    let mut pieces: Vec<(Cid, u64)> = Vec::new();

    for part in parts {
        match (part?, mode) {
            (ZipPart::Bytes(bytes), Mode::Emitting) => buffer.extend_from_slice(&bytes),
            (ZipPart::Bytes(_), Mode::Skipping) => {}
            (ZipPart::FileStart { cid, size }, Mode::Emitting) => {
                flush(store, &mut buffer, &mut pieces, options)?;
                pieces.push((cid, size));
                mode = Mode::Skipping;
            }
            (ZipPart::FileEnd, Mode::Skipping) => mode = Mode::Emitting,
            (ZipPart::FileStart { cid, .. }, Mode::Skipping) => {
                return Err(CoreError::UnbalancedMarker {
                    message: format!("{cid} starts inside another file"),
                })
            }
            (ZipPart::FileEnd, Mode::Emitting) => {
                return Err(CoreError::UnbalancedMarker {
                    message: "file end without a start".into(),
                })
            }
        }
    }
    if mode == Mode::Skipping {
        return Err(CoreError::UnbalancedMarker {
            message: "stream ended inside a file".into(),
        });
    }
    flush(store, &mut buffer, &mut pieces, options)?;

    let known: KnownSizes = pieces.iter().copied().collect();
    let cids: Vec<Cid> = pieces.iter().map(|(cid, _)| *cid).collect();
    let cid = concat_with_sizes(store, &cids, &known)?;
    let size = pieces.iter().map(|(_, size)| size).sum();
    tracing::debug!(%cid, size, parts = pieces.len(), "archive spliced");

    Ok(ZipOutput {
        cid,
        size,
        parts: pieces,
    })
}

fn flush<S: BlockStore + ?Sized>(
    store: &S,
    buffer: &mut Vec<u8>,
    pieces: &mut Vec<(Cid, u64)>,
    options: &ImportOptions,
) -> CoreResult<()> {
    if buffer.is_empty() {
        return Ok(());
    }
    let stored = store.ingest_chunked(&mut buffer.as_slice(), options)?;
    pieces.push(stored);
    buffer.clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::{concat, make_dir, DirEntryInput};
    use crate::config::ChecksumMode;
    use crate::reader::read_to_vec;
    use crate::store::Blockstore;
    use crate::zip::encoder::archive_len;
    use bytes::Bytes;
    use std::io::{Cursor, Read};

    fn entry(name: &str, cid: Cid) -> (String, DirEntryInput) {
        (name.to_string(), DirEntryInput::new(cid))
    }

    fn sample(store: &Blockstore<splicefs_storage::InMemoryBackend>) -> (Cid, Vec<Cid>) {
        let a = store.put(b"first file\n").unwrap();
        let x = store.put(b"second ").unwrap();
        let y = store.put(b"file, in two parts\n").unwrap();
        let b = concat(store, &[x, y]).unwrap();
        let e = store.put(b"").unwrap();
        let sub = make_dir(store, vec![entry("b.txt", b), entry("empty", e)]).unwrap();
        let root = make_dir(store, vec![entry("a.txt", a), entry("sub", sub)]).unwrap();
        (root, vec![a, b, e])
    }

    #[test]
    fn archive_reads_back() {
        let store = Blockstore::in_memory();
        let (root, _) = sample(&store);
        let out = create_zip(&store, &root, &Config::new()).unwrap();

        let bytes = read_to_vec(&store, &out.cid).unwrap();
        assert_eq!(bytes.len() as u64, out.size);

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(sorted, ["a.txt", "sub/b.txt", "sub/empty"]);

        let expected: [(&str, &[u8]); 3] = [
            ("a.txt", b"first file\n"),
            ("sub/b.txt", b"second file, in two parts\n"),
            ("sub/empty", b""),
        ];
        for (name, content) in expected {
            let mut file = archive.by_name(name).unwrap();
            let mut read = Vec::new();
            file.read_to_end(&mut read).unwrap();
            assert_eq!(read, content);
            assert_eq!(file.crc32(), crate::zip::crc32(content));
        }
    }

    #[test]
    fn file_identifiers_are_reused() {
        let store = Blockstore::in_memory();
        let (root, files) = sample(&store);
        let out = create_zip(&store, &root, &Config::new()).unwrap();

        // header, a.txt, descriptor+header, b.txt, descriptor+header, empty, trailer
        assert_eq!(out.parts.len(), 7);
        let linked: Vec<Cid> = out.parts.iter().skip(1).step_by(2).map(|p| p.0).collect();
        assert_eq!(linked, files);
        assert_eq!(out.parts[1].1, 11);
        assert_eq!(out.parts[3].1, 26);
        assert_eq!(out.parts[5].1, 0);
        assert_eq!(
            out.size,
            archive_len(&[(5, 11), (9, 26), (9, 0)])
        );
    }

    #[test]
    fn skipped_checksums_leave_content_unread() {
        let store = Blockstore::in_memory();
        let ghost = Cid::hash(splicefs_codec::Codec::Raw, b"not stored");
        let root = make_dir(
            &store,
            vec![(String::from("ghost.bin"), DirEntryInput::with_size(ghost, 10))],
        )
        .unwrap();

        let config = Config::new().checksum(ChecksumMode::Skip);
        let out = create_zip(&store, &root, &config).unwrap();
        assert_eq!(out.parts[1], (ghost, 10));
        assert_eq!(out.size, archive_len(&[(9, 10)]));

        let streamed = create_zip(&store, &root, &Config::new());
        assert!(matches!(streamed, Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn same_directory_same_archive() {
        let store = Blockstore::in_memory();
        let (root, _) = sample(&store);
        let first = create_zip(&store, &root, &Config::new()).unwrap();
        let second = create_zip(&store, &root, &Config::new()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_directory_is_bare_trailer() {
        let store = Blockstore::in_memory();
        let root = make_dir(&store, Vec::new()).unwrap();
        let out = create_zip(&store, &root, &Config::new()).unwrap();
        assert!(out.cid.is_raw());
        assert_eq!(out.size, 22);
        assert_eq!(out.parts, vec![(out.cid, 22)]);
    }

    #[test]
    fn files_are_not_directories() {
        let store = Blockstore::in_memory();
        let a = store.put(b"a").unwrap();
        let b = store.put(b"b").unwrap();
        let joined = concat(&store, &[a, b]).unwrap();
        for cid in [a, joined] {
            assert!(matches!(
                create_zip(&store, &cid, &Config::new()),
                Err(CoreError::NotADirectory { .. })
            ));
        }
    }

    #[test]
    fn unbalanced_markers_are_rejected() {
        let store = Blockstore::in_memory();
        let cid = Cid::hash(splicefs_codec::Codec::Raw, b"x");
        let options = ImportOptions::default();
        let cases = vec![
            vec![ZipPart::FileEnd],
            vec![ZipPart::FileStart { cid, size: 1 }],
            vec![
                ZipPart::FileStart { cid, size: 1 },
                ZipPart::FileStart { cid, size: 1 },
            ],
        ];
        for parts in cases {
            let result = splice(&store, parts.into_iter().map(Ok), &options);
            assert!(matches!(result, Err(CoreError::UnbalancedMarker { .. })));
        }
    }

    #[test]
    fn bytes_inside_markers_are_dropped() {
        let store = Blockstore::in_memory();
        let file = store.put(b"body").unwrap();
        let parts = vec![
            ZipPart::Bytes(Bytes::from_static(b"head")),
            ZipPart::FileStart { cid: file, size: 4 },
            ZipPart::Bytes(Bytes::from_static(b"ignored")),
            ZipPart::FileEnd,
            ZipPart::Bytes(Bytes::from_static(b"tail")),
        ];
        let out = splice(&store, parts.into_iter().map(Ok), &ImportOptions::default()).unwrap();
        assert_eq!(read_to_vec(&store, &out.cid).unwrap(), b"headbodytail");
        assert_eq!(out.parts[1], (file, 4));
    }
}
