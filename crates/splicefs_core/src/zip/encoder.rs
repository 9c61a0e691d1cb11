//! Streaming ZIP encoder with splice markers.
//!
//! The encoder writes stored (uncompressed) entries with data descriptors,
//! the layout streaming zip writers use: sizes and CRCs follow the data,
//! so headers never depend on content. File data regions are bracketed by
//! [`ZipPart::FileStart`] and [`ZipPart::FileEnd`]; whatever bytes appear
//! between them are that file's content, present only when checksums are
//! streamed.

use super::crc::Crc32;
use crate::config::ChecksumMode;
use crate::error::{CoreError, CoreResult};
use crate::store::{BlockStore, ByteStream};
use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, Datelike, Timelike};
use splicefs_codec::Cid;

const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
const DATA_DESCRIPTOR_SIG: u32 = 0x0807_4b50;
const CENTRAL_HEADER_SIG: u32 = 0x0201_4b50;
const ZIP64_EOCD_SIG: u32 = 0x0606_4b50;
const ZIP64_LOCATOR_SIG: u32 = 0x0706_4b50;
const EOCD_SIG: u32 = 0x0605_4b50;

/// Size of a local file header without the name.
pub const LOCAL_HEADER_LEN: u64 = 30;
/// Size of a central directory header without name and extra field.
pub const CENTRAL_HEADER_LEN: u64 = 46;
/// Size of the end of central directory record.
pub const EOCD_LEN: u64 = 22;

const VERSION_20: u16 = 20;
const VERSION_45: u16 = 45;
/// Made by a Unix host.
const HOST_UNIX: u16 = 3 << 8;
/// Data descriptor follows the data; names are UTF-8.
const FLAGS: u16 = 0x0808;
const METHOD_STORED: u16 = 0;
const FILE_ATTRS: u32 = 0o100_644 << 16;
const ZIP64_EXTRA_ID: u16 = 0x0001;

const U16_LIMIT: usize = 0xFFFF;
const U32_LIMIT: u64 = 0xFFFF_FFFF;

/// A file to place in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipSource {
    /// Entry name, without a leading `/`.
    pub name: String,
    /// File content identifier.
    pub cid: Cid,
    /// Logical size of the content.
    pub size: u64,
    /// Modification time in seconds since the epoch.
    pub mtime: i64,
}

/// One element of the encoder output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZipPart {
    /// Archive bytes.
    Bytes(Bytes),
    /// The data of `cid` starts here and spans `size` bytes.
    FileStart {
        /// The file content.
        cid: Cid,
        /// Its length.
        size: u64,
    },
    /// The current file's data ends here.
    FileEnd,
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    cid: Cid,
    size: u64,
    time: u16,
    date: u16,
    header_offset: u64,
    crc: u32,
}

enum State<'a> {
    NextEntry,
    Start(Entry),
    Content {
        entry: Entry,
        stream: Option<ByteStream<'a>>,
        crc: Crc32,
        seen: u64,
    },
    Descriptor(Entry),
    Trailer,
    Done,
}

/// Iterator producing an archive as bytes and splice markers.
pub struct ZipEncoder<'a, S: BlockStore + ?Sized> {
    store: &'a S,
    mode: ChecksumMode,
    sources: std::vec::IntoIter<ZipSource>,
    state: State<'a>,
    offset: u64,
    central: Vec<Entry>,
}

impl<'a, S: BlockStore + ?Sized> ZipEncoder<'a, S> {
    /// Creates an encoder for `sources`, in order.
    ///
    /// With [`ChecksumMode::Stream`] each file's content is read from
    /// `store` to compute its CRC-32; with [`ChecksumMode::Skip`] the store
    /// is never touched.
    pub fn new(store: &'a S, sources: Vec<ZipSource>, mode: ChecksumMode) -> Self {
        Self {
            store,
            mode,
            central: Vec::with_capacity(sources.len()),
            sources: sources.into_iter(),
            state: State::NextEntry,
            offset: 0,
        }
    }

    fn bytes(&mut self, data: BytesMut) -> ZipPart {
        self.offset += data.len() as u64;
        ZipPart::Bytes(data.freeze())
    }

    fn advance(&mut self) -> CoreResult<Option<ZipPart>> {
        match std::mem::replace(&mut self.state, State::Done) {
            State::NextEntry => match self.sources.next() {
                Some(source) => {
                    if source.name.len() > U16_LIMIT {
                        return Err(CoreError::EntryNameTooLong {
                            len: source.name.len(),
                        });
                    }
                    let (time, date) = dos_datetime(source.mtime);
                    let entry = Entry {
                        name: source.name,
                        cid: source.cid,
                        size: source.size,
                        time,
                        date,
                        header_offset: self.offset,
                        crc: 0,
                    };
                    let header = local_header(&entry);
                    self.state = State::Start(entry);
                    Ok(Some(self.bytes(header)))
                }
                None => {
                    self.state = State::Trailer;
                    self.advance()
                }
            },
            State::Start(entry) => {
                let part = ZipPart::FileStart {
                    cid: entry.cid,
                    size: entry.size,
                };
                let stream = match self.mode {
                    ChecksumMode::Stream => Some(self.store.read_stream(&entry.cid)),
                    ChecksumMode::Skip => None,
                };
                self.offset += entry.size;
                self.state = State::Content {
                    entry,
                    stream,
                    crc: Crc32::new(),
                    seen: 0,
                };
                Ok(Some(part))
            }
            State::Content {
                mut entry,
                stream: Some(mut stream),
                mut crc,
                mut seen,
            } => match stream.next() {
                Some(chunk) => {
                    let chunk = chunk?;
                    crc.update(&chunk);
                    seen += chunk.len() as u64;
                    if seen > entry.size {
                        return Err(size_mismatch(&entry, seen));
                    }
                    self.state = State::Content {
                        entry,
                        stream: Some(stream),
                        crc,
                        seen,
                    };
                    Ok(Some(ZipPart::Bytes(chunk)))
                }
                None => {
                    if seen != entry.size {
                        return Err(size_mismatch(&entry, seen));
                    }
                    entry.crc = crc.finish();
                    self.state = State::Descriptor(entry);
                    Ok(Some(ZipPart::FileEnd))
                }
            },
            State::Content {
                entry,
                stream: None,
                ..
            } => {
                self.state = State::Descriptor(entry);
                Ok(Some(ZipPart::FileEnd))
            }
            State::Descriptor(entry) => {
                let descriptor = data_descriptor(&entry);
                self.central.push(entry);
                self.state = State::NextEntry;
                Ok(Some(self.bytes(descriptor)))
            }
            State::Trailer => {
                let trailer = central_directory(&self.central, self.offset);
                Ok(Some(self.bytes(trailer)))
            }
            State::Done => Ok(None),
        }
    }
}

impl<S: BlockStore + ?Sized> Iterator for ZipEncoder<'_, S> {
    type Item = CoreResult<ZipPart>;

    fn next(&mut self) -> Option<Self::Item> {
        // `advance` leaves the state at `Done` when it fails.
        self.advance().transpose()
    }
}

fn size_mismatch(entry: &Entry, actual: u64) -> CoreError {
    CoreError::SizeMismatch {
        cid: entry.cid,
        expected: entry.size,
        actual,
    }
}

const fn needs_zip64(value: u64) -> bool {
    value >= U32_LIMIT
}

fn clamp32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn name_len(name: &str) -> u16 {
    u16::try_from(name.len()).unwrap_or(u16::MAX)
}

fn local_header(entry: &Entry) -> BytesMut {
    let name = entry.name.as_str();
    let mut buf = BytesMut::with_capacity(LOCAL_HEADER_LEN as usize + name.len());
    buf.put_u32_le(LOCAL_HEADER_SIG);
    buf.put_u16_le(VERSION_20);
    buf.put_u16_le(FLAGS);
    buf.put_u16_le(METHOD_STORED);
    buf.put_u16_le(entry.time);
    buf.put_u16_le(entry.date);
    buf.put_u32_le(0); // crc
    buf.put_u32_le(0); // compressed size
    buf.put_u32_le(0); // uncompressed size
    buf.put_u16_le(name_len(name));
    buf.put_u16_le(0); // extra field length
    buf.put_slice(name.as_bytes());
    buf
}

fn data_descriptor(entry: &Entry) -> BytesMut {
    let mut buf = BytesMut::with_capacity(24);
    buf.put_u32_le(DATA_DESCRIPTOR_SIG);
    buf.put_u32_le(entry.crc);
    if needs_zip64(entry.size) {
        buf.put_u64_le(entry.size);
        buf.put_u64_le(entry.size);
    } else {
        buf.put_u32_le(clamp32(entry.size));
        buf.put_u32_le(clamp32(entry.size));
    }
    buf
}

fn central_header(buf: &mut BytesMut, entry: &Entry) {
    let name = entry.name.as_str();
    let big_size = needs_zip64(entry.size);
    let big_offset = needs_zip64(entry.header_offset);

    let mut extra = BytesMut::new();
    if big_size || big_offset {
        let len = 8 * (u16::from(big_size) * 2 + u16::from(big_offset));
        extra.put_u16_le(ZIP64_EXTRA_ID);
        extra.put_u16_le(len);
        if big_size {
            extra.put_u64_le(entry.size);
            extra.put_u64_le(entry.size);
        }
        if big_offset {
            extra.put_u64_le(entry.header_offset);
        }
    }
    let version = if extra.is_empty() { VERSION_20 } else { VERSION_45 };

    buf.put_u32_le(CENTRAL_HEADER_SIG);
    buf.put_u16_le(HOST_UNIX | version);
    buf.put_u16_le(version);
    buf.put_u16_le(FLAGS);
    buf.put_u16_le(METHOD_STORED);
    buf.put_u16_le(entry.time);
    buf.put_u16_le(entry.date);
    buf.put_u32_le(entry.crc);
    buf.put_u32_le(clamp32(entry.size));
    buf.put_u32_le(clamp32(entry.size));
    buf.put_u16_le(name_len(name));
    buf.put_u16_le(u16::try_from(extra.len()).unwrap_or(u16::MAX));
    buf.put_u16_le(0); // comment length
    buf.put_u16_le(0); // disk number start
    buf.put_u16_le(0); // internal attributes
    buf.put_u32_le(FILE_ATTRS);
    buf.put_u32_le(clamp32(entry.header_offset));
    buf.put_slice(name.as_bytes());
    buf.put_slice(&extra);
}

fn central_directory(entries: &[Entry], start: u64) -> BytesMut {
    let mut buf = BytesMut::new();
    for entry in entries {
        central_header(&mut buf, entry);
    }
    let size = buf.len() as u64;
    let count = entries.len();

    if count >= U16_LIMIT || needs_zip64(size) || needs_zip64(start) {
        let record_offset = start + size;
        buf.put_u32_le(ZIP64_EOCD_SIG);
        buf.put_u64_le(44); // size of the remaining record
        buf.put_u16_le(HOST_UNIX | VERSION_45);
        buf.put_u16_le(VERSION_45);
        buf.put_u32_le(0); // this disk
        buf.put_u32_le(0); // central directory disk
        buf.put_u64_le(count as u64);
        buf.put_u64_le(count as u64);
        buf.put_u64_le(size);
        buf.put_u64_le(start);

        buf.put_u32_le(ZIP64_LOCATOR_SIG);
        buf.put_u32_le(0);
        buf.put_u64_le(record_offset);
        buf.put_u32_le(1); // total disks
    }

    let count16 = u16::try_from(count).unwrap_or(u16::MAX);
    buf.put_u32_le(EOCD_SIG);
    buf.put_u16_le(0); // this disk
    buf.put_u16_le(0); // central directory disk
    buf.put_u16_le(count16);
    buf.put_u16_le(count16);
    buf.put_u32_le(clamp32(size));
    buf.put_u32_le(clamp32(start));
    buf.put_u16_le(0); // comment length
    buf
}

/// Converts Unix seconds to MS-DOS `(time, date)`.
///
/// DOS dates cover 1980 to 2107; earlier times clamp to the start and
/// later ones to the end. Times are UTC with two-second resolution.
#[must_use]
pub fn dos_datetime(seconds: i64) -> (u16, u16) {
    const MIN: (u16, u16) = (0, (1 << 5) | 1);
    const MAX: (u16, u16) = ((23 << 11) | (59 << 5) | 29, (127 << 9) | (12 << 5) | 31);

    let Some(dt) = DateTime::from_timestamp(seconds, 0) else {
        return if seconds < 0 { MIN } else { MAX };
    };
    match dt.year() {
        ..=1979 => MIN,
        2108.. => MAX,
        year => {
            // Every field fits its bit range, so the casts cannot truncate.
            let time = (dt.hour() << 11) | (dt.minute() << 5) | (dt.second() / 2);
            let date = ((year as u32 - 1980) << 9) | (dt.month() << 5) | dt.day();
            (time as u16, date as u16)
        }
    }
}

/// Exact archive length for files of the given name lengths and sizes.
#[must_use]
pub fn archive_len(entries: &[(usize, u64)]) -> u64 {
    let mut offset = 0u64;
    let mut central = 0u64;
    for &(name, size) in entries {
        let big_size = needs_zip64(size);
        let big_offset = needs_zip64(offset);
        let descriptor = if big_size { 24 } else { 16 };
        let extra = match (big_size, big_offset) {
            (false, false) => 0,
            _ => 4 + 16 * u64::from(big_size) + 8 * u64::from(big_offset),
        };
        offset += LOCAL_HEADER_LEN + name as u64 + size + descriptor;
        central += CENTRAL_HEADER_LEN + name as u64 + extra;
    }
    let zip64 = entries.len() >= U16_LIMIT || needs_zip64(central) || needs_zip64(offset);
    offset + central + if zip64 { 56 + 20 } else { 0 } + EOCD_LEN
}
