//! The UnixFS `Data` message carried in a dag-pb node's payload.

use crate::decoder::{expect_wire, ProtoDecoder};
use crate::encoder::{ProtoEncoder, WireType};
use crate::error::{CodecError, CodecResult};
use crate::{Decode, Encode};

const DATA: &str = "UnixFS Data";
const TIME: &str = "UnixTime";

/// UnixFS node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Legacy leaf holding bytes inline.
    Raw,
    /// Plain directory.
    Directory,
    /// File, possibly chunked.
    File,
    /// Metadata wrapper.
    Metadata,
    /// Symbolic link.
    Symlink,
    /// HAMT-sharded directory.
    HamtShard,
}

impl DataType {
    /// Returns the wire value.
    #[must_use]
    pub const fn code(self) -> u64 {
        match self {
            Self::Raw => 0,
            Self::Directory => 1,
            Self::File => 2,
            Self::Metadata => 3,
            Self::Symlink => 4,
            Self::HamtShard => 5,
        }
    }

    /// Parses a wire value.
    ///
    /// # Errors
    ///
    /// Returns an error for values outside the enumeration.
    pub fn from_code(code: u64) -> CodecResult<Self> {
        Ok(match code {
            0 => Self::Raw,
            1 => Self::Directory,
            2 => Self::File,
            3 => Self::Metadata,
            4 => Self::Symlink,
            5 => Self::HamtShard,
            _ => {
                return Err(CodecError::invalid_structure(format!(
                    "{DATA}: unknown type {code}"
                )))
            }
        })
    }
}

/// A modification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnixTime {
    /// Seconds relative to the Unix epoch.
    pub seconds: i64,
    /// Sub-second nanoseconds, `1..=999_999_999` when present.
    pub nanos: Option<u32>,
}

impl UnixTime {
    /// A whole-second timestamp.
    #[must_use]
    pub const fn from_seconds(seconds: i64) -> Self {
        Self {
            seconds,
            nanos: None,
        }
    }
}

impl Encode for UnixTime {
    fn encode(&self) -> Vec<u8> {
        let mut enc = ProtoEncoder::with_capacity(16);
        enc.write_int64(1, self.seconds);
        if let Some(nanos) = self.nanos {
            enc.write_fixed32(2, nanos);
        }
        enc.into_bytes()
    }
}

impl Decode for UnixTime {
    #[allow(clippy::cast_possible_wrap)]
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let mut dec = ProtoDecoder::new(bytes);
        let mut seconds = None;
        let mut nanos = None;
        while !dec.is_empty() {
            let (field, wire) = dec.read_key(TIME)?;
            match field {
                1 => {
                    expect_wire(TIME, field, wire, WireType::Varint)?;
                    seconds = Some(dec.read_varint()? as i64);
                }
                2 => {
                    expect_wire(TIME, field, wire, WireType::Fixed32)?;
                    let value = dec.read_fixed32()?;
                    if value == 0 || value > 999_999_999 {
                        return Err(CodecError::invalid_structure(format!(
                            "{TIME}: fractional nanoseconds {value} out of range"
                        )));
                    }
                    nanos = Some(value);
                }
                _ => return Err(CodecError::UnknownField { message: TIME, field }),
            }
        }
        let seconds = seconds.ok_or(CodecError::MissingField {
            message: TIME,
            field: "Seconds",
        })?;
        Ok(Self { seconds, nanos })
    }
}

/// The UnixFS `Data` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnixFsData {
    /// Node type.
    pub data_type: DataType,
    /// Inline bytes.
    pub data: Vec<u8>,
    /// Total logical size; written for files only.
    pub filesize: Option<u64>,
    /// Logical sizes of the children, parallel to the dag-pb links.
    pub blocksizes: Vec<u64>,
    /// Hash function of a HAMT shard.
    pub hash_type: Option<u64>,
    /// Fanout of a HAMT shard.
    pub fanout: Option<u64>,
    /// Unix permission bits.
    pub mode: Option<u32>,
    /// Modification time.
    pub mtime: Option<UnixTime>,
}

impl UnixFsData {
    /// An otherwise empty message of the given type.
    #[must_use]
    pub const fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            data: Vec::new(),
            filesize: None,
            blocksizes: Vec::new(),
            hash_type: None,
            fanout: None,
            mode: None,
            mtime: None,
        }
    }
}

impl Encode for UnixFsData {
    fn encode(&self) -> Vec<u8> {
        let mut enc = ProtoEncoder::with_capacity(16 + self.data.len() + self.blocksizes.len() * 4);
        enc.write_uint64(1, self.data_type.code());
        if !self.data.is_empty() {
            enc.write_bytes(2, &self.data);
        }
        if let Some(filesize) = self.filesize {
            enc.write_uint64(3, filesize);
        }
        for &size in &self.blocksizes {
            enc.write_uint64(4, size);
        }
        if let Some(hash_type) = self.hash_type {
            enc.write_uint64(5, hash_type);
        }
        if let Some(fanout) = self.fanout {
            enc.write_uint64(6, fanout);
        }
        if let Some(mode) = self.mode {
            enc.write_uint64(7, u64::from(mode));
        }
        if let Some(mtime) = &self.mtime {
            enc.write_bytes(8, &mtime.encode());
        }
        enc.into_bytes()
    }
}

impl Decode for UnixFsData {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let mut dec = ProtoDecoder::new(bytes);
        let mut data_type = None;
        let mut out = Self::new(DataType::Raw);

        while !dec.is_empty() {
            let (field, wire) = dec.read_key(DATA)?;
            match field {
                1 => {
                    expect_wire(DATA, field, wire, WireType::Varint)?;
                    data_type = Some(DataType::from_code(dec.read_varint()?)?);
                }
                2 => {
                    expect_wire(DATA, field, wire, WireType::LengthDelimited)?;
                    out.data = dec.read_length_delimited()?.to_vec();
                }
                3 => {
                    expect_wire(DATA, field, wire, WireType::Varint)?;
                    out.filesize = Some(dec.read_varint()?);
                }
                4 => match wire {
                    WireType::Varint => out.blocksizes.push(dec.read_varint()?),
                    WireType::LengthDelimited => {
                        let mut packed = ProtoDecoder::new(dec.read_length_delimited()?);
                        while !packed.is_empty() {
                            out.blocksizes.push(packed.read_varint()?);
                        }
                    }
                    other => expect_wire(DATA, field, other, WireType::Varint)?,
                },
                5 => {
                    expect_wire(DATA, field, wire, WireType::Varint)?;
                    out.hash_type = Some(dec.read_varint()?);
                }
                6 => {
                    expect_wire(DATA, field, wire, WireType::Varint)?;
                    out.fanout = Some(dec.read_varint()?);
                }
                7 => {
                    expect_wire(DATA, field, wire, WireType::Varint)?;
                    let mode = dec.read_varint()?;
                    out.mode = Some(u32::try_from(mode).map_err(|_| {
                        CodecError::invalid_structure(format!("{DATA}: mode {mode} overflows"))
                    })?);
                }
                8 => {
                    expect_wire(DATA, field, wire, WireType::LengthDelimited)?;
                    out.mtime = Some(UnixTime::decode(dec.read_length_delimited()?)?);
                }
                _ => return Err(CodecError::UnknownField { message: DATA, field }),
            }
        }

        out.data_type = data_type.ok_or(CodecError::MissingField {
            message: DATA,
            field: "Type",
        })?;
        Ok(out)
    }
}
