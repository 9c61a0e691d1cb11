//! Protobuf wire-format encoder.

/// Protobuf wire types used by dag-pb and UnixFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    /// Base-128 varint (type 0).
    Varint,
    /// 64-bit little-endian (type 1).
    Fixed64,
    /// Length-prefixed bytes (type 2).
    LengthDelimited,
    /// 32-bit little-endian (type 5).
    Fixed32,
}

impl WireType {
    /// Returns the 3-bit wire type tag.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Varint => 0,
            Self::Fixed64 => 1,
            Self::LengthDelimited => 2,
            Self::Fixed32 => 5,
        }
    }

    /// Parses a 3-bit wire type tag. Groups (3, 4) are not supported.
    #[must_use]
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Varint),
            1 => Some(Self::Fixed64),
            2 => Some(Self::LengthDelimited),
            5 => Some(Self::Fixed32),
            _ => None,
        }
    }
}

/// Appends `value` to `buffer` as an unsigned LEB128 varint.
pub fn write_varint(buffer: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buffer.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buffer.push(value as u8);
}

/// Returns the encoded length of `value` as a varint.
#[must_use]
pub const fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// A protobuf encoder.
///
/// Fields are written in exactly the order the caller emits them, which is
/// how the message encoders in this crate keep their output deterministic.
pub struct ProtoEncoder {
    buffer: Vec<u8>,
}

impl ProtoEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new encoder with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Consume this encoder and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Writes a field key.
    pub fn write_key(&mut self, field: u64, wire_type: WireType) {
        write_varint(&mut self.buffer, (field << 3) | u64::from(wire_type.tag()));
    }

    /// Writes a varint field.
    pub fn write_uint64(&mut self, field: u64, value: u64) {
        self.write_key(field, WireType::Varint);
        write_varint(&mut self.buffer, value);
    }

    /// Writes an `int64` field (two's complement varint, 10 bytes when negative).
    #[allow(clippy::cast_sign_loss)]
    pub fn write_int64(&mut self, field: u64, value: i64) {
        self.write_uint64(field, value as u64);
    }

    /// Writes a `fixed32` field.
    pub fn write_fixed32(&mut self, field: u64, value: u32) {
        self.write_key(field, WireType::Fixed32);
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a length-delimited field.
    pub fn write_bytes(&mut self, field: u64, bytes: &[u8]) {
        self.write_key(field, WireType::LengthDelimited);
        write_varint(&mut self.buffer, bytes.len() as u64);
        self.buffer.extend_from_slice(bytes);
    }
}

impl Default for ProtoEncoder {
    fn default() -> Self {
        Self::new()
    }
}
