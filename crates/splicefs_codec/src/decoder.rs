//! Protobuf wire-format decoder.

use crate::encoder::WireType;
use crate::error::{CodecError, CodecResult};

/// Maximum varint length in bytes.
const MAX_VARINT_LEN: usize = 10;

/// A protobuf decoder over a borrowed buffer.
///
/// This is a cursor: message decoders pull keys and values in a loop and
/// enforce their own field ordering rules.
pub struct ProtoDecoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ProtoDecoder<'a> {
    /// Create a new decoder for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Reads a varint.
    pub fn read_varint(&mut self) -> CodecResult<u64> {
        let mut value = 0u64;
        for i in 0..MAX_VARINT_LEN {
            let byte = self.read_byte()?;
            let low = u64::from(byte & 0x7f);
            if i == MAX_VARINT_LEN - 1 && low > 1 {
                return Err(CodecError::VarintOverflow);
            }
            value |= low << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(CodecError::VarintOverflow)
    }

    /// Reads a field key, returning `(field number, wire type)`.
    pub fn read_key(&mut self, message: &'static str) -> CodecResult<(u64, WireType)> {
        let key = self.read_varint()?;
        let field = key >> 3;
        let tag = (key & 0x07) as u8;
        if field == 0 {
            return Err(CodecError::invalid_structure(format!(
                "{message}: field number 0"
            )));
        }
        let wire_type = WireType::from_tag(tag).ok_or(CodecError::InvalidWireType {
            message,
            field,
            wire_type: tag,
        })?;
        Ok((field, wire_type))
    }

    /// Reads the payload of a length-delimited field.
    pub fn read_length_delimited(&mut self) -> CodecResult<&'a [u8]> {
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| CodecError::UnexpectedEof)?;
        self.read_bytes(len)
    }

    /// Reads a `fixed32` payload.
    pub fn read_fixed32(&mut self) -> CodecResult<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a `fixed64` payload.
    pub fn read_fixed64(&mut self) -> CodecResult<u64> {
        let bytes = self.read_bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    #[inline]
    fn read_byte(&mut self) -> CodecResult<u8> {
        if self.pos >= self.data.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(CodecError::UnexpectedEof)?;
        if end > self.data.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }
}

/// Decodes a single varint from the front of `data`, returning it with the
/// number of bytes consumed.
///
/// # Errors
///
/// Returns an error on truncated or overlong input.
pub fn read_varint_prefix(data: &[u8]) -> CodecResult<(u64, usize)> {
    let mut decoder = ProtoDecoder::new(data);
    let value = decoder.read_varint()?;
    Ok((value, decoder.pos))
}

/// Ensures `actual` is the wire type `field` requires.
pub(crate) fn expect_wire(
    message: &'static str,
    field: u64,
    actual: WireType,
    expected: WireType,
) -> CodecResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(CodecError::InvalidWireType {
            message,
            field,
            wire_type: actual.tag(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_small_varints() {
        assert_eq!(read_varint_prefix(&[0x00]).unwrap(), (0, 1));
        assert_eq!(read_varint_prefix(&[0x7f]).unwrap(), (127, 1));
    }

    #[test]
    fn decode_multi_byte_varints() {
        assert_eq!(read_varint_prefix(&[0x80, 0x01]).unwrap(), (128, 2));
        assert_eq!(read_varint_prefix(&[0xac, 0x02, 0xff]).unwrap(), (300, 2));
        assert_eq!(
            read_varint_prefix(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01])
                .unwrap(),
            (u64::MAX, 10)
        );
    }

    #[test]
    fn reject_overlong_varint() {
        assert!(matches!(
            read_varint_prefix(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x02]),
            Err(CodecError::VarintOverflow)
        ));
        assert!(matches!(
            read_varint_prefix(&[0x80; 11]),
            Err(CodecError::VarintOverflow)
        ));
    }

    #[test]
    fn unexpected_eof() {
        assert!(matches!(read_varint_prefix(&[]), Err(CodecError::UnexpectedEof)));
        assert!(matches!(
            read_varint_prefix(&[0x80]),
            Err(CodecError::UnexpectedEof)
        ));

        let mut decoder = ProtoDecoder::new(&[0x05, b'a']);
        assert!(matches!(
            decoder.read_length_delimited(),
            Err(CodecError::UnexpectedEof)
        ));
    }

    #[test]
    fn decode_key() {
        let mut decoder = ProtoDecoder::new(&[0x12, 0x0a, 0x15]);
        assert_eq!(
            decoder.read_key("test").unwrap(),
            (2, WireType::LengthDelimited)
        );
        assert_eq!(decoder.read_key("test").unwrap(), (1, WireType::LengthDelimited));
        assert_eq!(decoder.read_key("test").unwrap(), (2, WireType::Fixed32));
        assert!(decoder.is_empty());
    }

    #[test]
    fn reject_group_wire_type() {
        let mut decoder = ProtoDecoder::new(&[0x0b]);
        assert!(matches!(
            decoder.read_key("test"),
            Err(CodecError::InvalidWireType { wire_type: 3, .. })
        ));
    }

    #[test]
    fn reject_field_zero() {
        let mut decoder = ProtoDecoder::new(&[0x02]);
        assert!(matches!(
            decoder.read_key("test"),
            Err(CodecError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn read_fixed_values() {
        let mut decoder = ProtoDecoder::new(&[1, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(decoder.read_fixed32().unwrap(), 1);
        assert_eq!(decoder.read_fixed64().unwrap(), 2);
        assert!(decoder.remaining().is_empty());
    }
}
