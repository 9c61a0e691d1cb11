//! The dag-pb envelope: a list of named, sized links plus an opaque payload.
//!
//! Encoding is canonical: links come before data, link fields appear in
//! field-number order, and `Name` is always written for links that carry
//! one. Decoding is strict and rejects out-of-order or unknown fields.

use crate::cid::Cid;
use crate::decoder::{expect_wire, ProtoDecoder};
use crate::encoder::{ProtoEncoder, WireType};
use crate::error::{CodecError, CodecResult};
use crate::{Decode, Encode};

const NODE: &str = "PBNode";
const LINK: &str = "PBLink";

/// A link within a dag-pb node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbLink {
    /// Target of the link.
    pub hash: Cid,
    /// Link name, used for directory entries.
    pub name: Option<String>,
    /// Cumulative size hint of the target.
    pub tsize: Option<u64>,
}

/// A dag-pb node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PbNode {
    /// Ordered links.
    pub links: Vec<PbLink>,
    /// Opaque payload; for our purposes a serialized UnixFS message.
    pub data: Option<Vec<u8>>,
}

impl Encode for PbLink {
    fn encode(&self) -> Vec<u8> {
        let hash = self.hash.to_bytes();
        let mut enc = ProtoEncoder::with_capacity(hash.len() + 16);
        enc.write_bytes(1, &hash);
        if let Some(name) = &self.name {
            enc.write_bytes(2, name.as_bytes());
        }
        if let Some(tsize) = self.tsize {
            enc.write_uint64(3, tsize);
        }
        enc.into_bytes()
    }
}

impl Decode for PbLink {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let mut dec = ProtoDecoder::new(bytes);
        let mut hash = None;
        let mut name = None;
        let mut tsize = None;
        let mut last_field = 0;

        while !dec.is_empty() {
            let (field, wire) = dec.read_key(LINK)?;
            if field <= last_field {
                return Err(CodecError::invalid_structure(format!(
                    "{LINK}: field {field} out of order"
                )));
            }
            last_field = field;
            match field {
                1 => {
                    expect_wire(LINK, field, wire, WireType::LengthDelimited)?;
                    hash = Some(Cid::from_bytes(dec.read_length_delimited()?)?);
                }
                2 => {
                    expect_wire(LINK, field, wire, WireType::LengthDelimited)?;
                    let raw = dec.read_length_delimited()?;
                    let text = std::str::from_utf8(raw).map_err(|_| CodecError::InvalidUtf8)?;
                    name = Some(text.to_string());
                }
                3 => {
                    expect_wire(LINK, field, wire, WireType::Varint)?;
                    tsize = Some(dec.read_varint()?);
                }
                _ => return Err(CodecError::UnknownField { message: LINK, field }),
            }
        }

        let hash = hash.ok_or(CodecError::MissingField {
            message: LINK,
            field: "Hash",
        })?;
        Ok(Self { hash, name, tsize })
    }
}

impl Encode for PbNode {
    fn encode(&self) -> Vec<u8> {
        let mut enc = ProtoEncoder::with_capacity(
            self.links.len() * 48 + self.data.as_ref().map_or(0, |d| d.len() + 4),
        );
        for link in &self.links {
            enc.write_bytes(2, &link.encode());
        }
        if let Some(data) = &self.data {
            enc.write_bytes(1, data);
        }
        enc.into_bytes()
    }
}

impl Decode for PbNode {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let mut dec = ProtoDecoder::new(bytes);
        let mut links = Vec::new();
        let mut data = None;

        while !dec.is_empty() {
            let (field, wire) = dec.read_key(NODE)?;
            match field {
                2 => {
                    if data.is_some() {
                        return Err(CodecError::invalid_structure(format!(
                            "{NODE}: Links after Data"
                        )));
                    }
                    expect_wire(NODE, field, wire, WireType::LengthDelimited)?;
                    links.push(PbLink::decode(dec.read_length_delimited()?)?);
                }
                1 => {
                    if data.is_some() {
                        return Err(CodecError::invalid_structure(format!(
                            "{NODE}: duplicate Data"
                        )));
                    }
                    expect_wire(NODE, field, wire, WireType::LengthDelimited)?;
                    data = Some(dec.read_length_delimited()?.to_vec());
                }
                _ => return Err(CodecError::UnknownField { message: NODE, field }),
            }
        }

        Ok(Self { links, data })
    }
}
