//! Content identifiers.

use crate::decoder::read_varint_prefix;
use crate::encoder::write_varint;
use crate::error::{CodecError, CodecResult};
use crate::multibase::{base32_decode, base32_encode, base58_decode, base58_encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Multihash code for sha2-256.
pub const SHA2_256: u64 = 0x12;

/// Digest length of sha2-256.
pub const DIGEST_LEN: usize = 32;

/// Multibase prefix for lower-case base32.
const BASE32_PREFIX: char = 'b';

/// Multicodec of the block an identifier points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Codec {
    /// The block is the content itself.
    Raw,
    /// The block is a serialized dag-pb node.
    DagPb,
}

impl Codec {
    /// Returns the multicodec code.
    #[must_use]
    pub const fn code(self) -> u64 {
        match self {
            Self::Raw => 0x55,
            Self::DagPb => 0x70,
        }
    }

    /// Looks up a codec by multicodec code.
    #[must_use]
    pub const fn from_code(code: u64) -> Option<Self> {
        match code {
            0x55 => Some(Self::Raw),
            0x70 => Some(Self::DagPb),
            _ => None,
        }
    }
}

/// Identifier version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Version {
    /// Bare sha2-256 multihash, implicitly dag-pb.
    V0,
    /// Self-describing: version, codec, multihash.
    V1,
}

/// A content identifier.
///
/// Only sha2-256 multihashes are supported. Identifiers are immutable and
/// compare by value; two identifiers are equal exactly when version, codec
/// and digest all match.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cid {
    version: Version,
    codec: Codec,
    digest: [u8; DIGEST_LEN],
}

impl Cid {
    /// Creates a version-1 identifier from a codec and a sha2-256 digest.
    #[must_use]
    pub const fn new_v1(codec: Codec, digest: [u8; DIGEST_LEN]) -> Self {
        Self {
            version: Version::V1,
            codec,
            digest,
        }
    }

    /// Creates a version-0 identifier from a sha2-256 digest.
    #[must_use]
    pub const fn new_v0(digest: [u8; DIGEST_LEN]) -> Self {
        Self {
            version: Version::V0,
            codec: Codec::DagPb,
            digest,
        }
    }

    /// Derives the version-1 identifier of `data` stored under `codec`.
    #[must_use]
    pub fn hash(codec: Codec, data: &[u8]) -> Self {
        let digest: [u8; DIGEST_LEN] = Sha256::digest(data).into();
        Self::new_v1(codec, digest)
    }

    /// Returns the identifier version.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Returns the codec of the referenced block.
    #[must_use]
    pub const fn codec(&self) -> Codec {
        self.codec
    }

    /// Returns whether the referenced block is raw content.
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        matches!(self.codec, Codec::Raw)
    }

    /// Returns the sha2-256 digest.
    #[must_use]
    pub const fn digest(&self) -> &[u8; DIGEST_LEN] {
        &self.digest
    }

    /// Returns the version-1 form of this identifier.
    #[must_use]
    pub const fn to_v1(&self) -> Self {
        Self::new_v1(self.codec, self.digest)
    }

    /// Returns whether `data` hashes to this identifier's digest.
    #[must_use]
    pub fn verifies(&self, data: &[u8]) -> bool {
        let digest: [u8; DIGEST_LEN] = Sha256::digest(data).into();
        digest == self.digest
    }

    /// Returns the binary encoding.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + DIGEST_LEN);
        if self.version == Version::V1 {
            write_varint(&mut out, 1);
            write_varint(&mut out, self.codec.code());
        }
        write_varint(&mut out, SHA2_256);
        write_varint(&mut out, DIGEST_LEN as u64);
        out.extend_from_slice(&self.digest);
        out
    }

    /// Parses the binary encoding.
    ///
    /// A 34-byte input starting with the sha2-256 multihash header is a
    /// version-0 identifier.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown versions, codecs, hash functions, or
    /// trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> CodecResult<Self> {
        if bytes.len() == 2 + DIGEST_LEN && bytes[0] == SHA2_256 as u8 && bytes[1] == DIGEST_LEN as u8
        {
            return Ok(Self::new_v0(read_digest(&bytes[2..])?));
        }

        let (version, n) = read_varint_prefix(bytes)?;
        if version != 1 {
            return Err(CodecError::invalid_cid(format!(
                "unsupported version {version}"
            )));
        }
        let rest = &bytes[n..];
        let (code, n) = read_varint_prefix(rest)?;
        let codec = Codec::from_code(code)
            .ok_or_else(|| CodecError::invalid_cid(format!("unsupported codec 0x{code:x}")))?;
        let rest = &rest[n..];
        let (hash_code, n) = read_varint_prefix(rest)?;
        if hash_code != SHA2_256 {
            return Err(CodecError::invalid_cid(format!(
                "unsupported multihash 0x{hash_code:x}"
            )));
        }
        let rest = &rest[n..];
        let (len, n) = read_varint_prefix(rest)?;
        if len != DIGEST_LEN as u64 {
            return Err(CodecError::invalid_cid(format!(
                "sha2-256 digest length {len}"
            )));
        }
        let rest = &rest[n..];
        if rest.len() != DIGEST_LEN {
            return Err(CodecError::invalid_cid(format!(
                "expected {DIGEST_LEN} digest bytes, found {}",
                rest.len()
            )));
        }
        Ok(Self::new_v1(codec, read_digest(rest)?))
    }
}

fn read_digest(bytes: &[u8]) -> CodecResult<[u8; DIGEST_LEN]> {
    bytes
        .try_into()
        .map_err(|_| CodecError::invalid_cid("truncated digest"))
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Version::V0 => f.write_str(&base58_encode(&self.to_bytes())),
            Version::V1 => write!(f, "{BASE32_PREFIX}{}", base32_encode(&self.to_bytes())),
        }
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({self})")
    }
}

impl FromStr for Cid {
    type Err = CodecError;

    fn from_str(s: &str) -> CodecResult<Self> {
        if s.len() == 46 && s.starts_with("Qm") {
            let cid = Self::from_bytes(&base58_decode(s)?)?;
            if cid.version != Version::V0 {
                return Err(CodecError::invalid_cid("base58 text is not a version-0 CID"));
            }
            return Ok(cid);
        }
        match s.strip_prefix(BASE32_PREFIX) {
            Some(body) => Self::from_bytes(&base32_decode(body)?),
            None => Err(CodecError::invalid_cid(format!(
                "unsupported multibase in {s:?}"
            ))),
        }
    }
}

impl Serialize for Cid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Cid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_RAW: &str = "bafkreihdwdcefgh4dqkjv67uzcmw7ojee6xedzdetojuzjevtenxquvyku";
    const EMPTY_DIR: &str = "bafybeiczsscdsbs7ffqz55asqdf3smv6klcw3gofszvwlyarci47bgf354";
    const EMPTY_DIR_V0: &str = "QmUNLLsPACCz1vLxQVkXqqLX5R1X345qqfHbsf67hvA3Nn";

    #[test]
    fn hash_empty_raw_block() {
        let cid = Cid::hash(Codec::Raw, b"");
        assert_eq!(cid.to_string(), EMPTY_RAW);
        assert!(cid.is_raw());
    }

    #[test]
    fn hash_hello_world_raw_block() {
        let cid = Cid::hash(Codec::Raw, b"hello world");
        assert_eq!(
            cid.to_string(),
            "bafkreifzjut3te2nhyekklss27nh3k72ysco7y32koao5eei66wof36n5e"
        );
    }

    #[test]
    fn hash_empty_directory_node() {
        let cid = Cid::hash(Codec::DagPb, &[0x0a, 0x02, 0x08, 0x01]);
        assert_eq!(cid.to_string(), EMPTY_DIR);
    }

    #[test]
    fn parse_and_display_roundtrip() {
        let cid: Cid = EMPTY_DIR.parse().unwrap();
        assert_eq!(cid.codec(), Codec::DagPb);
        assert_eq!(cid.version(), Version::V1);
        assert_eq!(cid.to_string(), EMPTY_DIR);
    }

    #[test]
    fn v0_parses_and_upgrades() {
        let v0: Cid = EMPTY_DIR_V0.parse().unwrap();
        assert_eq!(v0.version(), Version::V0);
        assert_eq!(v0.to_string(), EMPTY_DIR_V0);
        assert_eq!(v0.to_v1().to_string(), EMPTY_DIR);
        assert_ne!(v0, v0.to_v1());
    }

    #[test]
    fn binary_roundtrip() {
        let cid = Cid::hash(Codec::DagPb, b"node");
        let bytes = cid.to_bytes();
        assert_eq!(bytes.len(), 36);
        assert_eq!(&bytes[..4], &[0x01, 0x70, 0x12, 0x20]);
        assert_eq!(Cid::from_bytes(&bytes).unwrap(), cid);

        let v0 = Cid::new_v0(*cid.digest());
        assert_eq!(v0.to_bytes().len(), 34);
        assert_eq!(Cid::from_bytes(&v0.to_bytes()).unwrap(), v0);
    }

    #[test]
    fn reject_unknown_codec() {
        let mut bytes = Cid::hash(Codec::Raw, b"x").to_bytes();
        bytes[1] = 0x71; // dag-cbor
        assert!(matches!(
            Cid::from_bytes(&bytes),
            Err(CodecError::InvalidCid { .. })
        ));
    }

    #[test]
    fn reject_trailing_bytes() {
        let mut bytes = Cid::hash(Codec::Raw, b"x").to_bytes();
        bytes.push(0);
        assert!(Cid::from_bytes(&bytes).is_err());
    }

    #[test]
    fn reject_unknown_multibase() {
        assert!("zb2rhe5P4gXftAwvA4eXQ5HJwsER2owDyS9sKaQRRVQPn93bA"
            .parse::<Cid>()
            .is_err());
        assert!("".parse::<Cid>().is_err());
    }

    #[test]
    fn verifies_content() {
        let cid = Cid::hash(Codec::Raw, b"abc");
        assert!(cid.verifies(b"abc"));
        assert!(!cid.verifies(b"abd"));
    }

    #[test]
    fn serde_uses_text_form() {
        let cid: Cid = EMPTY_RAW.parse().unwrap();
        let json = serde_json::to_string(&cid).unwrap();
        assert_eq!(json, format!("\"{EMPTY_RAW}\""));
        let back: Cid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cid);
    }
}
