//! Known-answer vectors for node encodings and identifiers.
//!
//! Identifiers here match those computed by any other implementation that
//! stores the same logical tree, so these vectors pin the wire format.

use serde::{Deserialize, Serialize};

/// A node encoding and the identifier it hashes to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Block bytes (hex-encoded).
    pub block_hex: String,
    /// Expected identifier text.
    pub expected_cid: String,
}

/// Raw block vectors.
pub fn raw_block_vectors() -> Vec<TestVector> {
    vec![
        TestVector {
            id: "raw_empty".into(),
            description: "Empty raw block".into(),
            block_hex: String::new(),
            expected_cid: "bafkreihdwdcefgh4dqkjv67uzcmw7ojee6xedzdetojuzjevtenxquvyku".into(),
        },
        TestVector {
            id: "raw_hello_world".into(),
            description: "Raw block \"hello world\"".into(),
            block_hex: hex_encode(b"hello world"),
            expected_cid: "bafkreifzjut3te2nhyekklss27nh3k72ysco7y32koao5eei66wof36n5e".into(),
        },
    ]
}

/// Composite node vectors.
pub fn node_vectors() -> Vec<TestVector> {
    vec![
        TestVector {
            id: "dir_empty".into(),
            description: "Directory with no entries".into(),
            block_hex: "0a020801".into(),
            expected_cid: "bafybeiczsscdsbs7ffqz55asqdf3smv6klcw3gofszvwlyarci47bgf354".into(),
        },
        TestVector {
            id: "file_empty".into(),
            description: "File node with no data and no children".into(),
            block_hex: "0a0408021800".into(),
            expected_cid: "bafybeif7ztnhq65lumvvtr4ekcwd2ifwgm3awq4zfr3srh462rwyinlb4y".into(),
        },
        TestVector {
            id: "file_inline".into(),
            description: "File node holding \"hi\" inline".into(),
            block_hex: "0a080802120268691802".into(),
            expected_cid: "bafybeihc73huxdpsqleijcxj64fnn2lqng2dl5nvsb6d777bjjv7lpxq3i".into(),
        },
        TestVector {
            id: "file_concat".into(),
            description: "Concatenation of \"hello world\" and \"test data\"".into(),
            block_hex: concat!(
                "122a0a2401551220b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde91200180b",
                "122a0a2401551220916f0027a575074ce72a331777c3478d6513f786a591bd892da1a577bf2335f912001809",
                "0a0808021814200b2009",
            )
            .into(),
            expected_cid: "bafybeiguf2ugkz37l54ufmd5gta7bd6owxodcugjgxhtppgsqhulriykbu".into(),
        },
        TestVector {
            id: "dir_one_entry".into(),
            description: "Directory linking iana.cdxj (5866 bytes)".into(),
            block_hex: concat!(
                "12340a24015512202681f1479045db99eb4700e9dfe315792637cec221eb57ac890fbf634ec9",
                "8826120969616e612e6364786a18ea2d0a020801",
            )
            .into(),
            expected_cid: "bafybeiamyttrkfzdpwyfja5ilcfpc32ekxzqqz52jdmveeh64oerggjo34".into(),
        },
    ]
}

/// All vectors as a JSON array, for sharing with other implementations.
pub fn vectors_json() -> String {
    let all: Vec<TestVector> = raw_block_vectors().into_iter().chain(node_vectors()).collect();
    serde_json::to_string_pretty(&all).expect("Vectors serialize")
}

/// Encodes bytes as lower-case hex.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decodes hex produced by [`hex_encode`].
///
/// # Panics
///
/// Panics on odd length or non-hex characters.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    assert!(hex.len() % 2 == 0, "Odd-length hex string");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Invalid hex"))
        .collect()
}
