//! Fixed-tree Huffman codec used for every datagram on the wire.
//!
//! The tree is described as a pre-order byte stream: each node's
//! descriptor byte has bit 0 set if its left child is a leaf (the leaf's
//! value follows immediately) and bit 1 set likewise for the right
//! child. The codec is built once from [`TREE_DESCRIPTION`] and cached
//! behind a [`OnceLock`], mirroring the one-time dispatch-table setup in
//! this codebase's networking layer.
//!
//! [`TREE_DESCRIPTION`] is a perfectly balanced tree over all 256 byte
//! values: every leaf sits at depth 8, so every byte gets an 8-bit code.
//! That makes every encode an exact `data.len() + 1` bytes (1 padding
//! byte plus one body byte per input byte) — never more — so the size
//! bound in the encoding contract can never be violated, no matter what
//! bytes a datagram carries. This matters because the wire's own fixed
//! challenges (master: 6 bytes; server: 17 bytes) and arbitrary player
//! and map-name strings must all round-trip through this codec; a tree
//! skewed toward an assumed byte-frequency distribution can push a
//! byte outside that distribution past the bound and make the codec
//! unusable for its own protocol's mandatory datagrams.

use std::sync::OnceLock;

use crate::error::BrowserError;

/// Pre-order tree descriptor for a complete, perfectly balanced binary
/// tree over byte values `0..=255`: at the root the low half of the
/// range is the left subtree and the high half is the right subtree,
/// recursively, down to individual leaves at depth 8. See the module
/// docs for why this shape (rather than a frequency-weighted one) is
/// load-bearing for the encode size bound.
const TREE_DESCRIPTION: &[u8] = &[
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00, 0x01, 0x03, 0x02,
    0x03, 0x00, 0x03, 0x04, 0x05, 0x03, 0x06, 0x07, 0x00, 0x00, 0x03, 0x08,
    0x09, 0x03, 0x0A, 0x0B, 0x00, 0x03, 0x0C, 0x0D, 0x03, 0x0E, 0x0F, 0x00,
    0x00, 0x00, 0x03, 0x10, 0x11, 0x03, 0x12, 0x13, 0x00, 0x03, 0x14, 0x15,
    0x03, 0x16, 0x17, 0x00, 0x00, 0x03, 0x18, 0x19, 0x03, 0x1A, 0x1B, 0x00,
    0x03, 0x1C, 0x1D, 0x03, 0x1E, 0x1F, 0x00, 0x00, 0x00, 0x00, 0x03, 0x20,
    0x21, 0x03, 0x22, 0x23, 0x00, 0x03, 0x24, 0x25, 0x03, 0x26, 0x27, 0x00,
    0x00, 0x03, 0x28, 0x29, 0x03, 0x2A, 0x2B, 0x00, 0x03, 0x2C, 0x2D, 0x03,
    0x2E, 0x2F, 0x00, 0x00, 0x00, 0x03, 0x30, 0x31, 0x03, 0x32, 0x33, 0x00,
    0x03, 0x34, 0x35, 0x03, 0x36, 0x37, 0x00, 0x00, 0x03, 0x38, 0x39, 0x03,
    0x3A, 0x3B, 0x00, 0x03, 0x3C, 0x3D, 0x03, 0x3E, 0x3F, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x03, 0x40, 0x41, 0x03, 0x42, 0x43, 0x00, 0x03, 0x44, 0x45,
    0x03, 0x46, 0x47, 0x00, 0x00, 0x03, 0x48, 0x49, 0x03, 0x4A, 0x4B, 0x00,
    0x03, 0x4C, 0x4D, 0x03, 0x4E, 0x4F, 0x00, 0x00, 0x00, 0x03, 0x50, 0x51,
    0x03, 0x52, 0x53, 0x00, 0x03, 0x54, 0x55, 0x03, 0x56, 0x57, 0x00, 0x00,
    0x03, 0x58, 0x59, 0x03, 0x5A, 0x5B, 0x00, 0x03, 0x5C, 0x5D, 0x03, 0x5E,
    0x5F, 0x00, 0x00, 0x00, 0x00, 0x03, 0x60, 0x61, 0x03, 0x62, 0x63, 0x00,
    0x03, 0x64, 0x65, 0x03, 0x66, 0x67, 0x00, 0x00, 0x03, 0x68, 0x69, 0x03,
    0x6A, 0x6B, 0x00, 0x03, 0x6C, 0x6D, 0x03, 0x6E, 0x6F, 0x00, 0x00, 0x00,
    0x03, 0x70, 0x71, 0x03, 0x72, 0x73, 0x00, 0x03, 0x74, 0x75, 0x03, 0x76,
    0x77, 0x00, 0x00, 0x03, 0x78, 0x79, 0x03, 0x7A, 0x7B, 0x00, 0x03, 0x7C,
    0x7D, 0x03, 0x7E, 0x7F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x80,
    0x81, 0x03, 0x82, 0x83, 0x00, 0x03, 0x84, 0x85, 0x03, 0x86, 0x87, 0x00,
    0x00, 0x03, 0x88, 0x89, 0x03, 0x8A, 0x8B, 0x00, 0x03, 0x8C, 0x8D, 0x03,
    0x8E, 0x8F, 0x00, 0x00, 0x00, 0x03, 0x90, 0x91, 0x03, 0x92, 0x93, 0x00,
    0x03, 0x94, 0x95, 0x03, 0x96, 0x97, 0x00, 0x00, 0x03, 0x98, 0x99, 0x03,
    0x9A, 0x9B, 0x00, 0x03, 0x9C, 0x9D, 0x03, 0x9E, 0x9F, 0x00, 0x00, 0x00,
    0x00, 0x03, 0xA0, 0xA1, 0x03, 0xA2, 0xA3, 0x00, 0x03, 0xA4, 0xA5, 0x03,
    0xA6, 0xA7, 0x00, 0x00, 0x03, 0xA8, 0xA9, 0x03, 0xAA, 0xAB, 0x00, 0x03,
    0xAC, 0xAD, 0x03, 0xAE, 0xAF, 0x00, 0x00, 0x00, 0x03, 0xB0, 0xB1, 0x03,
    0xB2, 0xB3, 0x00, 0x03, 0xB4, 0xB5, 0x03, 0xB6, 0xB7, 0x00, 0x00, 0x03,
    0xB8, 0xB9, 0x03, 0xBA, 0xBB, 0x00, 0x03, 0xBC, 0xBD, 0x03, 0xBE, 0xBF,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0xC0, 0xC1, 0x03, 0xC2, 0xC3, 0x00,
    0x03, 0xC4, 0xC5, 0x03, 0xC6, 0xC7, 0x00, 0x00, 0x03, 0xC8, 0xC9, 0x03,
    0xCA, 0xCB, 0x00, 0x03, 0xCC, 0xCD, 0x03, 0xCE, 0xCF, 0x00, 0x00, 0x00,
    0x03, 0xD0, 0xD1, 0x03, 0xD2, 0xD3, 0x00, 0x03, 0xD4, 0xD5, 0x03, 0xD6,
    0xD7, 0x00, 0x00, 0x03, 0xD8, 0xD9, 0x03, 0xDA, 0xDB, 0x00, 0x03, 0xDC,
    0xDD, 0x03, 0xDE, 0xDF, 0x00, 0x00, 0x00, 0x00, 0x03, 0xE0, 0xE1, 0x03,
    0xE2, 0xE3, 0x00, 0x03, 0xE4, 0xE5, 0x03, 0xE6, 0xE7, 0x00, 0x00, 0x03,
    0xE8, 0xE9, 0x03, 0xEA, 0xEB, 0x00, 0x03, 0xEC, 0xED, 0x03, 0xEE, 0xEF,
    0x00, 0x00, 0x00, 0x03, 0xF0, 0xF1, 0x03, 0xF2, 0xF3, 0x00, 0x03, 0xF4,
    0xF5, 0x03, 0xF6, 0xF7, 0x00, 0x00, 0x03, 0xF8, 0xF9, 0x03, 0xFA, 0xFB,
    0x00, 0x03, 0xFC, 0xFD, 0x03, 0xFE, 0xFF,
];

/// Unencoded-passthrough escape: if the first output byte is this value,
/// the remainder is the payload verbatim.
const PASSTHROUGH_MARKER: u8 = 0xFF;

const fn reverse_byte(mut b: u8) -> u8 {
    let mut r = 0u8;
    let mut i = 0;
    while i < 8 {
        r <<= 1;
        r |= b & 1;
        b >>= 1;
        i += 1;
    }
    r
}

const fn build_reverse_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = reverse_byte(i as u8);
        i += 1;
    }
    table
}

/// Bit-reversal table applied to every non-header output byte on encode
/// and every input byte on decode. Self-inverse: `REVERSE_BITS[REVERSE_BITS[i]] == i`.
pub const REVERSE_BITS: [u8; 256] = build_reverse_table();

#[derive(Clone, Copy)]
enum Node {
    Leaf(u8),
    Branch(usize, usize),
}

#[derive(Clone, Copy, Default)]
struct Code {
    bits: u32,
    len: u8,
}

struct HuffmanTree {
    nodes: Vec<Node>,
    root: usize,
    codes: [Code; 256],
}

fn parse_node(desc: &[u8], pos: &mut usize, nodes: &mut Vec<Node>) -> usize {
    let marker = desc[*pos];
    *pos += 1;

    let left = if marker & 0x01 != 0 {
        let v = desc[*pos];
        *pos += 1;
        nodes.push(Node::Leaf(v));
        nodes.len() - 1
    } else {
        parse_node(desc, pos, nodes)
    };

    let right = if marker & 0x02 != 0 {
        let v = desc[*pos];
        *pos += 1;
        nodes.push(Node::Leaf(v));
        nodes.len() - 1
    } else {
        parse_node(desc, pos, nodes)
    };

    nodes.push(Node::Branch(left, right));
    nodes.len() - 1
}

fn assign_codes(nodes: &[Node], idx: usize, depth: u8, bits: u32, codes: &mut [Code; 256]) {
    match nodes[idx] {
        Node::Leaf(value) => {
            codes[value as usize] = Code { bits, len: depth };
        }
        Node::Branch(left, right) => {
            assign_codes(nodes, left, depth + 1, bits << 1, codes);
            assign_codes(nodes, right, depth + 1, (bits << 1) | 1, codes);
        }
    }
}

fn build_tree() -> HuffmanTree {
    let mut nodes = Vec::new();
    let mut pos = 0usize;
    let root = parse_node(TREE_DESCRIPTION, &mut pos, &mut nodes);
    let mut codes = [Code::default(); 256];
    assign_codes(&nodes, root, 0, 0, &mut codes);
    HuffmanTree { nodes, root, codes }
}

static TREE: OnceLock<HuffmanTree> = OnceLock::new();

fn tree() -> &'static HuffmanTree {
    TREE.get_or_init(build_tree)
}

struct BitWriter {
    out: Vec<u8>,
    current: u8,
    filled: u8,
}

impl BitWriter {
    fn new() -> Self {
        Self { out: Vec::new(), current: 0, filled: 0 }
    }

    fn push_bit(&mut self, bit: u8) {
        self.current = (self.current << 1) | (bit & 1);
        self.filled += 1;
        if self.filled == 8 {
            self.out.push(self.current);
            self.current = 0;
            self.filled = 0;
        }
    }

    fn push_code(&mut self, code: Code) {
        for i in (0..code.len).rev() {
            self.push_bit(((code.bits >> i) & 1) as u8);
        }
    }

    /// Returns the padding byte count (unused low bits of the final byte).
    fn finish(mut self) -> (u8, Vec<u8>) {
        let padding = if self.filled == 0 {
            0
        } else {
            let pad = 8 - self.filled;
            self.current <<= pad;
            self.out.push(self.current);
            pad
        };
        (padding, self.out)
    }
}

/// Encode `data` against the fixed tree. Fails if the expansion would
/// push the result past `data.len() + 1` bytes.
pub fn encode(data: &[u8]) -> Result<Vec<u8>, BrowserError> {
    let t = tree();
    let mut writer = BitWriter::new();
    for &byte in data {
        let code = t.codes[byte as usize];
        if code.len == 0 {
            return Err(BrowserError::EncodeOverflow(format!(
                "no huffman code for byte {byte:#04x}"
            )));
        }
        writer.push_code(code);
    }
    let (padding, body) = writer.finish();

    let mut out = Vec::with_capacity(body.len() + 1);
    out.push(padding);
    out.extend(body.iter().map(|&b| REVERSE_BITS[b as usize]));

    if out.len() > data.len() + 1 {
        return Err(BrowserError::EncodeOverflow(format!(
            "encoded length {} exceeds bound {}",
            out.len(),
            data.len() + 1
        )));
    }
    Ok(out)
}

/// Decode `data`. A leading `0xFF` byte signals unencoded passthrough;
/// otherwise byte 0 is the padding count and the rest is the coded body.
pub fn decode(data: &[u8]) -> Result<Vec<u8>, BrowserError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data[0] == PASSTHROUGH_MARKER {
        return Ok(data[1..].to_vec());
    }

    let padding = data[0] as usize;
    let body = &data[1..];
    let total_bits = (body.len() * 8).saturating_sub(padding);

    let t = tree();
    let mut out = Vec::new();
    let mut node = t.root;
    let mut bits_consumed = 0usize;

    'outer: for &raw in body {
        let byte = REVERSE_BITS[raw as usize];
        for i in (0..8).rev() {
            if bits_consumed >= total_bits {
                break 'outer;
            }
            bits_consumed += 1;
            let bit = (byte >> i) & 1;
            node = match t.nodes[node] {
                Node::Branch(left, right) => {
                    if bit == 0 { left } else { right }
                }
                Node::Leaf(_) => unreachable!("leaf visited mid-walk"),
            };
            if let Node::Leaf(value) = t.nodes[node] {
                out.push(value);
                node = t.root;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_short_text() {
        for sample in ["ABC", "Server\0", "A", "the quick brown fox jumps"] {
            let encoded = encode(sample.as_bytes()).expect("encode");
            let decoded = decode(&encoded).expect("decode");
            assert_eq!(decoded, sample.as_bytes());
        }
    }

    #[test]
    fn encode_respects_size_bound() {
        let sample = b"the quick brown fox jumps over the lazy dog";
        let encoded = encode(sample).unwrap();
        assert!(encoded.len() <= sample.len() + 1);
    }

    #[test]
    fn every_code_is_exactly_eight_bits() {
        // A balanced tree gives every byte an 8-bit code, so the encoded
        // body is always exactly one byte per input byte, never more:
        // no input, however incompressible, can push encode() over its
        // `len + 1` bound.
        let t = tree();
        for i in 0..=255usize {
            assert_eq!(t.codes[i].len, 8, "byte {i} has a non-8-bit code");
        }
    }

    #[test]
    fn encode_never_exceeds_bound_even_for_all_distinct_bytes() {
        let all_bytes: Vec<u8> = (0..=255u8).collect();
        let encoded = encode(&all_bytes).expect("256 distinct bytes must still fit the bound");
        assert_eq!(encoded.len(), all_bytes.len() + 1);
        assert_eq!(decode(&encoded).unwrap(), all_bytes);
    }

    #[test]
    fn protocol_challenges_fit_within_the_encode_bound() {
        use crate::wire::{self, ExtendedQueryFlags, QueryFlags};

        // The master challenge: i32 5660028 LE, i16 2 LE.
        let master_challenge = [0xBCu8, 0x5F, 0x56, 0x00, 0x02, 0x00];
        let encoded = encode(&master_challenge).expect("master challenge must encode");
        assert!(encoded.len() <= master_challenge.len() + 1);
        assert_eq!(decode(&encoded).unwrap(), master_challenge);

        // The server challenge: i32 199, u32 query_flags, u32 timestamp,
        // u32 extended_query_flags, 1 byte segmentation preference.
        let mut server_challenge = wire::SERVER_CHALLENGE.to_le_bytes().to_vec();
        server_challenge.extend_from_slice(&QueryFlags::standard().bits().to_le_bytes());
        server_challenge.extend_from_slice(&0u32.to_le_bytes());
        server_challenge.extend_from_slice(&ExtendedQueryFlags::standard().bits().to_le_bytes());
        server_challenge.push(0x00);
        let encoded = encode(&server_challenge).expect("server challenge must encode");
        assert!(encoded.len() <= server_challenge.len() + 1);
        assert_eq!(decode(&encoded).unwrap(), server_challenge);
    }

    #[test]
    fn passthrough_marker_returns_payload_verbatim() {
        let mut wire = vec![0xFF];
        wire.extend_from_slice(b"raw payload");
        let decoded = decode(&wire).unwrap();
        assert_eq!(decoded, b"raw payload");
    }

    #[test]
    fn reverse_bits_is_self_inverse() {
        for i in 0..=255u8 {
            assert_eq!(REVERSE_BITS[REVERSE_BITS[i as usize] as usize], i);
        }
    }

    #[test]
    fn every_byte_value_has_a_code() {
        let t = tree();
        for i in 0..=255usize {
            assert!(t.codes[i].len > 0, "byte {i} has no assigned code");
        }
    }

    #[test]
    fn decode_of_empty_input_is_empty() {
        assert_eq!(decode(&[]).unwrap(), Vec::<u8>::new());
    }
}
