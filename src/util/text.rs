//! Windows-1252 text encoding.
//!
//! Every byte maps to exactly one character. Bytes 0x80..=0x9F use the
//! Windows-1252 table; the five holes in that table map to the C1 control
//! with the same value, so decoding never fails.

use super::{Error, Result};

/// Characters for bytes 0x80..=0x9F.
const HIGH_TABLE: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

/// Decode one byte.
#[inline]
pub fn decode_byte(b: u8) -> char {
    match b {
        0x80..=0x9F => HIGH_TABLE[(b - 0x80) as usize],
        _ => b as char,
    }
}

/// Encode one character.
pub fn encode_char(c: char) -> Result<u8> {
    let code = c as u32;
    if code < 0x80 || (0xA0..=0xFF).contains(&code) {
        return Ok(code as u8);
    }
    HIGH_TABLE
        .iter()
        .position(|&t| t == c)
        .map(|i| 0x80 + i as u8)
        .ok_or(Error::EncodingError(c))
}

/// Decode a byte string.
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| decode_byte(b)).collect()
}

/// Encode a string, failing on the first unrepresentable character.
pub fn encode(s: &str) -> Result<Vec<u8>> {
    s.chars().map(encode_char).collect()
}
