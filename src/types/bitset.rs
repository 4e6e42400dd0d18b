//! "Matters" bitsets attached to sequences.
//!
//! On disk: the word count twice, then the words. Bit `i` lives at
//! `words[i >> 5] & (1 << (i & 31))`.

use std::io::{Read, Write};

use crate::stream::plain;
use crate::util::Result;

/// Read a bitset, expanded to one bool per stored bit.
///
/// The result holds `words * 32` entries; callers truncate to the real
/// entity count.
pub fn read_bit_set<R: Read>(r: &mut R) -> Result<Vec<bool>> {
    let _dummy = plain::read_i32(r)?;
    let num_words = plain::read_len(r)?;
    let words = plain::read_vec(r, num_words, plain::read_u32)?;
    Ok((0..words.len() * 32)
        .map(|i| words[i >> 5] & (1 << (i & 31)) != 0)
        .collect())
}

/// Write a bitset, packing 32 bits per word.
pub fn write_bit_set<W: Write>(w: &mut W, bits: &[bool]) -> Result<()> {
    let mut words = vec![0u32; bits.len().div_ceil(32)];
    for (i, &set) in bits.iter().enumerate() {
        if set {
            words[i >> 5] |= 1 << (i & 31);
        }
    }
    plain::write_len(w, words.len())?;
    plain::write_len(w, words.len())?;
    for word in words {
        plain::write_u32(w, word)?;
    }
    Ok(())
}

/// Indices of set bits among the first `count` entries.
pub fn set_indices(bits: &[bool], count: usize) -> Vec<usize> {
    bits.iter()
        .take(count)
        .enumerate()
        .filter_map(|(i, &set)| set.then_some(i))
        .collect()
}
