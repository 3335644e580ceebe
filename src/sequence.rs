//! Fixed width rewrites between CESU-8 surrogate pairs and four-byte UTF-8 sequences.
//!
//! ```text
//! CESU-8:  1110 1101   1010 vvvv   10ww wwww   1110 1101   1011 yyyy   10zz zzzz
//!          u           v           w           x           y           z
//!                      VVVVV = vvvv + 1
//! UTF-8:   1111 0VVV               10VV wwww               10ww yyyy   10zz zzzz
//!          p                       q                       r           s
//! ```
//!
//! The `+ 1` is the `0x10000` offset UTF-16 subtracts before splitting a code point
//! into surrogates. The last byte is shared verbatim by both encodings.

use crate::patterns::{CONT, HIGH2, LEAD4, LEAD6, LOW2};

const SIX_BITS: u8 = 0x3F;
const FOUR_BITS: u8 = 0x0F;

/// A four-byte sequence whose value lies outside `U+10000..=U+10FFFF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange {
    /// The value the sequence decodes to (overlong values are below `0x10000`).
    pub code_point: u32,
}

#[inline]
fn comb(high: u32, low: u8, bits: u32) -> u32 {
    (high << bits) | u32::from(low)
}

/// Rewrites a predicate-verified CESU-8 surrogate pair into four-byte UTF-8.
#[inline]
pub fn contract_pair(pair: &[u8; 6]) -> [u8; 4] {
    let vvvv = pair[1] & FOUR_BITS;
    let wwwwww = pair[2] & SIX_BITS;
    let yyyy = pair[4] & FOUR_BITS;

    let high5 = vvvv + 1;

    [
        LEAD4 | (high5 >> 2),
        CONT | ((high5 & 0x03) << 4) | (wwwwww >> 2),
        CONT | ((wwwwww & 0x03) << 4) | yyyy,
        pair[5],
    ]
}

/// Rewrites a four-byte UTF-8 sequence (lead byte plus three continuation bytes) into a
/// CESU-8 surrogate pair.
///
/// Overlong sequences and values above `U+10FFFF` have no surrogate representation.
#[inline]
pub fn expand_four(seq: &[u8; 4]) -> Result<[u8; 6], OutOfRange> {
    let vvv = seq[0] & 0x07;
    let vvwwww = seq[1] & SIX_BITS;
    let wwyyyy = seq[2] & SIX_BITS;

    let high5 = (vvv << 2) | (vvwwww >> 4);
    let wwwwww = ((vvwwww & FOUR_BITS) << 2) | (wwyyyy >> 4);
    let yyyy = wwyyyy & FOUR_BITS;

    let vvvv = match high5.checked_sub(1) {
        Some(vvvv) if vvvv <= FOUR_BITS => vvvv,
        _ => {
            return Err(OutOfRange {
                code_point: four_code_point(seq),
            });
        }
    };

    Ok([
        LEAD6,
        HIGH2 | vvvv,
        CONT | wwwwww,
        LEAD6,
        LOW2 | yyyy,
        seq[3],
    ])
}

/// The code point a CESU-8 surrogate pair stands for.
#[inline]
pub fn pair_code_point(pair: &[u8; 6]) -> u32 {
    let high5 = u32::from(pair[1] & FOUR_BITS) + 1;
    let value = comb(high5, pair[2] & SIX_BITS, 6);
    let value = comb(value, pair[4] & FOUR_BITS, 4);
    comb(value, pair[5] & SIX_BITS, 6)
}

/// The value of a four-byte UTF-8 sequence, including out of range ones.
#[inline]
pub fn four_code_point(seq: &[u8; 4]) -> u32 {
    let value = u32::from(seq[0] & 0x07);
    let value = comb(value, seq[1] & SIX_BITS, 6);
    let value = comb(value, seq[2] & SIX_BITS, 6);
    comb(value, seq[3] & SIX_BITS, 6)
}

/// The UTF-16 code unit held by a three-byte sequence, used to report unpaired surrogates.
#[inline]
pub fn triplet_code_unit(triplet: &[u8; 3]) -> u16 {
    let value = u32::from(triplet[0] & FOUR_BITS);
    let value = comb(value, triplet[1] & SIX_BITS, 6);
    // Four plus two six-bit groups always fit in sixteen bits.
    comb(value, triplet[2] & SIX_BITS, 6) as u16
}
