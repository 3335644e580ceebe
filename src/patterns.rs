//! Bit patterns recognized by the converter.
//!
//! CESU-8 surrogate triplets and UTF-8 four-byte sequences look like this:
//!
//! ```text
//! high surrogate:  1110 1101   1010 vvvv   10ww wwww      ED A0..AF 80..BF
//! low surrogate:   1110 1101   1011 yyyy   10zz zzzz      ED B0..BF 80..BF
//! four-byte UTF-8: 1111 0VVV   10VV wwww   10ww yyyy   10zz zzzz
//! ```
//!
//! All predicates take the whole buffer plus an offset and return `false` when the window
//! does not fit, so callers never index out of bounds.

/// First byte of either surrogate triplet.
pub const LEAD6: u8 = 0xED;

pub const HIGH2_MASK: u8 = 0xF0;
/// Second byte of a high surrogate triplet (`1010 vvvv`).
pub const HIGH2: u8 = 0xA0;

pub const LOW2_MASK: u8 = 0xF0;
/// Second byte of a low surrogate triplet (`1011 yyyy`).
pub const LOW2: u8 = 0xB0;

pub const CONT_MASK: u8 = 0xC0;
/// Any continuation byte (`10xx xxxx`).
pub const CONT: u8 = 0x80;

pub const LEAD4_MASK: u8 = 0xF8;
/// First byte of a four-byte UTF-8 sequence (`1111 0VVV`).
pub const LEAD4: u8 = 0xF0;

/// Length of one surrogate triplet.
pub const TRIPLET_LEN: usize = 3;
/// Length of a CESU-8 surrogate pair.
pub const PAIR_LEN: usize = 6;
/// Length of a four-byte UTF-8 sequence.
pub const FOUR_LEN: usize = 4;

#[inline]
pub fn is_continuation(byte: u8) -> bool {
    byte & CONT_MASK == CONT
}

#[inline]
pub fn is_lead4(byte: u8) -> bool {
    byte & LEAD4_MASK == LEAD4
}

#[inline]
pub fn is_high_triplet(buf: &[u8], i: usize) -> bool {
    matches!(
        buf.get(i..i + TRIPLET_LEN),
        Some(&[LEAD6, v, w]) if v & HIGH2_MASK == HIGH2 && is_continuation(w)
    )
}

#[inline]
pub fn is_low_triplet(buf: &[u8], i: usize) -> bool {
    matches!(
        buf.get(i..i + TRIPLET_LEN),
        Some(&[LEAD6, y, z]) if y & LOW2_MASK == LOW2 && is_continuation(z)
    )
}

#[inline]
pub fn is_surrogate_pair(buf: &[u8], i: usize) -> bool {
    is_high_triplet(buf, i) && is_low_triplet(buf, i + TRIPLET_LEN)
}

#[inline]
pub fn is_standard_four(buf: &[u8], i: usize) -> bool {
    matches!(
        buf.get(i..i + FOUR_LEN),
        Some(&[p, q, r, s]) if is_lead4(p) && is_continuation(q) && is_continuation(r) && is_continuation(s)
    )
}

/// Offset of the next `0xED` in `buf[from..]`, or `buf.len()` if there is none.
#[inline]
pub fn find_lead6(buf: &[u8], from: usize) -> usize {
    buf[from..]
        .iter()
        .position(|&b| b == LEAD6)
        .map_or(buf.len(), |pos| from + pos)
}

/// Offset of the next four-byte lead byte in `buf[from..]`, or `buf.len()` if there is none.
#[inline]
pub fn find_lead4(buf: &[u8], from: usize) -> usize {
    buf[from..]
        .iter()
        .position(|&b| is_lead4(b))
        .map_or(buf.len(), |pos| from + pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognizes_grinning_face_pair() {
        let buf = [0x41, 0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80];
        assert!(is_high_triplet(&buf, 1));
        assert!(is_low_triplet(&buf, 4));
        assert!(is_surrogate_pair(&buf, 1));
        assert!(!is_surrogate_pair(&buf, 0));
    }

    #[test]
    fn test_high_and_low_triplets_are_disjoint() {
        for second in 0x80..=0xBF_u8 {
            let buf = [LEAD6, second, 0x80];
            assert!(!(is_high_triplet(&buf, 0) && is_low_triplet(&buf, 0)));
            assert_eq!(is_high_triplet(&buf, 0), (0xA0..=0xAF).contains(&second));
            assert_eq!(is_low_triplet(&buf, 0), (0xB0..=0xBF).contains(&second));
        }
    }

    #[test]
    fn test_non_surrogate_ed_sequence_is_not_a_triplet() {
        // U+D55C (HANGUL SYLLABLE HAN) starts with 0xED too.
        let buf = "\u{D55C}".as_bytes();
        assert_eq!(buf[0], LEAD6);
        assert!(!is_high_triplet(buf, 0));
        assert!(!is_low_triplet(buf, 0));
    }

    #[test]
    fn test_triplet_requires_continuation_third_byte() {
        assert!(!is_high_triplet(&[0xED, 0xA0, 0x41], 0));
        assert!(!is_low_triplet(&[0xED, 0xB0, 0xC0], 0));
    }

    #[test]
    fn test_windows_past_the_end_never_match() {
        let buf = [0xED, 0xA0];
        assert!(!is_high_triplet(&buf, 0));
        assert!(!is_standard_four(&[0xF0, 0x9F, 0x98], 0));
        assert!(!is_surrogate_pair(&[0xED, 0xA0, 0xBD, 0xED, 0xB8], 0));
    }

    #[test]
    fn test_standard_four() {
        assert!(is_standard_four("\u{1F600}".as_bytes(), 0));
        assert!(is_standard_four(&[0xF7, 0xBF, 0xBF, 0xBF], 0));
        assert!(!is_standard_four(&[0xF8, 0x80, 0x80, 0x80], 0));
        assert!(!is_standard_four(&[0xF0, 0x80, 0x41, 0x80], 0));
    }

    #[test]
    fn test_find_lead_bytes() {
        let buf = b"ab\xEDc\xF3";
        assert_eq!(find_lead6(buf, 0), 2);
        assert_eq!(find_lead6(buf, 3), buf.len());
        assert_eq!(find_lead4(buf, 0), 4);
        assert_eq!(find_lead4(buf, buf.len()), buf.len());
    }
}
