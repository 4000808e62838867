//! Conversions between little-endian bytes and 32-bit words, plus rotations.
//!
//! Everything the hash does is on `u32` words read in little endian, so these are
//! the only byte-level helpers the rest of the crate needs.

/// Number of bytes in a word.
pub const WORD_BYTES: usize = 4;

/// Reads a little-endian word from 4 bytes.
#[inline]
pub fn word_from_bytes(bytes: [u8; WORD_BYTES]) -> u32 {
    u32::from_le_bytes(bytes)
}

/// Writes a word as 4 little-endian bytes.
#[inline]
pub fn bytes_from_word(word: u32) -> [u8; WORD_BYTES] {
    word.to_le_bytes()
}

/// Reads the little-endian word at `offset`.
///
/// Panics if there are less than 4 bytes left at `offset`, same as slice indexing.
#[inline]
pub(crate) fn read_word(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; WORD_BYTES];
    word.copy_from_slice(&bytes[offset..offset + WORD_BYTES]);
    word_from_bytes(word)
}

#[inline]
pub fn rotate_right(word: u32, bits: u32) -> u32 {
    word.rotate_right(bits)
}

#[inline]
pub fn rotate_left(word: u32, bits: u32) -> u32 {
    word.rotate_left(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn little_endian() {
        assert_eq!(word_from_bytes([0x78, 0x56, 0x34, 0x12]), 0x12345678);
        assert_eq!(bytes_from_word(0xdeadbeef), [0xef, 0xbe, 0xad, 0xde]);
        assert_eq!(read_word(&[0, 1, 2, 3, 4, 5, 6, 7], 4), 0x07060504);
    }
    #[test]
    fn rotations() {
        assert_eq!(rotate_right(0x0000_0001, 1), 0x8000_0000);
        assert_eq!(rotate_left(0x8000_0000, 17), 0x0001_0000);
        assert_eq!(rotate_right(0x1234_5678, 0), 0x1234_5678);
    }
    #[quickcheck]
    fn qc_codec_roundtrip(w: u32) -> bool {
        word_from_bytes(bytes_from_word(w)) == w
    }
    #[quickcheck]
    fn qc_rotate_inverse(w: u32, b: u8) -> bool {
        let b = (b % 32) as u32;
        rotate_left(rotate_right(w, b), b) == w
    }
    #[quickcheck]
    fn qc_read_word_offset(x: u64, y: u32) -> bool {
        let mut bytes = x.to_le_bytes().to_vec();
        bytes.extend_from_slice(&y.to_le_bytes());
        read_word(&bytes, 8) == y && read_word(&bytes, 0) == x as u32
    }
}
