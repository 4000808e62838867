//! The 8-byte inputs that get hashed and the differences applied to them.
//!
//! A block is two little-endian words, `half0` (bytes 0 to 3) and `half1` (bytes 4 to 7),
//! and a difference pair adds one wrapping difference to each of them.
use crate::word::{WORD_BYTES, bytes_from_word, read_word};
use rand::Rng;
use std::fmt::Display;
use std::str::FromStr;

/// Number of bytes in a block.
pub const BLOCK_BYTES: usize = 2 * WORD_BYTES;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Block8 {
    bytes: [u8; BLOCK_BYTES],
}

impl Block8 {
    pub fn new(bytes: [u8; BLOCK_BYTES]) -> Self {
        Block8 { bytes }
    }
    pub fn from_halves(half0: u32, half1: u32) -> Self {
        let mut bytes = [0u8; BLOCK_BYTES];
        bytes[..WORD_BYTES].copy_from_slice(&bytes_from_word(half0));
        bytes[WORD_BYTES..].copy_from_slice(&bytes_from_word(half1));
        Block8 { bytes }
    }
    /// Draws all 8 bytes uniformly from `rng`.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Block8 {
            bytes: rng.random(),
        }
    }
    pub fn half0(&self) -> u32 {
        read_word(&self.bytes, 0)
    }
    pub fn half1(&self) -> u32 {
        read_word(&self.bytes, WORD_BYTES)
    }
    pub fn as_bytes(&self) -> &[u8; BLOCK_BYTES] {
        &self.bytes
    }
    /// Returns a new block with `pair.diff0` added to the first half and `pair.diff1`
    /// added to the second half, both modulo 2^32.
    pub fn apply(&self, pair: DifferencePair) -> Block8 {
        Block8::from_halves(
            self.half0().wrapping_add(pair.diff0),
            self.half1().wrapping_add(pair.diff1),
        )
    }
}

impl From<[u8; BLOCK_BYTES]> for Block8 {
    fn from(bytes: [u8; BLOCK_BYTES]) -> Self {
        Block8::new(bytes)
    }
}

impl Display for Block8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.bytes))
    }
}

impl FromStr for Block8 {
    type Err = hex::FromHexError;
    /// Parses 16 hex digits, optionally prefixed by `0x`, in byte order.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; BLOCK_BYTES];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(Block8 { bytes })
    }
}

/// Wrapping differences for the two halves of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct DifferencePair {
    pub diff0: u32,
    pub diff1: u32,
}

impl DifferencePair {
    pub fn new(diff0: u32, diff1: u32) -> Self {
        DifferencePair { diff0, diff1 }
    }
    /// The pair that leaves every block unchanged.
    pub fn is_identity(&self) -> bool {
        self.diff0 == 0 && self.diff1 == 0
    }
}

impl From<(u32, u32)> for DifferencePair {
    fn from((diff0, diff1): (u32, u32)) -> Self {
        DifferencePair { diff0, diff1 }
    }
}

impl Display for DifferencePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:#x}, {:#x})", self.diff0, self.diff1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen};
    impl Arbitrary for Block8 {
        fn arbitrary(g: &mut Gen) -> Self {
            Block8::new(u64::arbitrary(g).to_le_bytes())
        }
    }
    #[test]
    fn halves() {
        let block = Block8::new([1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(block.half0(), 0x04030201);
        assert_eq!(block.half1(), 0x08070605);
        assert_eq!(Block8::from_halves(0x04030201, 0x08070605), block);
    }
    #[test]
    fn apply_wraps() {
        let block = Block8::from_halves(0xffff_ffff, 0x0000_0001);
        let applied = block.apply(DifferencePair::new(2, 0xffff_ffff));
        assert_eq!(applied.half0(), 1);
        assert_eq!(applied.half1(), 0);
        // the original stays untouched
        assert_eq!(block.half0(), 0xffff_ffff);
    }
    #[test]
    fn parse_and_display() {
        let block = Block8::from_str("0x0001020304050607").unwrap();
        assert_eq!(block.as_bytes(), &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(block.to_string(), "0001020304050607");
        assert!(Block8::from_str("00010203").is_err());
        assert!(Block8::from_str("000102030405060g").is_err());
        assert_eq!(
            DifferencePair::new(0x80, 0xdead).to_string(),
            "(0x80, 0xdead)"
        );
    }
    #[quickcheck]
    fn qc_identity_pair(block: Block8) -> bool {
        block.apply(DifferencePair::default()) == block
    }
    #[quickcheck]
    fn qc_apply_then_undo(block: Block8, diff0: u32, diff1: u32) -> bool {
        let there = DifferencePair::new(diff0, diff1);
        let back = DifferencePair::new(diff0.wrapping_neg(), diff1.wrapping_neg());
        block.apply(there).apply(back) == block
    }
}
