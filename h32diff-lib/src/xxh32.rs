//! XXH32, with the entry points needed to look inside it.
//!
//! Besides the normal finalized hash, this exposes the state before the final
//! avalanche step (`hash_pre_final`) and the state after mixing only the first
//! 4-byte chunk of an input (`single_round`).
//!
//! For inputs shorter than 16 bytes the computation is
//! ```text
//! state = seed + PRIME32_5 + len
//! for each 4-byte word w:   state = rotl(state + w * PRIME32_3, 17) * PRIME32_4
//! for each remaining byte b: state = rotl(state + b * PRIME32_5, 11) * PRIME32_1
//! avalanche(state)
//! ```
//! Note that the length is added before any of the words get mixed in.
use crate::word::{WORD_BYTES, read_word, rotate_left};

pub const PRIME32_1: u32 = 0x9E37_79B1;
pub const PRIME32_2: u32 = 0x85EB_CA77;
pub const PRIME32_3: u32 = 0xC2B2_AE3D;
pub const PRIME32_4: u32 = 0x27D4_EB2F;
pub const PRIME32_5: u32 = 0x1656_67B1;

const STRIPE_BYTES: usize = 16;

// lane accumulation for the 16-byte stripes of long inputs
#[inline]
fn lane_round(acc: u32, lane: u32) -> u32 {
    rotate_left(acc.wrapping_add(lane.wrapping_mul(PRIME32_2)), 13).wrapping_mul(PRIME32_1)
}

/// Mixes one 4-byte word into the state.
///
/// This is the round the differential search inverts.
#[inline]
pub fn chunk_round(state: u32, word: u32) -> u32 {
    rotate_left(state.wrapping_add(word.wrapping_mul(PRIME32_3)), 17).wrapping_mul(PRIME32_4)
}

#[inline]
fn byte_round(state: u32, byte: u8) -> u32 {
    rotate_left(state.wrapping_add((byte as u32).wrapping_mul(PRIME32_5)), 11)
        .wrapping_mul(PRIME32_1)
}

/// The final mixing step.
pub fn avalanche(mut state: u32) -> u32 {
    state ^= state >> 15;
    state = state.wrapping_mul(PRIME32_2);
    state ^= state >> 13;
    state = state.wrapping_mul(PRIME32_3);
    state ^= state >> 16;
    state
}

/// State after the stripes (if any) and the length have been folded in,
/// but before any of the tail words.
fn initial_state(bytes: &[u8], seed: u32) -> (u32, usize) {
    let mut consumed = 0;
    let state = if bytes.len() >= STRIPE_BYTES {
        let mut v = [
            seed.wrapping_add(PRIME32_1).wrapping_add(PRIME32_2),
            seed.wrapping_add(PRIME32_2),
            seed,
            seed.wrapping_sub(PRIME32_1),
        ];
        while consumed + STRIPE_BYTES <= bytes.len() {
            for (i, acc) in v.iter_mut().enumerate() {
                *acc = lane_round(*acc, read_word(bytes, consumed + i * WORD_BYTES));
            }
            consumed += STRIPE_BYTES;
        }
        rotate_left(v[0], 1)
            .wrapping_add(rotate_left(v[1], 7))
            .wrapping_add(rotate_left(v[2], 12))
            .wrapping_add(rotate_left(v[3], 18))
    } else {
        seed.wrapping_add(PRIME32_5)
    };
    // the reference folds the length in as a 32-bit value
    (state.wrapping_add(bytes.len() as u32), consumed)
}

/// XXH32 without the final avalanche.
pub fn hash_pre_final(bytes: &[u8], seed: u32) -> u32 {
    let (mut state, mut pos) = initial_state(bytes, seed);
    while pos + WORD_BYTES <= bytes.len() {
        state = chunk_round(state, read_word(bytes, pos));
        pos += WORD_BYTES;
    }
    bytes[pos..]
        .iter()
        .fold(state, |state, &byte| byte_round(state, byte))
}

/// The standard XXH32 hash.
pub fn hash(bytes: &[u8], seed: u32) -> u32 {
    avalanche(hash_pre_final(bytes, seed))
}

/// The state of a short input of length `len` after only its first word has been mixed in.
///
/// Only the first 4 bytes of `bytes` are read, the length is taken from `len`, so a lone
/// candidate word can stand in for the start of a longer input.
/// `len` has to be less than 16, since longer inputs go through the stripe path instead.
///
/// # Panics
/// Panics if `bytes` is shorter than 4 bytes.
pub fn single_round(bytes: &[u8], len: usize, seed: u32) -> u32 {
    debug_assert!(len < STRIPE_BYTES);
    let state = seed.wrapping_add(PRIME32_5).wrapping_add(len as u32);
    chunk_round(state, read_word(bytes, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn reference_vectors() {
        assert_eq!(hash(b"", 0), 0x02CC_5D05);
        assert_eq!(hash(b"a", 0), 0x550D_7456);
        assert_eq!(hash(b"abc", 0), 0x32D1_53FF);
        assert_eq!(
            hash(b"Nobody inspects the spammish repetition", 0),
            0xE229_3B2F
        );
    }
    #[test]
    fn pre_final_is_hash_without_avalanche() {
        for input in [&b""[..], b"abc", b"12345678", b"0123456789abcdefXYZ"] {
            for seed in [0, 1, 0xdead_beef] {
                assert_eq!(avalanche(hash_pre_final(input, seed)), hash(input, seed));
            }
        }
    }
    #[test]
    fn two_rounds_make_eight_bytes() {
        let input = [0x10, 0x32, 0x54, 0x76, 0x98, 0xba, 0xdc, 0xfe];
        for seed in [0, 7, u32::MAX] {
            let middle = single_round(&input, input.len(), seed);
            assert_eq!(
                chunk_round(middle, read_word(&input, 4)),
                hash_pre_final(&input, seed)
            );
        }
    }
    #[test]
    fn single_round_ignores_trailing_bytes() {
        let long = [1, 2, 3, 4, 5, 6, 7, 8];
        let short = [1, 2, 3, 4];
        assert_eq!(single_round(&long, 8, 0), single_round(&short, 8, 0));
        assert_ne!(single_round(&short, 8, 0), single_round(&short, 4, 0));
    }
    #[test]
    #[should_panic]
    fn single_round_needs_a_word() {
        single_round(&[1, 2, 3], 8, 0);
    }
}
