//! Undoing the last chunk round of XXH32.
//!
//! A chunk round is `rotl(state + w * PRIME32_3, 17) * PRIME32_4`. Both multiplications are by
//! odd constants and so are bijective modulo 2^32, which means that for a known state before the
//! round and a known state after it, exactly one word `w` connects the two.
use crate::word::rotate_right;
use crate::xxh32::{PRIME32_3, PRIME32_4};

/// Calculates the inverse of `x` modulo 2^32 with the extended euclidean algorithm.
///
/// Returns `None` for even `x`, which has no inverse.
pub const fn mul_inverse(x: u32) -> Option<u32> {
    const MODULUS: i64 = 1 << 32;
    let (mut old_r, mut r) = (x as i64, MODULUS);
    let (mut old_s, mut s) = (1i64, 0i64);
    while r != 0 {
        let q = old_r / r;
        let next_r = old_r - q * r;
        old_r = r;
        r = next_r;
        let next_s = old_s - q * s;
        old_s = s;
        s = next_s;
    }
    if old_r != 1 {
        return None;
    }
    Some(old_s.rem_euclid(MODULUS) as u32)
}

const fn odd_inverse(x: u32) -> u32 {
    match mul_inverse(x) {
        Some(inv) => inv,
        None => panic!("constant has no inverse modulo 2^32"),
    }
}

pub const INV_PRIME32_3: u32 = odd_inverse(PRIME32_3);
pub const INV_PRIME32_4: u32 = odd_inverse(PRIME32_4);

/// Given the state `middle` before a chunk round and the wanted state `target` after it,
/// returns the word that has to be mixed in.
///
/// In other words, `chunk_round(middle, required_word(target, middle)) == target`.
pub fn required_word(target: u32, middle: u32) -> u32 {
    let before_rotate = rotate_right(target.wrapping_mul(INV_PRIME32_4), 17);
    before_rotate
        .wrapping_sub(middle)
        .wrapping_mul(INV_PRIME32_3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xxh32::chunk_round;
    use quickcheck::TestResult;
    #[test]
    fn prime_inverses() {
        assert_eq!(PRIME32_3.wrapping_mul(INV_PRIME32_3), 1);
        assert_eq!(PRIME32_4.wrapping_mul(INV_PRIME32_4), 1);
        assert_eq!(INV_PRIME32_3, 2828982549);
        assert_eq!(INV_PRIME32_4, 2701016015);
    }
    #[test]
    fn no_inverse_for_even() {
        assert_eq!(mul_inverse(0), None);
        assert_eq!(mul_inverse(2), None);
        assert_eq!(mul_inverse(0x8000_0000), None);
        assert_eq!(mul_inverse(1), Some(1));
        assert_eq!(mul_inverse(u32::MAX), Some(u32::MAX));
    }
    #[quickcheck]
    fn qc_mul_inverse(x: u32) -> TestResult {
        if x % 2 == 0 {
            return TestResult::from_bool(mul_inverse(x).is_none());
        }
        match mul_inverse(x) {
            Some(inv) => TestResult::from_bool(x.wrapping_mul(inv) == 1),
            None => TestResult::failed(),
        }
    }
    #[quickcheck]
    fn qc_required_word_inverts_round(middle: u32, word: u32) -> bool {
        required_word(chunk_round(middle, word), middle) == word
    }
    #[quickcheck]
    fn qc_round_hits_target(middle: u32, target: u32) -> bool {
        chunk_round(middle, required_word(target, middle)) == target
    }
}
