//! Testing predicted differentials on inputs other than the one they were derived from.
//!
//! The inversion only guarantees that a pair cancels out on the single block and seed used to
//! compute it. Whether it also cancels out on other blocks under other seeds depends on carries
//! through the rotation, so this gets checked by sampling.
use crate::block::{Block8, DifferencePair};
use crate::xxh32;
use rand::Rng;

/// Number of random seeds, and of random blocks per seed, tried by default.
pub const DEFAULT_TRIALS: usize = 20;

/// Decides whether a candidate pair gets accepted.
pub trait Verifier {
    fn verify(&mut self, pair: DifferencePair) -> bool;
}

impl<F: FnMut(DifferencePair) -> bool> Verifier for F {
    fn verify(&mut self, pair: DifferencePair) -> bool {
        self(pair)
    }
}

/// Checks `pair` on `trials` random seeds with `trials` random blocks each.
///
/// Returns false on the first block whose pre-finalization hash changes when the pair is applied.
pub fn verify_random<R: Rng>(pair: DifferencePair, trials: usize, rng: &mut R) -> bool {
    for _ in 0..trials {
        let seed: u32 = rng.random();
        for _ in 0..trials {
            let block = Block8::random(rng);
            let original = xxh32::hash_pre_final(block.as_bytes(), seed);
            let modified = xxh32::hash_pre_final(block.apply(pair).as_bytes(), seed);
            if original != modified {
                return false;
            }
        }
    }
    true
}

/// The verifier used by the search, sampling with its own random number generator.
#[derive(Debug, Clone)]
pub struct RandomVerifier<R: Rng> {
    trials: usize,
    rng: R,
}

impl<R: Rng> RandomVerifier<R> {
    pub fn new(trials: usize, rng: R) -> Self {
        RandomVerifier { trials, rng }
    }
    pub fn trials(&self) -> usize {
        self.trials
    }
}

impl<R: Rng> Verifier for RandomVerifier<R> {
    fn verify(&mut self, pair: DifferencePair) -> bool {
        verify_random(pair, self.trials, &mut self.rng)
    }
}

/// Outcome of checking a pair against the finalized hash on the original block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionCheck {
    pub pair: DifferencePair,
    pub modified: Block8,
    pub hash: u32,
    pub collides: bool,
}

/// Applies each pair to `block` and compares full XXH32 hashes under `seed`.
pub fn check_collisions(
    block: &Block8,
    pairs: &[DifferencePair],
    seed: u32,
) -> Vec<CollisionCheck> {
    let original = xxh32::hash(block.as_bytes(), seed);
    pairs
        .iter()
        .map(|&pair| {
            let modified = block.apply(pair);
            let hash = xxh32::hash(modified.as_bytes(), seed);
            CollisionCheck {
                pair,
                modified,
                hash,
                collides: hash == original,
            }
        })
        .collect()
}
