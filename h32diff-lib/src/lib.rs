pub mod block;
pub mod config;
pub mod invert;
mod keyval;
pub mod search;
pub mod utils;
pub mod verify;
pub mod word;
pub mod xxh32;

use block::Block8;
use config::SearchConfig;
use rand::SeedableRng;
use rand::rngs::StdRng;
use search::{Progress, SearchOutcome, search};
use verify::RandomVerifier;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

pub use block::DifferencePair;
pub use config::SearchBuilderErr;
pub use search::SearchState;

/// The seed all randomness of a search is derived from.
fn base_seed(config: &SearchConfig) -> u64 {
    config.rng_seed.unwrap_or_else(rand::random)
}

// the block is drawn from `seed`, verifiers use the following seeds
fn verifier_rng(seed: u64, index: usize) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_add(1).wrapping_add(index as u64))
}

fn block_for(config: &SearchConfig, seed: u64) -> Block8 {
    config
        .block
        .unwrap_or_else(|| Block8::random(&mut StdRng::seed_from_u64(seed)))
}

/// The block a search with `config` runs on.
///
/// This is the configured block if there is one, otherwise a random one. With a fixed
/// `rng_seed`, it is the same block the search itself would pick, so it can be put into the
/// config beforehand without changing the outcome.
pub fn pick_block(config: &SearchConfig) -> Block8 {
    block_for(config, base_seed(config))
}

/// Searches for difference pairs that, added to the halves of an 8-byte block, leave its XXH32
/// hash unchanged.
///
/// The block is taken from the config, or drawn at random if it is not given.
/// `progress` gets called regularly with the number of differences tried so far.
///
/// # Example
/// ```
/// # use h32diff_lib::{config::SearchConfig, find_differentials, SearchState};
/// let config = SearchConfig::with_options()
///     .start(1)
///     .end(1000)
///     .rng_seed(1)
///     .build()
///     .unwrap();
/// let outcome = find_differentials(&config, |_| {});
/// assert_eq!(outcome.scanned, 1000);
/// assert_eq!(outcome.state, SearchState::Exhausted);
/// ```
pub fn find_differentials<P: FnMut(&Progress)>(
    config: &SearchConfig,
    progress: P,
) -> SearchOutcome {
    let seed = base_seed(config);
    let block = block_for(config, seed);
    let verifier = RandomVerifier::new(config.trials, verifier_rng(seed, 0));
    search(block, config.range, config.max_pairs, verifier, progress)
}

/// Parallel version of find_differentials.
///
/// Each chunk of the range gets its own random number generator, derived from the same seed.
/// Which pairs are returned when `max_pairs` is reached depends on scheduling.
#[cfg(feature = "parallel")]
pub fn find_differentials_para<P: Fn(&Progress) + Sync>(
    config: &SearchConfig,
    progress: P,
) -> SearchOutcome {
    let seed = base_seed(config);
    let block = block_for(config, seed);
    search::search_para(
        block,
        config.range,
        config.max_pairs,
        |chunk| RandomVerifier::new(config.trials, verifier_rng(seed, chunk)),
        progress,
    )
}
