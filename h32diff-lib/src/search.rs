//! The differential search over first-half differences.
//!
//! For a fixed block `m0 || m1`, the pre-finalization hash under the analysis seed is
//! `target = R(R(s0, m0), m1)` where `R` is the chunk round.
//! Changing `m0` to `m0 + diff0` gives a new middle state `R(s0, m0 + diff0)`, and since
//! `R` can be inverted in its word argument, there is exactly one `m1'` with
//! `R(R(s0, m0 + diff0), m1') == target`. The candidate pair is then `(diff0, m1' - m1)`.
//!
//! Every `diff0` therefore gives exactly one candidate, which only has to be checked on
//! other blocks and seeds by a `Verifier` to see whether it is a real differential.
use crate::block::{BLOCK_BYTES, Block8, DifferencePair};
use crate::invert::required_word;
use crate::utils::DiffRange;
use crate::verify::Verifier;
use crate::word::bytes_from_word;
use crate::xxh32;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "parallel")]
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// The seed the candidate pairs are derived under.
pub const ANALYSIS_SEED: u32 = 0;
/// Number of candidates between two progress reports.
pub const PROGRESS_INTERVAL: u64 = 10_000;

/// Turns first-half differences into candidate pairs for a fixed block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Predictor {
    block: Block8,
    target: u32,
}

impl Predictor {
    pub fn new(block: Block8) -> Self {
        let target = xxh32::hash_pre_final(block.as_bytes(), ANALYSIS_SEED);
        Predictor { block, target }
    }
    pub fn block(&self) -> &Block8 {
        &self.block
    }
    /// The pre-finalization hash every candidate reproduces.
    pub fn target(&self) -> u32 {
        self.target
    }
    /// Returns the pair starting with `diff0` that keeps the pre-finalization hash of the
    /// block under the analysis seed unchanged.
    pub fn predict(&self, diff0: u32) -> DifferencePair {
        let half0 = self.block.half0().wrapping_add(diff0);
        let middle = xxh32::single_round(&bytes_from_word(half0), BLOCK_BYTES, ANALYSIS_SEED);
        let half1 = required_word(self.target, middle);
        DifferencePair::new(diff0, half1.wrapping_sub(self.block.half1()))
    }
}

/// Where the search currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchState {
    /// The next difference to try.
    Running(u32),
    /// The requested number of pairs has been found.
    Satisfied,
    /// The whole range was tried.
    Exhausted,
}

impl SearchState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SearchState::Running(_))
    }
}

impl std::fmt::Display for SearchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchState::Running(d) => write!(f, "running at {:#x}", d),
            SearchState::Satisfied => write!(f, "satisfied"),
            SearchState::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// What a single call to `Searcher::step` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Accepted(DifferencePair),
    Rejected(DifferencePair),
    /// The search was already finished, nothing was tried.
    Done(SearchState),
}

/// Progress information handed to the progress callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub scanned: u64,
    pub total: u64,
    pub found: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.scanned as f64 / self.total as f64
    }
}

/// The result of a finished search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
    pub block: Block8,
    pub pairs: Vec<DifferencePair>,
    pub state: SearchState,
    pub scanned: u64,
}

/// Walks through a range of first-half differences and collects the verified pairs.
pub struct Searcher<V: Verifier> {
    predictor: Predictor,
    range: DiffRange,
    max_pairs: usize,
    verifier: V,
    found: Vec<DifferencePair>,
    scanned: u64,
    state: SearchState,
}

impl<V: Verifier> Searcher<V> {
    pub fn new(block: Block8, range: DiffRange, max_pairs: usize, verifier: V) -> Self {
        let state = if max_pairs == 0 {
            SearchState::Satisfied
        } else {
            SearchState::Running(range.start())
        };
        Searcher {
            predictor: Predictor::new(block),
            range,
            max_pairs,
            verifier,
            found: Vec::new(),
            scanned: 0,
            state,
        }
    }
    pub fn state(&self) -> SearchState {
        self.state
    }
    pub fn found(&self) -> &[DifferencePair] {
        &self.found
    }
    pub fn scanned(&self) -> u64 {
        self.scanned
    }
    /// Tries the current difference and moves on to the next state.
    pub fn step(&mut self) -> Step {
        let diff0 = match self.state {
            SearchState::Running(d) => d,
            done => return Step::Done(done),
        };
        let pair = self.predictor.predict(diff0);
        let accepted = self.verifier.verify(pair);
        self.scanned += 1;
        if accepted {
            self.found.push(pair);
        }
        self.state = next_state(self.range, diff0, self.found.len(), self.max_pairs);
        if accepted {
            tracing::debug!(%pair, found = self.found.len(), "accepted");
            Step::Accepted(pair)
        } else {
            tracing::trace!(%pair, "rejected");
            Step::Rejected(pair)
        }
    }
    /// Steps until the search is finished, calling `progress` every `PROGRESS_INTERVAL` candidates.
    pub fn run<P: FnMut(&Progress)>(mut self, mut progress: P) -> SearchOutcome {
        tracing::debug!(
            block = %self.predictor.block(),
            target = self.predictor.target(),
            range = %self.range,
            max_pairs = self.max_pairs,
            "starting search"
        );
        while !self.state.is_terminal() {
            self.step();
            if self.scanned % PROGRESS_INTERVAL == 0 {
                progress(&self.progress());
            }
        }
        // the last step may already have been reported
        if self.scanned == 0 || self.scanned % PROGRESS_INTERVAL != 0 {
            progress(&self.progress());
        }
        tracing::debug!(state = %self.state, found = self.found.len(), scanned = self.scanned, "search finished");
        SearchOutcome {
            block: *self.predictor.block(),
            pairs: self.found,
            state: self.state,
            scanned: self.scanned,
        }
    }
    fn progress(&self) -> Progress {
        Progress {
            scanned: self.scanned,
            total: self.range.len(),
            found: self.found.len(),
        }
    }
}

// transition after `diff0` was tried and `found` pairs are collected
fn next_state(range: DiffRange, diff0: u32, found: usize, max_pairs: usize) -> SearchState {
    if found >= max_pairs {
        SearchState::Satisfied
    } else if diff0 == range.end() {
        SearchState::Exhausted
    } else {
        SearchState::Running(diff0 + 1)
    }
}

/// Runs a search over `range` on a single thread.
pub fn search<V: Verifier, P: FnMut(&Progress)>(
    block: Block8,
    range: DiffRange,
    max_pairs: usize,
    verifier: V,
    progress: P,
) -> SearchOutcome {
    Searcher::new(block, range, max_pairs, verifier).run(progress)
}

/// Size of the pieces the range gets split into for the parallel search.
#[cfg(feature = "parallel")]
pub const CHUNK_SIZE: u32 = 1 << 20;

/// Parallel version of `search`.
///
/// The range is split into chunks of `CHUNK_SIZE` differences which are searched independently,
/// each with a verifier from `make_verifier` (called with the chunk index).
/// A shared counter makes sure no more than `max_pairs` are collected, but which pairs are found
/// first depends on scheduling, so the result is not necessarily the same as for `search`.
/// Chunks started after the maximum is reached are skipped without a verifier or a progress report.
/// The pairs are returned sorted by `diff0`.
#[cfg(feature = "parallel")]
pub fn search_para<V, F, P>(
    block: Block8,
    range: DiffRange,
    max_pairs: usize,
    make_verifier: F,
    progress: P,
) -> SearchOutcome
where
    V: Verifier,
    F: Fn(usize) -> V + Sync,
    P: Fn(&Progress) + Sync,
{
    let predictor = Predictor::new(block);
    let total = range.len();
    let found = AtomicUsize::new(0);
    let scanned = AtomicU64::new(0);
    tracing::debug!(%block, range = %range, max_pairs, "starting parallel search");
    let chunks: Vec<_> = range.chunks(CHUNK_SIZE).collect();
    let mut pairs: Vec<DifferencePair> = chunks
        .into_par_iter()
        .enumerate()
        .flat_map_iter(|(idx, chunk)| {
            let mut local = Vec::new();
            if found.load(Ordering::Relaxed) >= max_pairs {
                return local;
            }
            let mut verifier = make_verifier(idx);
            let mut local_scanned = 0;
            for diff0 in chunk.start()..=chunk.end() {
                if found.load(Ordering::Relaxed) >= max_pairs {
                    break;
                }
                let pair = predictor.predict(diff0);
                local_scanned += 1;
                // only keep the pair if it still fits below the cap
                if verifier.verify(pair) && found.fetch_add(1, Ordering::Relaxed) < max_pairs {
                    tracing::debug!(%pair, "accepted");
                    local.push(pair);
                }
            }
            let scanned_now = scanned.fetch_add(local_scanned, Ordering::Relaxed) + local_scanned;
            progress(&Progress {
                scanned: scanned_now,
                total,
                found: found.load(Ordering::Relaxed).min(max_pairs),
            });
            local
        })
        .collect();
    pairs.sort_unstable();
    let state = if pairs.len() >= max_pairs {
        SearchState::Satisfied
    } else {
        SearchState::Exhausted
    };
    tracing::debug!(%state, found = pairs.len(), "parallel search finished");
    SearchOutcome {
        block,
        pairs,
        state,
        scanned: scanned.into_inner(),
    }
}
