//! Parameters of a differential search.
//!
//! There are a number of parameters:
//! * block: The original 8-byte input the differences are derived from (random if not given)
//! * max_pairs: Stop after this many accepted pairs, defaults to 100
//! * trials: Number of random seeds, and blocks per seed, each pair is verified on, defaults to 20
//! * start, end: The inclusive range of first-half differences to try, defaults to all nonzero ones
//! * rng_seed: Seed for the verification randomness, for reproducible runs
//!
//! They can be given either through the builder methods or as a string of the form
//! ```text
//! block=0011223344556677 max_pairs=10 trials=20 start=0x1 end=0xffffffff rng_seed=42
//! ```
use crate::block::Block8;
use crate::keyval::KeyValIter;
use crate::utils::DiffRange;
use crate::verify::DEFAULT_TRIALS;
use std::str::FromStr;

pub const DEFAULT_MAX_PAIRS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchBuilderErr {
    /// A mandatory parameter is missing
    MissingParameter(&'static str),
    /// A value of a parameter is out of range
    ValueOutOfRange(&'static str),
    /// The given string could not be interpreted correctly,
    ///
    /// The String indicates the key with the malformant.
    MalformedString(String),
    /// A key given to the from_str function is not known
    UnknownKey(String),
}

impl std::fmt::Display for SearchBuilderErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use SearchBuilderErr::*;
        match self {
            MissingParameter(para) => write!(f, "Missing parameter '{}'", para),
            ValueOutOfRange(key) => write!(f, "Value for parameter '{}' invalid", key),
            MalformedString(key) => {
                if key.is_empty() {
                    write!(f, "Malformed input string")
                } else {
                    write!(f, "Malformed input string at {}", key)
                }
            }
            UnknownKey(key) => write!(f, "Unknown key '{}'", key),
        }
    }
}

impl std::error::Error for SearchBuilderErr {}

/// Parses a hexadecimal number, with or without `0x` in front.
pub fn parse_hex_u32(s: &str, key: &'static str) -> Result<u32, SearchBuilderErr> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u32::from_str_radix(digits, 16).map_err(|_| SearchBuilderErr::MalformedString(key.to_owned()))
}

/// A builder for the search parameters.
///
/// Example:
/// ```
/// # use h32diff_lib::config::SearchConfig;
/// let config = SearchConfig::with_options()
///     .max_pairs(10)
///     .trials(5)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_pairs, 10);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchBuilder {
    block: Option<Block8>,
    max_pairs: Option<u64>,
    trials: Option<usize>,
    start: Option<u32>,
    end: Option<u32>,
    rng_seed: Option<u64>,
}

impl SearchBuilder {
    /// The block whose hash the differences preserve.
    pub fn block(&mut self, b: Block8) -> &mut Self {
        self.block = Some(b);
        self
    }
    /// The maximum number of pairs to collect. Has to be positive, larger values are clamped
    /// to the number of nonzero differences.
    pub fn max_pairs(&mut self, n: u64) -> &mut Self {
        self.max_pairs = Some(n);
        self
    }
    /// Seeds and blocks per seed to verify on. Has to be positive.
    pub fn trials(&mut self, n: usize) -> &mut Self {
        self.trials = Some(n);
        self
    }
    /// First difference to try, defaults to 1.
    pub fn start(&mut self, s: u32) -> &mut Self {
        self.start = Some(s);
        self
    }
    /// Last difference to try (inclusive), defaults to 0xffffffff.
    pub fn end(&mut self, e: u32) -> &mut Self {
        self.end = Some(e);
        self
    }
    pub fn rng_seed(&mut self, s: u64) -> &mut Self {
        self.rng_seed = Some(s);
        self
    }
    /// Takes over all parameters that are set in `other`.
    pub fn merge(&mut self, other: &SearchBuilder) -> &mut Self {
        self.block = other.block.or(self.block);
        self.max_pairs = other.max_pairs.or(self.max_pairs);
        self.trials = other.trials.or(self.trials);
        self.start = other.start.or(self.start);
        self.end = other.end.or(self.end);
        self.rng_seed = other.rng_seed.or(self.rng_seed);
        self
    }
    /// Builds the configuration, after validating the parameters.
    pub fn build(&self) -> Result<SearchConfig, SearchBuilderErr> {
        let max_pairs = match self.max_pairs.unwrap_or(DEFAULT_MAX_PAIRS as u64) {
            0 => return Err(SearchBuilderErr::ValueOutOfRange("max_pairs")),
            n => n.min(u32::MAX as u64) as usize,
        };
        let trials = self.trials.unwrap_or(DEFAULT_TRIALS);
        if trials == 0 {
            return Err(SearchBuilderErr::ValueOutOfRange("trials"));
        }
        let range = DiffRange::new(self.start.unwrap_or(1), self.end.unwrap_or(u32::MAX))
            .ok_or(SearchBuilderErr::ValueOutOfRange("end"))?;
        Ok(SearchConfig {
            block: self.block,
            max_pairs,
            trials,
            range,
            rng_seed: self.rng_seed,
        })
    }
}

impl FromStr for SearchBuilder {
    type Err = SearchBuilderErr;
    /// See FromStr for SearchConfig
    fn from_str(s: &str) -> Result<SearchBuilder, SearchBuilderErr> {
        let mut builder = SearchConfig::with_options();
        for x in KeyValIter::new(s) {
            let (current_key, current_val) = match x {
                Err(key) => return Err(SearchBuilderErr::MalformedString(key)),
                Ok(s) => s,
            };
            let op = match current_key.as_str() {
                "block" => Block8::from_str(&current_val).ok().map(|x| builder.block(x)),
                "max_pairs" => u64::from_str(&current_val)
                    .ok()
                    .map(|x| builder.max_pairs(x)),
                "trials" => usize::from_str(&current_val).ok().map(|x| builder.trials(x)),
                "start" => Some(builder.start(parse_hex_u32(&current_val, "start")?)),
                "end" => Some(builder.end(parse_hex_u32(&current_val, "end")?)),
                "rng_seed" => u64::from_str(&current_val)
                    .ok()
                    .map(|x| builder.rng_seed(x)),
                _ => return Err(SearchBuilderErr::UnknownKey(current_key)),
            };
            if op.is_none() {
                return Err(SearchBuilderErr::MalformedString(current_key));
            }
        }
        Ok(builder)
    }
}

/// Validated search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub block: Option<Block8>,
    pub max_pairs: usize,
    pub trials: usize,
    pub range: DiffRange,
    pub rng_seed: Option<u64>,
}

impl SearchConfig {
    /// Creates a `SearchBuilder`, for more information see its documentation.
    pub fn with_options() -> SearchBuilder {
        SearchBuilder::default()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            block: None,
            max_pairs: DEFAULT_MAX_PAIRS,
            trials: DEFAULT_TRIALS,
            range: DiffRange::nonzero(),
            rng_seed: None,
        }
    }
}

impl FromStr for SearchConfig {
    /// Construct a search configuration from a string.
    ///
    /// Example:
    ///
    /// block=0011223344556677 max_pairs=10 trials=20
    fn from_str(s: &str) -> Result<SearchConfig, SearchBuilderErr> {
        SearchBuilder::from_str(s)?.build()
    }
    type Err = SearchBuilderErr;
}
