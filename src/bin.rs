use clap::{ArgAction, Parser};
use h32diff_lib::block::Block8;
use h32diff_lib::config::{SearchBuilder, SearchConfig, parse_hex_u32};
use h32diff_lib::search::{ANALYSIS_SEED, Progress, SearchOutcome};
use h32diff_lib::verify::{CollisionCheck, check_collisions};
use h32diff_lib::xxh32;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::File;
use std::io::Read;
use std::process::exit;
use std::str::FromStr;

const BAR_WIDTH: usize = 50;

fn main() {
    let opts = Opt::parse();
    init_tracing(opts.verbose);
    let mut config = read_config(&opts);
    if config.block.is_none() {
        config.block = Some(h32diff_lib::pick_block(&config));
    }
    #[cfg(feature = "parallel")]
    let parallel = opts.parallel;
    #[cfg(feature = "parallel")]
    if let Some(n) = opts.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .unwrap_or_else(|err| {
                eprintln!("Could not set up {} threads: {}", n, err);
                exit(1);
            });
    }
    #[cfg(not(feature = "parallel"))]
    let parallel = opts.parallel && {
        tracing::warn!("built without parallel support, searching on one thread");
        false
    };

    if !opts.json {
        println!(
            "Searching for up to {} differential pairs...",
            config.max_pairs
        );
        if let Some(block) = &config.block {
            println!("Original block: {}", spaced_hex(block));
        }
    }
    tracing::info!(range = %config.range, trials = config.trials, parallel, "starting search");

    let show_progress = |p: &Progress| {
        if !opts.json {
            eprint!("\r{}", progress_bar(p));
        }
    };
    #[cfg(feature = "parallel")]
    let outcome = if parallel {
        h32diff_lib::find_differentials_para(&config, show_progress)
    } else {
        h32diff_lib::find_differentials(&config, show_progress)
    };
    #[cfg(not(feature = "parallel"))]
    let outcome = h32diff_lib::find_differentials(&config, show_progress);
    if !opts.json {
        eprintln!();
    }
    tracing::info!(state = %outcome.state, scanned = outcome.scanned, "search done");

    let checks = opts
        .test
        .then(|| check_collisions(&outcome.block, &outcome.pairs, ANALYSIS_SEED));
    if opts.json {
        print_json(&outcome, checks.as_deref());
    } else {
        print_summary(&outcome, opts.quiet);
        if let Some(checks) = &checks {
            print_checks(checks);
        }
    }
    if checks.as_deref().is_some_and(failed) {
        exit(1);
    }
}

/// Search for input differences of 8-byte blocks that leave the XXH32 hash unchanged
#[derive(Debug, Parser)]
#[command(name = "h32diff", version)]
struct Opt {
    /// Maximum number of differential pairs to find
    #[arg(value_parser = parse_max_pairs)]
    max_pairs: Option<u64>,
    /// Re-check every found pair through the finalized hash on the original block
    #[arg(long)]
    test: bool,
    /// Only print the number of pairs found, not the pairs themselves
    #[arg(short, long)]
    quiet: bool,
    /// Log what the search is doing to stderr, repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Search on all cores
    #[arg(short, long)]
    parallel: bool,
    /// Number of threads for the parallel search, defaults to the number of cores
    #[arg(short = 'j', long)]
    threads: Option<usize>,
    /// The original block as 16 hex digits, random if not given
    #[arg(long)]
    block: Option<Block8>,
    /// Number of random seeds, and of random blocks per seed, each pair is verified on
    #[arg(long)]
    trials: Option<usize>,
    /// First difference to try, in hex
    #[arg(long, value_parser = |s: &str| parse_hex_u32(s, "start"))]
    start: Option<u32>,
    /// Last difference to try, in hex
    #[arg(long, value_parser = |s: &str| parse_hex_u32(s, "end"))]
    end: Option<u32>,
    /// Seed for the random number generator, for reproducible runs
    #[arg(long)]
    rng_seed: Option<u64>,
    /// Read search parameters from a file of key=value pairs
    #[arg(short = 'C', long)]
    config: Option<OsString>,
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl Opt {
    fn builder(&self) -> SearchBuilder {
        let mut builder = SearchConfig::with_options();
        if let Some(b) = self.block {
            builder.block(b);
        }
        if let Some(n) = self.max_pairs {
            builder.max_pairs(n);
        }
        if let Some(n) = self.trials {
            builder.trials(n);
        }
        if let Some(s) = self.start {
            builder.start(s);
        }
        if let Some(e) = self.end {
            builder.end(e);
        }
        if let Some(s) = self.rng_seed {
            builder.rng_seed(s);
        }
        builder
    }
}

fn parse_max_pairs(s: &str) -> Result<u64, String> {
    match s.parse::<i128>() {
        Ok(n) if n <= 0 => Err(format!("'{}' is not a positive number", s)),
        Ok(n) => Ok(n.min(u32::MAX as i128) as u64),
        Err(_) => Err(format!("'{}' is not a number", s)),
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn read_config(opts: &Opt) -> SearchConfig {
    let mut builder = match &opts.config {
        Some(file) => {
            let mut s = String::new();
            File::open(file)
                .unwrap_or_else(|err| {
                    eprintln!("Could not open file '{}': {}", file.to_string_lossy(), err);
                    exit(1);
                })
                .read_to_string(&mut s)
                .unwrap_or_else(|err| {
                    eprintln!("Could not read file '{}': {}", file.to_string_lossy(), err);
                    exit(1);
                });
            SearchBuilder::from_str(&s).unwrap_or_else(|err| {
                eprintln!("Could not parse file '{}': {}", file.to_string_lossy(), err);
                exit(1);
            })
        }
        None => SearchConfig::with_options(),
    };
    builder.merge(&opts.builder()).build().unwrap_or_else(|err| {
        eprintln!("Invalid search parameters: {}", err);
        exit(1);
    })
}

fn spaced_hex(block: &Block8) -> String {
    block
        .as_bytes()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn progress_bar(p: &Progress) -> String {
    let filled = ((p.fraction() * BAR_WIDTH as f64) as usize).min(BAR_WIDTH);
    format!(
        "Progress: [{}{}] {:6.2}% (found {})",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        p.fraction() * 100.0,
        p.found
    )
}

fn print_summary(outcome: &SearchOutcome, quiet: bool) {
    println!(
        "Found {} differential pairs ({} differences tried, search {})",
        outcome.pairs.len(),
        outcome.scanned,
        outcome.state
    );
    if !quiet {
        for pair in &outcome.pairs {
            println!("{}", pair);
        }
    }
    println!(
        "Original hash: {:#010x}",
        xxh32::hash(outcome.block.as_bytes(), ANALYSIS_SEED)
    );
}

/// Whether any pair failed to collide, which makes the run exit with status 1.
fn failed(checks: &[CollisionCheck]) -> bool {
    checks.iter().any(|x| !x.collides)
}

fn check_lines(checks: &[CollisionCheck]) -> Vec<String> {
    let mut lines: Vec<_> = checks
        .iter()
        .filter(|x| !x.collides)
        .map(|x| {
            format!(
                "FAIL: {} gives {} with hash {:#010x}",
                x.pair, x.modified, x.hash
            )
        })
        .collect();
    let passed = checks.iter().filter(|x| x.collides).count();
    lines.push(format!("Passed: {}/{}", passed, checks.len()));
    lines.push(format!("Failed: {}/{}", checks.len() - passed, checks.len()));
    lines.push(if failed(checks) { "TEST FAILED" } else { "TEST PASSED" }.to_owned());
    lines
}

fn print_checks(checks: &[CollisionCheck]) {
    for line in check_lines(checks) {
        println!("{}", line);
    }
}

#[derive(Serialize)]
struct PairReport {
    diff0: String,
    diff1: String,
}

#[derive(Serialize)]
struct CheckReport {
    #[serde(flatten)]
    pair: PairReport,
    modified: String,
    hash: String,
    collides: bool,
}

#[derive(Serialize)]
struct Report {
    block: String,
    hash: String,
    state: String,
    scanned: u64,
    pairs: Vec<PairReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    checks: Option<Vec<CheckReport>>,
}

fn pair_report(diff0: u32, diff1: u32) -> PairReport {
    PairReport {
        diff0: format!("{:#010x}", diff0),
        diff1: format!("{:#010x}", diff1),
    }
}

fn print_json(outcome: &SearchOutcome, checks: Option<&[CollisionCheck]>) {
    let report = Report {
        block: hex::encode(outcome.block.as_bytes()),
        hash: format!(
            "{:#010x}",
            xxh32::hash(outcome.block.as_bytes(), ANALYSIS_SEED)
        ),
        state: outcome.state.to_string(),
        scanned: outcome.scanned,
        pairs: outcome
            .pairs
            .iter()
            .map(|p| pair_report(p.diff0, p.diff1))
            .collect(),
        checks: checks.map(|c| {
            c.iter()
                .map(|x| CheckReport {
                    pair: pair_report(x.pair.diff0, x.pair.diff1),
                    modified: hex::encode(x.modified.as_bytes()),
                    hash: format!("{:#010x}", x.hash),
                    collides: x.collides,
                })
                .collect()
        }),
    };
    match serde_json::to_string_pretty(&report) {
        Ok(s) => println!("{}", s),
        Err(err) => {
            eprintln!("Could not write JSON: {}", err);
            exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use h32diff_lib::DifferencePair;
    #[test]
    fn max_pairs_argument() {
        assert_eq!(parse_max_pairs("10"), Ok(10));
        assert_eq!(parse_max_pairs("99999999999"), Ok(u32::MAX as u64));
        assert!(parse_max_pairs("0").is_err());
        assert!(parse_max_pairs("-3").is_err());
        assert!(parse_max_pairs("many").is_err());
    }
    #[test]
    fn bar_rendering() {
        let half = Progress {
            scanned: 50,
            total: 100,
            found: 2,
        };
        let bar = progress_bar(&half);
        assert_eq!(bar.matches('#').count(), BAR_WIDTH / 2);
        assert!(bar.ends_with(" 50.00% (found 2)"));
    }
    #[test]
    fn cli_overrides_file() {
        let opts = Opt::parse_from(["h32diff", "7", "--trials", "3", "--start", "0x10"]);
        let mut file = SearchBuilder::from_str("trials=9 end=ff max_pairs=50").unwrap();
        let config = file.merge(&opts.builder()).build().unwrap();
        assert_eq!(config.max_pairs, 7);
        assert_eq!(config.trials, 3);
        assert_eq!(config.range.start(), 0x10);
        assert_eq!(config.range.end(), 0xff);
    }
    #[test]
    fn spaced_block() {
        let block = Block8::new([0, 1, 0xab, 3, 4, 5, 6, 0xff]);
        assert_eq!(spaced_hex(&block), "00 01 ab 03 04 05 06 ff");
    }
    #[test]
    fn failing_pair_fails_the_run() {
        let block = Block8::new(*b"8 bytes!");
        let good = DifferencePair::default();
        let bad = DifferencePair::new(1, 0);
        let passing = check_collisions(&block, &[good, good], ANALYSIS_SEED);
        assert!(!failed(&passing));
        assert_eq!(
            check_lines(&passing),
            vec!["Passed: 2/2", "Failed: 0/2", "TEST PASSED"]
        );
        let failing = check_collisions(&block, &[good, bad], ANALYSIS_SEED);
        assert!(failed(&failing));
        let lines = check_lines(&failing);
        assert!(lines[0].starts_with("FAIL: (0x1, 0x0) gives "));
        assert_eq!(&lines[1..], ["Passed: 1/2", "Failed: 1/2", "TEST FAILED"]);
        assert!(!failed(&[]));
    }
}
