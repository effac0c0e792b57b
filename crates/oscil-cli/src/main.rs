// crates/oscil-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, clippy::unwrap_used, clippy::expect_used)]

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use oscil_engine::{Outcome, Row, Rule, Search, SearchConfig, Symmetry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "oscil",
    about = "Search for oscillators in Life-like cellular automata",
    long_about = "Search for period-P oscillators (and still lifes, P=1) in \
two-state outer-totalistic cellular automata.\n\nThe search works over a \
column silhouette: a rotor of oscillating columns flanked by forced-stator \
columns, optionally with mirror-symmetric rows. It prints the first \
non-trivial pattern found, or the deepest partial pattern when the search \
space is exhausted.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    /// Rule in Bxxx/Syyy notation (e.g. B3/S23, B36/S23).
    #[arg(long, default_value = "B3/S23")]
    rule: String,

    /// Oscillator period (1 searches for still lifes).
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..20))]
    period: u32,

    /// Row symmetry restriction.
    #[arg(long, value_enum, default_value_t = SymmetryOpt::Even)]
    symmetry: SymmetryOpt,

    /// Forbid early completion of patterns by mirrored rows.
    #[arg(long, default_value_t = false)]
    no_row_sym: bool,

    /// Width of the rotor (columns allowed to oscillate).
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..=32))]
    rotor: u32,

    /// Forced-stator columns left of the rotor (asymmetric searches only).
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(..=32))]
    left_stator: u32,

    /// Forced-stator columns right of the rotor (per side when symmetric).
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(..=32))]
    stator: u32,

    /// Keep the closing stator rows inside the search width.
    #[arg(long, default_value_t = false)]
    strict_width: bool,

    /// Shrink the rotor when deepening exceeds this many levels (0 = never).
    #[arg(long, default_value_t = 0)]
    max_deepen: u32,

    /// Pre-specified row above the pattern: comma-separated `.o` strings,
    /// one per phase. May be given twice (outer row first).
    #[arg(long)]
    initial_row: Vec<String>,

    /// Treat the first N initial rows as optional sparks (needs both rows).
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(..=2))]
    sparks: u8,

    /// State arena capacity in slots.
    #[arg(long, default_value_t = 1 << 22)]
    queue_slots: usize,

    /// Seed for the duplicate-elimination hash salts.
    #[arg(long)]
    hash_seed: Option<u64>,

    /// Disable duplicate-state elimination.
    #[arg(long, default_value_t = false)]
    no_dedup: bool,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum SymmetryOpt {
    /// Asymmetric rows.
    None,
    /// Palindromic rows of odd width.
    Odd,
    /// Palindromic rows of even width.
    Even,
}

impl From<SymmetryOpt> for Symmetry {
    fn from(s: SymmetryOpt) -> Self {
        match s {
            SymmetryOpt::None => Symmetry::None,
            SymmetryOpt::Odd => Symmetry::Odd,
            SymmetryOpt::Even => Symmetry::Even,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = build_config(&cli)?;
    let mut search = Search::new(cfg).context("invalid search configuration")?;

    match search.run() {
        Ok(Outcome::Found(pattern)) => {
            print!("{pattern}");
            Ok(())
        }
        Ok(Outcome::Exhausted) => {
            println!("No patterns found");
            print_deepest(&search);
            Ok(())
        }
        Err(err) => {
            print_deepest(&search);
            Err(err).context("search aborted")
        }
    }
}

/// Env-driven filter, default INFO, compact output.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn build_config(cli: &Cli) -> Result<SearchConfig> {
    let rule: Rule = cli
        .rule
        .parse()
        .with_context(|| format!("parsing rule {:?}", cli.rule))?;
    let period = cli.period as usize;

    let mut initial_rows = Vec::new();
    for given in &cli.initial_row {
        let phases: Vec<&str> = given.split(',').collect();
        if phases.len() != period {
            bail!(
                "--initial-row needs one row per phase ({period}), got {}",
                phases.len()
            );
        }
        let rows: Vec<Row> = phases
            .iter()
            .map(|p| parse_row(p))
            .collect::<Result<_>>()?;
        initial_rows.push(rows);
    }

    let defaults = SearchConfig::default();
    Ok(SearchConfig {
        rule,
        period,
        symmetry: cli.symmetry.into(),
        allow_row_sym: !cli.no_row_sym,
        rotor_width: cli.rotor as usize,
        left_stator_width: cli.left_stator as usize,
        right_stator_width: cli.stator as usize,
        zero_lot_line: cli.strict_width,
        max_deepen: cli.max_deepen as usize,
        spark_level: cli.sparks,
        initial_rows,
        queue_slots: cli.queue_slots,
        hash_seed: cli.hash_seed.unwrap_or(defaults.hash_seed),
        hashing: !cli.no_dedup,
    })
}

/// Parse one `.o` row; column 0 is the leftmost character.
fn parse_row(s: &str) -> Result<Row> {
    let mut row = 0;
    for (bit, ch) in s.trim().chars().enumerate() {
        if bit >= 32 {
            bail!("too many cells in row {s:?}");
        }
        match ch {
            '.' => {}
            'o' | 'O' => row |= 1 << bit,
            _ => bail!("unexpected character {ch:?} in row {s:?}"),
        }
    }
    Ok(row)
}

fn print_deepest(search: &Search) {
    match search.deepest_lines_rendered() {
        Some(lines) => {
            println!("\nDeepest line found:");
            for line in lines {
                println!("{line}");
            }
        }
        None => println!("\nUnable to find current search line."),
    }
}
