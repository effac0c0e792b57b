// crates/oscil-engine/src/error.rs

//! Fatal search failures and configuration rejections.
//!
//! The engine raises no recoverable errors: every variant here either ends
//! the search (capacity exhaustion, corrupted queue) or prevents it from
//! starting (bad configuration). The driver keeps the deepest explored line
//! available alongside any of these, so the front end can dump it the way
//! the search reports ordinary exhaustion.

use thiserror::Error;

/// Fatal conditions raised while a search is running.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    /// The state arena hit its slot capacity and compaction cannot help.
    #[error("state queue exhausted ({0} slots)")]
    QueueExhausted(usize),
    /// The shared candidate-row buffer overflowed during row listing.
    #[error("candidate row buffer exceeded")]
    RowBufferExceeded,
    /// The per-expansion compatibility bitmatrix outgrew its block space.
    #[error("compatibility block space exceeded")]
    CompatSpaceExceeded,
    /// The per-expansion reachability bitmatrix outgrew its block space.
    #[error("reachability block space exceeded")]
    ReachSpaceExceeded,
    /// Compaction could not find a live parent for state `{0}`.
    #[error("state queue corrupt: no live parent for state {0}")]
    CorruptQueue(u32),
}

/// Configuration problems detected before the search starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("period must be in 1..={max}, got {got}")]
    Period { got: usize, max: usize },
    #[error("rotor width must be in 1..=32, got {0}")]
    RotorWidth(usize),
    #[error("total width {0} exceeds 32 columns")]
    TotalWidth(usize),
    #[error("symmetric searches take a single per-side stator width; left stator must be 0")]
    LeftStatorWithSymmetry,
    #[error("still-life searches (period 1) take no stator widths")]
    StatorWithStillLife,
    #[error("at most 2 initial rows may be specified, got {0}")]
    TooManyInitialRows(usize),
    #[error("initial row {row} specifies {got} phases, expected {expected}")]
    InitialRowPhases {
        row: usize,
        got: usize,
        expected: usize,
    },
    #[error("initial row {row}, phase {phase} has cells outside the search width")]
    InitialRowTooWide { row: usize, phase: usize },
    #[error("spark level must be 0, 1 or 2, got {0}")]
    SparkLevel(u8),
    #[error("spark searches need both initial rows specified, got {0}")]
    SparkRows(usize),
    #[error("queue capacity must be at least 2 slots")]
    QueueTooSmall,
}
