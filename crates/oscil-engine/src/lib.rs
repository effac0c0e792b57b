// crates/oscil-engine/src/lib.rs

//! Oscillator search engine for two-state outer-totalistic cellular
//! automata.
//!
//! Hybrid breadth-first / iterative-deepening search over a state space in
//! which one state holds one new row *per phase*: extending a partial
//! pattern downward means picking, for every phase at once, a row that
//! continues that phase's evolution, with the choices tied together by a
//! per-expansion compatibility graph. See [`search::Search`] for the entry
//! point.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod compat;
pub mod config;
pub mod error;
pub mod extend;
pub mod queue;
pub mod render;
pub mod rowset;
pub mod search;
pub mod tables;
pub mod term;

pub use config::{SearchConfig, Symmetry, MAX_PERIOD};
pub use error::{ConfigError, SearchError};
pub use render::Pattern;
pub use search::{Outcome, Search};

// Convenience re-exports so downstream crates need only this one.
pub use oscil_rules::{Row, Rule};
