// crates/oscil-engine/src/config.rs

//! Search configuration record.
//!
//! One `SearchConfig` fully determines one search, including the dedup-hash
//! seed, so equal configurations reproduce byte-identical output. The CLI
//! populates it from flags; tests construct it directly.

use oscil_rules::{Row, Rule};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Hard upper bound on the period (exclusive); periods run 1..=19.
pub const MAX_PERIOD: usize = 20;

/// Column symmetry of the patterns being sought.
///
/// With `Odd` or `Even` symmetry each stored row is the right half of a
/// palindromic physical row; `Odd` shares the center column between the two
/// halves, `Even` duplicates every column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Symmetry {
    /// Asymmetric rows; left and right stators are independent.
    None,
    /// Palindromic rows of odd physical width.
    Odd,
    /// Palindromic rows of even physical width.
    Even,
}

/// Everything one search needs, in one serializable record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// The 18-bit outer-totalistic rule bitmap.
    pub rule: Rule,
    /// Oscillator period, 1..=19. Period 1 searches for still lifes.
    pub period: usize,
    /// Column symmetry restriction.
    pub symmetry: Symmetry,
    /// Allow closing a pattern early when its rows mirror its parent's.
    pub allow_row_sym: bool,
    /// Columns allowed to oscillate.
    pub rotor_width: usize,
    /// Forced-stator columns left of the rotor (asymmetric searches only).
    pub left_stator_width: usize,
    /// Forced-stator columns right of the rotor (per side when symmetric).
    pub right_stator_width: usize,
    /// Forbid the closing stator from exceeding the search width.
    pub zero_lot_line: bool,
    /// Shrink the rotor once deepening exceeds this many levels (0 = never).
    pub max_deepen: usize,
    /// How many of the initial rows are optional sparks (0..=2).
    pub spark_level: u8,
    /// Up to two pre-specified rows above the pattern, one bitmap per phase.
    pub initial_rows: Vec<Vec<Row>>,
    /// State arena capacity in slots; compaction triggers at half of it.
    pub queue_slots: usize,
    /// Seed for the dedup-hash salt tables.
    pub hash_seed: u64,
    /// Enable duplicate-state elimination.
    pub hashing: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            rule: Rule::LIFE,
            period: 5,
            symmetry: Symmetry::Even,
            allow_row_sym: true,
            rotor_width: 4,
            left_stator_width: 0,
            right_stator_width: 0,
            zero_lot_line: false,
            max_deepen: 0,
            spark_level: 0,
            initial_rows: Vec::new(),
            queue_slots: 1 << 22,
            hash_seed: 0x05c1_11a7_0e5c_a9e5,
            hashing: true,
        }
    }
}

impl SearchConfig {
    /// Stored row width: rotor plus both stator groups.
    #[inline]
    #[must_use]
    pub fn total_width(&self) -> usize {
        self.rotor_width + self.left_stator_width + self.right_stator_width
    }

    /// Check every range and cross-field constraint.
    ///
    /// # Errors
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period < 1 || self.period >= MAX_PERIOD {
            return Err(ConfigError::Period {
                got: self.period,
                max: MAX_PERIOD - 1,
            });
        }
        if self.rotor_width < 1 || self.rotor_width > 32 {
            return Err(ConfigError::RotorWidth(self.rotor_width));
        }
        if self.total_width() > 32 {
            return Err(ConfigError::TotalWidth(self.total_width()));
        }
        if self.symmetry != Symmetry::None && self.left_stator_width != 0 {
            return Err(ConfigError::LeftStatorWithSymmetry);
        }
        if self.period == 1 && (self.left_stator_width != 0 || self.right_stator_width != 0) {
            return Err(ConfigError::StatorWithStillLife);
        }
        if self.initial_rows.len() > 2 {
            return Err(ConfigError::TooManyInitialRows(self.initial_rows.len()));
        }
        for (i, rows) in self.initial_rows.iter().enumerate() {
            if rows.len() != self.period {
                return Err(ConfigError::InitialRowPhases {
                    row: i,
                    got: rows.len(),
                    expected: self.period,
                });
            }
            let width_mask = if self.total_width() == 32 {
                Row::MAX
            } else {
                (1 << self.total_width()) - 1
            };
            for (phase, &row) in rows.iter().enumerate() {
                if row & !width_mask != 0 {
                    return Err(ConfigError::InitialRowTooWide { row: i, phase });
                }
            }
        }
        if self.spark_level > 2 {
            return Err(ConfigError::SparkLevel(self.spark_level));
        }
        if self.spark_level > 0 && self.initial_rows.len() != 2 {
            return Err(ConfigError::SparkRows(self.initial_rows.len()));
        }
        if self.queue_slots < 2 {
            return Err(ConfigError::QueueTooSmall);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_validates() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range() {
        let mut c = SearchConfig::default();
        c.period = 0;
        assert!(c.validate().is_err());
        c.period = MAX_PERIOD;
        assert!(c.validate().is_err());

        let mut c = SearchConfig::default();
        c.rotor_width = 30;
        c.right_stator_width = 5;
        assert!(matches!(c.validate(), Err(ConfigError::TotalWidth(35))));

        let mut c = SearchConfig::default();
        c.symmetry = Symmetry::Odd;
        c.left_stator_width = 1;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::LeftStatorWithSymmetry)
        ));
    }

    #[test]
    fn still_life_takes_no_stators() {
        let mut c = SearchConfig::default();
        c.period = 1;
        c.symmetry = Symmetry::None;
        c.right_stator_width = 1;
        assert!(matches!(c.validate(), Err(ConfigError::StatorWithStillLife)));
        c.right_stator_width = 0;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn sparks_need_both_rows() {
        let mut c = SearchConfig::default();
        c.period = 2;
        c.spark_level = 1;
        c.initial_rows = vec![vec![0, 0]];
        assert!(matches!(c.validate(), Err(ConfigError::SparkRows(1))));
        c.initial_rows = vec![vec![0, 0], vec![1, 0]];
        assert!(c.validate().is_ok());
    }
}
