// crates/oscil-rules/src/lib.rs

//! Outer-totalistic (semitotalistic) rule bitmaps.
//!
//! A rule is 18 bits: bit `n` (0..=8) means a live cell with `n` live Moore
//! neighbors survives, bit `9 + n` means a dead cell with `n` live neighbors
//! is born. `B3/S23` (Conway's Life) is therefore `(1 << 12) | (1 << 3) | (1 << 2)`.
//!
//! Besides parsing and formatting, this crate carries a naive reference
//! stepper over 32-bit row bitmaps. The search engine never uses it; its
//! tests do, as an oracle independent of the engine's lookup tables.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(missing_docs, clippy::all)]

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Error, Result};
use serde::{Deserialize, Serialize};

/// One horizontal line of cells; bit `i` set means column `i` is live.
pub type Row = u32;

/// An 18-bit outer-totalistic rule bitmap.
///
/// Survival counts occupy bits 0..=8, birth counts bits 9..=17.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rule(u32);

impl Rule {
    /// Conway's Life, `B3/S23`.
    pub const LIFE: Self = Self((1 << 12) | (1 << 3) | (1 << 2));

    /// Build a rule from separate birth and survival masks (bit `n` = count `n`).
    ///
    /// # Errors
    /// Fails if either mask has bits above count 8.
    pub fn from_masks(birth: u16, survival: u16) -> Result<Self> {
        if birth >= 1 << 9 || survival >= 1 << 9 {
            bail!("neighbor counts range over 0..=8");
        }
        Ok(Self((u32::from(birth) << 9) | u32::from(survival)))
    }

    /// The raw 18-bit bitmap.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Birth mask: bit `n` set iff a dead cell with `n` live neighbors is born.
    #[inline]
    #[must_use]
    pub const fn birth_mask(self) -> u16 {
        (self.0 >> 9) as u16
    }

    /// Survival mask: bit `n` set iff a live cell with `n` live neighbors survives.
    #[inline]
    #[must_use]
    pub const fn survival_mask(self) -> u16 {
        (self.0 & 0x1ff) as u16
    }

    /// Next state of one cell given its current state and live-neighbor count.
    #[inline]
    #[must_use]
    pub const fn next_cell(self, alive: bool, neighbors: u32) -> bool {
        let bit = if alive { neighbors } else { neighbors + 9 };
        (self.0 >> bit) & 1 != 0
    }
}

impl Default for Rule {
    fn default() -> Self {
        Self::LIFE
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("B")?;
        for n in 0..=8 {
            if self.birth_mask() & (1 << n) != 0 {
                write!(f, "{n}")?;
            }
        }
        f.write_str("/S")?;
        for n in 0..=8 {
            if self.survival_mask() & (1 << n) != 0 {
                write!(f, "{n}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Rule {
    type Err = Error;

    /// Parse `Bxxx/Syyy` (either order, case-insensitive).
    ///
    /// Digits accumulate into whichever mask the preceding `B`/`S` selected;
    /// a bare `/` toggles between the two, so `23/3` is accepted the way the
    /// classic notation intends. The empty string is Conway's Life.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::LIFE);
        }
        let mut bits = 0u32;
        // Survival-first is the legacy default when no letter is given.
        let mut shift = 0u32;
        for ch in s.chars() {
            match ch {
                '0'..='8' => bits |= 1 << (shift + ch as u32 - '0' as u32),
                'b' | 'B' => shift = 9,
                's' | 'S' => shift = 0,
                '/' => shift = 9 - shift,
                _ => bail!("unrecognized character {ch:?} in rule {s:?}"),
            }
        }
        Ok(Self(bits))
    }
}

/// Count of live Moore neighbors of column `bit` in `row`, excluding the cell
/// itself, plus the three aligned cells of `above` and `below`.
#[inline]
fn neighbors(above: Row, row: Row, below: Row, bit: u32) -> u32 {
    let window = |r: Row| -> u32 {
        if bit == 0 {
            (r << 1) & 7
        } else {
            (r >> (bit - 1)) & 7
        }
    };
    let mid = window(row) & 0b101; // drop the cell itself
    (window(above).count_ones()) + mid.count_ones() + (window(below).count_ones())
}

/// One generation of `row` with `above` and `below` as its vertical context.
///
/// Cells outside bit 31..0 are dead. This is the reference semantics the
/// engine's extension tables must agree with.
#[must_use]
pub fn step_row(rule: Rule, above: Row, row: Row, below: Row) -> Row {
    let mut next = 0;
    for bit in 0..32 {
        let alive = row & (1 << bit) != 0;
        if rule.next_cell(alive, neighbors(above, row, below, bit)) {
            next |= 1 << bit;
        }
    }
    next
}

/// One generation of a whole grid of rows (dead border above and below).
///
/// The grid may grow by the border rows when the rule writes into them; the
/// caller decides how much slack to leave. Used by tests to verify found
/// oscillators really oscillate.
#[must_use]
pub fn step_rows(rule: Rule, rows: &[Row]) -> Vec<Row> {
    let n = rows.len();
    let at = |i: isize| -> Row {
        if i < 0 || i as usize >= n {
            0
        } else {
            rows[i as usize]
        }
    };
    (-1..=n as isize)
        .map(|i| step_row(rule, at(i - 1), at(i), at(i + 1)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn life_round_trips() {
        let r: Rule = "B3/S23".parse().unwrap();
        assert_eq!(r, Rule::LIFE);
        assert_eq!(r.to_string(), "B3/S23");
        assert_eq!("".parse::<Rule>().unwrap(), Rule::LIFE);
        assert_eq!("b3/s23".parse::<Rule>().unwrap(), Rule::LIFE);
        assert_eq!("s23/b3".parse::<Rule>().unwrap(), Rule::LIFE);
        // Legacy survival-first shorthand.
        assert_eq!("23/3".parse::<Rule>().unwrap(), Rule::LIFE);
    }

    #[test]
    fn masks_split() {
        let r: Rule = "B36/S125".parse().unwrap();
        assert_eq!(r.birth_mask(), (1 << 3) | (1 << 6));
        assert_eq!(r.survival_mask(), (1 << 1) | (1 << 2) | (1 << 5));
        assert_eq!(Rule::from_masks(r.birth_mask(), r.survival_mask()).unwrap(), r);
    }

    #[test]
    fn rejects_garbage() {
        assert!("B9/S23".parse::<Rule>().is_err());
        assert!("hello".parse::<Rule>().is_err());
    }

    #[test]
    fn block_is_still() {
        // Two stacked `oo` rows survive B3/S23 unchanged.
        let rows = vec![0b11, 0b11];
        let next = step_rows(Rule::LIFE, &rows);
        assert_eq!(next, vec![0, 0b11, 0b11, 0]);
    }

    #[test]
    fn blinker_oscillates() {
        // Horizontal `ooo` becomes a vertical bar and back.
        let rows = vec![0b111];
        let next = step_rows(Rule::LIFE, &rows);
        assert_eq!(next, vec![0b010, 0b010, 0b010]);
        let back = step_rows(Rule::LIFE, &next);
        assert_eq!(back, vec![0, 0, 0b111, 0, 0]);
    }

    #[test]
    fn lonely_cells_die_and_b0_births() {
        assert_eq!(step_row(Rule::LIFE, 0, 1, 0), 0);
        let b0 = Rule::from_masks(1, 0).unwrap();
        // Every dead cell with zero neighbors is born under B0.
        assert_eq!(step_row(b0, 0, 0, 0), u32::MAX);
    }
}
