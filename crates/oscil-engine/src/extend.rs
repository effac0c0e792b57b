// crates/oscil-engine/src/extend.rs

//! Row-extension generator.
//!
//! Given three vertically adjacent rows — `a` (the last pattern row of a
//! phase), `b` (the row above it) and `c` (what `a` must evolve into) — the
//! extender enumerates every row that can sit *below* `a` so the rule maps
//! `(b, a, below)` to `c` across the full search width, dead boundary
//! included.
//!
//! The machinery is a nondeterministic column automaton: `setup` propagates
//! the set of feasible 3-cell windows of the unknown row left-to-right
//! (seeding the left boundary per the symmetry mode), and `list_rows` walks
//! the columns back right-to-left, branching on each cell and intersecting
//! with the stored window sets, so every emitted row is feasible on both
//! sides of every column.

use oscil_rules::Row;

use crate::config::Symmetry;
use crate::error::SearchError;
use crate::rowset::RowSet;
use crate::tables::ExtTables;

/// Per-expansion extension state: one feasible-window bitmap per column.
#[derive(Clone)]
pub struct Extender {
    cols: [u32; 32],
}

impl Default for Extender {
    fn default() -> Self {
        Self { cols: [0; 32] }
    }
}

impl Extender {
    /// Fill the per-column window sets for the context `(a, b, c)`.
    ///
    /// `spark_mask` relaxes context bits so designated spark rows may be
    /// present or absent; pass `!0` for no relaxation. The seed encodes the
    /// left boundary: asymmetric searches pin two virtual dead columns,
    /// symmetric searches prepend the mirror cell (`odd` reflects around the
    /// center column, `even` duplicates it).
    pub fn setup(
        &mut self,
        tables: &ExtTables,
        symmetry: Symmetry,
        width: usize,
        a: Row,
        b: Row,
        c: Row,
        spark_mask: u32,
    ) {
        let mut x = match symmetry {
            Symmetry::None => {
                let x = 1;
                let x = tables.masked_ext(x, a << 2, b << 2, c << 2, spark_mask);
                tables.masked_ext(x, a << 1, b << 1, c << 1, spark_mask)
            }
            Symmetry::Odd => {
                let x = 0o377;
                let x = tables.masked_ext(
                    x,
                    (a << 1) | ((a & 2) >> 1),
                    (b << 1) | ((b & 2) >> 1),
                    c << 1,
                    spark_mask,
                );
                // Keep palindromic windows only.
                x & 0o245
            }
            Symmetry::Even => {
                let x = 0o303;
                tables.masked_ext(x, (a << 1) | (a & 1), (b << 1) | (b & 1), c << 1, spark_mask)
            }
        };
        let (mut a, mut b, mut c) = (a, b, c);
        for col in &mut self.cols[..width] {
            x = tables.masked_ext(x, a, b, c, spark_mask);
            *col = x;
            a >>= 1;
            b >>= 1;
            c >>= 1;
        }
    }

    /// After `setup`, is there any full-width completion? The final window
    /// must admit dead cells beyond the right edge.
    #[inline]
    #[must_use]
    pub fn feasible(&self, width: usize) -> bool {
        self.cols[width - 1] & 0b11 != 0
    }

    /// Emit every feasible row into `out` under `phase`.
    ///
    /// # Errors
    /// Propagates [`SearchError::RowBufferExceeded`] from the row buffer.
    pub fn list_rows(
        &self,
        tables: &ExtTables,
        width: usize,
        out: &mut RowSet,
        phase: usize,
    ) -> Result<(), SearchError> {
        self.descend(tables, out, phase, 0, width as i32 - 1, 0b11)
    }

    fn descend(
        &self,
        tables: &ExtTables,
        out: &mut RowSet,
        phase: usize,
        partial: Row,
        bit: i32,
        windows: u32,
    ) -> Result<(), SearchError> {
        if windows == 0 {
            return Ok(());
        }
        if bit < 0 {
            return out.push(phase, partial);
        }
        let windows = windows & self.cols[bit as usize];
        // Low cell dead lives in the even window states, live in the odd.
        self.descend(
            tables,
            out,
            phase,
            partial,
            bit - 1,
            tables.down_shift(windows & 0o125),
        )?;
        self.descend(
            tables,
            out,
            phase,
            partial | (1 << bit),
            bit - 1,
            tables.down_shift(windows & 0o252),
        )
    }
}
