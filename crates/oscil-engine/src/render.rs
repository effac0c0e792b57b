// crates/oscil-engine/src/render.rs

//! ASCII rendering of found patterns.
//!
//! Reproduces the original output byte for byte: `.`/`o` cells, symmetric
//! halves mirrored in front of the stored half, `addl_stator_cols` of
//! padding, and — for stator-closed patterns — five rows of closing stator
//! recovered from the DP predecessor table.

use std::fmt;

use oscil_rules::Row;

use crate::config::Symmetry;
use crate::term::{Closure, Terminator};

/// A found oscillator, fully rendered.
///
/// `lines` holds exactly what should be printed, leading blank line
/// included; [`Pattern::grid`] recovers the cell grid for callers that want
/// to re-simulate the pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    /// Printable lines, starting with the original's blank separator line.
    pub lines: Vec<String>,
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl Pattern {
    /// The rendered grid as booleans, one Vec per printed row (blank
    /// separator dropped). Columns align across rows since every line is
    /// emitted at the same width.
    #[must_use]
    pub fn grid(&self) -> Vec<Vec<bool>> {
        self.lines
            .iter()
            .filter(|l| !l.is_empty())
            .map(|l| l.chars().map(|c| c == 'o').collect())
            .collect()
    }
}

#[inline]
fn cell(row: Row, bit: usize) -> char {
    if bit < 32 && row & (1 << bit) != 0 {
        'o'
    } else {
        '.'
    }
}

/// Render one stored row at full output width.
///
/// Symmetric modes print the mirrored left half first (odd symmetry skips
/// the shared center column); the right half always spans the search width
/// plus the stator slack. The lone `.` in the asymmetric no-slack case is
/// the original's alignment behavior, kept verbatim.
#[must_use]
pub fn render_row(
    row: Row,
    symmetry: Symmetry,
    total_width: usize,
    addl_stator_cols: usize,
) -> String {
    let mut out = String::new();
    for _ in 0..addl_stator_cols {
        out.push('.');
    }
    match symmetry {
        Symmetry::None => {
            if addl_stator_cols == 0 {
                out.push('.');
            }
        }
        Symmetry::Odd => {
            for bit in (1..total_width).rev() {
                out.push(cell(row, bit));
            }
        }
        Symmetry::Even => {
            for bit in (0..total_width).rev() {
                out.push(cell(row, bit));
            }
        }
    }
    for bit in 0..total_width + addl_stator_cols {
        out.push(cell(row, bit));
    }
    out
}

/// Walk the DP predecessor chain from `col` upward, appending one cell of
/// stator row `row` per column. `reversed` prints while descending instead
/// of unwinding, which flips the output direction; `skip` suppresses the
/// overlap columns shared with the paired walk.
#[allow(clippy::too_many_arguments)]
pub fn put_stator(
    out: &mut String,
    term: &Terminator,
    top: i32,
    row: usize,
    col: i32,
    i: usize,
    j: usize,
    reversed: bool,
    skip: i32,
) {
    if skip <= 0 && reversed {
        out.push(cell(j as Row, row));
    }
    if col < top - 1 {
        let p = term.pred(col, i, j) as usize;
        put_stator(out, term, top, row, col + 1, p, i, reversed, skip - 1);
    }
    if skip <= 0 && !reversed {
        out.push(cell(j as Row, row));
    }
}

/// The five closing stator rows for a stator-closed pattern.
#[must_use]
pub fn render_stator_rows(
    term: &Terminator,
    closure: Closure,
    symmetry: Symmetry,
    total_width: usize,
    top: i32,
) -> Vec<String> {
    let fwd = closure.fwd as usize;
    let back = closure.back as usize;
    (0..5)
        .map(|row| {
            let mut line = String::new();
            match symmetry {
                Symmetry::Odd => {
                    put_stator(&mut line, term, top, row, 0, fwd, back, false, 1);
                    put_stator(&mut line, term, top, row, -1, back, fwd, true, 1);
                }
                Symmetry::Even => {
                    put_stator(&mut line, term, top, row, -1, fwd, back, false, 1);
                    put_stator(&mut line, term, top, row, -1, back, fwd, true, 1);
                }
                Symmetry::None => {
                    put_stator(
                        &mut line,
                        term,
                        top,
                        row,
                        total_width as i32,
                        back,
                        fwd,
                        false,
                        1,
                    );
                    put_stator(&mut line, term, top, row, -2, fwd, back, true, 1);
                }
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asymmetric_rows_carry_alignment_dot() {
        // No slack: one alignment dot, then the row low-bit-first.
        assert_eq!(render_row(0b011, Symmetry::None, 4, 0), ".oo..");
        // With slack, padding replaces the dot.
        assert_eq!(render_row(0b011, Symmetry::None, 4, 2), "..oo....");
    }

    #[test]
    fn symmetric_rows_mirror_the_half() {
        // Even: full mirror then the half itself; bit 0 sits at the center.
        assert_eq!(render_row(0b01, Symmetry::Even, 2, 0), ".oo.");
        // Odd: the center column (bit 0) is shared, not repeated.
        assert_eq!(render_row(0b01, Symmetry::Odd, 2, 0), ".o.");
        assert_eq!(render_row(0b11, Symmetry::Odd, 2, 1), ".ooo.");
    }
}
