// crates/oscil-engine/src/tables.rs

//! Precomputed lookup tables, derived once from the rule.
//!
//! Two table families, both immutable after construction:
//!
//! * [`ExtTables`] drives the row-extension automaton. A window state is a
//!   bitmap over the 8 possible contents of three consecutive cells of the
//!   row under construction (state value = `c0 + 2*c1 + 4*c2`, first cell
//!   lowest). `ext` maps (window bitmap, three aligned context cells of each
//!   of the three rows above, required successor bit) to the bitmap of
//!   windows after extending one cell; `down` re-bases a window bitmap when
//!   the automaton advances a column.
//!
//! * [`TermTables`] drives the terminator. A terminal state is a 16-bit
//!   bitmap over 2×2 blocks of the two would-be stator rows adjacent to the
//!   pattern:
//!
//!   ```text
//!   bit b1*8 + b2*4 + b3*2 + b4:     b1 b2
//!                                    b3 b4
//!   ```
//!
//!   where reversing a block swaps `b1<->b2` and `b3<->b4`. `next_term`
//!   advances the state bitmap by one column given the pattern context;
//!   `rev_term` mirrors a bitmap; `tcompat`/`stab` validate 5-cell stator
//!   column triples (stability away from the pattern, and against the
//!   actual pattern rows, respectively).

use oscil_rules::{Row, Rule};

/// Bits of an extension-table index: 8 window + 3 + 3 context + 1 successor.
const EXT_BITS: usize = 8 + 3 + 3 + 1;
const EXT_TAB_LEN: usize = 1 << EXT_BITS;

/// Index into `ExtTables::ext` for window bitmap `x`, context rows `a`, `b`
/// (low three bits each) and required successor bit (`c & 2`).
#[inline]
#[must_use]
pub(crate) fn ext_idx(x: u32, a: Row, b: Row, c: Row) -> usize {
    (((x as usize) << 7) | (((a & 7) as usize) << 4) | (((b & 7) as usize) << 1))
        | (((c & 2) >> 1) as usize)
}

/// Row-extension lookup tables.
#[derive(Clone)]
pub struct ExtTables {
    ext: Vec<u32>,
    down: [u32; 256],
}

impl ExtTables {
    /// Build the extension tables for `rule`.
    #[must_use]
    pub fn new(rule: Rule) -> Self {
        let mut ext = vec![0u32; EXT_TAB_LEN];
        for base in 0u32..=255 {
            for x in 0u32..=15 {
                // `x` is an old window (low 3 bits) plus the newly added cell
                // (bit 3); the transition is allowed only from windows in `base`.
                if base & (1 << (x & 7)) == 0 {
                    continue;
                }
                for a in 0u32..=7 {
                    for b in 0u32..=7 {
                        let alive = a & 2 != 0;
                        let neighbors = (a & 1)
                            + ((a >> 2) & 1)
                            + (b & 1)
                            + ((b >> 1) & 1)
                            + ((b >> 2) & 1)
                            + ((x >> 1) & 1)
                            + ((x >> 2) & 1)
                            + ((x >> 3) & 1);
                        let c = u32::from(rule.next_cell(alive, neighbors)) << 1;
                        ext[ext_idx(base, a, b, c)] |= 1 << (x >> 1);
                    }
                }
            }
        }

        let mut down = [0u32; 256];
        for (x, slot) in down.iter_mut().enumerate() {
            let mut y = 0;
            for s in 0..8 {
                if x & (1 << s) != 0 {
                    // Window (c0,c1,c2) persists as the high pair of the next
                    // window; the incoming low cell is free.
                    y |= 0b11 << ((s & 3) << 1);
                }
            }
            *slot = y;
        }

        Self { ext, down }
    }

    /// Advance the window bitmap `x` one cell, with `mask` relaxing context
    /// bits for spark rows: the result also has to be reachable with the
    /// masked-out context rows empty.
    #[inline]
    #[must_use]
    pub fn masked_ext(&self, x: u32, a: Row, b: Row, c: Row, mask: u32) -> u32 {
        let idx = ext_idx(x, a, b, c);
        self.ext[idx] & self.ext[idx & mask as usize]
    }

    /// Re-base a window bitmap after consuming one column.
    #[inline]
    #[must_use]
    pub fn down_shift(&self, x: u32) -> u32 {
        self.down[x as usize]
    }
}

/// Terminator lookup tables.
#[derive(Clone)]
pub struct TermTables {
    nx: Vec<u16>,
    rev: Vec<u16>,
    tcompat: Vec<bool>,
    stab: Vec<bool>,
    /// Popcount of a 5-cell stator column.
    pub col_pop: [i16; 32],
    /// Popcount of a 3-cell window, preshifted into the `nx` index.
    pr_count: [usize; 8],
    /// Fixed point of `nx` on the all-dead block: the possible-state bitmap
    /// after any number of empty-pattern stator columns.
    pub initial: u16,
    /// Columns of slack the closing stator may extend past the search width.
    pub addl_cols: usize,
}

impl TermTables {
    /// Build the termination tables for `rule`.
    ///
    /// `zero_lot_line` pins the closing stator inside the search width: the
    /// initial terminal state stays the single all-dead block and no slack
    /// columns are granted.
    #[must_use]
    pub fn new(rule: Rule, zero_lot_line: bool) -> Self {
        let mut col_pop = [0i16; 32];
        for (i, slot) in col_pop.iter_mut().enumerate() {
            *slot = i.count_ones() as i16;
        }
        let mut pr_count = [0usize; 8];
        for (i, slot) in pr_count.iter_mut().enumerate() {
            *slot = (i.count_ones() as usize) << 17;
        }

        // Stability of the middle cell of a 3-cell column triple; the two
        // neighbor columns contribute all three cells, the own column its
        // outer two.
        let mut tcomp3 = [false; 1 << 9];
        for i in 0..8u32 {
            for j in 0..8u32 {
                for k in 0..8u32 {
                    let alive = j & 2 != 0;
                    let neighbors = (i & 1)
                        + ((i >> 1) & 1)
                        + ((i >> 2) & 1)
                        + (k & 1)
                        + ((k >> 1) & 1)
                        + ((k >> 2) & 1)
                        + (j & 1)
                        + ((j >> 2) & 1);
                    tcomp3[((i << 6) | (j << 3) | k) as usize] =
                        rule.next_cell(alive, neighbors) == alive;
                }
            }
        }
        let t3 = |i: usize, j: usize, k: usize| {
            tcomp3[((i & 7) << 6) | ((j & 7) << 3) | (k & 7)]
        };

        // Full 5-cell column-triple stability: every interior cell of the
        // middle column is stable, including against the dead cells above.
        let mut tcompat = vec![false; 1 << 15];
        for i in 0..32usize {
            for j in 0..32usize {
                for k in 0..32usize {
                    tcompat[(i << 10) | (j << 5) | k] = t3(i, j, k)
                        && t3(i >> 1, j >> 1, k >> 1)
                        && t3(i >> 2, j >> 2, k >> 2)
                        && t3(i >> 3, j >> 3, k >> 3)
                        && t3(i >> 4, j >> 4, k >> 4);
                }
            }
        }

        // Consistency of a column triple with the live pattern rows.
        // Index layout: ii jj kk (two cells each, bits 12..7) | rrr (6..4) |
        // ppp (3..1) | s (0). Checks the pattern cell under jj evolves into
        // s, and the bottom cell of jj is itself stable.
        let mut stab = vec![false; 1 << 13];
        for (idx, slot) in stab.iter_mut().enumerate() {
            let idx = idx as u32;
            let r_mid = (idx >> 5) & 1 != 0;
            let n1 = ((idx >> 11) & 1)
                + ((idx >> 9) & 1)
                + ((idx >> 7) & 1)
                + ((idx >> 6) & 1)
                + ((idx >> 4) & 1)
                + ((idx >> 3) & 1)
                + ((idx >> 2) & 1)
                + ((idx >> 1) & 1);
            if rule.next_cell(r_mid, n1) != (idx & 1 != 0) {
                continue;
            }
            let b = (idx >> 9) & 1 != 0;
            let n2 = ((idx >> 12) & 1)
                + ((idx >> 11) & 1)
                + ((idx >> 10) & 1)
                + ((idx >> 8) & 1)
                + ((idx >> 7) & 1)
                + ((idx >> 6) & 1)
                + ((idx >> 5) & 1)
                + ((idx >> 4) & 1);
            *slot = rule.next_cell(b, n2) == b;
        }

        // Block mirror: swap b1<->b2 and b3<->b4 of every set block.
        let mut rev = vec![0u16; 1 << 16];
        for (i, slot) in rev.iter_mut().enumerate() {
            let mut r = 0u16;
            for j in 0..16 {
                if i & (1 << j) != 0 {
                    let k = ((j & 5) << 1) | ((j & 10) >> 1);
                    r |= 1 << k;
                }
            }
            *slot = r;
        }

        // Single-block successors under one new stator column pair
        // (inner = next cell of the row adjacent to the pattern, outer = next
        // cell of the row beyond it). nti index: block (bits 9..6) | context
        // (sr bit 0, pr count bits 2..1, r window bits 5..3).
        let mut nti = [0u16; 1 << 10];
        for ctx in 0..(1u32 << 6) {
            for j in 0..16u32 {
                let succ = ctx & 1 != 0;
                let n_mid = ((ctx >> 1) & 3)
                    + ((ctx >> 3) & 1)
                    + ((ctx >> 5) & 1)
                    + (j & 1)
                    + ((j >> 1) & 1);
                let mid_alive = (ctx >> 4) & 1 != 0;
                let b4 = j & 1 != 0;
                let n_b4 = ((j >> 1) & 1)
                    + ((j >> 2) & 1)
                    + ((j >> 3) & 1)
                    + ((ctx >> 3) & 1)
                    + ((ctx >> 4) & 1)
                    + ((ctx >> 5) & 1);
                let mut v = 0u16;
                for inner in 0..2u32 {
                    if rule.next_cell(mid_alive, n_mid + inner) != succ {
                        continue;
                    }
                    for outer in 0..2u32 {
                        if rule.next_cell(b4, n_b4 + inner + outer) == b4 {
                            v |= 1 << (((j & 5) << 1) | (outer << 2) | inner);
                        }
                    }
                }
                nti[((j << 6) | ctx) as usize] = v;
            }
        }

        // Expand single blocks to full 16-bit bitmaps by a subset walk: the
        // successor set of `t` is the successor set of `t` minus its lowest
        // block, plus that block's successors.
        let mut nx = vec![0u16; 1 << 22];
        for ctx in 0..(1usize << 6) {
            let base = ctx << 16;
            for t in 1..(1usize << 16) {
                let low = t.trailing_zeros() as usize;
                nx[base | t] = nx[base | (t & (t - 1))] | nti[(low << 6) | ctx];
            }
        }

        let mut initial = 1u16;
        let mut addl_cols = 0usize;
        if !zero_lot_line {
            loop {
                let next = nx[initial as usize];
                if next == initial {
                    break;
                }
                initial = next;
                addl_cols += 1;
            }
        }

        Self {
            nx,
            rev,
            tcompat,
            stab,
            col_pop,
            pr_count,
            initial,
            addl_cols,
        }
    }

    /// Advance a terminal-state bitmap by the pattern context at column `i`:
    /// `r` the last pattern row, `pr` its parent, `sr` the last row of the
    /// next phase (successor of `r`).
    #[inline]
    #[must_use]
    pub fn next_term(&self, t: u16, r: Row, pr: Row, sr: Row, i: usize) -> u16 {
        // u64 shifts: at the leftmost column of a 32-wide search, `sr` is
        // consulted one column past the row width.
        let sr_bit = ((u64::from(sr) >> (i + 1)) & 1) as usize;
        self.nx[(t as usize)
            | ((((r >> i) & 7) as usize) << 19)
            | self.pr_count[((pr >> i) & 7) as usize]
            | (sr_bit << 16)]
    }

    /// Mirror every block of a terminal-state bitmap.
    #[inline]
    #[must_use]
    pub fn rev_term(&self, t: u16) -> u16 {
        self.rev[t as usize]
    }

    /// Is the 5-cell column triple `(i, j, k)` stable away from the pattern?
    #[inline]
    #[must_use]
    pub fn tcompatible(&self, i: usize, j: usize, k: usize) -> bool {
        self.tcompat[(i << 10) | (j << 5) | k]
    }

    /// Raw stabilization-table probe; the caller assembles the index.
    #[inline]
    #[must_use]
    pub fn stab(&self, idx: usize) -> bool {
        self.stab[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ext_table_agrees_with_reference_stepper() {
        // Spot-check: a transition admitted by the table must reproduce the
        // rule's verdict for the cell it constrains.
        let rule = Rule::LIFE;
        let t = ExtTables::new(rule);
        // Window bitmap with every state allowed, blinker-ish context.
        for a in 0..8u32 {
            for b in 0..8u32 {
                let full = t.masked_ext(0xff, a, b, 0, !0) | t.masked_ext(0xff, a, b, 2, !0);
                // With all windows allowed and both successor values
                // accepted, every extension is reachable.
                assert_eq!(full, 0xff, "a={a} b={b}");
            }
        }
    }

    #[test]
    fn down_shift_rebases_windows() {
        let t = ExtTables::new(Rule::LIFE);
        // Even windows (low cell dead) re-base to the windows whose high
        // pair is 00 or 10; odd windows to 01 or 11.
        assert_eq!(t.down_shift(0o125), 0b0011_0011);
        assert_eq!(t.down_shift(0o252), 0b1100_1100);
        // Singletons map to the pair sharing their low cells.
        for s in 0..8u32 {
            assert_eq!(t.down_shift(1 << s), 0b11 << ((s & 3) << 1));
        }
    }

    #[test]
    fn single_live_column_cell_is_unstable_in_life() {
        // The original's own startup self-check: a column whose only live
        // cell is the bottom-middle must not count as stable stator.
        let t = TermTables::new(Rule::LIFE, false);
        assert!(!t.tcompatible(0, 2, 0));
        // The empty triple is trivially stable.
        assert!(t.tcompatible(0, 0, 0));
    }

    #[test]
    fn initial_state_fixed_point() {
        let t = TermTables::new(Rule::LIFE, false);
        assert_ne!(t.initial, 0);
        assert_eq!(t.nx[t.initial as usize], t.initial);
        assert!(t.addl_cols < 16, "slack columns should be few");

        let z = TermTables::new(Rule::LIFE, true);
        assert_eq!(z.initial, 1);
        assert_eq!(z.addl_cols, 0);
    }

    #[test]
    fn rev_term_is_an_involution() {
        let t = TermTables::new(Rule::LIFE, false);
        for i in [0u16, 1, 0x8000, 0x1234, 0xffff, 0x0f0f] {
            assert_eq!(t.rev_term(t.rev_term(i)), i);
        }
        // Block 0b0110 (b2=1, b3=1) mirrors to 0b1001.
        assert_eq!(t.rev_term(1 << 0b0110), 1 << 0b1001);
    }
}
