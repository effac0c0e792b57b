// crates/oscil-engine/src/compat.rs

//! Compatibility and reachability bitmatrices.
//!
//! Both are rebuilt for every expansion and discarded afterwards.
//!
//! The compatibility matrix of phase `p` has one bit per pair `(i, j)`:
//! candidate row `i` of phase `p-1` can evolve (between the parent rows)
//! into candidate row `j` of phase `p`. Phase 0's block holds the
//! wrap-around relation from phase `P-1`.
//!
//! The reachability matrix closes compatibility transitively toward phase
//! 0: bit `(j, k)` of phase `p` says a chain `p → p+1 → … → P-1 → 0` exists
//! from row `j` landing on phase-0 row `k`. It prunes the cycle enumeration
//! before most of the Cartesian product is ever touched.

use oscil_rules::Row;

use crate::config::MAX_PERIOD;
use crate::error::SearchError;

/// Word capacity shared by each matrix; overflowing it aborts the search.
pub const MAX_MATRIX_WORDS: usize = 1 << 21;

/// Per-phase row-to-previous-row compatibility bits.
pub struct CompatMatrix {
    bits: Vec<Row>,
    first: [usize; MAX_PERIOD],
    block_len: [usize; MAX_PERIOD],
    n_rows: [usize; MAX_PERIOD],
}

impl Default for CompatMatrix {
    fn default() -> Self {
        Self {
            bits: Vec::new(),
            first: [0; MAX_PERIOD],
            block_len: [0; MAX_PERIOD],
            n_rows: [0; MAX_PERIOD],
        }
    }
}

impl CompatMatrix {
    /// Open (and zero) the block for `phase`, whose rows pair `n_prev`
    /// previous-phase rows with `n_phase` own rows.
    ///
    /// Blocks must be opened in phase order starting at 0.
    ///
    /// # Errors
    /// [`SearchError::CompatSpaceExceeded`] when the block would overflow.
    pub fn begin_phase(
        &mut self,
        phase: usize,
        n_prev: usize,
        n_phase: usize,
    ) -> Result<(), SearchError> {
        let first = if phase == 0 {
            0
        } else {
            self.first[phase - 1] + self.block_len[phase - 1] * self.n_rows[phase - 1]
        };
        let block_len = (n_prev + 31) >> 5;
        let end = first + block_len * n_phase;
        if end > MAX_MATRIX_WORDS {
            return Err(SearchError::CompatSpaceExceeded);
        }
        self.first[phase] = first;
        self.block_len[phase] = block_len;
        self.n_rows[phase] = n_phase;
        if self.bits.len() < end {
            self.bits.resize(end, 0);
        }
        self.bits[first..end].fill(0);
        Ok(())
    }

    /// Mark row `i` of the previous phase compatible with row `j` of `phase`.
    #[inline]
    pub fn set(&mut self, phase: usize, i: usize, j: usize) {
        let w = self.first[phase] + self.block_len[phase] * j + (i >> 5);
        self.bits[w] |= 1 << (i & 31);
    }

    /// Is row `i` of the previous phase compatible with row `j` of `phase`?
    #[inline]
    #[must_use]
    pub fn get(&self, phase: usize, i: usize, j: usize) -> bool {
        let w = self.first[phase] + self.block_len[phase] * j + (i >> 5);
        self.bits[w] & (1 << (i & 31)) != 0
    }
}

/// Phase-to-phase-0 reachability bits.
pub struct ReachMatrix {
    bits: Vec<Row>,
    first: [usize; MAX_PERIOD],
    reach_len: usize,
}

impl Default for ReachMatrix {
    fn default() -> Self {
        Self {
            bits: Vec::new(),
            first: [0; MAX_PERIOD],
            reach_len: 0,
        }
    }
}

impl ReachMatrix {
    /// Rebuild reachability by backward induction from phase `P-1`, whose
    /// base case is one-step compatibility into phase 0.
    ///
    /// # Errors
    /// [`SearchError::ReachSpaceExceeded`] when a block would overflow.
    pub fn build(
        &mut self,
        compat: &CompatMatrix,
        n_rows: &[usize],
        period: usize,
    ) -> Result<(), SearchError> {
        let reach_len = (n_rows[0] + 31) >> 5;
        self.reach_len = reach_len;

        self.first[period - 1] = 0;
        let last_end = n_rows[period - 1] * reach_len;
        if last_end >= MAX_MATRIX_WORDS {
            return Err(SearchError::ReachSpaceExceeded);
        }
        if self.bits.len() < last_end {
            self.bits.resize(last_end, 0);
        }
        for i in 0..n_rows[period - 1] {
            let base = i * reach_len;
            self.bits[base..base + reach_len].fill(0);
            for k in 0..n_rows[0] {
                if compat.get(0, i, k) {
                    self.bits[base + (k >> 5)] |= 1 << (k & 31);
                }
            }
        }

        for phase in (0..period.saturating_sub(1)).rev() {
            let first = self.first[phase + 1] + n_rows[phase + 1] * reach_len;
            let end = first + n_rows[phase] * reach_len;
            if end >= MAX_MATRIX_WORDS {
                return Err(SearchError::ReachSpaceExceeded);
            }
            self.first[phase] = first;
            if self.bits.len() < end {
                self.bits.resize(end, 0);
            }
            for i in 0..n_rows[phase] {
                let dst_start = first + i * reach_len;
                self.bits[dst_start..dst_start + reach_len].fill(0);
                for j in 0..n_rows[phase + 1] {
                    if compat.get(phase + 1, i, j) {
                        let src_start = self.first[phase + 1] + j * reach_len;
                        let (lo, hi) = self.bits.split_at_mut(dst_start);
                        let src = &lo[src_start..src_start + reach_len];
                        for (d, s) in hi[..reach_len].iter_mut().zip(src) {
                            *d |= *s;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Can phase-`phase` row `j` reach phase-0 row `k`?
    #[inline]
    #[must_use]
    pub fn get(&self, phase: usize, j: usize, k: usize) -> bool {
        let w = self.first[phase] + j * self.reach_len + (k >> 5);
        self.bits[w] & (1 << (k & 31)) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-build a 3-phase compatibility relation and check the closure.
    #[test]
    fn reachability_follows_chains() {
        let mut c = CompatMatrix::default();
        let n = [2usize, 2, 2];
        // phase 0 block: wrap-around from phase 2.
        c.begin_phase(0, n[2], n[0]).unwrap();
        // phase-2 row 0 -> phase-0 row 1 only.
        c.set(0, 0, 1);
        c.begin_phase(1, n[0], n[1]).unwrap();
        // phase-0 row 0 -> phase-1 rows 0 and 1; row 1 -> nothing.
        c.set(1, 0, 0);
        c.set(1, 0, 1);
        c.begin_phase(2, n[1], n[2]).unwrap();
        // phase-1 row 1 -> phase-2 row 0.
        c.set(2, 1, 0);

        let mut r = ReachMatrix::default();
        r.build(&c, &n, 3).unwrap();

        // Base: phase 2 row 0 reaches phase-0 row 1; row 1 reaches nothing.
        assert!(r.get(2, 0, 1));
        assert!(!r.get(2, 0, 0));
        assert!(!r.get(2, 1, 0) && !r.get(2, 1, 1));
        // Phase 1: row 1 -> phase-2 row 0 -> phase-0 row 1.
        assert!(r.get(1, 1, 1));
        assert!(!r.get(1, 0, 0) && !r.get(1, 0, 1));
        // Phase 0: row 0 -> phase-1 row 1 -> ... -> phase-0 row 1.
        assert!(r.get(0, 0, 1));
        assert!(!r.get(0, 1, 1));
    }

    #[test]
    fn compat_bits_round_trip() {
        let mut c = CompatMatrix::default();
        c.begin_phase(0, 40, 3).unwrap();
        c.set(0, 33, 2);
        c.set(0, 0, 0);
        assert!(c.get(0, 33, 2));
        assert!(c.get(0, 0, 0));
        assert!(!c.get(0, 33, 1));
        assert!(!c.get(0, 32, 2));
    }
}
