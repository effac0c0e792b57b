// crates/oscil-engine/src/rowset.rs

//! Shared candidate-row buffer.
//!
//! One contiguous arena holds the extension rows of every phase of the
//! current expansion, phase after phase. Stator grouping narrows the
//! per-phase `[first, first + len)` windows in place, so the same storage
//! serves both the full listing and each stator group.

use oscil_rules::Row;

use crate::config::MAX_PERIOD;
use crate::error::SearchError;

/// Arena capacity; exceeding it aborts the search.
pub const MAX_ROWS: usize = 1 << 20;

/// Candidate rows for all phases of one expansion.
pub struct RowSet {
    rows: Vec<Row>,
    first: [usize; MAX_PERIOD],
    len: [usize; MAX_PERIOD],
}

impl Default for RowSet {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            first: [0; MAX_PERIOD],
            len: [0; MAX_PERIOD],
        }
    }
}

impl RowSet {
    /// Start collecting rows for `phase`, directly after the previous phase.
    pub fn begin_phase(&mut self, phase: usize) {
        let first = if phase == 0 {
            0
        } else {
            self.first[phase - 1] + self.len[phase - 1]
        };
        self.first[phase] = first;
        self.len[phase] = 0;
        self.rows.truncate(first);
    }

    /// Append one row to `phase` (the phase currently being collected).
    ///
    /// # Errors
    /// [`SearchError::RowBufferExceeded`] once the arena is full.
    pub fn push(&mut self, phase: usize, row: Row) -> Result<(), SearchError> {
        if self.rows.len() >= MAX_ROWS {
            return Err(SearchError::RowBufferExceeded);
        }
        self.rows.push(row);
        self.len[phase] += 1;
        Ok(())
    }

    /// Row `i` of `phase`'s current window.
    #[inline]
    #[must_use]
    pub fn row(&self, phase: usize, i: usize) -> Row {
        self.rows[self.first[phase] + i]
    }

    /// Row at an absolute arena index.
    #[inline]
    #[must_use]
    pub fn raw_row(&self, idx: usize) -> Row {
        self.rows[idx]
    }

    /// Number of rows in `phase`'s current window.
    #[inline]
    #[must_use]
    pub fn n(&self, phase: usize) -> usize {
        self.len[phase]
    }

    /// Start of `phase`'s current window (absolute arena index).
    #[inline]
    #[must_use]
    pub fn first(&self, phase: usize) -> usize {
        self.first[phase]
    }

    pub fn set_first(&mut self, phase: usize, first: usize) {
        self.first[phase] = first;
    }

    pub fn set_n(&mut self, phase: usize, n: usize) {
        self.len[phase] = n;
    }

    /// Sort `phase`'s window by (stator bits, full row), the enumeration
    /// order the driver's determinism guarantee relies on.
    pub fn sort_phase(&mut self, phase: usize, statmask: Row) {
        let lo = self.first[phase];
        let hi = lo + self.len[phase];
        self.rows[lo..hi].sort_unstable_by_key(|&r| (r & statmask, r));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_are_contiguous() {
        let mut rs = RowSet::default();
        rs.begin_phase(0);
        rs.push(0, 3).unwrap();
        rs.push(0, 1).unwrap();
        rs.begin_phase(1);
        rs.push(1, 7).unwrap();
        assert_eq!(rs.n(0), 2);
        assert_eq!(rs.n(1), 1);
        assert_eq!(rs.first(1), 2);
        assert_eq!(rs.row(1, 0), 7);
        // Restarting a phase truncates everything after it.
        rs.begin_phase(1);
        assert_eq!(rs.n(1), 0);
        assert_eq!(rs.row(0, 1), 1);
    }

    #[test]
    fn sort_groups_by_stator_then_row() {
        let mut rs = RowSet::default();
        rs.begin_phase(0);
        // statmask 0b100: rows 4..7 share stator bit, 0..3 share none.
        for r in [6, 1, 4, 3] {
            rs.push(0, r).unwrap();
        }
        rs.sort_phase(0, 0b100);
        let got: Vec<Row> = (0..4).map(|i| rs.row(0, i)).collect();
        assert_eq!(got, vec![1, 3, 4, 6]);
    }
}
