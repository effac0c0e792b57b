// crates/oscil-engine/src/queue.rs

//! Flat state arena with duplicate elimination and compaction.
//!
//! ## Slot layout
//!
//! Each state occupies `period + 1` consecutive words:
//!
//! ```text
//! word 0:        parent slot index, or ROOT_TAG, or UNUSED_TAG
//! words 1..=P:   the most recent row of each phase
//! ```
//!
//! Older rows of a pattern are reached by walking parent links; the root
//! holds all-zero rows and carries `ROOT_TAG`. Parents always sit at
//! strictly smaller slots than their children, and compaction preserves slot
//! order — the parent-fixing pass depends on both.
//!
//! ## Dedup hash
//!
//! Open addressing over `1 << 21` entries, three probes, stepping the key by
//! `key >> 16` per collision. A state's key sums one salt per (phase, byte
//! position, byte value) of its own rows and a second salt table over its
//! parent's rows, so transpositions collide while parent-relative direction
//! still matters. Entry 0 means empty; the root (slot 0) is never inserted.

use oscil_rules::Row;
use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng};

use crate::config::MAX_PERIOD;
use crate::error::SearchError;

/// Slot index into the state arena.
pub type StateId = u32;

/// Parent tag of the search-tree root.
const ROOT_TAG: u32 = u32::MAX;
/// Parent tag of a state condemned by deepening or the mark pass.
const UNUSED_TAG: u32 = u32::MAX - 1;

const HASH_SIZE: usize = 1 << 21;
const HASH_MASK: u64 = (HASH_SIZE as u64) - 1;
const SALT_ENTRIES: usize = MAX_PERIOD * 1024;

/// The state queue: arena, frontier cursors, and the dedup hash.
pub struct StateQueue {
    words: Vec<u32>,
    stride: usize,
    period: usize,
    max_slots: usize,
    /// First state not yet expanded by the breadth-first loop.
    pub first_unprocessed: StateId,
    /// First unoccupied slot.
    pub first_free: StateId,
    hashing: bool,
    hash: Vec<u32>,
    salt: Vec<u64>,
    salt_parent: Vec<u64>,
}

impl StateQueue {
    /// Create a queue holding only the root state (all-zero rows).
    #[must_use]
    pub fn new(period: usize, max_slots: usize, hash_seed: u64, hashing: bool) -> Self {
        let stride = period + 1;
        let mut rng = StdRng::seed_from_u64(hash_seed);
        let salt = (0..SALT_ENTRIES).map(|_| rng.random()).collect();
        let salt_parent = (0..SALT_ENTRIES).map(|_| rng.random()).collect();
        let mut q = Self {
            words: vec![0; stride],
            stride,
            period,
            max_slots,
            first_unprocessed: 0,
            first_free: 1,
            hashing,
            hash: vec![0; HASH_SIZE],
            salt,
            salt_parent,
        };
        q.set_parent_word(0, ROOT_TAG);
        q
    }

    #[inline]
    fn base(&self, s: StateId) -> usize {
        s as usize * self.stride
    }

    #[inline]
    pub(crate) fn parent_word(&self, s: StateId) -> u32 {
        self.words[self.base(s)]
    }

    #[inline]
    fn set_parent_word(&mut self, s: StateId, w: u32) {
        let b = self.base(s);
        self.words[b] = w;
    }

    /// Parent of `s`, `None` for the root.
    #[inline]
    #[must_use]
    pub fn parent(&self, s: StateId) -> Option<StateId> {
        match self.parent_word(s) {
            ROOT_TAG => None,
            w => {
                debug_assert_ne!(w, UNUSED_TAG, "parent of unused state {s}");
                Some(w)
            }
        }
    }

    /// The original's self-parent view of the queue: the root reads as its
    /// own parent. The compaction passes are written against this encoding.
    #[inline]
    fn c_parent(&self, s: StateId) -> u32 {
        match self.parent_word(s) {
            ROOT_TAG => s,
            w => w,
        }
    }

    /// Row of `s` at `phase`.
    #[inline]
    #[must_use]
    pub fn row(&self, s: StateId, phase: usize) -> Row {
        self.words[self.base(s) + 1 + phase]
    }

    #[inline]
    fn set_row(&mut self, s: StateId, phase: usize, row: Row) {
        let b = self.base(s);
        self.words[b + 1 + phase] = row;
    }

    /// Is `s` condemned?
    #[inline]
    #[must_use]
    pub fn is_unused(&self, s: StateId) -> bool {
        self.parent_word(s) == UNUSED_TAG
    }

    /// Condemn `s` (deepening found its subtree dead).
    pub fn mark_unused(&mut self, s: StateId) {
        self.set_parent_word(s, UNUSED_TAG);
    }

    /// Toggle duplicate elimination (off inside deepening, whose pushes are
    /// rolled back and must not leave hash entries behind).
    pub fn set_hashing(&mut self, on: bool) {
        self.hashing = on;
    }

    fn ensure_slot(&mut self, s: StateId) -> Result<(), SearchError> {
        if s as usize >= self.max_slots {
            return Err(SearchError::QueueExhausted(self.max_slots));
        }
        let need = (s as usize + 1) * self.stride;
        if self.words.len() < need {
            self.words.resize(need, 0);
        }
        Ok(())
    }

    /// Append a child of `parent` with the given per-phase rows.
    ///
    /// Returns `false` when the child was retracted: the all-zero successor
    /// of the root, or a hash-confirmed duplicate.
    ///
    /// # Errors
    /// [`SearchError::QueueExhausted`] at slot capacity.
    pub fn try_push(&mut self, parent: StateId, rows: &[Row]) -> Result<bool, SearchError> {
        let s = self.first_free;
        self.ensure_slot(s)?;
        self.set_parent_word(s, parent);
        for (phase, &row) in rows.iter().enumerate() {
            self.set_row(s, phase, row);
        }
        self.first_free = s + 1;
        if self.parent_word(parent) == ROOT_TAG && rows.iter().all(|&r| r == 0) {
            self.first_free = s;
            return Ok(false);
        }
        if self.hashing && self.insert_hash(s) {
            self.first_free = s;
            return Ok(false);
        }
        Ok(true)
    }

    /// Seed one pre-specified row: it becomes the new frontier state, child
    /// of the previous one, so the search starts below the given context.
    ///
    /// # Errors
    /// [`SearchError::QueueExhausted`] at slot capacity.
    pub fn push_initial(&mut self, rows: &[Row]) -> Result<(), SearchError> {
        let s = self.first_free;
        self.ensure_slot(s)?;
        self.set_parent_word(s, self.first_unprocessed);
        for (phase, &row) in rows.iter().enumerate() {
            self.set_row(s, phase, row);
        }
        self.first_free = s + 1;
        self.first_unprocessed = s;
        Ok(())
    }

    /// Length of the ancestor chain below `s`.
    #[must_use]
    pub fn depth(&self, s: StateId) -> usize {
        let mut s = s;
        let mut d = 0;
        while let Some(p) = self.parent(s) {
            s = p;
            d += 1;
        }
        d
    }

    /// Rows of `phase` along the chain from `s` to the root, deepest first.
    #[must_use]
    pub fn chain_rows(&self, s: StateId, phase: usize) -> Vec<Row> {
        let mut out = Vec::new();
        let mut s = s;
        while let Some(p) = self.parent(s) {
            out.push(self.row(s, phase));
            s = p;
        }
        out
    }

    fn hash_key(&self, s: StateId) -> u64 {
        let parent = self.c_parent(s);
        let mut key = 0u64;
        for phase in 0..self.period {
            let r = self.row(s, phase);
            let pr = self.row(parent, phase);
            for byte in 0..4 {
                let idx = (phase << 10) | (byte << 8);
                key = key.wrapping_add(self.salt[idx | ((r >> (byte * 8)) & 0xff) as usize]);
                key = key
                    .wrapping_add(self.salt_parent[idx | ((pr >> (byte * 8)) & 0xff) as usize]);
            }
        }
        key
    }

    fn is_duplicate(&self, s: StateId, t: StateId) -> bool {
        let ps = self.c_parent(s);
        let pt = self.c_parent(t);
        (0..self.period).all(|phase| {
            self.row(s, phase) == self.row(t, phase) && self.row(ps, phase) == self.row(pt, phase)
        })
    }

    /// Insert `s`; `true` means an equal state already lives in the table.
    /// Probing gives up after three tries without treating that as a
    /// duplicate.
    fn insert_hash(&mut self, s: StateId) -> bool {
        let mut key = self.hash_key(s);
        for _ in 0..3 {
            let slot = (key & HASH_MASK) as usize;
            let entry = self.hash[slot];
            if entry == 0 {
                self.hash[slot] = s;
                return false;
            }
            if self.is_duplicate(s, entry) {
                return true;
            }
            key = key.wrapping_add(key >> 16);
        }
        false
    }

    fn clear_hash(&mut self) {
        self.hash.fill(0);
    }

    /// Compact the arena: mark states no live descendant claims, slide the
    /// survivors forward, then rewrite parent links and rebuild the hash.
    ///
    /// `already_marked` is the number of states deepening condemned; the
    /// slide runs whenever either pass marked anything.
    ///
    /// # Errors
    /// [`SearchError::CorruptQueue`] when a claimed parent cannot be found —
    /// an invariant violation, not a recoverable state.
    pub fn compact(&mut self, already_marked: usize) -> Result<(), SearchError> {
        let mut marked = already_marked;
        self.clear_hash();

        // Mark pass: walk the processed region backward with x; y scans
        // backward for the state claiming x as parent. Everything x passes
        // without a claimant is condemned.
        if self.first_unprocessed > 0 {
            let mut x = self.first_unprocessed - 1;
            let mut y = self.first_free - 1;
            while self.parent_word(y) == UNUSED_TAG {
                y -= 1;
            }
            loop {
                while self.c_parent(y) != x {
                    if self.c_parent(x) == x {
                        return Err(SearchError::CorruptQueue(y));
                    }
                    self.set_parent_word(x, UNUSED_TAG);
                    marked += 1;
                    x -= 1;
                }
                if self.c_parent(x) == x {
                    break;
                }
                while self.c_parent(y) == x || self.parent_word(y) == UNUSED_TAG {
                    y -= 1;
                }
                x -= 1;
                if self.c_parent(x) == x {
                    break;
                }
            }
        }

        if marked == 0 {
            return Ok(());
        }

        // Slide pass: move live states over the holes, preserving order.
        // The frontier cursor follows the slot its state (or, if condemned,
        // its first live successor) lands on; it only moves when it sat at
        // or past the first hole.
        let mut x: StateId = 0;
        while self.parent_word(x) != UNUSED_TAG {
            x += 1;
        }
        let old_first_unprocessed = self.first_unprocessed;
        let frontier_in_motion = old_first_unprocessed >= x;
        let mut frontier_moved = false;
        let mut y = x;
        while y < self.first_free {
            if y == old_first_unprocessed {
                self.first_unprocessed = x;
                frontier_moved = true;
            }
            if self.parent_word(y) != UNUSED_TAG {
                let pw = self.parent_word(y);
                self.set_parent_word(x, pw);
                for phase in 0..self.period {
                    let r = self.row(y, phase);
                    self.set_row(x, phase, r);
                }
                x += 1;
            }
            y += 1;
        }
        self.first_free = x;
        if frontier_in_motion && !frontier_moved {
            self.first_unprocessed = x;
        }

        // Fix pass: slid parent words are stale slot indices, but equality
        // with the predecessor's old parent still means "same parent".
        // Otherwise the parent is the next live slot after the predecessor's
        // parent, because children stay grouped by parent in slot order.
        let mut prev_old_parent: u32 = 0;
        let mut s: StateId = 1;
        while s < self.first_free {
            let old = self.parent_word(s);
            let fixed = if old == prev_old_parent {
                self.c_parent(s - 1)
            } else {
                prev_old_parent = old;
                self.c_parent(s - 1) + 1
            };
            self.set_parent_word(s, fixed);
            let _ = self.insert_hash(s);
            s += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk_queue(period: usize) -> StateQueue {
        StateQueue::new(period, 1 << 12, 7, true)
    }

    #[test]
    fn root_is_tagged() {
        let q = mk_queue(3);
        assert_eq!(q.parent(0), None);
        assert_eq!(q.row(0, 2), 0);
        assert_eq!(q.depth(0), 0);
    }

    #[test]
    fn zero_successor_of_root_is_retracted() {
        let mut q = mk_queue(2);
        assert!(!q.try_push(0, &[0, 0]).unwrap());
        assert_eq!(q.first_free, 1);
        assert!(q.try_push(0, &[1, 0]).unwrap());
        // A zero child of a non-root parent is fine.
        assert!(q.try_push(1, &[0, 0]).unwrap());
        assert_eq!(q.first_free, 3);
    }

    #[test]
    fn duplicates_are_retracted() {
        let mut q = mk_queue(2);
        assert!(q.try_push(0, &[3, 1]).unwrap());
        assert!(!q.try_push(0, &[3, 1]).unwrap(), "same rows, same parent");
        // Same rows under a different parent with different rows: kept.
        assert!(q.try_push(0, &[5, 0]).unwrap());
        assert!(q.try_push(2, &[3, 1]).unwrap());
        assert_eq!(q.first_free, 4);
    }

    #[test]
    fn hashing_can_be_disabled() {
        let mut q = mk_queue(1);
        q.set_hashing(false);
        assert!(q.try_push(0, &[9]).unwrap());
        assert!(q.try_push(0, &[9]).unwrap());
        assert_eq!(q.first_free, 3);
    }

    #[test]
    fn chain_rows_walk_parents() {
        let mut q = mk_queue(1);
        q.try_push(0, &[1]).unwrap();
        q.try_push(1, &[2]).unwrap();
        q.try_push(2, &[3]).unwrap();
        assert_eq!(q.chain_rows(3, 0), vec![3, 2, 1]);
        assert_eq!(q.depth(3), 3);
    }

    /// The compaction fixpoint scenario: a live tree plus condemned frontier
    /// siblings compacts to exactly the live states, same order, parents
    /// intact.
    #[test]
    fn compaction_preserves_live_topology() {
        let mut q = mk_queue(1);
        q.set_hashing(false);
        // Root expanded into a, b; a expanded into slots 3, 4; b into 5.
        q.try_push(0, &[10]).unwrap(); // slot 1 = a
        q.try_push(0, &[11]).unwrap(); // slot 2 = b
        q.try_push(1, &[20]).unwrap(); // slot 3
        q.try_push(1, &[21]).unwrap(); // slot 4
        q.try_push(2, &[30]).unwrap(); // slot 5
        q.first_unprocessed = 3;
        // Deepening condemns frontier slot 4.
        q.mark_unused(4);
        q.compact(1).unwrap();

        // Live states: root, a, b, old-3, old-5 in order.
        assert_eq!(q.first_free, 5);
        assert_eq!(q.parent(0), None);
        assert_eq!(q.parent(1), Some(0));
        assert_eq!(q.row(1, 0), 10);
        assert_eq!(q.parent(2), Some(0));
        assert_eq!(q.row(2, 0), 11);
        assert_eq!(q.parent(3), Some(1));
        assert_eq!(q.row(3, 0), 20);
        assert_eq!(q.parent(4), Some(2));
        assert_eq!(q.row(4, 0), 30);
        // The hole was past the frontier, so the frontier stays put.
        assert_eq!(q.first_unprocessed, 3);
    }

    #[test]
    fn compaction_drops_childless_processed_states() {
        let mut q = mk_queue(1);
        q.set_hashing(false);
        q.try_push(0, &[10]).unwrap(); // slot 1, will stay (has child)
        q.try_push(0, &[11]).unwrap(); // slot 2, childless -> condemned
        q.try_push(1, &[20]).unwrap(); // slot 3, frontier
        q.first_unprocessed = 3;
        q.compact(0).unwrap();
        assert_eq!(q.first_free, 3);
        assert_eq!(q.first_unprocessed, 2);
        assert_eq!(q.row(1, 0), 10);
        assert_eq!(q.row(2, 0), 20);
        assert_eq!(q.parent(2), Some(1));
    }
}
