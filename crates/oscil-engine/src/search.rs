// crates/oscil-engine/src/search.rs

//! The search driver.
//!
//! Breadth-first expansion over the state queue, switching to depth-first
//! iterative deepening when the queue fills: every frontier state must then
//! prove its subtree survives one level deeper than the previous deepening
//! round, or it is pruned before compaction. Stalls (deepening beyond
//! `max_deepen`) narrow the rotor so the search can finish a pattern off
//! with stator columns.
//!
//! Expanding one state lists, for every phase, all rows that continue the
//! evolution one row down, groups them by stator bits, and enumerates the
//! cycles through the phase-compatibility graph; each cycle becomes a child
//! state. A popped state that can be closed off (mirrored rows or an
//! all-stator continuation) and whose history genuinely needs the full
//! period is the search result.

use oscil_rules::Row;
use tracing::{debug, info};

use crate::compat::{CompatMatrix, ReachMatrix};
use crate::config::{SearchConfig, Symmetry, MAX_PERIOD};
use crate::error::{ConfigError, SearchError};
use crate::extend::Extender;
use crate::queue::{StateId, StateQueue};
use crate::render::{render_row, render_stator_rows, Pattern};
use crate::rowset::RowSet;
use crate::tables::{ext_idx, ExtTables, TermTables};
use crate::term::{aperiodic, Closure, TerminalKind, Terminator, MAX_TERM_COL};

/// How a completed search ended.
#[derive(Debug)]
pub enum Outcome {
    /// A non-trivial oscillator of the requested period.
    Found(Pattern),
    /// The queue drained without a match.
    Exhausted,
}

/// One oscillator search over one [`SearchConfig`].
pub struct Search {
    cfg: SearchConfig,
    // Live widths: rotor shrinking narrows these during the search.
    rotor_width: usize,
    left_stator_width: usize,
    right_stator_width: usize,
    ext_tables: ExtTables,
    term_tables: TermTables,
    queue: StateQueue,
    rowset: RowSet,
    compat: CompatMatrix,
    reach: ReachMatrix,
    extender: Extender,
    terminator: Terminator,
    row_indices: [i32; MAX_PERIOD],
    last_rows: [usize; MAX_PERIOD],
    last_depth: usize,
    found: Option<Pattern>,
}

impl Search {
    /// Validate `cfg`, build the rule tables and seed the queue.
    ///
    /// # Errors
    /// Any violated configuration constraint.
    pub fn new(cfg: SearchConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let ext_tables = ExtTables::new(cfg.rule);
        let term_tables = TermTables::new(cfg.rule, cfg.zero_lot_line);
        let mut queue = StateQueue::new(cfg.period, cfg.queue_slots, cfg.hash_seed, cfg.hashing);
        for rows in &cfg.initial_rows {
            queue
                .push_initial(rows)
                .map_err(|_| ConfigError::QueueTooSmall)?;
        }
        Ok(Self {
            rotor_width: cfg.rotor_width,
            left_stator_width: cfg.left_stator_width,
            right_stator_width: cfg.right_stator_width,
            cfg,
            ext_tables,
            term_tables,
            queue,
            rowset: RowSet::default(),
            compat: CompatMatrix::default(),
            reach: ReachMatrix::default(),
            extender: Extender::default(),
            terminator: Terminator::default(),
            row_indices: [-1; MAX_PERIOD],
            last_rows: [0; MAX_PERIOD],
            last_depth: 0,
            found: None,
        })
    }

    /// The configuration this search was built from.
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.cfg
    }

    #[inline]
    fn total_width(&self) -> usize {
        self.rotor_width + self.left_stator_width + self.right_stator_width
    }

    #[inline]
    fn statmask(&self) -> Row {
        let shift = self.rotor_width + self.left_stator_width;
        ((((1u64 << self.right_stator_width) - 1) << shift)
            | ((1u64 << self.left_stator_width) - 1)) as Row
    }

    /// Run to completion.
    ///
    /// # Errors
    /// Capacity exhaustion or a queue invariant violation; the deepest
    /// explored line stays available through [`Search::deepest_line`].
    pub fn run(&mut self) -> Result<Outcome, SearchError> {
        info!(
            rule = %self.cfg.rule,
            period = self.cfg.period,
            width = self.total_width(),
            "searching"
        );
        while self.queue.first_unprocessed != self.queue.first_free {
            if self.queue.first_free as usize >= self.cfg.queue_slots / 2 {
                self.compact()?;
                if let Some(p) = self.found.take() {
                    return Ok(Outcome::Found(p));
                }
            }
            let s = self.queue.first_unprocessed;
            self.queue.first_unprocessed += 1;
            self.process(s)?;
            if let Some(p) = self.found.take() {
                return Ok(Outcome::Found(p));
            }
        }
        Ok(Outcome::Exhausted)
    }

    /// Phase-0 rows of the most recently expanded chain, deepest first.
    /// `None` before anything was expanded.
    #[must_use]
    pub fn deepest_line(&self) -> Option<Vec<Row>> {
        if self.queue.first_unprocessed == 0 {
            return None;
        }
        Some(self.queue.chain_rows(self.queue.first_unprocessed - 1, 0))
    }

    /// [`Search::deepest_line`], rendered like pattern rows.
    #[must_use]
    pub fn deepest_lines_rendered(&self) -> Option<Vec<String>> {
        self.deepest_line().map(|rows| {
            rows.into_iter()
                .map(|r| {
                    render_row(
                        r,
                        self.cfg.symmetry,
                        self.total_width(),
                        self.term_tables.addl_cols,
                    )
                })
                .collect()
        })
    }

    /* ----------------------------- expansion ----------------------------- */

    /// Expand one state: emit it if it finishes the search, otherwise queue
    /// every compatible child.
    fn process(&mut self, s: StateId) -> Result<(), SearchError> {
        let kind = self.terminal(s);
        if kind != TerminalKind::NotTerminal && self.nontrivial(s) {
            if let Some(p) = self.success(s, kind) {
                self.found = Some(p);
                return Ok(());
            }
            // The closure DP came up empty: not actually finishable here.
        }

        let period = self.cfg.period;
        let spark_mask = self.spark_mask(s);
        let w = self.total_width();
        let ps = self.queue.parent(s).unwrap_or(s);
        for phase in 0..period {
            self.rowset.begin_phase(phase);
            let a = self.queue.row(s, phase);
            let b = self.queue.row(ps, phase);
            let c = self.queue.row(s, (phase + 1) % period);
            self.extender
                .setup(&self.ext_tables, self.cfg.symmetry, w, a, b, c, spark_mask);
            self.extender
                .list_rows(&self.ext_tables, w, &mut self.rowset, phase)?;
            if self.rowset.n(phase) == 0 {
                return Ok(());
            }
        }

        let statmask = self.statmask();
        if statmask == 0 {
            return self.process_group(s);
        }

        for phase in 0..period {
            self.rowset.sort_phase(phase, statmask);
            self.last_rows[phase] = self.rowset.first(phase) + self.rowset.n(phase);
            self.rowset.set_n(phase, 0);
        }
        while self.rowset.first(0) + self.rowset.n(0) < self.last_rows[0] {
            self.find_stator_group(s)?;
        }
        Ok(())
    }

    /// Which context bits to relax so designated spark rows may be present
    /// or absent. Only states near the seeded rows qualify.
    fn spark_mask(&self, s: StateId) -> u32 {
        if self.cfg.spark_level == 0 {
            return !0;
        }
        let ps = self.queue.parent(s).unwrap_or(s);
        let p = self.queue.parent(ps).unwrap_or(ps);
        let level = match self.queue.parent(p) {
            None => 0,
            Some(pp) => {
                if self.queue.parent(pp).is_some() {
                    2
                } else {
                    1
                }
            }
        };
        let want = usize::from(self.cfg.spark_level);
        if want <= level {
            !0
        } else if want > level + 1 {
            // Both spark rows in play: the extension must also work with the
            // whole context empty.
            !(ext_idx(0, !0, !0, !0) as u32)
        } else {
            // Only the row two above is a spark.
            !(ext_idx(0, 0, !0, 0) as u32)
        }
    }

    /// Delimit the next same-stator sub-range across all phases and process
    /// it. Ends the enclosing walk by exhausting phase 0 when any phase
    /// runs dry.
    fn find_stator_group(&mut self, s: StateId) -> Result<(), SearchError> {
        let statmask = self.statmask();
        let period = self.cfg.period;
        let mut stator: Row = 0;
        for phase in 0..period {
            let mut f = self.rowset.first(phase) + self.rowset.n(phase);
            self.rowset.set_first(phase, f);
            self.rowset.set_n(phase, 0);
            if phase == 0 {
                stator = self.rowset.raw_row(f) & statmask;
            } else {
                loop {
                    if f >= self.last_rows[phase] {
                        // No rows left in this phase at all: nothing later
                        // can complete either, stop the group walk.
                        self.rowset.set_first(0, self.last_rows[0]);
                        self.rowset.set_n(0, 0);
                        return Ok(());
                    }
                    if stator <= self.rowset.raw_row(f) & statmask {
                        break;
                    }
                    f += 1;
                }
                self.rowset.set_first(phase, f);
                if stator != self.rowset.raw_row(f) & statmask {
                    // This stator has no rows in `phase`; try the next one.
                    return Ok(());
                }
            }
            let mut n = 0;
            while self.rowset.first(phase) + n < self.last_rows[phase]
                && stator == self.rowset.raw_row(self.rowset.first(phase) + n) & statmask
            {
                n += 1;
            }
            self.rowset.set_n(phase, n);
        }
        self.process_group(s)
    }

    /// Enumerate every cycle of pairwise-compatible rows (one per phase)
    /// within the current sub-ranges and queue each as a child of `s`.
    fn process_group(&mut self, s: StateId) -> Result<(), SearchError> {
        let period = self.cfg.period;

        for phase in 0..period {
            let prev = if phase == 0 { period - 1 } else { phase - 1 };
            self.row_indices[phase] = -1;
            self.compat
                .begin_phase(phase, self.rowset.n(prev), self.rowset.n(phase))?;
            for i in 0..self.rowset.n(prev) {
                for j in 0..self.rowset.n(phase) {
                    self.test_compatible(phase, i, j, s);
                }
            }
        }
        let mut n_rows = [0usize; MAX_PERIOD];
        for phase in 0..period {
            n_rows[phase] = self.rowset.n(phase);
        }
        self.reach.build(&self.compat, &n_rows[..period], period)?;

        // Odometer over phases with immediate rollback on any failed check.
        let mut phase: i32 = -1;
        loop {
            phase += 1;
            while self.row_indices[phase as usize] == n_rows[phase as usize] as i32 - 1 {
                self.row_indices[phase as usize] = -1;
                phase -= 1;
                if phase < 0 {
                    return Ok(());
                }
            }
            self.row_indices[phase as usize] += 1;
            let p = phase as usize;
            let idx = self.row_indices[p] as usize;
            let idx0 = self.row_indices[0] as usize;
            if !self.reach.get(p, idx, idx0) {
                phase -= 1;
            } else if p > 0 && !self.compat.get(p, self.row_indices[p - 1] as usize, idx) {
                phase -= 1;
            } else if p == period - 1 {
                if self.compat.get(0, idx, idx0) {
                    self.make_new_state(s)?;
                }
                phase -= 1;
            }
        }
    }

    /// One compatibility bit: same stator columns, and some row below the
    /// previous-phase candidate lets it evolve into the own-phase candidate.
    fn test_compatible(&mut self, phase: usize, i: usize, j: usize, s: StateId) {
        let period = self.cfg.period;
        let prev = if phase == 0 { period - 1 } else { phase - 1 };
        let prev_row = self.rowset.row(prev, i);
        let row = self.rowset.row(phase, j);
        let statmask = self.statmask();
        if prev_row & statmask != row & statmask {
            return;
        }
        let w = self.total_width();
        let above = self.queue.row(s, prev);
        self.extender
            .setup(&self.ext_tables, self.cfg.symmetry, w, prev_row, above, row, !0);
        if self.extender.feasible(w) {
            self.compat.set(phase, i, j);
        }
    }

    /// Turn the current odometer selection into a child state.
    fn make_new_state(&mut self, parent: StateId) -> Result<(), SearchError> {
        let period = self.cfg.period;
        let mut rows = [0 as Row; MAX_PERIOD];
        for phase in 0..period {
            rows[phase] = self.rowset.row(phase, self.row_indices[phase] as usize);
        }
        self.queue.try_push(parent, &rows[..period])?;
        Ok(())
    }

    /* ---------------------------- termination ---------------------------- */

    /// Can the pattern be closed off at `s`?
    fn terminal(&self, s: StateId) -> TerminalKind {
        let period = self.cfg.period;
        let Some(ps) = self.queue.parent(s) else {
            return TerminalKind::NotTerminal;
        };

        if self.cfg.allow_row_sym {
            let pps = self.queue.parent(ps).unwrap_or(ps);
            let matches = |other: StateId, off: usize| {
                (0..period)
                    .all(|ph| self.queue.row(s, ph) == self.queue.row(other, (ph + off) % period))
            };
            if matches(ps, 0) {
                return TerminalKind::RowSym {
                    symmetry: Symmetry::Even,
                    phase_offset: 0,
                };
            }
            if matches(pps, 0) {
                return TerminalKind::RowSym {
                    symmetry: Symmetry::Odd,
                    phase_offset: 0,
                };
            }
            if period % 2 == 0 {
                let off = period / 2;
                if matches(ps, off) {
                    return TerminalKind::RowSym {
                        symmetry: Symmetry::Even,
                        phase_offset: off,
                    };
                }
                if matches(pps, off) {
                    return TerminalKind::RowSym {
                        symmetry: Symmetry::Odd,
                        phase_offset: off,
                    };
                }
            }
        }

        // Column-by-column possible-block propagation; the stator itself is
        // found later by the DP.
        let t = &self.term_tables;
        let w = self.total_width();
        let mut term = t.initial;
        for i in (0..w).rev() {
            if term == 0 {
                return TerminalKind::NotTerminal;
            }
            let mut nt = u16::MAX;
            for ph in 0..period {
                let r = self.queue.row(s, ph);
                let pr = self.queue.row(ps, ph);
                let sr = self.queue.row(s, (ph + 1) % period);
                nt &= t.next_term(term, r, pr, sr, i);
            }
            term = nt;
        }

        // Fold in the left boundary and ask whether the surviving states
        // admit a mirror-consistent closure on the far side.
        let odd_ext = |r: Row| (r << 1) | ((r & 2) >> 1);
        let ev_ext = |r: Row| (r << 1) | (r & 1);
        let mut nt = u16::MAX;
        let closable = match self.cfg.symmetry {
            Symmetry::Odd => {
                for ph in 0..period {
                    let r = self.queue.row(s, ph);
                    let pr = self.queue.row(ps, ph);
                    let sr = self.queue.row(s, (ph + 1) % period);
                    nt &= t.next_term(term, odd_ext(r), odd_ext(pr), sr << 1, 0);
                }
                t.rev_term(nt) & term != 0
            }
            Symmetry::Even => {
                for ph in 0..period {
                    let r = self.queue.row(s, ph);
                    let pr = self.queue.row(ps, ph);
                    let sr = self.queue.row(s, (ph + 1) % period);
                    nt &= t.next_term(term, ev_ext(r), ev_ext(pr), sr << 1, 0);
                }
                t.rev_term(nt) & nt != 0
            }
            Symmetry::None => {
                for ph in 0..period {
                    let r = self.queue.row(s, ph);
                    let pr = self.queue.row(ps, ph);
                    let sr = self.queue.row(s, (ph + 1) % period);
                    nt &= t.next_term(term, r << 1, pr << 1, sr << 1, 0);
                }
                term = nt;
                nt = u16::MAX;
                for ph in 0..period {
                    let r = self.queue.row(s, ph);
                    let pr = self.queue.row(ps, ph);
                    let sr = self.queue.row(s, (ph + 1) % period);
                    nt &= t.next_term(term, r << 2, pr << 2, sr << 2, 0);
                }
                t.rev_term(nt) & t.initial != 0
            }
        };
        if closable {
            TerminalKind::StatorClosable
        } else {
            TerminalKind::NotTerminal
        }
    }

    /// Does some state along the chain genuinely use the whole period?
    fn nontrivial(&self, s: StateId) -> bool {
        let period = self.cfg.period;
        let mut rows = [0 as Row; MAX_PERIOD];
        let mut cur = s;
        while let Some(p) = self.queue.parent(cur) {
            for ph in 0..period {
                rows[ph] = self.queue.row(cur, ph);
            }
            if aperiodic(&rows[..period]) {
                return true;
            }
            cur = p;
        }
        false
    }

    /// Is the 5-cell column triple `(i, j, k)` at `col` consistent with the
    /// actual pattern rows in every phase?
    fn stabilizes(&self, i: usize, j: usize, k: usize, s: StateId, ps: StateId, col: i32) -> bool {
        let t = &self.term_tables;
        let period = self.cfg.period;
        let ijk = ((i & 3) << 11) | ((j & 3) << 9) | ((k & 3) << 7);
        for ph in 0..period {
            let mut r = self.queue.row(s, ph);
            let mut pr = self.queue.row(ps, ph);
            let mut sr = self.queue.row(s, (ph + 1) % period);
            if col >= 0 {
                let sh = col as u32;
                r = (u64::from(r) >> sh) as Row;
                pr = (u64::from(pr) >> sh) as Row;
                sr = (u64::from(sr) >> sh) as Row;
            } else {
                match self.cfg.symmetry {
                    Symmetry::Odd => {
                        r = (r << 1) | ((r >> 1) & 1);
                        pr = (pr << 1) | ((pr >> 1) & 1);
                        sr = (sr << 1) | ((sr >> 1) & 1);
                    }
                    Symmetry::Even => {
                        r = (r << 1) | (r & 1);
                        pr = (pr << 1) | (pr & 1);
                        sr = (sr << 1) | (sr & 1);
                    }
                    Symmetry::None => {
                        let sh = (-col) as u32;
                        r <<= sh;
                        pr <<= sh;
                        sr <<= sh;
                    }
                }
            }
            let idx = ijk
                | (((r & 7) as usize) << 4)
                | (((pr & 7) as usize) << 1)
                | (((sr >> 1) & 1) as usize);
            if !t.stab(idx) {
                return false;
            }
        }
        true
    }

    /// Find the cheapest all-stator closure via the column DP.
    fn terminate(&mut self, s: StateId) -> Option<Closure> {
        let ps = self.queue.parent(s)?;
        let w = self.total_width() as i32;
        let top = (w + self.term_tables.addl_cols as i32).min(MAX_TERM_COL);
        let last_col = if self.cfg.symmetry == Symmetry::None {
            -2
        } else {
            -1
        };

        self.terminator.clear_col(top);
        self.terminator.set_best(top, 0, 0, 0);
        self.terminator.set_pred(top, 0, 0, 0);

        let mut col = top;
        while col > last_col {
            col -= 1;
            self.terminator.clear_col(col);
            let mut found_any = false;
            for i in 0..32 {
                for j in 0..32 {
                    let b = self.terminator.best(col + 1, i, j);
                    if b < 0 {
                        continue;
                    }
                    for k in 0..32 {
                        let cand = b + self.term_tables.col_pop[k];
                        let cur = self.terminator.best(col, j, k);
                        if self.term_tables.tcompatible(i, j, k)
                            && (cur < 0 || cand < cur)
                            && self.stabilizes(i, j, k, s, ps, col)
                        {
                            self.terminator.set_best(col, j, k, cand);
                            self.terminator.set_pred(col, j, k, i as u8);
                            found_any = true;
                        }
                    }
                }
            }
            if !found_any {
                return None;
            }
        }

        let (back_col, fwd_col) = match self.cfg.symmetry {
            Symmetry::Even => (-1, -1),
            Symmetry::Odd => (-1, 0),
            Symmetry::None => (w, -2),
        };
        self.terminate_cols(back_col, fwd_col)
    }

    /// Pair the two boundary walks and keep the cheapest meeting point.
    fn terminate_cols(&self, back_col: i32, fwd_col: i32) -> Option<Closure> {
        let mut best = i32::MAX;
        let mut closure = None;
        for i in 0..32usize {
            for j in 0..32usize {
                let a = self.terminator.best(back_col, i, j);
                let b = self.terminator.best(fwd_col, j, i);
                if a < 0 || b < 0 {
                    continue;
                }
                let tot = i32::from(a) + i32::from(b)
                    - i32::from(self.term_tables.col_pop[i])
                    - i32::from(self.term_tables.col_pop[j]);
                if tot < best {
                    best = tot;
                    closure = Some(Closure {
                        back: i as u8,
                        fwd: j as u8,
                    });
                }
            }
        }
        closure
    }

    /// Assemble the output for a terminal state. `None` when the stator DP
    /// cannot actually close it, in which case the search goes on.
    fn success(&mut self, s: StateId, kind: TerminalKind) -> Option<Pattern> {
        let (row_sym, offset) = match kind {
            TerminalKind::RowSym {
                symmetry,
                phase_offset,
            } => (Some(symmetry), phase_offset),
            TerminalKind::StatorClosable => (None, 0),
            TerminalKind::NotTerminal => return None,
        };
        let closure = if row_sym.is_none() {
            Some(self.terminate(s)?)
        } else {
            None
        };

        let mut body0 = Vec::new();
        let mut body_off = Vec::new();
        let mut cur = s;
        while let Some(p) = self.queue.parent(cur) {
            body0.push(self.queue.row(cur, 0));
            body_off.push(self.queue.row(cur, offset));
            cur = p;
        }

        let sym = self.cfg.symmetry;
        let w = self.total_width();
        let addl = self.term_tables.addl_cols;
        let mut lines = vec![String::new()];
        for i in (0..body0.len()).rev() {
            lines.push(render_row(body0[i], sym, w, addl));
        }
        match row_sym {
            Some(Symmetry::Even) => {
                for i in 2..body_off.len() {
                    lines.push(render_row(body_off[i], sym, w, addl));
                }
            }
            Some(Symmetry::Odd) => {
                for i in 3..body_off.len() {
                    lines.push(render_row(body_off[i], sym, w, addl));
                }
            }
            _ => {
                if let Some(c) = closure {
                    let top = (w as i32 + addl as i32).min(MAX_TERM_COL);
                    lines.extend(render_stator_rows(&self.terminator, c, sym, w, top));
                }
            }
        }
        Some(Pattern { lines })
    }

    /* ----------------------- deepening & compaction ----------------------- */

    /// Does `s` have any surviving line `levels` deep? Children created on
    /// the way are rolled back.
    fn depth_first(&mut self, s: StateId, levels: usize) -> Result<bool, SearchError> {
        if levels == 0 {
            return Ok(true);
        }
        let f = self.queue.first_free;
        self.process(s)?;
        if self.found.is_some() {
            self.queue.first_free = f;
            return Ok(true);
        }
        while f < self.queue.first_free {
            let child = self.queue.first_free - 1;
            if self.depth_first(child, levels - 1)? {
                self.queue.first_free = f;
                return Ok(true);
            }
            self.queue.first_free = child;
        }
        Ok(false)
    }

    /// Certify every frontier state to `levels`; condemn the ones that die
    /// out. Returns how many were condemned.
    fn deepen(&mut self, levels: usize) -> Result<usize, SearchError> {
        let mut marked = 0;
        let mut s = self.queue.first_unprocessed;
        while s < self.queue.first_free {
            if !self.depth_first(s, levels)? {
                self.queue.mark_unused(s);
                marked += 1;
            }
            if self.found.is_some() {
                break;
            }
            s += 1;
        }
        Ok(marked)
    }

    fn compact(&mut self) -> Result<(), SearchError> {
        let frontier_depth = self.queue.depth(self.queue.first_unprocessed);
        if frontier_depth > self.last_depth {
            self.last_depth = frontier_depth;
        }
        self.last_depth += 1;

        if self.cfg.max_deepen > 0
            && self.rotor_width > 0
            && self.last_depth - frontier_depth > self.cfg.max_deepen
        {
            self.rotor_width -= 1;
            self.right_stator_width += 1;
            if self.left_stator_width > 0 && self.rotor_width > 0 {
                self.left_stator_width += 1;
                self.rotor_width -= 1;
            }
            info!(
                rotor = self.rotor_width,
                left = self.left_stator_width,
                right = self.right_stator_width,
                "deepening limit hit, shrinking rotor"
            );
            self.last_depth = frontier_depth + 1;
        }

        let levels = self.last_depth - frontier_depth;
        info!(
            depth = frontier_depth,
            deepening = levels,
            unprocessed = %approx(self.queue.first_free - self.queue.first_unprocessed),
            total = %approx(self.queue.first_free),
            "queue full, deepening"
        );

        self.queue.set_hashing(false);
        let marked = self.deepen(levels)?;
        self.queue.set_hashing(self.cfg.hashing);
        if self.found.is_some() {
            return Ok(());
        }

        self.queue.compact(marked)?;
        info!(
            unprocessed = %approx(self.queue.first_free - self.queue.first_unprocessed),
            total = %approx(self.queue.first_free),
            "compacted"
        );
        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Some(rows) = self.deepest_lines_rendered() {
                for row in rows {
                    debug!(%row, "current line");
                }
            }
        }
        Ok(())
    }
}

/// Humanize a state count the way the original's status line did.
fn approx(n: u32) -> String {
    let n = u64::from(n);
    if n <= 9999 {
        return n.to_string();
    }
    let (n, unit) = if n > 999_999 { (n / 1000, 'M') } else { (n, 'k') };
    if n > 99_999 {
        format!("{}{unit}", n / 1000)
    } else {
        format!("{}.{}{unit}", n / 1000, (n % 1000) / 100)
    }
}
