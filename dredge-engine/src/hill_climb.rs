// SPDX-License-Identifier: AGPL-3.0-or-later
// Dredge - Adaptive Filter Search Platform
// Copyright (C) 2026 Sushanth Reddy Vanagala (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Hill-climbing permutation search
//!
//! Local search seeded with the driver's current order. Each step sweeps
//! the swap positions (i, j), i < j; a swap is legal only when the two
//! filters are incomparable *and* everything between them is incomparable
//! with both, so the transposition stands in for a legal reordering of the
//! whole block. Improving swaps are adopted immediately; a full sweep with
//! no improvement means a local optimum.
//!
//! Every accepted swap strictly increases the score, so the search cannot
//! revisit an ordering and terminates.

use dredge_core::{PartialOrder, Permutation};

use crate::optimizer::StepOutcome;
use crate::stats::{Evaluation, StatsTracker};

/// Resumable hill-climbing state.
pub struct HillClimb {
    best: Permutation,
    next: Permutation,
    n: usize,
    i: usize,
    j: usize,
    improved: bool,
}

/// A block swap of (i, j) is legal iff the endpoints are mutually
/// incomparable and nothing between them is ordered against either end.
fn check_valid_swap(po: &PartialOrder, perm: &Permutation, u: usize, v: usize) -> bool {
    if po.comparable(perm.elt(u), perm.elt(v)) {
        return false;
    }
    for i in u + 1..v {
        if po.comparable(perm.elt(u), perm.elt(i)) || po.comparable(perm.elt(i), perm.elt(v)) {
            return false;
        }
    }
    true
}

impl HillClimb {
    /// Start from the driver's current order; `seed` must be a valid total
    /// order.
    pub fn new(seed: &Permutation) -> Self {
        let n = seed.len();
        let mut best = Permutation::new(seed.capacity());
        best.copy_with_tail(seed);
        let next = best.clone();
        Self {
            best,
            next,
            n,
            i: 0,
            j: 1,
            improved: false,
        }
    }

    /// Run one sweep, resuming mid-sweep after a `NeedsData` suspension.
    pub fn step(&mut self, po: &PartialOrder, stats: &StatsTracker) -> StepOutcome {
        let n = self.n;
        if n < 2 {
            return StepOutcome::Complete;
        }

        // Score the incumbent first; without data for it there is nothing
        // to compare against, so ask the driver to run it.
        let mut best_score = match stats.evaluate(&self.best, n) {
            Evaluation::Score(s) => s,
            Evaluation::NeedsData(_) => {
                self.next.copy_with_tail(&self.best);
                return StepOutcome::NeedsData;
            }
        };

        self.next.copy_with_tail(&self.best);

        while self.i < n - 1 {
            let (i, j) = (self.i, self.j);
            if check_valid_swap(po, &self.next, i, j) {
                self.next.swap(i, j);
                match stats.evaluate(&self.next, n) {
                    Evaluation::Score(score) => {
                        if score > best_score {
                            tracing::debug!(
                                perm = %self.next,
                                score,
                                "hill climb improved"
                            );
                            self.improved = true;
                            best_score = score;
                            self.best.copy_with_tail(&self.next);
                        }
                        self.next.swap(i, j);
                    }
                    Evaluation::NeedsData(_) => {
                        // Leave the swap applied: the candidate the driver
                        // runs must include the unmeasured filter early.
                        return StepOutcome::NeedsData;
                    }
                }
            }
            self.j += 1;
            if self.j >= n {
                self.i += 1;
                self.j = self.i + 1;
            }
        }

        self.i = 0;
        self.j = 1;
        if self.improved {
            self.improved = false;
            StepOutcome::Continue
        } else {
            StepOutcome::Complete
        }
    }

    /// Best order found so far; always a valid total order.
    pub fn result(&self) -> &Permutation {
        &self.best
    }

    /// Order to run while data is missing.
    pub fn candidate(&self) -> &Permutation {
        &self.next
    }

    /// Restart from a fresh seed, keeping nothing.
    pub fn reseed(&mut self, seed: &Permutation) {
        self.best.copy_with_tail(seed);
        self.next.copy_with_tail(seed);
        self.n = seed.len();
        self.i = 0;
        self.j = 1;
        self.improved = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dredge_core::Relation;

    fn free_order(n: usize) -> PartialOrder {
        PartialOrder::new(n)
    }

    fn warm(stats: &StatsTracker, id: usize, pass_in_10: u32, ticks: u64) {
        for i in 0..10 {
            stats.record(id, i < pass_in_10, ticks);
        }
    }

    #[test]
    fn test_single_filter_is_noop() {
        let po = free_order(1);
        let stats = StatsTracker::new(1, 1, 100.0);
        let mut hc = HillClimb::new(&Permutation::identity(1));
        assert_eq!(hc.step(&po, &stats), StepOutcome::Complete);
        assert_eq!(hc.result().as_slice(), &[0]);
    }

    #[test]
    fn test_selectivity_driven_swap() {
        // Equal costs; filter 1 is far more selective, so it should move
        // to the front.
        let po = free_order(2);
        let stats = StatsTracker::new(2, 1, 100.0);
        warm(&stats, 0, 9, 10);
        warm(&stats, 1, 1, 10);

        let mut hc = HillClimb::new(&Permutation::identity(2));
        loop {
            match hc.step(&po, &stats) {
                StepOutcome::Continue => {}
                StepOutcome::Complete => break,
                StepOutcome::NeedsData => panic!("stats are warm"),
            }
        }
        assert_eq!(hc.result().as_slice(), &[1, 0]);
    }

    #[test]
    fn test_partial_order_blocks_swap() {
        // 0 < 1 and filter 1 is more selective, but the swap is illegal.
        let mut po = PartialOrder::new(2);
        po.set(0, 1, Relation::Lt).unwrap();
        po.closure().unwrap();
        let stats = StatsTracker::new(2, 1, 100.0);
        warm(&stats, 0, 9, 10);
        warm(&stats, 1, 1, 10);

        let mut hc = HillClimb::new(&Permutation::identity(2));
        assert_eq!(hc.step(&po, &stats), StepOutcome::Complete);
        assert_eq!(hc.result().as_slice(), &[0, 1]);
    }

    #[test]
    fn test_needs_data_exposes_candidate() {
        let po = free_order(2);
        let stats = StatsTracker::new(2, 4, 100.0);
        let mut hc = HillClimb::new(&Permutation::identity(2));
        assert_eq!(hc.step(&po, &stats), StepOutcome::NeedsData);
        let cand = hc.candidate();
        assert_eq!(cand.len(), 2);
        assert!(cand.is_valid_prefix(&po));
    }

    #[test]
    fn test_idempotent_when_stats_frozen() {
        let po = free_order(3);
        let stats = StatsTracker::new(3, 1, 100.0);
        warm(&stats, 0, 5, 30);
        warm(&stats, 1, 2, 10);
        warm(&stats, 2, 8, 5);

        let mut hc = HillClimb::new(&Permutation::identity(3));
        while hc.step(&po, &stats) != StepOutcome::Complete {}
        let first = hc.result().clone();

        let mut hc2 = HillClimb::new(&first);
        // Seeded with a local optimum and unchanged stats: one sweep, no
        // improvement, same answer.
        assert_eq!(hc2.step(&po, &stats), StepOutcome::Complete);
        assert_eq!(hc2.result(), &first);
    }

    #[test]
    fn test_block_swap_legality() {
        // 1 is between 0 and 2 in the order and comparable with 2, so the
        // (0, 2) swap must be rejected even though 0 and 2 are free.
        let mut po = PartialOrder::new(3);
        po.set(1, 2, Relation::Lt).unwrap();
        po.closure().unwrap();
        let perm = Permutation::identity(3);
        assert!(!check_valid_swap(&po, &perm, 0, 2));
        assert!(check_valid_swap(&po, &perm, 0, 1));
    }
}
