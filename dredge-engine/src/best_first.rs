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

//! Best-first permutation search
//!
//! Builds orderings prefix by prefix. The frontier is a max-heap of scored
//! prefixes; each visit either finishes (full-length prefix) or expands by
//! appending every filter the partial order still allows. A permutation
//! always carries the unplaced filters in its tail, so expansion is a swap
//! plus a prefix-length bump.
//!
//! ```text
//! Init ──▶ Visit ──▶ Expand ─┐
//!            │  ▲────────────┘
//!            ▼
//!          Done (drain, reset to Init)
//! ```
//!
//! When `evaluate` reports a filter without enough samples, the current
//! prefix is completed into a valid total order and handed to the driver
//! to execute; the same transition re-runs once data arrives.

use dredge_core::{PartialOrder, Permutation};

use crate::heap::ScoreHeap;
use crate::optimizer::StepOutcome;
use crate::stats::{Evaluation, StatsTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BfState {
    Init,
    Visit,
    Expand,
    Done,
}

/// Resumable best-first search state.
pub struct BestFirst {
    n: usize,
    state: BfState,
    /// Init scan position over candidate minimal elements.
    i: usize,
    /// Expand scan position over filters to append.
    j: usize,
    pq: ScoreHeap,
    best: Permutation,
    next: Permutation,
}

impl BestFirst {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            state: BfState::Init,
            i: 0,
            j: 0,
            // Only prefixes are ever in flight, n per expansion round.
            pq: ScoreHeap::with_capacity(n * n),
            best: Permutation::identity(n),
            next: Permutation::identity(n),
        }
    }

    /// Run one state transition.
    pub fn step(&mut self, po: &PartialOrder, stats: &StatsTracker) -> StepOutcome {
        let n = self.n;
        match self.state {
            BfState::Init => {
                while self.i < n {
                    if po.is_min(self.i) {
                        let mut perm = Permutation::identity(n);
                        perm.swap(0, self.i);
                        perm.set_len(1);
                        match stats.evaluate(&perm, 1) {
                            Evaluation::Score(score) => self.pq.push(score, perm),
                            Evaluation::NeedsData(_) => {
                                self.next.copy_with_tail(&perm);
                                self.next.complete_topological(po);
                                return StepOutcome::NeedsData;
                            }
                        }
                    }
                    self.i += 1;
                }
                self.state = BfState::Visit;
                StepOutcome::Continue
            }

            BfState::Visit => {
                let top = match self.pq.pop() {
                    Some(perm) => perm,
                    None => {
                        // Frontier exhausted; the last full-length visit
                        // already landed in `best`.
                        self.state = BfState::Done;
                        return StepOutcome::Complete;
                    }
                };
                self.best.copy_with_tail(&top);
                tracing::debug!(perm = %self.best, "best-first visiting");
                if self.best.len() == n {
                    self.state = BfState::Done;
                    return StepOutcome::Complete;
                }
                self.j = self.best.len();
                self.state = BfState::Expand;
                StepOutcome::Continue
            }

            BfState::Expand => {
                while self.j < n {
                    let pos = self.best.len();
                    self.next.copy_with_tail(&self.best);
                    self.next.swap(pos, self.j);
                    self.next.set_len(pos + 1);
                    if self.next.is_valid_prefix(po) {
                        match stats.evaluate(&self.next, pos + 1) {
                            Evaluation::Score(score) => {
                                self.pq.push(score, self.next.clone());
                            }
                            Evaluation::NeedsData(_) => {
                                self.next.complete_topological(po);
                                return StepOutcome::NeedsData;
                            }
                        }
                    }
                    self.j += 1;
                }
                self.state = BfState::Visit;
                StepOutcome::Continue
            }

            BfState::Done => {
                // Drain the frontier; entries own their permutations, so
                // clearing frees everything.
                self.pq.clear();
                self.state = BfState::Init;
                self.i = 0;
                StepOutcome::Continue
            }
        }
    }

    /// Best full-length order found; meaningful after `Complete`.
    pub fn result(&self) -> &Permutation {
        &self.best
    }

    /// Order to run while data is missing; always a valid total order.
    pub fn candidate(&self) -> &Permutation {
        &self.next
    }

    /// Restart construction from scratch; the seed only sizes the search.
    pub fn reseed(&mut self, seed: &Permutation) {
        self.n = seed.len();
        self.state = BfState::Init;
        self.i = 0;
        self.j = 0;
        self.pq.clear();
    }
}
