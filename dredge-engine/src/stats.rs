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

//! Online filter statistics
//!
//! Per-filter running counts of observations, passes and execution ticks,
//! updated lock-free by every worker. The optimizers read back two derived
//! quantities:
//!
//! - **selectivity**: Laplace-smoothed pass rate `(passed+1)/(seen+2)`,
//!   0.5 for a filter never observed
//! - **cost**: mean ticks per actual execution, `DEFAULT_COST` for a
//!   filter never executed
//!
//! and one aggregate, the expected cost of a permutation prefix:
//!
//! ```text
//! E[cost] = Σ cost(π[i]) · Π_{j<i} selectivity(π[j])
//! ```
//!
//! `evaluate` returns the *negated* expected cost so both optimizers
//! maximize. When a prefix touches a filter with fewer than `min_samples`
//! observations, `evaluate` instead reports which filter needs data; the
//! driver runs the optimizer's candidate order to collect those samples.
//!
//! Counter reads are eventually consistent across threads, which is fine:
//! optimization is best-effort.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use dredge_core::Permutation;

/// Cost floor in ticks. Keeps selectivity differences visible for filters
/// too fast for the tick clock.
const MIN_COST: f64 = 1.0;

/// Outcome of scoring a permutation prefix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    /// Negated expected cost; higher is better.
    Score(f64),
    /// The first filter in the prefix with too few samples.
    NeedsData(usize),
}

#[derive(Default)]
struct FilterCounters {
    seen: AtomicU64,
    passed: AtomicU64,
    execs: AtomicU64,
    exec_ticks: AtomicU64,
    startup_ticks: AtomicU64,
}

/// Point-in-time statistics for one filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterStatsSnapshot {
    pub name: String,
    pub objects_seen: u64,
    pub objects_passed: u64,
    pub executions: u64,
    pub exec_ticks: u64,
    pub startup_ticks: u64,
    pub selectivity: f64,
    pub mean_cost: f64,
}

/// Running statistics for every filter in one search.
pub struct StatsTracker {
    filters: Vec<FilterCounters>,
    min_samples: u64,
    default_cost: f64,
}

impl StatsTracker {
    pub fn new(n: usize, min_samples: u64, default_cost: f64) -> Self {
        Self {
            filters: (0..n).map(|_| FilterCounters::default()).collect(),
            min_samples,
            default_cost,
        }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Record one execution of `filter_id`. Returns true when this
    /// observation is the one that crosses the `min_samples` threshold,
    /// so the driver can nudge the optimizer early.
    pub fn record(&self, filter_id: usize, passed: bool, ticks: u64) -> bool {
        let c = &self.filters[filter_id];
        let seen = c.seen.fetch_add(1, Ordering::Relaxed) + 1;
        if passed {
            c.passed.fetch_add(1, Ordering::Relaxed);
        }
        c.execs.fetch_add(1, Ordering::Relaxed);
        c.exec_ticks.fetch_add(ticks, Ordering::Relaxed);
        seen == self.min_samples
    }

    /// Record a cache hit: the pass/drop outcome is an observation, but
    /// no execution time was spent.
    pub fn record_cached(&self, filter_id: usize, passed: bool) -> bool {
        let c = &self.filters[filter_id];
        let seen = c.seen.fetch_add(1, Ordering::Relaxed) + 1;
        if passed {
            c.passed.fetch_add(1, Ordering::Relaxed);
        }
        seen == self.min_samples
    }

    /// Record how long a filter's init entry point took.
    pub fn record_startup(&self, filter_id: usize, ticks: u64) {
        self.filters[filter_id]
            .startup_ticks
            .store(ticks, Ordering::Relaxed);
    }

    pub fn seen(&self, filter_id: usize) -> u64 {
        self.filters[filter_id].seen.load(Ordering::Relaxed)
    }

    /// Laplace-smoothed pass rate, always in (0, 1).
    pub fn selectivity(&self, filter_id: usize) -> f64 {
        let c = &self.filters[filter_id];
        let seen = c.seen.load(Ordering::Relaxed);
        let passed = c.passed.load(Ordering::Relaxed);
        (passed as f64 + 1.0) / (seen as f64 + 2.0)
    }

    /// Mean ticks per execution, `default_cost` when never executed.
    pub fn cost(&self, filter_id: usize) -> f64 {
        let c = &self.filters[filter_id];
        let execs = c.execs.load(Ordering::Relaxed);
        if execs == 0 {
            return self.default_cost;
        }
        let ticks = c.exec_ticks.load(Ordering::Relaxed);
        (ticks as f64 / execs as f64).max(MIN_COST)
    }

    /// Score the first `prefix` positions of `perm`.
    pub fn evaluate(&self, perm: &Permutation, prefix: usize) -> Evaluation {
        let mut expected = 0.0;
        let mut reach = 1.0;
        for i in 0..prefix {
            let filter_id = perm.elt(i);
            if self.seen(filter_id) < self.min_samples {
                return Evaluation::NeedsData(filter_id);
            }
            expected += self.cost(filter_id) * reach;
            reach *= self.selectivity(filter_id);
        }
        Evaluation::Score(-expected)
    }

    /// Snapshot for `Search::stats`; `names` supplies filter names by index.
    pub fn snapshot<'a>(
        &self,
        mut names: impl Iterator<Item = &'a str>,
    ) -> Vec<FilterStatsSnapshot> {
        self.filters
            .iter()
            .enumerate()
            .map(|(id, c)| FilterStatsSnapshot {
                name: names.next().unwrap_or("").to_string(),
                objects_seen: c.seen.load(Ordering::Relaxed),
                objects_passed: c.passed.load(Ordering::Relaxed),
                executions: c.execs.load(Ordering::Relaxed),
                exec_ticks: c.exec_ticks.load(Ordering::Relaxed),
                startup_ticks: c.startup_ticks.load(Ordering::Relaxed),
                selectivity: self.selectivity(id),
                mean_cost: self.cost(id),
            })
            .collect()
    }

    /// Forget everything. Statistics never survive a search.
    pub fn reset(&self) {
        for c in &self.filters {
            c.seen.store(0, Ordering::Relaxed);
            c.passed.store(0, Ordering::Relaxed);
            c.execs.store(0, Ordering::Relaxed);
            c.exec_ticks.store(0, Ordering::Relaxed);
            c.startup_ticks.store(0, Ordering::Relaxed);
        }
    }
}
