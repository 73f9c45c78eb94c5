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

//! Optimizer façade
//!
//! One interface over both permutation search strategies so the driver
//! does not care which one is configured.

use dredge_core::{OptimizerKind, PartialOrder, Permutation};

use crate::best_first::BestFirst;
use crate::hill_climb::HillClimb;
use crate::stats::StatsTracker;

/// Result of one optimizer step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// More steps remain.
    Continue,
    /// `result()` holds the final order for this round.
    Complete,
    /// Statistics are missing; run `candidate()` on upcoming objects and
    /// step again later.
    NeedsData,
}

/// Either search strategy behind one interface.
pub enum PermutationOptimizer {
    HillClimb(HillClimb),
    BestFirst(BestFirst),
}

impl PermutationOptimizer {
    /// `seed` must be a topologically valid total order.
    pub fn new(kind: OptimizerKind, seed: &Permutation) -> Self {
        match kind {
            OptimizerKind::HillClimb => Self::HillClimb(HillClimb::new(seed)),
            OptimizerKind::BestFirst => Self::BestFirst(BestFirst::new(seed.len())),
        }
    }

    pub fn step(&mut self, po: &PartialOrder, stats: &StatsTracker) -> StepOutcome {
        match self {
            Self::HillClimb(hc) => hc.step(po, stats),
            Self::BestFirst(bf) => bf.step(po, stats),
        }
    }

    /// Final order after `Complete`; always a valid total order.
    pub fn result(&self) -> &Permutation {
        match self {
            Self::HillClimb(hc) => hc.result(),
            Self::BestFirst(bf) => bf.result(),
        }
    }

    /// Order to execute while suspended on missing data.
    pub fn candidate(&self) -> &Permutation {
        match self {
            Self::HillClimb(hc) => hc.candidate(),
            Self::BestFirst(bf) => bf.candidate(),
        }
    }

    /// Restart the search from the driver's current order.
    pub fn reseed(&mut self, seed: &Permutation) {
        match self {
            Self::HillClimb(hc) => hc.reseed(seed),
            Self::BestFirst(bf) => bf.reseed(seed),
        }
    }
}
