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

//! Simulated filter runtime
//!
//! Stands in for real filter code during `dredge simulate`: every filter
//! gets a pass rate and a nominal cost, and scoring is a deterministic
//! function of (filter, object), so repeated runs and cache hits behave
//! exactly like a deterministic real runtime.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use dredge_core::{Filter, Result};
use dredge_engine::{CancelToken, EvalOutcome, FilterRuntime, ObjectRecord};

/// Synthetic behavior of one filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FilterProfile {
    /// Fraction of objects scoring above threshold, in [0, 1].
    pub pass_rate: f64,
    /// Simulated execution time per object.
    pub cost_us: u64,
}

impl Default for FilterProfile {
    fn default() -> Self {
        Self {
            pass_rate: 0.5,
            cost_us: 200,
        }
    }
}

/// Profile file: per-filter behavior plus a default for the rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimProfile {
    #[serde(default)]
    pub filters: HashMap<String, FilterProfile>,
    #[serde(default)]
    pub default: FilterProfile,
}

/// Deterministic stand-in runtime.
pub struct SimulatedRuntime {
    profile: SimProfile,
    seed: u64,
}

impl SimulatedRuntime {
    pub fn new(profile: SimProfile, seed: u64) -> Self {
        Self { profile, seed }
    }

    fn profile_for(&self, name: &str) -> FilterProfile {
        self.profile
            .filters
            .get(name)
            .copied()
            .unwrap_or(self.profile.default)
    }

    /// Uniform draw in [0, 1) from (seed, filter, object).
    fn unit(&self, filter: &str, object: &str) -> f64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.seed.hash(&mut hasher);
        filter.hash(&mut hasher);
        object.hash(&mut hasher);
        (hasher.finish() >> 11) as f64 / (1u64 << 53) as f64
    }
}

impl FilterRuntime for SimulatedRuntime {
    fn eval(
        &self,
        filter: &Filter,
        object: &ObjectRecord,
        cancel: &CancelToken,
    ) -> Result<EvalOutcome> {
        let profile = self.profile_for(&filter.name);
        // Burn the nominal cost in small slices so cancellation stays
        // responsive.
        let mut remaining = profile.cost_us;
        while remaining > 0 && !cancel.is_cancelled() {
            let slice = remaining.min(500);
            std::thread::sleep(Duration::from_micros(slice));
            remaining -= slice;
        }
        let draw = self.unit(&filter.name, object.id());
        let score = if draw < profile.pass_rate {
            filter.threshold.saturating_add(1)
        } else {
            filter.threshold.saturating_sub(1)
        };
        Ok(EvalOutcome::score_only(score))
    }
}
