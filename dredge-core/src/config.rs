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

//! Engine configuration
//!
//! All tuning knobs for a search session live here. A config is owned by
//! the search handle; there is no process-wide state.

use serde::{Deserialize, Serialize};

/// Permutation search strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    /// Local search over partial-order-valid adjacent swaps.
    HillClimb,
    /// Priority-queue construction of permutations prefix by prefix.
    BestFirst,
}

/// Retry policy for unavailable collaborators (object store, blob store).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// First backoff delay in milliseconds.
    pub base_ms: u64,
    /// Backoff cap in milliseconds.
    pub cap_ms: u64,
    /// Total attempts before giving up.
    pub attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_ms: 100,
            cap_ms: 30_000,
            attempts: 5,
        }
    }
}

/// Tuning knobs for the adaptive execution engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Samples required per filter before its statistics are trusted.
    pub min_samples: u64,
    /// Assumed cost (ticks) for a filter that has never executed.
    pub default_cost: f64,
    /// Re-run the optimizer every this many objects.
    pub reopt_interval: u64,
    /// Optimizer step budget per invocation.
    pub max_opt_steps: u32,
    /// Consecutive eval failures of one filter that abort the search.
    pub max_consec_fails: u32,
    /// Attribute cache budget in bytes.
    pub cache_capacity_bytes: usize,
    /// Emitted attributes are cached only when the filter produced them
    /// below this throughput (bytes/sec); faster output is cheaper to
    /// recompute than to cache.
    pub cache_throughput_limit: u64,
    /// Worker threads per search.
    pub workers: usize,
    /// Permutation search strategy.
    pub optimizer: OptimizerKind,
    /// Collaborator retry policy.
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_samples: 8,
            default_cost: 1_000.0,
            reopt_interval: 64,
            max_opt_steps: 32,
            max_consec_fails: 10,
            cache_capacity_bytes: 64 << 20,
            cache_throughput_limit: 2 << 20,
            workers: 4,
            optimizer: OptimizerKind::HillClimb,
            retry: RetryPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_sane() {
        let cfg = EngineConfig::default();
        assert!(cfg.min_samples > 0);
        assert!(cfg.default_cost > 0.0);
        assert!(cfg.workers >= 1);
        assert_eq!(cfg.retry.attempts, 5);
    }

    #[test]
    fn test_roundtrip_json() {
        let cfg = EngineConfig {
            optimizer: OptimizerKind::BestFirst,
            ..EngineConfig::default()
        };
        let text = serde_json::to_string(&cfg).unwrap();
        let back: EngineConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back.optimizer, OptimizerKind::BestFirst);
        assert_eq!(back.reopt_interval, cfg.reopt_interval);
    }
}
