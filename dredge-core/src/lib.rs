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

//! Dredge core primitives
//!
//! The data model of the adaptive filter-execution engine: the filter
//! table parsed from a FilterSpec, the partial order induced by REQUIRES
//! edges, and the permutations the optimizers search over. Everything here
//! is immutable after construction and freely shared across worker
//! threads; the runtime pieces live in `dredge-engine`.

pub mod config;
pub mod error;
pub mod filter;
pub mod partial_order;
pub mod permutation;
pub mod spec;

pub use config::{EngineConfig, OptimizerKind, RetryPolicy};
pub use error::{DredgeError, Result};
pub use filter::{
    Filter, FilterTable, OutputKind, APPLICATION_FILTER, MAX_DEPS, MAX_FUNC, MAX_NAME,
};
pub use partial_order::{PartialOrder, Relation};
pub use permutation::Permutation;
pub use spec::parse_spec;
