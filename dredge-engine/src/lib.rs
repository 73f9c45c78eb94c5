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

//! Dredge adaptive filter-execution engine
//!
//! Streams candidate objects past a pipeline of scoring filters and
//! decides, per object and at runtime, the cheapest order to run them in:
//!
//! ```text
//! spec text ─▶ FilterTable ─▶ PartialOrder ─▶ seed Permutation
//!                                                   │
//!            ┌── publishes new order ──┐            ▼
//!  StatsTracker ◀── measurements ── worker loop (driver)
//!            │                          │
//!            ▼                          ▼
//!  HillClimb / BestFirst         AttributeCache
//! ```
//!
//! The engine guarantees monotonic improvement of the executed order, not
//! global optimality; filters on one object always run sequentially, and
//! learned statistics never outlive the search.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use dredge_core::{parse_spec, EngineConfig};
//! use dredge_engine::{
//!     CollectSink, EvalOutcome, FilterRuntime, ObjectRecord, QueueObjectStore, Search,
//!     SearchCollaborators,
//! };
//!
//! struct Brightness;
//! impl FilterRuntime for Brightness {
//!     fn eval(
//!         &self,
//!         _filter: &dredge_core::Filter,
//!         object: &ObjectRecord,
//!         _cancel: &dredge_engine::CancelToken,
//!     ) -> dredge_core::Result<EvalOutcome> {
//!         Ok(EvalOutcome::score_only(object.id().len() as i32))
//!     }
//! }
//!
//! let table = parse_spec("FILTER A\nTHRESHOLD 3\n").unwrap();
//! let sink = Arc::new(CollectSink::new());
//! let handle = Search::start(
//!     table,
//!     SearchCollaborators {
//!         store: Arc::new(QueueObjectStore::new(vec![ObjectRecord::new("obj-1")])),
//!         runtime: Arc::new(Brightness),
//!         sink: sink.clone(),
//!     },
//!     EngineConfig::default(),
//! )
//! .unwrap();
//! assert_eq!(handle.join().exit_code(), 0);
//! assert_eq!(sink.len(), 1);
//! ```

pub mod best_first;
pub mod cache;
pub mod collab;
mod driver;
pub mod heap;
pub mod hill_climb;
pub mod object;
pub mod optimizer;
pub mod search;
pub mod stats;

pub use cache::{AttributeCache, CacheStats, CachedResult};
pub use collab::{
    BlobStore, CancelToken, ChannelSink, CollectSink, EvalOutcome, FilterRuntime,
    MemoryBlobStore, ObjectStore, QueueObjectStore, ResultSink,
};
pub use object::{AttrValue, ObjectRecord};
pub use optimizer::{PermutationOptimizer, StepOutcome};
pub use search::{Search, SearchCollaborators, SearchHandle, SearchOutcome, SearchStats};
pub use stats::{Evaluation, FilterStatsSnapshot, StatsTracker};
