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

//! Search session surface
//!
//! `Search::start` wires a resolved filter table to its collaborators,
//! spawns the worker pool and returns a `SearchHandle`. The handle reads
//! live statistics, cancels cooperatively, and joins into a
//! `SearchOutcome` that maps onto the process exit codes.
//!
//! Statistics, configuration and the attribute cache are owned by the
//! session and die with it; nothing is process-wide and nothing learned
//! here survives into the next search.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use dredge_core::{DredgeError, EngineConfig, FilterTable, Permutation, Result};

use crate::cache::{AttributeCache, CacheStats};
use crate::collab::{CancelToken, FilterRuntime, ObjectStore, ResultSink};
use crate::driver::{run_worker, OptimizerSlot, SearchShared};
use crate::optimizer::PermutationOptimizer;
use crate::stats::{FilterStatsSnapshot, StatsTracker};

/// The seams a search runs against.
pub struct SearchCollaborators {
    pub store: Arc<dyn ObjectStore>,
    pub runtime: Arc<dyn FilterRuntime>,
    pub sink: Arc<dyn ResultSink>,
}

/// Live statistics for one search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchStats {
    pub objects_processed: u64,
    pub objects_passed: u64,
    pub objects_dropped: u64,
    pub elapsed_us: u64,
    pub time_to_first_result_us: Option<u64>,
    /// Filter names in the currently published execution order.
    pub current_order: Vec<String>,
    pub filters: Vec<FilterStatsSnapshot>,
    pub cache: CacheStats,
}

/// How a search ended.
#[derive(Debug)]
pub enum SearchOutcome {
    /// Object stream exhausted.
    Complete,
    /// Cancelled before the stream ended.
    Cancelled,
    /// Aborted on a fatal error.
    Failed(DredgeError),
}

impl SearchOutcome {
    /// 0 success, 1 fatal spec error, 2 runtime filter failure,
    /// 3 cancelled.
    pub fn exit_code(&self) -> i32 {
        match self {
            SearchOutcome::Complete => 0,
            SearchOutcome::Cancelled => 3,
            SearchOutcome::Failed(err) => err.exit_code(),
        }
    }
}

/// Entry point for running searches.
pub struct Search;

impl Search {
    /// Validate the table, build the partial order, seed the initial
    /// permutation and spawn the worker pool.
    pub fn start(
        table: FilterTable,
        collaborators: SearchCollaborators,
        config: EngineConfig,
    ) -> Result<SearchHandle> {
        let mut table = table;
        if !table.is_resolved() {
            table.resolve()?;
        }
        let po = table.build_partial_order()?;
        let n = table.len();

        // Initial order: merit-heavy filters first, then fixed up into a
        // valid total order.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(table.get(i).merit));
        let mut seed = Permutation::from_order(order);
        seed.set_len(0);
        seed.complete_topological(&po);
        tracing::info!(filters = n, seed = %seed, "starting search");

        let stats = StatsTracker::new(n, config.min_samples, config.default_cost);
        for (idx, filter) in table.iter().enumerate() {
            let t0 = Instant::now();
            collaborators.runtime.init(filter)?;
            stats.record_startup(idx, t0.elapsed().as_micros() as u64);
        }

        let shared = Arc::new(SearchShared {
            table: Arc::new(table),
            po: Arc::new(po),
            stats: Arc::new(stats),
            cache: Arc::new(AttributeCache::new(config.cache_capacity_bytes)),
            current: RwLock::new(Arc::new(seed.clone())),
            optimizer: Mutex::new(OptimizerSlot {
                opt: PermutationOptimizer::new(config.optimizer, &seed),
            }),
            cancel: CancelToken::new(),
            objects_processed: AtomicU64::new(0),
            objects_passed: AtomicU64::new(0),
            objects_dropped: AtomicU64::new(0),
            since_reopt: AtomicU64::new(0),
            reopt_hint: AtomicBool::new(false),
            consec_fails: (0..n).map(|_| AtomicU32::new(0)).collect(),
            first_pass_us: AtomicU64::new(0),
            started: Instant::now(),
            fatal: Mutex::new(None),
            config,
        });

        let workers = shared.config.workers.max(1);
        let mut handles = Vec::with_capacity(workers);
        for k in 0..workers {
            let shared = Arc::clone(&shared);
            let store = Arc::clone(&collaborators.store);
            let runtime = Arc::clone(&collaborators.runtime);
            let sink = Arc::clone(&collaborators.sink);
            let handle = std::thread::Builder::new()
                .name(format!("dredge-worker-{}", k))
                .spawn(move || {
                    run_worker(&shared, store.as_ref(), runtime.as_ref(), sink.as_ref())
                })?;
            handles.push(handle);
        }

        Ok(SearchHandle {
            shared,
            runtime: collaborators.runtime,
            handles,
            finalized: false,
        })
    }
}

/// Handle on a running search.
pub struct SearchHandle {
    shared: Arc<SearchShared>,
    runtime: Arc<dyn FilterRuntime>,
    handles: Vec<JoinHandle<()>>,
    finalized: bool,
}

impl SearchHandle {
    /// Point-in-time statistics; cheap enough to poll.
    pub fn stats(&self) -> SearchStats {
        let shared = &self.shared;
        let first = shared.first_pass_us.load(Ordering::Relaxed);
        let current_order = shared
            .current
            .read()
            .as_slice()
            .iter()
            .map(|&i| shared.table.get(i).name.clone())
            .collect();
        SearchStats {
            objects_processed: shared.objects_processed.load(Ordering::Relaxed),
            objects_passed: shared.objects_passed.load(Ordering::Relaxed),
            objects_dropped: shared.objects_dropped.load(Ordering::Relaxed),
            elapsed_us: shared.started.elapsed().as_micros() as u64,
            time_to_first_result_us: if first == 0 { None } else { Some(first) },
            current_order,
            filters: shared
                .stats
                .snapshot(shared.table.iter().map(|f| f.name.as_str())),
            cache: shared.cache.stats(),
        }
    }

    /// Signal cancellation; workers stop between filter invocations.
    pub fn cancel(&self) {
        tracing::info!("search cancelled");
        self.shared.cancel.cancel();
    }

    /// Token for filter code that wants to poll mid-evaluation.
    pub fn cancel_token(&self) -> CancelToken {
        self.shared.cancel.clone()
    }

    /// Wait for every worker and run `fini` for every filter (abort
    /// included). The handle stays usable for a final `stats` read.
    pub fn wait(&mut self) -> SearchOutcome {
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
        if !self.finalized {
            self.finalized = true;
            for filter in self.shared.table.iter() {
                self.runtime.fini(filter);
            }
        }
        let fatal = self.shared.fatal.lock().take();
        match fatal {
            Some(err) => SearchOutcome::Failed(err),
            None if self.shared.cancel.is_cancelled() => SearchOutcome::Cancelled,
            None => SearchOutcome::Complete,
        }
    }

    /// `wait`, consuming the handle.
    pub fn join(mut self) -> SearchOutcome {
        self.wait()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{CollectSink, EvalOutcome, QueueObjectStore};
    use crate::object::ObjectRecord;
    use dredge_core::parse_spec;

    struct ConstRuntime(i32);

    impl FilterRuntime for ConstRuntime {
        fn eval(
            &self,
            _filter: &dredge_core::Filter,
            _object: &ObjectRecord,
            _cancel: &CancelToken,
        ) -> Result<EvalOutcome> {
            Ok(EvalOutcome::score_only(self.0))
        }
    }

    fn collaborators(
        count: usize,
        runtime: Arc<dyn FilterRuntime>,
    ) -> (SearchCollaborators, Arc<CollectSink>) {
        let sink = Arc::new(CollectSink::new());
        let collab = SearchCollaborators {
            store: Arc::new(QueueObjectStore::new(
                (0..count).map(|i| ObjectRecord::new(format!("o{}", i))),
            )),
            runtime,
            sink: Arc::clone(&sink) as Arc<dyn ResultSink>,
        };
        (collab, sink)
    }

    #[test]
    fn test_complete_search_emits_everything() {
        let table = parse_spec("FILTER A\nTHRESHOLD 5\n").unwrap();
        let (collab, sink) = collaborators(10, Arc::new(ConstRuntime(9)));
        let handle = Search::start(table, collab, EngineConfig::default()).unwrap();
        let outcome = handle.join();
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(sink.len(), 10);
    }

    #[test]
    fn test_drop_everything() {
        let table = parse_spec("FILTER A\nTHRESHOLD 5\n").unwrap();
        let (collab, sink) = collaborators(10, Arc::new(ConstRuntime(2)));
        let handle = Search::start(table, collab, EngineConfig::default()).unwrap();
        let stats_mid = handle.stats();
        assert!(stats_mid.objects_processed <= 10);
        let outcome = handle.join();
        assert_eq!(outcome.exit_code(), 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_merit_biases_seed() {
        let table = parse_spec(
            "FILTER A\nTHRESHOLD 0\nFILTER B\nTHRESHOLD 0\nMERIT 10\n",
        )
        .unwrap();
        let (collab, _sink) = collaborators(0, Arc::new(ConstRuntime(1)));
        let handle = Search::start(table, collab, EngineConfig::default()).unwrap();
        let stats = handle.stats();
        assert_eq!(stats.current_order, vec!["B".to_string(), "A".to_string()]);
        handle.join();
    }

    #[test]
    fn test_cancel_reports_exit_code_3() {
        struct BlockingStore {
            released: AtomicBool,
        }
        impl ObjectStore for BlockingStore {
            fn next(&self) -> Result<Option<ObjectRecord>> {
                while !self.released.load(Ordering::Relaxed) {
                    std::thread::sleep(std::time::Duration::from_millis(1));
                }
                Ok(None)
            }
        }

        let table = parse_spec("FILTER A\nTHRESHOLD 0\n").unwrap();
        let store = Arc::new(BlockingStore {
            released: AtomicBool::new(false),
        });
        let collab = SearchCollaborators {
            store: Arc::clone(&store) as Arc<dyn ObjectStore>,
            runtime: Arc::new(ConstRuntime(1)),
            sink: Arc::new(CollectSink::new()),
        };
        let handle = Search::start(table, collab, EngineConfig::default()).unwrap();
        handle.cancel();
        store.released.store(true, Ordering::Relaxed);
        let outcome = handle.join();
        assert_eq!(outcome.exit_code(), 3);
    }

    #[test]
    fn test_fini_runs_for_every_filter() {
        use parking_lot::Mutex as PlMutex;

        struct FiniTracker {
            finished: PlMutex<Vec<String>>,
        }
        impl FilterRuntime for FiniTracker {
            fn eval(
                &self,
                _filter: &dredge_core::Filter,
                _object: &ObjectRecord,
                _cancel: &CancelToken,
            ) -> Result<EvalOutcome> {
                Ok(EvalOutcome::score_only(1))
            }
            fn fini(&self, filter: &dredge_core::Filter) {
                self.finished.lock().push(filter.name.clone());
            }
        }

        let table = parse_spec("FILTER A\nTHRESHOLD 0\nFILTER B\nTHRESHOLD 0\n").unwrap();
        let runtime = Arc::new(FiniTracker {
            finished: PlMutex::new(Vec::new()),
        });
        let collab = SearchCollaborators {
            store: Arc::new(QueueObjectStore::new(std::iter::empty::<ObjectRecord>())),
            runtime: Arc::clone(&runtime) as Arc<dyn FilterRuntime>,
            sink: Arc::new(CollectSink::new()),
        };
        let handle = Search::start(table, collab, EngineConfig::default()).unwrap();
        handle.join();
        let finished = runtime.finished.lock();
        assert_eq!(finished.len(), 2);
        assert!(finished.contains(&"A".to_string()));
        assert!(finished.contains(&"B".to_string()));
    }
}
