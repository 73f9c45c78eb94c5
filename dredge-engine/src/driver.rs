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

//! Per-object execution driver
//!
//! Each worker loops: fetch an object, load the current filter order, run
//! the filters in that order through the attribute cache, feed every
//! outcome to the statistics tracker, and short-circuit the moment a
//! filter scores the object below its threshold.
//!
//! An object runs entirely under the order loaded at its start; orders
//! published mid-object take effect on the next object. Every
//! `reopt_interval` objects (or as soon as a filter first reaches
//! `min_samples`) whichever worker gets there first steps the optimizer.
//! A finished optimization publishes the new order; an optimization
//! starved of samples publishes its candidate so upcoming objects collect
//! the missing measurements.
//!
//! Published orders are always topologically valid total orders: the
//! optimizers reject constraint-violating swaps before scoring them, and
//! `publish` re-checks before committing.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use dredge_core::{DredgeError, EngineConfig, FilterTable, PartialOrder, Permutation, Result};

use crate::cache::{AttributeCache, CachedResult};
use crate::collab::{CancelToken, FilterRuntime, ObjectStore, ResultSink};
use crate::object::{attr_payload_bytes, ObjectRecord};
use crate::optimizer::{PermutationOptimizer, StepOutcome};
use crate::stats::StatsTracker;

pub(crate) struct OptimizerSlot {
    pub(crate) opt: PermutationOptimizer,
}

/// State shared by every worker of one search.
pub(crate) struct SearchShared {
    pub(crate) table: Arc<FilterTable>,
    pub(crate) po: Arc<PartialOrder>,
    pub(crate) stats: Arc<StatsTracker>,
    pub(crate) cache: Arc<AttributeCache>,
    pub(crate) config: EngineConfig,
    pub(crate) current: RwLock<Arc<Permutation>>,
    pub(crate) optimizer: Mutex<OptimizerSlot>,
    pub(crate) cancel: CancelToken,
    pub(crate) objects_processed: AtomicU64,
    pub(crate) objects_passed: AtomicU64,
    pub(crate) objects_dropped: AtomicU64,
    pub(crate) since_reopt: AtomicU64,
    pub(crate) reopt_hint: AtomicBool,
    pub(crate) consec_fails: Vec<AtomicU32>,
    /// Microseconds to the first passing object; 0 until one passes.
    pub(crate) first_pass_us: AtomicU64,
    pub(crate) started: Instant,
    pub(crate) fatal: Mutex<Option<DredgeError>>,
}

impl SearchShared {
    /// Commit a new filter order. The order must cover the whole table
    /// and respect the partial order; anything else is refused.
    pub(crate) fn publish(&self, perm: Permutation) {
        if perm.len() != self.table.len() || !perm.is_valid_prefix(&self.po) {
            debug_assert!(false, "optimizer produced an invalid order");
            tracing::error!(perm = %perm, "refusing to publish invalid filter order");
            return;
        }
        tracing::debug!(perm = %perm, "publishing filter order");
        *self.current.write() = Arc::new(perm);
    }

    /// Record the first fatal error and stop every worker.
    pub(crate) fn fail(&self, err: DredgeError) {
        tracing::error!(error = %err, "search aborting");
        let mut fatal = self.fatal.lock();
        if fatal.is_none() {
            *fatal = Some(err);
        }
        self.cancel.cancel();
    }
}

#[derive(Debug)]
enum Disposition {
    Passed(Box<ObjectRecord>),
    Dropped,
    Cancelled,
}

/// Worker thread body.
pub(crate) fn run_worker(
    shared: &SearchShared,
    store: &dyn ObjectStore,
    runtime: &dyn FilterRuntime,
    sink: &dyn ResultSink,
) {
    loop {
        if shared.cancel.is_cancelled() {
            break;
        }
        let obj = match fetch_with_retry(shared, store) {
            Ok(Some(obj)) => obj,
            Ok(None) => break,
            Err(err) => {
                shared.fail(err);
                break;
            }
        };
        let perm = shared.current.read().clone();
        match evaluate_object(shared, runtime, &perm, obj) {
            Ok(Disposition::Passed(obj)) => {
                let elapsed = shared.started.elapsed().as_micros().max(1) as u64;
                let _ = shared.first_pass_us.compare_exchange(
                    0,
                    elapsed,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                );
                shared.objects_passed.fetch_add(1, Ordering::Relaxed);
                if let Err(err) = sink.emit(*obj) {
                    shared.fail(err);
                    break;
                }
            }
            Ok(Disposition::Dropped) => {
                shared.objects_dropped.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Disposition::Cancelled) => break,
            Err(err) => {
                shared.fail(err);
                break;
            }
        }
        shared.objects_processed.fetch_add(1, Ordering::Relaxed);
        maybe_reoptimize(shared);
    }
}

/// Fetch the next object, backing off while the store is unavailable.
fn fetch_with_retry(
    shared: &SearchShared,
    store: &dyn ObjectStore,
) -> Result<Option<ObjectRecord>> {
    let retry = shared.config.retry;
    let mut delay = Duration::from_millis(retry.base_ms);
    let mut last_reason = String::new();
    for attempt in 1..=retry.attempts.max(1) {
        if shared.cancel.is_cancelled() {
            return Ok(None);
        }
        match store.next() {
            Ok(next) => return Ok(next),
            Err(err) => {
                last_reason = err.to_string();
                tracing::warn!(attempt, error = %err, "object store unavailable, backing off");
                if attempt < retry.attempts {
                    std::thread::sleep(delay);
                    delay = (delay * 2).min(Duration::from_millis(retry.cap_ms));
                }
            }
        }
    }
    Err(DredgeError::CollaboratorUnavailable {
        attempts: retry.attempts,
        reason: last_reason,
    })
}

/// Run the filters over one object in the given order.
fn evaluate_object(
    shared: &SearchShared,
    runtime: &dyn FilterRuntime,
    perm: &Permutation,
    mut obj: ObjectRecord,
) -> Result<Disposition> {
    for &filter_id in perm.as_slice() {
        if shared.cancel.is_cancelled() {
            return Ok(Disposition::Cancelled);
        }
        let filter = shared.table.get(filter_id);

        let score = match shared.cache.get(filter.signature(), obj.id()) {
            Some(hit) if hit.attrs_cached => {
                for (name, value) in hit.attrs {
                    obj.set_attr(name, value);
                }
                let passed = filter.passes(hit.score);
                if shared.stats.record_cached(filter_id, passed) {
                    shared.reopt_hint.store(true, Ordering::Relaxed);
                }
                hit.score
            }
            // A score-only entry means the attributes were too cheap to
            // keep; the filter is deterministic, so re-run it.
            _ => {
                let t0 = Instant::now();
                let outcome = runtime.eval(filter, &obj, &shared.cancel);
                let ticks = t0.elapsed().as_micros() as u64;
                let out = match outcome {
                    Ok(out) => out,
                    Err(err) => {
                        let fails =
                            shared.consec_fails[filter_id].fetch_add(1, Ordering::Relaxed) + 1;
                        tracing::warn!(
                            filter = %filter.name,
                            object = %obj.id(),
                            error = %err,
                            "filter eval failed, dropping object"
                        );
                        if fails > shared.config.max_consec_fails {
                            return Err(DredgeError::FilterWedged {
                                filter: filter.name.clone(),
                                count: fails,
                            });
                        }
                        return Ok(Disposition::Dropped);
                    }
                };
                shared.consec_fails[filter_id].store(0, Ordering::Relaxed);
                let passed = filter.passes(out.score);
                if shared.stats.record(filter_id, passed, ticks) {
                    shared.reopt_hint.store(true, Ordering::Relaxed);
                }

                let emitted_bytes = attr_payload_bytes(&out.emitted);
                let elapsed_secs = (ticks as f64 / 1_000_000.0).max(1e-6);
                let throughput = emitted_bytes as f64 / elapsed_secs;
                let keep_attrs = out.emitted.is_empty()
                    || throughput < shared.config.cache_throughput_limit as f64;
                shared.cache.insert(
                    filter.signature(),
                    obj.id(),
                    CachedResult {
                        score: out.score,
                        attrs: if keep_attrs { out.emitted.clone() } else { Vec::new() },
                        attrs_cached: keep_attrs,
                    },
                );
                for (name, value) in out.emitted {
                    obj.set_attr(name, value);
                }
                out.score
            }
        };

        obj.set_score(filter_id, score);
        if !filter.passes(score) {
            tracing::debug!(
                filter = %filter.name,
                object = %obj.id(),
                score,
                threshold = filter.threshold,
                "object dropped"
            );
            return Ok(Disposition::Dropped);
        }
    }

    if let Some(app) = shared.table.application() {
        if let Some(score) = obj.score(app) {
            let attr_name = format!("_filter.{}_score", shared.table.get(app).name);
            obj.set_attr(attr_name, score.to_string().into_bytes());
        }
    }
    Ok(Disposition::Passed(Box::new(obj)))
}

/// Step the optimizer when this object crosses the reopt boundary.
fn maybe_reoptimize(shared: &SearchShared) {
    let since = shared.since_reopt.fetch_add(1, Ordering::Relaxed) + 1;
    let hint = shared.reopt_hint.swap(false, Ordering::Relaxed);
    if since < shared.config.reopt_interval && !hint {
        return;
    }

    let mut slot = match shared.optimizer.try_lock() {
        Some(slot) => slot,
        None => {
            // Another worker is already optimizing; put the hint back.
            if hint {
                shared.reopt_hint.store(true, Ordering::Relaxed);
            }
            return;
        }
    };
    shared.since_reopt.store(0, Ordering::Relaxed);

    for _ in 0..shared.config.max_opt_steps {
        match slot.opt.step(&shared.po, &shared.stats) {
            StepOutcome::Continue => {}
            StepOutcome::Complete => {
                let result = slot.opt.result().clone();
                shared.publish(result);
                let current = shared.current.read().clone();
                slot.opt.reseed(&current);
                return;
            }
            StepOutcome::NeedsData => {
                // Run the candidate to gather the missing measurements;
                // nothing is final yet.
                let candidate = slot.opt.candidate().clone();
                tracing::debug!(perm = %candidate, "optimizer needs data, adopting candidate");
                shared.publish(candidate);
                return;
            }
        }
    }
}
