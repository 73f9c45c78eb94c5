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

//! Attribute cache
//!
//! Memoizes filter outputs keyed by `(filter signature, object id)` so a
//! reordering never redoes work already done on the same object. Entries
//! hold the score and the attributes the filter emitted; eviction is LRU
//! over total cached bytes.
//!
//! Attribute values themselves are only stored when the filter produced
//! them slowly (below the configured bytes/sec limit); output cheaper to
//! recompute than to hold is recorded score-only, and a score-only hit on
//! a filter that did emit attributes falls back to re-execution. Scores
//! are deterministic per (signature, object), so re-execution cannot flip
//! a pass/drop decision.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::object::{attr_payload_bytes, AttrValue};

/// One memoized filter execution.
#[derive(Debug, Clone)]
pub struct CachedResult {
    pub score: i32,
    /// Attributes the filter emitted; empty when none were emitted or
    /// when they were too cheap to keep.
    pub attrs: Vec<(String, AttrValue)>,
    /// False when emitted attributes were withheld from the cache.
    pub attrs_cached: bool,
}

impl CachedResult {
    fn bytes(&self, object_id: &str) -> usize {
        attr_payload_bytes(&self.attrs) + object_id.len() + std::mem::size_of::<Self>()
    }
}

struct Entry {
    result: CachedResult,
    bytes: usize,
    last_used: u64,
}

struct CacheInner {
    map: HashMap<(u64, String), Entry>,
    total_bytes: usize,
    tick: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Cache counters for the search stats surface.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Bounded, internally synchronized result/attribute cache.
pub struct AttributeCache {
    inner: Mutex<CacheInner>,
    capacity_bytes: usize,
}

impl AttributeCache {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                map: HashMap::new(),
                total_bytes: 0,
                tick: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            capacity_bytes,
        }
    }

    /// Look up a prior execution of `signature` on `object_id`.
    pub fn get(&self, signature: u64, object_id: &str) -> Option<CachedResult> {
        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;
        let key = (signature, object_id.to_string());
        let found = match inner.map.get_mut(&key) {
            Some(entry) => {
                entry.last_used = tick;
                Some(entry.result.clone())
            }
            None => None,
        };
        if found.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        found
    }

    /// Record an execution. An oversized entry is simply not cached.
    pub fn insert(&self, signature: u64, object_id: &str, result: CachedResult) {
        let bytes = result.bytes(object_id);
        if bytes > self.capacity_bytes {
            return;
        }
        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;
        let key = (signature, object_id.to_string());
        if let Some(old) = inner.map.remove(&key) {
            inner.total_bytes -= old.bytes;
        }
        inner.total_bytes += bytes;
        inner.map.insert(
            key,
            Entry {
                result,
                bytes,
                last_used: tick,
            },
        );
        while inner.total_bytes > self.capacity_bytes {
            let victim = inner
                .map
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            match victim {
                Some(key) => {
                    if let Some(entry) = inner.map.remove(&key) {
                        inner.total_bytes -= entry.bytes;
                        inner.evictions += 1;
                    }
                }
                None => break,
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entries: inner.map.len(),
            bytes: inner.total_bytes,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }
}
