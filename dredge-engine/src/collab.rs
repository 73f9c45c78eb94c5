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

//! Collaborator interfaces
//!
//! The engine consumes four seams: an object store producing candidates,
//! a blob store resolving content signatures, a filter runtime executing
//! filter code, and a sink receiving passing objects. All of them are
//! shared across worker threads, so implementations synchronize
//! internally. In-memory implementations live here for tests, the CLI
//! simulator, and embedders that stage objects up front.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use dredge_core::{DredgeError, Filter, Result};

use crate::object::{AttrValue, ObjectRecord};

/// Cooperative cancellation flag, checked between filter invocations and
/// polled by long-running filter code.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// What one filter execution produced.
#[derive(Debug, Clone)]
pub struct EvalOutcome {
    pub score: i32,
    /// Attributes the filter emitted onto the object.
    pub emitted: Vec<(String, AttrValue)>,
}

impl EvalOutcome {
    pub fn score_only(score: i32) -> Self {
        Self {
            score,
            emitted: Vec::new(),
        }
    }
}

/// Produces candidate objects in arbitrary order. Implementations must
/// tolerate interleaved calls from every worker.
pub trait ObjectStore: Send + Sync {
    /// Next candidate, or `None` at end of stream.
    fn next(&self) -> Result<Option<ObjectRecord>>;
}

/// Resolves filter code and reference data by content signature.
pub trait BlobStore: Send + Sync {
    fn get(&self, signature: &str) -> Result<AttrValue>;
}

/// Executes filter code. `eval` must be deterministic for identical
/// (filter signature, object) pairs; the attribute cache depends on it.
pub trait FilterRuntime: Send + Sync {
    /// Called once per filter before any object is processed.
    fn init(&self, _filter: &Filter) -> Result<()> {
        Ok(())
    }

    /// Score one object, emitting any attributes it produces. Long
    /// evaluations should poll `cancel`.
    fn eval(
        &self,
        filter: &Filter,
        object: &ObjectRecord,
        cancel: &CancelToken,
    ) -> Result<EvalOutcome>;

    /// Called once per filter at teardown, even after an abort.
    fn fini(&self, _filter: &Filter) {}
}

/// Receives objects that passed every filter.
pub trait ResultSink: Send + Sync {
    fn emit(&self, object: ObjectRecord) -> Result<()>;
}

// ============================================================================
// In-memory implementations
// ============================================================================

/// Object store over a pre-staged queue.
pub struct QueueObjectStore {
    queue: Mutex<VecDeque<ObjectRecord>>,
}

impl QueueObjectStore {
    pub fn new(objects: impl IntoIterator<Item = ObjectRecord>) -> Self {
        Self {
            queue: Mutex::new(objects.into_iter().collect()),
        }
    }
}

impl ObjectStore for QueueObjectStore {
    fn next(&self) -> Result<Option<ObjectRecord>> {
        Ok(self.queue.lock().pop_front())
    }
}

/// Blob store over a signature-to-bytes map.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, AttrValue>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, signature: impl Into<String>, bytes: impl Into<AttrValue>) {
        self.blobs.lock().insert(signature.into(), bytes.into());
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, signature: &str) -> Result<AttrValue> {
        self.blobs.lock().get(signature).cloned().ok_or_else(|| {
            DredgeError::CollaboratorUnavailable {
                attempts: 1,
                reason: format!("no blob with signature {}", signature),
            }
        })
    }
}

/// Sink that collects everything it receives.
#[derive(Default)]
pub struct CollectSink {
    objects: Mutex<Vec<ObjectRecord>>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<ObjectRecord> {
        std::mem::take(&mut self.objects.lock())
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }
}

impl ResultSink for CollectSink {
    fn emit(&self, object: ObjectRecord) -> Result<()> {
        self.objects.lock().push(object);
        Ok(())
    }
}

/// Sink that forwards into a crossbeam channel, for streaming consumers.
pub struct ChannelSink {
    tx: crossbeam_channel::Sender<ObjectRecord>,
}

impl ChannelSink {
    pub fn new() -> (Self, crossbeam_channel::Receiver<ObjectRecord>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }
}

impl ResultSink for ChannelSink {
    fn emit(&self, object: ObjectRecord) -> Result<()> {
        self.tx
            .send(object)
            .map_err(|_| DredgeError::Internal("result channel closed".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_store_drains() {
        let store = QueueObjectStore::new((0..3).map(|i| ObjectRecord::new(format!("o{}", i))));
        assert_eq!(store.next().unwrap().unwrap().id(), "o0");
        assert_eq!(store.next().unwrap().unwrap().id(), "o1");
        assert_eq!(store.next().unwrap().unwrap().id(), "o2");
        assert!(store.next().unwrap().is_none());
    }

    #[test]
    fn test_blob_store() {
        let blobs = MemoryBlobStore::new();
        blobs.put("sha256:abc", &b"code"[..]);
        assert_eq!(blobs.get("sha256:abc").unwrap().as_ref(), b"code");
        assert!(blobs.get("sha256:missing").is_err());
    }

    #[test]
    fn test_channel_sink() {
        let (sink, rx) = ChannelSink::new();
        sink.emit(ObjectRecord::new("hit")).unwrap();
        assert_eq!(rx.recv().unwrap().id(), "hit");
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
