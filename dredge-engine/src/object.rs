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

//! In-flight object state
//!
//! One `ObjectRecord` per candidate object, created when the object store
//! hands it over and dropped when the object is either discarded or
//! emitted. Attribute values are `Arc`-shared so the attribute cache can
//! hold them without copying. The score map doubles as the record of
//! which filters have run on the object.

use std::collections::HashMap;
use std::sync::Arc;

/// Shared attribute bytes.
pub type AttrValue = Arc<[u8]>;

/// Payload size of an attribute list, for cache accounting and the
/// throughput gate.
pub(crate) fn attr_payload_bytes(attrs: &[(String, AttrValue)]) -> usize {
    attrs
        .iter()
        .map(|(name, value)| name.len() + value.len())
        .sum()
}

/// A candidate object moving through the filter pipeline.
#[derive(Debug, Clone, Default)]
pub struct ObjectRecord {
    id: String,
    attrs: HashMap<String, AttrValue>,
    scores: HashMap<usize, i32>,
}

impl ObjectRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.insert(name.into(), value.into());
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Record the score a filter gave this object.
    pub fn set_score(&mut self, filter_id: usize, score: i32) {
        self.scores.insert(filter_id, score);
    }

    pub fn score(&self, filter_id: usize) -> Option<i32> {
        self.scores.get(&filter_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attrs_and_scores() {
        let mut obj = ObjectRecord::new("scope-17/object-4");
        obj.set_attr("rows", &b"480"[..]);
        obj.set_score(2, 75);
        assert_eq!(obj.id(), "scope-17/object-4");
        assert_eq!(obj.attr("rows").map(|v| v.as_ref()), Some(&b"480"[..]));
        assert_eq!(obj.score(2), Some(75));
        assert_eq!(obj.score(0), None);
    }

    #[test]
    fn test_attr_payload_bytes() {
        let attrs = vec![("ab".to_string(), AttrValue::from(&b"1234"[..]))];
        assert_eq!(attr_payload_bytes(&attrs), 6);
        assert_eq!(attr_payload_bytes(&[]), 0);
    }
}
