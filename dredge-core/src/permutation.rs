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

//! Filter-order permutations
//!
//! A `Permutation` always holds all n filter indices, but only the first
//! `len()` positions are the committed prefix; the tail keeps the filters
//! not yet placed. The best-first optimizer grows the prefix one position
//! at a time and relies on `copy_with_tail` to carry the tail along, so a
//! child expansion never loses track of the unplaced filters.

use std::fmt;

use crate::partial_order::{PartialOrder, Relation};

/// Permutation of `{0..n-1}` with a fixed prefix length.
#[derive(Debug, Clone)]
pub struct Permutation {
    elements: Vec<usize>,
    len: usize,
}

impl Permutation {
    /// Identity buffer with an empty prefix.
    pub fn new(n: usize) -> Self {
        Self {
            elements: (0..n).collect(),
            len: 0,
        }
    }

    /// Identity buffer with a full prefix.
    pub fn identity(n: usize) -> Self {
        Self {
            elements: (0..n).collect(),
            len: n,
        }
    }

    /// Build from an explicit ordering; the prefix covers everything.
    pub fn from_order(order: Vec<usize>) -> Self {
        let len = order.len();
        Self {
            elements: order,
            len,
        }
    }

    /// Total number of filter indices held (prefix + tail).
    pub fn capacity(&self) -> usize {
        self.elements.len()
    }

    /// Committed prefix length.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.capacity());
        self.len = len;
    }

    pub fn elt(&self, i: usize) -> usize {
        self.elements[i]
    }

    pub fn set_elt(&mut self, i: usize, val: usize) {
        self.elements[i] = val;
        if i >= self.len {
            self.len = i + 1;
        }
    }

    pub fn swap(&mut self, i: usize, j: usize) {
        self.elements.swap(i, j);
    }

    /// The committed prefix.
    pub fn as_slice(&self) -> &[usize] {
        &self.elements[..self.len]
    }

    /// The whole buffer, tail included.
    pub fn full(&self) -> &[usize] {
        &self.elements
    }

    /// Copy the prefix of `other` into this buffer.
    pub fn copy_from(&mut self, other: &Permutation) {
        debug_assert!(self.capacity() >= other.len());
        self.elements[..other.len()].copy_from_slice(other.as_slice());
        self.len = other.len();
    }

    /// Copy the entire buffer of `other`, positions past the prefix
    /// included. The tail holds the filters not yet placed, and candidate
    /// expansion needs it intact.
    pub fn copy_with_tail(&mut self, other: &Permutation) {
        debug_assert!(self.capacity() >= other.capacity());
        self.elements[..other.capacity()].copy_from_slice(other.full());
        self.len = other.len();
    }

    /// Prefix validity: no element of the prefix is ordered after any
    /// element that follows it anywhere in the buffer.
    pub fn is_valid_prefix(&self, po: &PartialOrder) -> bool {
        let n = self.capacity();
        for i in 0..self.len {
            for j in i + 1..n {
                if po.get(self.elements[i], self.elements[j]) == Relation::Gt {
                    return false;
                }
            }
        }
        true
    }

    /// Complete the tail into a topologically valid total order with a
    /// bubble pass, then commit the full length.
    pub fn complete_topological(&mut self, po: &PartialOrder) {
        let n = self.capacity();
        for i in self.len..n {
            let mut v1 = self.elements[i];
            for j in i + 1..n {
                let v2 = self.elements[j];
                if po.get(v1, v2) == Relation::Gt {
                    self.swap(i, j);
                    v1 = v2;
                }
            }
        }
        self.len = n;
        debug_assert!(self.is_valid_prefix(po));
    }
}

impl PartialEq for Permutation {
    /// Equality over the committed prefix only.
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Permutation {}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, elt) in self.as_slice().iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", elt)?;
        }
        write!(f, "]")
    }
}
