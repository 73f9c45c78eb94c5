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

//! Score-ordered permutation heap
//!
//! Max-heap used by the best-first optimizer. Keys are permutation scores
//! (negated expected cost); equal keys pop in insertion order so repeated
//! optimizer runs over unchanged statistics stay deterministic. Sift-down
//! is iterative.

use dredge_core::Permutation;

struct HeapEntry {
    key: f64,
    seq: u64,
    perm: Permutation,
}

/// Growable max-heap of scored permutations.
pub struct ScoreHeap {
    entries: Vec<HeapEntry>,
    next_seq: u64,
}

impl ScoreHeap {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            entries: Vec::with_capacity(n),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every held permutation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// True when `a` outranks `b`: higher key, or same key inserted first.
    fn outranks(a: &HeapEntry, b: &HeapEntry) -> bool {
        a.key > b.key || (a.key == b.key && a.seq < b.seq)
    }

    pub fn push(&mut self, key: f64, perm: Permutation) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(HeapEntry { key, seq, perm });
        self.sift_up(self.entries.len() - 1);
    }

    /// Remove and return the highest-scoring permutation.
    pub fn pop(&mut self) -> Option<Permutation> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let top = self.entries.pop().expect("heap not empty");
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        Some(top.perm)
    }

    pub fn peek_key(&self) -> Option<f64> {
        self.entries.first().map(|e| e.key)
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if Self::outranks(&self.entries[i], &self.entries[parent]) {
                self.entries.swap(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let n = self.entries.len();
        loop {
            let left = 2 * i + 1;
            let right = left + 1;
            let mut largest = i;
            if left < n && Self::outranks(&self.entries[left], &self.entries[largest]) {
                largest = left;
            }
            if right < n && Self::outranks(&self.entries[right], &self.entries[largest]) {
                largest = right;
            }
            if largest == i {
                break;
            }
            self.entries.swap(i, largest);
            i = largest;
        }
    }
}

impl Default for ScoreHeap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perm_starting_with(first: usize, n: usize) -> Permutation {
        let mut pm = Permutation::identity(n);
        pm.swap(0, first);
        pm
    }

    #[test]
    fn test_pop_order() {
        let mut heap = ScoreHeap::new();
        heap.push(-30.0, perm_starting_with(0, 4));
        heap.push(-10.0, perm_starting_with(1, 4));
        heap.push(-20.0, perm_starting_with(2, 4));
        assert_eq!(heap.pop().unwrap().elt(0), 1);
        assert_eq!(heap.pop().unwrap().elt(0), 2);
        assert_eq!(heap.pop().unwrap().elt(0), 0);
        assert!(heap.pop().is_none());
    }

    #[test]
    fn test_ties_break_by_insertion_order() {
        let mut heap = ScoreHeap::new();
        heap.push(-5.0, perm_starting_with(2, 4));
        heap.push(-5.0, perm_starting_with(3, 4));
        heap.push(-5.0, perm_starting_with(1, 4));
        assert_eq!(heap.pop().unwrap().elt(0), 2);
        assert_eq!(heap.pop().unwrap().elt(0), 3);
        assert_eq!(heap.pop().unwrap().elt(0), 1);
    }

    #[test]
    fn test_random_heap_property() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut heap = ScoreHeap::new();
        let mut keys: Vec<f64> = (0..200).map(|_| rng.gen_range(-1000..1000) as f64).collect();
        for &k in &keys {
            heap.push(k, Permutation::identity(1));
        }
        keys.sort_by(|a, b| b.partial_cmp(a).unwrap());
        for expected in keys {
            assert_eq!(heap.peek_key().unwrap(), expected);
            heap.pop();
        }
    }

    #[test]
    fn test_clear() {
        let mut heap = ScoreHeap::with_capacity(4);
        heap.push(1.0, Permutation::identity(2));
        heap.clear();
        assert!(heap.is_empty());
    }
}
