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

//! Partial order over filter indices
//!
//! An n×n relation matrix derived from the REQUIRES edges of a filter
//! table. After `closure()` the matrix is transitively consistent and the
//! engine queries it on every candidate swap, so lookups are O(1).
//!
//! The diagonal is left `Incomparable`; callers never ask about `(i, i)`.

use std::fmt;

/// Ordering relation between two filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// u must run before v.
    Lt,
    /// u must run after v.
    Gt,
    /// u and v are interchangeable.
    Eq,
    /// No constraint between u and v.
    Incomparable,
}

impl Relation {
    /// The relation seen from the other side.
    pub fn inverse(self) -> Self {
        match self {
            Relation::Lt => Relation::Gt,
            Relation::Gt => Relation::Lt,
            other => other,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Relation::Lt => '<',
            Relation::Gt => '>',
            Relation::Eq => '=',
            Relation::Incomparable => '?',
        };
        write!(f, "{}", c)
    }
}

/// Dense relation matrix with O(1) queries.
#[derive(Debug, Clone)]
pub struct PartialOrder {
    dim: usize,
    data: Vec<Relation>,
}

impl PartialOrder {
    /// All-incomparable order over `n` filters.
    pub fn new(n: usize) -> Self {
        Self {
            dim: n,
            data: vec![Relation::Incomparable; n * n],
        }
    }

    pub fn get(&self, u: usize, v: usize) -> Relation {
        self.data[u * self.dim + v]
    }

    /// Record `u rel v` (and the inverse at `(v, u)`).
    ///
    /// Errors with the offending index when the pair already carries a
    /// contradicting relation, which means the REQUIRES edges contain a
    /// two-filter cycle.
    pub fn set(&mut self, u: usize, v: usize, rel: Relation) -> Result<(), usize> {
        let existing = self.get(u, v);
        if existing != Relation::Incomparable && existing != rel {
            return Err(u);
        }
        self.data[u * self.dim + v] = rel;
        self.data[v * self.dim + u] = rel.inverse();
        Ok(())
    }

    /// Warshall-style transitive closure: fill each incomparable `(i, j)`
    /// with `po[i][k]` whenever `po[i][k] == po[k][j]`.
    ///
    /// Errors with an offending index when a relation is derivable that
    /// contradicts a recorded one; that is a REQUIRES cycle. Idempotent on
    /// success.
    pub fn closure(&mut self) -> Result<(), usize> {
        let n = self.dim;
        for k in 0..n {
            for i in 0..n {
                let via = self.get(i, k);
                if via == Relation::Incomparable {
                    continue;
                }
                for j in 0..n {
                    if self.get(k, j) != via {
                        continue;
                    }
                    if i == j {
                        // A strict path from i back to i: only possible on
                        // a cycle. Eq round trips are harmless.
                        if via == Relation::Eq {
                            continue;
                        }
                        return Err(i);
                    }
                    match self.get(i, j) {
                        Relation::Incomparable => {
                            self.data[i * n + j] = via;
                            self.data[j * n + i] = via.inverse();
                        }
                        existing if existing == via => {}
                        _ => return Err(i),
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether `u` has no predecessor (nothing is required before it).
    pub fn is_min(&self, u: usize) -> bool {
        (0..self.dim).all(|i| self.get(u, i) != Relation::Gt)
    }

    pub fn comparable(&self, u: usize, v: usize) -> bool {
        self.get(u, v) != Relation::Incomparable
    }

    pub fn incomparable(&self, u: usize, v: usize) -> bool {
        self.get(u, v) == Relation::Incomparable
    }
}

impl fmt::Display for PartialOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.dim {
            for j in 0..self.dim {
                write!(f, "{} ", self.get(i, j))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: usize) -> PartialOrder {
        // 0 < 1 < ... < n-1, direct edges only
        let mut po = PartialOrder::new(n);
        for i in 0..n - 1 {
            po.set(i, i + 1, Relation::Lt).unwrap();
        }
        po
    }

    #[test]
    fn test_set_stores_inverse() {
        let mut po = PartialOrder::new(2);
        po.set(0, 1, Relation::Lt).unwrap();
        assert_eq!(po.get(0, 1), Relation::Lt);
        assert_eq!(po.get(1, 0), Relation::Gt);
    }

    #[test]
    fn test_closure_transitive() {
        let mut po = chain(4);
        po.closure().unwrap();
        assert_eq!(po.get(0, 3), Relation::Lt);
        assert_eq!(po.get(3, 0), Relation::Gt);
        assert!(po.incomparable(0, 0));
    }

    #[test]
    fn test_closure_idempotent() {
        let mut po = chain(5);
        po.closure().unwrap();
        let snapshot = po.data.clone();
        po.closure().unwrap();
        assert_eq!(po.data, snapshot);
    }

    #[test]
    fn test_two_cycle_detected_on_set() {
        let mut po = PartialOrder::new(2);
        po.set(0, 1, Relation::Lt).unwrap();
        assert!(po.set(0, 1, Relation::Gt).is_err());
    }

    #[test]
    fn test_three_cycle_detected_in_closure() {
        let mut po = PartialOrder::new(3);
        po.set(0, 1, Relation::Lt).unwrap();
        po.set(1, 2, Relation::Lt).unwrap();
        po.set(2, 0, Relation::Lt).unwrap();
        assert!(po.closure().is_err());
    }

    #[test]
    fn test_is_min() {
        let mut po = chain(3);
        po.closure().unwrap();
        assert!(po.is_min(0));
        assert!(!po.is_min(1));
        assert!(!po.is_min(2));
    }

    #[test]
    fn test_incomparable_untouched_by_closure() {
        let mut po = PartialOrder::new(3);
        po.set(0, 1, Relation::Lt).unwrap();
        po.closure().unwrap();
        assert!(po.incomparable(0, 2));
        assert!(po.incomparable(1, 2));
    }
}
