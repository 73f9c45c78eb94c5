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

//! Randomized properties of the spec parser and partial order

use rand::{Rng, SeedableRng};

use dredge_core::{parse_spec, PartialOrder, Permutation, Relation};

/// Random DAG specs: edges only ever point at earlier filters, so the
/// REQUIRES graph is acyclic by construction.
fn random_spec(rng: &mut impl Rng, n: usize) -> String {
    let mut out = String::new();
    for i in 0..n {
        out.push_str(&format!("FILTER f{}\nTHRESHOLD {}\n", i, rng.gen_range(-5..50)));
        if rng.gen_bool(0.5) {
            out.push_str(&format!("MERIT {}\n", rng.gen_range(0..20)));
        }
        for dep in 0..i {
            if rng.gen_bool(0.3) {
                out.push_str(&format!("REQUIRES f{}\n", dep));
            }
        }
    }
    out
}

#[test]
fn parse_print_parse_is_stable() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let n = rng.gen_range(1..8);
        let spec = random_spec(&mut rng, n);
        let table = parse_spec(&spec).expect("generated specs are valid");
        let printed = table.to_string();
        let reparsed = parse_spec(&printed).expect("printed specs re-parse");
        assert_eq!(reparsed.len(), table.len());
        for (a, b) in table.iter().zip(reparsed.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.threshold, b.threshold);
            assert_eq!(a.merit, b.merit);
            assert_eq!(a.dependencies, b.dependencies);
            assert_eq!(a.signature(), b.signature());
        }
        // Printing again yields the identical text.
        assert_eq!(printed, reparsed.to_string());
    }
}

#[test]
fn closure_is_idempotent_on_random_dags() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let n = rng.gen_range(2..10);
        let mut po = PartialOrder::new(n);
        for v in 1..n {
            for u in 0..v {
                if rng.gen_bool(0.3) {
                    po.set(u, v, Relation::Lt).unwrap();
                }
            }
        }
        po.closure().expect("forward edges cannot cycle");
        let first: Vec<_> = (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .map(|(i, j)| po.get(i, j))
            .collect();
        po.closure().expect("closure of a closure succeeds");
        let second: Vec<_> = (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .map(|(i, j)| po.get(i, j))
            .collect();
        assert_eq!(first, second);
    }
}

#[test]
fn topological_completion_always_valid() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(99);
    for _ in 0..100 {
        let n = rng.gen_range(1..10);
        let mut po = PartialOrder::new(n);
        for v in 1..n {
            for u in 0..v {
                if rng.gen_bool(0.4) {
                    po.set(u, v, Relation::Lt).unwrap();
                }
            }
        }
        po.closure().unwrap();

        // Shuffle, then complete; the result must be a valid total order
        // that is a permutation of 0..n.
        let mut order: Vec<usize> = (0..n).collect();
        for i in (1..n).rev() {
            let j = rng.gen_range(0..=i);
            order.swap(i, j);
        }
        let mut perm = Permutation::from_order(order);
        perm.set_len(0);
        perm.complete_topological(&po);

        assert!(perm.is_valid_prefix(&po));
        let mut seen = vec![false; n];
        for &e in perm.as_slice() {
            assert!(!seen[e], "duplicate element {}", e);
            seen[e] = true;
        }
        assert!(seen.into_iter().all(|s| s));
    }
}

#[test]
fn requires_closure_matches_reachability() {
    // po.get must agree with graph reachability over the REQUIRES DAG.
    let mut rng = rand::rngs::StdRng::seed_from_u64(5);
    for _ in 0..30 {
        let n = rng.gen_range(2..8);
        let mut edges = vec![vec![false; n]; n]; // u -> v means u < v
        let mut po = PartialOrder::new(n);
        for v in 1..n {
            for u in 0..v {
                if rng.gen_bool(0.3) {
                    edges[u][v] = true;
                    po.set(u, v, Relation::Lt).unwrap();
                }
            }
        }
        po.closure().unwrap();

        // Floyd-Warshall reachability on the edge matrix.
        for k in 0..n {
            for i in 0..n {
                for j in 0..n {
                    if edges[i][k] && edges[k][j] {
                        edges[i][j] = true;
                    }
                }
            }
        }
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let expected = if edges[i][j] {
                    Relation::Lt
                } else if edges[j][i] {
                    Relation::Gt
                } else {
                    Relation::Incomparable
                };
                assert_eq!(po.get(i, j), expected, "pair ({}, {})", i, j);
            }
        }
    }
}
