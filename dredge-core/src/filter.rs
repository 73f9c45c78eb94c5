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

//! Filter model
//!
//! A `Filter` is a scoring predicate over an object: the object is dropped
//! as soon as any filter scores it below that filter's threshold. A
//! `FilterTable` is the ordered set of filters for one search, with the
//! `APPLICATION` filter marked as the terminal one.
//!
//! Filters are immutable after parsing. `FilterTable::resolve` validates
//! the dependency graph (every `REQUIRES` name must exist, no cycles) and
//! assigns each filter a content signature that keys the attribute cache:
//! the signature hashes the filter's entry points, arguments and the
//! signatures of its dependencies, so any upstream change invalidates
//! downstream cache entries.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{DredgeError, Result};
use crate::partial_order::{PartialOrder, Relation};

/// Maximum filter name length.
pub const MAX_NAME: usize = 128;
/// Maximum entry-point identifier length.
pub const MAX_FUNC: usize = 64;
/// Maximum REQUIRES edges per filter.
pub const MAX_DEPS: usize = 16;
/// Name of the terminal filter whose score the user wants.
pub const APPLICATION_FILTER: &str = "APPLICATION";

/// What a filter does to the object it scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputKind {
    /// The object passes through untouched.
    Unmodified,
    /// The filter produces a new object.
    New,
    /// The filter clones the object before modifying it.
    Clone,
    /// The filter copies attributes onto the object.
    CopyAttr,
}

impl OutputKind {
    /// Parse a spec-file token.
    pub fn parse_token(token: &str) -> Option<Self> {
        match token {
            "UNMODIFIED" => Some(OutputKind::Unmodified),
            "NEW" => Some(OutputKind::New),
            "CLONE" => Some(OutputKind::Clone),
            "COPY_ATTR" => Some(OutputKind::CopyAttr),
            _ => None,
        }
    }

    /// Spec-file spelling.
    pub fn as_token(&self) -> &'static str {
        match self {
            OutputKind::Unmodified => "UNMODIFIED",
            OutputKind::New => "NEW",
            OutputKind::Clone => "CLONE",
            OutputKind::CopyAttr => "COPY_ATTR",
        }
    }
}

/// One scoring predicate. Immutable after parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filter {
    /// Unique name within the table.
    pub name: String,
    /// Drop cutoff: an object is dropped when `score < threshold`.
    pub threshold: i32,
    /// User preference weight; biases the initial ordering.
    pub merit: i32,
    /// Argument strings passed to the filter code.
    pub args: Vec<String>,
    /// Input blob size hint in bytes.
    pub in_object_hint: u64,
    /// Output object behavior.
    pub output_kind: OutputKind,
    /// Output size hint in bytes.
    pub output_hint: u64,
    /// Entry-point names.
    pub eval_fn: Option<String>,
    pub init_fn: Option<String>,
    pub fini_fn: Option<String>,
    /// Names of filters that must run before this one.
    pub dependencies: Vec<String>,
    /// Content signature; assigned by `FilterTable::resolve`.
    #[serde(skip)]
    signature: u64,
}

impl Filter {
    /// New filter with the spec-file defaults (threshold -1, merit 0).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            threshold: -1,
            merit: 0,
            args: Vec::new(),
            in_object_hint: 0,
            output_kind: OutputKind::Unmodified,
            output_hint: 0,
            eval_fn: None,
            init_fn: None,
            fini_fn: None,
            dependencies: Vec::new(),
            signature: 0,
        }
    }

    /// Content signature keying the attribute cache. Zero until the owning
    /// table has been resolved.
    pub fn signature(&self) -> u64 {
        self.signature
    }

    /// Whether an object with this score survives the filter.
    pub fn passes(&self, score: i32) -> bool {
        score >= self.threshold
    }
}

/// Ordered set of filters for one search.
#[derive(Debug, Clone, Default)]
pub struct FilterTable {
    filters: Vec<Filter>,
    by_name: HashMap<String, usize>,
    application: Option<usize>,
    resolved: bool,
}

impl FilterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter. Fails on duplicate names.
    pub fn push(&mut self, filter: Filter) -> Result<()> {
        if self.by_name.contains_key(&filter.name) {
            return Err(DredgeError::spec(format!(
                "duplicate filter name '{}'",
                filter.name
            )));
        }
        let idx = self.filters.len();
        if filter.name == APPLICATION_FILTER {
            self.application = Some(idx);
        }
        self.by_name.insert(filter.name.clone(), idx);
        self.filters.push(filter);
        self.resolved = false;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn get(&self, idx: usize) -> &Filter {
        &self.filters[idx]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Index of the terminal `APPLICATION` filter, if present.
    pub fn application(&self) -> Option<usize> {
        self.application
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    /// Validate the dependency graph and assign content signatures.
    ///
    /// Dependencies are resolved depth-first, so every signature already
    /// incorporates the signatures of everything upstream of it. Fails on
    /// a `REQUIRES` that names an absent filter and on cycles.
    pub fn resolve(&mut self) -> Result<()> {
        if self.is_empty() {
            return Err(DredgeError::spec("filter table is empty"));
        }

        let n = self.filters.len();
        // 0 = unvisited, 1 = in progress, 2 = done
        let mut mark = vec![0u8; n];
        let mut order = Vec::with_capacity(n);
        let mut stack = Vec::new();

        for start in 0..n {
            if mark[start] != 0 {
                continue;
            }
            stack.push((start, 0usize));
            mark[start] = 1;
            while let Some(&(idx, dep_pos)) = stack.last() {
                if dep_pos < self.filters[idx].dependencies.len() {
                    stack.last_mut().unwrap().1 += 1;
                    let dep_name = &self.filters[idx].dependencies[dep_pos];
                    let dep_idx = self.index_of(dep_name).ok_or_else(|| {
                        DredgeError::MissingDependency {
                            filter: self.filters[idx].name.clone(),
                            dependency: dep_name.clone(),
                        }
                    })?;
                    match mark[dep_idx] {
                        0 => {
                            mark[dep_idx] = 1;
                            stack.push((dep_idx, 0));
                        }
                        1 => {
                            return Err(DredgeError::DependencyCycle(
                                self.filters[dep_idx].name.clone(),
                            ));
                        }
                        _ => {}
                    }
                } else {
                    mark[idx] = 2;
                    order.push(idx);
                    stack.pop();
                }
            }
        }

        // Signatures in dependency order: upstream first.
        for &idx in &order {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            let filter = &self.filters[idx];
            filter.name.hash(&mut hasher);
            filter.eval_fn.hash(&mut hasher);
            filter.init_fn.hash(&mut hasher);
            filter.fini_fn.hash(&mut hasher);
            filter.args.hash(&mut hasher);
            for dep_name in &filter.dependencies {
                let dep_idx = self.by_name[dep_name];
                self.filters[dep_idx].signature.hash(&mut hasher);
            }
            self.filters[idx].signature = hasher.finish();
        }

        self.resolved = true;
        Ok(())
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// The `a REQUIRES b` edges as (a, b) index pairs.
    pub fn requires_edges(&self) -> Vec<(usize, usize)> {
        let mut edges = Vec::new();
        for (idx, filter) in self.filters.iter().enumerate() {
            for dep_name in &filter.dependencies {
                if let Some(dep_idx) = self.index_of(dep_name) {
                    edges.push((idx, dep_idx));
                }
            }
        }
        edges
    }

    /// Build the closed partial order induced by the REQUIRES edges:
    /// `a REQUIRES b` means b precedes a, i.e. `po[b][a] = Lt`.
    pub fn build_partial_order(&self) -> Result<PartialOrder> {
        let mut po = PartialOrder::new(self.len());
        for (a, b) in self.requires_edges() {
            po.set(b, a, Relation::Lt).map_err(|_| {
                DredgeError::DependencyCycle(self.filters[a].name.clone())
            })?;
        }
        po.closure()
            .map_err(|u| DredgeError::DependencyCycle(self.filters[u].name.clone()))?;
        Ok(po)
    }
}

impl fmt::Display for FilterTable {
    /// Pretty-print in the spec-file format; parsing the output yields an
    /// equivalent table.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for filter in &self.filters {
            writeln!(f, "FILTER {}", filter.name)?;
            writeln!(f, "THRESHOLD {}", filter.threshold)?;
            if filter.merit != 0 {
                writeln!(f, "MERIT {}", filter.merit)?;
            }
            if let Some(name) = &filter.eval_fn {
                writeln!(f, "EVAL_FUNCTION {}", name)?;
            }
            if let Some(name) = &filter.init_fn {
                writeln!(f, "INIT_FUNCTION {}", name)?;
            }
            if let Some(name) = &filter.fini_fn {
                writeln!(f, "FINI_FUNCTION {}", name)?;
            }
            for arg in &filter.args {
                writeln!(f, "ARG {}", arg)?;
            }
            for dep in &filter.dependencies {
                writeln!(f, "REQUIRES {}", dep)?;
            }
            if filter.in_object_hint != 0 {
                writeln!(f, "IN_OBJECT {}", filter.in_object_hint)?;
            }
            writeln!(
                f,
                "OUT_OBJECT {} {}",
                filter.output_kind.as_token(),
                filter.output_hint
            )?;
            writeln!(f)?;
        }
        Ok(())
    }
}
