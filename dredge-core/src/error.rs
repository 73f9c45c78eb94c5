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

//! Error types for Dredge

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DredgeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid filter spec (line {line}): {reason}")]
    InvalidSpec { line: usize, reason: String },

    #[error("filter '{filter}' requires unknown filter '{dependency}'")]
    MissingDependency { filter: String, dependency: String },

    #[error("circular REQUIRES chain involving filter '{0}'")]
    DependencyCycle(String),

    #[error("filter '{filter}' failed on object '{object}': {reason}")]
    FilterEval {
        filter: String,
        object: String,
        reason: String,
    },

    #[error("filter '{filter}' failed {count} consecutive objects")]
    FilterWedged { filter: String, count: u32 },

    #[error("collaborator unavailable after {attempts} attempts: {reason}")]
    CollaboratorUnavailable { attempts: u32, reason: String },

    #[error("search cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl DredgeError {
    /// Shorthand for a spec error that is not tied to a source line.
    pub fn spec(reason: impl Into<String>) -> Self {
        DredgeError::InvalidSpec {
            line: 0,
            reason: reason.into(),
        }
    }

    /// Process exit code for the CLI surface: 0 success, 1 fatal spec
    /// error, 2 runtime filter failure, 3 cancelled.
    pub fn exit_code(&self) -> i32 {
        match self {
            DredgeError::InvalidSpec { .. }
            | DredgeError::MissingDependency { .. }
            | DredgeError::DependencyCycle(_) => 1,
            DredgeError::Cancelled => 3,
            _ => 2,
        }
    }
}

pub type Result<T> = std::result::Result<T, DredgeError>;
