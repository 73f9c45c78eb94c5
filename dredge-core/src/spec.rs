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

//! FilterSpec parser
//!
//! Line-oriented text format describing a filter pipeline:
//!
//! ```text
//! FILTER rgb
//! THRESHOLD 1
//! EVAL_FUNCTION f_eval_rgb
//! OUT_OBJECT COPY_ATTR 16384
//!
//! FILTER face                 # depends on decoded pixels
//! THRESHOLD 50
//! MERIT 10
//! EVAL_FUNCTION f_eval_face
//! ARG --min-size=24
//! REQUIRES rgb
//! ```
//!
//! Directive keywords are case-sensitive; `#` starts a comment; blank
//! lines are ignored; a `FILTER` line opens a record and the attribute
//! directives that follow belong to it. Unknown directives are fatal and
//! name the offending text.
//!
//! The parser is single-pass and re-entrant: all state lives in the parse
//! context, so multiple specs may be parsed concurrently.

use crate::error::{DredgeError, Result};
use crate::filter::{Filter, FilterTable, OutputKind, MAX_DEPS, MAX_FUNC, MAX_NAME};

/// Parse a complete spec text into a resolved `FilterTable`.
pub fn parse_spec(text: &str) -> Result<FilterTable> {
    let mut ctx = ParseContext::new();
    for line in text.lines() {
        ctx.line(line)?;
    }
    ctx.finish()
}

/// Incremental parser state; one per spec, nothing global.
struct ParseContext {
    table: FilterTable,
    current: Option<Filter>,
    line_no: usize,
}

impl ParseContext {
    fn new() -> Self {
        Self {
            table: FilterTable::new(),
            current: None,
            line_no: 0,
        }
    }

    fn err(&self, reason: impl Into<String>) -> DredgeError {
        DredgeError::InvalidSpec {
            line: self.line_no,
            reason: reason.into(),
        }
    }

    /// Feed one line.
    fn line(&mut self, line: &str) -> Result<()> {
        self.line_no += 1;

        // Strip comment and surrounding whitespace.
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        let (keyword, rest) = match line.find(|c: char| c == ' ' || c == '\t') {
            Some(pos) => (&line[..pos], line[pos..].trim()),
            None => (line, ""),
        };

        match keyword {
            "FILTER" => self.open_filter(rest),
            "THRESHHOLD" => Err(self.err(
                "legacy directive 'THRESHHOLD': rename it to 'THRESHOLD'",
            )),
            "THRESHOLD" => {
                let value = self.parse_int(rest)?;
                self.filter_mut()?.threshold = value;
                Ok(())
            }
            "MERIT" => {
                let value = self.parse_int(rest)?;
                self.filter_mut()?.merit = value;
                Ok(())
            }
            "EVAL_FUNCTION" => {
                let name = self.parse_ident(rest)?;
                self.filter_mut()?.eval_fn = Some(name);
                Ok(())
            }
            "INIT_FUNCTION" => {
                let name = self.parse_ident(rest)?;
                self.filter_mut()?.init_fn = Some(name);
                Ok(())
            }
            "FINI_FUNCTION" => {
                let name = self.parse_ident(rest)?;
                self.filter_mut()?.fini_fn = Some(name);
                Ok(())
            }
            "ARG" => {
                if rest.is_empty() {
                    return Err(self.err("ARG requires a token"));
                }
                let arg = rest.to_string();
                self.filter_mut()?.args.push(arg);
                Ok(())
            }
            "REQUIRES" => {
                if rest.is_empty() {
                    return Err(self.err("REQUIRES requires a filter name"));
                }
                let dep = rest.to_string();
                let line = self.line_no;
                let filter = self.filter_mut()?;
                if filter.dependencies.len() >= MAX_DEPS {
                    return Err(DredgeError::InvalidSpec {
                        line,
                        reason: format!("more than {} REQUIRES entries", MAX_DEPS),
                    });
                }
                filter.dependencies.push(dep);
                Ok(())
            }
            "IN_OBJECT" => {
                let value = self.parse_uint(rest)?;
                self.filter_mut()?.in_object_hint = value;
                Ok(())
            }
            "OUT_OBJECT" => {
                let mut parts = rest.split_whitespace();
                let kind_token = parts
                    .next()
                    .ok_or_else(|| self.err("OUT_OBJECT requires a type"))?;
                let kind = OutputKind::parse_token(kind_token).ok_or_else(|| {
                    self.err(format!("unknown OUT_OBJECT type '{}'", kind_token))
                })?;
                let hint = match parts.next() {
                    Some(token) => self.parse_uint(token)?,
                    None => 0,
                };
                if let Some(extra) = parts.next() {
                    return Err(self.err(format!(
                        "trailing token '{}' after OUT_OBJECT",
                        extra
                    )));
                }
                let filter = self.filter_mut()?;
                filter.output_kind = kind;
                filter.output_hint = hint;
                Ok(())
            }
            other => Err(self.err(format!("unknown directive '{}'", other))),
        }
    }

    /// Close out the spec: push the open record and resolve the table.
    fn finish(mut self) -> Result<FilterTable> {
        if let Some(filter) = self.current.take() {
            self.table.push(filter)?;
        }
        if self.table.is_empty() {
            return Err(self.err("spec contains no FILTER"));
        }
        self.table.resolve()?;
        Ok(self.table)
    }

    fn open_filter(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(self.err("FILTER requires a name"));
        }
        if name.len() > MAX_NAME {
            return Err(self.err(format!(
                "filter name '{}' exceeds {} characters",
                name, MAX_NAME
            )));
        }
        if name.split_whitespace().count() != 1 {
            return Err(self.err(format!("filter name '{}' contains whitespace", name)));
        }
        if let Some(prev) = self.current.take() {
            self.table.push(prev)?;
        }
        self.current = Some(Filter::new(name));
        Ok(())
    }

    fn filter_mut(&mut self) -> Result<&mut Filter> {
        let line = self.line_no;
        self.current.as_mut().ok_or(DredgeError::InvalidSpec {
            line,
            reason: "attribute directive before any FILTER".into(),
        })
    }

    fn parse_int(&self, token: &str) -> Result<i32> {
        token
            .parse()
            .map_err(|_| self.err(format!("expected an integer, found '{}'", token)))
    }

    fn parse_uint(&self, token: &str) -> Result<u64> {
        token
            .parse()
            .map_err(|_| self.err(format!("expected an unsigned integer, found '{}'", token)))
    }

    fn parse_ident(&self, token: &str) -> Result<String> {
        if token.is_empty() {
            return Err(self.err("expected an identifier"));
        }
        if token.len() > MAX_FUNC {
            return Err(self.err(format!(
                "identifier '{}' exceeds {} characters",
                token, MAX_FUNC
            )));
        }
        if token.split_whitespace().count() != 1 {
            return Err(self.err(format!("identifier '{}' contains whitespace", token)));
        }
        Ok(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_spec() {
        let table = parse_spec("FILTER A\nTHRESHOLD 5\nEVAL_FUNCTION a_eval\n").unwrap();
        assert_eq!(table.len(), 1);
        let f = table.get(0);
        assert_eq!(f.name, "A");
        assert_eq!(f.threshold, 5);
        assert_eq!(f.eval_fn.as_deref(), Some("a_eval"));
        assert!(f.dependencies.is_empty());
    }

    #[test]
    fn test_threshhold_typo_is_fatal() {
        let err = parse_spec("FILTER A\nTHRESHHOLD 3\n").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("THRESHHOLD"), "message was: {}", msg);
        assert!(msg.contains("THRESHOLD"), "message was: {}", msg);
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_unknown_directive_names_text() {
        let err = parse_spec("FILTER A\nFROBNICATE 9\n").unwrap_err();
        assert!(err.to_string().contains("FROBNICATE"));
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let spec = "\n# pipeline\nFILTER A   # terminal\n  THRESHOLD 2\n\n";
        let table = parse_spec(spec).unwrap();
        assert_eq!(table.get(0).threshold, 2);
    }

    #[test]
    fn test_attribute_before_filter() {
        let err = parse_spec("THRESHOLD 5\n").unwrap_err();
        assert!(err.to_string().contains("before any FILTER"));
    }

    #[test]
    fn test_tabs_between_directive_and_argument() {
        let table = parse_spec("FILTER A\nTHRESHOLD\t7\n").unwrap();
        assert_eq!(table.get(0).threshold, 7);
    }

    #[test]
    fn test_out_object_forms() {
        let table = parse_spec(
            "FILTER A\nOUT_OBJECT COPY_ATTR 4096\nFILTER B\nOUT_OBJECT NEW 128\nREQUIRES A\n",
        )
        .unwrap();
        assert_eq!(table.get(0).output_kind, OutputKind::CopyAttr);
        assert_eq!(table.get(0).output_hint, 4096);
        assert_eq!(table.get(1).output_kind, OutputKind::New);
        assert_eq!(table.get(1).dependencies, vec!["A".to_string()]);
    }

    #[test]
    fn test_application_detected() {
        let table = parse_spec("FILTER A\nFILTER APPLICATION\nREQUIRES A\n").unwrap();
        assert_eq!(table.application(), Some(1));
    }

    #[test]
    fn test_requires_cycle_is_fatal() {
        let err =
            parse_spec("FILTER A\nREQUIRES B\nFILTER B\nREQUIRES A\n").unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_pretty_print_roundtrip() {
        let spec = "FILTER rgb\nTHRESHOLD 1\nEVAL_FUNCTION f_eval_rgb\nARG --fast\n\
                    OUT_OBJECT COPY_ATTR 16384\nFILTER APPLICATION\nTHRESHOLD 50\n\
                    MERIT 3\nEVAL_FUNCTION f_eval_app\nINIT_FUNCTION f_init_app\n\
                    REQUIRES rgb\nIN_OBJECT 512\n";
        let table = parse_spec(spec).unwrap();
        let reparsed = parse_spec(&table.to_string()).unwrap();
        assert_eq!(reparsed.len(), table.len());
        for (a, b) in table.iter().zip(reparsed.iter()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.threshold, b.threshold);
            assert_eq!(a.merit, b.merit);
            assert_eq!(a.args, b.args);
            assert_eq!(a.eval_fn, b.eval_fn);
            assert_eq!(a.init_fn, b.init_fn);
            assert_eq!(a.fini_fn, b.fini_fn);
            assert_eq!(a.dependencies, b.dependencies);
            assert_eq!(a.in_object_hint, b.in_object_hint);
            assert_eq!(a.output_kind, b.output_kind);
            assert_eq!(a.output_hint, b.output_hint);
            assert_eq!(a.signature(), b.signature());
        }
        assert_eq!(reparsed.application(), table.application());
    }
}
