// SDB - Script Debugger
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
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

use std::{fmt::Display, str::FromStr};

use eyre::{bail, eyre, Error, Result};
use serde::{Deserialize, Serialize};

use crate::SourceLocation;

/// A suspend point requested ahead of time at a source line and character offset.
///
/// Breakpoints order by line first, so an ordered collection of them reads like
/// the source. A breakpoint whose line lies beyond the program's line count is
/// legal but never matches.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct Breakpoint {
    /// Line number in the program source (1-based).
    pub line: usize,
    /// Character offset within the line where the statement starts (0-based).
    pub column: usize,
}

impl Display for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl FromStr for Breakpoint {
    type Err = Error;

    /// Parses a breakpoint from a string.
    /// Format: `[@]<line>[:<column>]`, the column defaulting to 0.
    /// Examples:
    /// - `12` - Breakpoint at the start of line 12
    /// - `@5:4` - Breakpoint at line 5, character 4
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_prefix('@').unwrap_or(trimmed);
        if trimmed.is_empty() {
            bail!("Invalid breakpoint format. Expected [@]<line>[:<column>], got: {s:?}");
        }

        let (line_str, column_str) = match trimmed.split_once(':') {
            Some((line, column)) => (line.trim(), Some(column.trim())),
            None => (trimmed, None),
        };

        let line = line_str.parse::<usize>().map_err(|e| eyre!("Invalid line number: {e}"))?;
        if line == 0 {
            bail!("Line numbers are 1-based, got 0");
        }
        let column = match column_str {
            Some(column) => column.parse::<usize>().map_err(|e| eyre!("Invalid column: {e}"))?,
            None => 0,
        };

        Ok(Self { line, column })
    }
}

impl Breakpoint {
    /// Creates a breakpoint at the given line (1-based) and character offset (0-based).
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// The source location this breakpoint is attached to.
    pub const fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    /// Whether the breakpoint sits at `location`.
    pub fn is_at(&self, location: SourceLocation) -> bool {
        self.location() == location
    }

    /// Whether the breakpoint still refers to a line inside a program of `line_count` lines.
    pub fn is_within(&self, line_count: usize) -> bool {
        self.line <= line_count
    }
}

impl From<SourceLocation> for Breakpoint {
    fn from(location: SourceLocation) -> Self {
        Self::new(location.line, location.column)
    }
}
