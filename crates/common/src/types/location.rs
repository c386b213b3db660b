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

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A position in script source: 1-based line, 0-based character offset within the line.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[display("{line}:{column}")]
pub struct SourceLocation {
    /// Line number (1-based).
    pub line: usize,
    /// Character offset within the line (0-based).
    pub column: usize,
}

impl SourceLocation {
    /// Creates a location from a line and a character offset.
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// The source span of one statement, from its first to its last character.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[display("{start}-{stop}")]
pub struct SourceRange {
    /// Where the statement begins.
    pub start: SourceLocation,
    /// Where the statement ends.
    pub stop: SourceLocation,
}

impl SourceRange {
    /// Creates a range spanning `start` to `stop`.
    pub const fn new(start: SourceLocation, stop: SourceLocation) -> Self {
        Self { start, stop }
    }

    /// A statement that starts and ends on a single line.
    pub const fn on_line(line: usize, start_column: usize, stop_column: usize) -> Self {
        Self::new(SourceLocation::new(line, start_column), SourceLocation::new(line, stop_column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_ordering_is_line_major() {
        assert!(SourceLocation::new(2, 0) > SourceLocation::new(1, 40));
        assert!(SourceLocation::new(3, 4) < SourceLocation::new(3, 5));
    }

    #[test]
    fn test_range_display() {
        let range = SourceRange::on_line(5, 4, 18);
        assert_eq!(range.to_string(), "5:4-5:18");
    }
}
