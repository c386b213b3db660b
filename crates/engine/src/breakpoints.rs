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

//! Per-session breakpoint storage.

use std::collections::BTreeSet;

use sdb_common::{Breakpoint, SourceLocation};

use crate::{DebuggerError, DebuggerResult};

/// The breakpoints of one session, unique per `(line, column)` and kept in line order.
///
/// The registry is owned by its session and only touched under the
/// coordinator's lock, so it does no locking of its own.
#[derive(Debug, Clone, Default)]
pub struct BreakpointRegistry {
    breakpoints: BTreeSet<Breakpoint>,
}

impl BreakpointRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a breakpoint; returns false if it was already present
    pub fn add(&mut self, breakpoint: Breakpoint) -> bool {
        self.breakpoints.insert(breakpoint)
    }

    /// Remove a breakpoint; returns false if it was not present
    pub fn remove(&mut self, breakpoint: &Breakpoint) -> bool {
        self.breakpoints.remove(breakpoint)
    }

    /// Check if a breakpoint exists exactly at the given line and column
    pub fn contains(&self, line: usize, column: usize) -> bool {
        self.breakpoints.contains(&Breakpoint::new(line, column))
    }

    /// Check if any breakpoint sits on the given line
    pub fn has_line(&self, line: usize) -> bool {
        self.breakpoints
            .range(Breakpoint::new(line, 0)..=Breakpoint::new(line, usize::MAX))
            .next()
            .is_some()
    }

    /// Whether execution reaching `location` in a program of `line_count` lines hits a breakpoint.
    ///
    /// Breakpoints beyond the last line are stale: they stay in the registry but never match.
    pub fn matches(&self, location: SourceLocation, line_count: usize) -> bool {
        let candidate = Breakpoint::from(location);
        candidate.is_within(line_count) && self.breakpoints.contains(&candidate)
    }

    /// Add a breakpoint on `line` at the first character of `line_text` that
    /// can start a statement, i.e. neither whitespace nor `/`.
    ///
    /// Refused when the line already has a breakpoint or is blank or comment-only.
    pub fn add_at_line(&mut self, line: usize, line_text: &str) -> DebuggerResult<Breakpoint> {
        if self.has_line(line) {
            return Err(DebuggerError::BreakpointExists { line });
        }

        let column = line_text
            .chars()
            .position(|c| !c.is_whitespace() && c != '/')
            .ok_or(DebuggerError::NoBreakableColumn { line })?;

        let breakpoint = Breakpoint::new(line, column);
        self.breakpoints.insert(breakpoint);
        Ok(breakpoint)
    }

    /// Get all breakpoints ordered by line, then column
    pub fn all(&self) -> Vec<Breakpoint> {
        self.breakpoints.iter().copied().collect()
    }

    /// Remove every breakpoint
    pub fn clear(&mut self) {
        self.breakpoints.clear();
    }

    /// Get breakpoint count
    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    /// Whether no breakpoint is set
    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }
}

impl FromIterator<Breakpoint> for BreakpointRegistry {
    fn from_iter<T: IntoIterator<Item = Breakpoint>>(iter: T) -> Self {
        Self { breakpoints: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_remove_contains() {
        let mut registry = BreakpointRegistry::new();

        assert!(registry.add(Breakpoint::new(5, 4)));
        assert!(!registry.add(Breakpoint::new(5, 4)));
        assert!(registry.contains(5, 4));
        assert!(!registry.contains(5, 0));
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(&Breakpoint::new(5, 4)));
        assert!(!registry.remove(&Breakpoint::new(5, 4)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_all_is_ordered_by_line() {
        let registry: BreakpointRegistry =
            [Breakpoint::new(12, 0), Breakpoint::new(3, 8), Breakpoint::new(3, 2)]
                .into_iter()
                .collect();

        assert_eq!(
            registry.all(),
            vec![Breakpoint::new(3, 2), Breakpoint::new(3, 8), Breakpoint::new(12, 0)]
        );
    }

    #[test]
    fn test_has_line() {
        let mut registry = BreakpointRegistry::new();
        registry.add(Breakpoint::new(4, 6));

        assert!(registry.has_line(4));
        assert!(!registry.has_line(3));
        assert!(!registry.has_line(5));
    }

    #[test]
    fn test_stale_breakpoints_never_match() {
        let mut registry = BreakpointRegistry::new();
        registry.add(Breakpoint::new(2, 0));
        registry.add(Breakpoint::new(40, 0));

        assert!(registry.matches(SourceLocation::new(2, 0), 10));
        assert!(!registry.matches(SourceLocation::new(40, 0), 10));
        // Still tolerated and listed.
        assert_eq!(registry.len(), 2);
        assert!(registry.matches(SourceLocation::new(40, 0), 40));
    }

    #[test]
    fn test_add_at_line_skips_indentation_and_comment_slashes() {
        let mut registry = BreakpointRegistry::new();

        assert_eq!(registry.add_at_line(3, "    x = f(x);"), Ok(Breakpoint::new(3, 4)));
        assert_eq!(registry.add_at_line(7, "\t// note"), Ok(Breakpoint::new(7, 4)));
    }

    #[test]
    fn test_add_at_line_refusals() {
        let mut registry = BreakpointRegistry::new();
        registry.add(Breakpoint::new(3, 9));

        assert_eq!(
            registry.add_at_line(3, "    x = f(x);"),
            Err(DebuggerError::BreakpointExists { line: 3 })
        );
        assert_eq!(registry.add_at_line(4, "   "), Err(DebuggerError::NoBreakableColumn { line: 4 }));
        assert_eq!(registry.add_at_line(5, "  //"), Err(DebuggerError::NoBreakableColumn { line: 5 }));
        assert_eq!(registry.len(), 1);
    }
}
