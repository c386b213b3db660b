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

use std::{
    hash::{Hash, Hasher},
    sync::Arc,
};

use derive_more::Deref;
use serde::{Deserialize, Serialize};

/// The source text of one script, used as the identity of its debugging session.
///
/// Cloning is cheap (the text is shared). Two programs are equal when their
/// text is character-identical, regardless of which engine produced them.
#[derive(Debug, Clone, Deref, Serialize, Deserialize)]
#[deref(forward)]
pub struct Program(Arc<str>);

impl Program {
    /// Wraps a script's source text.
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self(source.into())
    }

    /// The full source text.
    pub fn source(&self) -> &str {
        &self.0
    }

    /// Number of lines as an editor would count them: an empty program has one
    /// line and a trailing newline opens a new, empty line.
    pub fn line_count(&self) -> usize {
        self.0.split('\n').count()
    }

    /// The text of a 1-based line, without its line terminator.
    pub fn line(&self, line: usize) -> Option<&str> {
        let index = line.checked_sub(1)?;
        self.0.split('\n').nth(index).map(|text| text.strip_suffix('\r').unwrap_or(text))
    }

    /// Whether both handles point at the same source buffer.
    pub fn shares_source(&self, other: &Program) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Program {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for Program {}

impl Hash for Program {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl From<&str> for Program {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for Program {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_program_identity_is_textual() {
        let a = Program::from("var x = 1;\nx++;");
        let b = Program::from(String::from("var x = 1;\nx++;"));
        let c = Program::from("var x = 2;\nx++;");

        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        assert!(set.insert(a.clone()));
        assert!(!set.insert(b));
        assert!(set.insert(c));

        assert!(a.shares_source(&a.clone()));
        assert!(!a.shares_source(&Program::from("var x = 1;\nx++;")));
    }

    #[test]
    fn test_program_lines() {
        let program = Program::from("first\r\n  second\nthird\n");

        assert_eq!(program.line_count(), 4);
        assert_eq!(program.line(1), Some("first"));
        assert_eq!(program.line(2), Some("  second"));
        assert_eq!(program.line(4), Some(""));
        assert_eq!(program.line(0), None);
        assert_eq!(program.line(5), None);
    }

    #[test]
    fn test_empty_program_has_one_line() {
        let program = Program::from("");
        assert_eq!(program.line_count(), 1);
        assert!(program.is_empty());
    }
}
