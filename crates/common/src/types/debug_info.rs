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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Program, ScopeId, SourceLocation, SourceRange};

/// A snapshot taken by the engine at one notification.
///
/// The scope stack is stored in the engine's native order, innermost frame
/// first. Call stack and variables are carried for display only and never take
/// part in a stepping decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugInformation {
    /// The program whose statement is about to execute.
    pub program: Program,
    /// Source span of the statement about to execute.
    pub current_statement: SourceRange,
    /// Active lexical and call frames, innermost first.
    pub scopes: Vec<ScopeId>,
    /// Human-readable call stack, innermost first.
    pub call_stack: Vec<String>,
    /// Rendered local variables visible at the statement.
    pub locals: BTreeMap<String, String>,
    /// Rendered global variables of the script.
    #[serde(default)]
    pub globals: BTreeMap<String, String>,
}

impl DebugInformation {
    /// Creates a snapshot with an empty call stack and no variables.
    pub fn new(program: Program, current_statement: SourceRange, scopes: Vec<ScopeId>) -> Self {
        Self {
            program,
            current_statement,
            scopes,
            call_stack: Vec::new(),
            locals: BTreeMap::new(),
            globals: BTreeMap::new(),
        }
    }

    /// Attaches a rendered call stack.
    pub fn with_call_stack(mut self, call_stack: impl IntoIterator<Item = String>) -> Self {
        self.call_stack = call_stack.into_iter().collect();
        self
    }

    /// Attaches rendered locals.
    pub fn with_locals(
        mut self,
        locals: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.locals = locals.into_iter().collect();
        self
    }

    /// Attaches rendered globals.
    pub fn with_globals(
        mut self,
        globals: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.globals = globals.into_iter().collect();
        self
    }

    /// Where the current statement starts; this is what breakpoints match against.
    pub fn location(&self) -> SourceLocation {
        self.current_statement.start
    }

    /// Scope depth at this notification.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// The scope stack reordered outermost first.
    pub fn scopes_outermost_first(&self) -> Vec<ScopeId> {
        self.scopes.iter().rev().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_order() {
        let (outer, middle, inner) = (ScopeId::next(), ScopeId::next(), ScopeId::next());
        let info = DebugInformation::new(
            Program::from("f();"),
            SourceRange::on_line(1, 0, 4),
            vec![inner, middle, outer],
        );

        assert_eq!(info.depth(), 3);
        assert_eq!(info.scopes_outermost_first(), vec![outer, middle, inner]);
        assert_eq!(info.location(), SourceLocation::new(1, 0));
    }

    #[test]
    fn test_display_payload() {
        let info = DebugInformation::new(
            Program::from("var a = 1;"),
            SourceRange::on_line(1, 0, 10),
            vec![ScopeId::next()],
        )
        .with_call_stack(["<global>".to_string()])
        .with_locals([("a".to_string(), "1".to_string())])
        .with_globals([("count".to_string(), "3".to_string())]);

        assert_eq!(info.call_stack, vec!["<global>".to_string()]);
        assert_eq!(info.locals.get("a").map(String::as_str), Some("1"));
        assert_eq!(info.globals.get("count").map(String::as_str), Some("3"));
        assert!(!info.locals.contains_key("count"));
    }

    #[test]
    fn test_globals_default_when_absent() {
        let info = DebugInformation::new(Program::from("a;"), SourceRange::on_line(1, 0, 2), vec![]);
        let mut value = serde_json::to_value(&info).unwrap();
        value.as_object_mut().unwrap().remove("globals");

        let decoded: DebugInformation = serde_json::from_value(value).unwrap();
        assert!(decoded.globals.is_empty());
        assert_eq!(decoded, info);
    }
}
