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

/// Why a notification fired.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreakType {
    /// The engine hit a breakpoint or an explicit break request in script code.
    Break,
    /// The engine reached a statement boundary while stepping is armed.
    Step,
}

/// The stepping granularity an observer asks for when it resumes.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepMode {
    /// Stop at the very next statement, wherever it is.
    Into,
    /// Stop at the next statement that is not inside a deeper call.
    Over,
    /// Stop at the next statement after the current frame returns.
    Out,
}

/// What the observer decided to do with a paused engine.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResumeAction {
    /// Run until the next breakpoint or break request.
    Continue,
    /// Run until the step completes.
    #[display("Step{_0}")]
    Step(StepMode),
}

/// Commands available on a session, shown enabled or disabled by an observer.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// The session's program is running or idle; nothing to resume.
    #[default]
    Running,
    /// An engine thread is suspended in this session awaiting a decision.
    Paused,
}

impl SessionState {
    /// Whether "continue" is available.
    pub fn can_continue(&self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Whether the step commands are available.
    pub fn can_step(&self) -> bool {
        matches!(self, Self::Paused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_action_display() {
        assert_eq!(ResumeAction::Continue.to_string(), "Continue");
        assert_eq!(ResumeAction::Step(StepMode::Over).to_string(), "StepOver");
    }

    #[test]
    fn test_session_state_commands() {
        assert!(!SessionState::Running.can_continue());
        assert!(!SessionState::default().can_step());
        assert!(SessionState::Paused.can_continue());
        assert!(SessionState::Paused.can_step());
    }
}
