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

//! Scope-stack based step filtering.
//!
//! While a step is in progress the engine reports every statement. Stepping
//! *into* stops at the first one. Stepping *over* or *out* must instead let the
//! engine run through deeper calls silently, and stop only once execution is
//! back at (or above) the frame the step started from, or has moved to a
//! different branch of the scope tree altogether.
//!
//! [`StepFilter`] remembers the scope stack captured when the step was armed
//! and compares each new stack against it. Stacks are compared outermost first,
//! frame by frame, by handle identity.

use sdb_common::{ScopeId, StepMode};

/// Whether a step notification should reach the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDecision {
    /// Suspend and report to the observer.
    Stop,
    /// Let the engine run on; the notification is inside a deeper call.
    Suppress,
}

/// Step filter state for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepFilter {
    /// Outermost first. `None` means every notification stops.
    allowed: Option<Vec<ScopeId>>,
}

impl StepFilter {
    /// A filter that stops everywhere.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the scope stack a step starts from.
    ///
    /// `scopes` is the engine's stack at the paused statement, innermost first.
    /// `Into` disarms the filter. `Out` drops the innermost frame so that the
    /// step completes in the caller; on a stack of depth one there is no caller
    /// and `Out` behaves like `Over`. An empty stack leaves the filter disarmed.
    pub fn arm(&mut self, mode: StepMode, scopes: &[ScopeId]) {
        if mode == StepMode::Into || scopes.is_empty() {
            self.allowed = None;
            return;
        }

        let mut allowed: Vec<ScopeId> = scopes.iter().rev().copied().collect();
        if mode == StepMode::Out && allowed.len() > 1 {
            allowed.pop();
        }
        self.allowed = Some(allowed);
    }

    /// Disarms the filter.
    pub fn reset(&mut self) {
        self.allowed = None;
    }

    /// Whether a step is being filtered.
    pub fn is_armed(&self) -> bool {
        self.allowed.is_some()
    }

    /// The captured stack, outermost first.
    pub fn allowed_scopes(&self) -> Option<&[ScopeId]> {
        self.allowed.as_deref()
    }

    /// Decides a step notification whose scope stack is `current`, innermost first.
    pub fn decide(&self, current: &[ScopeId]) -> StepDecision {
        let Some(allowed) = &self.allowed else {
            return StepDecision::Stop;
        };

        // Walking `current` in reverse visits it outermost first.
        let same_branch = current.iter().rev().zip(allowed).all(|(now, then)| now == then);
        if !same_branch || current.len() <= allowed.len() {
            StepDecision::Stop
        } else {
            StepDecision::Suppress
        }
    }
}
