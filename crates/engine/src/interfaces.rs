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

//! Seams to the collaborators the coordinator drives: script engines and the observer.

use sdb_common::{BreakType, Breakpoint, DebugInformation, EngineId, Program, SessionId};

/// An instrumented script engine.
///
/// The engine itself calls [`Coordinator::process`](crate::Coordinator::process)
/// (or `notify` + `wait`) from its execution thread: with
/// [`BreakType::Step`] at statement boundaries while instrumentation is on, and
/// with [`BreakType::Break`] at statements matching its breakpoint list or at an
/// explicit break in script code.
pub trait ScriptEngine: Send + Sync {
    /// Stable identity of this engine instance.
    fn id(&self) -> EngineId;

    /// Turns statement-boundary instrumentation on or off.
    fn set_debug_mode(&self, enabled: bool);

    /// Replaces the engine's breakpoint list, consulted by its instrumentation.
    fn load_breakpoints(&self, breakpoints: &[Breakpoint]);
}

/// The debugger surface that presents pauses and issues resume commands.
///
/// Callbacks run after the coordinator has released its lock, so an observer may
/// call back into the coordinator. They arrive one at a time in the order the
/// coordinator decided them, on the thread of whichever coordinator caller is
/// delivering at that moment. They should hand work off to the observer's own
/// thread rather than block.
pub trait Observer: Send + Sync {
    /// Bring the surface to the front; called before a pause is reported.
    fn activate(&self) {}

    /// A session was created for a program seen for the first time.
    fn session_opened(&self, _session: SessionId, _program: &Program) {}

    /// A script thread is suspended in `session` awaiting a resume command.
    fn paused(&self, session: SessionId, info: &DebugInformation, reason: BreakType);

    /// The suspended script thread of `session` has been released.
    fn resumed(&self, _session: SessionId) {}

    /// The session was closed and its key released.
    fn session_closed(&self, _session: SessionId) {}
}
