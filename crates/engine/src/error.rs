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

//! Errors returned by observer-side commands.

use sdb_common::SessionId;
use thiserror::Error;

/// A command the coordinator refused to carry out.
///
/// Each of these is a caller mistake (resuming while nothing is paused,
/// addressing a session that was closed). The command is aborted and no state
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DebuggerError {
    /// A resume command arrived while no notification is being dispatched.
    #[error("no script is paused")]
    NotPaused,
    /// The session was never opened or has been closed.
    #[error("unknown session {0}")]
    UnknownSession(SessionId),
    /// A breakpoint already exists on the requested line.
    #[error("line {line} already has a breakpoint")]
    BreakpointExists {
        /// The line that was asked for.
        line: usize,
    },
    /// The requested line has no character a statement could start at.
    #[error("line {line} has no breakable character")]
    NoBreakableColumn {
        /// The line that was asked for.
        line: usize,
    },
    /// The requested line is outside the session's program.
    #[error("line {line} is outside the program ({line_count} lines)")]
    LineOutOfRange {
        /// The line that was asked for.
        line: usize,
        /// How many lines the program has.
        line_count: usize,
    },
}

/// Result alias for coordinator commands.
pub type DebuggerResult<T> = std::result::Result<T, DebuggerError>;
