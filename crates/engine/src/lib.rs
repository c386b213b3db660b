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

//! SDB Engine - execution control for instrumented script engines
//!
//! A script engine reports every statement boundary (and every explicit break)
//! to a [`Coordinator`]. The coordinator decides, per notification, whether the
//! script thread may run on or must suspend itself on a [`Continuation`] until
//! an observer (a debugger surface) resumes it with continue or one of the
//! step commands.
//!
//! # Components
//!
//! - [`Continuation`] - one-shot cross-thread rendezvous the script thread waits on
//! - [`BreakpointRegistry`] - per-session line/column breakpoints
//! - [`StepFilter`] - scope-stack comparison that implements step over and step out
//! - [`BreakFlag`] - process-wide "pause at the next statement" flag with listeners
//! - [`ProgramMap`] / [`Session`] - one debugging session per distinct source text
//! - [`Coordinator`] - the state machine tying these together
//!
//! # Threading
//!
//! Notifications arrive on script threads; commands arrive on the observer's
//! thread. At most one notification is dispatched at a time process-wide, and a
//! second notifying thread blocks until the first one has been resumed.

pub mod breakpoints;
pub use breakpoints::*;

pub mod break_flag;
pub use break_flag::*;

pub mod config;
pub use config::*;

pub mod continuation;
pub use continuation::*;

pub mod coordinator;
pub use coordinator::*;

pub mod error;
pub use error::*;

pub mod interfaces;
pub use interfaces::*;

pub mod session;
pub use session::*;

pub mod step_filter;
pub use step_filter::*;
