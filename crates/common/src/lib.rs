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

//! SDB Common - Shared functionality for SDB components
//!
//! This crate provides the vocabulary shared by the execution core and every
//! host that embeds it: breakpoints, source locations, scope handles, debug
//! snapshots, and the logging and assertion helpers used across the workspace.

/// Common types used throughout the SDB ecosystem including breakpoints, scope handles, and debug snapshots
pub mod types;

/// Environment variable names recognised by SDB components
pub mod env;
/// Logging setup and utilities for consistent logging across SDB components
pub mod logging;
/// Runtime-selectable assertion macros and the universal id macro
pub mod macros;

pub use logging::*;
pub use types::*;
