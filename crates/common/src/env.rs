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

//! Environment variable name constants for SDB configuration.
//!
//! This module provides constant string names for all environment variables used by SDB.
//! These constants ensure consistency across the codebase and provide a single source of
//! truth for environment variable names.
//!
//! # Environment Variables
//!
//! ## Runtime Configuration
//! - [`SDB_ASSERT`] - Controls selective runtime assertion macros
//! - [`SDB_BREAK_ON_START`] - Pauses at the first statement of every attached engine
//! - [`SDB_ACTIVATE_OBSERVER`] - Controls whether the observer surface is raised on pause
//! - [`SDB_LOG_DIR`] - Overrides the directory used for file logging

/// Environment variable for controlling selective runtime assertions.
///
/// This variable enables fine-grained control over which assertion macros are active
/// at runtime, similar to how `RUST_LOG` controls logging. When set, it determines
/// which modules' assertions will be evaluated.
///
/// # Syntax
///
/// - `SDB_ASSERT=*` or `SDB_ASSERT=all` - Enable all assertions
/// - `SDB_ASSERT=sdb_engine` - Enable assertions in the `sdb_engine` crate and submodules
/// - `SDB_ASSERT=sdb_engine::coordinator` - Enable assertions in specific module and children
/// - `SDB_ASSERT=sdb_engine::coordinator,sdb_common::types` - Multiple targets (comma-separated)
///
/// # Default
///
/// When not set or empty, all assertions are **disabled**.
///
/// # Examples
///
/// ```bash
/// # Enable all assertions
/// SDB_ASSERT=* cargo test
///
/// # Enable assertions only in the engine crate
/// SDB_ASSERT=sdb_engine cargo test
/// ```
///
/// # Related
///
/// See [`crate::macros`] for the assertion macros that use this variable.
pub const SDB_ASSERT: &str = "SDB_ASSERT";

/// Environment variable requesting a pause at the very first statement.
///
/// When set to `1` or `true` (case-insensitive), a coordinator built with
/// `CoordinatorConfig::from_env` starts with its break-requested flag raised, so
/// the first statement notification of any engine surfaces to the observer.
///
/// # Default
///
/// Unset means execution runs freely until a breakpoint or an explicit break request.
pub const SDB_BREAK_ON_START: &str = "SDB_BREAK_ON_START";

/// Environment variable controlling whether the observer is activated on every pause.
///
/// Set to `0` or `false` to keep the observer surface where it is when a
/// notification is dispatched. Any other value, or leaving it unset, activates
/// the observer before the pause is reported.
pub const SDB_ACTIVATE_OBSERVER: &str = "SDB_ACTIVATE_OBSERVER";

/// Environment variable for the file logging directory.
///
/// When set, [`crate::logging::init_logging`] writes its rolling log files under
/// `<SDB_LOG_DIR>/<component>` instead of `<temp>/sdb-logs/<component>`.
///
/// # Examples
///
/// ```bash
/// SDB_LOG_DIR=/var/log/sdb ./host-app
/// ```
pub const SDB_LOG_DIR: &str = "SDB_LOG_DIR";
