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

//! Coordinator configuration.
//!
//! Configuration can be built in code, read from the environment
//! ([`CoordinatorConfig::from_env`]) or parsed from a host application's TOML
//! settings ([`CoordinatorConfig::from_toml_str`]).

use std::env;

use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};

use sdb_common::env::{SDB_ACTIVATE_OBSERVER, SDB_BREAK_ON_START};

/// Settings for a [`Coordinator`](crate::Coordinator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Start with the break-requested flag raised, so the first statement pauses
    pub break_on_start: bool,
    /// Activate the observer surface before reporting each pause
    pub activate_observer: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self { break_on_start: false, activate_observer: true }
    }
}

impl CoordinatorConfig {
    /// Pause on the first statement or not
    pub fn with_break_on_start(mut self, enabled: bool) -> Self {
        self.break_on_start = enabled;
        self
    }

    /// Activate the observer on every pause or not
    pub fn with_activate_observer(mut self, enabled: bool) -> Self {
        self.activate_observer = enabled;
        self
    }

    /// Defaults overridden by [`SDB_BREAK_ON_START`] and [`SDB_ACTIVATE_OBSERVER`].
    ///
    /// Values are `1`/`true` or `0`/`false`, case-insensitive. Anything else is
    /// an error so that a typo does not silently change debugging behavior.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(value) = read_flag(SDB_BREAK_ON_START)? {
            config.break_on_start = value;
        }
        if let Some(value) = read_flag(SDB_ACTIVATE_OBSERVER)? {
            config.activate_observer = value;
        }
        Ok(config)
    }

    /// Parses the configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| eyre!("Invalid coordinator configuration: {e}"))
    }
}

fn read_flag(name: &str) -> Result<Option<bool>> {
    let Ok(raw) = env::var(name) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "1" | "true" => Ok(Some(true)),
        "0" | "false" => Ok(Some(false)),
        other => Err(eyre!("{name} must be true/false or 1/0, got {other:?}")),
    }
}
