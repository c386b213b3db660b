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

//! The process-wide "pause at the next statement" flag.

use std::{fmt, sync::Arc};

use sdb_common::universal_id;

universal_id! {
    /// Handle returned by [`BreakFlag::subscribe`], used to unsubscribe.
    SubscriptionId => 1
}

/// Callback invoked with the new flag value whenever it changes.
///
/// Listeners run on the thread that changed the flag while the coordinator's
/// lock is held: they must not block and must not call back into the
/// coordinator. Forward the value to your own thread instead.
pub type BreakListener = Arc<dyn Fn(bool) + Send + Sync>;

/// Whether a pause at the very next statement has been requested.
///
/// Raised by step commands and explicit break requests, cleared by the
/// coordinator on every dispatched notification. Every transition, and only a
/// transition, is reported to the subscribed listeners.
#[derive(Default)]
pub struct BreakFlag {
    requested: bool,
    listeners: Vec<(SubscriptionId, BreakListener)>,
}

impl fmt::Debug for BreakFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreakFlag")
            .field("requested", &self.requested)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl BreakFlag {
    /// A flag in the given initial state, with no listeners.
    pub fn new(requested: bool) -> Self {
        Self { requested, listeners: Vec::new() }
    }

    /// Current value.
    pub fn is_requested(&self) -> bool {
        self.requested
    }

    /// Sets the flag, notifying listeners if the value changed. Returns whether it changed.
    pub fn set(&mut self, requested: bool) -> bool {
        if self.requested == requested {
            return false;
        }
        self.requested = requested;
        for (_, listener) in &self.listeners {
            listener(requested);
        }
        true
    }

    /// Registers a change listener.
    pub fn subscribe(&mut self, listener: BreakListener) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.listeners.push((id, listener));
        id
    }

    /// Removes a listener; returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }
}
