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

//! One-shot rendezvous between a suspended script thread and its observer.
//!
//! A [`Continuation`] is created for every notification that reaches the
//! observer. The script thread blocks in [`Continuation::wait`]; the observer
//! (or a teardown path) releases it with [`Continuation::signal`].
//!
//! # Invariant
//!
//! A continuation that is waited on but never signaled blocks its script
//! thread forever. Nothing here detects that. The coordinator guarantees that
//! every pending continuation is signaled on resume, on session close and on
//! observer teardown.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct Gate {
    signaled: Mutex<bool>,
    opened: Condvar,
}

/// A cloneable handle to a single-use wait/signal gate.
///
/// All clones share one gate. Signaling is idempotent, and waiting after the
/// gate has been signaled returns immediately.
#[derive(Debug, Clone, Default)]
pub struct Continuation {
    gate: Arc<Gate>,
}

impl Continuation {
    /// A gate that has not been signaled yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A gate that is already open; waiting on it never blocks.
    pub fn signaled() -> Self {
        let continuation = Self::new();
        continuation.signal();
        continuation
    }

    /// Opens the gate, waking every current and future waiter. Safe from any thread.
    pub fn signal(&self) {
        let mut signaled = self.gate.signaled.lock();
        if !*signaled {
            *signaled = true;
            self.gate.opened.notify_all();
        }
    }

    /// Blocks the calling thread until the gate is opened.
    pub fn wait(&self) {
        let mut signaled = self.gate.signaled.lock();
        while !*signaled {
            self.gate.opened.wait(&mut signaled);
        }
    }

    /// Whether the gate has been opened.
    pub fn is_signaled(&self) -> bool {
        *self.gate.signaled.lock()
    }

    /// Whether two handles refer to the same gate.
    pub fn same_gate(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.gate, &other.gate)
    }
}
