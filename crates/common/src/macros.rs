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

//! Path-based conditional assertion macros and the universal id macro for SDB
//!
//! The assertion macros can be selectively enabled at runtime based on module
//! paths using the `SDB_ASSERT` environment variable, similar to how `RUST_LOG`
//! controls logging. They guard the coordinator's internal invariants (at most
//! one pending continuation per session, a dispatching session always exists)
//! without taxing every statement notification in production.
//!
//! # Environment Variable Syntax
//!
//! - **Enable all assertions**: `SDB_ASSERT=*` or `SDB_ASSERT=all`
//! - **Enable specific crate**: `SDB_ASSERT=sdb_engine` (the crate and its submodules)
//! - **Enable specific module**: `SDB_ASSERT=sdb_engine::coordinator`
//! - **Multiple targets**: `SDB_ASSERT=sdb_engine::coordinator,sdb_common::types`
//!
//! When `SDB_ASSERT` is not set or empty, all assertions are **disabled**.
//!
//! # Usage in Code
//!
//! ```ignore
//! use sdb_common::{sdb_assert, sdb_assert_eq};
//!
//! fn dispatch(pending: Option<u32>) {
//!     sdb_assert!(pending.is_none(), "a continuation is already pending");
//! }
//! ```

use once_cell::sync::Lazy;
use std::env;

#[doc(hidden)]
pub use lazy_static;
#[doc(hidden)]
pub use parking_lot;
#[doc(hidden)]
pub use paste;

/// Global storage for assertion target patterns from the SDB_ASSERT environment variable
static ASSERTION_TARGETS: Lazy<Vec<String>> =
    Lazy::new(|| match env::var(crate::env::SDB_ASSERT) {
        Ok(val) if !val.is_empty() => {
            val.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
        }
        _ => Vec::new(),
    });

/// Check if assertions are enabled for the given module path
///
/// - If no targets are configured (empty `SDB_ASSERT`), returns `false`
/// - If any target is `"*"` or `"all"`, returns `true` for all modules
/// - Otherwise, returns `true` if the module path starts with any configured target
pub fn is_assertion_enabled(module_path: &str) -> bool {
    targets_match(&ASSERTION_TARGETS, module_path)
}

fn targets_match(targets: &[String], module_path: &str) -> bool {
    targets.iter().any(|target| {
        target == "*" || target == "all" || module_path.starts_with(target.as_str())
    })
}

/// Marked cold to hint that an enabled assertion check is the unlikely path
#[cold]
#[inline(never)]
pub fn cold_path() {}

/// Assert a condition only when enabled via `SDB_ASSERT` environment variable.
///
/// # Examples
///
/// ```ignore
/// use sdb_common::sdb_assert;
///
/// let value = 42;
/// sdb_assert!(value == 42);
/// sdb_assert!(value == 42, "value should be 42, got {}", value);
/// ```
#[macro_export]
macro_rules! sdb_assert {
    ($($arg:tt)*) => {
        if $crate::macros::is_assertion_enabled(module_path!()) {
            $crate::macros::cold_path();
            assert!($($arg)*);
        }
    };
}

/// Assert two expressions are equal only when enabled via `SDB_ASSERT`.
#[macro_export]
macro_rules! sdb_assert_eq {
    ($($arg:tt)*) => {
        if $crate::macros::is_assertion_enabled(module_path!()) {
            $crate::macros::cold_path();
            assert_eq!($($arg)*);
        }
    };
}

/// Declares a process-unique, copyable handle type backed by a global counter.
///
/// Handles are compared by value, which makes them suitable for identity
/// comparison of things the debugger only observes (scope frames, engines,
/// sessions). The invoking crate must depend on `serde`.
///
/// ```ignore
/// sdb_common::universal_id! {
///     /// Identifies one lexical or call frame.
///     ScopeId => 1
/// }
///
/// let a = ScopeId::next();
/// let b = ScopeId::next();
/// assert_ne!(a, b);
/// ```
#[macro_export]
macro_rules! universal_id {
    (
        $(#[$attr:meta])*
        $name:ident => $initial_value:expr
    ) => {
        $(#[$attr])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        pub struct $name(u64);

        $crate::macros::paste::paste! {
            $crate::macros::lazy_static::lazy_static! {
                #[doc = "The global counter for the " $name " handle."]
                #[allow(non_upper_case_globals)]
                static ref [<NEXT_ $name>]: $crate::macros::parking_lot::Mutex<u64> =
                    $crate::macros::parking_lot::Mutex::new($initial_value);
            }

            impl $name {
                /// Get the next value and increment the global counter.
                pub fn next() -> Self {
                    let mut counter = [<NEXT_ $name>].lock();
                    let value = *counter;
                    *counter += 1;
                    Self(value)
                }
            }
        }

        impl From<$name> for u64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: ASSERTION_TARGETS is cached on first use, so these tests exercise
    // the matching logic directly rather than mutating SDB_ASSERT.
    //
    // To run with assertions enabled:
    //   SDB_ASSERT=sdb_common::macros cargo test -p sdb-common macros --lib

    #[test]
    fn test_targets_match_wildcards() {
        assert!(targets_match(&["*".to_string()], "sdb_engine::coordinator"));
        assert!(targets_match(&["all".to_string()], "anything"));
        assert!(!targets_match(&[], "sdb_engine"));
    }

    #[test]
    fn test_targets_match_prefixes() {
        let targets = ["sdb_engine::coordinator".to_string(), "sdb_common::types".to_string()];

        assert!(targets_match(&targets, "sdb_engine::coordinator"));
        assert!(targets_match(&targets, "sdb_engine::coordinator::tests"));
        assert!(targets_match(&targets, "sdb_common::types::breakpoint"));
        assert!(!targets_match(&targets, "sdb_engine::continuation"));
        assert!(!targets_match(&targets, "sdb_common"));
    }

    #[test]
    fn test_macro_syntax_variations() {
        // These are no-ops unless SDB_ASSERT selects this module, and hold either way.
        sdb_assert!(2 + 2 == 4);
        sdb_assert!(true, "message");
        sdb_assert!(true, "formatted {}", "message");
        sdb_assert_eq!(1, 1);
        sdb_assert_eq!(2, 2, "message");
        sdb_assert_eq!(3, 3, "formatted {}", "message");
    }

    #[test]
    fn test_is_assertion_enabled_current_module() {
        let current_module = module_path!();
        assert!(current_module.starts_with("sdb_common::macros"));

        let enabled = is_assertion_enabled(current_module);
        assert_eq!(is_assertion_enabled("sdb_common::macros::tests"), enabled);
    }

    crate::universal_id! {
        /// Id type used only by these tests.
        TestHandle => 7
    }

    #[test]
    fn test_universal_id_is_monotonic() {
        let first = TestHandle::next();
        let second = TestHandle::next();

        assert!(u64::from(first) >= 7);
        assert!(second > first);
        assert_eq!(TestHandle::from(u64::from(first)), first);
        assert_eq!(first.to_string(), u64::from(first).to_string());
    }
}
