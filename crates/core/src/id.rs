// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ID newtypes and generation.
//!
//! Every han ID is a `String` newtype with a type-specific prefix stamped
//! onto locally minted values (`cli-…` sessions, `orc-…` orchestrations).
//! IDs handed to us by the harness are stored as-is; the prefix only
//! marks the ones this binary invented, so a bare ID in a log line or a
//! `--orchestration-id` argument is attributable to its origin.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Define a prefixed newtype ID wrapper around `String`.
///
/// Generates `new()` (verbatim, for harness-supplied values),
/// `generate()` (prefixed, for locally minted ones), `as_str()`,
/// `short()`, `Display`, `From`, and `PartialEq<str>` implementations.
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident, prefix $prefix:literal;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Prefix stamped onto locally generated IDs of this type.
            pub const PREFIX: &'static str = $prefix;

            /// Wrap an externally supplied ID verbatim.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Mint a fresh, prefixed ID.
            pub fn generate(idgen: &impl $crate::IdGen) -> Self {
                Self(format!("{}-{}", $prefix, idgen.next()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// At most the first `n` characters, for compact log lines.
            pub fn short(&self, n: usize) -> &str {
                match self.0.char_indices().nth(n) {
                    Some((cut, _)) => &self.0[..cut],
                    None => &self.0,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

/// Source of unique ID bodies (the part after the prefix).
pub trait IdGen: Clone + Send + Sync {
    fn next(&self) -> String;
}

/// Random UUIDs, the production generator.
#[derive(Clone, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic counter for tests: `p-1`, `p-2`, ...
#[derive(Clone)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
