// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validation phases and their fixed ordering.
//!
//! Hooks are grouped into phases inferred from the hook name. The ordering
//! is total: formatters run before linters, linters before typecheckers,
//! typecheckers before tests, everything else last.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category a hook belongs to, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Format,
    Lint,
    Typecheck,
    Test,
    Advisory,
}

impl Phase {
    /// All phases, in execution order.
    pub const ORDERED: [Phase; 5] = [
        Phase::Format,
        Phase::Lint,
        Phase::Typecheck,
        Phase::Test,
        Phase::Advisory,
    ];

    /// Infer the phase from a hook name by substring match.
    pub fn infer(hook_name: &str) -> Phase {
        let name = hook_name.to_ascii_lowercase();
        if name.contains("format") || name.contains("prettier") {
            Phase::Format
        } else if name.contains("lint") {
            Phase::Lint
        } else if name.contains("typecheck") || name.contains("tsc") {
            Phase::Typecheck
        } else if name.contains("test") {
            Phase::Test
        } else {
            Phase::Advisory
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Format => "format",
            Phase::Lint => "lint",
            Phase::Typecheck => "typecheck",
            Phase::Test => "test",
            Phase::Advisory => "advisory",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "phase_tests.rs"]
mod tests;
