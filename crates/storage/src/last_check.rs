// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Check-mode dedup state
//!
//! `--check` prints a full report only when the pending set differs from
//! the last reported one, or the last report is older than the dedup
//! window. Keyed per session so parallel sessions do not suppress each
//! other's reports.

use han_core::SessionId;
use serde::{Deserialize, Serialize};

use crate::fsutil::{load_json, now_ms, save_json};
use crate::{StateDir, StorageError};

/// How long an identical check report stays suppressed.
pub const DEDUP_WINDOW_MS: u64 = 5 * 60 * 1000;

#[derive(Debug, Serialize, Deserialize)]
struct LastCheck {
    digest: String,
    at_ms: u64,
}

/// Store of the last reported check digest per session.
pub struct LastCheckStore {
    state: StateDir,
}

impl LastCheckStore {
    pub fn new(state: StateDir) -> Self {
        Self { state }
    }

    /// Whether `digest` was already reported within the dedup window.
    pub fn is_duplicate(&self, session: &SessionId, digest: &str) -> Result<bool, StorageError> {
        let Some(last) = load_json::<LastCheck>(&self.state.last_check_path(session))? else {
            return Ok(false);
        };
        Ok(last.digest == digest && now_ms().saturating_sub(last.at_ms) < DEDUP_WINDOW_MS)
    }

    /// Record `digest` as the most recent report.
    pub fn record(&self, session: &SessionId, digest: &str) -> Result<(), StorageError> {
        save_json(
            &self.state.last_check_path(session),
            &LastCheck {
                digest: digest.to_string(),
                at_ms: now_ms(),
            },
        )
    }
}

#[cfg(test)]
#[path = "last_check_tests.rs"]
mod tests;
