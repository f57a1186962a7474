// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session change sets
//!
//! Append-only log of absolute file paths the assistant's tools modified
//! during a session. Tool-invocation hooks append; the change cache reads
//! the full set to answer "which files changed since the session began?"

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use han_core::SessionId;
use serde::{Deserialize, Serialize};

use crate::fsutil::now_ms;
use crate::{StateDir, StorageError};

#[derive(Debug, Serialize, Deserialize)]
struct ChangeLine {
    path: PathBuf,
    at_ms: u64,
}

/// Append-only per-session change log (JSONL).
pub struct SessionChangeLog {
    state: StateDir,
}

impl SessionChangeLog {
    pub fn new(state: StateDir) -> Self {
        Self { state }
    }

    /// Append one modified path. Relative paths are recorded as given.
    pub fn append(&self, session: &SessionId, path: &Path) -> Result<(), StorageError> {
        let log_path = self.state.file_changes_path(session);
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        let line = serde_json::to_string(&ChangeLine {
            path: path.to_path_buf(),
            at_ms: now_ms(),
        })?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Read the deduplicated set of changed paths for a session.
    ///
    /// Unparsable lines are skipped: a torn write at the tail must not
    /// invalidate the rest of the log.
    pub fn read_set(&self, session: &SessionId) -> Result<BTreeSet<PathBuf>, StorageError> {
        let log_path = self.state.file_changes_path(session);
        let content = match std::fs::read_to_string(&log_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(content
            .lines()
            .filter_map(|line| serde_json::from_str::<ChangeLine>(line).ok())
            .map(|c| c.path)
            .collect())
    }
}

#[cfg(test)]
#[path = "session_changes_tests.rs"]
mod tests;
