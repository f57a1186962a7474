// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State directory layout
//!
//! ```text
//! <state>/
//!   orchestrations/<id>.json
//!   pending/<id>.json
//!   hook_cache/<key>.json
//!   attempts/<session>.json
//!   sessions/<session>/file_changes.jsonl
//!   sessions/<session>/last_check.json
//!   orchestration_logs/<id>.log
//!   slot-locks/<key>.lock
//!   slotd.lock  slotd.pid  slotd.log  slotd.port
//! ```

use std::path::{Path, PathBuf};

use han_core::{OrchestrationId, SessionId};

use crate::StorageError;

/// Root of all persisted orchestrator state for one user.
#[derive(Debug, Clone)]
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    /// Resolve: `HAN_STATE_DIR` > `XDG_STATE_HOME/han` > `~/.local/state/han`.
    pub fn resolve() -> Result<Self, StorageError> {
        if let Ok(dir) = std::env::var("HAN_STATE_DIR") {
            return Ok(Self::at(PathBuf::from(dir)));
        }
        if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
            return Ok(Self::at(PathBuf::from(xdg).join("han")));
        }
        let home = std::env::var("HOME").map_err(|_| StorageError::NoStateDir)?;
        Ok(Self::at(PathBuf::from(home).join(".local/state/han")))
    }

    /// Use an explicit root (tests, `--state-dir` style overrides).
    pub fn at(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn orchestrations_dir(&self) -> PathBuf {
        self.root.join("orchestrations")
    }

    pub fn orchestration_path(&self, id: &OrchestrationId) -> PathBuf {
        self.orchestrations_dir().join(format!("{id}.json"))
    }

    pub fn pending_path(&self, id: &OrchestrationId) -> PathBuf {
        self.root.join("pending").join(format!("{id}.json"))
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("hook_cache")
    }

    pub fn attempts_path(&self, session: &SessionId) -> PathBuf {
        self.root.join("attempts").join(format!("{session}.json"))
    }

    pub fn session_dir(&self, session: &SessionId) -> PathBuf {
        self.root.join("sessions").join(session.as_str())
    }

    pub fn file_changes_path(&self, session: &SessionId) -> PathBuf {
        self.session_dir(session).join("file_changes.jsonl")
    }

    pub fn last_check_path(&self, session: &SessionId) -> PathBuf {
        self.session_dir(session).join("last_check.json")
    }

    pub fn run_log_path(&self, id: &OrchestrationId) -> PathBuf {
        self.root
            .join("orchestration_logs")
            .join(format!("{id}.log"))
    }

    pub fn slot_locks_dir(&self) -> PathBuf {
        self.root.join("slot-locks")
    }

    pub fn slotd_lock_path(&self) -> PathBuf {
        self.root.join("slotd.lock")
    }

    pub fn slotd_pid_path(&self) -> PathBuf {
        self.root.join("slotd.pid")
    }

    pub fn slotd_log_path(&self) -> PathBuf {
        self.root.join("slotd.log")
    }

    pub fn slotd_port_path(&self) -> PathBuf {
        self.root.join("slotd.port")
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
