// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending-hook worklist
//!
//! `--check` populates rows under an orchestration ID; `--wait` with
//! `--orchestration-id` drains them. Rows outlive the process so a check
//! from one assistant turn can be executed in the next.

use std::path::PathBuf;

use han_core::OrchestrationId;
use serde::{Deserialize, Serialize};

use crate::fsutil::{load_json, save_json};
use crate::{StateDir, StorageError};

/// One queued hook execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingHook {
    pub plugin: String,
    pub hook: String,
    pub directory: PathBuf,
    pub command: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub if_changed: Vec<String>,
    /// Deferred rows are reported but only run after the main set passes.
    #[serde(default)]
    pub deferred: bool,
}

/// Store of pending-hook rows, keyed by orchestration ID.
pub struct PendingStore {
    state: StateDir,
}

impl PendingStore {
    pub fn new(state: StateDir) -> Self {
        Self { state }
    }

    pub fn save(
        &self,
        id: &OrchestrationId,
        hooks: &[PendingHook],
    ) -> Result<(), StorageError> {
        save_json(&self.state.pending_path(id), &hooks)
    }

    pub fn load(&self, id: &OrchestrationId) -> Result<Vec<PendingHook>, StorageError> {
        Ok(load_json(&self.state.pending_path(id))?.unwrap_or_default())
    }

    /// Remove the worklist once drained.
    pub fn delete(&self, id: &OrchestrationId) -> Result<(), StorageError> {
        match std::fs::remove_file(self.state.pending_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
