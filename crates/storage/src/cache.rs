// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook validation cache rows
//!
//! One row per `(plugin, hook, directory)` tuple: the file set the hook
//! last validated, a content hash per file, and the command hash at the
//! time of the last successful run. Rows are advisory — a stale or corrupt
//! row forces a re-run, never a false skip.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use han_core::SessionId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::fsutil::{load_json, now_ms, save_json};
use crate::{StateDir, StorageError};

/// Baseline recorded after a successful hook run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Relative file path → content hash.
    pub files: BTreeMap<String, String>,
    pub command_hash: String,
    pub session_id: SessionId,
    pub updated_at_ms: u64,
}

impl CacheEntry {
    pub fn new(
        files: BTreeMap<String, String>,
        command_hash: impl Into<String>,
        session_id: SessionId,
    ) -> Self {
        Self {
            files,
            command_hash: command_hash.into(),
            session_id,
            updated_at_ms: now_ms(),
        }
    }
}

/// Store of cache rows under `<state>/hook_cache/`.
pub struct CacheStore {
    state: StateDir,
}

impl CacheStore {
    pub fn new(state: StateDir) -> Self {
        Self { state }
    }

    /// Stable row key for a `(plugin, hook, directory)` tuple.
    pub fn row_key(plugin: &str, hook: &str, directory: &Path) -> String {
        let mut hasher = Sha256::new();
        hasher.update(plugin.as_bytes());
        hasher.update([0]);
        hasher.update(hook.as_bytes());
        hasher.update([0]);
        hasher.update(directory.to_string_lossy().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn row_path(&self, plugin: &str, hook: &str, directory: &Path) -> PathBuf {
        self.state
            .cache_dir()
            .join(format!("{}.json", Self::row_key(plugin, hook, directory)))
    }

    pub fn load(
        &self,
        plugin: &str,
        hook: &str,
        directory: &Path,
    ) -> Result<Option<CacheEntry>, StorageError> {
        load_json(&self.row_path(plugin, hook, directory))
    }

    pub fn save(
        &self,
        plugin: &str,
        hook: &str,
        directory: &Path,
        entry: &CacheEntry,
    ) -> Result<(), StorageError> {
        save_json(&self.row_path(plugin, hook, directory), entry)
    }

    /// Drop every row, returning how many were removed.
    pub fn clear(&self) -> Result<usize, StorageError> {
        let dir = self.state.cache_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        for entry in entries.filter_map(|e| e.ok()) {
            if std::fs::remove_file(entry.path()).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Hash a command string the way cache rows do.
pub fn hash_command(command: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(command.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
