// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attempt counters for repeatedly failing hooks
//!
//! One JSON map per session, keyed by `plugin/hook` + directory. A hook
//! that keeps failing eventually hits `max_attempts` and the orchestrator
//! stops retrying until the user raises the limit.

use std::collections::BTreeMap;
use std::path::Path;

use han_core::SessionId;
use serde::{Deserialize, Serialize};

use crate::fsutil::{load_json, save_json};
use crate::{StateDir, StorageError};

/// Default ceiling on consecutive failures before a hook is declared stuck.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Counter state for one `(plugin, hook, directory)` within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub consecutive_failures: u32,
    pub max_attempts: u32,
}

impl Default for AttemptRecord {
    fn default() -> Self {
        Self {
            consecutive_failures: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl AttemptRecord {
    /// Whether the hook has exhausted its attempts.
    pub fn is_stuck(&self) -> bool {
        self.consecutive_failures >= self.max_attempts
    }
}

/// Per-session attempt counter store.
pub struct AttemptStore {
    state: StateDir,
}

impl AttemptStore {
    pub fn new(state: StateDir) -> Self {
        Self { state }
    }

    fn key(plugin: &str, hook: &str, directory: &Path) -> String {
        format!("{}/{}:{}", plugin, hook, directory.display())
    }

    fn load_map(
        &self,
        session: &SessionId,
    ) -> Result<BTreeMap<String, AttemptRecord>, StorageError> {
        Ok(load_json(&self.state.attempts_path(session))?.unwrap_or_default())
    }

    fn save_map(
        &self,
        session: &SessionId,
        map: &BTreeMap<String, AttemptRecord>,
    ) -> Result<(), StorageError> {
        save_json(&self.state.attempts_path(session), map)
    }

    pub fn get(
        &self,
        session: &SessionId,
        plugin: &str,
        hook: &str,
        directory: &Path,
    ) -> Result<AttemptRecord, StorageError> {
        let map = self.load_map(session)?;
        Ok(map
            .get(&Self::key(plugin, hook, directory))
            .copied()
            .unwrap_or_default())
    }

    /// Increment the failure count, returning the updated record.
    pub fn record_failure(
        &self,
        session: &SessionId,
        plugin: &str,
        hook: &str,
        directory: &Path,
    ) -> Result<AttemptRecord, StorageError> {
        let mut map = self.load_map(session)?;
        let record = map.entry(Self::key(plugin, hook, directory)).or_default();
        record.consecutive_failures += 1;
        let updated = *record;
        self.save_map(session, &map)?;
        Ok(updated)
    }

    /// A successful run resets the counter to zero.
    pub fn reset(
        &self,
        session: &SessionId,
        plugin: &str,
        hook: &str,
        directory: &Path,
    ) -> Result<(), StorageError> {
        let mut map = self.load_map(session)?;
        let key = Self::key(plugin, hook, directory);
        if let Some(record) = map.get_mut(&key) {
            if record.consecutive_failures != 0 {
                record.consecutive_failures = 0;
                self.save_map(session, &map)?;
            }
        }
        Ok(())
    }

    /// Raise the ceiling for a stuck hook (explicit user consent path).
    pub fn set_max_attempts(
        &self,
        session: &SessionId,
        plugin: &str,
        hook: &str,
        directory: &Path,
        max_attempts: u32,
    ) -> Result<AttemptRecord, StorageError> {
        let mut map = self.load_map(session)?;
        let record = map.entry(Self::key(plugin, hook, directory)).or_default();
        record.max_attempts = max_attempts;
        let updated = *record;
        self.save_map(session, &map)?;
        Ok(updated)
    }
}

#[cfg(test)]
#[path = "attempts_tests.rs"]
mod tests;
