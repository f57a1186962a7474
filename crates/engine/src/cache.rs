// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change-driven execution cache.
//!
//! `check` answers "does this hook need to run?" by comparing the files
//! this session touched against the baseline recorded by `track` after
//! the last successful run. The candidate set is always session-scoped:
//! `--all-files` bypasses the cache wholesale rather than widening it.
//! The cache is advisory: any error reads as "has changes" so corruption
//! can only cause extra work, never a false skip.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use glob::Pattern;
use han_core::SessionId;
use han_storage::{hash_command, CacheEntry, CacheStore, SessionChangeLog, StateDir};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::discovery::EXCLUDED_DIRS;
use crate::hash::hash_file;

/// One cache question or commit.
pub struct CacheQuery<'a> {
    pub plugin: &'a str,
    pub hook: &'a str,
    pub directory: &'a Path,
    /// Empty patterns mean "every session-changed file under the
    /// directory".
    pub patterns: &'a [String],
    pub command: &'a str,
    pub session: &'a SessionId,
}

/// Change detector over the durable cache store.
pub struct ChangeCache {
    store: CacheStore,
    changes: SessionChangeLog,
    warned: AtomicBool,
}

impl ChangeCache {
    pub fn new(state: StateDir) -> Self {
        Self {
            store: CacheStore::new(state.clone()),
            changes: SessionChangeLog::new(state),
            warned: AtomicBool::new(false),
        }
    }

    /// Returns true iff the hook needs to run.
    pub fn check(&self, query: &CacheQuery<'_>) -> bool {
        match self.check_inner(query) {
            Ok(needs_run) => needs_run,
            Err(e) => {
                // One warning per orchestration; the cache must never
                // block execution.
                if !self.warned.swap(true, Ordering::Relaxed) {
                    warn!(error = %e, "hook cache unreadable, treating as changed");
                    eprintln!("warning: hook cache unreadable, re-running hooks");
                }
                true
            }
        }
    }

    fn check_inner(&self, query: &CacheQuery<'_>) -> Result<bool, CacheCheckError> {
        let Some(entry) = self
            .store
            .load(query.plugin, query.hook, query.directory)?
        else {
            debug!(plugin = query.plugin, hook = query.hook, "no cache baseline");
            return Ok(true);
        };

        if entry.command_hash != hash_command(query.command) {
            debug!(plugin = query.plugin, hook = query.hook, "command changed");
            return Ok(true);
        }

        // Only files this session touched can trigger a run. The baseline
        // may hold more files (earlier sessions, wider tracks); those
        // never force work on their own.
        let session_set = self.changes.read_set(query.session)?;
        let patterns = compile_patterns(query.patterns);
        for path in &session_set {
            let Ok(rel) = path.strip_prefix(query.directory) else {
                continue;
            };
            let rel_str = rel.to_string_lossy().to_string();
            if !matches_any(&patterns, &rel_str) {
                continue;
            }
            match hash_file(path) {
                Ok(hash) => {
                    if entry.files.get(&rel_str) != Some(&hash) {
                        return Ok(true);
                    }
                }
                // Deleted since the baseline recorded it
                Err(_) => {
                    if entry.files.contains_key(&rel_str) {
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }

    /// The session's full change set (absolute paths).
    pub fn session_set(
        &self,
        session: &SessionId,
    ) -> Result<BTreeSet<PathBuf>, CacheCheckError> {
        Ok(self.changes.read_set(session)?)
    }

    /// Record the current state as the new baseline after a successful run.
    pub fn track(&self, query: &CacheQuery<'_>) -> Result<(), CacheCheckError> {
        let files = self.session_candidates(query)?;
        let entry = CacheEntry::new(files, hash_command(query.command), query.session.clone());
        self.store
            .save(query.plugin, query.hook, query.directory, &entry)?;
        Ok(())
    }

    /// Session-changed files under the query directory that match its
    /// patterns, relative to the directory, hashed.
    fn session_candidates(
        &self,
        query: &CacheQuery<'_>,
    ) -> Result<BTreeMap<String, String>, CacheCheckError> {
        let patterns = compile_patterns(query.patterns);
        let session_set = self.changes.read_set(query.session)?;

        let mut files = BTreeMap::new();
        for path in &session_set {
            let Ok(rel) = path.strip_prefix(query.directory) else {
                continue;
            };
            let rel_str = rel.to_string_lossy().to_string();
            if !matches_any(&patterns, &rel_str) {
                continue;
            }
            // Deleted files drop out of the baseline; a later check sees
            // their hashes as missing, not stale.
            if let Ok(hash) = hash_file(path) {
                files.insert(rel_str, hash);
            }
        }
        Ok(files)
    }
}

/// Hash every file under `directory` matching `patterns`, keyed by
/// relative path. Used by the hash-cycle detector, whose keys always
/// carry the hook's `if_changed` patterns; empty patterns match
/// everything, consistent with the cache's candidate filtering.
pub fn snapshot_files(
    directory: &Path,
    patterns: &[String],
) -> std::io::Result<BTreeMap<String, String>> {
    let patterns = compile_patterns(patterns);
    let mut files = BTreeMap::new();

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_excluded(e.path()))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let Ok(rel) = entry.path().strip_prefix(directory) else {
            continue;
        };
        let rel_str = rel.to_string_lossy().to_string();
        if !matches_any(&patterns, &rel_str) {
            continue;
        }
        let hash = hash_file(entry.path())?;
        files.insert(rel_str, hash);
    }

    Ok(files)
}

fn compile_patterns(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect()
}

/// An empty pattern list matches everything.
fn matches_any(patterns: &[Pattern], rel: &str) -> bool {
    patterns.is_empty() || patterns.iter().any(|p| p.matches(rel))
}

fn is_excluded(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| EXCLUDED_DIRS.contains(&name))
}

/// Internal cache failure; always degrades to "has changes".
#[derive(Debug, thiserror::Error)]
pub enum CacheCheckError {
    #[error("storage: {0}")]
    Storage(#[from] han_storage::StorageError),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
