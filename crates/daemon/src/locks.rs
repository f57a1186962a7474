// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Degraded-mode slot fallback.
//!
//! When the coordinator is unreachable the client falls back to advisory
//! file locks keyed by `(hook_name, plugin_name)`. Parallelism drops to
//! one slot per hook/plugin pair, but concurrent orchestrators still
//! cannot stampede the same hook.

use std::fs::{File, OpenOptions};
use std::path::PathBuf;

use fs2::FileExt;
use han_storage::StateDir;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::env;

/// A held fallback lock. Dropping the handle releases the lock.
pub struct FallbackLock {
    // NOTE(lifetime): held to maintain the exclusive flock; released on drop
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl FallbackLock {
    /// Stable lock-file key for a `(hook_name, plugin_name)` pair.
    pub fn key(hook_name: &str, plugin_name: Option<&str>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(hook_name.as_bytes());
        hasher.update([0]);
        hasher.update(plugin_name.unwrap_or("").as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Try to take the lock without blocking. `Ok(None)` when another
    /// process holds it.
    pub fn try_acquire(
        state: &StateDir,
        hook_name: &str,
        plugin_name: Option<&str>,
    ) -> std::io::Result<Option<FallbackLock>> {
        let dir = state.slot_locks_dir();
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.lock", Self::key(hook_name, plugin_name)));

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                if env::lock_debug() {
                    debug!(path = %path.display(), hook = hook_name, "fallback lock acquired");
                }
                Ok(Some(FallbackLock { file, path }))
            }
            Err(_) => Ok(None),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Drop for FallbackLock {
    fn drop(&mut self) {
        if env::lock_debug() {
            debug!(path = %self.path.display(), "fallback lock released");
        }
    }
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod tests;
