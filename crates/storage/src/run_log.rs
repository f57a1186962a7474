// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-orchestration log files
//!
//! Plain text, one file per orchestration, containing per-hook timestamps,
//! commands, captured output, and errors. Failure messages printed to the
//! assistant point here instead of inlining full command output.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use han_core::OrchestrationId;

use crate::{StateDir, StorageError};

/// Appending writer for one orchestration's log file.
pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    /// Create (or reopen) the log file for an orchestration.
    pub fn open(state: &StateDir, id: &OrchestrationId) -> Result<Self, StorageError> {
        let path = state.run_log_path(id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line. Logging failures are swallowed — the
    /// log is diagnostics, not control flow.
    pub fn line(&mut self, message: &str) {
        let ts = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        let _ = writeln!(self.file, "[{ts}] {message}");
    }

    /// Append a section header for one hook invocation.
    pub fn section(&mut self, plugin: &str, hook: &str, directory: &Path, command: &str) {
        self.line(&format!(
            "--- {}/{} in {} ---",
            plugin,
            hook,
            directory.display()
        ));
        self.line(&format!("$ {command}"));
    }

    /// Append captured output under the current section.
    pub fn output(&mut self, label: &str, content: &str) {
        if content.is_empty() {
            return;
        }
        for line in content.lines() {
            self.line(&format!("{label}: {line}"));
        }
    }
}

#[cfg(test)]
#[path = "run_log_tests.rs"]
mod tests;
