// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hash-cycle detection.
//!
//! When two auto-fixers fight over the same file (A writes form X, B
//! writes form Y, A writes X again...) the file hashes oscillate. The
//! detector keeps a snapshot history per `(directory, patterns)` key and
//! flags any return to a previously seen state — before attempt counters
//! would catch the loop.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::cache::snapshot_files;

/// Snapshot of matched file hashes plus the task that produced it.
#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    files: BTreeMap<String, String>,
    /// `plugin/hook` of the producing task; `None` for the baseline.
    origin: Option<String>,
}

/// Evidence of an oscillation.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub directory: PathBuf,
    /// Origins of every snapshot in recorded order, oldest first.
    pub trace: Vec<String>,
}

/// Per-orchestration detector state.
#[derive(Default)]
pub struct HashCycleDetector {
    states: HashMap<(PathBuf, Vec<String>), Vec<Snapshot>>,
}

impl HashCycleDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current file hashes for a key, reporting a cycle when
    /// they equal a non-adjacent, non-latest prior snapshot.
    ///
    /// Adjacent equality (a no-op run) is not a cycle and is not recorded
    /// twice. IO errors skip recording — detection is best-effort.
    pub fn record(
        &mut self,
        directory: &Path,
        patterns: &[String],
        origin: Option<&str>,
    ) -> Option<CycleReport> {
        let files = snapshot_files(directory, patterns).ok()?;
        let key = (directory.to_path_buf(), patterns.to_vec());
        let history = self.states.entry(key).or_default();

        if let Some(latest) = history.last() {
            if latest.files == files {
                return None;
            }
        }

        // Content equality with any non-latest prior snapshot means the
        // files have come back to an earlier state after being modified
        // in between.
        let cycled = history
            .iter()
            .rev()
            .skip(1)
            .any(|prior| prior.files == files);

        history.push(Snapshot {
            files,
            origin: origin.map(str::to_string),
        });

        if cycled {
            Some(CycleReport {
                directory: directory.to_path_buf(),
                trace: history
                    .iter()
                    .map(|s| {
                        s.origin
                            .clone()
                            .unwrap_or_else(|| "(baseline)".to_string())
                    })
                    .collect(),
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "cycle_tests.rs"]
mod tests;
