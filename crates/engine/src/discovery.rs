// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook discovery and matching.
//!
//! Given an event and a project root, walk every installed plugin's hook
//! definitions and materialize the tasks that apply: event match, tool
//! filter, marker directories, and `dir_test` probes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use han_core::HookEvent;
use han_plugin::{HookDef, InstalledPlugin};
use tokio::process::Command;
use tracing::debug;
use walkdir::WalkDir;

use crate::task::HookTask;

/// Directory names never considered when walking for markers.
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "target",
    "vendor",
    ".next",
    "coverage",
    "__pycache__",
    ".venv",
];

/// Cap on each `dir_test` probe.
pub const DIR_TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Inputs to one discovery pass.
pub struct DiscoverParams<'a> {
    pub event: HookEvent,
    pub tool_name: Option<&'a str>,
    pub project_root: &'a Path,
}

/// Find every hook task that applies to this event.
///
/// Tasks come back in plugin-load order; the scheduler reorders. A plugin
/// that errors during its walk simply contributes no candidates.
pub async fn discover_tasks(
    plugins: &[InstalledPlugin],
    params: &DiscoverParams<'_>,
) -> Vec<HookTask> {
    let mut tasks = Vec::new();

    for plugin in plugins {
        let mut hook_names: Vec<&String> = plugin.manifest.hook.keys().collect();
        hook_names.sort();

        for hook_name in hook_names {
            let def = &plugin.manifest.hook[hook_name];

            if !def.applies_to(params.event) {
                continue;
            }
            if params.event.takes_tool_filter() && !def.matches_tool(params.tool_name) {
                continue;
            }

            let mut dirs = candidate_dirs(def, params.project_root);
            if let Some(ref probe) = def.dir_test {
                dirs = filter_by_probe(dirs, probe).await;
            }
            if dirs.is_empty() {
                debug!(
                    plugin = plugin.name,
                    hook = hook_name,
                    "no qualifying directories, dropping hook"
                );
                continue;
            }

            tasks.push(HookTask {
                plugin_name: plugin.name.clone(),
                plugin_root: plugin.root.clone(),
                hook_name: hook_name.clone(),
                def: def.clone(),
                dirs,
            });
        }
    }

    tasks
}

/// Directories a hook applies to: the project root when no markers are
/// declared, otherwise every non-noise directory containing a marker.
fn candidate_dirs(def: &HookDef, project_root: &Path) -> Vec<PathBuf> {
    if def.dirs_with.is_empty() {
        return vec![project_root.to_path_buf()];
    }

    let mut dirs: Vec<PathBuf> = WalkDir::new(project_root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_excluded(entry.path()))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .filter(|entry| {
            def.dirs_with
                .iter()
                .any(|marker| entry.path().join(marker).exists())
        })
        .map(|entry| entry.into_path())
        .collect();
    dirs.sort();
    dirs
}

fn is_excluded(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| EXCLUDED_DIRS.contains(&name))
}

/// Retain directories where the probe exits 0 (5s cap, stdin closed,
/// output discarded).
async fn filter_by_probe(dirs: Vec<PathBuf>, probe: &str) -> Vec<PathBuf> {
    let mut kept = Vec::new();
    for dir in dirs {
        if run_probe(probe, &dir).await {
            kept.push(dir);
        }
    }
    kept
}

async fn run_probe(probe: &str, dir: &Path) -> bool {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(probe)
        .current_dir(dir)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .kill_on_drop(true);

    match tokio::time::timeout(DIR_TEST_TIMEOUT, cmd.status()).await {
        Ok(Ok(status)) => status.success(),
        Ok(Err(e)) => {
            debug!(dir = %dir.display(), error = %e, "dir_test failed to spawn");
            false
        }
        Err(_) => {
            debug!(dir = %dir.display(), "dir_test timed out");
            false
        }
    }
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
