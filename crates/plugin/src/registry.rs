// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Installed-plugin discovery
//!
//! A plugin is a directory containing a `hooks.toml` manifest. Plugins are
//! looked up under the project's `.han/plugins/` and the user-level
//! `~/.han/plugins/`; `HAN_PLUGIN_PATH` (colon-separated) overrides both.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{parse_manifest, PluginManifest, MANIFEST_FILE};

/// A plugin that was found and whose manifest parsed.
#[derive(Debug, Clone)]
pub struct InstalledPlugin {
    pub name: String,
    pub root: PathBuf,
    pub manifest: PluginManifest,
}

/// Directories searched for plugins, in load order.
pub fn plugin_search_dirs(project_root: &Path) -> Vec<PathBuf> {
    if let Ok(path) = std::env::var("HAN_PLUGIN_PATH") {
        return path
            .split(':')
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect();
    }

    let mut dirs = vec![project_root.join(".han/plugins")];
    if let Ok(home) = std::env::var("HOME") {
        dirs.push(PathBuf::from(home).join(".han/plugins"));
    }
    dirs
}

/// Discover every installed plugin with a parseable manifest.
///
/// Plugins that fail to parse are skipped (logged at debug) so one broken
/// manifest never takes down discovery for the rest. Load order is search
/// dir order, then directory name within each dir.
pub fn discover_plugins(project_root: &Path) -> Vec<InstalledPlugin> {
    discover_plugins_in(&plugin_search_dirs(project_root))
}

/// Discovery over an explicit search-dir list.
pub fn discover_plugins_in(dirs: &[PathBuf]) -> Vec<InstalledPlugin> {
    let mut plugins = Vec::new();

    for dir in dirs {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        let mut roots: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        roots.sort();

        for root in roots {
            let Some(name) = root.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            // First hit wins when the same plugin name appears in multiple
            // search dirs (project shadows user-level).
            if plugins.iter().any(|p: &InstalledPlugin| p.name == name) {
                continue;
            }
            match load_plugin(&root, name) {
                Some(plugin) => plugins.push(plugin),
                None => continue,
            }
        }
    }

    plugins
}

fn load_plugin(root: &Path, name: &str) -> Option<InstalledPlugin> {
    let manifest_path = root.join(MANIFEST_FILE);
    let content = match std::fs::read_to_string(&manifest_path) {
        Ok(content) => content,
        Err(e) => {
            debug!(plugin = name, error = %e, "no readable manifest, skipping");
            return None;
        }
    };

    match parse_manifest(&content) {
        Ok(manifest) => Some(InstalledPlugin {
            name: name.to_string(),
            root: root.to_path_buf(),
            manifest,
        }),
        Err(e) => {
            debug!(plugin = name, error = %e, "manifest failed to parse, skipping");
            None
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
