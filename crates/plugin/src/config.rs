// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook manifest parsing (TOML)
//!
//! Each plugin ships a `hooks.toml` at its root declaring one or more hooks:
//!
//! ```toml
//! [hook.lint-eslint]
//! command = "eslint --fix ."
//! events = ["Stop", "SubagentStop"]
//! dirs_with = ["package.json"]
//! if_changed = ["**/*.ts", "**/*.tsx"]
//!
//! [[hook.lint-eslint.depends_on]]
//! plugin = "prettier"
//! hook = "format"
//! optional = true
//! ```

use std::collections::HashMap;

use han_core::HookEvent;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Manifest file name looked up at each plugin root.
pub const MANIFEST_FILE: &str = "hooks.toml";

/// Errors that can occur while loading a plugin manifest
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("hook \"{hook}\": {message}")]
    InvalidHook { hook: String, message: String },
}

/// A parsed plugin manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginManifest {
    #[serde(default, alias = "hooks")]
    pub hook: HashMap<String, HookDef>,
}

/// One declared hook
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookDef {
    /// Shell command to run.
    pub command: String,

    /// Events this hook answers to.
    pub events: Vec<HookEvent>,

    /// Restricts PreToolUse/PostToolUse/SubagentPrompt to these tools.
    #[serde(default, alias = "toolFilter")]
    pub tool_filter: Vec<String>,

    /// Marker filenames; the hook only applies in directories containing
    /// at least one. Empty means "the project root".
    #[serde(default, alias = "dirsWith")]
    pub dirs_with: Vec<String>,

    /// Probe command that must exit 0 for a candidate directory to qualify.
    #[serde(default, alias = "dirTest")]
    pub dir_test: Option<String>,

    /// Glob patterns; when present the hook is cacheable and skipped when
    /// none of the matching files changed.
    #[serde(default, alias = "ifChanged")]
    pub if_changed: Vec<String>,

    /// Explicit dependencies on other hooks. `"*"` is a wildcard in either
    /// field.
    #[serde(default, alias = "dependsOn")]
    pub depends_on: Vec<DependsOn>,

    /// Per-invocation timeout in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl HookDef {
    pub fn applies_to(&self, event: HookEvent) -> bool {
        self.events.contains(&event)
    }

    /// Tool filter check; an empty filter matches everything.
    pub fn matches_tool(&self, tool_name: Option<&str>) -> bool {
        if self.tool_filter.is_empty() {
            return true;
        }
        tool_name.is_some_and(|t| self.tool_filter.iter().any(|f| f == t))
    }

    /// Cacheable hooks declare `if_changed` patterns.
    pub fn is_cacheable(&self) -> bool {
        !self.if_changed.is_empty()
    }

    /// Whether any dependency entry uses a wildcard.
    pub fn has_wildcard_dep(&self) -> bool {
        self.depends_on.iter().any(DependsOn::is_wildcard)
    }
}

/// A dependency on another plugin's hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependsOn {
    pub plugin: String,
    pub hook: String,
    #[serde(default)]
    pub optional: bool,
}

impl DependsOn {
    pub fn is_wildcard(&self) -> bool {
        self.plugin == "*" || self.hook == "*"
    }

    /// Whether a task keyed `(plugin, hook)` satisfies this entry.
    pub fn matches(&self, plugin: &str, hook: &str) -> bool {
        (self.plugin == "*" || self.plugin == plugin) && (self.hook == "*" || self.hook == hook)
    }
}

/// Parse a manifest and validate per-hook basics.
pub fn parse_manifest(content: &str) -> Result<PluginManifest, ConfigError> {
    let manifest: PluginManifest = toml::from_str(content)?;

    for (name, def) in &manifest.hook {
        if def.command.trim().is_empty() {
            return Err(ConfigError::InvalidHook {
                hook: name.clone(),
                message: "command must not be empty".to_string(),
            });
        }
        if def.events.is_empty() {
            return Err(ConfigError::InvalidHook {
                hook: name.clone(),
                message: "events must not be empty".to_string(),
            });
        }
    }

    Ok(manifest)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
