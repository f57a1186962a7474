// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized hook tasks.
//!
//! A task pairs one hook definition with the concrete directories it will
//! run in for one event invocation.

use std::fmt;
use std::path::PathBuf;

use han_core::Phase;
use han_plugin::HookDef;

/// Identity of a hook within one orchestration: `(plugin, hook)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub plugin: String,
    pub hook: String,
}

impl TaskKey {
    pub fn new(plugin: impl Into<String>, hook: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            hook: hook.into(),
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.plugin, self.hook)
    }
}

/// One hook paired with the directories it will run in.
#[derive(Debug, Clone)]
pub struct HookTask {
    pub plugin_name: String,
    pub plugin_root: PathBuf,
    pub hook_name: String,
    pub def: HookDef,
    pub dirs: Vec<PathBuf>,
}

impl HookTask {
    pub fn key(&self) -> TaskKey {
        TaskKey::new(&self.plugin_name, &self.hook_name)
    }

    /// Phase inferred from the hook name.
    pub fn phase(&self) -> Phase {
        Phase::infer(&self.hook_name)
    }

    /// Tasks with a wildcard dependency are scheduled into the
    /// post-validation group.
    pub fn has_wildcard_dep(&self) -> bool {
        self.def.has_wildcard_dep()
    }
}
