// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator driver: one invocation = one orchestration.
//!
//! The driver wires discovery, scheduling, caching, slots, execution, and
//! reporting into the check/wait pipeline the assistant drives. Exit
//! status is the contract: 0 nothing to do, 2 action required, 3 a hash
//! cycle, with internal errors surfacing as errors for the CLI to map to
//! exit 1.

mod check;
mod execute;
mod report;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use han_core::{HookEvent, HookPayload, OrchestrationId, SessionId};
use han_plugin::{discover_plugins, DependsOn, HookDef};
use han_storage::{OrchestrationRecord, OrchestrationStore, PendingStore, StateDir};
use tracing::{debug, warn};

use crate::cache::ChangeCache;
use crate::discovery::{discover_tasks, DiscoverParams};
use crate::env;
use crate::error::EngineError;
use crate::gate::{should_skip_for_questioning, TranscriptStore};
use crate::scheduler::schedule;
use crate::session::{record_tool_changes, resolve_session_id};
use crate::task::HookTask;

/// Safeguard ceiling for check mode (the harness gives us 30s).
pub const CHECK_SAFEGUARD_TIMEOUT: Duration = Duration::from_secs(25);

/// Flags for one orchestration.
#[derive(Debug, Clone)]
pub struct OrchestrateOptions {
    pub event: HookEvent,
    pub check: bool,
    pub wait: bool,
    pub orchestration_id: Option<OrchestrationId>,
    /// `--all-files` turns the change cache off.
    pub all_files: bool,
    /// On failure, finish the current batch but start no new ones.
    pub fail_fast: bool,
    pub verbose: bool,
    /// Tool name for `SubagentPrompt` filtering.
    pub tool_name: Option<String>,
    pub skip_if_questioning: bool,
    /// Overrides for tests and `-C`-style invocation; default to the
    /// environment and the current directory.
    pub state_dir: Option<PathBuf>,
    pub project_root: Option<PathBuf>,
}

impl OrchestrateOptions {
    /// Baseline flags for an event: wait-style execution, cache on,
    /// fail-fast on.
    pub fn for_event(event: HookEvent) -> Self {
        Self {
            event,
            check: false,
            wait: false,
            orchestration_id: None,
            all_files: false,
            fail_fast: true,
            verbose: false,
            tool_name: None,
            skip_if_questioning: false,
            state_dir: None,
            project_root: None,
        }
    }
}

/// Final disposition of an orchestration, as a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Nothing to do, or everything passed.
    Success,
    /// Hooks need to run or failed; the assistant must act.
    ActionRequired,
    /// Hash cycle detected; exiting to break the fix loop.
    Recursion,
}

impl ExitStatus {
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::ActionRequired => 2,
            ExitStatus::Recursion => 3,
        }
    }
}

/// Everything the check/execute paths share.
pub(crate) struct DriverCtx {
    pub options: OrchestrateOptions,
    pub state: StateDir,
    pub project_root: PathBuf,
    pub session: SessionId,
    pub cache: ChangeCache,
}

/// Run one orchestration end to end.
pub async fn orchestrate(
    options: OrchestrateOptions,
    stdin_payload: Option<String>,
) -> Result<ExitStatus, EngineError> {
    if env::hooks_disabled() {
        debug!("HAN_DISABLE_HOOKS set, exiting");
        return Ok(ExitStatus::Success);
    }

    // Recursion guard: a Stop orchestration spawned from inside a
    // wait-mode Stop execution must not orchestrate again.
    if options.event.is_stop_family() && env::stop_orchestrating() && !options.wait {
        debug!("already inside a stop orchestration, exiting");
        return Ok(ExitStatus::Success);
    }

    let state = match options.state_dir {
        Some(ref dir) => StateDir::at(dir.clone()),
        None => StateDir::resolve()?,
    };

    let project_root = resolve_project_root(&options)?;

    let payload = match stdin_payload {
        Some(ref raw) if !raw.trim().is_empty() => HookPayload::parse(raw, options.event)?,
        _ => HookPayload::synthetic(
            options.event,
            None,
            &project_root.to_string_lossy(),
        ),
    };

    let orch_store = OrchestrationStore::new(state.clone());
    let resumed = match options.orchestration_id {
        Some(ref id) => Some(orch_store.load(id)?),
        None => None,
    };

    let session = resolve_session_id(
        resumed.as_ref().and_then(|r| r.session_id.as_ref()),
        &payload,
        &state,
    );

    if options.event == HookEvent::PostToolUse {
        record_tool_changes(&payload, &session, &state);
    }

    if options.skip_if_questioning && options.event.is_stop_family() {
        if let Some(store) = TranscriptStore::for_session(&project_root, &session) {
            if should_skip_for_questioning(&store) {
                if options.verbose {
                    eprintln!("skipping hooks: conversation is waiting on the user");
                }
                return Ok(ExitStatus::Success);
            }
        }
    }

    let tasks = match resumed {
        Some(ref record) => reconstitute_tasks(&state, record, &project_root)?,
        None => {
            let plugins = discover_plugins(&project_root);
            let params = DiscoverParams {
                event: options.event,
                tool_name: options
                    .tool_name
                    .as_deref()
                    .or(payload.tool_name.as_deref()),
                project_root: &project_root,
            };
            discover_tasks(&plugins, &params).await
        }
    };

    if tasks.is_empty() {
        report::no_hooks(options.event);
        return Ok(ExitStatus::Success);
    }

    // Stop-family wildcard-dep hooks are the post-validation group: they
    // run inline after the main set passes and never block.
    let (main_tasks, deferred_tasks) = if options.event.is_stop_family() {
        split_deferred(tasks)
    } else {
        (tasks, Vec::new())
    };

    let batches = schedule(main_tasks)?;

    let ctx = DriverCtx {
        state: state.clone(),
        project_root,
        session,
        cache: ChangeCache::new(state),
        options,
    };

    if ctx.options.check {
        // The safeguard keeps a slow filesystem walk from hanging the
        // assistant session; an unfinished check reads as "nothing to do".
        return match tokio::time::timeout(
            CHECK_SAFEGUARD_TIMEOUT,
            check::run_check(&ctx, &batches, &deferred_tasks),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!("check mode hit the safeguard timeout, exiting clean");
                Ok(ExitStatus::Success)
            }
        };
    }

    execute::run_wait(&ctx, batches, deferred_tasks, resumed).await
}

/// Canonicalized project root: explicit option, `CLAUDE_PROJECT_DIR`, or
/// the working directory. Symlinks are resolved so downstream path
/// comparisons behave on platforms where /var is a symlink.
fn resolve_project_root(options: &OrchestrateOptions) -> Result<PathBuf, EngineError> {
    let root = match options.project_root {
        Some(ref root) => root.clone(),
        None => match env::project_dir_override() {
            Some(root) => root,
            None => std::env::current_dir()?,
        },
    };
    root.canonicalize()
        .map_err(|e| EngineError::ProjectRoot(format!("{}: {e}", root.display())))
}

/// Partition stop-family tasks into the scheduled set and the deferred
/// post-validation group.
fn split_deferred(tasks: Vec<HookTask>) -> (Vec<HookTask>, Vec<HookTask>) {
    tasks.into_iter().partition(|t| !t.has_wildcard_dep())
}

/// Rebuild tasks from the pending rows queued by a prior `--check`.
///
/// The stored command is authoritative; the live manifest (when the
/// plugin is still installed) supplies dependencies and timeouts.
fn reconstitute_tasks(
    state: &StateDir,
    record: &OrchestrationRecord,
    project_root: &std::path::Path,
) -> Result<Vec<HookTask>, EngineError> {
    let rows = PendingStore::new(state.clone()).load(&record.id)?;
    let plugins = discover_plugins(project_root);
    let event = HookEvent::from_str(&record.event_type).unwrap_or(HookEvent::Stop);

    let mut tasks: Vec<HookTask> = Vec::new();
    for row in rows {
        if let Some(task) = tasks
            .iter_mut()
            .find(|t| t.plugin_name == row.plugin && t.hook_name == row.hook)
        {
            task.dirs.push(row.directory.clone());
            continue;
        }

        let installed = plugins.iter().find(|p| p.name == row.plugin);
        let def = installed
            .and_then(|p| p.manifest.hook.get(&row.hook).cloned())
            .unwrap_or_else(|| {
                let mut def = HookDef {
                    command: row.command.clone(),
                    events: vec![event],
                    if_changed: row.if_changed.clone(),
                    ..Default::default()
                };
                if row.deferred {
                    def.depends_on.push(DependsOn {
                        plugin: "*".to_string(),
                        hook: "*".to_string(),
                        optional: true,
                    });
                }
                def
            });

        tasks.push(HookTask {
            plugin_name: row.plugin.clone(),
            plugin_root: installed
                .map(|p| p.root.clone())
                .unwrap_or_else(|| project_root.to_path_buf()),
            hook_name: row.hook.clone(),
            def,
            dirs: vec![row.directory.clone()],
        });
    }

    Ok(tasks)
}

#[cfg(test)]
#[path = "../driver_tests.rs"]
mod tests;
