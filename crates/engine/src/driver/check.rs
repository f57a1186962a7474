// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Check mode: report what would run without running it.
//!
//! Populates the pending-hook worklist, prints the grouped report with
//! the exact `--wait` command the assistant must run next, and exits 2.
//! Identical reports within the dedup window are suppressed so the
//! assistant isn't spammed on every turn.

use han_core::{OrchestrationId, UuidIdGen};
use han_storage::{
    LastCheckStore, OrchestrationRecord, OrchestrationStore, PendingHook, PendingStore,
};

use super::{report, DriverCtx, ExitStatus};
use crate::cache::CacheQuery;
use crate::error::EngineError;
use crate::hash::hash_string;
use crate::task::HookTask;

/// One row of the check report.
pub(crate) struct CheckItem<'a> {
    pub task: &'a HookTask,
    pub directory: &'a std::path::Path,
    pub deferred: bool,
}

pub(crate) async fn run_check(
    ctx: &DriverCtx,
    batches: &[Vec<HookTask>],
    deferred: &[HookTask],
) -> Result<ExitStatus, EngineError> {
    let mut will_run: Vec<CheckItem<'_>> = Vec::new();
    let mut cached = 0usize;

    for task in batches.iter().flatten() {
        for dir in &task.dirs {
            if needs_run(ctx, task, dir) {
                will_run.push(CheckItem {
                    task,
                    directory: dir,
                    deferred: false,
                });
            } else {
                cached += 1;
            }
        }
    }
    for task in deferred {
        for dir in &task.dirs {
            if needs_run(ctx, task, dir) {
                will_run.push(CheckItem {
                    task,
                    directory: dir,
                    deferred: true,
                });
            } else {
                cached += 1;
            }
        }
    }

    if will_run.is_empty() {
        report::check_noop(cached);
        return Ok(ExitStatus::Success);
    }

    let orchestration_id = OrchestrationId::generate(&UuidIdGen);
    let record = OrchestrationRecord::new(
        orchestration_id.clone(),
        Some(ctx.session.clone()),
        ctx.options.event.as_str(),
        ctx.project_root.clone(),
        ctx.state.run_log_path(&orchestration_id),
    );
    OrchestrationStore::new(ctx.state.clone()).create(&record)?;

    let rows: Vec<PendingHook> = will_run
        .iter()
        .map(|item| PendingHook {
            plugin: item.task.plugin_name.clone(),
            hook: item.task.hook_name.clone(),
            directory: item.directory.to_path_buf(),
            command: item.task.def.command.clone(),
            if_changed: item.task.def.if_changed.clone(),
            deferred: item.deferred,
        })
        .collect();
    PendingStore::new(ctx.state.clone()).save(&orchestration_id, &rows)?;

    // Dedup identical reports: same pending set within the window prints
    // nothing (the exit code still signals "action required").
    let digest = check_digest(&will_run);
    let last_check = LastCheckStore::new(ctx.state.clone());
    if last_check.is_duplicate(&ctx.session, &digest)? {
        return Ok(ExitStatus::ActionRequired);
    }

    report::check_report(&will_run, cached, &wait_command(ctx, &orchestration_id));
    last_check.record(&ctx.session, &digest)?;

    Ok(ExitStatus::ActionRequired)
}

fn needs_run(ctx: &DriverCtx, task: &HookTask, dir: &std::path::Path) -> bool {
    if ctx.options.all_files {
        return true;
    }
    ctx.cache.check(&CacheQuery {
        plugin: &task.plugin_name,
        hook: &task.hook_name,
        directory: dir,
        patterns: &task.def.if_changed,
        command: &task.def.command,
        session: &ctx.session,
    })
}

/// Stable fingerprint of a pending set: sorted `plugin/hook:dir` lines.
fn check_digest(items: &[CheckItem<'_>]) -> String {
    let mut lines: Vec<String> = items
        .iter()
        .map(|item| {
            format!(
                "{}/{}:{}",
                item.task.plugin_name,
                item.task.hook_name,
                item.directory.display()
            )
        })
        .collect();
    lines.sort();
    hash_string(&lines.join("\n"))
}

/// The exact command the assistant must run to drain this orchestration.
fn wait_command(ctx: &DriverCtx, id: &OrchestrationId) -> String {
    format!(
        "han orchestrate {} --wait --orchestration-id {}",
        ctx.options.event, id
    )
}
