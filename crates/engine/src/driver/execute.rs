// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wait/normal mode: run the batches.
//!
//! Batches run strictly in order; hooks within a batch run sequentially
//! (subprocesses already consume real cores, and fail-fast correctness
//! comes first). Stop-family hooks hold a global slot for the duration of
//! their subprocess.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use han_core::{OrchestrationId, OrchestrationStatus, OrchestrationTotals, UuidIdGen};
use han_daemon::SlotClient;
use han_storage::{AttemptStore, OrchestrationRecord, OrchestrationStore, PendingStore, RunLog};
use tracing::{debug, info, warn};

use super::{report, DriverCtx, ExitStatus};
use crate::cache::CacheQuery;
use crate::cycle::HashCycleDetector;
use crate::error::EngineError;
use crate::executor::{run_hook, stderr_is_tty, HookInvocation, DEFAULT_HOOK_TIMEOUT};
use crate::task::HookTask;

/// Outcome of one hook-in-directory execution.
#[derive(Debug, Clone)]
pub(crate) enum HookStatus {
    Passed,
    Failed { reason: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone)]
pub(crate) struct HookResult {
    pub plugin: String,
    pub hook: String,
    pub directory: PathBuf,
    pub status: HookStatus,
}

impl HookResult {
    pub fn failed(&self) -> bool {
        matches!(self.status, HookStatus::Failed { .. })
    }

    pub fn passed(&self) -> bool {
        matches!(self.status, HookStatus::Passed)
    }
}

pub(crate) async fn run_wait(
    ctx: &DriverCtx,
    batches: Vec<Vec<HookTask>>,
    deferred: Vec<HookTask>,
    resumed: Option<OrchestrationRecord>,
) -> Result<ExitStatus, EngineError> {
    let store = OrchestrationStore::new(ctx.state.clone());
    let slot_client = SlotClient::new(ctx.state.clone());

    // Coordinator health check with one self-heal attempt; unhealthy
    // means degraded mode, never a refusal to run.
    let mut degraded = false;
    if ctx.options.event.is_stop_family() && !slot_client.ensure_daemon().await {
        degraded = true;
        report::degraded_warning();
    }

    let mut record = match resumed {
        Some(record) => record,
        None => {
            let id = OrchestrationId::generate(&UuidIdGen);
            let record = OrchestrationRecord::new(
                id.clone(),
                Some(ctx.session.clone()),
                ctx.options.event.as_str(),
                ctx.project_root.clone(),
                ctx.state.run_log_path(&id),
            );
            store.create(&record)?;
            record
        }
    };
    record.degraded = degraded;
    store.set_status(&mut record, OrchestrationStatus::Running)?;

    let mut log = RunLog::open(&ctx.state, &record.id)?;
    log.line(&format!(
        "orchestration {} event={} project={}",
        record.id,
        record.event_type,
        ctx.project_root.display()
    ));

    let session_files = ctx
        .cache
        .session_set(&ctx.session)
        .unwrap_or_default();

    let mut detector = HashCycleDetector::new();
    let mut baselined: HashSet<(PathBuf, Vec<String>)> = HashSet::new();
    let mut results: Vec<HookResult> = Vec::new();
    let mut aborted = false;

    'batches: for batch in &batches {
        if aborted {
            for task in batch {
                for dir in &task.dirs {
                    results.push(skip(task, dir, "aborted"));
                }
            }
            continue 'batches;
        }

        for task in batch {
            for dir in &task.dirs {
                if !ctx.options.all_files && !needs_run(ctx, task, dir) {
                    debug!(task = %task.key(), dir = %dir.display(), "cache hit");
                    log.line(&format!("skip {}/{} in {} (no changes detected)",
                        task.plugin_name, task.hook_name, dir.display()));
                    results.push(skip(task, dir, "no changes detected"));
                    continue;
                }

                // Baseline snapshot before the first hook touches this key.
                let cycle_key = (dir.clone(), task.def.if_changed.clone());
                if task.def.is_cacheable() && baselined.insert(cycle_key) {
                    detector.record(dir, &task.def.if_changed, None);
                }

                let result = run_one(ctx, &slot_client, task, dir, &session_files, &mut log)
                    .await?;
                if let SlotMode::Degraded = result.slot_mode {
                    degraded = true;
                }

                if result.outcome.failed() && ctx.options.fail_fast {
                    aborted = true;
                }
                results.push(result.outcome);

                if task.def.is_cacheable() {
                    let origin = format!("{}/{}", task.plugin_name, task.hook_name);
                    if let Some(cycle) =
                        detector.record(dir, &task.def.if_changed, Some(&origin))
                    {
                        report::cycle(&cycle);
                        log.line(&format!(
                            "hash cycle detected in {} — aborting",
                            dir.display()
                        ));
                        finish(&store, &mut record, &results, degraded)?;
                        return Ok(ExitStatus::Recursion);
                    }
                }
            }
        }
    }

    PendingStore::new(ctx.state.clone()).delete(&record.id)?;
    finish(&store, &mut record, &results, degraded)?;

    if ctx.options.event.is_stop_family() {
        stop_family_report(ctx, &results, &deferred, &session_files, &record, &mut log).await
    } else if results.iter().any(HookResult::failed) {
        report::non_stop_failures(&results, record.log_path.as_path());
        Ok(ExitStatus::ActionRequired)
    } else {
        Ok(ExitStatus::Success)
    }
}

enum SlotMode {
    Direct,
    Coordinated,
    Degraded,
}

struct RunOne {
    outcome: HookResult,
    slot_mode: SlotMode,
}

async fn run_one(
    ctx: &DriverCtx,
    slot_client: &SlotClient,
    task: &HookTask,
    dir: &Path,
    session_files: &std::collections::BTreeSet<PathBuf>,
    log: &mut RunLog,
) -> Result<RunOne, EngineError> {
    let command = materialize_command(&task.def.command, dir, session_files);
    let env = child_env(ctx, task);
    let timeout = task
        .def
        .timeout
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_HOOK_TIMEOUT);

    // Stop hooks run under the global budget; wait indefinitely.
    let (slot, slot_mode) = if ctx.options.event.is_stop_family() {
        match slot_client
            .acquire(
                ctx.session.as_str(),
                &task.hook_name,
                Some(&task.plugin_name),
                Duration::ZERO,
            )
            .await?
        {
            Some(guard) => {
                let mode = if guard.is_degraded() {
                    SlotMode::Degraded
                } else {
                    SlotMode::Coordinated
                };
                (Some(guard), mode)
            }
            None => {
                // Unbounded waits cannot time out; be defensive anyway.
                warn!(task = %task.key(), "slot unavailable");
                return Ok(RunOne {
                    outcome: HookResult {
                        plugin: task.plugin_name.clone(),
                        hook: task.hook_name.clone(),
                        directory: dir.to_path_buf(),
                        status: HookStatus::Failed {
                            reason: "slot unavailable".to_string(),
                        },
                    },
                    slot_mode: SlotMode::Degraded,
                });
            }
        }
    } else {
        (None, SlotMode::Direct)
    };

    log.section(&task.plugin_name, &task.hook_name, dir, &command);
    info!(task = %task.key(), dir = %dir.display(), "running hook");

    let invocation = HookInvocation {
        command: &command,
        directory: dir,
        env: &env,
        timeout,
    };
    let outcome = run_hook(&invocation, stderr_is_tty() || ctx.options.verbose).await;

    if let Some(guard) = slot {
        guard.release().await;
    }

    let outcome = outcome?;
    log.output("stdout", &outcome.stdout);
    log.output("stderr", &outcome.stderr);

    let status = if outcome.success() {
        log.line(&format!("ok ({} ms)", outcome.duration.as_millis()));
        if let Err(e) = ctx.cache.track(&CacheQuery {
            plugin: &task.plugin_name,
            hook: &task.hook_name,
            directory: dir,
            patterns: &task.def.if_changed,
            command: &task.def.command,
            session: &ctx.session,
        }) {
            warn!(error = %e, "failed to commit cache baseline");
        }
        HookStatus::Passed
    } else if outcome.timed_out {
        log.line(&format!("timeout after {} ms", timeout.as_millis()));
        HookStatus::Failed {
            reason: format!("timed out after {}s", timeout.as_secs()),
        }
    } else {
        let code = outcome.exit_code.unwrap_or(-1);
        log.line(&format!("exit code {code}"));
        HookStatus::Failed {
            reason: format!("exit code {code}"),
        }
    };

    Ok(RunOne {
        outcome: HookResult {
            plugin: task.plugin_name.clone(),
            hook: task.hook_name.clone(),
            directory: dir.to_path_buf(),
            status,
        },
        slot_mode,
    })
}

async fn stop_family_report(
    ctx: &DriverCtx,
    results: &[HookResult],
    deferred: &[HookTask],
    session_files: &std::collections::BTreeSet<PathBuf>,
    record: &OrchestrationRecord,
    log: &mut RunLog,
) -> Result<ExitStatus, EngineError> {
    let attempts = AttemptStore::new(ctx.state.clone());
    let failed: Vec<&HookResult> = results.iter().filter(|r| r.failed()).collect();

    if !failed.is_empty() {
        let mut stuck = Vec::new();
        for result in &failed {
            let counter = attempts.record_failure(
                &ctx.session,
                &result.plugin,
                &result.hook,
                &result.directory,
            )?;
            if counter.is_stuck() {
                stuck.push(((*result).clone(), counter));
            }
        }
        report::stop_failures(results, &stuck, record.log_path.as_path(), &ctx.session);
        return Ok(ExitStatus::ActionRequired);
    }

    // Everything passed: clear the failure streaks.
    for result in results.iter().filter(|r| r.passed()) {
        attempts.reset(&ctx.session, &result.plugin, &result.hook, &result.directory)?;
    }

    // Post-validation advisory hooks run inline and never block.
    for task in deferred {
        for dir in &task.dirs {
            let command = materialize_command(&task.def.command, dir, session_files);
            let env = child_env(ctx, task);
            log.section(&task.plugin_name, &task.hook_name, dir, &command);
            let invocation = HookInvocation {
                command: &command,
                directory: dir,
                env: &env,
                timeout: task
                    .def
                    .timeout
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_HOOK_TIMEOUT),
            };
            match run_hook(&invocation, stderr_is_tty() || ctx.options.verbose).await {
                Ok(outcome) if outcome.success() => {
                    log.output("stdout", &outcome.stdout);
                    log.line("ok (advisory)");
                }
                Ok(outcome) => {
                    log.output("stderr", &outcome.stderr);
                    report::advisory_warning(&task.plugin_name, &task.hook_name, &outcome);
                }
                Err(e) => {
                    report::advisory_spawn_warning(&task.plugin_name, &task.hook_name, &e);
                }
            }
        }
    }

    Ok(ExitStatus::Success)
}

fn needs_run(ctx: &DriverCtx, task: &HookTask, dir: &Path) -> bool {
    ctx.cache.check(&CacheQuery {
        plugin: &task.plugin_name,
        hook: &task.hook_name,
        directory: dir,
        patterns: &task.def.if_changed,
        command: &task.def.command,
        session: &ctx.session,
    })
}

fn skip(task: &HookTask, dir: &Path, reason: &str) -> HookResult {
    HookResult {
        plugin: task.plugin_name.clone(),
        hook: task.hook_name.clone(),
        directory: dir.to_path_buf(),
        status: HookStatus::Skipped {
            reason: reason.to_string(),
        },
    }
}

/// Materialize the concrete command for one directory.
///
/// A `han` self-reference resolves to the current binary so hooks keep
/// working regardless of PATH, and `${HAN_FILES}` becomes the
/// session-changed files relative to the run directory (`.` when none).
fn materialize_command(
    raw: &str,
    dir: &Path,
    session_files: &std::collections::BTreeSet<PathBuf>,
) -> String {
    let mut command = raw.to_string();

    if command == "han" || command.starts_with("han ") {
        if let Ok(exe) = std::env::current_exe() {
            command = format!("{}{}", exe.display(), &command[3..]);
        }
    }

    if command.contains("${HAN_FILES}") {
        let rel: Vec<String> = session_files
            .iter()
            .filter_map(|p| p.strip_prefix(dir).ok())
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        let files = if rel.is_empty() {
            ".".to_string()
        } else {
            rel.join(" ")
        };
        command = command.replace("${HAN_FILES}", &files);
    }

    command
}

/// Environment exported to hook subprocesses on top of the parent's.
fn child_env(ctx: &DriverCtx, task: &HookTask) -> Vec<(String, String)> {
    let mut env = vec![
        (
            "CLAUDE_PLUGIN_ROOT".to_string(),
            task.plugin_root.display().to_string(),
        ),
        (
            "CLAUDE_PROJECT_DIR".to_string(),
            ctx.project_root.display().to_string(),
        ),
        ("HAN_SESSION_ID".to_string(), ctx.session.to_string()),
    ];
    if ctx.options.event.is_stop_family() {
        env.push((crate::env::STOP_ORCHESTRATING_VAR.to_string(), "1".to_string()));
    }
    env
}

/// Persist totals and the terminal status, unless a newer orchestration
/// already cancelled this one.
fn finish(
    store: &OrchestrationStore,
    record: &mut OrchestrationRecord,
    results: &[HookResult],
    degraded: bool,
) -> Result<(), EngineError> {
    record.totals = OrchestrationTotals {
        total: results.len(),
        passed: results.iter().filter(|r| r.passed()).count(),
        failed: results.iter().filter(|r| r.failed()).count(),
        skipped: results
            .iter()
            .filter(|r| matches!(r.status, HookStatus::Skipped { .. }))
            .count(),
    };
    record.degraded = degraded;

    if let Ok(current) = store.load(&record.id) {
        if current.status == OrchestrationStatus::Cancelled {
            record.status = OrchestrationStatus::Cancelled;
            store.save(record)?;
            return Ok(());
        }
    }

    let status = if record.totals.failed > 0 {
        OrchestrationStatus::Failed
    } else {
        OrchestrationStatus::Completed
    };
    store.set_status(record, status)?;
    Ok(())
}

#[cfg(test)]
#[path = "../execute_tests.rs"]
mod tests;
