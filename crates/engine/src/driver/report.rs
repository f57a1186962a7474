// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assistant-facing output.
//!
//! Everything here goes to stderr — that is the channel the assistant
//! reads. Messages tell it what happened and exactly what to do next;
//! full command output stays in the orchestration log.

use std::collections::BTreeMap;
use std::path::Path;

use han_core::{HookEvent, Phase, SessionId};
use han_storage::AttemptRecord;

use super::check::CheckItem;
use super::execute::{HookResult, HookStatus};
use crate::executor::HookOutcome;

pub(crate) fn no_hooks(event: HookEvent) {
    eprintln!("No hooks found for event type \"{event}\"");
}

pub(crate) fn check_noop(cached: usize) {
    if cached > 0 {
        eprintln!("✓ No validation needed — {cached} hook(s) cached, no changes detected");
    } else {
        eprintln!("✓ No validation needed");
    }
}

/// Grouped check report: phases in execution order, then the
/// post-validation group, then the exact command to run.
pub(crate) fn check_report(items: &[CheckItem<'_>], cached: usize, wait_command: &str) {
    eprintln!("Validation needed ({} hook(s) to run):", items.len());

    let mut by_phase: BTreeMap<Phase, Vec<&CheckItem<'_>>> = BTreeMap::new();
    let mut post_validation: Vec<&CheckItem<'_>> = Vec::new();
    for item in items {
        if item.deferred {
            post_validation.push(item);
        } else {
            by_phase.entry(item.task.phase()).or_default().push(item);
        }
    }

    for (phase, group) in &by_phase {
        eprintln!("  {phase}:");
        for item in group {
            eprintln!(
                "    {}/{} — {}",
                item.task.plugin_name,
                item.task.hook_name,
                item.directory.display()
            );
        }
    }
    if !post_validation.is_empty() {
        eprintln!("  post-validation:");
        for item in &post_validation {
            eprintln!(
                "    {}/{} — {}",
                item.task.plugin_name,
                item.task.hook_name,
                item.directory.display()
            );
        }
    }
    if cached > 0 {
        eprintln!("  ({cached} hook(s) cached, skipped)");
    }

    eprintln!();
    eprintln!("Run: {wait_command}");
}

pub(crate) fn degraded_warning() {
    eprintln!(
        "warning: slot coordinator unreachable — degraded mode, using local file locks"
    );
}

pub(crate) fn cycle(report: &crate::cycle::CycleReport) {
    eprintln!(
        "File-hash cycle detected in {}: hooks are rewriting each other's output.",
        report.directory.display()
    );
    for (i, origin) in report.trace.iter().enumerate() {
        eprintln!("  state {}: after {}", i + 1, origin);
    }
    eprintln!("Stopping before the fixers loop forever. Resolve the conflicting formatters.");
}

/// Stop-family failure report: what failed, where the full output lives,
/// and — for stuck hooks — the exact command that raises the attempt
/// ceiling once the user agrees.
pub(crate) fn stop_failures(
    results: &[HookResult],
    stuck: &[(HookResult, AttemptRecord)],
    log_path: &Path,
    session: &SessionId,
) {
    let failed: Vec<&HookResult> = results.iter().filter(|r| r.failed()).collect();
    let total_run = results
        .iter()
        .filter(|r| !matches!(r.status, HookStatus::Skipped { .. }))
        .count();

    eprintln!("{} of {} hook(s) failed:", failed.len(), total_run);
    for result in &failed {
        if let HookStatus::Failed { ref reason } = result.status {
            eprintln!(
                "  ✗ {}/{} in {} ({})",
                result.plugin,
                result.hook,
                result.directory.display(),
                reason
            );
        }
    }
    eprintln!("Full output: {}", log_path.display());

    if stuck.is_empty() {
        eprintln!("Fix the failures, then stop again to re-run validation.");
        return;
    }

    eprintln!();
    eprintln!("Stuck hooks (failed max_attempts times in a row):");
    for (result, counter) in stuck {
        eprintln!(
            "  {}/{} in {} — {} consecutive failure(s), max {}",
            result.plugin,
            result.hook,
            result.directory.display(),
            counter.consecutive_failures,
            counter.max_attempts
        );
        eprintln!(
            "  To retry more, ask the user first, then run: han attempts increase --session {} --plugin {} --hook {} --directory {} --max {}",
            session,
            result.plugin,
            result.hook,
            result.directory.display(),
            counter.max_attempts * 2
        );
    }
}

pub(crate) fn non_stop_failures(results: &[HookResult], log_path: &Path) {
    let failed = results.iter().filter(|r| r.failed()).count();
    eprintln!("{failed} hook(s) failed. Full output: {}", log_path.display());
}

pub(crate) fn advisory_warning(plugin: &str, hook: &str, outcome: &HookOutcome) {
    let reason = if outcome.timed_out {
        "timed out".to_string()
    } else {
        format!("exit code {}", outcome.exit_code.unwrap_or(-1))
    };
    eprintln!("warning: advisory hook {plugin}/{hook} failed ({reason})");
}

pub(crate) fn advisory_spawn_warning(plugin: &str, hook: &str, error: &std::io::Error) {
    eprintln!("warning: advisory hook {plugin}/{hook} could not run: {error}");
}
