// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `han orchestrate <event_type>` — one invocation, one orchestration.
//!
//! Exit codes are the contract with the assistant:
//! 0 success, 1 internal error, 2 action required, 3 hash cycle, 130
//! interrupted.

use std::io::{IsTerminal, Read};
use std::str::FromStr;

use anyhow::{anyhow, Result};
use clap::Args;
use han_core::{HookEvent, OrchestrationId, PayloadError};
use han_engine::{orchestrate, EngineError, OrchestrateOptions};
use tokio::signal::unix::{signal, SignalKind};

#[derive(Args)]
pub struct OrchestrateArgs {
    /// Lifecycle event (Stop, SubagentStop, PreToolUse, PostToolUse, ...)
    pub event_type: String,

    /// Report what would run, queue it, and exit 2 without executing
    #[arg(long)]
    pub check: bool,

    /// Execute synchronously (fresh event or a queued orchestration)
    #[arg(long)]
    pub wait: bool,

    /// Drain a previously checked orchestration
    #[arg(long = "orchestration-id")]
    pub orchestration_id: Option<String>,

    /// Only run hooks whose matched files changed (default)
    #[arg(long = "only-changed", overrides_with = "all_files")]
    pub only_changed: bool,

    /// Run everything, ignoring the change cache
    #[arg(long = "all-files", overrides_with = "only_changed")]
    pub all_files: bool,

    /// Stop scheduling new batches after a failure (default)
    #[arg(long = "fail-fast", overrides_with = "no_fail_fast")]
    pub fail_fast: bool,

    /// Keep running remaining batches after a failure
    #[arg(long = "no-fail-fast", overrides_with = "fail_fast")]
    pub no_fail_fast: bool,

    #[arg(long)]
    pub verbose: bool,

    /// Skip Stop hooks while the conversation is a pure Q&A exchange
    #[arg(long = "skip-if-questioning")]
    pub skip_if_questioning: bool,

    /// Tool name for SubagentPrompt filtering
    #[arg(long = "tool-name")]
    pub tool_name: Option<String>,
}

pub async fn handle(args: OrchestrateArgs) -> Result<i32> {
    let event = HookEvent::from_str(&args.event_type)
        .map_err(|e| anyhow!("{e} (expected one of Stop, SubagentStop, PreToolUse, ...)"))?;

    let mut options = OrchestrateOptions::for_event(event);
    options.check = args.check;
    options.wait = args.wait;
    options.orchestration_id = args.orchestration_id.map(OrchestrationId::new);
    // overrides_with makes the flag pairs mutually exclusive; the
    // defaults are only-changed and fail-fast.
    options.all_files = args.all_files && !args.only_changed;
    options.fail_fast = args.fail_fast || !args.no_fail_fast;
    options.verbose = args.verbose;
    options.tool_name = args.tool_name;
    options.skip_if_questioning = args.skip_if_questioning;

    let payload = read_stdin_payload();

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        result = orchestrate(options, payload) => match result {
            Ok(status) => Ok(status.code()),
            Err(EngineError::Payload(PayloadError::EventMismatch { payload, event })) => {
                Err(anyhow!("payload event \"{payload}\" does not match \"{event}\""))
            }
            Err(e) => Err(e.into()),
        },
        _ = sigint.recv() => Ok(130),
        _ = sigterm.recv() => Ok(130),
        _ = sighup.recv() => Ok(130),
    }
}

/// Read the JSON payload the harness pipes in. A terminal stdin means a
/// human invocation with no payload.
fn read_stdin_payload() -> Option<String> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return None;
    }
    let mut raw = String::new();
    stdin.lock().read_to_string(&mut raw).ok()?;
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
#[path = "orchestrate_tests.rs"]
mod tests;
