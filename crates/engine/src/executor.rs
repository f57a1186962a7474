// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook subprocess execution.
//!
//! Runs one hook command under `sh -c` in its directory with a bounded
//! timeout. Stdout is captured; stderr is captured and, when the
//! orchestrator is attached to a terminal, also streamed through live so
//! the user sees progress.

use std::io::IsTerminal;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Default per-invocation timeout (5 minutes).
pub const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// One concrete command to run.
pub struct HookInvocation<'a> {
    pub command: &'a str,
    pub directory: &'a Path,
    pub env: &'a [(String, String)],
    pub timeout: Duration,
}

/// What happened when a hook ran.
#[derive(Debug)]
pub struct HookOutcome {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    pub timed_out: bool,
}

impl HookOutcome {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Whether stderr should stream through to the user live.
pub fn stderr_is_tty() -> bool {
    std::io::stderr().is_terminal()
}

/// Run a hook command to completion (or timeout).
pub async fn run_hook(
    invocation: &HookInvocation<'_>,
    stream_stderr: bool,
) -> std::io::Result<HookOutcome> {
    let started = Instant::now();

    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(invocation.command)
        .current_dir(invocation.directory)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in invocation.env {
        cmd.env(key, value);
    }

    debug!(command = invocation.command, dir = %invocation.directory.display(), "running hook");

    let mut child = cmd.spawn()?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_task = tokio::spawn(async move {
        let mut buf = String::new();
        if let Some(mut stdout) = stdout {
            let _ = stdout.read_to_string(&mut buf).await;
        }
        buf
    });

    // Tee stderr: accumulate for the log, and echo live in a TTY.
    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        if let Some(stderr) = stderr {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if stream_stderr {
                    eprintln!("{line}");
                }
                buf.push_str(&line);
                buf.push('\n');
            }
        }
        buf
    });

    let (exit_code, timed_out) =
        match tokio::time::timeout(invocation.timeout, child.wait()).await {
            Ok(Ok(status)) => (status.code(), false),
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                (None, true)
            }
        };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    Ok(HookOutcome {
        exit_code,
        stdout,
        stderr,
        duration: started.elapsed(),
        timed_out,
    })
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
