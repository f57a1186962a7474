// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator process management.
//!
//! Starting, stopping, and probing the `hand` daemon process.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

use han_storage::StateDir;

use crate::client::ClientError;
use crate::env;

/// Resolve the coordinator address: `HAN_SLOT_PORT` env beats the port
/// file written by a running daemon, which beats the default.
pub fn daemon_addr(state: &StateDir) -> SocketAddr {
    let port = env::slot_port()
        .filter(|p| *p != 0)
        .or_else(|| read_port_file(state))
        .unwrap_or(env::DEFAULT_SLOT_PORT);
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port))
}

/// Read the port the running daemon bound, if any.
pub fn read_port_file(state: &StateDir) -> Option<u16> {
    std::fs::read_to_string(state.slotd_port_path())
        .ok()
        .and_then(|s| s.trim().parse::<u16>().ok())
}

/// Find the hand binary
pub fn find_hand_binary() -> Result<PathBuf, ClientError> {
    if let Some(path) = env::daemon_binary() {
        return Ok(PathBuf::from(path));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("hand");
            if sibling.exists() {
                return Ok(sibling);
            }
        }
    }

    Ok(PathBuf::from("hand"))
}

/// Start the daemon in the background, returning the child process handle
pub fn start_daemon_background(state: &StateDir) -> Result<std::process::Child, ClientError> {
    let hand_path = find_hand_binary()?;

    Command::new(&hand_path)
        .env("HAN_STATE_DIR", state.root())
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(e.to_string()))
}

/// Get the PID from the daemon PID file, if it exists
pub fn read_daemon_pid(state: &StateDir) -> Option<u32> {
    std::fs::read_to_string(state.slotd_pid_path())
        .ok()
        .and_then(|s| s.trim().parse::<u32>().ok())
}

/// Execute kill with the given signal and PID
fn kill_signal(signal: &str, pid: u32) -> bool {
    Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Check if a process with the given PID exists
pub fn process_exists(pid: u32) -> bool {
    kill_signal("-0", pid)
}

/// Stop the daemon with SIGTERM, escalating to SIGKILL after a grace wait.
pub fn stop_daemon(state: &StateDir) -> bool {
    let Some(pid) = read_daemon_pid(state) else {
        return false;
    };

    kill_signal("-15", pid);
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if !process_exists(pid) {
            cleanup_stale_files(state);
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    kill_signal("-9", pid);
    cleanup_stale_files(state);
    true
}

/// Remove pid/port files left behind by a dead daemon.
pub fn cleanup_stale_files(state: &StateDir) {
    if let Some(pid) = read_daemon_pid(state) {
        if process_exists(pid) {
            return;
        }
    }
    let _ = std::fs::remove_file(state.slotd_pid_path());
    let _ = std::fs::remove_file(state.slotd_port_path());
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
