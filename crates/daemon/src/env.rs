// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the coordinator.

use std::time::Duration;

/// Fixed loopback port used when nothing overrides it.
pub const DEFAULT_SLOT_PORT: u16 = 7737;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// `HAN_SLOT_PORT` — explicit coordinator port (0 = ephemeral).
pub fn slot_port() -> Option<u16> {
    std::env::var("HAN_SLOT_PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
}

/// `HAN_GLOBAL_SLOTS` — override the slot pool size.
pub fn global_slots() -> Option<usize> {
    std::env::var("HAN_GLOBAL_SLOTS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
}

/// `HAN_DAEMON_BINARY` — explicit path to the `hand` binary.
pub fn daemon_binary() -> Option<String> {
    std::env::var("HAN_DAEMON_BINARY").ok()
}

/// `HAN_SLOT_DEBUG` — verbose slot client logging.
pub fn slot_debug() -> bool {
    std::env::var("HAN_SLOT_DEBUG").is_ok_and(|v| v == "1" || v == "true")
}

/// `HAN_LOCK_DEBUG` — verbose fallback-lock logging.
pub fn lock_debug() -> bool {
    std::env::var("HAN_LOCK_DEBUG").is_ok_and(|v| v == "1" || v == "true")
}

/// Deadline for the daemon health probe (default 1s).
pub fn timeout_health() -> Duration {
    parse_duration_ms("HAN_TIMEOUT_HEALTH_MS").unwrap_or(Duration::from_secs(1))
}

/// Timeout for slot IPC requests (default 5s).
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("HAN_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Deadline for a self-heal daemon spawn (default 5s).
pub fn timeout_spawn() -> Duration {
    parse_duration_ms("HAN_TIMEOUT_SPAWN_MS").unwrap_or(Duration::from_secs(5))
}

/// Polling interval while waiting for the daemon to come up.
pub fn poll_interval() -> Duration {
    parse_duration_ms("HAN_CONNECT_POLL_MS").unwrap_or(Duration::from_millis(50))
}
