// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the orchestrator.

use std::path::PathBuf;

/// Marker set for subprocesses of a wait-mode Stop execution; checked on
/// entry by the recursion guard.
pub const STOP_ORCHESTRATING_VAR: &str = "HAN_STOP_ORCHESTRATING";

/// `HAN_DISABLE_HOOKS` — global kill switch.
pub fn hooks_disabled() -> bool {
    std::env::var("HAN_DISABLE_HOOKS").is_ok_and(|v| v == "1" || v == "true")
}

/// `HAN_STOP_ORCHESTRATING` — are we already inside a Stop orchestration?
pub fn stop_orchestrating() -> bool {
    std::env::var(STOP_ORCHESTRATING_VAR).is_ok_and(|v| v == "1")
}

/// `HAN_SESSION_ID` — session hint from the harness wiring.
pub fn session_id_hint() -> Option<String> {
    std::env::var("HAN_SESSION_ID").ok().filter(|s| !s.is_empty())
}

/// `CLAUDE_SESSION_ID` — session hint exported by the assistant itself.
pub fn claude_session_id() -> Option<String> {
    std::env::var("CLAUDE_SESSION_ID")
        .ok()
        .filter(|s| !s.is_empty())
}

/// `CLAUDE_PROJECT_DIR` — project root override.
pub fn project_dir_override() -> Option<PathBuf> {
    std::env::var("CLAUDE_PROJECT_DIR")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// `HOME` — used for transcript lookup.
pub fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}
