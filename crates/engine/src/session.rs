// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identity and change tracking.

use std::path::PathBuf;

use han_core::{HookPayload, SessionId, UuidIdGen};
use han_storage::{SessionChangeLog, StateDir};
use tracing::debug;

use crate::env;

/// Resolve the session ID for this orchestration.
///
/// Priority: an explicit ID stored on a resumed orchestration, the stdin
/// payload, `HAN_SESSION_ID`, `CLAUDE_SESSION_ID`, the most recently
/// active persisted session, then a freshly minted `cli-<uuid>`.
pub fn resolve_session_id(
    from_orchestration: Option<&SessionId>,
    payload: &HookPayload,
    state: &StateDir,
) -> SessionId {
    if let Some(id) = from_orchestration {
        return id.clone();
    }
    if let Some(ref id) = payload.session_id {
        return id.clone();
    }
    if let Some(id) = env::session_id_hint() {
        return SessionId::new(id);
    }
    if let Some(id) = env::claude_session_id() {
        return SessionId::new(id);
    }
    if let Some(id) = most_recent_session(state) {
        debug!(session = %id, "using most recently active session");
        return id;
    }
    SessionId::generate(&UuidIdGen)
}

/// The persisted session whose change log was touched most recently.
fn most_recent_session(state: &StateDir) -> Option<SessionId> {
    let sessions_root = state.root().join("sessions");
    let entries = std::fs::read_dir(sessions_root).ok()?;

    let mut best: Option<(std::time::SystemTime, SessionId)> = None;
    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name().to_string_lossy().to_string();
        let changes = entry.path().join("file_changes.jsonl");
        let Ok(meta) = std::fs::metadata(&changes) else {
            continue;
        };
        let Ok(modified) = meta.modified() else {
            continue;
        };
        if best.as_ref().map_or(true, |(t, _)| modified > *t) {
            best = Some((modified, SessionId::new(name)));
        }
    }
    best.map(|(_, id)| id)
}

/// Record file modifications carried by a PostToolUse payload.
///
/// Keeps the session change set current without any extra plugin wiring:
/// the harness already dispatches PostToolUse through the orchestrator.
pub fn record_tool_changes(
    payload: &HookPayload,
    session: &SessionId,
    state: &StateDir,
) {
    const FILE_MODIFYING_TOOLS: &[&str] = &["Edit", "Write", "NotebookEdit", "MultiEdit"];

    let Some(ref tool) = payload.tool_name else {
        return;
    };
    if !FILE_MODIFYING_TOOLS.contains(&tool.as_str()) {
        return;
    }
    let Some(ref input) = payload.tool_input else {
        return;
    };
    let Some(file_path) = input
        .get("file_path")
        .or_else(|| input.get("notebook_path"))
        .and_then(|v| v.as_str())
    else {
        return;
    };

    let log = SessionChangeLog::new(state.clone());
    if let Err(e) = log.append(session, &PathBuf::from(file_path)) {
        debug!(error = %e, "failed to record session file change");
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
