// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identifier type.
//!
//! A session is one assistant conversation. Per-session state (attempt
//! counters, change sets, cache scoping) is keyed on this ID. Usually the
//! harness supplies it via the stdin payload or the `HAN_SESSION_ID` /
//! `CLAUDE_SESSION_ID` environment variables; when no hint is available
//! the orchestrator mints a `cli-<uuid>` ID.

crate::define_id! {
    /// Unique identifier for an assistant session.
    pub struct SessionId, prefix "cli";
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
