// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle events emitted by the assistant harness, plus the stdin payload
//! that accompanies them.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::SessionId;

/// A lifecycle event the orchestrator can be dispatched for.
///
/// The wire names are the harness's exact event strings (`Stop`,
/// `PreToolUse`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookEvent {
    Stop,
    SubagentStop,
    PreToolUse,
    PostToolUse,
    SessionStart,
    SessionEnd,
    UserPromptSubmit,
    SubagentPrompt,
    Notification,
    PreCompact,
}

impl HookEvent {
    /// All known events, in a stable order.
    pub const ALL: [HookEvent; 10] = [
        HookEvent::Stop,
        HookEvent::SubagentStop,
        HookEvent::PreToolUse,
        HookEvent::PostToolUse,
        HookEvent::SessionStart,
        HookEvent::SessionEnd,
        HookEvent::UserPromptSubmit,
        HookEvent::SubagentPrompt,
        HookEvent::Notification,
        HookEvent::PreCompact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::Stop => "Stop",
            HookEvent::SubagentStop => "SubagentStop",
            HookEvent::PreToolUse => "PreToolUse",
            HookEvent::PostToolUse => "PostToolUse",
            HookEvent::SessionStart => "SessionStart",
            HookEvent::SessionEnd => "SessionEnd",
            HookEvent::UserPromptSubmit => "UserPromptSubmit",
            HookEvent::SubagentPrompt => "SubagentPrompt",
            HookEvent::Notification => "Notification",
            HookEvent::PreCompact => "PreCompact",
        }
    }

    /// Stop-family events run under the global slot budget and the
    /// recursion guard.
    pub fn is_stop_family(&self) -> bool {
        matches!(self, HookEvent::Stop | HookEvent::SubagentStop)
    }

    /// Events whose hooks may be restricted by a `tool_filter`.
    pub fn takes_tool_filter(&self) -> bool {
        matches!(
            self,
            HookEvent::PreToolUse | HookEvent::PostToolUse | HookEvent::SubagentPrompt
        )
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unknown event names.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown event type: {0}")]
pub struct UnknownEvent(pub String);

impl FromStr for HookEvent {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookEvent::ALL
            .iter()
            .find(|e| e.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

/// Payload read from stdin when the harness dispatches an event.
///
/// Only well-known fields are typed; everything else is retained in
/// `extra` so event-specific additions survive a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_event_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_input: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_hook_active: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_mode: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Payload parse/validation errors.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid payload JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload event \"{payload}\" does not match dispatched event \"{event}\"")]
    EventMismatch { payload: String, event: String },
}

impl HookPayload {
    /// Parse a payload and check its `hook_event_name` against the
    /// dispatched event. A payload without the field passes.
    pub fn parse(raw: &str, event: HookEvent) -> Result<Self, PayloadError> {
        let payload: HookPayload = serde_json::from_str(raw)?;
        if let Some(ref name) = payload.hook_event_name {
            if name != event.as_str() {
                return Err(PayloadError::EventMismatch {
                    payload: name.clone(),
                    event: event.as_str().to_string(),
                });
            }
        }
        Ok(payload)
    }

    /// Synthesize the payload used when the orchestrator is invoked from
    /// the command line with nothing on stdin.
    pub fn synthetic(event: HookEvent, session_id: Option<SessionId>, cwd: &str) -> Self {
        HookPayload {
            session_id,
            hook_event_name: Some(event.as_str().to_string()),
            cwd: Some(cwd.to_string()),
            permission_mode: Some("default".to_string()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
