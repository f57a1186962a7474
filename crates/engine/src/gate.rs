// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversational gate for `--skip-if-questioning`.
//!
//! Stop hooks are pointless while the conversation is a pure Q&A
//! exchange: if the assistant just asked the user something, or the user
//! asked and nothing was edited since, validation would only interrupt.
//! The gate inspects the tail of the session transcript to decide.

use std::path::{Path, PathBuf};

use han_core::SessionId;
use serde::Deserialize;

/// Tool names that count as file-modifying for the gate.
const FILE_MODIFYING_TOOLS: &[&str] = &["Edit", "Write", "NotebookEdit", "MultiEdit"];

/// Interrogative openers that mark a message as a question even without
/// a question mark.
const INTERROGATIVE_PATTERNS: &[&str] = &[
    "would you like",
    "should i",
    "do you want",
    "which ",
    "let me know",
];

/// Tool call the assistant uses to pose an explicit question.
const QUESTION_TOOL: &str = "AskUserQuestion";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One conversation message, reduced to what the gate needs.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub text: String,
    /// Names of tool calls the message carried.
    pub tool_calls: Vec<String>,
}

/// Source of the conversation tail.
pub trait MessageStore {
    /// Most recent messages, oldest first.
    fn tail(&self, limit: usize) -> Vec<Message>;
}

/// Whether hooks should be skipped because the conversation is waiting
/// on a human.
pub fn should_skip_for_questioning(store: &dyn MessageStore) -> bool {
    let messages = store.tail(50);

    let Some(last) = messages.last() else {
        return false;
    };

    // The agent just asked — it is waiting on input.
    if last.role == Role::Assistant && is_question(last) {
        return true;
    }

    // Pure Q&A: the user asked, and the assistant has not modified any
    // files since.
    let Some(last_user_idx) = messages.iter().rposition(|m| m.role == Role::User) else {
        return false;
    };
    if is_question(&messages[last_user_idx]) {
        let edited_since = messages[last_user_idx..].iter().any(|m| {
            m.role == Role::Assistant
                && m.tool_calls
                    .iter()
                    .any(|t| FILE_MODIFYING_TOOLS.contains(&t.as_str()))
        });
        if !edited_since {
            return true;
        }
    }

    false
}

fn is_question(message: &Message) -> bool {
    if message.tool_calls.iter().any(|t| t == QUESTION_TOOL) {
        return true;
    }
    if message.text.contains('?') {
        return true;
    }
    let lower = message.text.to_ascii_lowercase();
    INTERROGATIVE_PATTERNS.iter().any(|p| lower.contains(p))
}

// --- transcript-backed store ---

/// Reads Claude-style JSONL session transcripts under
/// `~/.claude/projects/<slug>/<session>.jsonl`.
pub struct TranscriptStore {
    path: PathBuf,
}

impl TranscriptStore {
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Locate the transcript for a session, if one exists.
    pub fn for_session(project_root: &Path, session: &SessionId) -> Option<Self> {
        let home = crate::env::home_dir()?;
        let slug = project_slug(project_root);
        let path = home
            .join(".claude/projects")
            .join(slug)
            .join(format!("{session}.jsonl"));
        path.exists().then(|| Self::at(path))
    }
}

/// Project path to transcript directory slug (`/a/b` → `-a-b`).
fn project_slug(project_root: &Path) -> String {
    project_root
        .to_string_lossy()
        .replace(['/', '.'], "-")
}

#[derive(Deserialize)]
struct TranscriptLine {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    message: Option<TranscriptMessage>,
}

#[derive(Deserialize)]
struct TranscriptMessage {
    #[serde(default)]
    content: serde_json::Value,
}

impl MessageStore for TranscriptStore {
    fn tail(&self, limit: usize) -> Vec<Message> {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };

        let mut messages: Vec<Message> = content
            .lines()
            .filter_map(|line| serde_json::from_str::<TranscriptLine>(line).ok())
            .filter_map(|line| {
                let role = match line.kind.as_str() {
                    "user" => Role::User,
                    "assistant" => Role::Assistant,
                    _ => return None,
                };
                let (text, tool_calls) = flatten_content(line.message?.content);
                Some(Message {
                    role,
                    text,
                    tool_calls,
                })
            })
            .collect();

        if messages.len() > limit {
            messages.drain(..messages.len() - limit);
        }
        messages
    }
}

/// Pull text and tool-call names out of a content block array (or a bare
/// string, which older transcripts use).
fn flatten_content(content: serde_json::Value) -> (String, Vec<String>) {
    match content {
        serde_json::Value::String(text) => (text, Vec::new()),
        serde_json::Value::Array(blocks) => {
            let mut text = String::new();
            let mut tool_calls = Vec::new();
            for block in blocks {
                match block.get("type").and_then(|t| t.as_str()) {
                    Some("text") => {
                        if let Some(t) = block.get("text").and_then(|t| t.as_str()) {
                            if !text.is_empty() {
                                text.push('\n');
                            }
                            text.push_str(t);
                        }
                    }
                    Some("tool_use") => {
                        if let Some(name) = block.get("name").and_then(|n| n.as_str()) {
                            tool_calls.push(name.to_string());
                        }
                    }
                    _ => {}
                }
            }
            (text, tool_calls)
        }
        _ => (String::new(), Vec::new()),
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
