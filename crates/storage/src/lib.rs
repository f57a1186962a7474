// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable state for the han orchestrator
//!
//! Everything lives under one state directory as small JSON documents with
//! atomic write-temp-then-rename commits. The stores are advisory for the
//! cache and authoritative for orchestration records, pending hooks, and
//! attempt counters.

mod attempts;
mod cache;
mod fsutil;
mod last_check;
mod orchestration;
mod paths;
mod pending;
mod run_log;
mod session_changes;

pub use attempts::{AttemptRecord, AttemptStore, DEFAULT_MAX_ATTEMPTS};
pub use cache::{hash_command, CacheEntry, CacheStore};
pub use fsutil::{load_json, now_ms, save_json, write_atomic};
pub use last_check::LastCheckStore;
pub use orchestration::{OrchestrationRecord, OrchestrationStore};
pub use paths::StateDir;
pub use pending::{PendingHook, PendingStore};
pub use run_log::RunLog;
pub use session_changes::SessionChangeLog;

use thiserror::Error;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not determine state directory")]
    NoStateDir,

    #[error("orchestration not found: {0}")]
    OrchestrationNotFound(String),
}
