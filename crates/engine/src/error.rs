// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the orchestrator engine

use thiserror::Error;

/// Errors that can occur while orchestrating hooks
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid payload: {0}")]
    Payload(#[from] han_core::PayloadError),

    #[error("circular dependency: {0}")]
    Scheduler(#[from] crate::scheduler::SchedulerError),

    #[error("storage error: {0}")]
    Storage(#[from] han_storage::StorageError),

    #[error("slot client error: {0}")]
    Slots(#[from] han_daemon::ClientError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("project root not found: {0}")]
    ProjectRoot(String),
}
