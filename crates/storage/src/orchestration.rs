// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestration records
//!
//! One JSON document per orchestration. Creating a record for a session
//! cancels any still-running record for the same session: the newer run
//! wins, and the old run's subprocesses are left to finish on their own.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use han_core::{OrchestrationId, OrchestrationStatus, OrchestrationTotals, SessionId};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::fsutil::{load_json, save_json};
use crate::{StateDir, StorageError};

/// Durable record of one orchestrator invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationRecord {
    pub id: OrchestrationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    pub event_type: String,
    pub project_root: PathBuf,
    pub status: OrchestrationStatus,
    #[serde(default)]
    pub totals: OrchestrationTotals,
    pub log_path: PathBuf,
    /// Set when the slot coordinator was unreachable during this run.
    #[serde(default)]
    pub degraded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrchestrationRecord {
    pub fn new(
        id: OrchestrationId,
        session_id: Option<SessionId>,
        event_type: impl Into<String>,
        project_root: PathBuf,
        log_path: PathBuf,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            session_id,
            event_type: event_type.into(),
            project_root,
            status: OrchestrationStatus::Pending,
            totals: OrchestrationTotals::default(),
            log_path,
            degraded: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Store of orchestration records.
pub struct OrchestrationStore {
    state: StateDir,
}

impl OrchestrationStore {
    pub fn new(state: StateDir) -> Self {
        Self { state }
    }

    /// Persist a new record, cancelling any non-terminal record that
    /// belongs to the same session.
    pub fn create(&self, record: &OrchestrationRecord) -> Result<(), StorageError> {
        if let Some(ref session) = record.session_id {
            self.cancel_running_for_session(session, &record.id)?;
        }
        self.save(record)
    }

    /// Commit the record's current state.
    pub fn save(&self, record: &OrchestrationRecord) -> Result<(), StorageError> {
        save_json(&self.state.orchestration_path(&record.id), record)
    }

    /// Load a record by ID.
    pub fn load(&self, id: &OrchestrationId) -> Result<OrchestrationRecord, StorageError> {
        load_json(&self.state.orchestration_path(id))?
            .ok_or_else(|| StorageError::OrchestrationNotFound(id.to_string()))
    }

    /// Transition to a status and persist.
    pub fn set_status(
        &self,
        record: &mut OrchestrationRecord,
        status: OrchestrationStatus,
    ) -> Result<(), StorageError> {
        record.status = status;
        record.updated_at = Utc::now();
        self.save(record)
    }

    /// Mark every non-terminal record of `session` (other than `keep`)
    /// cancelled.
    fn cancel_running_for_session(
        &self,
        session: &SessionId,
        keep: &OrchestrationId,
    ) -> Result<(), StorageError> {
        let dir = self.state.orchestrations_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            let Some(mut record) = load_json::<OrchestrationRecord>(&path).unwrap_or(None) else {
                continue;
            };
            if record.id == *keep
                || record.status.is_terminal()
                || record.session_id.as_ref() != Some(session)
            {
                continue;
            }
            info!(
                orchestration = %record.id,
                session = %session,
                "cancelling superseded orchestration"
            );
            record.status = OrchestrationStatus::Cancelled;
            record.updated_at = Utc::now();
            save_json(&path, &record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "orchestration_tests.rs"]
mod tests;
