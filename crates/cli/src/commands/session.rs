// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `han session` — session state helpers for hook wiring.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use han_core::SessionId;
use han_storage::{SessionChangeLog, StateDir};

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Append a modified file to the session change set
    TrackChange {
        path: PathBuf,
        /// Session to record under (default: HAN_SESSION_ID / CLAUDE_SESSION_ID)
        #[arg(long)]
        session: Option<String>,
    },
}

pub fn handle(args: SessionArgs) -> Result<i32> {
    match args.command {
        SessionCommand::TrackChange { path, session } => {
            let Some(session) = session
                .or_else(han_engine::env::session_id_hint)
                .or_else(han_engine::env::claude_session_id)
            else {
                bail!("no session id: pass --session or set HAN_SESSION_ID");
            };

            let state = StateDir::resolve()?;
            SessionChangeLog::new(state).append(&SessionId::new(session), &path)?;
            Ok(0)
        }
    }
}
