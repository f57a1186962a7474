// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `han attempts increase` — raise the retry ceiling for a stuck hook.
//!
//! The orchestrator prints this exact invocation in its stuck-hooks
//! message; it is only ever run after the user agrees to more retries.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use han_core::SessionId;
use han_storage::{AttemptStore, StateDir};

#[derive(Args)]
pub struct AttemptsArgs {
    #[command(subcommand)]
    pub command: AttemptsCommand,
}

#[derive(Subcommand)]
pub enum AttemptsCommand {
    /// Raise max_attempts for one (session, plugin, hook, directory)
    Increase {
        #[arg(long)]
        session: String,
        #[arg(long)]
        plugin: String,
        #[arg(long)]
        hook: String,
        #[arg(long)]
        directory: PathBuf,
        #[arg(long)]
        max: u32,
    },
}

pub fn handle(args: AttemptsArgs) -> Result<i32> {
    match args.command {
        AttemptsCommand::Increase {
            session,
            plugin,
            hook,
            directory,
            max,
        } => {
            let state = StateDir::resolve()?;
            let record = AttemptStore::new(state).set_max_attempts(
                &SessionId::new(session),
                &plugin,
                &hook,
                &directory,
                max,
            )?;
            println!(
                "{plugin}/{hook}: max_attempts now {} ({} consecutive failure(s) so far)",
                record.max_attempts, record.consecutive_failures
            );
            Ok(0)
        }
    }
}
