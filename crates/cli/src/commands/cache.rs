// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `han cache` — validation cache management.

use anyhow::Result;
use clap::{Args, Subcommand};
use han_storage::{CacheStore, StateDir};

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Drop every cache baseline (all hooks re-run on next orchestration)
    Clear,
}

pub fn handle(args: CacheArgs) -> Result<i32> {
    match args.command {
        CacheCommand::Clear => {
            let state = StateDir::resolve()?;
            let removed = CacheStore::new(state).clear()?;
            println!("cleared {removed} cache row(s)");
            Ok(0)
        }
    }
}
