// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `han daemon` — slot coordinator management.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use han_daemon::{process, Response, SlotClient};
use han_storage::StateDir;

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the coordinator if it is not already running
    Start,
    /// Stop a running coordinator
    Stop,
    /// Show the slot pool
    Status,
}

pub async fn handle(args: DaemonArgs) -> Result<i32> {
    let state = StateDir::resolve()?;
    let client = SlotClient::new(state.clone());

    match args.command {
        DaemonCommand::Start => {
            if client.probe_health().await {
                println!("slot coordinator already running");
                return Ok(0);
            }
            if !client.ensure_daemon().await {
                bail!("failed to start slot coordinator (see slotd.log in the state dir)");
            }
            println!("slot coordinator started");
            Ok(0)
        }

        DaemonCommand::Stop => {
            if client.probe_health().await {
                client.shutdown().await?;
                println!("slot coordinator stopping");
            } else if process::stop_daemon(&state) {
                println!("slot coordinator killed");
            } else {
                println!("slot coordinator not running");
            }
            Ok(0)
        }

        DaemonCommand::Status => {
            if !client.probe_health().await {
                println!("slot coordinator not running");
                return Ok(0);
            }
            let Response::Status {
                total,
                available,
                active,
            } = client.status().await?
            else {
                bail!("unexpected response from coordinator");
            };

            println!("slots: {available}/{total} available");
            for slot in active {
                let plugin = slot.plugin_name.as_deref().unwrap_or("-");
                println!(
                    "  [{}] {}/{} session={} pid={} held {}s",
                    slot.slot_id,
                    plugin,
                    slot.hook_name,
                    slot.session_id,
                    slot.pid,
                    slot.held_for_ms / 1000
                );
            }
            Ok(0)
        }
    }
}
