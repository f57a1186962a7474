// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `han hooks list` — discovery diagnostics.

use std::str::FromStr;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use han_core::HookEvent;
use han_plugin::discover_plugins;

#[derive(Args)]
pub struct HooksArgs {
    #[command(subcommand)]
    pub command: HooksCommand,
}

#[derive(Subcommand)]
pub enum HooksCommand {
    /// List hooks declared by installed plugins
    List {
        /// Only hooks answering this event
        #[arg(long)]
        event: Option<String>,
    },
}

pub async fn handle(args: HooksArgs) -> Result<i32> {
    match args.command {
        HooksCommand::List { event } => {
            let filter = event
                .map(|e| HookEvent::from_str(&e).map_err(|err| anyhow!("{err}")))
                .transpose()?;

            let project_root = std::env::current_dir()?;
            let plugins = discover_plugins(&project_root);

            if plugins.is_empty() {
                println!("no plugins installed");
                return Ok(0);
            }

            for plugin in plugins {
                let mut names: Vec<&String> = plugin.manifest.hook.keys().collect();
                names.sort();

                let mut shown = false;
                for name in names {
                    let def = &plugin.manifest.hook[name];
                    if let Some(event) = filter {
                        if !def.applies_to(event) {
                            continue;
                        }
                    }
                    if !shown {
                        println!("{} ({})", plugin.name, plugin.root.display());
                        shown = true;
                    }
                    let events: Vec<&str> =
                        def.events.iter().map(HookEvent::as_str).collect();
                    let cached = if def.is_cacheable() { " [cached]" } else { "" };
                    println!("  {} — {}{}", name, events.join(", "), cached);
                }
            }
            Ok(0)
        }
    }
}
