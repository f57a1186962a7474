// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! han - hook orchestration CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{attempts, cache, daemon, hooks, orchestrate, session};

#[derive(Parser)]
#[command(
    name = "han",
    version,
    about = "han - hook orchestration for agentic coding sessions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run hooks for a lifecycle event (the assistant-facing entry point)
    Orchestrate(orchestrate::OrchestrateArgs),
    /// Slot coordinator management
    Daemon(daemon::DaemonArgs),
    /// Inspect discovered hooks
    Hooks(hooks::HooksArgs),
    /// Attempt counter management
    Attempts(attempts::AttemptsArgs),
    /// Hook validation cache management
    Cache(cache::CacheArgs),
    /// Session state helpers (for hook wiring)
    Session(session::SessionArgs),
}

#[tokio::main]
async fn main() {
    init_logging();

    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Orchestrate(args) => orchestrate::handle(args).await,
        Commands::Daemon(args) => daemon::handle(args).await,
        Commands::Hooks(args) => hooks::handle(args).await,
        Commands::Attempts(args) => attempts::handle(args),
        Commands::Cache(args) => cache::handle(args),
        Commands::Session(args) => session::handle(args),
    }
}

/// Diagnostics go to stderr, gated by `HAN_LOG` (off by default so hook
/// output stays clean for the assistant).
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_env("HAN_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
