// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! han slot coordinator daemon (hand)
//!
//! Singleton per operating user. Owns the global slot pool and serves
//! acquire/release/heartbeat over a loopback TCP port. State is memory
//! only: a restart rebuilds an empty pool and clients reacquire.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::io::Write;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fs2::FileExt;
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};

use han_daemon::env;
use han_daemon::listener::{ListenCtx, Listener};
use han_daemon::process::process_exists;
use han_daemon::slots::{default_pool_size, SlotPool};
use han_storage::StateDir;

/// Interval of the periodic dead-holder sweep.
const SWEEP_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("hand {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("hand {}", env!("CARGO_PKG_VERSION"));
                println!("han slot coordinator - bounds concurrent hook processes per host");
                println!();
                println!("USAGE:");
                println!("    hand");
                println!();
                println!("The coordinator is typically started by the `han` CLI and should");
                println!("not be invoked directly. It listens on a loopback TCP port for");
                println!("slot requests from orchestrator processes.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: hand [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let state = StateDir::resolve()?;
    std::fs::create_dir_all(state.root())?;

    // Singleton lock FIRST - prevents races. Avoid truncating before we
    // hold the lock, which would wipe the running daemon's PID file.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(state.slotd_lock_path())?;
    if lock_file.try_lock_exclusive().is_err() {
        let pid = std::fs::read_to_string(state.slotd_pid_path())
            .unwrap_or_default()
            .trim()
            .to_string();
        eprintln!("hand is already running");
        if !pid.is_empty() {
            eprintln!("  pid: {pid}");
        }
        std::process::exit(1);
    }

    rotate_log_if_needed(&state.slotd_log_path());
    let _log_guard = setup_logging(&state)?;

    // Bind before writing the pid/port files so clients never race a
    // half-started daemon.
    let port = env::slot_port().unwrap_or(env::DEFAULT_SLOT_PORT);
    let socket =
        TcpListener::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)).await?;
    let bound_port = socket.local_addr()?.port();

    std::fs::write(state.slotd_pid_path(), format!("{}\n", std::process::id()))?;
    std::fs::write(state.slotd_port_path(), format!("{bound_port}\n"))?;

    let total = env::global_slots().unwrap_or_else(default_pool_size);
    info!(port = bound_port, slots = total, "slot coordinator starting");

    let pool = Arc::new(Mutex::new(SlotPool::new(total)));
    let shutdown = Arc::new(Notify::new());

    let ctx = Arc::new(ListenCtx {
        pool: Arc::clone(&pool),
        shutdown: Arc::clone(&shutdown),
    });
    tokio::spawn(Listener::new(socket, ctx).run());

    spawn_sweep_task(Arc::clone(&pool));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("coordinator ready on 127.0.0.1:{bound_port}");
    println!("READY");
    flush_stdout();

    tokio::select! {
        _ = shutdown.notified() => {
            info!("shutdown requested via command");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down");
        }
        _ = sigint.recv() => {
            info!("received SIGINT, shutting down");
        }
    }

    let _ = std::fs::remove_file(state.slotd_pid_path());
    let _ = std::fs::remove_file(state.slotd_port_path());
    info!("coordinator stopped");
    Ok(())
}

fn flush_stdout() {
    let _ = std::io::stdout().flush();
}

/// Periodic sweep so crashed holders are reclaimed even when no acquire
/// traffic arrives.
fn spawn_sweep_task(pool: Arc<Mutex<SlotPool>>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let evicted = pool.lock().sweep(Instant::now(), &process_exists);
            if !evicted.is_empty() {
                info!(count = evicted.len(), "periodic sweep reclaimed slots");
            }
        }
    });
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep.
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log if it exceeds [`MAX_LOG_SIZE`]. Best-effort:
/// rotation failures must not keep the daemon from starting.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(
    state: &StateDir,
) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_path = state.slotd_log_path();
    let dir = log_path
        .parent()
        .ok_or_else(|| std::io::Error::other("log path has no parent"))?;
    let name = log_path
        .file_name()
        .ok_or_else(|| std::io::Error::other("log path has no file name"))?;

    let file_appender = tracing_appender::rolling::never(dir, name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
