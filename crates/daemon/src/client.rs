// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slot client for orchestrator processes.
//!
//! Probes the coordinator, acquires with exponential backoff, and falls
//! back to local file locks when the daemon is unreachable. The guard it
//! hands out heartbeats in the background and releases idempotently.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use han_storage::StateDir;
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::env;
use crate::locks::FallbackLock;
use crate::process;
use crate::protocol::{self, Request, Response, WireError};

/// Interval between holder heartbeats.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Default ceiling on how long a normal acquisition waits.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(5 * 60);

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("coordinator not running")]
    DaemonNotRunning,

    #[error("failed to start coordinator: {0}")]
    DaemonStartFailed(String),

    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    #[error("unexpected response from coordinator")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A granted slot: either a daemon slot or a local fallback lock.
pub enum SlotGuard {
    Daemon(SlotHandle),
    Local(FallbackLock),
}

impl SlotGuard {
    /// Release the slot. Safe to call once the hook finished; dropping a
    /// local guard releases too.
    pub async fn release(self) {
        match self {
            SlotGuard::Daemon(mut handle) => handle.release().await,
            SlotGuard::Local(lock) => drop(lock),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SlotGuard::Local(_))
    }
}

/// Handle to a daemon-granted slot.
pub struct SlotHandle {
    addr: SocketAddr,
    slot_id: u32,
    pid: u32,
    released: bool,
    heartbeat: Option<tokio::task::JoinHandle<()>>,
}

impl SlotHandle {
    /// Release the slot. Idempotent; a failed release is only logged —
    /// the daemon's dead-PID sweep will reclaim the slot anyway.
    pub async fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Some(task) = self.heartbeat.take() {
            task.abort();
        }
        let request = Request::Release {
            slot_id: self.slot_id,
            pid: self.pid,
        };
        match send_request(self.addr, &request, env::timeout_ipc()).await {
            Ok(Response::Released { success: true, .. }) => {}
            Ok(Response::Released {
                success: false,
                message,
            }) => warn!(slot_id = self.slot_id, ?message, "slot release refused"),
            Ok(_) | Err(_) => warn!(slot_id = self.slot_id, "slot release failed"),
        }
    }
}

impl Drop for SlotHandle {
    fn drop(&mut self) {
        // Stop heartbeating even if the caller forgot to release; the
        // daemon reclaims the slot once the PID exits.
        if let Some(task) = self.heartbeat.take() {
            task.abort();
        }
    }
}

/// Client for the slot coordinator.
pub struct SlotClient {
    state: StateDir,
}

impl SlotClient {
    pub fn new(state: StateDir) -> Self {
        Self { state }
    }

    fn addr(&self) -> SocketAddr {
        process::daemon_addr(&self.state)
    }

    /// Health probe with a 1-second deadline.
    pub async fn probe_health(&self) -> bool {
        matches!(
            send_request(self.addr(), &Request::Ping, env::timeout_health()).await,
            Ok(Response::Pong)
        )
    }

    /// Probe, and on failure make one self-heal spawn attempt bounded by
    /// the spawn deadline. Returns whether the coordinator is healthy.
    pub async fn ensure_daemon(&self) -> bool {
        if self.probe_health().await {
            return true;
        }

        process::cleanup_stale_files(&self.state);
        if process::start_daemon_background(&self.state).is_err() {
            return false;
        }

        let deadline = Instant::now() + env::timeout_spawn();
        while Instant::now() < deadline {
            if self.probe_health().await {
                return true;
            }
            tokio::time::sleep(env::poll_interval()).await;
        }
        false
    }

    /// Pool snapshot for diagnostics.
    pub async fn status(&self) -> Result<Response, ClientError> {
        send_request(self.addr(), &Request::Status, env::timeout_ipc()).await
    }

    /// Ask the daemon to shut down.
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match send_request(self.addr(), &Request::Shutdown, env::timeout_ipc()).await {
            Ok(Response::ShuttingDown) => Ok(()),
            Ok(_) => Err(ClientError::UnexpectedResponse),
            Err(e) => Err(e),
        }
    }

    /// Acquire a global slot.
    ///
    /// `max_wait` of zero means wait indefinitely (Stop hooks in wait
    /// mode). Returns `None` when the wait budget ran out without a grant.
    /// Falls through to the local file lock when the daemon is down.
    pub async fn acquire(
        &self,
        session_id: &str,
        hook_name: &str,
        plugin_name: Option<&str>,
        max_wait: Duration,
    ) -> Result<Option<SlotGuard>, ClientError> {
        let started = Instant::now();
        let unbounded = max_wait.is_zero();
        let pid = std::process::id();

        if !self.probe_health().await {
            return self
                .acquire_local(hook_name, plugin_name, max_wait, started)
                .await;
        }

        let mut attempt: u32 = 0;
        loop {
            let request = Request::Acquire {
                session_id: session_id.to_string(),
                hook_name: hook_name.to_string(),
                plugin_name: plugin_name.map(str::to_string),
                pid,
            };

            match send_request(self.addr(), &request, env::timeout_ipc()).await {
                Ok(Response::Acquired {
                    granted: true,
                    slot_id,
                    in_use_count,
                }) => {
                    if env::slot_debug() {
                        debug!(slot_id, in_use_count, hook = hook_name, "slot granted");
                    }
                    return Ok(Some(SlotGuard::Daemon(self.make_handle(slot_id as u32, pid))));
                }
                Ok(Response::Acquired { granted: false, .. }) => {}
                Ok(_) => return Err(ClientError::UnexpectedResponse),
                Err(_) => {
                    // Daemon lost mid-wait — degrade to the local lock with
                    // whatever wait budget remains.
                    warn!("slot coordinator lost during acquire, degrading to local locks");
                    return self
                        .acquire_local(hook_name, plugin_name, max_wait, started)
                        .await;
                }
            }

            // Exponential backoff: 100, 200, 400, 800, 1600, then 2000ms.
            let backoff = Duration::from_millis((100u64 << attempt.min(4)).min(2000));
            attempt = attempt.saturating_add(1);

            if !unbounded && started.elapsed() + backoff > max_wait {
                return Ok(None);
            }
            tokio::time::sleep(backoff).await;

            // Re-probe between retries; fall through on loss of daemon.
            if !self.probe_health().await {
                return self
                    .acquire_local(hook_name, plugin_name, max_wait, started)
                    .await;
            }
        }
    }

    async fn acquire_local(
        &self,
        hook_name: &str,
        plugin_name: Option<&str>,
        max_wait: Duration,
        started: Instant,
    ) -> Result<Option<SlotGuard>, ClientError> {
        let unbounded = max_wait.is_zero();
        loop {
            if let Some(lock) = FallbackLock::try_acquire(&self.state, hook_name, plugin_name)? {
                return Ok(Some(SlotGuard::Local(lock)));
            }
            if !unbounded && started.elapsed() >= max_wait {
                return Ok(None);
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    fn make_handle(&self, slot_id: u32, pid: u32) -> SlotHandle {
        let addr = self.addr();
        let heartbeat = tokio::spawn(async move {
            let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
            interval.tick().await; // first tick is immediate
            loop {
                interval.tick().await;
                let request = Request::Heartbeat { slot_id, pid };
                if let Err(e) = send_request(addr, &request, env::timeout_ipc()).await {
                    debug!(slot_id, error = %e, "heartbeat failed");
                }
            }
        });

        SlotHandle {
            addr,
            slot_id,
            pid,
            released: false,
            heartbeat: Some(heartbeat),
        }
    }
}

/// One request/response exchange with the coordinator.
async fn send_request(
    addr: SocketAddr,
    request: &Request,
    timeout: Duration,
) -> Result<Response, ClientError> {
    let exchange = async {
        let mut stream = TcpStream::connect(addr).await?;
        protocol::write_frame(&mut stream, request).await?;
        let response: Response = protocol::read_frame(&mut stream).await?;
        Ok::<Response, ClientError>(response)
    };

    tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| ClientError::Wire(WireError::Deadline))?
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
