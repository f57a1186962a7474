// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling coordinator connections.
//!
//! Accepts loopback TCP connections and serves one request per
//! connection. The pool itself is behind a single mutex — every handler
//! is a short critical section over small state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use crate::process::process_exists;
use crate::protocol::{self, Request, Response, WireError};
use crate::slots::SlotPool;

/// Per-connection deadline for reading the request and writing the
/// response.
const SERVER_DEADLINE: Duration = Duration::from_secs(5);

/// Shared daemon context for all request handlers.
pub struct ListenCtx {
    pub pool: Arc<Mutex<SlotPool>>,
    pub shutdown: Arc<Notify>,
}

/// Listener task accepting coordinator connections.
pub struct Listener {
    socket: TcpListener,
    ctx: Arc<ListenCtx>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("wire error: {0}")]
    Wire(#[from] WireError),
}

impl Listener {
    pub fn new(socket: TcpListener, ctx: Arc<ListenCtx>) -> Self {
        Self { socket, ctx }
    }

    /// Run the accept loop until the task is dropped at shutdown.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            match e {
                                ConnectionError::Wire(WireError::Closed) => {
                                    debug!("client disconnected")
                                }
                                ConnectionError::Wire(WireError::Deadline) => {
                                    warn!("connection deadline elapsed")
                                }
                                _ => error!("connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(mut stream: TcpStream, ctx: &ListenCtx) -> Result<(), ConnectionError> {
    let request: Request = protocol::recv_timeout(&mut stream, SERVER_DEADLINE).await?;
    debug!(request = ?request, "received request");

    let response = handle_request(request, ctx);
    protocol::send_timeout(&mut stream, &response, SERVER_DEADLINE).await?;
    Ok(())
}

/// Handle a single request and return a response.
fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    let now = Instant::now();
    match request {
        Request::Ping => Response::Pong,

        Request::Acquire {
            session_id,
            hook_name,
            plugin_name,
            pid,
        } => {
            let mut pool = ctx.pool.lock();
            pool.sweep(now, &process_exists);
            let outcome = pool.acquire(&session_id, &hook_name, plugin_name.as_deref(), pid, now);
            Response::Acquired {
                granted: outcome.granted,
                slot_id: outcome.slot_id,
                in_use_count: outcome.in_use_count,
            }
        }

        Request::Release { slot_id, pid } => match ctx.pool.lock().release(slot_id, pid) {
            Ok(()) => Response::Released {
                success: true,
                message: None,
            },
            Err(reason) => Response::Released {
                success: false,
                message: Some(reason),
            },
        },

        Request::Heartbeat { slot_id, pid } => Response::HeartbeatAck {
            success: ctx.pool.lock().heartbeat(slot_id, pid, now),
        },

        Request::Status => {
            let (total, available, active) = ctx.pool.lock().status(now);
            Response::Status {
                total,
                available,
                active,
            }
        }

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
