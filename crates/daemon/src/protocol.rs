// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for the slot coordinator.
//!
//! One request/response exchange per loopback TCP connection. Each
//! message is a frame: a 4-byte big-endian length followed by the JSON
//! body. Frames are read and written whole — slot messages are a few
//! hundred bytes, so there is no streaming path.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// Request from an orchestrator to the coordinator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Claim a slot for one hook execution
    Acquire {
        session_id: String,
        hook_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        plugin_name: Option<String>,
        pid: u32,
    },

    /// Give a slot back; only honored when `pid` matches the holder
    Release { slot_id: u32, pid: u32 },

    /// Refresh the holder's liveness stamp
    Heartbeat { slot_id: u32, pid: u32 },

    /// Snapshot of the pool for diagnostics
    Status,

    /// Request coordinator shutdown
    Shutdown,
}

/// Response from the coordinator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Health check response
    Pong,

    /// Acquire outcome; `slot_id` is -1 when not granted
    Acquired {
        granted: bool,
        slot_id: i32,
        in_use_count: usize,
    },

    /// Release outcome
    Released {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Heartbeat outcome
    HeartbeatAck { success: bool },

    /// Pool snapshot
    Status {
        total: usize,
        available: usize,
        active: Vec<ActiveSlot>,
    },

    /// Daemon is shutting down
    ShuttingDown,

    /// Error response
    Error { message: String },
}

/// One held slot in a status snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActiveSlot {
    pub slot_id: u32,
    pub session_id: String,
    pub hook_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_name: Option<String>,
    pub pid: u32,
    pub held_for_ms: u64,
}

/// Wire failures
#[derive(Debug, Error)]
pub enum WireError {
    #[error("slot IPC IO failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed slot message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("slot frame of {0} bytes exceeds the {MAX_FRAME}-byte cap")]
    FrameTooLarge(usize),

    #[error("peer closed the connection")]
    Closed,

    #[error("slot IPC deadline elapsed")]
    Deadline,
}

/// Hard cap on one frame. The largest real message is a `Status`
/// snapshot of a full pool (2–16 holders), well under a kilobyte per
/// holder; anything bigger is a confused or hostile peer.
pub const MAX_FRAME: usize = 64 * 1024;

/// Write one length-prefixed JSON frame.
pub async fn write_frame<W, T>(writer: &mut W, msg: &T) -> Result<(), WireError>
where
    W: tokio::io::AsyncWriteExt + Unpin,
    T: Serialize,
{
    let body = serde_json::to_vec(msg)?;
    if body.len() > MAX_FRAME {
        return Err(WireError::FrameTooLarge(body.len()));
    }

    writer.write_all(&(body.len() as u32).to_be_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed JSON frame.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T, WireError>
where
    R: tokio::io::AsyncReadExt + Unpin,
    T: DeserializeOwned,
{
    let mut prefix = [0u8; 4];
    if let Err(e) = reader.read_exact(&mut prefix).await {
        return Err(match e.kind() {
            std::io::ErrorKind::UnexpectedEof => WireError::Closed,
            _ => WireError::Io(e),
        });
    }

    let len = u32::from_be_bytes(prefix) as usize;
    if len > MAX_FRAME {
        return Err(WireError::FrameTooLarge(len));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(serde_json::from_slice(&body)?)
}

/// `read_frame` bounded by a deadline.
pub async fn recv_timeout<R, T>(
    reader: &mut R,
    deadline: std::time::Duration,
) -> Result<T, WireError>
where
    R: tokio::io::AsyncReadExt + Unpin,
    T: DeserializeOwned,
{
    tokio::time::timeout(deadline, read_frame(reader))
        .await
        .map_err(|_| WireError::Deadline)?
}

/// `write_frame` bounded by a deadline.
pub async fn send_timeout<W, T>(
    writer: &mut W,
    msg: &T,
    deadline: std::time::Duration,
) -> Result<(), WireError>
where
    W: tokio::io::AsyncWriteExt + Unpin,
    T: Serialize,
{
    tokio::time::timeout(deadline, write_frame(writer, msg))
        .await
        .map_err(|_| WireError::Deadline)?
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
