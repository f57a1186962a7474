// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! han slot coordinator: protocol, pool, and client
//!
//! The daemon (`hand`) owns the process-wide slot pool that bounds how many
//! resource-intensive hook processes run concurrently across every assistant
//! session on the host. This library exposes the wire protocol, the pure
//! pool logic, and the client used by orchestrator processes — including
//! the file-lock fallback used when the daemon is unreachable.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod client;
pub mod env;
pub mod listener;
pub mod locks;
pub mod process;
pub mod protocol;
pub mod slots;

pub use client::{ClientError, SlotClient, SlotGuard, SlotHandle};
pub use locks::FallbackLock;
pub use protocol::{ActiveSlot, Request, Response, WireError, MAX_FRAME};
pub use slots::{AcquireOutcome, SlotPool, HEARTBEAT_STALE};
