// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The slot pool
//!
//! Pure in-memory state: an array of `N` slots, each empty or holding one
//! `{session, hook, pid}` record. Every invariant lives here — the
//! listener only plumbs requests through. The pool is rebuilt empty when
//! the daemon restarts; clients simply reacquire.

use std::time::{Duration, Instant};

use tracing::info;

use crate::protocol::ActiveSlot;

/// A holder's heartbeat may lag this far before the slot is reclaimable.
pub const HEARTBEAT_STALE: Duration = Duration::from_secs(30 * 60);

/// Pool size when `HAN_GLOBAL_SLOTS` is unset: `max(2, cpus / 2)`.
pub fn default_pool_size() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2);
    (cpus / 2).max(2)
}

/// Metadata for one held slot.
#[derive(Debug, Clone)]
pub struct SlotHolder {
    pub session_id: String,
    pub hook_name: String,
    pub plugin_name: Option<String>,
    pub pid: u32,
    pub acquired_at: Instant,
    pub last_heartbeat: Instant,
}

/// Result of an acquire attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireOutcome {
    pub granted: bool,
    pub slot_id: i32,
    pub in_use_count: usize,
}

/// The bounded pool of execution slots.
pub struct SlotPool {
    slots: Vec<Option<SlotHolder>>,
}

impl SlotPool {
    pub fn new(total: usize) -> Self {
        Self {
            slots: vec![None; total.max(1)],
        }
    }

    pub fn total(&self) -> usize {
        self.slots.len()
    }

    pub fn in_use(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Evict holders whose PID is dead or whose heartbeat went stale.
    ///
    /// Runs at the start of every acquire and on the periodic sweep so a
    /// crashed orchestrator never pins a slot for long. Returns the evicted
    /// holders for logging.
    pub fn sweep(
        &mut self,
        now: Instant,
        pid_alive: &dyn Fn(u32) -> bool,
    ) -> Vec<(usize, SlotHolder)> {
        let mut evicted = Vec::new();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let Some(holder) = slot else { continue };
            let dead = !pid_alive(holder.pid);
            let stale = now.duration_since(holder.last_heartbeat) > HEARTBEAT_STALE;
            if dead || stale {
                info!(
                    slot_id = i,
                    pid = holder.pid,
                    session = %holder.session_id,
                    reason = if dead { "dead pid" } else { "stale heartbeat" },
                    "evicting slot holder"
                );
                if let Some(holder) = slot.take() {
                    evicted.push((i, holder));
                }
            }
        }
        evicted
    }

    /// Grant the lowest-numbered free slot, if any. Never blocks — a full
    /// pool returns `granted: false` and the client retries.
    pub fn acquire(
        &mut self,
        session_id: &str,
        hook_name: &str,
        plugin_name: Option<&str>,
        pid: u32,
        now: Instant,
    ) -> AcquireOutcome {
        let free = self.slots.iter().position(|s| s.is_none());
        match free {
            Some(slot_id) => {
                self.slots[slot_id] = Some(SlotHolder {
                    session_id: session_id.to_string(),
                    hook_name: hook_name.to_string(),
                    plugin_name: plugin_name.map(str::to_string),
                    pid,
                    acquired_at: now,
                    last_heartbeat: now,
                });
                AcquireOutcome {
                    granted: true,
                    slot_id: slot_id as i32,
                    in_use_count: self.in_use(),
                }
            }
            None => AcquireOutcome {
                granted: false,
                slot_id: -1,
                in_use_count: self.slots.len(),
            },
        }
    }

    /// Release a slot. A mismatched PID (or empty slot) is refused so one
    /// process cannot free another's slot.
    pub fn release(&mut self, slot_id: u32, pid: u32) -> Result<(), String> {
        let Some(slot) = self.slots.get_mut(slot_id as usize) else {
            return Err(format!("slot {slot_id} out of range"));
        };
        match slot {
            Some(holder) if holder.pid == pid => {
                *slot = None;
                Ok(())
            }
            Some(holder) => Err(format!(
                "slot {slot_id} held by pid {}, not {pid}",
                holder.pid
            )),
            None => Err(format!("slot {slot_id} is not held")),
        }
    }

    /// Refresh the heartbeat stamp when the holder matches.
    pub fn heartbeat(&mut self, slot_id: u32, pid: u32, now: Instant) -> bool {
        match self.slots.get_mut(slot_id as usize) {
            Some(Some(holder)) if holder.pid == pid => {
                holder.last_heartbeat = now;
                true
            }
            _ => false,
        }
    }

    /// Snapshot for the `Status` query.
    pub fn status(&self, now: Instant) -> (usize, usize, Vec<ActiveSlot>) {
        let active: Vec<ActiveSlot> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                slot.as_ref().map(|holder| ActiveSlot {
                    slot_id: i as u32,
                    session_id: holder.session_id.clone(),
                    hook_name: holder.hook_name.clone(),
                    plugin_name: holder.plugin_name.clone(),
                    pid: holder.pid,
                    held_for_ms: now.duration_since(holder.acquired_at).as_millis() as u64,
                })
            })
            .collect();
        let total = self.slots.len();
        (total, total - active.len(), active)
    }
}

#[cfg(test)]
#[path = "slots_tests.rs"]
mod tests;
