// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use han_core::{Clock, FakeClock};

fn acquire(pool: &mut SlotPool, session: &str, pid: u32, now: Instant) -> AcquireOutcome {
    pool.acquire(session, "test-bun", Some("tests"), pid, now)
}

#[test]
fn grants_lowest_free_slot() {
    let clock = FakeClock::new();
    let mut pool = SlotPool::new(2);

    let a = acquire(&mut pool, "s-1", 100, clock.now());
    assert_eq!((a.granted, a.slot_id, a.in_use_count), (true, 0, 1));

    let b = acquire(&mut pool, "s-2", 101, clock.now());
    assert_eq!((b.granted, b.slot_id, b.in_use_count), (true, 1, 2));
}

#[test]
fn full_pool_is_not_granted() {
    let clock = FakeClock::new();
    let mut pool = SlotPool::new(1);

    acquire(&mut pool, "s-1", 100, clock.now());
    let denied = acquire(&mut pool, "s-2", 101, clock.now());
    assert_eq!(
        (denied.granted, denied.slot_id, denied.in_use_count),
        (false, -1, 1)
    );
}

#[test]
fn release_requires_matching_pid() {
    let clock = FakeClock::new();
    let mut pool = SlotPool::new(1);
    acquire(&mut pool, "s-1", 100, clock.now());

    assert!(pool.release(0, 999).is_err());
    assert_eq!(pool.in_use(), 1);

    pool.release(0, 100).unwrap();
    assert_eq!(pool.in_use(), 0);
    assert!(pool.release(0, 100).is_err(), "slot no longer held");
}

#[test]
fn released_slot_is_reused_first() {
    let clock = FakeClock::new();
    let mut pool = SlotPool::new(3);
    acquire(&mut pool, "s-1", 100, clock.now());
    acquire(&mut pool, "s-2", 101, clock.now());
    pool.release(0, 100).unwrap();

    let next = acquire(&mut pool, "s-3", 102, clock.now());
    assert_eq!(next.slot_id, 0);
}

#[test]
fn sweep_evicts_dead_pids() {
    let clock = FakeClock::new();
    let mut pool = SlotPool::new(2);
    acquire(&mut pool, "s-1", 100, clock.now());
    acquire(&mut pool, "s-2", 101, clock.now());

    let evicted = pool.sweep(clock.now(), &|pid| pid != 100);
    assert_eq!(evicted.len(), 1);
    assert_eq!(evicted[0].0, 0);
    assert_eq!(pool.in_use(), 1);
}

#[test]
fn sweep_evicts_stale_heartbeats() {
    let clock = FakeClock::new();
    let mut pool = SlotPool::new(1);
    acquire(&mut pool, "s-1", 100, clock.now());

    clock.advance(HEARTBEAT_STALE + Duration::from_secs(1));
    let evicted = pool.sweep(clock.now(), &|_| true);
    assert_eq!(evicted.len(), 1);
    assert_eq!(pool.in_use(), 0);
}

#[test]
fn heartbeat_defers_staleness() {
    let clock = FakeClock::new();
    let mut pool = SlotPool::new(1);
    acquire(&mut pool, "s-1", 100, clock.now());

    clock.advance(HEARTBEAT_STALE - Duration::from_secs(60));
    assert!(pool.heartbeat(0, 100, clock.now()));

    clock.advance(Duration::from_secs(120));
    assert!(pool.sweep(clock.now(), &|_| true).is_empty());
}

#[test]
fn heartbeat_with_wrong_pid_is_refused() {
    let clock = FakeClock::new();
    let mut pool = SlotPool::new(1);
    acquire(&mut pool, "s-1", 100, clock.now());
    assert!(!pool.heartbeat(0, 999, clock.now()));
    assert!(!pool.heartbeat(5, 100, clock.now()));
}

#[test]
fn never_more_than_total_granted() {
    let clock = FakeClock::new();
    let mut pool = SlotPool::new(2);

    let granted: Vec<AcquireOutcome> = (0..4)
        .map(|i| acquire(&mut pool, &format!("s-{i}"), 100 + i, clock.now()))
        .filter(|o| o.granted)
        .collect();
    assert_eq!(granted.len(), 2);
    assert_eq!(pool.in_use(), 2);
}

#[test]
fn status_reports_holders() {
    let clock = FakeClock::new();
    let mut pool = SlotPool::new(2);
    acquire(&mut pool, "s-1", 100, clock.now());
    clock.advance(Duration::from_millis(1500));

    let (total, available, active) = pool.status(clock.now());
    assert_eq!((total, available), (2, 1));
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].session_id, "s-1");
    assert_eq!(active[0].held_for_ms, 1500);
}

#[test]
fn pool_size_floor_is_two() {
    assert!(default_pool_size() >= 2);
}
