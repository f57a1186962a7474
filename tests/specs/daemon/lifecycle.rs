//! Slot coordinator lifecycle.

use crate::prelude::*;

/// Poll a condition until it returns true or the timeout is reached.
fn wait_for(timeout_ms: u64, mut condition: impl FnMut() -> bool) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < std::time::Duration::from_millis(timeout_ms) {
        if condition() {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
    false
}

#[test]
fn start_status_stop_roundtrip() {
    let project = Project::empty();

    project
        .han()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("slot coordinator started");

    project
        .han()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("slots:");

    project.han().args(&["daemon", "stop"]).passes();

    assert!(
        wait_for(2000, || {
            project
                .han()
                .args(&["daemon", "status"])
                .passes()
                .stdout()
                .contains("not running")
        }),
        "coordinator should be gone after stop"
    );
}

#[test]
fn start_is_idempotent() {
    let project = Project::empty();

    project.han().args(&["daemon", "start"]).passes();
    project
        .han()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("already running");
}
