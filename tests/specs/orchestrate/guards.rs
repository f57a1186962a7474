//! Entry guards: recursion marker, kill switch, payload validation.

use crate::prelude::*;

const FAILING_MANIFEST: &str = r#"
[hook.test-bun]
command = "exit 1"
events = ["Stop"]
"#;

#[test]
fn stop_inside_a_stop_orchestration_exits_zero() {
    let project = Project::empty();
    project.plugin("tests", FAILING_MANIFEST);

    project
        .han()
        .args(&["orchestrate", "Stop"])
        .env("HAN_STOP_ORCHESTRATING", "1")
        .stdin(project.payload("Stop"))
        .passes();
}

#[test]
fn wait_mode_ignores_the_recursion_marker() {
    let project = Project::empty();
    project.plugin("tests", FAILING_MANIFEST);

    project
        .han()
        .args(&["orchestrate", "Stop", "--wait"])
        .env("HAN_STOP_ORCHESTRATING", "1")
        .stdin(project.payload("Stop"))
        .exits(2);
}

#[test]
fn disable_hooks_kills_everything() {
    let project = Project::empty();
    project.plugin("tests", FAILING_MANIFEST);

    project
        .han()
        .args(&["orchestrate", "Stop", "--wait"])
        .env("HAN_DISABLE_HOOKS", "1")
        .stdin(project.payload("Stop"))
        .passes();
}

#[test]
fn payload_event_mismatch_exits_one() {
    let project = Project::empty();

    project
        .han()
        .args(&["orchestrate", "PostToolUse"])
        .stdin(project.payload("Stop"))
        .exits(1)
        .stderr_has("does not match");
}

#[test]
fn unknown_event_exits_one() {
    let project = Project::empty();

    project
        .han()
        .args(&["orchestrate", "Bogus"])
        .exits(1)
        .stderr_has("unknown event type");
}
