//! Failure reporting and attempt accounting for Stop hooks.

use crate::prelude::*;

#[test]
fn failing_hook_exits_two_with_a_pointer_to_the_log() {
    let project = Project::empty();
    project.plugin(
        "tests",
        r#"
[hook.test-bun]
command = "echo 'assertion failed' >&2; exit 1"
events = ["Stop"]
"#,
    );

    project
        .han()
        .args(&["orchestrate", "Stop", "--wait"])
        .stdin(project.payload("Stop"))
        .exits(2)
        .stderr_has("1 of 1 hook(s) failed")
        .stderr_has("tests/test-bun")
        .stderr_has("Full output:");
}

#[test]
fn third_consecutive_failure_prints_the_stuck_hooks_message() {
    let project = Project::empty();
    project.plugin(
        "tests",
        r#"
[hook.test-bun]
command = "exit 1"
events = ["Stop"]
"#,
    );

    for _ in 0..2 {
        project
            .han()
            .args(&["orchestrate", "Stop", "--wait"])
            .stdin(project.payload("Stop"))
            .exits(2);
    }

    project
        .han()
        .args(&["orchestrate", "Stop", "--wait"])
        .stdin(project.payload("Stop"))
        .exits(2)
        .stderr_has("Stuck hooks")
        .stderr_has(
            "han attempts increase --session spec-session --plugin tests --hook test-bun",
        );
}

#[test]
fn attempts_increase_raises_the_ceiling() {
    let project = Project::empty();
    project.plugin(
        "tests",
        r#"
[hook.test-bun]
command = "exit 1"
events = ["Stop"]
"#,
    );

    for _ in 0..3 {
        project
            .han()
            .args(&["orchestrate", "Stop", "--wait"])
            .stdin(project.payload("Stop"))
            .exits(2);
    }

    let directory = project.path().canonicalize().unwrap();
    project
        .han()
        .args(&[
            "attempts",
            "increase",
            "--session",
            "spec-session",
            "--plugin",
            "tests",
            "--hook",
            "test-bun",
            "--directory",
            &directory.to_string_lossy(),
            "--max",
            "6",
        ])
        .passes()
        .stdout_has("max_attempts now 6");

    // Next failure is 4 < 6: reported as a plain failure, not stuck
    project
        .han()
        .args(&["orchestrate", "Stop", "--wait"])
        .stdin(project.payload("Stop"))
        .exits(2)
        .stderr_lacks("Stuck hooks");
}

#[test]
fn passing_run_resets_the_streak() {
    let project = Project::empty();
    project.plugin(
        "tests",
        r#"
[hook.test-gate]
command = "test -f ok"
events = ["Stop"]
"#,
    );

    project
        .han()
        .args(&["orchestrate", "Stop", "--wait"])
        .stdin(project.payload("Stop"))
        .exits(2);

    project.file("ok", "");
    project
        .han()
        .args(&["orchestrate", "Stop", "--wait"])
        .stdin(project.payload("Stop"))
        .passes();
}
