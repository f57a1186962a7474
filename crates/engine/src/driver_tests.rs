// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use han_core::OrchestrationStatus;
use han_storage::{AttemptStore, SessionChangeLog};

struct Fixture {
    project: tempfile::TempDir,
    state: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            project: tempfile::tempdir().unwrap(),
            state: tempfile::tempdir().unwrap(),
        }
    }

    fn plugin(&self, name: &str, manifest: &str) {
        let root = self.project.path().join(".han/plugins").join(name);
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("hooks.toml"), manifest).unwrap();
    }

    fn options(&self, event: HookEvent) -> OrchestrateOptions {
        let mut options = OrchestrateOptions::for_event(event);
        options.state_dir = Some(self.state.path().to_path_buf());
        options.project_root = Some(self.project.path().to_path_buf());
        options
    }

    fn payload(&self, event: HookEvent) -> String {
        format!(
            r#"{{"session_id": "s-1", "hook_event_name": "{}"}}"#,
            event.as_str()
        )
    }

    fn root(&self) -> std::path::PathBuf {
        self.project.path().canonicalize().unwrap()
    }

    fn state_dir(&self) -> StateDir {
        StateDir::at(self.state.path().to_path_buf())
    }

    fn read_log(&self, name: &str) -> String {
        std::fs::read_to_string(self.project.path().join(name)).unwrap_or_default()
    }

    async fn run(&self, options: OrchestrateOptions, event: HookEvent) -> ExitStatus {
        orchestrate(options, Some(self.payload(event))).await.unwrap()
    }
}

#[tokio::test]
async fn no_plugins_is_success() {
    let f = Fixture::new();
    let status = f
        .run(f.options(HookEvent::SessionStart), HookEvent::SessionStart)
        .await;
    assert_eq!(status, ExitStatus::Success);
}

#[tokio::test]
async fn phases_execute_in_order() {
    let f = Fixture::new();
    f.plugin(
        "tests",
        r#"
[hook.test-step]
command = "echo test >> order.log"
events = ["SessionStart"]
"#,
    );
    f.plugin(
        "fmt",
        r#"
[hook.format-step]
command = "echo format >> order.log"
events = ["SessionStart"]
"#,
    );
    f.plugin(
        "style",
        r#"
[hook.lint-step]
command = "echo lint >> order.log"
events = ["SessionStart"]
"#,
    );

    let status = f
        .run(f.options(HookEvent::SessionStart), HookEvent::SessionStart)
        .await;
    assert_eq!(status, ExitStatus::Success);
    assert_eq!(f.read_log("order.log"), "format\nlint\ntest\n");
}

#[tokio::test]
async fn unchanged_second_run_skips() {
    let f = Fixture::new();
    f.plugin(
        "lint-core",
        r#"
[hook.lint]
command = "echo ran >> runs.log"
events = ["SessionStart"]
if_changed = ["*.ts"]
"#,
    );

    f.run(f.options(HookEvent::SessionStart), HookEvent::SessionStart)
        .await;
    f.run(f.options(HookEvent::SessionStart), HookEvent::SessionStart)
        .await;

    assert_eq!(f.read_log("runs.log"), "ran\n", "second run must be cached");
}

#[tokio::test]
async fn session_change_triggers_rerun() {
    let f = Fixture::new();
    f.plugin(
        "lint-core",
        r#"
[hook.lint]
command = "echo ran >> runs.log"
events = ["SessionStart"]
if_changed = ["*.ts"]
"#,
    );

    f.run(f.options(HookEvent::SessionStart), HookEvent::SessionStart)
        .await;

    let file = f.project.path().join("a.ts");
    std::fs::write(&file, "const a = 1;").unwrap();
    SessionChangeLog::new(f.state_dir())
        .append(&SessionId::new("s-1"), &file)
        .unwrap();

    f.run(f.options(HookEvent::SessionStart), HookEvent::SessionStart)
        .await;
    assert_eq!(f.read_log("runs.log"), "ran\nran\n");
}

#[tokio::test]
async fn all_files_bypasses_cache() {
    let f = Fixture::new();
    f.plugin(
        "lint-core",
        r#"
[hook.lint]
command = "echo ran >> runs.log"
events = ["SessionStart"]
if_changed = ["*.ts"]
"#,
    );

    let mut options = f.options(HookEvent::SessionStart);
    options.all_files = true;
    f.run(options.clone(), HookEvent::SessionStart).await;
    f.run(options, HookEvent::SessionStart).await;

    assert_eq!(f.read_log("runs.log"), "ran\nran\n");
}

#[tokio::test]
async fn check_mode_queues_and_signals_action() {
    let f = Fixture::new();
    f.plugin(
        "lint-core",
        r#"
[hook.lint]
command = "echo ran >> runs.log"
events = ["Stop"]
if_changed = ["*.ts"]
"#,
    );

    let mut options = f.options(HookEvent::Stop);
    options.check = true;
    let status = f.run(options, HookEvent::Stop).await;

    assert_eq!(status, ExitStatus::ActionRequired);
    assert_eq!(f.read_log("runs.log"), "", "check must not execute");

    let pending_dir = f.state.path().join("pending");
    let rows: Vec<_> = std::fs::read_dir(&pending_dir).unwrap().collect();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn wait_drains_a_checked_orchestration() {
    let f = Fixture::new();
    f.plugin(
        "lint-core",
        r#"
[hook.lint]
command = "echo ran >> runs.log"
events = ["Stop"]
if_changed = ["*.ts"]
"#,
    );

    let mut check = f.options(HookEvent::Stop);
    check.check = true;
    f.run(check, HookEvent::Stop).await;

    // The queued orchestration id is the pending row's file name
    let pending_dir = f.state.path().join("pending");
    let entry = std::fs::read_dir(&pending_dir).unwrap().next().unwrap().unwrap();
    let id = entry
        .path()
        .file_stem()
        .unwrap()
        .to_string_lossy()
        .to_string();

    let mut wait = f.options(HookEvent::Stop);
    wait.wait = true;
    wait.orchestration_id = Some(OrchestrationId::new(id.clone()));
    let status = f.run(wait, HookEvent::Stop).await;

    assert_eq!(status, ExitStatus::Success);
    assert_eq!(f.read_log("runs.log"), "ran\n");
    assert!(!entry.path().exists(), "pending rows are drained");

    let record = han_storage::OrchestrationStore::new(f.state_dir())
        .load(&OrchestrationId::new(id))
        .unwrap();
    assert_eq!(record.status, OrchestrationStatus::Completed);
}

#[tokio::test]
async fn stop_failures_count_attempts_until_stuck() {
    let f = Fixture::new();
    f.plugin(
        "tests",
        r#"
[hook.test-always-red]
command = "exit 1"
events = ["Stop"]
"#,
    );

    let attempts = AttemptStore::new(f.state_dir());
    let session = SessionId::new("s-1");

    for expected in 1..=3u32 {
        let status = f.run(f.options(HookEvent::Stop), HookEvent::Stop).await;
        assert_eq!(status, ExitStatus::ActionRequired);
        let counter = attempts
            .get(&session, "tests", "test-always-red", &f.root())
            .unwrap();
        assert_eq!(counter.consecutive_failures, expected);
        assert_eq!(counter.is_stuck(), expected >= 3);
    }
}

#[tokio::test]
async fn stop_success_resets_attempts() {
    let f = Fixture::new();
    f.plugin(
        "tests",
        r#"
[hook.test-gate]
command = "test -f ok"
events = ["Stop"]
"#,
    );

    let session = SessionId::new("s-1");
    let attempts = AttemptStore::new(f.state_dir());

    let status = f.run(f.options(HookEvent::Stop), HookEvent::Stop).await;
    assert_eq!(status, ExitStatus::ActionRequired);
    assert_eq!(
        attempts
            .get(&session, "tests", "test-gate", &f.root())
            .unwrap()
            .consecutive_failures,
        1
    );

    std::fs::write(f.project.path().join("ok"), "").unwrap();
    let status = f.run(f.options(HookEvent::Stop), HookEvent::Stop).await;
    assert_eq!(status, ExitStatus::Success);
    assert_eq!(
        attempts
            .get(&session, "tests", "test-gate", &f.root())
            .unwrap()
            .consecutive_failures,
        0
    );
}

#[tokio::test]
async fn fighting_fixers_exit_with_recursion() {
    let f = Fixture::new();
    // foo.txt starts in the state hook B restores; A flips it, B flips it
    // back — the detector sees the return to a prior state.
    std::fs::write(f.project.path().join("foo.txt"), "y\n").unwrap();
    f.plugin(
        "a",
        r#"
[hook.format-x]
command = "printf 'x\\n' > foo.txt"
events = ["SessionStart"]
if_changed = ["foo.txt"]
"#,
    );
    f.plugin(
        "b",
        r#"
[hook.test-y]
command = "printf 'y\\n' > foo.txt"
events = ["SessionStart"]
if_changed = ["foo.txt"]
"#,
    );

    let status = f
        .run(f.options(HookEvent::SessionStart), HookEvent::SessionStart)
        .await;
    assert_eq!(status, ExitStatus::Recursion);
}

#[tokio::test]
async fn fail_fast_skips_later_batches() {
    let f = Fixture::new();
    f.plugin(
        "style",
        r#"
[hook.lint-red]
command = "exit 1"
events = ["SessionStart"]
"#,
    );
    f.plugin(
        "tests",
        r#"
[hook.test-later]
command = "echo ran >> later.log"
events = ["SessionStart"]
"#,
    );

    let status = f
        .run(f.options(HookEvent::SessionStart), HookEvent::SessionStart)
        .await;
    assert_eq!(status, ExitStatus::ActionRequired);
    assert_eq!(f.read_log("later.log"), "", "later phases must not start");
}

#[tokio::test]
async fn no_fail_fast_runs_everything() {
    let f = Fixture::new();
    f.plugin(
        "style",
        r#"
[hook.lint-red]
command = "exit 1"
events = ["SessionStart"]
"#,
    );
    f.plugin(
        "tests",
        r#"
[hook.test-later]
command = "echo ran >> later.log"
events = ["SessionStart"]
"#,
    );

    let mut options = f.options(HookEvent::SessionStart);
    options.fail_fast = false;
    let status = f.run(options, HookEvent::SessionStart).await;
    assert_eq!(status, ExitStatus::ActionRequired);
    assert_eq!(f.read_log("later.log"), "ran\n");
}

#[tokio::test]
async fn payload_event_mismatch_is_an_error() {
    let f = Fixture::new();
    let raw = r#"{"session_id": "s-1", "hook_event_name": "Stop"}"#;
    let result = orchestrate(f.options(HookEvent::SessionStart), Some(raw.to_string())).await;
    assert!(matches!(result, Err(EngineError::Payload(_))));
}

#[tokio::test]
async fn deferred_wildcard_hook_runs_after_main_set() {
    let f = Fixture::new();
    f.plugin(
        "fmt",
        r#"
[hook.format-main]
command = "echo main >> order.log"
events = ["Stop"]
"#,
    );
    f.plugin(
        "docs",
        r#"
[hook.summary]
command = "echo summary >> order.log"
events = ["Stop"]

[[hook.summary.depends_on]]
plugin = "*"
hook = "*"
"#,
    );

    let status = f.run(f.options(HookEvent::Stop), HookEvent::Stop).await;
    assert_eq!(status, ExitStatus::Success);
    assert_eq!(f.read_log("order.log"), "main\nsummary\n");
}
