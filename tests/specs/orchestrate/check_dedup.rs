//! Check-mode reporting and dedup.

use crate::prelude::*;

const LINT_MANIFEST: &str = r#"
[hook.lint]
command = "echo ran >> runs.log"
events = ["Stop"]
if_changed = ["**/*.ts"]
"#;

#[test]
fn check_reports_once_within_the_dedup_window() {
    let project = Project::empty();
    project.plugin("lint-core", LINT_MANIFEST);
    project.file("a.ts", "const a = 1;");

    project
        .han()
        .args(&["orchestrate", "Stop", "--check"])
        .stdin(project.payload("Stop"))
        .exits(2)
        .stderr_has("Validation needed")
        .stderr_has("lint-core/lint")
        .stderr_has("--wait --orchestration-id");

    // Same pending set, same session, inside the window: silent, but the
    // exit code still says "action required".
    project
        .han()
        .args(&["orchestrate", "Stop", "--check"])
        .stdin(project.payload("Stop"))
        .exits(2)
        .stderr_lacks("Validation needed");
}

#[test]
fn check_groups_wildcard_hooks_under_post_validation() {
    let project = Project::empty();
    project.plugin("lint-core", LINT_MANIFEST);
    project.file("a.ts", "const a = 1;");
    project.plugin(
        "docs",
        r#"
[hook.summary]
command = "echo summary"
events = ["Stop"]

[[hook.summary.depends_on]]
plugin = "*"
hook = "*"
"#,
    );

    project
        .han()
        .args(&["orchestrate", "Stop", "--check"])
        .stdin(project.payload("Stop"))
        .exits(2)
        .stderr_has("post-validation:")
        .stderr_has("docs/summary");
}

#[test]
fn check_then_wait_drains_the_queued_orchestration() {
    let project = Project::empty();
    project.plugin("lint-core", LINT_MANIFEST);
    project.file("a.ts", "const a = 1;");

    let stderr = project
        .han()
        .args(&["orchestrate", "Stop", "--check"])
        .stdin(project.payload("Stop"))
        .exits(2)
        .stderr();

    // The report names the exact command to run next
    let line = stderr
        .lines()
        .find(|l| l.starts_with("Run: "))
        .expect("check report should include the wait command")
        .trim_start_matches("Run: ")
        .to_string();
    let args: Vec<&str> = line.split_whitespace().skip(1).collect();

    project
        .han()
        .args(&args)
        .stdin(project.payload("Stop"))
        .passes();
    similar_asserts::assert_eq!(project.read("runs.log"), "ran\n");
}
