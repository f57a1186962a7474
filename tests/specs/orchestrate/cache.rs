//! Change-driven caching.

use crate::prelude::*;

const LINT_MANIFEST: &str = r#"
[hook.lint]
command = "echo ran >> runs.log"
events = ["Stop"]
if_changed = ["**/*.ts"]
"#;

#[test]
fn cached_hook_produces_a_check_noop() {
    let project = Project::empty();
    project.plugin("lint-core", LINT_MANIFEST);
    project.file("a.ts", "const a = 1;");

    // First run executes and commits the baseline
    project
        .han()
        .args(&["orchestrate", "Stop", "--wait"])
        .stdin(project.payload("Stop"))
        .passes();
    similar_asserts::assert_eq!(project.read("runs.log"), "ran\n");

    // No filesystem changes since: check mode reports nothing to do
    project
        .han()
        .args(&["orchestrate", "Stop", "--check"])
        .stdin(project.payload("Stop"))
        .passes()
        .stderr_has("No validation needed");
}

#[test]
fn second_wait_run_skips_unchanged_hook() {
    let project = Project::empty();
    project.plugin("lint-core", LINT_MANIFEST);
    project.file("a.ts", "const a = 1;");

    for _ in 0..2 {
        project
            .han()
            .args(&["orchestrate", "Stop", "--wait"])
            .stdin(project.payload("Stop"))
            .passes();
    }

    similar_asserts::assert_eq!(project.read("runs.log"), "ran\n");
}

#[test]
fn all_files_ignores_the_cache() {
    let project = Project::empty();
    project.plugin("lint-core", LINT_MANIFEST);
    project.file("a.ts", "const a = 1;");

    for _ in 0..2 {
        project
            .han()
            .args(&["orchestrate", "Stop", "--wait", "--all-files"])
            .stdin(project.payload("Stop"))
            .passes();
    }

    similar_asserts::assert_eq!(project.read("runs.log"), "ran\nran\n");
}
