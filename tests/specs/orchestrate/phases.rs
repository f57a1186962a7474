//! Phase ordering: format < lint < typecheck < test.

use crate::prelude::*;

#[test]
fn stop_wait_runs_phases_in_order() {
    let project = Project::empty();
    project.plugin(
        "tests",
        r#"
[hook.test-bun]
command = "echo test >> order.log"
events = ["Stop"]
"#,
    );
    project.plugin(
        "types",
        r#"
[hook.typecheck-tsc]
command = "echo typecheck >> order.log"
events = ["Stop"]
"#,
    );
    project.plugin(
        "style",
        r#"
[hook.lint-eslint]
command = "echo lint >> order.log"
events = ["Stop"]
"#,
    );
    project.plugin(
        "fmt",
        r#"
[hook.format-prettier]
command = "echo format >> order.log"
events = ["Stop"]
"#,
    );

    project
        .han()
        .args(&["orchestrate", "Stop", "--wait"])
        .stdin(project.payload("Stop"))
        .passes();

    similar_asserts::assert_eq!(
        project.read("order.log"),
        "format\nlint\ntypecheck\ntest\n"
    );
}

#[test]
fn non_stop_events_run_without_the_coordinator() {
    let project = Project::empty();
    project.plugin(
        "greeter",
        r#"
[hook.on-start]
command = "echo started >> start.log"
events = ["SessionStart"]
"#,
    );

    project
        .han()
        .args(&["orchestrate", "SessionStart"])
        .stdin(project.payload("SessionStart"))
        .passes();

    similar_asserts::assert_eq!(project.read("start.log"), "started\n");
}
