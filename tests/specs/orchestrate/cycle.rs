//! Hash-cycle detection: two auto-fixers fighting over one file.

use crate::prelude::*;

#[test]
fn fighting_fixers_exit_three() {
    let project = Project::empty();
    // foo.txt starts in the state the later hook restores
    project.file("foo.txt", "y\n");
    project.plugin(
        "a",
        r#"
[hook.format-x]
command = "printf 'x\\n' > foo.txt"
events = ["Stop"]
if_changed = ["foo.txt"]
"#,
    );
    project.plugin(
        "b",
        r#"
[hook.test-y]
command = "printf 'y\\n' > foo.txt"
events = ["Stop"]
if_changed = ["foo.txt"]
"#,
    );

    project
        .han()
        .args(&["orchestrate", "Stop", "--wait"])
        .stdin(project.payload("Stop"))
        .exits(3)
        .stderr_has("File-hash cycle detected");
}
