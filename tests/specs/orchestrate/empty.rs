//! Orchestrating with no installed plugins.

use crate::prelude::*;

#[test]
fn stop_with_no_plugins_reports_and_exits_zero() {
    let project = Project::empty();

    project
        .han()
        .args(&["orchestrate", "Stop"])
        .stdin(project.payload("Stop"))
        .passes()
        .stdout_eq("")
        .stderr_has("No hooks found for event type \"Stop\"");
}

#[test]
fn check_with_no_plugins_exits_zero() {
    let project = Project::empty();

    project
        .han()
        .args(&["orchestrate", "Stop", "--check"])
        .stdin(project.payload("Stop"))
        .passes()
        .stderr_has("No hooks found");
}
