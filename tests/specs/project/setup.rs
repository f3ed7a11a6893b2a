//! Manifest resolution specs: single-file, config-directory, and
//! overrides-file merging, exercised through `runbook list`.

use crate::prelude::*;

#[test]
fn single_file_manifest_lists_its_tasks() {
    let temp = Project::empty();
    temp.with_sleep_runbook();

    temp.runbook()
        .args(&["list"])
        .passes()
        .stdout_has("sleep")
        .stdout_has("greet");
}

#[test]
fn config_directory_merges_multiple_files() {
    let temp = Project::empty();
    temp.file(
        "runbook.d/build.yaml",
        "build:\n  type: oneshot\n  command: echo building\n",
    );
    temp.file(
        "runbook.d/test.yaml",
        "test:\n  type: oneshot\n  command: echo testing\n",
    );

    let outcome = temp.runbook().args(&["list"]).passes();
    outcome.stdout_has("build");
    let outcome = temp.runbook().args(&["list"]).passes();
    outcome.stdout_has("test");
}

#[test]
fn overrides_file_wins_on_conflicting_task_names() {
    let temp = Project::empty();
    temp.file(
        "runbook.yaml",
        "build:\n  type: oneshot\n  description: original\n  command: echo original\n",
    );
    temp.file(
        "runbook.overrides.yaml",
        "build:\n  type: oneshot\n  description: overridden\n  command: echo overridden\n",
    );

    temp.runbook()
        .args(&["list"])
        .passes()
        .stdout_has("overridden")
        .stdout_lacks("original");
}

#[test]
fn missing_manifest_is_a_user_error() {
    let temp = Project::empty();

    temp.runbook()
        .args(&["list"])
        .fails_with_code(1)
        .stderr_has("no manifest found");
}

#[test]
fn unknown_task_is_a_user_error() {
    let temp = Project::empty();
    temp.with_sleep_runbook();

    temp.runbook()
        .args(&["run", "does-not-exist"])
        .fails_with_code(1)
        .stderr_has("unknown task");
}
