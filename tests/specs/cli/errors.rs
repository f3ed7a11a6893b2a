//! CLI-surface specs: global flags, legacy `-init`, and malformed
//! invocations that must fail before ever touching a task.

use crate::prelude::*;

#[test]
fn init_writes_a_manifest_template() {
    let temp = Project::empty();

    temp.runbook().args(&["-init"]).passes();
    assert!(temp.path().join("runbook.yaml").is_file());

    temp.runbook()
        .args(&["list"])
        .passes()
        .stdout_has("build")
        .stdout_has("watch");
}

#[test]
fn init_refuses_to_overwrite_an_existing_manifest() {
    let temp = Project::empty();
    temp.with_sleep_runbook();

    temp.runbook()
        .args(&["-init"])
        .fails_with_code(1)
        .stderr_has("refusing to overwrite");
}

#[test]
fn unrecognized_legacy_flag_is_a_user_error() {
    let temp = Project::empty();
    temp.with_sleep_runbook();

    temp.runbook()
        .args(&["-bogus-flag"])
        .fails_with_code(1)
        .stderr_has("unrecognized argument");
}

#[test]
fn config_flag_without_a_value_is_a_user_error() {
    let temp = Project::empty();

    temp.runbook()
        .args(&["--config"])
        .fails_with_code(1)
        .stderr_has("--config requires a path argument");
}

#[test]
fn working_dir_flag_points_list_at_another_project() {
    let temp = Project::empty();
    let other = Project::empty();
    other.with_sleep_runbook();

    temp.runbook()
        .args(&["--working-dir", other.path().to_str().expect("utf8 path"), "list"])
        .passes()
        .stdout_has("sleep");
}

#[test]
fn single_dash_local_flag_is_transparent_before_a_subcommand() {
    let temp = Project::empty();
    temp.with_sleep_runbook();

    temp.runbook()
        .args(&["-local", "list"])
        .passes()
        .stdout_has("sleep");
}

#[test]
fn completions_emit_a_script_for_bash() {
    let temp = Project::empty();

    temp.runbook()
        .args(&["completions", "bash"])
        .passes()
        .stdout_has("runbook");
}
