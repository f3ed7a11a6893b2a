//! `run` tests: output capture, parameter substitution, and the
//! policy of exiting with the child task's own exit code on success.

use crate::prelude::*;

#[test]
fn run_prints_captured_stdout() {
    let temp = Project::empty();
    temp.with_sleep_runbook();

    temp.runbook()
        .args(&["run", "greet"])
        .passes()
        .stdout_has("hello world");
}

#[test]
fn run_substitutes_supplied_parameter_over_default() {
    let temp = Project::empty();
    temp.with_sleep_runbook();

    temp.runbook()
        .args(&["run", "greet", "--name=runbook"])
        .passes()
        .stdout_has("hello runbook");
}

#[test]
fn run_propagates_the_child_exit_code() {
    let temp = Project::empty();
    temp.file(
        "runbook.yaml",
        "fail:\n  type: oneshot\n  command: exit 7\n",
    );

    temp.runbook().args(&["run", "fail"]).fails_with_code(7);
}

#[test]
fn run_on_a_daemon_task_is_a_user_error() {
    let temp = Project::empty();
    temp.with_sleep_runbook();

    temp.runbook()
        .args(&["run", "sleep"])
        .fails_with_code(1)
        .stderr_has("daemon task");
}
