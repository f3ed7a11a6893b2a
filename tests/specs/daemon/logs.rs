//! `logs` specs: tail lines, regex filtering, and session selection.

use crate::prelude::*;

#[test]
fn logs_shows_daemon_output() {
    let temp = Project::empty();
    temp.file(
        "runbook.yaml",
        "echoer:\n  type: daemon\n  command: echo daemon-output && sleep 30\n",
    );
    temp.runbook().args(&["start", "echoer"]).passes();

    let found = wait_for(SPEC_WAIT_MAX_MS, || {
        temp.runbook()
            .args(&["logs", "echoer"])
            .passes()
            .stdout
            .contains("daemon-output")
    });
    assert!(found, "daemon output should reach the log file");

    temp.runbook().args(&["stop", "echoer"]).passes();
}

#[test]
fn logs_respects_lines_limit() {
    let temp = Project::empty();
    temp.file(
        "runbook.yaml",
        "counter:\n  type: oneshot\n  command: printf 'one\\ntwo\\nthree\\n'\n",
    );
    temp.runbook().args(&["run", "counter"]).passes();

    let outcome = temp
        .runbook()
        .args(&["logs", "counter", "--lines=1"])
        .passes();
    assert_eq!(outcome.stdout.lines().count(), 1);
    assert!(outcome.stdout.contains("three"));
}

#[test]
fn logs_filter_matches_regex() {
    let temp = Project::empty();
    temp.file(
        "runbook.yaml",
        "counter:\n  type: oneshot\n  command: printf 'alpha\\nbeta\\ngamma\\n'\n",
    );
    temp.runbook().args(&["run", "counter"]).passes();

    temp.runbook()
        .args(&["logs", "counter", "--filter=^(alpha|gamma)$"])
        .passes()
        .stdout_has("alpha")
        .stdout_has("gamma")
        .stdout_lacks("beta");
}

#[test]
fn logs_invalid_filter_is_a_user_error() {
    let temp = Project::empty();
    temp.file(
        "runbook.yaml",
        "counter:\n  type: oneshot\n  command: echo hi\n",
    );
    temp.runbook().args(&["run", "counter"]).passes();

    temp.runbook()
        .args(&["logs", "counter", "--filter=("])
        .fails_with_code(1)
        .stderr_has("invalid --filter pattern");
}
