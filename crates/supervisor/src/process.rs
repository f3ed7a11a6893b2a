//! Process-group spawning and signaling. A daemon is launched as the
//! leader of its own process group (PGID == PID) via the stable,
//! safe `process_group` builder method — no `pre_exec`/`setsid`
//! needed, which keeps this crate free of `unsafe`. Stopping a daemon
//! then means signaling the negative PID, reaching every descendant
//! that never called `setsid` itself.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Stdio;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};

use crate::error::SupervisorError;

/// Spawn `shell -c command`, appending stdout/stderr to `log_path`,
/// with `env` layered on top of the current environment.
pub fn spawn_in_new_group(
    shell: &str,
    command: &str,
    cwd: &Path,
    env: &BTreeMap<String, String>,
    log_path: &Path,
) -> Result<Child, SupervisorError> {
    let stdout_log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|source| {
            SupervisorError::spawn_failed(command, format!("opening log file: {source}"))
        })?;
    let stderr_log = stdout_log
        .try_clone()
        .map_err(|source| SupervisorError::spawn_failed(command, source))?;

    let mut cmd = Command::new(shell);
    cmd.arg("-c")
        .arg(command)
        .current_dir(cwd)
        .envs(env)
        .stdin(Stdio::null())
        .stdout(stdout_log)
        .stderr(stderr_log)
        // Own process group, leader == this process. Safe stdlib API;
        // equivalent in effect to the setsid() a shell would otherwise
        // need for the whole tree to share one signalable PGID.
        .process_group(0);

    cmd.spawn()
        .map_err(|source| SupervisorError::spawn_failed(command, source))
}

/// `kill(pid, 0)` — true iff the OS still has this PID.
pub fn is_alive(pid: u32) -> bool {
    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    kill(Pid::from_raw(raw), None).is_ok()
}

/// Signal the whole process group led by `pid`. A group that has
/// already exited (`ESRCH`) is treated as success — the caller's goal
/// ("make sure it's gone") is already satisfied.
pub fn signal_group(pid: u32, signal: Signal) -> Result<(), SupervisorError> {
    let raw = i32::try_from(pid)
        .map_err(|_| SupervisorError::Io(std::io::Error::other("pid out of range")))?;
    match kill(Pid::from_raw(-raw), signal) {
        Ok(()) => Ok(()),
        Err(nix::errno::Errno::ESRCH) => Ok(()),
        Err(errno) => Err(SupervisorError::Io(std::io::Error::from_raw_os_error(
            errno as i32,
        ))),
    }
}
