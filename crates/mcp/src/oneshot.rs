//! Oneshot task execution. Not part of `ProcessSupervisor` — oneshot
//! tasks are not daemons, have no PID-registry entry, and never
//! outlive this call.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::Path;
use std::process::Stdio;

use runbook_core::{Clock, TaskType};
use runbook_manifest::TaskDef;
use runbook_storage::SessionStore;
use tokio::process::Command;
use uuid::Uuid;

use crate::error::RunbookMcpError;

pub struct OneshotOutcome {
    pub session_id: Uuid,
    pub exit_code: i32,
    pub output: String,
}

/// Open a new session, run `shell -c command` to completion with
/// stdout and stderr both appended to the same session-log fd — the
/// same `spawn_in_new_group` trick `runbook-supervisor` uses for
/// daemons — so bytes land in the log in the order the subprocess
/// actually wrote them, rather than as two buffers merged after the
/// fact. The log is then read back in full as the tool result — no
/// streaming back to the caller mid-run.
pub async fn run_oneshot(
    session_store: &SessionStore,
    clock: &dyn Clock,
    task_name: &str,
    task: &TaskDef,
    command: &str,
    project_root: &Path,
    params: Option<BTreeMap<String, String>>,
) -> Result<OneshotOutcome, RunbookMcpError> {
    let cwd = task
        .cwd
        .as_ref()
        .map(|c| project_root.join(c))
        .unwrap_or_else(|| project_root.to_path_buf());

    let session_id = session_store.new_session(
        clock,
        task_name,
        TaskType::Oneshot,
        command,
        &cwd.display().to_string(),
        params,
    )?;

    let log_path = session_store.log_path(session_id);
    let stdout_log = OpenOptions::new()
        .append(true)
        .open(&log_path)
        .map_err(RunbookMcpError::Io)?;
    let stderr_log = stdout_log.try_clone().map_err(RunbookMcpError::Io)?;

    let mut child = Command::new(task.shell_or_default())
        .arg("-c")
        .arg(command)
        .current_dir(&cwd)
        .envs(&task.env)
        .stdin(Stdio::null())
        .stdout(stdout_log)
        .stderr(stderr_log)
        .spawn()
        .map_err(RunbookMcpError::Io)?;

    let status = child.wait().await.map_err(RunbookMcpError::Io)?;
    let exit_code = status.code().unwrap_or(-1);
    session_store.finalize_session(session_id, clock, exit_code, false)?;

    let output_bytes = std::fs::read(&log_path).map_err(RunbookMcpError::Io)?;
    let output = String::from_utf8_lossy(&output_bytes).into_owned();

    Ok(OneshotOutcome {
        session_id,
        exit_code,
        output,
    })
}
