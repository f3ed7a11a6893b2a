use std::collections::BTreeMap;
use std::path::Path;

use runbook_core::{SystemClock, TaskType};
use runbook_manifest::{substitute, Manifest, TaskKind};
use runbook_storage::SessionStore;
use runbook_supervisor::ProcessSupervisor;

use crate::error::CliError;

pub async fn execute(
    manifest: &Manifest,
    session_store: &SessionStore,
    supervisor: &ProcessSupervisor,
    project_root: &Path,
    task_name: &str,
    params: &BTreeMap<String, String>,
) -> Result<(), CliError> {
    let task = manifest
        .get(task_name)
        .ok_or_else(|| CliError::User(format!("unknown task {task_name:?}")))?;

    if task.kind != TaskKind::Daemon {
        return Err(CliError::User(format!(
            "{task_name:?} is a oneshot task; use `run` instead of `start`"
        )));
    }

    let command = substitute(task_name, task, params)?;
    let cwd = task
        .cwd
        .as_ref()
        .map(|c| project_root.join(c))
        .unwrap_or_else(|| project_root.to_path_buf());

    let session_id = session_store.new_session(
        &SystemClock,
        task_name,
        TaskType::Daemon,
        &command,
        &cwd.display().to_string(),
        Some(params.clone()),
    )?;
    let log_path = session_store.log_path(session_id);

    let pid = supervisor
        .start(
            task_name,
            session_id,
            &command,
            &task.env,
            &cwd,
            &log_path,
            task.shell_or_default(),
        )
        .await?;

    eprintln!("started {task_name} (pid {pid}, session {session_id})");
    Ok(())
}
