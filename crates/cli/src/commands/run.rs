use std::collections::BTreeMap;
use std::path::Path;

use runbook_manifest::{substitute, Manifest, TaskKind};
use runbook_storage::SessionStore;

use crate::error::CliError;

/// Run a oneshot task to completion, write its captured output to
/// stdout, and return its real exit code for the process to adopt —
/// `run` is the one subcommand whose exit status is the task's own,
/// not the 0/1/2 dispatch-error scheme the other subcommands use.
pub async fn execute(
    manifest: &Manifest,
    project_root: &Path,
    task_name: &str,
    params: &BTreeMap<String, String>,
) -> Result<i32, CliError> {
    let task = manifest
        .get(task_name)
        .ok_or_else(|| CliError::User(format!("unknown task {task_name:?}")))?;

    if task.kind != TaskKind::Oneshot {
        return Err(CliError::User(format!(
            "{task_name:?} is a daemon task; use `start`/`stop`/`status` instead of `run`"
        )));
    }

    let command = substitute(task_name, task, params)?;

    let state_dir = runbook_core::state_dir(project_root);
    let session_store = SessionStore::new(state_dir);
    session_store.setup()?;

    let outcome = runbook_mcp::run_oneshot(
        &session_store,
        &runbook_core::SystemClock,
        task_name,
        task,
        &command,
        project_root,
        Some(params.clone()),
    )
    .await?;

    print!("{}", outcome.output);
    Ok(outcome.exit_code)
}
