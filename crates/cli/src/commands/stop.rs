use runbook_manifest::Manifest;
use runbook_supervisor::ProcessSupervisor;

use crate::error::CliError;

pub async fn execute(
    manifest: &Manifest,
    supervisor: &ProcessSupervisor,
    task_name: &str,
) -> Result<(), CliError> {
    manifest
        .get(task_name)
        .ok_or_else(|| CliError::User(format!("unknown task {task_name:?}")))?;

    supervisor.stop(task_name).await?;
    eprintln!("stopped {task_name}");
    Ok(())
}
