use runbook_manifest::Manifest;
use runbook_storage::{LogSelector, ReadLogOptions, SessionStore};

use crate::error::CliError;

pub fn execute(
    manifest: &Manifest,
    session_store: &SessionStore,
    task_name: &str,
    tail_lines: Option<usize>,
    filter: Option<&str>,
    session: Option<&str>,
) -> Result<(), CliError> {
    manifest
        .get(task_name)
        .ok_or_else(|| CliError::User(format!("unknown task {task_name:?}")))?;

    let filter_regex = filter
        .map(regex::Regex::new)
        .transpose()
        .map_err(|err| CliError::User(format!("invalid --filter pattern: {err}")))?;

    let selector = match session {
        Some(raw) => {
            let id = uuid::Uuid::parse_str(raw)
                .map_err(|err| CliError::User(format!("invalid --session id: {err}")))?;
            LogSelector::Session(id)
        }
        None => LogSelector::Task(task_name.to_string()),
    };

    let lines = session_store.read_log(
        selector,
        &ReadLogOptions {
            tail_lines,
            filter_regex,
        },
    )?;

    for line in lines {
        println!("{line}");
    }
    Ok(())
}
