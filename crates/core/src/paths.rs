use std::path::{Path, PathBuf};

use uuid::Uuid;

/// `.runbook/` under the project root. State is project-local per
/// the ownership model — no XDG indirection, no project-path hashing.
pub fn state_dir(project_root: &Path) -> PathBuf {
    project_root.join(".runbook")
}

pub fn pids_dir(state: &Path) -> PathBuf {
    state.join("pids")
}

pub fn pid_file_path(state: &Path, task_name: &str) -> PathBuf {
    pids_dir(state).join(format!("{task_name}.pid"))
}

pub fn logs_dir(state: &Path) -> PathBuf {
    state.join("logs")
}

pub fn sessions_dir(state: &Path) -> PathBuf {
    logs_dir(state).join("sessions")
}

pub fn session_dir(state: &Path, session_id: Uuid) -> PathBuf {
    sessions_dir(state).join(session_id.to_string())
}

pub fn latest_link_path(state: &Path, task_name: &str) -> PathBuf {
    logs_dir(state).join("latest").join(task_name)
}

pub fn server_record_path(state: &Path) -> PathBuf {
    state.join("server.json")
}
