use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted at `<state>/pids/<task_name>.pid`. Field names are a wire
/// contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonRecord {
    pub pid: u32,
    pub owner_id: Uuid,
    pub owner_pid: u32,
    pub session_id: Uuid,
    pub task_name: String,
    pub start_time: DateTime<Utc>,
    pub log_file: String,
}
