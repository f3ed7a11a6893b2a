#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("task {0:?} is not running")]
    NotRunning(String),

    #[error("task {0:?} is already running")]
    AlreadyRunning(String),

    #[error("task {0:?} is owned by another supervisor")]
    OwnershipDenied(String),

    #[error("failed to spawn task {task:?}: {reason}")]
    SpawnFailed { task: String, reason: String },

    #[error("timed out acquiring the project start lock")]
    LockTimeout,

    #[error("stopping tasks failed: {0}")]
    Aggregate(String),

    #[error(transparent)]
    Storage(#[from] runbook_storage::StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SupervisorError {
    pub fn spawn_failed(task: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        SupervisorError::SpawnFailed {
            task: task.into(),
            reason: reason.to_string(),
        }
    }
}
