//! Maps every error this binary can produce onto the exit-code policy:
//! 0 success, 1 user errors (unknown task, config errors, ownership
//! violations), 2 internal failures (spawn failure, I/O errors).

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    User(String),

    #[error("{0}")]
    Internal(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::User(_) => 1,
            CliError::Internal(_) => 2,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CliError::User(msg) | CliError::Internal(msg) => msg,
        }
    }

    /// Prefix this error's message with the subcommand that produced
    /// it. Spec §7 requires "CLI subcommands print a single-line error
    /// to stderr prefixed by the subcommand name".
    pub fn with_subcommand(self, name: &str) -> Self {
        match self {
            CliError::User(msg) => CliError::User(format!("{name}: {msg}")),
            CliError::Internal(msg) => CliError::Internal(format!("{name}: {msg}")),
        }
    }
}

impl From<runbook_manifest::ManifestError> for CliError {
    fn from(err: runbook_manifest::ManifestError) -> Self {
        CliError::User(err.to_string())
    }
}

impl From<runbook_storage::StorageError> for CliError {
    fn from(err: runbook_storage::StorageError) -> Self {
        CliError::Internal(err.to_string())
    }
}

impl From<runbook_supervisor::SupervisorError> for CliError {
    fn from(err: runbook_supervisor::SupervisorError) -> Self {
        use runbook_supervisor::SupervisorError as E;
        match err {
            E::NotRunning(_) | E::AlreadyRunning(_) | E::OwnershipDenied(_) => {
                CliError::User(err.to_string())
            }
            E::SpawnFailed { .. } | E::LockTimeout | E::Aggregate(_) | E::Storage(_) | E::Io(_) => {
                CliError::Internal(err.to_string())
            }
        }
    }
}

impl From<runbook_mcp::RunbookMcpError> for CliError {
    fn from(err: runbook_mcp::RunbookMcpError) -> Self {
        CliError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Internal(err.to_string())
    }
}

impl From<runbook_storage::ServerRegistryError> for CliError {
    fn from(err: runbook_storage::ServerRegistryError) -> Self {
        CliError::Internal(err.to_string())
    }
}

impl From<crate::proxy::ProxyError> for CliError {
    fn from(err: crate::proxy::ProxyError) -> Self {
        CliError::Internal(err.to_string())
    }
}
