use rmcp::ErrorData as McpError;

/// Errors specific to turning manifest tasks into MCP tool calls. Wraps
/// the lower crates' errors rather than re-deriving them.
#[derive(Debug, thiserror::Error)]
pub enum RunbookMcpError {
    #[error(transparent)]
    Manifest(#[from] runbook_manifest::ManifestError),

    #[error(transparent)]
    Supervisor(#[from] runbook_supervisor::SupervisorError),

    #[error(transparent)]
    Storage(#[from] runbook_storage::StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RunbookMcpError> for McpError {
    fn from(err: RunbookMcpError) -> Self {
        McpError::internal_error(err.to_string(), None)
    }
}
