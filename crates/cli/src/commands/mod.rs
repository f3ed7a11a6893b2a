//! One module per CLI subcommand. Each `execute` builds its own
//! transient `ProcessSupervisor` against the shared state directory,
//! since there is no always-on daemon process for a subcommand to dial
//! into — every invocation restores supervisor state from disk instead.

pub mod list;
pub mod logs;
pub mod run;
pub mod start;
pub mod status;
pub mod stop;

use std::path::Path;
use std::sync::Arc;

use runbook_core::SystemClock;
use runbook_storage::SessionStore;
use runbook_supervisor::ProcessSupervisor;

use crate::error::CliError;

/// Build the storage/supervisor pair every daemon subcommand needs.
/// `SessionStore::setup` is idempotent, so this is safe to call on
/// every invocation rather than requiring a separate `init` step.
pub async fn open_supervisor(
    state_dir: &Path,
) -> Result<(Arc<SessionStore>, Arc<ProcessSupervisor>), CliError> {
    let session_store = Arc::new(SessionStore::new(state_dir.to_path_buf()));
    session_store.setup()?;
    let supervisor = Arc::new(
        ProcessSupervisor::new(state_dir, Arc::clone(&session_store), Arc::new(SystemClock)).await?,
    );
    Ok((session_store, supervisor))
}
