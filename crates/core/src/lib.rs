//! Shared types and small utilities used by every `runbook` crate.
//!
//! This crate owns the on-disk JSON schemas (session metadata, daemon
//! records, server records) so that storage, supervisor, mcp and cli
//! all agree on one definition instead of re-deriving them.

mod clock;
mod daemon_record;
mod paths;
mod server_record;
mod session;

pub use clock::{Clock, SystemClock};
pub use daemon_record::DaemonRecord;
pub use paths::{
    latest_link_path, logs_dir, pid_file_path, pids_dir, server_record_path, session_dir,
    sessions_dir, state_dir,
};
pub use server_record::ServerRecord;
pub use session::{SessionMetadata, TaskType};
