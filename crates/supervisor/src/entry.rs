use chrono::{DateTime, Utc};
use tokio::sync::watch;
use uuid::Uuid;

/// In-memory mirror of a `DaemonRecord`, plus the bits that only make
/// sense at runtime: a `done` channel the monitor closes on exit. No
/// `Cmd`/`Child` handle lives here — only the monitor task that owns
/// the child needs it; this entry is what `Status`/`Stop` observe.
pub struct ProcessEntry {
    pub pid: u32,
    pub owner_id: Uuid,
    pub owner_pid: u32,
    pub session_id: Uuid,
    pub task_name: String,
    pub start_time: DateTime<Utc>,
    pub log_file: String,
    pub done_rx: watch::Receiver<bool>,
}

impl ProcessEntry {
    pub fn info(&self) -> ProcessInfo {
        ProcessInfo {
            pid: self.pid,
            owner_id: self.owner_id,
            session_id: self.session_id,
            task_name: self.task_name.clone(),
            start_time: self.start_time,
            log_file: self.log_file.clone(),
        }
    }
}

/// Observational snapshot of a `ProcessEntry`, safe to hand out to
/// callers (no channel, cloneable).
#[derive(Debug, Clone)]
pub struct ProcessInfo {
    pub pid: u32,
    pub owner_id: Uuid,
    pub session_id: Uuid,
    pub task_name: String,
    pub start_time: DateTime<Utc>,
    pub log_file: String,
}

/// Block until the entry's monitor reports the process has exited.
/// Checks the already-observed value first so a `done` that flipped
/// before we started waiting isn't missed.
pub async fn wait_for_done(rx: &mut watch::Receiver<bool>) {
    if *rx.borrow() {
        return;
    }
    let _ = rx.changed().await;
}
