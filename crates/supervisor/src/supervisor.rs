use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use fs2::FileExt;
use nix::sys::signal::Signal;
use runbook_core::{Clock, DaemonRecord};
use runbook_storage::{PidRegistry, SessionStore};
use tokio::sync::{watch, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entry::{wait_for_done, ProcessEntry, ProcessInfo};
use crate::error::SupervisorError;
use crate::process;

/// SIGTERM-to-SIGKILL escalation window for `Stop`.
const STOP_GRACE: Duration = Duration::from_secs(5);
/// Liveness poll cadence for restored/adopted entries this supervisor
/// did not itself spawn.
const POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Exit code recorded for a restored daemon whose real exit status
/// cannot be reaped by a process that is not its parent.
const UNKNOWN_EXIT_CODE: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStatus {
    pub running: bool,
    pub pid: u32,
}

type EntryMap = Arc<RwLock<HashMap<String, ProcessEntry>>>;

/// In-memory table of daemons for one project, plus the operations
/// that keep it consistent with the on-disk `PidRegistry` and
/// `SessionStore`. One `ProcessSupervisor` is constructed per binary
/// invocation that needs daemon access; construction restores state
/// from disk, it is never itself persisted.
pub struct ProcessSupervisor {
    id: Uuid,
    lock_path: PathBuf,
    pid_registry: PidRegistry,
    session_store: Arc<SessionStore>,
    clock: Arc<dyn Clock>,
    entries: EntryMap,
}

impl ProcessSupervisor {
    /// Construct a supervisor against `state_dir`, restoring every
    /// live daemon recorded in the `PidRegistry`. See §4.4's
    /// three-way restoration branch: dead PID is dropped, a
    /// live-owner record is restored but not owned, everything else
    /// is adopted.
    pub async fn new(
        state_dir: &Path,
        session_store: Arc<SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SupervisorError> {
        let id = Uuid::new_v4();
        let pid_registry = PidRegistry::new(state_dir);
        let entries: EntryMap = Arc::new(RwLock::new(HashMap::new()));

        let supervisor = ProcessSupervisor {
            id,
            lock_path: state_dir.join(".lock"),
            pid_registry,
            session_store,
            clock,
            entries,
        };

        supervisor.restore().await?;
        Ok(supervisor)
    }

    async fn restore(&self) -> Result<(), SupervisorError> {
        for record in self.pid_registry.scan()? {
            if !process::is_alive(record.pid) {
                self.pid_registry.delete(&record.task_name)?;
                continue;
            }

            let owner_id = if process::is_alive(record.owner_pid) {
                record.owner_id
            } else {
                info!(task = %record.task_name, "adopting orphaned daemon");
                self.id
            };

            let (tx, rx) = watch::channel(false);
            let entry = ProcessEntry {
                pid: record.pid,
                owner_id,
                owner_pid: record.owner_pid,
                session_id: record.session_id,
                task_name: record.task_name.clone(),
                start_time: record.start_time,
                log_file: record.log_file.clone(),
                done_rx: rx,
            };
            self.entries
                .write()
                .await
                .insert(record.task_name.clone(), entry);

            spawn_poll_monitor(
                record.task_name,
                record.pid,
                record.session_id,
                Arc::clone(&self.entries),
                self.pid_registry.clone(),
                Arc::clone(&self.session_store),
                Arc::clone(&self.clock),
                tx,
            );
        }
        Ok(())
    }

    /// Serialize the check-then-spawn-then-persist critical section
    /// across OS processes with an advisory lock file, on top of the
    /// in-memory table's own mutual exclusion within this process.
    fn acquire_start_lock(&self) -> Result<std::fs::File, SupervisorError> {
        if let Some(parent) = self.lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(&self.lock_path)?;

        for _ in 0..200 {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(file),
                Err(_) => std::thread::sleep(Duration::from_millis(10)),
            }
        }
        Err(SupervisorError::LockTimeout)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn start(
        &self,
        task_name: &str,
        session_id: Uuid,
        command: &str,
        env: &BTreeMap<String, String>,
        cwd: &Path,
        log_path: &Path,
        shell: &str,
    ) -> Result<u32, SupervisorError> {
        let lock = self.acquire_start_lock()?;

        {
            let mut entries = self.entries.write().await;
            if let Some(existing) = entries.get(task_name) {
                if process::is_alive(existing.pid) {
                    return Err(SupervisorError::AlreadyRunning(task_name.to_string()));
                }
                entries.remove(task_name);
            }
        }

        let child = process::spawn_in_new_group(shell, command, cwd, env, log_path)?;
        let pid = child.id().ok_or_else(|| {
            SupervisorError::spawn_failed(task_name, "child exited before a pid was observed")
        })?;

        let record = DaemonRecord {
            pid,
            owner_id: self.id,
            owner_pid: std::process::id(),
            session_id,
            task_name: task_name.to_string(),
            start_time: self.clock.now(),
            log_file: log_path.display().to_string(),
        };
        self.pid_registry.write(&record)?;

        let (tx, rx) = watch::channel(false);
        let entry = ProcessEntry {
            pid,
            owner_id: self.id,
            owner_pid: record.owner_pid,
            session_id,
            task_name: task_name.to_string(),
            start_time: record.start_time,
            log_file: record.log_file.clone(),
            done_rx: rx,
        };
        self.entries
            .write()
            .await
            .insert(task_name.to_string(), entry);

        spawn_owned_monitor(
            task_name.to_string(),
            session_id,
            Arc::clone(&self.entries),
            self.pid_registry.clone(),
            Arc::clone(&self.session_store),
            Arc::clone(&self.clock),
            tx,
            child,
        );

        drop(lock);
        Ok(pid)
    }

    pub async fn stop(&self, task_name: &str) -> Result<(), SupervisorError> {
        let (pid, owner_id, mut done_rx) = {
            let entries = self.entries.read().await;
            match entries.get(task_name) {
                Some(entry) if process::is_alive(entry.pid) => {
                    (entry.pid, entry.owner_id, entry.done_rx.clone())
                }
                _ => return Err(SupervisorError::NotRunning(task_name.to_string())),
            }
        };

        if owner_id != self.id {
            return Err(SupervisorError::OwnershipDenied(task_name.to_string()));
        }

        process::signal_group(pid, Signal::SIGTERM)?;

        if tokio::time::timeout(STOP_GRACE, wait_for_done(&mut done_rx))
            .await
            .is_err()
        {
            warn!(task_name, pid, "grace period elapsed, sending SIGKILL");
            process::signal_group(pid, Signal::SIGKILL)?;
            wait_for_done(&mut done_rx).await;
        }

        // The monitor already removed the entry and pid file by the
        // time `done` flips; these are defensive no-ops if it raced us.
        self.entries.write().await.remove(task_name);
        self.pid_registry.delete(task_name)?;

        Ok(())
    }

    pub async fn status(&self, task_name: &str) -> ProcessStatus {
        let entries = self.entries.read().await;
        match entries.get(task_name) {
            Some(entry) if process::is_alive(entry.pid) => ProcessStatus {
                running: true,
                pid: entry.pid,
            },
            _ => ProcessStatus {
                running: false,
                pid: 0,
            },
        }
    }

    /// Stop every daemon owned by this supervisor instance. Snapshots
    /// owned task names under the lock, then releases it before
    /// calling `stop` on each — `stop` needs its own read lock, and a
    /// monitor task may need the write lock concurrently to clean up.
    pub async fn stop_all(&self) -> Result<(), SupervisorError> {
        let owned: Vec<String> = {
            let entries = self.entries.read().await;
            entries
                .values()
                .filter(|entry| entry.owner_id == self.id)
                .map(|entry| entry.task_name.clone())
                .collect()
        };

        let mut failures = Vec::new();
        for task_name in owned {
            if let Err(err) = self.stop(&task_name).await {
                failures.push(format!("{task_name}: {err}"));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SupervisorError::Aggregate(failures.join("; ")))
        }
    }

    pub async fn get_session_id(&self, task_name: &str) -> Option<Uuid> {
        self.entries
            .read()
            .await
            .get(task_name)
            .map(|entry| entry.session_id)
    }

    pub async fn get_process_info(&self, task_name: &str) -> Option<ProcessInfo> {
        self.entries
            .read()
            .await
            .get(task_name)
            .map(ProcessEntry::info)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

#[allow(clippy::too_many_arguments)]
fn spawn_owned_monitor(
    task_name: String,
    session_id: Uuid,
    entries: EntryMap,
    pid_registry: PidRegistry,
    session_store: Arc<SessionStore>,
    clock: Arc<dyn Clock>,
    done_tx: watch::Sender<bool>,
    mut child: tokio::process::Child,
) {
    tokio::spawn(async move {
        let status = child.wait().await;
        let exit_code = match status {
            Ok(status) => status.code().unwrap_or(UNKNOWN_EXIT_CODE),
            Err(err) => {
                warn!(task_name, error = %err, "failed to reap child, marking exit unknown");
                UNKNOWN_EXIT_CODE
            }
        };

        if let Err(err) = session_store.finalize_session(session_id, clock.as_ref(), exit_code, false) {
            warn!(task_name, error = %err, "failed to finalize session metadata");
        }
        if let Err(err) = pid_registry.delete(&task_name) {
            warn!(task_name, error = %err, "failed to delete pid file on exit");
        }
        entries.write().await.remove(&task_name);
        let _ = done_tx.send(true);
    });
}

#[allow(clippy::too_many_arguments)]
fn spawn_poll_monitor(
    task_name: String,
    pid: u32,
    session_id: Uuid,
    entries: EntryMap,
    pid_registry: PidRegistry,
    session_store: Arc<SessionStore>,
    clock: Arc<dyn Clock>,
    done_tx: watch::Sender<bool>,
) {
    tokio::spawn(async move {
        loop {
            if !process::is_alive(pid) {
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        if let Err(err) =
            session_store.finalize_session(session_id, clock.as_ref(), UNKNOWN_EXIT_CODE, false)
        {
            warn!(task_name, error = %err, "failed to finalize session metadata");
        }
        if let Err(err) = pid_registry.delete(&task_name) {
            warn!(task_name, error = %err, "failed to delete pid file on exit");
        }
        entries.write().await.remove(&task_name);
        let _ = done_tx.send(true);
    });
}
