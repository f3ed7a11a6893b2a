//! Spawns and supervises shell-backed daemon tasks, one process group
//! per daemon, with cross-invocation ownership and orphan adoption.
//!
//! Process-group signaling is POSIX-only; there is no Windows job-object
//! fallback implemented here.
#[cfg(not(unix))]
compile_error!("runbook-supervisor requires a unix target for process-group signaling");

mod entry;
mod error;
mod process;
mod supervisor;

pub use entry::ProcessInfo;
pub use error::SupervisorError;
pub use supervisor::{ProcessStatus, ProcessSupervisor};

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use runbook_core::{SystemClock, TaskType};
    use runbook_storage::SessionStore;
    use uuid::Uuid;

    use super::*;

    async fn new_supervisor(state_dir: &std::path::Path) -> ProcessSupervisor {
        let session_store = Arc::new(SessionStore::new(state_dir.to_path_buf()));
        session_store.setup().expect("setup");
        ProcessSupervisor::new(state_dir, session_store, Arc::new(SystemClock))
            .await
            .expect("construct supervisor")
    }

    fn new_session(store: &SessionStore, task_name: &str) -> Uuid {
        store
            .new_session(
                &SystemClock,
                task_name,
                TaskType::Daemon,
                "sleep 30",
                "/tmp",
                None,
            )
            .expect("new_session")
    }

    #[tokio::test]
    async fn start_then_status_then_stop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session_store = Arc::new(SessionStore::new(dir.path().to_path_buf()));
        session_store.setup().expect("setup");
        let supervisor =
            ProcessSupervisor::new(dir.path(), Arc::clone(&session_store), Arc::new(SystemClock))
                .await
                .expect("construct");

        let session_id = new_session(&session_store, "sleeper");
        let log_path = dir.path().join("task.log");
        let pid = supervisor
            .start(
                "sleeper",
                session_id,
                "sleep 30",
                &BTreeMap::new(),
                dir.path(),
                &log_path,
                "/bin/sh",
            )
            .await
            .expect("start");
        assert!(pid > 0);

        let status = supervisor.status("sleeper").await;
        assert!(status.running);
        assert_eq!(status.pid, pid);

        supervisor.stop("sleeper").await.expect("stop");
        let status = supervisor.status("sleeper").await;
        assert!(!status.running);
        assert!(!process::is_alive(pid));
    }

    #[tokio::test]
    async fn start_twice_is_already_running() {
        let dir = tempfile::tempdir().expect("tempdir");
        let supervisor = new_supervisor(dir.path()).await;
        let session_store = SessionStore::new(dir.path().to_path_buf());
        let session_id = new_session(&session_store, "sleeper");
        let log_path = dir.path().join("task.log");

        supervisor
            .start(
                "sleeper",
                session_id,
                "sleep 30",
                &BTreeMap::new(),
                dir.path(),
                &log_path,
                "/bin/sh",
            )
            .await
            .expect("first start");

        let second_session = new_session(&session_store, "sleeper");
        let err = supervisor
            .start(
                "sleeper",
                second_session,
                "sleep 30",
                &BTreeMap::new(),
                dir.path(),
                &log_path,
                "/bin/sh",
            )
            .await
            .expect_err("should refuse");
        assert!(matches!(err, SupervisorError::AlreadyRunning(_)));

        supervisor.stop_all().await.expect("stop_all");
    }

    #[tokio::test]
    async fn non_owner_stop_is_denied_and_daemon_stays_alive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session_store = Arc::new(SessionStore::new(dir.path().to_path_buf()));
        session_store.setup().expect("setup");

        let owner =
            ProcessSupervisor::new(dir.path(), Arc::clone(&session_store), Arc::new(SystemClock))
                .await
                .expect("construct owner");
        let session_id = new_session(&session_store, "sleeper");
        let log_path = dir.path().join("task.log");
        let pid = owner
            .start(
                "sleeper",
                session_id,
                "sleep 30",
                &BTreeMap::new(),
                dir.path(),
                &log_path,
                "/bin/sh",
            )
            .await
            .expect("start");

        let stranger =
            ProcessSupervisor::new(dir.path(), Arc::clone(&session_store), Arc::new(SystemClock))
                .await
                .expect("construct stranger");
        let err = stranger.stop("sleeper").await.expect_err("should deny");
        assert!(matches!(err, SupervisorError::OwnershipDenied(_)));
        assert!(process::is_alive(pid));

        owner.stop("sleeper").await.expect("owner can stop");
        assert!(!process::is_alive(pid));
    }

    #[tokio::test]
    async fn stop_all_only_touches_owned_daemons() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session_store = Arc::new(SessionStore::new(dir.path().to_path_buf()));
        session_store.setup().expect("setup");

        let owner =
            ProcessSupervisor::new(dir.path(), Arc::clone(&session_store), Arc::new(SystemClock))
                .await
                .expect("construct owner");
        let session_id = new_session(&session_store, "foreign");
        let log_path = dir.path().join("task.log");
        let pid = owner
            .start(
                "foreign",
                session_id,
                "sleep 30",
                &BTreeMap::new(),
                dir.path(),
                &log_path,
                "/bin/sh",
            )
            .await
            .expect("start");

        let other =
            ProcessSupervisor::new(dir.path(), Arc::clone(&session_store), Arc::new(SystemClock))
                .await
                .expect("construct other");
        other.stop_all().await.expect("stop_all is a no-op here");
        assert!(process::is_alive(pid));

        owner.stop("foreign").await.expect("owner cleans up");
    }
}
