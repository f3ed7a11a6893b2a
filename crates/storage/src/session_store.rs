use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::Duration;
use regex::Regex;
use runbook_core::{Clock, SessionMetadata, TaskType};
use tracing::warn;
use uuid::Uuid;

use crate::atomic::write_atomic;
use crate::error::StorageError;

const GITIGNORE_CONTENTS: &str = "*\n!.gitignore\n";

/// Which log a `ReadLog` call should resolve.
#[derive(Debug, Clone)]
pub enum LogSelector {
    Task(String),
    Session(Uuid),
}

#[derive(Debug, Clone, Default)]
pub struct ReadLogOptions {
    pub tail_lines: Option<usize>,
    pub filter_regex: Option<Regex>,
}

/// Per-execution session directories: `task.log` plus `metadata.json`,
/// and the `latest/<task>` symlink pointing at the most recently
/// *started* session for a task.
#[derive(Debug, Clone)]
pub struct SessionStore {
    state_dir: PathBuf,
}

impl SessionStore {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    /// Create the state directory skeleton and write the one-time
    /// `.gitignore` sentinel. Idempotent — does not overwrite an
    /// existing `.gitignore` (a user may have customized it).
    pub fn setup(&self) -> Result<(), StorageError> {
        std::fs::create_dir_all(runbook_core::pids_dir(&self.state_dir))
            .map_err(|source| StorageError::io(&self.state_dir, source))?;
        std::fs::create_dir_all(runbook_core::sessions_dir(&self.state_dir))
            .map_err(|source| StorageError::io(&self.state_dir, source))?;
        let latest_dir = runbook_core::logs_dir(&self.state_dir).join("latest");
        std::fs::create_dir_all(&latest_dir)
            .map_err(|source| StorageError::io(&latest_dir, source))?;

        let gitignore = self.state_dir.join(".gitignore");
        if !gitignore.exists() {
            std::fs::write(&gitignore, GITIGNORE_CONTENTS)
                .map_err(|source| StorageError::io(&gitignore, source))?;
        }
        Ok(())
    }

    pub fn session_dir(&self, session_id: Uuid) -> PathBuf {
        runbook_core::session_dir(&self.state_dir, session_id)
    }

    fn metadata_path(&self, session_id: Uuid) -> PathBuf {
        self.session_dir(session_id).join("metadata.json")
    }

    pub fn log_path(&self, session_id: Uuid) -> PathBuf {
        self.session_dir(session_id).join("task.log")
    }

    fn latest_link(&self, task_name: &str) -> PathBuf {
        runbook_core::latest_link_path(&self.state_dir, task_name)
    }

    fn legacy_log_path(&self, task_name: &str) -> PathBuf {
        runbook_core::logs_dir(&self.state_dir).join(format!("{task_name}.log"))
    }

    /// Allocate a new session, write its initial metadata, point
    /// `latest/<task>` at it, and create an empty `task.log`.
    ///
    /// Directory-creation failures are fatal (propagated); a failure to
    /// update the `latest` symlink is a warning only, per the
    /// SessionStore failure semantics.
    #[allow(clippy::too_many_arguments)]
    pub fn new_session(
        &self,
        clock: &dyn Clock,
        task_name: &str,
        task_type: TaskType,
        command: &str,
        working_dir: &str,
        parameters: Option<BTreeMap<String, String>>,
    ) -> Result<Uuid, StorageError> {
        let session_id = Uuid::new_v4();
        let dir = self.session_dir(session_id);
        std::fs::create_dir_all(&dir).map_err(|source| StorageError::io(&dir, source))?;

        let metadata = SessionMetadata::new(
            session_id,
            task_name,
            task_type,
            clock.now(),
            command,
            working_dir,
            parameters,
        );
        self.write_metadata(&metadata)?;

        std::fs::File::create(self.log_path(session_id))
            .map_err(|source| StorageError::io(self.log_path(session_id), source))?;

        self.update_latest_link(task_name, session_id);

        Ok(session_id)
    }

    fn update_latest_link(&self, task_name: &str, session_id: Uuid) {
        let link = self.latest_link(task_name);
        if let Some(parent) = link.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %err, "failed to create latest/ directory");
                return;
            }
        }
        let target = PathBuf::from("..").join("sessions").join(session_id.to_string());

        let tmp = link.with_extension(format!("tmp-{session_id}"));
        if let Err(err) = symlink(&target, &tmp) {
            warn!(task = task_name, error = %err, "failed to create latest symlink");
            return;
        }
        if let Err(err) = std::fs::rename(&tmp, &link) {
            warn!(task = task_name, error = %err, "failed to install latest symlink");
            let _ = std::fs::remove_file(&tmp);
        }
    }

    /// Non-blocking-by-contract append: a plain append-mode write. No
    /// framing, no per-line buffering beyond the OS file buffer.
    pub fn append_output(&self, session_id: Uuid, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.log_path(session_id);
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|source| StorageError::io(&path, source))?;
        file.write_all(bytes)
            .map_err(|source| StorageError::io(&path, source))
    }

    /// Merge terminal fields into the session's metadata. Idempotent:
    /// once `end_time` is set, a second call is a no-op. A metadata
    /// write failure here is a warning, not a fatal error — the log
    /// file itself is the source of truth that the execution happened.
    pub fn finalize_session(
        &self,
        session_id: Uuid,
        clock: &dyn Clock,
        exit_code: i32,
        timed_out: bool,
    ) -> Result<(), StorageError> {
        let mut metadata = match self.read_metadata(session_id) {
            Ok(Some(m)) => m,
            Ok(None) => {
                warn!(%session_id, "finalize called on a session with no metadata");
                return Ok(());
            }
            Err(err) => {
                warn!(%session_id, error = %err, "failed to read metadata during finalize");
                return Ok(());
            }
        };

        if metadata.is_finalized() {
            return Ok(());
        }

        metadata.finalize(clock.now(), exit_code, timed_out);
        if let Err(err) = self.write_metadata(&metadata) {
            warn!(%session_id, error = %err, "failed to write finalized metadata");
        }
        Ok(())
    }

    fn write_metadata(&self, metadata: &SessionMetadata) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(metadata).map_err(|source| StorageError::Serialize {
            what: "SessionMetadata",
            source,
        })?;
        write_atomic(&self.metadata_path(metadata.session_id), &bytes)
    }

    /// Reads metadata for one session. A torn or unparsable file reads
    /// as `Ok(None)` rather than an error, so listing/cleanup callers
    /// can skip it without crashing.
    pub fn read_metadata(&self, session_id: Uuid) -> Result<Option<SessionMetadata>, StorageError> {
        let path = self.metadata_path(session_id);
        match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(metadata) => Ok(Some(metadata)),
                Err(_) => Ok(None),
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::io(path, source)),
        }
    }

    /// Resolve `task_name | session_id` to a log path, falling back to
    /// the legacy flat-file path if the `latest` symlink is absent.
    fn resolve_log_path(&self, selector: &LogSelector) -> Result<PathBuf, StorageError> {
        match selector {
            LogSelector::Session(id) => Ok(self.log_path(*id)),
            LogSelector::Task(task_name) => {
                let link = self.latest_link(task_name);
                match std::fs::read_link(&link) {
                    Ok(target) => {
                        let resolved = link
                            .parent()
                            .map(|p| p.join(&target))
                            .unwrap_or(target);
                        Ok(resolved)
                    }
                    Err(_) => Ok(self.legacy_log_path(task_name)),
                }
            }
        }
    }

    /// Open the resolved log, apply `filter_regex` as a full pass, then
    /// keep only the last `tail_lines` of whatever survives filtering.
    pub fn read_log(
        &self,
        selector: LogSelector,
        options: &ReadLogOptions,
    ) -> Result<Vec<String>, StorageError> {
        let path = self.resolve_log_path(&selector)?;
        let mut contents = String::new();
        std::fs::File::open(&path)
            .and_then(|mut f| f.read_to_string(&mut contents))
            .map_err(|source| StorageError::io(&path, source))?;

        let mut lines: Vec<String> = contents.lines().map(str::to_string).collect();

        if let Some(re) = &options.filter_regex {
            lines.retain(|line| re.is_match(line));
        }

        if let Some(n) = options.tail_lines {
            if lines.len() > n {
                lines = lines.split_off(lines.len() - n);
            }
        }

        Ok(lines)
    }

    /// Scan `sessions/`, read each `metadata.json`, filter by task, and
    /// sort newest-first. Sessions with unreadable metadata are silently
    /// skipped.
    pub fn list_sessions(
        &self,
        task_name: &str,
        limit: usize,
    ) -> Result<Vec<SessionMetadata>, StorageError> {
        let mut sessions = self.all_sessions_for_task(task_name)?;
        sessions.truncate(limit);
        Ok(sessions)
    }

    fn all_sessions_for_task(&self, task_name: &str) -> Result<Vec<SessionMetadata>, StorageError> {
        let dir = runbook_core::sessions_dir(&self.state_dir);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut sessions = Vec::new();
        let entries = std::fs::read_dir(&dir).map_err(|source| StorageError::io(&dir, source))?;
        for entry in entries {
            let entry = entry.map_err(|source| StorageError::io(&dir, source))?;
            let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|s| Uuid::parse_str(s).ok())
            else {
                continue;
            };
            if let Ok(Some(metadata)) = self.read_metadata(id) {
                if metadata.task_name == task_name {
                    sessions.push(metadata);
                }
            }
        }

        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(sessions)
    }

    /// Delete whole session directories older than `max_age` OR beyond
    /// the newest `max_sessions`. Errors removing an individual
    /// directory are logged and skipped, never aborting the sweep.
    pub fn cleanup(
        &self,
        task_name: &str,
        max_sessions: Option<usize>,
        max_age: Option<Duration>,
    ) -> Result<(), StorageError> {
        let sessions = self.all_sessions_for_task(task_name)?;
        let now = chrono::Utc::now();

        let mut to_delete = Vec::new();
        for (idx, session) in sessions.iter().enumerate() {
            let beyond_count = max_sessions.is_some_and(|max| idx >= max);
            let too_old = max_age.is_some_and(|age| now.signed_duration_since(session.start_time) > age);
            if beyond_count || too_old {
                to_delete.push(session.session_id);
            }
        }

        for session_id in to_delete {
            let dir = self.session_dir(session_id);
            if let Err(err) = std::fs::remove_dir_all(&dir) {
                warn!(path = %dir.display(), error = %err, "failed to remove session directory during cleanup");
            }
        }

        Ok(())
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
