use std::path::{Path, PathBuf};

use runbook_core::DaemonRecord;
use tracing::warn;

use crate::atomic::write_atomic;
use crate::error::StorageError;

/// On-disk registry of live daemons, one JSON file per task under
/// `<state>/pids/`. Every operation is a fresh filesystem read or write;
/// nothing is cached in memory here, since the registry is shared across
/// process boundaries.
#[derive(Debug, Clone)]
pub struct PidRegistry {
    dir: PathBuf,
}

impl PidRegistry {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            dir: runbook_core::pids_dir(state_dir),
        }
    }

    fn path_for(&self, task_name: &str) -> PathBuf {
        self.dir.join(format!("{task_name}.pid"))
    }

    pub fn write(&self, record: &DaemonRecord) -> Result<(), StorageError> {
        let path = self.path_for(&record.task_name);
        let bytes = serde_json::to_vec_pretty(record).map_err(|source| StorageError::Serialize {
            what: "DaemonRecord",
            source,
        })?;
        write_atomic(&path, &bytes)
    }

    pub fn read(&self, task_name: &str) -> Result<Option<DaemonRecord>, StorageError> {
        let path = self.path_for(task_name);
        match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(record) => Ok(Some(record)),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "unparsable pid file, deleting");
                    let _ = std::fs::remove_file(&path);
                    Ok(None)
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::io(path, source)),
        }
    }

    pub fn delete(&self, task_name: &str) -> Result<(), StorageError> {
        let path = self.path_for(task_name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::io(path, source)),
        }
    }

    /// Scan every `.pid` file under the registry directory. Files that
    /// fail to parse as a `DaemonRecord` are deleted and skipped; the
    /// caller is never handed a parse error.
    pub fn scan(&self) -> Result<Vec<DaemonRecord>, StorageError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let entries = std::fs::read_dir(&self.dir).map_err(|source| StorageError::io(&self.dir, source))?;
        for entry in entries {
            let entry = entry.map_err(|source| StorageError::io(&self.dir, source))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("pid") {
                continue;
            }
            match std::fs::read(&path) {
                Ok(bytes) => match serde_json::from_slice::<DaemonRecord>(&bytes) {
                    Ok(record) => records.push(record),
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "unparsable pid file, deleting");
                        let _ = std::fs::remove_file(&path);
                    }
                },
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to read pid file, deleting");
                    let _ = std::fs::remove_file(&path);
                }
            }
        }
        Ok(records)
    }
}
