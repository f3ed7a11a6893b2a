use std::path::{Path, PathBuf};

use runbook_core::ServerRecord;

use crate::atomic::write_atomic;
use crate::error::StorageError;

/// `<state>/server.json`, present iff a supervisor intends to serve HTTP
/// for this project.
#[derive(Debug, Clone)]
pub struct ServerRegistryReader {
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerRegistryError {
    #[error("server registry at {path} names a dead supervisor (pid {pid}); remove the file and retry")]
    StalePid { path: PathBuf, pid: u32 },

    #[error("server registry at {path} names an unreachable address {addr:?}; remove the file and retry")]
    Unreachable { path: PathBuf, addr: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ServerRegistryReader {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: runbook_core::server_record_path(state_dir),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw read with no liveness validation. `None` if the file is absent.
    pub fn read_raw(&self) -> Result<Option<ServerRecord>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => {
                let record = serde_json::from_slice(&bytes).map_err(|source| {
                    StorageError::io(
                        &self.path,
                        std::io::Error::new(std::io::ErrorKind::InvalidData, source),
                    )
                })?;
                Ok(Some(record))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::io(&self.path, source)),
        }
    }

    /// Read and apply the process-liveness half of the reader's validity
    /// contract: the record is an error to the caller (not silently
    /// discarded) if the recorded supervisor PID is dead. The HTTP probe
    /// half of the contract lives with the caller, since it requires an
    /// HTTP client this crate does not depend on.
    pub fn read_checked(
        &self,
        is_alive: impl Fn(u32) -> bool,
    ) -> Result<Option<ServerRecord>, ServerRegistryError> {
        let Some(record) = self.read_raw()? else {
            return Ok(None);
        };
        if !is_alive(record.pid) {
            return Err(ServerRegistryError::StalePid {
                path: self.path.clone(),
                pid: record.pid,
            });
        }
        Ok(Some(record))
    }

    pub fn write(&self, record: &ServerRecord) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(record).map_err(|source| StorageError::Serialize {
            what: "ServerRecord",
            source,
        })?;
        write_atomic(&self.path, &bytes)
    }

    pub fn delete(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::io(&self.path, source)),
        }
    }
}
