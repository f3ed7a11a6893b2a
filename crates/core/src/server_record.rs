use serde::{Deserialize, Serialize};

/// Persisted at `<state>/server.json` while a supervisor is serving HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerRecord {
    pub addr: String,
    pub pid: u32,
}
