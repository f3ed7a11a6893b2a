use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a task runs to completion or persists as a supervised daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Oneshot,
    Daemon,
}

/// One execution of a task. Field names are a wire contract —
/// `<state>/logs/sessions/<uuid>/metadata.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub session_id: Uuid,
    pub task_name: String,
    pub task_type: TaskType,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Nanoseconds, not seconds or millis, so sub-millisecond durations
    /// still round-trip exactly through JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_nanos: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default)]
    pub timed_out: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, String>>,
    pub command: String,
    pub working_dir: String,
}

impl SessionMetadata {
    pub fn new(
        session_id: Uuid,
        task_name: impl Into<String>,
        task_type: TaskType,
        start_time: DateTime<Utc>,
        command: impl Into<String>,
        working_dir: impl Into<String>,
        parameters: Option<BTreeMap<String, String>>,
    ) -> Self {
        SessionMetadata {
            session_id,
            task_name: task_name.into(),
            task_type,
            start_time,
            end_time: None,
            duration_nanos: None,
            exit_code: None,
            success: None,
            timed_out: false,
            parameters,
            command: command.into(),
            working_dir: working_dir.into(),
        }
    }

    /// True once all terminal fields have been written by `FinalizeSession`.
    pub fn is_finalized(&self) -> bool {
        self.end_time.is_some()
    }

    /// Merge terminal fields in place. Idempotent: a second call with
    /// the same or different terminal values is a no-op once
    /// `end_time` is already set.
    pub fn finalize(&mut self, end_time: DateTime<Utc>, exit_code: i32, timed_out: bool) {
        if self.is_finalized() {
            return;
        }
        let duration = end_time.signed_duration_since(self.start_time);
        self.end_time = Some(end_time);
        self.duration_nanos = duration.num_nanoseconds();
        self.exit_code = Some(exit_code);
        self.success = Some(exit_code == 0 && !timed_out);
        self.timed_out = timed_out;
    }
}
