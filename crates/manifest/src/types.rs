use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Oneshot,
    Daemon,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParamSpec {
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskDef {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub command: String,
    #[serde(default)]
    pub params: BTreeMap<String, ParamSpec>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub shell: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
}

impl TaskDef {
    pub fn shell_or_default(&self) -> &str {
        self.shell.as_deref().unwrap_or("/bin/bash")
    }
}

/// Merged task manifest. Deserialized per-file as `BTreeMap<String,
/// TaskDef>`, then folded together by `load`/`merge`.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    pub tasks: BTreeMap<String, TaskDef>,
    /// Files that contributed to this manifest, in merge order, for
    /// diagnostics (`runbook list -v` and error messages).
    pub sources: Vec<std::path::PathBuf>,
}

impl Manifest {
    pub fn get(&self, task_name: &str) -> Option<&TaskDef> {
        self.tasks.get(task_name)
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }
}
