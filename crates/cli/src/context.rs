//! Resolves the handful of paths every CLI subcommand needs: the
//! project root, the search root for the manifest loader, and the
//! `.runbook/` state directory.

use std::path::{Path, PathBuf};

use runbook_manifest::Manifest;

use crate::error::CliError;

pub struct Context {
    pub project_root: PathBuf,
    pub config_root: PathBuf,
    pub state_dir: PathBuf,
}

impl Context {
    pub fn new(project_root: PathBuf, config_root: Option<PathBuf>) -> Self {
        let config_root = config_root.unwrap_or_else(|| project_root.clone());
        let state_dir = runbook_core::state_dir(&project_root);
        Self {
            project_root,
            config_root,
            state_dir,
        }
    }

    pub fn load_manifest(&self) -> Result<Manifest, CliError> {
        Ok(runbook_manifest::load(&self.config_root)?)
    }

    pub fn task_cwd(&self, task: &runbook_manifest::TaskDef) -> PathBuf {
        task.cwd
            .as_ref()
            .map(|c| self.project_root.join(c))
            .unwrap_or_else(|| self.project_root.clone())
    }
}

/// Parse `--key=value` trailing arguments into a parameter map for a
/// task's `run <task> [--k=v …]` invocation.
pub fn parse_params(raw: &[String]) -> Result<std::collections::BTreeMap<String, String>, CliError> {
    let mut params = std::collections::BTreeMap::new();
    for arg in raw {
        let trimmed = arg.strip_prefix("--").unwrap_or(arg);
        let (key, value) = trimmed.split_once('=').ok_or_else(|| {
            CliError::User(format!("invalid parameter {arg:?}: expected --key=value"))
        })?;
        params.insert(key.to_string(), value.to_string());
    }
    Ok(params)
}

pub fn display_path(path: &Path) -> String {
    path.display().to_string()
}
