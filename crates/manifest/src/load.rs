use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ManifestError;
use crate::types::{Manifest, TaskDef};

const ROOT_NAME: &str = "runbook";
const CONFIG_DIR_NAME: &str = "runbook.d";

// Allow expect here as the regex is compile-time verified to be valid.
#[allow(clippy::expect_used)]
fn task_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static pattern"))
}

fn read_file(path: &Path) -> Result<BTreeMap<String, TaskDef>, ManifestError> {
    let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn config_dir_files(dir: &Path) -> Result<Vec<PathBuf>, ManifestError> {
    let mut files = Vec::new();
    let entries = std::fs::read_dir(dir).map_err(|source| ManifestError::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ManifestError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "yaml" || ext == "yml");
        if path.is_file() && is_yaml {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Resolve, merge, and validate the manifest rooted at `search_root`.
///
/// Resolution order: a `runbook.d/*.yaml` directory, else a single
/// `runbook.yaml`; an optional `runbook.overrides.yaml` always loads
/// last and wins key-for-key.
pub fn load(search_root: &Path) -> Result<Manifest, ManifestError> {
    let config_dir = search_root.join(CONFIG_DIR_NAME);
    let single_file = search_root.join(format!("{ROOT_NAME}.yaml"));
    let overrides_file = search_root.join(format!("{ROOT_NAME}.overrides.yaml"));

    let mut merged: BTreeMap<String, TaskDef> = BTreeMap::new();
    let mut sources = Vec::new();

    if config_dir.is_dir() {
        for path in config_dir_files(&config_dir)? {
            let tasks = read_file(&path)?;
            merge_strict(&mut merged, tasks, &path)?;
            sources.push(path);
        }
    } else if single_file.is_file() {
        let tasks = read_file(&single_file)?;
        merge_strict(&mut merged, tasks, &single_file)?;
        sources.push(single_file);
    } else {
        return Err(ManifestError::NotFound(search_root.to_path_buf()));
    }

    if overrides_file.is_file() {
        let overrides = read_file(&overrides_file)?;
        for (name, def) in overrides {
            merged.insert(name, def);
        }
        sources.push(overrides_file);
    }

    for name in merged.keys() {
        if !task_name_re().is_match(name) {
            return Err(ManifestError::InvalidTaskName(name.clone()));
        }
    }

    Ok(Manifest {
        tasks: merged,
        sources,
    })
}

fn merge_strict(
    merged: &mut BTreeMap<String, TaskDef>,
    incoming: BTreeMap<String, TaskDef>,
    _path: &Path,
) -> Result<(), ManifestError> {
    for (name, def) in incoming {
        if merged.contains_key(&name) {
            return Err(ManifestError::DuplicateTaskName(name));
        }
        merged.insert(name, def);
    }
    Ok(())
}
