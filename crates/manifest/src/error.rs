use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("no manifest found under {0}: expected a config directory, a single <root>.yaml, or both")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("task name {0:?} is invalid: must match [a-zA-Z0-9_-]+")]
    InvalidTaskName(String),

    #[error("task {0:?} defined more than once across merged manifest files")]
    DuplicateTaskName(String),

    #[error("unresolved parameter {param:?} in task {task:?}: no value supplied and no default")]
    UnresolvedParam { task: String, param: String },

    #[error("unknown task {0:?}")]
    UnknownTask(String),
}
