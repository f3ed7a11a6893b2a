use std::io::Write;
use std::path::Path;

use uuid::Uuid;

use crate::error::StorageError;

/// Write `bytes` to `path` by writing a sibling temp file and renaming it
/// over the destination. A reader observing `path` mid-write either sees
/// the old content or the new content, never a torn file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|source| StorageError::io(dir, source))?;

    let tmp_path = dir.join(format!(".{}.tmp-{}", file_name(path), Uuid::new_v4()));
    {
        let mut tmp = std::fs::File::create(&tmp_path)
            .map_err(|source| StorageError::io(&tmp_path, source))?;
        tmp.write_all(bytes)
            .map_err(|source| StorageError::io(&tmp_path, source))?;
        tmp.sync_all()
            .map_err(|source| StorageError::io(&tmp_path, source))?;
    }
    std::fs::rename(&tmp_path, path).map_err(|source| StorageError::io(path, source))?;
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string())
}
