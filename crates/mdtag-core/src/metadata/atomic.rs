//! Atomic file operations for sidecar and settings persistence.
//!
//! Every write goes through the same steps:
//! 1. Write the new contents to a staged sibling file (`<name>.<pid>.staged`)
//! 2. `sync_all` so the data reaches disk
//! 3. Optionally copy the current file to a backup
//! 4. Rename the staged file over the target
//!
//! Staging and committing are exposed separately so a corpus-wide migration
//! can stage every file before the first rename.

use crate::config::PathsConfig;
use crate::{MdtagError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, warn};

/// Read a UTF-8 text file.
///
/// Returns `None` if the file doesn't exist.
pub fn read_text(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    fs::read_to_string(path)
        .map(Some)
        .map_err(|e| MdtagError::io_with_path(e, path))
}

/// Read and parse a JSON file.
///
/// Returns `None` if the file doesn't exist, or an error if parsing fails.
pub fn atomic_read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let Some(contents) = read_text(path)? else {
        return Ok(None);
    };

    let data: T = serde_json::from_str(&contents).map_err(|e| MdtagError::Json {
        message: format!("Failed to parse {}: {}", path.display(), e),
        source: Some(e),
    })?;

    Ok(Some(data))
}

/// Path of the staged sibling used while `path` is being rewritten.
pub fn staged_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(format!(".{}.{}", process::id(), PathsConfig::STAGED_EXTENSION));
    path.with_file_name(name)
}

/// Write `contents` to the staged sibling of `path` and sync it.
///
/// Missing parent directories are created. The target itself is untouched.
pub fn stage_text(path: &Path, contents: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| MdtagError::io_with_path(e, parent))?;
            debug!("Created directory: {}", parent.display());
        }
    }

    let staged = staged_path(path);
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&staged)
        .map_err(|e| MdtagError::io_with_path(e, &staged))?;

    file.write_all(contents.as_bytes())
        .and_then(|_| file.flush())
        .and_then(|_| file.sync_all())
        .map_err(|e| MdtagError::io_with_path(e, &staged))?;

    Ok(staged)
}

/// Rename a staged file over its target.
pub fn commit_staged(staged: &Path, target: &Path) -> Result<()> {
    fs::rename(staged, target).map_err(|e| MdtagError::Io {
        message: format!(
            "Failed to rename {} to {}: {}",
            staged.display(),
            target.display(),
            e
        ),
        path: Some(target.to_path_buf()),
        source: Some(e),
    })
}

/// Remove a staged file that will not be committed.
pub fn discard_staged(staged: &Path) {
    if let Err(e) = fs::remove_file(staged) {
        warn!("Failed to remove staged file {}: {}", staged.display(), e);
    }
}

/// Write a text file atomically, optionally keeping a `.bak` of the old contents.
pub fn atomic_write_text(path: &Path, contents: &str, keep_backup: bool) -> Result<()> {
    let staged = stage_text(path, contents)?;

    if keep_backup && path.exists() {
        let mut backup_name = path.file_name().map(OsString::from).unwrap_or_default();
        backup_name.push(".bak");
        let backup_path = path.with_file_name(backup_name);
        if let Err(e) = fs::copy(path, &backup_path) {
            // A missing backup never blocks the write itself.
            warn!("Failed to create backup {}: {}", backup_path.display(), e);
        } else {
            debug!("Created backup: {}", backup_path.display());
        }
    }

    if let Err(e) = commit_staged(&staged, path) {
        discard_staged(&staged);
        return Err(e);
    }

    debug!("Atomically wrote {}", path.display());
    Ok(())
}

/// Write data to a JSON file atomically.
///
/// The serialized text is re-parsed before anything touches the disk.
pub fn atomic_write_json<T: Serialize>(path: &Path, data: &T, keep_backup: bool) -> Result<()> {
    let serialized = serde_json::to_string_pretty(data).map_err(|e| MdtagError::Json {
        message: format!("Failed to serialize {}: {}", path.display(), e),
        source: Some(e),
    })?;

    serde_json::from_str::<serde_json::Value>(&serialized).map_err(|e| MdtagError::Json {
        message: format!("JSON validation failed: {}", e),
        source: Some(e),
    })?;

    atomic_write_text(path, &serialized, keep_backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Labels {
        labels: Vec<String>,
    }

    #[test]
    fn test_json_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("keywords.json");

        let data = Labels {
            labels: vec!["process description".into(), "operator".into()],
        };
        atomic_write_json(&path, &data, false).unwrap();

        let read: Option<Labels> = atomic_read_json(&path).unwrap();
        assert_eq!(read, Some(data));
    }

    #[test]
    fn test_backup_keeps_previous_contents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("processes.json");

        atomic_write_text(&path, "first", true).unwrap();
        atomic_write_text(&path, "second", true).unwrap();

        let backup = temp_dir.path().join("processes.json.bak");
        assert_eq!(fs::read_to_string(backup).unwrap(), "first");
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");

        let result: Option<Labels> = atomic_read_json(&path).unwrap();
        assert!(result.is_none());
        assert!(read_text(&path).unwrap().is_none());
    }

    #[test]
    fn test_stage_does_not_touch_target() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("metadata").join("a-txt-metadata.txt");

        let staged = stage_text(&path, "staged body").unwrap();
        assert!(staged.exists());
        assert!(!path.exists());

        commit_staged(&staged, &path).unwrap();
        assert!(!staged.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "staged body");
    }

    #[test]
    fn test_corrupt_json_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("keywords.json");
        fs::write(&path, "not json").unwrap();

        let result: Result<Option<Labels>> = atomic_read_json(&path);
        assert!(matches!(result, Err(MdtagError::Json { .. })));
    }
}
