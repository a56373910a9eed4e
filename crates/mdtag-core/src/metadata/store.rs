//! Settings store for the corpus-wide keyword schema and process directory.
//!
//! Manages two JSON files in a settings directory:
//! - keywords.json: ordered label list, process keyword first
//! - processes.json: list of `{name, description}` pairs

use crate::config::PathsConfig;
use crate::metadata::atomic::{atomic_read_json, atomic_write_json};
use crate::process::ProcessDirectory;
use crate::schema::KeywordSchema;
use crate::{MdtagError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// The owned configuration passed to a workspace: schema plus process directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub schema: KeywordSchema,
    pub processes: ProcessDirectory,
}

/// Loads and saves [`Settings`] files.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    settings_dir: PathBuf,
}

impl SettingsStore {
    /// Create a store rooted at `settings_dir`. Nothing is read yet.
    pub fn new(settings_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings_dir: settings_dir.into(),
        }
    }

    pub fn settings_dir(&self) -> &Path {
        &self.settings_dir
    }

    pub fn schema_path(&self) -> PathBuf {
        self.settings_dir.join(PathsConfig::SCHEMA_FILENAME)
    }

    pub fn processes_path(&self) -> PathBuf {
        self.settings_dir.join(PathsConfig::PROCESSES_FILENAME)
    }

    // ========================================
    // Keyword schema
    // ========================================

    /// Load the keyword schema, or `None` if it was never saved.
    pub fn load_schema(&self) -> Result<Option<KeywordSchema>> {
        let path = self.schema_path();
        debug!("Loading keyword schema from {}", path.display());
        atomic_read_json(&path)
    }

    /// Save the keyword schema, keeping a backup of the previous one.
    pub fn save_schema(&self, schema: &KeywordSchema) -> Result<()> {
        let path = self.schema_path();
        debug!("Saving keyword schema to {}", path.display());
        atomic_write_json(&path, schema, true)
    }

    // ========================================
    // Process directory
    // ========================================

    /// Load the process directory, or `None` if it was never saved.
    pub fn load_processes(&self) -> Result<Option<ProcessDirectory>> {
        let path = self.processes_path();
        debug!("Loading process directory from {}", path.display());
        atomic_read_json(&path)
    }

    /// Save the process directory, keeping a backup of the previous one.
    pub fn save_processes(&self, processes: &ProcessDirectory) -> Result<()> {
        let path = self.processes_path();
        debug!("Saving process directory to {}", path.display());
        atomic_write_json(&path, processes, true)
    }

    // ========================================
    // Both
    // ========================================

    /// Load both files. Fails with `SettingsMissing` if either is absent.
    pub fn load(&self) -> Result<Settings> {
        let schema = self.load_schema()?.ok_or_else(|| MdtagError::SettingsMissing {
            path: self.schema_path(),
        })?;
        let processes = self
            .load_processes()?
            .ok_or_else(|| MdtagError::SettingsMissing {
                path: self.processes_path(),
            })?;
        Ok(Settings { schema, processes })
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        self.save_schema(&settings.schema)?;
        self.save_processes(&settings.processes)
    }

    /// True when both settings files exist.
    pub fn is_initialized(&self) -> bool {
        self.schema_path().exists() && self.processes_path().exists()
    }
}
