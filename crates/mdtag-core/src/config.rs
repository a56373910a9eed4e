//! Centralized configuration for mdtag.
//!
//! File names, directory names and the sidecar text format constants that the
//! rest of the crate agrees on.

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    /// Directory created under the platform config dir for settings.
    pub const SETTINGS_DIR_NAME: &'static str = "mdtag";
}

/// Shared directory and file names.
pub struct PathsConfig;

impl PathsConfig {
    /// Name of the per-directory folder holding sidecar files. Any path
    /// component with this exact name is excluded from discovery.
    pub const METADATA_DIR_NAME: &'static str = "metadata";
    /// Suffix appended to the transformed data file name.
    pub const SIDECAR_SUFFIX: &'static str = "-metadata.txt";
    /// Extension used while a migration stages new sidecar contents.
    pub const STAGED_EXTENSION: &'static str = "staged";
    pub const SCHEMA_FILENAME: &'static str = "keywords.json";
    pub const PROCESSES_FILENAME: &'static str = "processes.json";
}

/// Sidecar text format.
pub struct SidecarFormat;

impl SidecarFormat {
    pub const HEADER_PREFIX: &'static str = "path to data file: ";
    /// Separator between keyword and value. The parser splits on its first
    /// occurrence, so keyword labels may never contain it.
    pub const SEPARATOR: &'static str = ":  ";
}

/// Defaults for freshly initialized settings.
pub struct DefaultsConfig;

impl DefaultsConfig {
    pub const PROCESS_KEYWORD: &'static str = "process description";
    pub const NO_DESCRIPTION_NAME: &'static str = "No Description";
    pub const NO_DESCRIPTION: &'static str = "";
    /// Prefix for placeholder names proposed by registry recovery.
    pub const PLACEHOLDER_PREFIX: &'static str = "descr_";
}
