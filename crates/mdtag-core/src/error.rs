//! Error types for mdtag.
//!
//! Validation errors are raised before anything is written. Data-integrity
//! errors (`MalformedRecord`, `KeyNotFound`) always surface to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the mdtag library.
#[derive(Debug, Error)]
pub enum MdtagError {
    // Record errors
    #[error("Keyword not found: {keyword}")]
    KeyNotFound { keyword: String },

    #[error("Malformed sidecar record{} at line {line}: {content:?}", path_suffix(.path))]
    MalformedRecord {
        path: Option<PathBuf>,
        line: usize,
        content: String,
    },

    #[error("Unknown data file: {0}")]
    UnknownDataFile(PathBuf),

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Schema errors
    #[error("Keyword schema has no usable keywords")]
    EmptySchema,

    #[error("Keyword already exists in the schema: {label}")]
    DuplicateKeyword { label: String },

    #[error("Keyword label must not be blank")]
    EmptyLabel,

    #[error("Invalid keyword label {label:?}: {reason}")]
    InvalidLabel { label: String, reason: String },

    #[error("Keyword index {index} is out of range for a schema of {len} keywords")]
    KeywordIndexOutOfRange { index: usize, len: usize },

    // Process directory errors
    #[error("Unknown process name: {name}")]
    UnknownProcessName { name: String },

    #[error("Unknown process description: {description:?}")]
    UnknownProcessDescription { description: String },

    #[error("Process entry {name:?} is reserved and cannot be removed")]
    ReservedProcess { name: String },

    // Settings errors
    #[error("Settings file missing: {}", .path.display())]
    SettingsMissing { path: PathBuf },

    #[error("Operation cancelled by user")]
    Cancelled,
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" {}", p.display()))
        .unwrap_or_default()
}

/// Result type alias for mdtag operations.
pub type Result<T> = std::result::Result<T, MdtagError>;

impl From<std::io::Error> for MdtagError {
    fn from(err: std::io::Error) -> Self {
        MdtagError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for MdtagError {
    fn from(err: serde_json::Error) -> Self {
        MdtagError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl MdtagError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        MdtagError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// True for errors that are raised before any mutation happens.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MdtagError::EmptySchema
                | MdtagError::DuplicateKeyword { .. }
                | MdtagError::EmptyLabel
                | MdtagError::InvalidLabel { .. }
                | MdtagError::KeywordIndexOutOfRange { .. }
                | MdtagError::ReservedProcess { .. }
        )
    }

    /// Map the error to a process exit code for the command-line front end.
    ///
    /// - 2: validation error (nothing was changed)
    /// - 3: lookup error (unknown keyword, process or file)
    /// - 4: corrupt sidecar or settings
    /// - 5: settings missing, run recovery
    /// - 6: cancelled by user
    /// - 1: everything else (I/O)
    pub fn exit_code(&self) -> i32 {
        match self {
            e if e.is_validation() => 2,

            MdtagError::KeyNotFound { .. }
            | MdtagError::UnknownDataFile(_)
            | MdtagError::UnknownProcessName { .. }
            | MdtagError::UnknownProcessDescription { .. } => 3,

            MdtagError::MalformedRecord { .. } | MdtagError::Json { .. } => 4,

            MdtagError::SettingsMissing { .. } => 5,

            MdtagError::Cancelled => 6,

            _ => 1,
        }
    }
}
