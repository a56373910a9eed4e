//! mdtag Core - Headless library for keyword metadata sidecars.
//!
//! Every data file under a working root gets a plain-text sidecar in a
//! sibling `metadata/` directory. The sidecar holds one value per keyword of
//! a user-defined schema. The first keyword is reserved for a process
//! description, drawn from a directory of named processes.
//!
//! The crate has no terminal or GUI dependency. Questions for the user go
//! through the [`Prompt`] trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use mdtag_core::{AssumeYes, SettingsStore, Workspace};
//! use std::path::Path;
//!
//! fn main() -> mdtag_core::Result<()> {
//!     let store = SettingsStore::new("/home/me/.config/mdtag");
//!     let mut workspace = Workspace::open("/data/run-42", store)?;
//!
//!     workspace.add_process("Welding", "metal joining", &AssumeYes)?;
//!     workspace.set_process(Path::new("sample.csv"), "Welding")?;
//!
//!     let labels = vec!["process description".to_string(), "operator".to_string()];
//!     let report = workspace.change_schema(&labels, &AssumeYes)?;
//!     println!("Rewrote {} sidecars", report.records_rewritten);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod corpus;
pub mod error;
pub mod interact;
pub mod metadata;
pub mod migration;
pub mod process;
pub mod recovery;
pub mod schema;
pub mod sidecar;
pub mod workspace;

// Re-export commonly used types
pub use corpus::{discover, CorpusIndex};
pub use error::{MdtagError, Result};
pub use interact::{AssumeYes, Prompt};
pub use metadata::{Settings, SettingsStore};
pub use migration::{MigrationPhase, MigrationReport, SchemaMigration};
pub use process::{ProcessDirectory, ProcessEntry};
pub use recovery::ForeignSchemaReport;
pub use schema::KeywordSchema;
pub use sidecar::SidecarRecord;
pub use workspace::Workspace;
