//! Sidecar records: per-file metadata stored next to the data file.
//!
//! - [`format`] renders and parses the sidecar text
//! - [`SidecarRecord`] keeps one file's values and writes them on every change

pub mod format;
mod record;

pub use format::{parse_sidecar, render_sidecar, ParsedSidecar};
pub use record::{sidecar_path_for, SidecarRecord};
