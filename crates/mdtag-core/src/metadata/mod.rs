//! Metadata persistence.
//!
//! This module provides:
//! - Atomic text and JSON file operations, with a stage/commit split
//! - The settings store for the keyword schema and process directory

mod atomic;
mod store;

pub use atomic::{
    atomic_read_json, atomic_write_json, atomic_write_text, commit_staged, discard_staged,
    read_text, stage_text, staged_path,
};
pub use store::{Settings, SettingsStore};
