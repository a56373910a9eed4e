//! One data file's metadata and its sidecar file.

use super::format::{parse_sidecar, render_sidecar, strip_newlines};
use crate::config::PathsConfig;
use crate::metadata::{atomic_write_text, read_text};
use crate::schema::KeywordSchema;
use crate::{MdtagError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sidecar path for a data file: `<dir>/metadata/<name with '.' → '-'>-metadata.txt`.
pub fn sidecar_path_for(data_path: &Path) -> PathBuf {
    let dir = data_path.parent().unwrap_or_else(|| Path::new(""));
    let name = data_path
        .file_name()
        .map(|n| n.to_string_lossy().replace('.', "-"))
        .unwrap_or_default();
    dir.join(PathsConfig::METADATA_DIR_NAME)
        .join(format!("{}{}", name, PathsConfig::SIDECAR_SUFFIX))
}

/// Metadata for a single data file.
///
/// `values` always holds exactly one entry per keyword. Every `set` is
/// written to disk before it returns.
#[derive(Debug, Clone)]
pub struct SidecarRecord {
    data_path: PathBuf,
    sidecar_path: PathBuf,
    keywords: Vec<String>,
    values: HashMap<String, String>,
}

impl SidecarRecord {
    /// Open the record for `data_path`, creating an empty sidecar if none exists.
    pub fn open(data_path: impl Into<PathBuf>, schema: &KeywordSchema) -> Result<Self> {
        let mut record = Self::detached(data_path, schema.labels());

        match read_text(&record.sidecar_path)? {
            Some(text) => record.deserialize(&text)?,
            None => {
                debug!("Creating sidecar {}", record.sidecar_path.display());
                record.write()?;
            }
        }

        Ok(record)
    }

    /// Record with empty values and no disk access.
    fn detached(data_path: impl Into<PathBuf>, keywords: Vec<String>) -> Self {
        let data_path = data_path.into();
        let values = keywords
            .iter()
            .map(|k| (k.clone(), String::new()))
            .collect();
        Self {
            sidecar_path: sidecar_path_for(&data_path),
            data_path,
            keywords,
            values,
        }
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn sidecar_path(&self) -> &Path {
        &self.sidecar_path
    }

    /// The record's own copy of the keyword list.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Current value for `keyword`.
    pub fn get(&self, keyword: &str) -> Result<&str> {
        self.values
            .get(keyword)
            .map(String::as_str)
            .ok_or_else(|| MdtagError::KeyNotFound {
                keyword: keyword.to_string(),
            })
    }

    /// Store a value and rewrite the sidecar file.
    pub fn set(&mut self, keyword: &str, value: &str) -> Result<()> {
        let slot = self
            .values
            .get_mut(keyword)
            .ok_or_else(|| MdtagError::KeyNotFound {
                keyword: keyword.to_string(),
            })?;
        *slot = strip_newlines(value);
        self.write()
    }

    /// `(keyword, value)` pairs in keyword order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keywords.iter().map(|k| {
            let value = self.values.get(k).map(String::as_str).unwrap_or_default();
            (k.as_str(), value)
        })
    }

    /// Replace the keyword list. New keywords start empty, dropped keywords
    /// lose their values. Nothing is written.
    pub fn apply_schema(&mut self, keywords: &[String]) {
        let mut values = HashMap::with_capacity(keywords.len());
        for keyword in keywords {
            let value = self.values.remove(keyword).unwrap_or_default();
            values.insert(keyword.clone(), value);
        }
        self.values = values;
        self.keywords = keywords.to_vec();
    }

    /// Rename the keyword at `index`, keeping its value. Nothing is written.
    pub fn rename_keyword(&mut self, index: usize, new_label: &str) -> Result<()> {
        let len = self.keywords.len();
        let old = self
            .keywords
            .get_mut(index)
            .ok_or(MdtagError::KeywordIndexOutOfRange { index, len })?;
        if old == new_label {
            return Ok(());
        }

        let value = self.values.remove(old.as_str()).unwrap_or_default();
        *old = new_label.to_string();
        self.values.insert(new_label.to_string(), value);
        Ok(())
    }

    /// Exact text of the sidecar file.
    pub fn serialize(&self) -> String {
        render_sidecar(&self.data_path, self.entries())
    }

    /// Load values from sidecar text.
    ///
    /// Keywords outside the record's schema are ignored. Schema keywords
    /// missing from the text keep their current value.
    pub fn deserialize(&mut self, text: &str) -> Result<()> {
        let parsed = parse_sidecar(text, Some(&self.sidecar_path))?;
        for (keyword, value) in parsed.entries {
            match self.values.get_mut(&keyword) {
                Some(slot) => *slot = value,
                None => debug!(
                    "Ignoring keyword {:?} not in schema ({})",
                    keyword,
                    self.sidecar_path.display()
                ),
            }
        }
        Ok(())
    }

    /// Re-read the sidecar file from disk.
    pub fn reload(&mut self) -> Result<()> {
        let text = read_text(&self.sidecar_path)?.ok_or_else(|| MdtagError::Io {
            message: "sidecar file disappeared".to_string(),
            path: Some(self.sidecar_path.clone()),
            source: None,
        })?;
        self.deserialize(&text)
    }

    /// Write the whole sidecar file.
    pub fn write(&self) -> Result<()> {
        atomic_write_text(&self.sidecar_path, &self.serialize(), false)
    }
}
