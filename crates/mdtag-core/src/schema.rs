//! Keyword schema shared by every record in a corpus.
//!
//! The process keyword is held in its own field. On disk (and in every record)
//! it is always the first label, but code never has to rely on position 0 to
//! find it.

use crate::config::{DefaultsConfig, SidecarFormat};
use crate::{MdtagError, Result};
use serde::{Deserialize, Serialize};

/// Ordered, validated list of keyword labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct KeywordSchema {
    process_keyword: String,
    keywords: Vec<String>,
}

impl Default for KeywordSchema {
    fn default() -> Self {
        Self {
            process_keyword: DefaultsConfig::PROCESS_KEYWORD.to_string(),
            keywords: Vec::new(),
        }
    }
}

/// Check that a label can be stored and parsed back.
pub fn validate_label(label: &str) -> Result<()> {
    if label.trim().is_empty() {
        return Err(MdtagError::EmptyLabel);
    }
    if label.contains(['\n', '\r']) {
        return Err(MdtagError::InvalidLabel {
            label: label.to_string(),
            reason: "labels must be a single line".to_string(),
        });
    }
    if label.contains(SidecarFormat::SEPARATOR) {
        return Err(MdtagError::InvalidLabel {
            label: label.to_string(),
            reason: format!("labels must not contain {:?}", SidecarFormat::SEPARATOR),
        });
    }
    Ok(())
}

impl KeywordSchema {
    /// Build a schema from the process keyword and the remaining labels.
    ///
    /// Labels are trimmed. Blank or duplicate labels are rejected.
    pub fn new(process_keyword: &str, keywords: &[String]) -> Result<Self> {
        let process_keyword = process_keyword.trim().to_string();
        validate_label(&process_keyword)?;

        let mut schema = Self {
            process_keyword,
            keywords: Vec::with_capacity(keywords.len()),
        };
        for label in keywords {
            let label = label.trim();
            validate_label(label)?;
            if schema.contains(label) {
                return Err(MdtagError::DuplicateKeyword {
                    label: label.to_string(),
                });
            }
            schema.keywords.push(label.to_string());
        }
        Ok(schema)
    }

    /// Build a schema from a full label list whose first element is the
    /// process keyword. This is the persisted form.
    pub fn from_labels(labels: &[String]) -> Result<Self> {
        match labels.split_first() {
            Some((process, rest)) => Self::new(process, rest),
            None => Err(MdtagError::EmptySchema),
        }
    }

    /// Label of the reserved process keyword.
    pub fn process_keyword(&self) -> &str {
        &self.process_keyword
    }

    /// Labels after the process keyword.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Full ordered label list, process keyword first.
    pub fn labels(&self) -> Vec<String> {
        std::iter::once(self.process_keyword.clone())
            .chain(self.keywords.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.keywords.len() + 1
    }

    /// Always false: the process keyword is always present.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    /// Position of `label` in the full ordered list.
    pub fn position(&self, label: &str) -> Option<usize> {
        if self.process_keyword == label {
            return Some(0);
        }
        self.keywords
            .iter()
            .position(|k| k == label)
            .map(|i| i + 1)
    }

    /// Label at `index` in the full ordered list.
    pub fn label(&self, index: usize) -> Option<&str> {
        match index {
            0 => Some(&self.process_keyword),
            i => self.keywords.get(i - 1).map(String::as_str),
        }
    }

    /// Schema for a requested reorder/rename of the whole list.
    ///
    /// Position 0 of `requested` is the reserved slot. The current process
    /// label is kept there whatever the caller supplied. The remaining entries
    /// are trimmed, and blanks and repeats are dropped.
    pub fn reordered(&self, requested: &[String]) -> Result<Self> {
        if requested.iter().all(|label| label.trim().is_empty()) {
            return Err(MdtagError::EmptySchema);
        }

        let mut keywords: Vec<String> = Vec::with_capacity(requested.len());
        for label in requested.iter().skip(1) {
            let label = label.trim();
            if label.is_empty() || label == self.process_keyword {
                continue;
            }
            if keywords.iter().any(|k| k == label) {
                continue;
            }
            validate_label(label)?;
            keywords.push(label.to_string());
        }

        Ok(Self {
            process_keyword: self.process_keyword.clone(),
            keywords,
        })
    }

    /// Schema with the label at `index` replaced by `new_label`.
    pub fn renamed(&self, index: usize, new_label: &str) -> Result<Self> {
        let new_label = new_label.trim();
        validate_label(new_label)?;

        if index >= self.len() {
            return Err(MdtagError::KeywordIndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        if let Some(existing) = self.position(new_label) {
            if existing != index {
                return Err(MdtagError::DuplicateKeyword {
                    label: new_label.to_string(),
                });
            }
        }

        let mut schema = self.clone();
        match index {
            0 => schema.process_keyword = new_label.to_string(),
            i => schema.keywords[i - 1] = new_label.to_string(),
        }
        Ok(schema)
    }
}

impl TryFrom<Vec<String>> for KeywordSchema {
    type Error = MdtagError;

    fn try_from(labels: Vec<String>) -> Result<Self> {
        Self::from_labels(&labels)
    }
}

impl From<KeywordSchema> for Vec<String> {
    fn from(schema: KeywordSchema) -> Self {
        schema.labels()
    }
}
