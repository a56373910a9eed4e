//! Process directory: the name ↔ description translation table.
//!
//! Sidecar files store process *descriptions*. Users pick processes by short
//! *names*. The directory keeps the pairing a bijection. Mutations are
//! last-write-wins: an entry that clashes on either side is evicted.

use crate::config::DefaultsConfig;
use crate::{MdtagError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One name/description pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub name: String,
    pub description: String,
}

/// Bijective registry of process names and descriptions, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ProcessEntry>", into = "Vec<ProcessEntry>")]
pub struct ProcessDirectory {
    entries: Vec<ProcessEntry>,
}

impl Default for ProcessDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessDirectory {
    /// Directory holding only `"No Description" ↔ ""`.
    pub fn new() -> Self {
        Self {
            entries: vec![ProcessEntry {
                name: DefaultsConfig::NO_DESCRIPTION_NAME.to_string(),
                description: DefaultsConfig::NO_DESCRIPTION.to_string(),
            }],
        }
    }

    /// Description bound to `name`.
    pub fn by_name(&self, name: &str) -> Result<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.description.as_str())
            .ok_or_else(|| MdtagError::UnknownProcessName {
                name: name.to_string(),
            })
    }

    /// Name bound to `description`.
    pub fn by_description(&self, description: &str) -> Result<&str> {
        self.entries
            .iter()
            .find(|e| e.description == description)
            .map(|e| e.name.as_str())
            .ok_or_else(|| MdtagError::UnknownProcessDescription {
                description: description.to_string(),
            })
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn contains_description(&self, description: &str) -> bool {
        self.entries.iter().any(|e| e.description == description)
    }

    /// True for the seeded `"No Description" ↔ ""` pair.
    pub fn is_reserved(entry: &ProcessEntry) -> bool {
        entry.name == DefaultsConfig::NO_DESCRIPTION_NAME
            && entry.description == DefaultsConfig::NO_DESCRIPTION
    }

    /// Entries other than `except` that binding `name ↔ description` would evict.
    pub fn clashes(
        &self,
        name: &str,
        description: &str,
        except: Option<&str>,
    ) -> Vec<&ProcessEntry> {
        self.entries
            .iter()
            .filter(|e| Some(e.name.as_str()) != except)
            .filter(|e| e.name == name || e.description == description)
            .collect()
    }

    fn ensure_not_reserved(
        &self,
        name: &str,
        description: &str,
        except: Option<&str>,
    ) -> Result<()> {
        match self
            .clashes(name, description, except)
            .into_iter()
            .find(|e| Self::is_reserved(e))
        {
            Some(reserved) => Err(MdtagError::ReservedProcess {
                name: reserved.name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Bind `name` to `description`, evicting whatever either was bound to.
    ///
    /// Re-adding the seeded pair is a no-op. Any other binding that would
    /// evict or rebind it fails with `ReservedProcess`.
    pub fn add(&mut self, name: &str, description: &str) -> Result<()> {
        if name == DefaultsConfig::NO_DESCRIPTION_NAME
            && description == DefaultsConfig::NO_DESCRIPTION
        {
            return Ok(());
        }
        self.ensure_not_reserved(name, description, None)?;

        self.entries
            .retain(|e| e.name != name && e.description != description);
        self.entries.push(ProcessEntry {
            name: name.to_string(),
            description: description.to_string(),
        });
        Ok(())
    }

    /// Rename `old_name` to `new_name`, optionally binding a new description.
    ///
    /// Returns the previous description when it was replaced. The caller must
    /// then re-point every sidecar value that still holds it.
    pub fn rename(
        &mut self,
        old_name: &str,
        new_name: &str,
        new_description: Option<&str>,
    ) -> Result<Option<String>> {
        let index = self
            .entries
            .iter()
            .position(|e| e.name == old_name)
            .ok_or_else(|| MdtagError::UnknownProcessName {
                name: old_name.to_string(),
            })?;

        if Self::is_reserved(&self.entries[index]) {
            return Err(MdtagError::ReservedProcess {
                name: old_name.to_string(),
            });
        }

        let old_description = self.entries[index].description.clone();
        let description = new_description.unwrap_or(&old_description).to_string();
        self.ensure_not_reserved(new_name, &description, Some(old_name))?;

        // Evict other entries that clash with the new pair, keeping the slot position.
        let mut position = 0;
        let mut kept_index = index;
        self.entries.retain(|e| {
            let current = position;
            position += 1;
            if current == index {
                return true;
            }
            let clash = e.name == new_name || e.description == description;
            if clash && current < index {
                kept_index -= 1;
            }
            !clash
        });

        let entry = &mut self.entries[kept_index];
        entry.name = new_name.to_string();
        entry.description = description;

        if entry.description != old_description {
            Ok(Some(old_description))
        } else {
            Ok(None)
        }
    }

    /// Remove `name` and its description, returning the description.
    ///
    /// The seeded "No Description" entry cannot be removed. Sidecar values
    /// still holding the description are not touched here.
    pub fn remove(&mut self, name: &str) -> Result<String> {
        if name == DefaultsConfig::NO_DESCRIPTION_NAME {
            return Err(MdtagError::ReservedProcess {
                name: name.to_string(),
            });
        }
        let index = self
            .entries
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| MdtagError::UnknownProcessName {
                name: name.to_string(),
            })?;
        Ok(self.entries.remove(index).description)
    }

    pub fn all_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn all_descriptions(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.description.clone()).collect()
    }

    pub fn entries(&self) -> &[ProcessEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<ProcessEntry>> for ProcessDirectory {
    /// Replays the stored entries through `add`, so a hand-edited file with
    /// clashes still loads as a bijection.
    fn from(entries: Vec<ProcessEntry>) -> Self {
        let mut directory = Self::new();
        for entry in entries {
            if let Err(e) = directory.add(&entry.name, &entry.description) {
                warn!("Dropping stored process {:?}: {}", entry.name, e);
            }
        }
        directory
    }
}

impl From<ProcessDirectory> for Vec<ProcessEntry> {
    fn from(directory: ProcessDirectory) -> Self {
        directory.entries
    }
}
