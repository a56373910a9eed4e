//! Workspace: the corpus together with the settings it is read under.
//!
//! This is the entry point a front end talks to. It owns the [`Settings`]
//! (no global state) and routes every corpus-wide change through a
//! [`Prompt`] confirmation before the first write.

use crate::config::DefaultsConfig;
use crate::corpus::CorpusIndex;
use crate::interact::{require_confirmation, Prompt};
use crate::metadata::{Settings, SettingsStore};
use crate::migration::{MigrationReport, SchemaMigration};
use crate::process::{ProcessDirectory, ProcessEntry};
use crate::recovery::{detect_foreign_schema, ForeignSchemaReport};
use crate::schema::KeywordSchema;
use crate::sidecar::format::strip_newlines;
use crate::sidecar::SidecarRecord;
use crate::{MdtagError, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// `"Weld" (metal joining), "Cut" (metal cutting)` for a confirmation question.
fn describe_entries(entries: &[ProcessEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{:?} ({})", e.name, e.description))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A working root, its sidecar records and the active settings.
pub struct Workspace {
    store: SettingsStore,
    settings: Settings,
    corpus: CorpusIndex,
}

impl Workspace {
    /// Load settings from `store` and index the corpus under `root`.
    ///
    /// Fails with `SettingsMissing` when the store was never initialized;
    /// run recovery or initialize defaults first.
    pub fn open(root: impl AsRef<Path>, store: SettingsStore) -> Result<Self> {
        let settings = store.load()?;
        Self::with_settings(root, store, settings)
    }

    /// Index the corpus under `root` using explicit settings.
    pub fn with_settings(
        root: impl AsRef<Path>,
        store: SettingsStore,
        settings: Settings,
    ) -> Result<Self> {
        let root = std::path::absolute(root.as_ref())
            .map_err(|e| MdtagError::io_with_path(e, root.as_ref()))?;
        let corpus = CorpusIndex::build(root, &settings.schema)?;
        Ok(Self {
            store,
            settings,
            corpus,
        })
    }

    pub fn root(&self) -> &Path {
        self.corpus.root()
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn schema(&self) -> &KeywordSchema {
        &self.settings.schema
    }

    pub fn processes(&self) -> &ProcessDirectory {
        &self.settings.processes
    }

    pub fn corpus(&self) -> &CorpusIndex {
        &self.corpus
    }

    /// Data files relative to the root.
    pub fn data_files(&self) -> Vec<PathBuf> {
        self.corpus
            .data_files()
            .map(|p| self.corpus.relative_path(p).to_path_buf())
            .collect()
    }

    // ========================================
    // Single records
    // ========================================

    /// Record for `path`, relative to the root or absolute.
    pub fn record(&self, path: &Path) -> Result<&SidecarRecord> {
        self.corpus.record(path)
    }

    pub fn value(&self, path: &Path, keyword: &str) -> Result<&str> {
        self.corpus.record(path)?.get(keyword)
    }

    /// Set one value. Files created after the scan are picked up here.
    pub fn set_value(&mut self, path: &Path, keyword: &str, value: &str) -> Result<()> {
        self.corpus
            .open_record(path, &self.settings.schema)?
            .set(keyword, value)
    }

    /// Process name for the description stored in `path`'s record.
    pub fn process_name(&self, path: &Path) -> Result<&str> {
        let description = self
            .corpus
            .record(path)?
            .get(self.settings.schema.process_keyword())?;
        self.settings.processes.by_description(description)
    }

    /// Store the description bound to process `name` in `path`'s record.
    pub fn set_process(&mut self, path: &Path, name: &str) -> Result<()> {
        let description = self.settings.processes.by_name(name)?.to_string();
        let keyword = self.settings.schema.process_keyword().to_string();
        self.set_value(path, &keyword, &description)
    }

    // ========================================
    // Schema
    // ========================================

    /// Replace the schema. See [`SchemaMigration::rename_or_reorder`].
    pub fn change_schema(
        &mut self,
        requested: &[String],
        prompt: &dyn Prompt,
    ) -> Result<MigrationReport> {
        let next = self.settings.schema.reordered(requested)?;
        let dropped: Vec<String> = self
            .settings
            .schema
            .labels()
            .into_iter()
            .filter(|label| !next.contains(label))
            .collect();

        let question = if dropped.is_empty() {
            format!(
                "Rewrite {} sidecar files with keywords {:?}?",
                self.corpus.len(),
                next.labels()
            )
        } else {
            format!(
                "Rewrite {} sidecar files with keywords {:?}? Values for {:?} will be deleted.",
                self.corpus.len(),
                next.labels(),
                dropped
            )
        };
        require_confirmation(prompt, &question)?;

        let report = SchemaMigration::new(&mut self.corpus, &self.store)
            .rename_or_reorder(&self.settings.schema, requested)?;
        self.settings.schema = report.schema.clone();
        Ok(report)
    }

    /// Rename one keyword, keeping its values.
    pub fn rename_keyword(
        &mut self,
        index: usize,
        new_label: &str,
        prompt: &dyn Prompt,
    ) -> Result<MigrationReport> {
        let next = self.settings.schema.renamed(index, new_label)?;
        let old_label = self.settings.schema.label(index).unwrap_or_default();
        require_confirmation(
            prompt,
            &format!(
                "Rename keyword {:?} to {:?} in {} sidecar files?",
                old_label,
                next.label(index).unwrap_or_default(),
                self.corpus.len()
            ),
        )?;

        let report = SchemaMigration::new(&mut self.corpus, &self.store).rename_single_keyword(
            &self.settings.schema,
            index,
            new_label,
        )?;
        self.settings.schema = report.schema.clone();
        Ok(report)
    }

    // ========================================
    // Process directory
    // ========================================

    /// Add a process and save the directory.
    ///
    /// A process that clashes on name or description is evicted, which needs
    /// confirmation. Records left holding an evicted description fall back to
    /// the empty description. Returns the number of records rewritten.
    pub fn add_process(
        &mut self,
        name: &str,
        description: &str,
        prompt: &dyn Prompt,
    ) -> Result<usize> {
        let description = strip_newlines(description);
        let evicted: Vec<ProcessEntry> = self
            .settings
            .processes
            .clashes(name, &description, None)
            .into_iter()
            .cloned()
            .collect();

        let mut processes = self.settings.processes.clone();
        processes.add(name, &description)?;

        if !evicted.is_empty() {
            require_confirmation(
                prompt,
                &format!(
                    "Adding {:?} replaces {}. Continue?",
                    name,
                    describe_entries(&evicted)
                ),
            )?;
        }

        let rewritten = self.clear_orphaned(&evicted, &description)?;
        self.store.save_processes(&processes)?;
        self.settings.processes = processes;
        info!("Added process {:?}", name);
        Ok(rewritten)
    }

    /// Rename a process, optionally with a new description.
    ///
    /// A new description is written into every record that held the old one.
    /// A process already holding the new name or description is evicted and
    /// its records fall back to the empty description. Either case needs
    /// confirmation. Returns the number of records rewritten.
    pub fn rename_process(
        &mut self,
        old_name: &str,
        new_name: &str,
        new_description: Option<&str>,
        prompt: &dyn Prompt,
    ) -> Result<usize> {
        let old_description = self.settings.processes.by_name(old_name)?.to_string();
        let description = new_description
            .map(strip_newlines)
            .unwrap_or_else(|| old_description.clone());
        let evicted: Vec<ProcessEntry> = self
            .settings
            .processes
            .clashes(new_name, &description, Some(old_name))
            .into_iter()
            .cloned()
            .collect();

        let mut processes = self.settings.processes.clone();
        let replaced = processes.rename(old_name, new_name, Some(description.as_str()))?;

        let mut questions = Vec::new();
        if replaced.is_some() {
            questions.push(format!(
                "Replace process description {:?} with {:?} in every sidecar file?",
                old_description, description
            ));
        }
        if !evicted.is_empty() {
            questions.push(format!(
                "Renaming {:?} to {:?} replaces {}.",
                old_name,
                new_name,
                describe_entries(&evicted)
            ));
        }
        if !questions.is_empty() {
            require_confirmation(prompt, &questions.join(" "))?;
        }

        let mut rewritten = 0;
        if let Some(old) = replaced {
            let keyword = self.settings.schema.process_keyword().to_string();
            rewritten += self.corpus.replace_values(&keyword, &old, &description)?;
        }
        rewritten += self.clear_orphaned(&evicted, &description)?;

        self.store.save_processes(&processes)?;
        self.settings.processes = processes;
        Ok(rewritten)
    }

    /// Point records holding an evicted description at the empty one.
    ///
    /// An evicted entry sharing `kept_description` keeps its records, since
    /// that description is still bound.
    fn clear_orphaned(
        &mut self,
        evicted: &[ProcessEntry],
        kept_description: &str,
    ) -> Result<usize> {
        let keyword = self.settings.schema.process_keyword().to_string();
        let mut rewritten = 0;
        for entry in evicted.iter().filter(|e| e.description != kept_description) {
            rewritten += self.corpus.replace_values(
                &keyword,
                &entry.description,
                DefaultsConfig::NO_DESCRIPTION,
            )?;
        }
        Ok(rewritten)
    }

    /// Remove a process. Records that used it fall back to the empty
    /// description first. Returns the number of records rewritten.
    pub fn remove_process(&mut self, name: &str, prompt: &dyn Prompt) -> Result<usize> {
        let mut processes = self.settings.processes.clone();
        let description = processes.remove(name)?;

        require_confirmation(
            prompt,
            &format!(
                "Delete process {:?} and clear it from every sidecar file?",
                name
            ),
        )?;

        let keyword = self.settings.schema.process_keyword().to_string();
        let rewritten = self.corpus.replace_values(
            &keyword,
            &description,
            DefaultsConfig::NO_DESCRIPTION,
        )?;

        self.store.save_processes(&processes)?;
        self.settings.processes = processes;
        Ok(rewritten)
    }

    // ========================================
    // Bulk operations
    // ========================================

    /// Copy values from `source` to every record in `targets`.
    ///
    /// With `keywords` set to `None` every keyword is copied. Returns the
    /// number of target records written.
    pub fn copy_metadata(
        &mut self,
        source: &Path,
        targets: &[PathBuf],
        keywords: Option<&[String]>,
        prompt: &dyn Prompt,
    ) -> Result<usize> {
        let source_record = self.corpus.record(source)?;
        let selected: Vec<(String, String)> = match keywords {
            Some(keywords) => keywords
                .iter()
                .map(|k| Ok((k.clone(), source_record.get(k)?.to_string())))
                .collect::<Result<_>>()?,
            None => source_record
                .entries()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };

        let schema = &self.settings.schema;
        for target in targets {
            self.corpus.data_path(target)?;
        }

        require_confirmation(
            prompt,
            &format!(
                "Overwrite {} keywords in {} files with the values of {}?",
                selected.len(),
                targets.len(),
                source.display()
            ),
        )?;

        for target in targets {
            let record = self.corpus.open_record(target, schema)?;
            for (keyword, value) in &selected {
                record.set(keyword, value)?;
            }
        }

        info!(
            "Copied {} keywords from {} to {} files",
            selected.len(),
            source.display(),
            targets.len()
        );
        Ok(targets.len())
    }

    /// Scan the corpus for sidecars written under other settings.
    pub fn check_foreign(&self) -> Result<ForeignSchemaReport> {
        detect_foreign_schema(
            self.corpus.root(),
            &self.settings.schema,
            &self.settings.processes,
        )
    }
}
