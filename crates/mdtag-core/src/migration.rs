//! Corpus-wide keyword schema migration.
//!
//! A migration moves through `Requested → Validating → {Rejected | Applying}
//! → Persisted`. Validation happens before any file is touched. Applying
//! stages every new sidecar next to its target, and only renames once the
//! whole batch is staged. A failed staging write removes the staged files
//! and leaves the corpus as it was. A failure during the rename pass is
//! reported but cannot be rolled back.

use crate::corpus::CorpusIndex;
use crate::metadata::{commit_staged, discard_staged, stage_text, SettingsStore};
use crate::schema::KeywordSchema;
use crate::sidecar::SidecarRecord;
use crate::Result;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Phase of a migration, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPhase {
    Requested,
    Validating,
    Rejected,
    Applying,
    Persisted,
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationPhase::Requested => "requested",
            MigrationPhase::Validating => "validating",
            MigrationPhase::Rejected => "rejected",
            MigrationPhase::Applying => "applying",
            MigrationPhase::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Outcome of a completed migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub schema: KeywordSchema,
    pub records_rewritten: usize,
}

/// Applies schema changes to every record in a corpus and persists the schema.
pub struct SchemaMigration<'a> {
    corpus: &'a mut CorpusIndex,
    store: &'a SettingsStore,
}

impl<'a> SchemaMigration<'a> {
    pub fn new(corpus: &'a mut CorpusIndex, store: &'a SettingsStore) -> Self {
        Self { corpus, store }
    }

    /// Replace the schema with `requested`.
    ///
    /// Position 0 of `requested` is the reserved process slot and keeps the
    /// current process label. Values follow their label, so a label changed
    /// in place loses its values (use [`Self::rename_single_keyword`]).
    pub fn rename_or_reorder(
        &mut self,
        current: &KeywordSchema,
        requested: &[String],
    ) -> Result<MigrationReport> {
        let next = self.validate(|| current.reordered(requested))?;
        let labels = next.labels();
        self.apply(&next, |record| {
            record.apply_schema(&labels);
            Ok(())
        })
    }

    /// Rename the label at `index`, carrying every record's value over.
    pub fn rename_single_keyword(
        &mut self,
        current: &KeywordSchema,
        index: usize,
        new_label: &str,
    ) -> Result<MigrationReport> {
        let next = self.validate(|| current.renamed(index, new_label))?;
        let label = next.label(index).unwrap_or_default().to_string();
        self.apply(&next, |record| record.rename_keyword(index, &label))
    }

    fn validate<F>(&self, build: F) -> Result<KeywordSchema>
    where
        F: FnOnce() -> Result<KeywordSchema>,
    {
        debug!("Schema migration {}", MigrationPhase::Requested);
        debug!("Schema migration {}", MigrationPhase::Validating);
        build().inspect_err(|e| {
            debug!("Schema migration {}: {}", MigrationPhase::Rejected, e);
        })
    }

    /// Stage every transformed record, commit the batch, then save the schema.
    fn apply<F>(&mut self, next: &KeywordSchema, mut transform: F) -> Result<MigrationReport>
    where
        F: FnMut(&mut SidecarRecord) -> Result<()>,
    {
        debug!("Schema migration {}", MigrationPhase::Applying);

        let mut updated = Vec::with_capacity(self.corpus.len());
        for record in self.corpus.records() {
            let mut next_record = record.clone();
            transform(&mut next_record)?;
            updated.push(next_record);
        }

        let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(updated.len());
        for record in &updated {
            match stage_text(record.sidecar_path(), &record.serialize()) {
                Ok(path) => staged.push((path, record.sidecar_path().to_path_buf())),
                Err(e) => {
                    warn!("Staging failed, discarding {} staged files", staged.len());
                    for (path, _) in &staged {
                        discard_staged(path);
                    }
                    return Err(e);
                }
            }
        }

        let total = staged.len();
        let mut pending = staged.into_iter();
        let mut committed = 0;
        while let Some((staged_path, target)) = pending.next() {
            if let Err(e) = commit_staged(&staged_path, &target) {
                warn!(
                    "Migration left the corpus partially migrated: {} of {} sidecars committed",
                    committed, total
                );
                discard_staged(&staged_path);
                for (rest, _) in pending {
                    discard_staged(&rest);
                }
                return Err(e);
            }
            committed += 1;
        }

        for (record, next_record) in self.corpus.records_mut().zip(updated) {
            *record = next_record;
        }

        self.store.save_schema(next)?;
        debug!("Schema migration {}", MigrationPhase::Persisted);
        info!("Migrated {} sidecar records to the new schema", committed);

        Ok(MigrationReport {
            schema: next.clone(),
            records_rewritten: committed,
        })
    }
}
