//! Corpus index: every data file under a working root and its sidecar record.

use crate::config::PathsConfig;
use crate::schema::KeywordSchema;
use crate::sidecar::SidecarRecord;
use crate::{MdtagError, Result};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

fn is_sidecar_storage(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name() == PathsConfig::METADATA_DIR_NAME
}

fn walk_error(err: walkdir::Error) -> MdtagError {
    let path = err.path().map(Path::to_path_buf);
    match err.into_io_error() {
        Some(io) => match path {
            Some(path) => MdtagError::io_with_path(io, path),
            None => MdtagError::from(io),
        },
        None => MdtagError::Io {
            message: "filesystem loop while walking directory".to_string(),
            path,
            source: None,
        },
    }
}

/// List every data file under `root`, sorted.
///
/// Any directory or file named `metadata` is skipped, along with everything
/// below such a directory. This is a one-shot scan, not a watch.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(MdtagError::NotADirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_sidecar_storage(e));
    for entry in walker {
        let entry = entry.map_err(walk_error)?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    debug!("Discovered {} data files under {}", files.len(), root.display());
    Ok(files)
}

/// All sidecar records of a corpus, keyed by data file path.
#[derive(Debug)]
pub struct CorpusIndex {
    root: PathBuf,
    records: BTreeMap<PathBuf, SidecarRecord>,
}

impl CorpusIndex {
    /// Discover the data files under `root` and open one record per file.
    ///
    /// Missing sidecars are created. The first failure aborts the build.
    pub fn build(root: impl Into<PathBuf>, schema: &KeywordSchema) -> Result<Self> {
        let root = root.into();
        let mut records = BTreeMap::new();
        for data_path in discover(&root)? {
            let record = SidecarRecord::open(&data_path, schema)?;
            records.insert(data_path, record);
        }

        info!(
            "Indexed {} data files under {}",
            records.len(),
            root.display()
        );
        Ok(Self { root, records })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Known data file paths, sorted.
    pub fn data_files(&self) -> impl Iterator<Item = &Path> {
        self.records.keys().map(PathBuf::as_path)
    }

    pub fn records(&self) -> impl Iterator<Item = &SidecarRecord> {
        self.records.values()
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut SidecarRecord> {
        self.records.values_mut()
    }

    /// Resolve a path given relative to the root, or as-is if absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Path relative to the root, for display.
    pub fn relative_path<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    /// Resolve `path` and check that it names a data file of this corpus.
    ///
    /// The file must exist below the root, and no component of its path
    /// relative to the root may be `..` or a sidecar storage directory.
    pub fn data_path(&self, path: &Path) -> Result<PathBuf> {
        let resolved = self.resolve(path);
        if self.records.contains_key(&resolved) {
            return Ok(resolved);
        }

        let inside = resolved.strip_prefix(&self.root).is_ok_and(|relative| {
            relative.components().all(|c| {
                matches!(c, Component::Normal(name) if name != PathsConfig::METADATA_DIR_NAME)
            })
        });
        if inside && resolved.is_file() {
            Ok(resolved)
        } else {
            debug!("Rejected data path {}", resolved.display());
            Err(MdtagError::UnknownDataFile(resolved))
        }
    }

    pub fn record(&self, path: &Path) -> Result<&SidecarRecord> {
        let path = self.resolve(path);
        self.records
            .get(&path)
            .ok_or(MdtagError::UnknownDataFile(path))
    }

    pub fn record_mut(&mut self, path: &Path) -> Result<&mut SidecarRecord> {
        let path = self.resolve(path);
        self.records
            .get_mut(&path)
            .ok_or(MdtagError::UnknownDataFile(path))
    }

    /// Record for a referenced file, opening (and creating) it when it was not
    /// part of the initial scan. See [`Self::data_path`] for what is accepted.
    pub fn open_record(
        &mut self,
        path: &Path,
        schema: &KeywordSchema,
    ) -> Result<&mut SidecarRecord> {
        let path = self.data_path(path)?;
        if !self.records.contains_key(&path) {
            let record = SidecarRecord::open(&path, schema)?;
            self.records.insert(path.clone(), record);
        }
        self.record_mut(&path)
    }

    /// Set `keyword` to `new` on every record whose value equals `old`.
    ///
    /// Returns how many records were rewritten.
    pub fn replace_values(&mut self, keyword: &str, old: &str, new: &str) -> Result<usize> {
        let mut count = 0;
        for record in self.records.values_mut() {
            if record.get(keyword)? == old {
                record.set(keyword, new)?;
                count += 1;
            }
        }
        if count > 0 {
            info!("Re-pointed {} records from {:?} to {:?}", count, old, new);
        }
        Ok(count)
    }
}
