//! Recovery of lost settings from the sidecar files of a corpus.
//!
//! Everything here is best effort. The `recover_*` functions only propose
//! settings. The `adopt_*` functions persist a proposal once the user has
//! confirmed it.

use crate::config::{DefaultsConfig, PathsConfig};
use crate::interact::{require_confirmation, Prompt};
use crate::metadata::{read_text, Settings, SettingsStore};
use crate::process::ProcessDirectory;
use crate::schema::KeywordSchema;
use crate::sidecar::{parse_sidecar, ParsedSidecar};
use crate::{MdtagError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// True for a file inside a `metadata` directory with the sidecar suffix.
pub fn is_sidecar_file(path: &Path) -> bool {
    let in_storage = path
        .parent()
        .and_then(Path::file_name)
        .is_some_and(|dir| dir == PathsConfig::METADATA_DIR_NAME);
    let named_like_sidecar = path
        .file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(PathsConfig::SIDECAR_SUFFIX));
    in_storage && named_like_sidecar
}

/// Every sidecar file under `root`, sorted.
pub fn sidecar_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(MdtagError::NotADirectory(root.to_path_buf()));
    }

    let files: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_sidecar_file(e.path()))
        .map(|e| e.into_path())
        .collect();

    debug!("Found {} sidecar files under {}", files.len(), root.display());
    Ok(files)
}

/// Parse every readable sidecar under `root`, skipping broken files.
fn readable_sidecars(root: &Path) -> Result<(Vec<(PathBuf, ParsedSidecar)>, Vec<PathBuf>)> {
    let mut parsed = Vec::new();
    let mut unreadable = Vec::new();
    for path in sidecar_files(root)? {
        let result = read_text(&path)
            .and_then(|text| parse_sidecar(&text.unwrap_or_default(), Some(&path)));
        match result {
            Ok(sidecar) => parsed.push((path, sidecar)),
            Err(e) => {
                warn!("Skipping sidecar {}: {}", path.display(), e);
                unreadable.push(path);
            }
        }
    }
    Ok((parsed, unreadable))
}

/// Propose a schema from the keyword labels of one sidecar file.
pub fn recover_schema(sample_text: &str) -> Result<Vec<String>> {
    let parsed = parse_sidecar(sample_text, None)?;
    Ok(parsed.keywords().map(str::to_string).collect())
}

/// [`recover_schema`] for a sidecar on disk.
pub fn recover_schema_from_file(path: &Path) -> Result<Vec<String>> {
    let text = read_text(path)?.ok_or_else(|| MdtagError::Io {
        message: "sidecar file not found".to_string(),
        path: Some(path.to_path_buf()),
        source: None,
    })?;
    let parsed = parse_sidecar(&text, Some(path))?;
    Ok(parsed.keywords().map(str::to_string).collect())
}

/// Propose a process directory from the descriptions used in the corpus.
///
/// Each distinct non-empty value of the process line gets a placeholder
/// name (`descr_1`, `descr_2`, ...) in first-seen order. Real names have to
/// be restored by renaming.
pub fn recover_process_registry(root: &Path) -> Result<ProcessDirectory> {
    let (sidecars, _) = readable_sidecars(root)?;

    let mut descriptions: Vec<String> = Vec::new();
    for (_, sidecar) in &sidecars {
        match sidecar.process_value() {
            Some(value) if !value.is_empty() => {
                if !descriptions.iter().any(|d| d == value) {
                    descriptions.push(value.to_string());
                }
            }
            _ => {}
        }
    }

    let mut directory = ProcessDirectory::new();
    for (i, description) in descriptions.iter().enumerate() {
        directory.add(
            &format!("{}{}", DefaultsConfig::PLACEHOLDER_PREFIX, i + 1),
            description,
        )?;
    }

    info!(
        "Recovered {} process descriptions from {} sidecars",
        descriptions.len(),
        sidecars.len()
    );
    Ok(directory)
}

/// Result of scanning a corpus for sidecars written under other settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForeignSchemaReport {
    /// Some sidecar uses a keyword the current schema doesn't have.
    pub foreign_keywords: bool,
    /// Some sidecar holds a process description the directory doesn't know.
    pub foreign_descriptions: bool,
    pub unknown_keywords: Vec<String>,
    pub unknown_descriptions: Vec<String>,
    /// Sidecars that triggered either flag.
    pub files: Vec<PathBuf>,
    /// Sidecars that could not be read or parsed.
    pub unreadable: Vec<PathBuf>,
}

impl ForeignSchemaReport {
    pub fn is_clean(&self) -> bool {
        !self.foreign_keywords && !self.foreign_descriptions
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

/// Find sidecars whose keywords or process descriptions fall outside the
/// given schema and directory. Nothing is modified.
pub fn detect_foreign_schema(
    root: &Path,
    schema: &KeywordSchema,
    registry: &ProcessDirectory,
) -> Result<ForeignSchemaReport> {
    let (sidecars, unreadable) = readable_sidecars(root)?;
    let mut report = ForeignSchemaReport {
        unreadable,
        ..Default::default()
    };

    for (path, sidecar) in sidecars {
        let mut foreign = false;

        for keyword in sidecar.keywords() {
            if !schema.contains(keyword) {
                report.foreign_keywords = true;
                push_unique(&mut report.unknown_keywords, keyword);
                foreign = true;
            }
        }

        if let Some(description) = sidecar.process_value() {
            if !registry.contains_description(description) {
                report.foreign_descriptions = true;
                push_unique(&mut report.unknown_descriptions, description);
                foreign = true;
            }
        }

        if foreign {
            report.files.push(path);
        }
    }

    if !report.is_clean() {
        info!(
            "Found {} sidecars written under different settings",
            report.files.len()
        );
    }
    Ok(report)
}

/// Validate `candidate` as a schema and save it once the user agrees.
pub fn adopt_schema(
    store: &SettingsStore,
    candidate: &[String],
    prompt: &dyn Prompt,
) -> Result<KeywordSchema> {
    let schema = KeywordSchema::from_labels(candidate)?;
    require_confirmation(
        prompt,
        &format!("Found the following keywords: {:?}. Save them?", schema.labels()),
    )?;
    store.save_schema(&schema)?;
    Ok(schema)
}

/// Save a recovered process directory once the user agrees.
pub fn adopt_process_registry(
    store: &SettingsStore,
    candidate: &ProcessDirectory,
    prompt: &dyn Prompt,
) -> Result<()> {
    let question = if candidate.len() <= 1 {
        "No process descriptions found. Initialize an empty process directory?".to_string()
    } else {
        format!(
            "Found the following descriptions: {:?}. Save them with placeholder names?",
            &candidate.all_descriptions()[1..]
        )
    };
    require_confirmation(prompt, &question)?;
    store.save_processes(candidate)
}

/// Write the default schema and an empty process directory.
pub fn initialize_defaults(store: &SettingsStore, prompt: &dyn Prompt) -> Result<Settings> {
    require_confirmation(
        prompt,
        "This may overwrite existing keywords and process descriptions. Initialize defaults?",
    )?;
    let settings = Settings::default();
    store.save(&settings)?;
    info!("Initialized settings in {}", store.settings_dir().display());
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interact::AssumeYes;
    use std::fs;
    use tempfile::TempDir;

    struct Decline;

    impl Prompt for Decline {
        fn confirm(&self, _question: &str) -> bool {
            false
        }

        fn select_working_directory(&self) -> Option<PathBuf> {
            None
        }
    }

    fn write_sidecar(root: &Path, name: &str, body: &str) -> PathBuf {
        let path = root.join("metadata").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("path to data file: x\n\n{}", body)).unwrap();
        path
    }

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_recover_schema_from_body() {
        let text = "path to data file: a\n\na:  1\nb:  2\n";
        assert_eq!(recover_schema(text).unwrap(), labels(&["a", "b"]));
    }

    #[test]
    fn test_is_sidecar_file() {
        assert!(is_sidecar_file(Path::new("/d/metadata/a-csv-metadata.txt")));
        assert!(!is_sidecar_file(Path::new("/d/a-csv-metadata.txt")));
        assert!(!is_sidecar_file(Path::new("/d/metadata/notes.txt")));
    }

    #[test]
    fn test_recover_process_registry_placeholders() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write_sidecar(root, "a-csv-metadata.txt", "process description:  metal joining\n");
        write_sidecar(root, "b-csv-metadata.txt", "process description:  \n");
        write_sidecar(root, "c-csv-metadata.txt", "process description:  metal joining\n");
        write_sidecar(root, "d-csv-metadata.txt", "process description:  cutting\n");

        let directory = recover_process_registry(root).unwrap();
        assert_eq!(
            directory.all_names(),
            labels(&["No Description", "descr_1", "descr_2"])
        );
        assert_eq!(directory.by_name("descr_1").unwrap(), "metal joining");
        assert_eq!(directory.by_name("descr_2").unwrap(), "cutting");
    }

    #[test]
    fn test_detect_foreign_schema() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write_sidecar(
            root,
            "a-csv-metadata.txt",
            "process description:  \noperator:  Bob\n",
        );
        write_sidecar(
            root,
            "b-csv-metadata.txt",
            "process description:  painting\ncolour:  red\n",
        );
        write_sidecar(root, "c-csv-metadata.txt", "broken\n");

        let schema =
            KeywordSchema::from_labels(&labels(&["process description", "operator"])).unwrap();
        let report = detect_foreign_schema(root, &schema, &ProcessDirectory::new()).unwrap();

        assert!(report.foreign_keywords);
        assert!(report.foreign_descriptions);
        assert_eq!(report.unknown_keywords, labels(&["colour"]));
        assert_eq!(report.unknown_descriptions, labels(&["painting"]));
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.unreadable.len(), 1);
    }

    #[test]
    fn test_detect_clean_corpus() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write_sidecar(root, "a-csv-metadata.txt", "process description:  \n");

        let report =
            detect_foreign_schema(root, &KeywordSchema::default(), &ProcessDirectory::new())
                .unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn test_adopt_requires_confirmation() {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::new(temp.path());
        let candidate = labels(&["process description", "operator"]);

        assert!(matches!(
            adopt_schema(&store, &candidate, &Decline),
            Err(MdtagError::Cancelled)
        ));
        assert!(store.load_schema().unwrap().is_none());

        let schema = adopt_schema(&store, &candidate, &AssumeYes).unwrap();
        assert_eq!(store.load_schema().unwrap(), Some(schema));
    }

    #[test]
    fn test_initialize_defaults() {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::new(temp.path().join("settings"));

        assert!(initialize_defaults(&store, &Decline).is_err());
        assert!(!store.is_initialized());

        let settings = initialize_defaults(&store, &AssumeYes).unwrap();
        assert_eq!(settings.schema.labels(), labels(&["process description"]));
        assert_eq!(store.load().unwrap(), settings);
    }
}
