//! Integration tests for the Workspace public interface.
//!
//! These tests drive a corpus on disk through the same entry points a front
//! end uses, then read the sidecar files back to check what was written.

use mdtag_core::recovery::{
    adopt_process_registry, adopt_schema, detect_foreign_schema, recover_process_registry,
    recover_schema, recover_schema_from_file,
};
use mdtag_core::sidecar::format::parse_sidecar;
use mdtag_core::{
    AssumeYes, KeywordSchema, MdtagError, ProcessDirectory, Prompt, Settings, SettingsStore,
    Workspace,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

struct Decline;

impl Prompt for Decline {
    fn confirm(&self, _question: &str) -> bool {
        false
    }

    fn select_working_directory(&self) -> Option<PathBuf> {
        None
    }
}

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Create a corpus with three data files and initialized settings.
fn create_test_env() -> (TempDir, TempDir) {
    let corpus = TempDir::new().expect("Failed to create temp dir");
    let settings = TempDir::new().expect("Failed to create temp dir");

    fs::write(corpus.path().join("file1.csv"), b"1").unwrap();
    fs::write(corpus.path().join("file2.csv"), b"2").unwrap();
    fs::create_dir_all(corpus.path().join("run")).unwrap();
    fs::write(corpus.path().join("run/file3.dat"), b"3").unwrap();

    let store = SettingsStore::new(settings.path());
    store
        .save(&Settings {
            schema: KeywordSchema::from_labels(&labels(&["process description", "operator"]))
                .unwrap(),
            processes: ProcessDirectory::new(),
        })
        .unwrap();

    (corpus, settings)
}

fn open(corpus: &TempDir, settings: &TempDir) -> Workspace {
    Workspace::open(corpus.path(), SettingsStore::new(settings.path())).unwrap()
}

fn sidecar_text(corpus: &TempDir, relative: &str) -> String {
    fs::read_to_string(corpus.path().join(relative)).unwrap()
}

#[test]
fn test_open_creates_every_sidecar() {
    let (corpus, settings) = create_test_env();
    let ws = open(&corpus, &settings);

    assert_eq!(
        ws.data_files(),
        vec![
            PathBuf::from("file1.csv"),
            PathBuf::from("file2.csv"),
            PathBuf::from("run/file3.dat"),
        ]
    );

    let text = sidecar_text(&corpus, "run/metadata/file3-dat-metadata.txt");
    let parsed = parse_sidecar(&text, None).unwrap();
    assert_eq!(
        parsed.data_path.as_deref(),
        Some(corpus.path().join("run/file3.dat").to_string_lossy().as_ref())
    );
    assert_eq!(
        parsed.keywords().collect::<Vec<_>>(),
        vec!["process description", "operator"]
    );
}

#[test]
fn test_open_fails_for_missing_root() {
    let (_corpus, settings) = create_test_env();
    let result = Workspace::open(
        "/nonexistent/path/that/does/not/exist",
        SettingsStore::new(settings.path()),
    );
    assert!(matches!(result, Err(MdtagError::NotADirectory(_))));
}

#[test]
fn test_add_keyword_across_corpus() {
    let (corpus, settings) = create_test_env();
    let mut ws = open(&corpus, &settings);
    ws.set_value(Path::new("file2.csv"), "operator", "Bob").unwrap();

    let report = ws
        .change_schema(
            &labels(&["process description", "operator", "notes"]),
            &AssumeYes,
        )
        .unwrap();
    assert_eq!(report.records_rewritten, 3);

    // Reopen so values come from disk, not memory.
    let ws = open(&corpus, &settings);
    assert_eq!(ws.value(Path::new("file2.csv"), "operator").unwrap(), "Bob");
    assert_eq!(ws.value(Path::new("file2.csv"), "notes").unwrap(), "");
    for other in ["file1.csv", "run/file3.dat"] {
        assert_eq!(ws.value(Path::new(other), "operator").unwrap(), "");
        assert_eq!(ws.value(Path::new(other), "notes").unwrap(), "");
    }

    let leftovers: Vec<_> = walk_files(corpus.path())
        .into_iter()
        .filter(|p| p.to_string_lossy().ends_with(".staged"))
        .collect();
    assert!(leftovers.is_empty(), "staged files left: {:?}", leftovers);
}

#[test]
fn test_dropped_keyword_loses_values() {
    let (corpus, settings) = create_test_env();
    let mut ws = open(&corpus, &settings);
    ws.set_value(Path::new("file1.csv"), "operator", "Alice").unwrap();

    ws.change_schema(&labels(&["process description", "site"]), &AssumeYes)
        .unwrap();
    ws.change_schema(
        &labels(&["process description", "site", "operator"]),
        &AssumeYes,
    )
    .unwrap();

    assert_eq!(ws.value(Path::new("file1.csv"), "operator").unwrap(), "");
    assert!(!sidecar_text(&corpus, "metadata/file1-csv-metadata.txt").contains("Alice"));
}

#[test]
fn test_rename_keyword_preserves_values() {
    let (corpus, settings) = create_test_env();
    let mut ws = open(&corpus, &settings);
    ws.set_value(Path::new("file1.csv"), "operator", "Alice").unwrap();

    let index = ws.schema().position("operator").unwrap();
    ws.rename_keyword(index, "technician", &AssumeYes).unwrap();

    let ws = open(&corpus, &settings);
    assert_eq!(
        ws.value(Path::new("file1.csv"), "technician").unwrap(),
        "Alice"
    );
    assert!(matches!(
        ws.value(Path::new("file1.csv"), "operator"),
        Err(MdtagError::KeyNotFound { .. })
    ));
}

#[test]
fn test_process_add_then_remove() {
    let (corpus, settings) = create_test_env();
    let mut ws = open(&corpus, &settings);

    ws.add_process("Welding", "metal joining", &AssumeYes).unwrap();
    assert_eq!(ws.processes().by_name("Welding").unwrap(), "metal joining");
    assert_eq!(
        ws.processes().by_description("metal joining").unwrap(),
        "Welding"
    );
    ws.set_process(Path::new("file1.csv"), "Welding").unwrap();

    ws.remove_process("Welding", &AssumeYes).unwrap();
    assert_eq!(ws.processes().by_name("No Description").unwrap(), "");
    assert!(matches!(
        ws.processes().by_name("Welding"),
        Err(MdtagError::UnknownProcessName { .. })
    ));

    let ws = open(&corpus, &settings);
    assert_eq!(
        ws.process_name(Path::new("file1.csv")).unwrap(),
        "No Description"
    );
}

#[test]
fn test_declined_migration_touches_nothing() {
    let (corpus, settings) = create_test_env();
    let mut ws = open(&corpus, &settings);
    ws.set_value(Path::new("file2.csv"), "operator", "Bob").unwrap();
    let before = sidecar_text(&corpus, "metadata/file2-csv-metadata.txt");
    let schema_before = fs::read_to_string(settings.path().join("keywords.json")).unwrap();

    let result = ws.change_schema(&labels(&["process description", "notes"]), &Decline);
    assert!(matches!(result, Err(MdtagError::Cancelled)));

    assert_eq!(
        sidecar_text(&corpus, "metadata/file2-csv-metadata.txt"),
        before
    );
    assert_eq!(
        fs::read_to_string(settings.path().join("keywords.json")).unwrap(),
        schema_before
    );
}

#[test]
fn test_invalid_schema_rejected_before_prompt() {
    let (corpus, settings) = create_test_env();
    let mut ws = open(&corpus, &settings);

    // Decline would turn any prompt into Cancelled; validation must fail first.
    let result = ws.change_schema(&labels(&["", "  "]), &Decline);
    assert!(matches!(result, Err(MdtagError::EmptySchema)));

    let result = ws.rename_keyword(7, "site", &Decline);
    assert!(matches!(
        result,
        Err(MdtagError::KeywordIndexOutOfRange { .. })
    ));
}

#[test]
fn test_copy_metadata_to_new_file() {
    let (corpus, settings) = create_test_env();
    let mut ws = open(&corpus, &settings);
    ws.set_value(Path::new("file1.csv"), "operator", "Alice").unwrap();

    fs::write(corpus.path().join("late.csv"), b"4").unwrap();
    ws.copy_metadata(
        Path::new("file1.csv"),
        &[PathBuf::from("late.csv"), PathBuf::from("file2.csv")],
        None,
        &AssumeYes,
    )
    .unwrap();

    assert_eq!(ws.value(Path::new("late.csv"), "operator").unwrap(), "Alice");
    assert_eq!(ws.value(Path::new("file2.csv"), "operator").unwrap(), "Alice");
    assert!(corpus.path().join("metadata/late-csv-metadata.txt").exists());
}

#[test]
fn test_recover_schema_from_sample() {
    let sample = "path to data file: /data/x.csv\n\na:  1\nb:  2\n";
    assert_eq!(recover_schema(sample).unwrap(), labels(&["a", "b"]));
}

#[test]
fn test_recover_settings_from_corpus() {
    let (corpus, settings) = create_test_env();
    let mut ws = open(&corpus, &settings);
    ws.add_process("Welding", "metal joining", &AssumeYes).unwrap();
    ws.set_process(Path::new("file1.csv"), "Welding").unwrap();
    drop(ws);

    // Settings are lost; rebuild them from the sidecars.
    let fresh = TempDir::new().unwrap();
    let store = SettingsStore::new(fresh.path());
    assert!(!store.is_initialized());

    let sample = corpus.path().join("metadata/file1-csv-metadata.txt");
    let keywords = recover_schema_from_file(&sample).unwrap();
    assert!(matches!(
        adopt_schema(&store, &keywords, &Decline),
        Err(MdtagError::Cancelled)
    ));
    let schema = adopt_schema(&store, &keywords, &AssumeYes).unwrap();
    assert_eq!(schema.labels(), labels(&["process description", "operator"]));

    let registry = recover_process_registry(corpus.path()).unwrap();
    assert_eq!(registry.by_description("metal joining").unwrap(), "descr_1");
    adopt_process_registry(&store, &registry, &AssumeYes).unwrap();
    assert!(store.is_initialized());

    let ws = Workspace::open(corpus.path(), store).unwrap();
    assert_eq!(ws.process_name(Path::new("file1.csv")).unwrap(), "descr_1");
}

#[test]
fn test_detect_foreign_sidecars() {
    let (corpus, settings) = create_test_env();
    let _ws = open(&corpus, &settings);

    let foreign = corpus.path().join("metadata/other-csv-metadata.txt");
    fs::write(
        &foreign,
        "path to data file: /elsewhere/other.csv\n\nprocess description:  grinding\nshift:  night\n",
    )
    .unwrap();

    let store = SettingsStore::new(settings.path());
    let loaded = store.load().unwrap();
    let report = detect_foreign_schema(corpus.path(), &loaded.schema, &loaded.processes).unwrap();

    assert!(!report.is_clean());
    assert_eq!(report.unknown_keywords, labels(&["shift"]));
    assert_eq!(report.unknown_descriptions, labels(&["grinding"]));
    assert_eq!(report.files, vec![foreign]);
}

fn walk_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}
