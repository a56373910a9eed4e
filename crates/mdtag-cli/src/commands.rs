//! Subcommand handlers.

use crate::prompt::TerminalPrompt;
use crate::{Cli, Command, CopyArgs, ProcessCommand, RecoverCommand, SchemaCommand};
use anyhow::{bail, Context, Result};
use mdtag_core::recovery::{
    adopt_process_registry, adopt_schema, initialize_defaults, recover_process_registry,
    recover_schema_from_file,
};
use mdtag_core::{AssumeYes, MdtagError, Prompt, SettingsStore, Workspace};
use std::path::{Path, PathBuf};
use tracing::info;

/// Dispatch the parsed command line.
pub fn run(cli: &Cli, settings_dir: PathBuf) -> Result<()> {
    let prompt: Box<dyn Prompt> = if cli.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalPrompt)
    };
    let prompt = prompt.as_ref();
    let store = SettingsStore::new(settings_dir);

    match &cli.command {
        Command::Init => {
            initialize_defaults(&store, prompt).context("initializing settings")?;
            println!("Initialized {}", store.settings_dir().display());
        }
        Command::List => {
            let ws = open_workspace(cli, store, prompt)?;
            for file in ws.data_files() {
                println!("{}", file.display());
            }
        }
        Command::Show { file } => {
            let ws = open_workspace(cli, store, prompt)?;
            show_record(&ws, file)?;
        }
        Command::Set {
            file,
            keyword,
            value,
        } => {
            let mut ws = open_workspace(cli, store, prompt)?;
            ws.set_value(file, keyword, value)
                .with_context(|| format!("setting {:?} on {}", keyword, file.display()))?;
        }
        Command::SetProcess { file, name } => {
            let mut ws = open_workspace(cli, store, prompt)?;
            ws.set_process(file, name)
                .with_context(|| format!("setting process of {}", file.display()))?;
        }
        Command::Schema(command) => run_schema(cli, store, prompt, command)?,
        Command::Process(command) => run_process(cli, store, prompt, command)?,
        Command::Copy(args) => run_copy(cli, store, prompt, args)?,
        Command::Recover(command) => run_recover(cli, store, prompt, command)?,
        Command::Check => run_check(cli, store, prompt)?,
    }
    Ok(())
}

/// Root from `--root`, or asked for interactively.
fn resolve_root(cli: &Cli, prompt: &dyn Prompt) -> Result<PathBuf> {
    if let Some(root) = &cli.root {
        return Ok(root.clone());
    }
    if cli.yes {
        bail!("--root is required together with --yes");
    }
    Ok(prompt
        .select_working_directory()
        .ok_or(MdtagError::Cancelled)?)
}

fn open_workspace(cli: &Cli, store: SettingsStore, prompt: &dyn Prompt) -> Result<Workspace> {
    let root = resolve_root(cli, prompt)?;
    info!("Working directory: {}", root.display());
    Workspace::open(&root, store).with_context(|| {
        format!(
            "opening {} (run `mdtag init` or `mdtag recover` if settings are missing)",
            root.display()
        )
    })
}

fn show_record(ws: &Workspace, file: &Path) -> Result<()> {
    let record = ws.record(file)?;
    println!("{}", record.sidecar_path().display());
    match ws.process_name(file) {
        Ok(name) => println!("process: {}", name),
        Err(MdtagError::UnknownProcessDescription { .. }) => println!("process: (unknown)"),
        Err(e) => return Err(e.into()),
    }
    for (keyword, value) in record.entries() {
        println!("  {}: {}", keyword, value);
    }
    Ok(())
}

fn run_schema(
    cli: &Cli,
    store: SettingsStore,
    prompt: &dyn Prompt,
    command: &SchemaCommand,
) -> Result<()> {
    match command {
        SchemaCommand::Show => {
            let settings = store.load()?;
            for (index, label) in settings.schema.labels().iter().enumerate() {
                println!("{:>3}  {}", index, label);
            }
        }
        SchemaCommand::Set { labels } => {
            let mut ws = open_workspace(cli, store, prompt)?;
            let report = ws
                .change_schema(labels, prompt)
                .context("changing keyword schema")?;
            println!(
                "Rewrote {} sidecar files with keywords {:?}",
                report.records_rewritten,
                report.schema.labels()
            );
        }
        SchemaCommand::Rename { index, label } => {
            let mut ws = open_workspace(cli, store, prompt)?;
            let report = ws
                .rename_keyword(*index, label, prompt)
                .context("renaming keyword")?;
            println!("Rewrote {} sidecar files", report.records_rewritten);
        }
    }
    Ok(())
}

fn run_process(
    cli: &Cli,
    store: SettingsStore,
    prompt: &dyn Prompt,
    command: &ProcessCommand,
) -> Result<()> {
    match command {
        ProcessCommand::List => {
            let settings = store.load()?;
            for entry in settings.processes.entries() {
                println!("{}\t{}", entry.name, entry.description);
            }
        }
        ProcessCommand::Add { name, description } => {
            let mut ws = open_workspace(cli, store, prompt)?;
            let rewritten = ws
                .add_process(name, description, prompt)
                .with_context(|| format!("adding process {:?}", name))?;
            println!("Added {:?}; {} records cleared", name, rewritten);
        }
        ProcessCommand::Rename {
            old_name,
            new_name,
            description,
        } => {
            let mut ws = open_workspace(cli, store, prompt)?;
            let rewritten = ws
                .rename_process(old_name, new_name, description.as_deref(), prompt)
                .with_context(|| format!("renaming process {:?}", old_name))?;
            println!("Renamed {:?}; {} records rewritten", old_name, rewritten);
        }
        ProcessCommand::Remove { name } => {
            let mut ws = open_workspace(cli, store, prompt)?;
            let rewritten = ws
                .remove_process(name, prompt)
                .with_context(|| format!("removing process {:?}", name))?;
            println!("Removed {:?}; {} records cleared", name, rewritten);
        }
    }
    Ok(())
}

fn run_copy(cli: &Cli, store: SettingsStore, prompt: &dyn Prompt, args: &CopyArgs) -> Result<()> {
    let mut ws = open_workspace(cli, store, prompt)?;
    let keywords = (!args.keywords.is_empty()).then_some(args.keywords.as_slice());
    let written = ws
        .copy_metadata(&args.source, &args.targets, keywords, prompt)
        .with_context(|| format!("copying metadata from {}", args.source.display()))?;
    println!("Updated {} files", written);
    Ok(())
}

fn run_recover(
    cli: &Cli,
    store: SettingsStore,
    prompt: &dyn Prompt,
    command: &RecoverCommand,
) -> Result<()> {
    match command {
        RecoverCommand::Schema { sidecar } => {
            let keywords = recover_schema_from_file(sidecar)
                .with_context(|| format!("reading keywords from {}", sidecar.display()))?;
            let schema = adopt_schema(&store, &keywords, prompt)?;
            println!("Saved keywords {:?}", schema.labels());
        }
        RecoverCommand::Processes => {
            let root = resolve_root(cli, prompt)?;
            let registry = recover_process_registry(&root)
                .with_context(|| format!("scanning {}", root.display()))?;
            adopt_process_registry(&store, &registry, prompt)?;
            println!(
                "Saved {} process descriptions; rename the placeholders with `mdtag process rename`",
                registry.len().saturating_sub(1)
            );
        }
    }
    Ok(())
}

fn run_check(cli: &Cli, store: SettingsStore, prompt: &dyn Prompt) -> Result<()> {
    let ws = open_workspace(cli, store, prompt)?;
    let report = ws.check_foreign()?;

    if report.is_clean() {
        println!("All sidecars match the current settings");
    } else {
        if !report.unknown_keywords.is_empty() {
            println!("Unknown keywords: {:?}", report.unknown_keywords);
        }
        if !report.unknown_descriptions.is_empty() {
            println!("Unknown process descriptions: {:?}", report.unknown_descriptions);
        }
        for file in &report.files {
            println!("  {}", file.display());
        }
    }
    for file in &report.unreadable {
        println!("Unreadable: {}", file.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn run_args(args: &[&str], settings: &Path) -> Result<()> {
        let cli = Cli::try_parse_from(args.iter().copied())?;
        run(&cli, settings.to_path_buf())
    }

    #[test]
    fn test_init_then_edit_corpus() {
        let corpus = TempDir::new().unwrap();
        let settings = TempDir::new().unwrap();
        fs::write(corpus.path().join("a.csv"), b"1").unwrap();
        let root = corpus.path().to_str().unwrap();

        run_args(&["mdtag", "init", "--yes"], settings.path()).unwrap();
        run_args(
            &["mdtag", "schema", "set", "process description", "operator", "--yes", "--root", root],
            settings.path(),
        )
        .unwrap();
        run_args(
            &["mdtag", "set", "a.csv", "operator", "Bob", "--root", root],
            settings.path(),
        )
        .unwrap();

        let text = fs::read_to_string(corpus.path().join("metadata/a-csv-metadata.txt")).unwrap();
        assert!(text.contains("operator:  Bob"));
    }

    #[test]
    fn test_open_without_settings_reports_missing() {
        let corpus = TempDir::new().unwrap();
        let settings = TempDir::new().unwrap();
        let root = corpus.path().to_str().unwrap();

        let err = run_args(&["mdtag", "list", "--root", root], settings.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MdtagError>(),
            Some(MdtagError::SettingsMissing { .. })
        ));
    }

    #[test]
    fn test_process_add_over_taken_description_clears_orphans() {
        let corpus = TempDir::new().unwrap();
        let settings = TempDir::new().unwrap();
        fs::write(corpus.path().join("a.csv"), b"1").unwrap();
        let root = corpus.path().to_str().unwrap();

        run_args(&["mdtag", "init", "--yes"], settings.path()).unwrap();
        run_args(
            &["mdtag", "process", "add", "Weld", "metal joining", "--root", root],
            settings.path(),
        )
        .unwrap();
        run_args(
            &["mdtag", "set-process", "a.csv", "Weld", "--root", root],
            settings.path(),
        )
        .unwrap();
        run_args(
            &["mdtag", "process", "add", "Weld", "gluing", "--yes", "--root", root],
            settings.path(),
        )
        .unwrap();

        let store = SettingsStore::new(settings.path());
        let ws = Workspace::open(corpus.path(), store).unwrap();
        assert_eq!(ws.processes().by_name("Weld").unwrap(), "gluing");
        assert_eq!(ws.process_name(Path::new("a.csv")).unwrap(), "No Description");

        let err = run_args(
            &["mdtag", "process", "add", "Blank", "", "--yes", "--root", root],
            settings.path(),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MdtagError>(),
            Some(MdtagError::ReservedProcess { .. })
        ));
    }

    #[test]
    fn test_yes_requires_root() {
        let settings = TempDir::new().unwrap();
        let err = run_args(&["mdtag", "list", "--yes"], settings.path()).unwrap_err();
        assert!(err.to_string().contains("--root"));
    }
}
