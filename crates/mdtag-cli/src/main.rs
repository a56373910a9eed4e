//! mdtag - command-line front end for keyword metadata sidecars.
//!
//! This binary wraps the mdtag-core library. Every corpus-wide change asks
//! for confirmation on the terminal unless `--yes` is given.

mod commands;
mod prompt;

use clap::{Args, Parser, Subcommand};
use mdtag_core::config::AppConfig;
use mdtag_core::MdtagError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "mdtag")]
#[command(about = "Keyword metadata sidecars for data files", version)]
struct Cli {
    /// Working directory holding the data files (asked for when omitted)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Directory holding keywords.json and processes.json
    #[arg(long, global = true)]
    settings_dir: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    yes: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the default schema and an empty process directory
    Init,
    /// List data files relative to the root
    List,
    /// Print the sidecar values of one data file
    Show { file: PathBuf },
    /// Set one keyword value
    Set {
        file: PathBuf,
        keyword: String,
        value: String,
    },
    /// Set the process of a data file by process name
    SetProcess { file: PathBuf, name: String },
    /// Inspect or change the keyword schema
    #[command(subcommand)]
    Schema(SchemaCommand),
    /// Inspect or change the process directory
    #[command(subcommand)]
    Process(ProcessCommand),
    /// Copy values from one data file to others
    Copy(CopyArgs),
    /// Rebuild lost settings from existing sidecars
    #[command(subcommand)]
    Recover(RecoverCommand),
    /// Report sidecars written under different settings
    Check,
}

#[derive(Subcommand, Debug)]
enum SchemaCommand {
    /// Print the keywords in order
    Show,
    /// Replace the keyword list; the first entry stays the process keyword
    Set {
        #[arg(required = true)]
        labels: Vec<String>,
    },
    /// Rename the keyword at a position, keeping its values
    Rename { index: usize, label: String },
}

#[derive(Subcommand, Debug)]
enum ProcessCommand {
    /// Print every process name and description
    List,
    /// Add a process
    Add { name: String, description: String },
    /// Rename a process, optionally changing its description
    Rename {
        old_name: String,
        new_name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remove a process and clear it from every sidecar
    Remove { name: String },
}

#[derive(Args, Debug)]
struct CopyArgs {
    source: PathBuf,
    #[arg(required = true)]
    targets: Vec<PathBuf>,
    /// Only copy these keywords (repeatable)
    #[arg(short, long = "keyword")]
    keywords: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum RecoverCommand {
    /// Propose a schema from the keywords of one sidecar file
    Schema { sidecar: PathBuf },
    /// Propose a process directory from the descriptions used in the corpus
    Processes,
}

fn default_settings_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(AppConfig::SETTINGS_DIR_NAME)
}

/// Exit code for an error, taken from the first library error in the chain.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<MdtagError>())
        .map(MdtagError::exit_code)
        .and_then(|code| u8::try_from(code).ok())
        .unwrap_or(1)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let settings_dir = cli.settings_dir.clone().unwrap_or_else(default_settings_dir);
    debug!("Settings directory: {}", settings_dir.display());

    match commands::run(&cli, settings_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_code_for(&err))
        }
    }
}
