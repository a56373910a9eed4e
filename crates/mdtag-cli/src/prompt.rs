//! Terminal implementation of the core's `Prompt` trait.

use mdtag_core::Prompt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::warn;

/// Asks questions on stderr and reads answers from stdin.
pub struct TerminalPrompt;

impl TerminalPrompt {
    fn ask(&self, question: &str) -> Option<String> {
        let mut stderr = io::stderr();
        if let Err(e) = write!(stderr, "{} ", question).and_then(|_| stderr.flush()) {
            warn!("Failed to write prompt: {}", e);
        }

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                warn!("Failed to read answer: {}", e);
                None
            }
        }
    }
}

impl Prompt for TerminalPrompt {
    fn confirm(&self, question: &str) -> bool {
        matches!(
            self.ask(&format!("{} [y/N]", question))
                .map(|a| a.to_ascii_lowercase())
                .as_deref(),
            Some("y") | Some("yes")
        )
    }

    fn select_working_directory(&self) -> Option<PathBuf> {
        let current = std::env::current_dir().ok();
        let hint = current
            .as_ref()
            .map(|p| format!(" [{}]", p.display()))
            .unwrap_or_default();

        match self.ask(&format!("Working directory{}:", hint))? {
            answer if answer.is_empty() => current,
            answer => Some(PathBuf::from(answer)),
        }
    }
}
