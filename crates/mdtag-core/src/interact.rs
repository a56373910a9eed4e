//! Collaborator interface for the user-facing front end.
//!
//! The core never talks to a terminal or a window. Anything that needs a
//! decision from the user goes through a [`Prompt`].

use std::path::PathBuf;

/// Questions the core asks the user.
pub trait Prompt {
    /// Ask a yes/no question. Destructive corpus-wide operations call this
    /// before touching anything.
    fn confirm(&self, question: &str) -> bool;

    /// Ask for the working directory. `None` means the user cancelled.
    fn select_working_directory(&self) -> Option<PathBuf>;
}

/// Prompt that agrees to everything and never picks a directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Prompt for AssumeYes {
    fn confirm(&self, question: &str) -> bool {
        tracing::debug!("Auto-confirming: {}", question);
        true
    }

    fn select_working_directory(&self) -> Option<PathBuf> {
        None
    }
}

/// Ask `prompt` and turn a refusal into `Cancelled`.
pub(crate) fn require_confirmation(prompt: &dyn Prompt, question: &str) -> crate::Result<()> {
    if prompt.confirm(question) {
        Ok(())
    } else {
        tracing::info!("Declined: {}", question);
        Err(crate::MdtagError::Cancelled)
    }
}
