//! User-confirmation and file-dialog seams.
//!
//! The session never talks to a real dialog; it goes through this
//! trait, which tests replace with canned answers.

use async_trait::async_trait;
use std::path::PathBuf;

/// Answer to a "save dirty document before closing?" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePrompt {
    /// Save first, then close.
    Yes,
    /// Discard changes and close.
    No,
    /// Abort the close entirely.
    Cancel,
}

/// Dialog collaborator consumed by the session layer.
///
/// Pure from the engine's perspective: each call is a question with an
/// answer, and a blank/absent answer means "user cancelled".
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Asks whether a dirty document should be saved before closing.
    async fn confirm_save(&self, display_name: &str) -> SavePrompt;

    /// Asks for a filename to save the document under. `None` means
    /// the user cancelled.
    async fn save_as_filename(&self, display_name: &str) -> Option<PathBuf>;

    /// Asks for a filename to open. `None` means the user cancelled.
    async fn open_filename(&self) -> Option<PathBuf>;
}

/// A prompter that never saves and never supplies a filename.
///
/// Useful for headless embedding where no dialogs exist.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardPrompter;

#[async_trait]
impl Prompter for DiscardPrompter {
    async fn confirm_save(&self, _display_name: &str) -> SavePrompt {
        SavePrompt::No
    }

    async fn save_as_filename(&self, _display_name: &str) -> Option<PathBuf> {
        None
    }

    async fn open_filename(&self) -> Option<PathBuf> {
        None
    }
}
