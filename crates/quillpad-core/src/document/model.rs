//! Document domain model.
//!
//! A [`TemplateDocument`] is the runtime editing unit: source text, an
//! optional filename, and the exclusively-owned model provider. Its
//! persistence form is [`StoredDocument`], which replaces the live
//! provider with its kind and serialized state so a session can rewire
//! it from the registry on load.

use crate::provider::ModelProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Identifier for one open document within a session.
///
/// The session's "current" selection holds one of these, never a second
/// owner of the document itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generates a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One editable template unit.
///
/// The document is exclusively owned by its pipeline controller; all
/// mutation routes through the controller so dirty tracking stays
/// consistent. The provider is held behind an `Arc` so an in-flight
/// run's snapshot of the document can outlive a concurrent edit or
/// swap without holding the document lock.
pub struct TemplateDocument {
    /// The editable template body.
    pub source: String,
    /// `None` means "unsaved, new".
    pub filename: Option<PathBuf>,
    /// The active model provider, if one is selected.
    pub provider: Option<Arc<dyn ModelProvider>>,
}

impl TemplateDocument {
    /// Creates an empty, unsaved document with no provider.
    pub fn new() -> Self {
        Self {
            source: String::new(),
            filename: None,
            provider: None,
        }
    }

    /// Creates an empty, unsaved document bound to the given provider.
    pub fn with_provider(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            source: String::new(),
            filename: None,
            provider: Some(provider),
        }
    }

    /// Human-readable name for title bars and prompts: the file name
    /// portion of the filename, or "New File" for unsaved documents.
    pub fn display_name(&self) -> String {
        self.filename
            .as_ref()
            .and_then(|f| f.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "New File".to_string())
    }

    /// Whether the document has a usable filename to save back to.
    pub fn can_save_to_current_file(&self) -> bool {
        self.filename
            .as_ref()
            .is_some_and(|f| !f.as_os_str().is_empty())
    }
}

impl Default for TemplateDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TemplateDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateDocument")
            .field("source", &self.source)
            .field("filename", &self.filename)
            .field(
                "provider",
                &self.provider.as_ref().map(|p| p.kind().to_string()),
            )
            .finish()
    }
}

/// The persistence form of a document.
///
/// Used by both the document store and the auto-saver. The live
/// provider is flattened into its kind plus serialized state; the
/// session recreates it from the registry when the document is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// The template body.
    pub source: String,
    /// Original location, retained so a recovery snapshot can reopen
    /// under its old name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<PathBuf>,
    /// Registered kind of the provider that was active at save time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_kind: Option<String>,
    /// Serialized provider state, restored via `ModelProvider::deserialize`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_state: Option<String>,
    /// Timestamp of the snapshot (RFC 3339).
    pub saved_at: String,
}

impl StoredDocument {
    /// Creates a stored form with the current timestamp and no
    /// provider information.
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            filename: None,
            provider_kind: None,
            model_state: None,
            saved_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
