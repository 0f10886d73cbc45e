//! TOML-on-disk document store.

use async_trait::async_trait;
use quillpad_core::document::{DocumentStore, StoredDocument};
use quillpad_core::error::{QuillError, Result};
use std::path::Path;
use tokio::fs;

/// Stores documents as TOML files at the path the caller names.
pub struct TomlDocumentStore;

impl TomlDocumentStore {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TomlDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for TomlDocumentStore {
    async fn load(&self, path: &Path) -> Result<StoredDocument> {
        let text = match fs::read_to_string(path).await {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(QuillError::not_found(
                    "document",
                    path.display().to_string(),
                ));
            }
            Err(err) => return Err(err.into()),
        };

        let stored: StoredDocument = toml::from_str(&text)?;
        tracing::debug!(path = %path.display(), "Loaded document");
        Ok(stored)
    }

    async fn save(&self, document: &StoredDocument, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(document)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(path, text).await?;

        tracing::debug!(path = %path.display(), "Saved document");
        Ok(())
    }
}
