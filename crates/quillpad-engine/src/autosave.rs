//! Single-slot file auto-saver.

use async_trait::async_trait;
use quillpad_core::autosave::AutoSaver;
use quillpad_core::document::StoredDocument;
use quillpad_core::error::{QuillError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Keeps one recovery snapshot in a TOML file. Each save overwrites
/// the previous snapshot; an explicit document save clears it.
pub struct FileAutoSaver {
    path: PathBuf,
}

impl FileAutoSaver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The per-user default snapshot location.
    pub fn default_location() -> Result<PathBuf> {
        let base = dirs::data_dir()
            .ok_or_else(|| QuillError::internal("No user data directory available"))?;
        Ok(base.join("quillpad").join("autosave.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AutoSaver for FileAutoSaver {
    async fn save(&self, document: &StoredDocument) -> Result<()> {
        let text = toml::to_string_pretty(document)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&self.path, text).await?;
        tracing::debug!(path = %self.path.display(), "Wrote recovery snapshot");
        Ok(())
    }

    async fn load(&self) -> Result<Option<StoredDocument>> {
        let text = match fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let stored: StoredDocument = toml::from_str(&text)?;
        Ok(Some(stored))
    }

    async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
