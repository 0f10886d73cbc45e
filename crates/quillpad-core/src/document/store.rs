//! Document store trait.
//!
//! Defines the interface for loading and saving documents, decoupling
//! the session layer from the on-disk format.

use super::model::StoredDocument;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// An abstract store for document persistence.
///
/// Implementations own the on-disk format. The session layer only ever
/// sees [`StoredDocument`] values.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Loads a document from the given path.
    ///
    /// # Returns
    ///
    /// - `Ok(StoredDocument)`: Document loaded
    /// - `Err(QuillError::NotFound)`: No document at the path
    /// - `Err(QuillError::Serialization)`: The file exists but could not be parsed
    async fn load(&self, path: &Path) -> Result<StoredDocument>;

    /// Saves a document to the given path, overwriting any existing file.
    async fn save(&self, document: &StoredDocument, path: &Path) -> Result<()>;
}
