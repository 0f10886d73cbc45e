//! Auto-saver trait: one best-effort recovery snapshot.

use crate::document::StoredDocument;
use crate::error::Result;
use async_trait::async_trait;

/// Periodic/triggered persistence of a single recovery snapshot.
///
/// One slot: each `save` overwrites the previous snapshot, `clear`
/// empties it after an explicit user save. Auto-save is best-effort
/// and silent; callers log failures and move on.
#[async_trait]
pub trait AutoSaver: Send + Sync {
    /// Overwrites the recovery slot with a snapshot of the document.
    async fn save(&self, document: &StoredDocument) -> Result<()>;

    /// Returns the recovered document, if a snapshot exists.
    async fn load(&self) -> Result<Option<StoredDocument>>;

    /// Empties the recovery slot.
    async fn clear(&self) -> Result<()>;
}
