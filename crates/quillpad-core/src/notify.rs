//! Status and error notifications.
//!
//! The engine emits a single-string status message on every significant
//! state change and a single-string error message on recoverable
//! failures. Delivery is fire-and-forget over a broadcast channel to
//! zero or more listeners.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// A user-facing notification emitted by the pipeline or session layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Progress/status line ("Parsing template...", "Success!", ...).
    Status { message: String },
    /// Recoverable-but-reportable failure (save errors and the like).
    Error { message: String },
}

/// Broadcast sender for notifications.
///
/// Cloned into every controller so status lines from background runs
/// reach the same listeners as session-level messages. Sending never
/// fails; with no subscribers the message is dropped.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribes a new listener. Slow listeners may observe lag, not
    /// block senders.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Emits a status message.
    pub fn status(&self, message: impl Into<String>) {
        let _ = self.tx.send(Notification::Status {
            message: message.into(),
        });
    }

    /// Emits an error message.
    pub fn error(&self, message: impl Into<String>) {
        let _ = self.tx.send(Notification::Error {
            message: message.into(),
        });
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
