//! Per-document message log.

use std::sync::Mutex;

/// Append-only log of timestamped lines for one document.
///
/// Every run appends here, so the log is a faithful audit trail of
/// everything the pipeline did. It grows until an explicit
/// [`flush`](MessageLog::flush); appends from a background run and
/// reads from the UI layer may interleave freely.
#[derive(Debug, Default)]
pub struct MessageLog {
    lines: Mutex<Vec<String>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one timestamped line. Multi-line messages keep their
    /// internal newlines and share a single timestamp.
    pub fn append(&self, message: &str) {
        let stamped = format!("[{}]  {}", chrono::Local::now().format("%H:%M:%S"), message);
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.push(stamped);
    }

    /// Returns a snapshot of all lines in append order.
    pub fn lines(&self) -> Vec<String> {
        let lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.clone()
    }

    pub fn len(&self) -> usize {
        let lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discards all lines.
    pub fn flush(&self) {
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.clear();
    }
}
