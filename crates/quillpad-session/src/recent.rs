//! Recently used filenames.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Ordered set of recently used paths, most recent first,
/// de-duplicated case-insensitively.
#[derive(Debug, Default)]
pub struct RecentFiles {
    paths: Mutex<Vec<PathBuf>>,
}

fn fold_case(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

impl RecentFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a use of `path`, moving it to the front. A path that
    /// differs only in case replaces the existing entry.
    pub fn record(&self, path: &Path) {
        if path.as_os_str().is_empty() {
            return;
        }
        let folded = fold_case(path);
        let mut paths = self.paths.lock().unwrap_or_else(|e| e.into_inner());
        paths.retain(|existing| fold_case(existing) != folded);
        paths.insert(0, path.to_path_buf());
    }

    /// Snapshot, most recent first.
    pub fn list(&self) -> Vec<PathBuf> {
        let paths = self.paths.lock().unwrap_or_else(|e| e.into_inner());
        paths.clone()
    }

    pub fn is_empty(&self) -> bool {
        let paths = self.paths.lock().unwrap_or_else(|e| e.into_inner());
        paths.is_empty()
    }
}
