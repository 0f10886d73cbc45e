//! Session-scoped cache of serialized provider state.

use std::collections::HashMap;
use std::sync::Mutex;

/// Remembers the last serialized state per provider kind.
///
/// Switching a document's provider from kind A to B and back to A
/// restores the state A held before the first switch. The cache is
/// created with the session, shared by every controller in it, and
/// dropped at session teardown; there is no process-global state.
#[derive(Debug, Default)]
pub struct ProviderStateCache {
    states: Mutex<HashMap<String, String>>,
}

impl ProviderStateCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the serialized state for a kind, replacing any prior entry.
    pub fn store(&self, kind: &str, state: String) {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states.insert(kind.to_string(), state);
    }

    /// Returns the last recorded state for a kind, if any.
    pub fn restore(&self, kind: &str) -> Option<String> {
        let states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states.get(kind).cloned()
    }

    /// Drops all recorded state.
    pub fn clear(&self) {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_restore() {
        let cache = ProviderStateCache::new();
        assert_eq!(cache.restore("json"), None);

        cache.store("json", "{\"a\":1}".to_string());
        assert_eq!(cache.restore("json"), Some("{\"a\":1}".to_string()));

        cache.store("json", "{\"a\":2}".to_string());
        assert_eq!(cache.restore("json"), Some("{\"a\":2}".to_string()));
    }

    #[test]
    fn test_clear() {
        let cache = ProviderStateCache::new();
        cache.store("text", "hello".to_string());
        cache.clear();
        assert_eq!(cache.restore("text"), None);
    }
}
