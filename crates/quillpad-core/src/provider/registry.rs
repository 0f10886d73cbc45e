//! Provider registry: kind name → factory.

use super::ModelProvider;
use crate::error::{QuillError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

type ProviderFactory = Box<dyn Fn() -> Arc<dyn ModelProvider> + Send + Sync>;

/// Registry of model-provider kinds.
///
/// Kinds list in a stable (lexicographic) order. The first registered
/// kind becomes the default unless overridden with [`set_default`].
///
/// [`set_default`]: ProviderRegistry::set_default
pub struct ProviderRegistry {
    factories: BTreeMap<String, ProviderFactory>,
    default_kind: Option<String>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
            default_kind: None,
        }
    }

    /// Registers a factory under the given kind name, replacing any
    /// previous registration for the same kind.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        factory: impl Fn() -> Arc<dyn ModelProvider> + Send + Sync + 'static,
    ) {
        let kind = kind.into();
        if self.default_kind.is_none() {
            self.default_kind = Some(kind.clone());
        }
        self.factories.insert(kind, Box::new(factory));
    }

    /// Marks an already-registered kind as the default.
    ///
    /// # Errors
    ///
    /// Returns `UnknownProviderKind` if the kind is not registered.
    pub fn set_default(&mut self, kind: &str) -> Result<()> {
        if !self.factories.contains_key(kind) {
            return Err(QuillError::UnknownProviderKind(kind.to_string()));
        }
        self.default_kind = Some(kind.to_string());
        Ok(())
    }

    /// Lists the registered kind names in stable order.
    pub fn list_kinds(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// The default kind, if any kind has been registered.
    pub fn default_kind(&self) -> Option<&str> {
        self.default_kind.as_deref()
    }

    /// Creates a fresh provider of the given kind.
    ///
    /// # Errors
    ///
    /// Returns `UnknownProviderKind` if the name is not registered.
    pub fn create(&self, kind: &str) -> Result<Arc<dyn ModelProvider>> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| QuillError::UnknownProviderKind(kind.to_string()))?;
        Ok(factory())
    }

    /// Creates a fresh provider of the default kind.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the registry is empty.
    pub fn create_default(&self) -> Result<Arc<dyn ModelProvider>> {
        let kind = self
            .default_kind
            .as_deref()
            .ok_or_else(|| QuillError::internal("No model providers registered"))?;
        self.create(kind)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChangeListener, ModelProvider};
    use std::any::Any;

    struct StubProvider(&'static str);

    impl ModelProvider for StubProvider {
        fn kind(&self) -> &str {
            self.0
        }

        fn model(&self) -> Result<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }

        fn serialize(&self) -> String {
            String::new()
        }

        fn deserialize(&self, _text: &str) -> Result<()> {
            Ok(())
        }

        fn attach_listener(&self, _listener: ChangeListener) {}

        fn detach_listener(&self) {}

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register("json", || Arc::new(StubProvider("json")));
        registry.register("text", || Arc::new(StubProvider("text")));
        registry
    }

    #[test]
    fn test_first_registered_kind_is_default() {
        let registry = registry();
        assert_eq!(registry.default_kind(), Some("json"));
        assert_eq!(registry.create_default().unwrap().kind(), "json");
    }

    #[test]
    fn test_list_kinds_is_ordered() {
        assert_eq!(registry().list_kinds(), vec!["json", "text"]);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let Err(err) = registry().create("xml") else {
            panic!("expected error for unknown kind");
        };
        assert!(matches!(err, QuillError::UnknownProviderKind(kind) if kind == "xml"));
    }

    #[test]
    fn test_set_default() {
        let mut registry = registry();
        registry.set_default("text").unwrap();
        assert_eq!(registry.create_default().unwrap().kind(), "text");
        assert!(registry.set_default("xml").is_err());
    }
}
