//! Built-in model providers.

use quillpad_core::error::{QuillError, Result};
use quillpad_core::provider::{ChangeListener, ModelChanged, ModelProvider, ProviderRegistry};
use std::any::Any;
use std::sync::{Arc, Mutex};

fn lock<'a, T>(mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Model provider backed by a free-form JSON object.
///
/// The whole document model is one `serde_json::Value`; editing front
/// ends downcast to this type and mutate fields through [`set_field`]
/// or replace the value wholesale through [`set_model`], both of which
/// raise the change signal.
///
/// [`set_field`]: JsonModelProvider::set_field
/// [`set_model`]: JsonModelProvider::set_model
pub struct JsonModelProvider {
    value: Mutex<serde_json::Value>,
    listener: Mutex<Option<ChangeListener>>,
}

impl JsonModelProvider {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(serde_json::json!({})),
            listener: Mutex::new(None),
        }
    }

    /// Replaces the whole model value and signals the change.
    pub fn set_model(&self, value: serde_json::Value) {
        *lock(&self.value) = value;
        self.signal();
    }

    /// Sets one top-level field and signals the change. A non-object
    /// model is first replaced with an empty object.
    pub fn set_field(&self, key: impl Into<String>, value: serde_json::Value) {
        {
            let mut model = lock(&self.value);
            if !model.is_object() {
                *model = serde_json::json!({});
            }
            if let Some(fields) = model.as_object_mut() {
                fields.insert(key.into(), value);
            }
        }
        self.signal();
    }

    fn signal(&self) {
        if let Some(listener) = lock(&self.listener).as_ref() {
            // A closed receiver just means no controller is attached.
            let _ = listener.send(ModelChanged);
        }
    }
}

impl Default for JsonModelProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelProvider for JsonModelProvider {
    fn kind(&self) -> &str {
        "json"
    }

    fn model(&self) -> Result<serde_json::Value> {
        Ok(lock(&self.value).clone())
    }

    fn serialize(&self) -> String {
        lock(&self.value).to_string()
    }

    fn deserialize(&self, text: &str) -> Result<()> {
        let parsed: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| QuillError::invalid_provider_state(e.to_string()))?;
        *lock(&self.value) = parsed;
        Ok(())
    }

    fn attach_listener(&self, listener: ChangeListener) {
        *lock(&self.listener) = Some(listener);
    }

    fn detach_listener(&self) {
        *lock(&self.listener) = None;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Model provider backed by a plain text body, exposed to templates as
/// the single binding `text`. Any text deserializes, so stored state
/// for this kind can never be invalid.
pub struct TextModelProvider {
    text: Mutex<String>,
    listener: Mutex<Option<ChangeListener>>,
}

impl TextModelProvider {
    pub fn new() -> Self {
        Self {
            text: Mutex::new(String::new()),
            listener: Mutex::new(None),
        }
    }

    pub fn set_text(&self, text: impl Into<String>) {
        *lock(&self.text) = text.into();
        if let Some(listener) = lock(&self.listener).as_ref() {
            let _ = listener.send(ModelChanged);
        }
    }

    pub fn text(&self) -> String {
        lock(&self.text).clone()
    }
}

impl Default for TextModelProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelProvider for TextModelProvider {
    fn kind(&self) -> &str {
        "text"
    }

    fn model(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({ "text": *lock(&self.text) }))
    }

    fn serialize(&self) -> String {
        self.text()
    }

    fn deserialize(&self, text: &str) -> Result<()> {
        *lock(&self.text) = text.to_string();
        Ok(())
    }

    fn attach_listener(&self, listener: ChangeListener) {
        *lock(&self.listener) = Some(listener);
    }

    fn detach_listener(&self) {
        *lock(&self.listener) = None;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Registry of the built-in provider kinds, with `json` as the default.
pub fn builtin_registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register("json", || Arc::new(JsonModelProvider::new()));
    registry.register("text", || Arc::new(TextModelProvider::new()));
    registry
}
