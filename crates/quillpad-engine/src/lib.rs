//! Concrete engine collaborators: the minijinja compiler backend, the
//! built-in model providers, the TOML document store, and the
//! file-based auto-saver.
//!
//! Everything here implements a trait from `quillpad-core`; the
//! pipeline and session layers never name these types directly.

pub mod autosave;
pub mod jinja;
pub mod providers;
pub mod store;

pub use autosave::FileAutoSaver;
pub use jinja::JinjaCompiler;
pub use providers::{builtin_registry, JsonModelProvider, TextModelProvider};
pub use store::TomlDocumentStore;
