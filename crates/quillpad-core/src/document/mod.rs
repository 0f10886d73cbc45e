//! Template documents: the runtime editing unit and its stored form.

pub mod model;
pub mod store;

pub use model::{DocumentId, StoredDocument, TemplateDocument};
pub use store::DocumentStore;
