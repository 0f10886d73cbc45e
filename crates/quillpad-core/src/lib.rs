//! Core domain types and collaborator traits for Quillpad.
//!
//! This crate defines the vocabulary shared by the pipeline and session
//! layers: documents, diagnostics, the compiler backend contract, the
//! model-provider abstraction, and the persistence / dialog seams. It
//! contains no I/O of its own; concrete collaborators live in
//! `quillpad-engine`.

pub mod autosave;
pub mod compiler;
pub mod document;
pub mod error;
pub mod notify;
pub mod prompt;
pub mod provider;

pub use error::{QuillError, Result};
