//! Multi-document session coordination.
//!
//! A [`SessionManager`] owns the collection of open documents and their
//! pipeline controllers, tracks which one is current, runs the
//! open/save/close workflows against the store and dialog
//! collaborators, and coordinates best-effort auto-save on every
//! completed run.

pub mod manager;
pub mod recent;

pub use manager::{SaveIntent, SessionManager};
pub use recent::RecentFiles;
