//! Model providers: pluggable sources of the data bound into a
//! template at execution time.
//!
//! A provider can produce a model value, round-trip its state through
//! text, and signal "something changed" to exactly one subscriber at a
//! time. Change delivery is explicit message passing over a channel
//! rather than a dynamic observer list: attaching a listener implicitly
//! detaches the previous one, so a model edit can never be delivered
//! twice.

pub mod cache;
pub mod registry;

pub use cache::ProviderStateCache;
pub use registry::ProviderRegistry;

use crate::error::Result;
use std::any::Any;
use tokio::sync::mpsc;

/// Payload-free change signal emitted by a provider when its model
/// mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelChanged;

/// The sending half a provider delivers change signals into. Owned by
/// the subscribing pipeline controller.
pub type ChangeListener = mpsc::UnboundedSender<ModelChanged>;

/// A pluggable source of template model data.
///
/// Exactly one provider is active per document at a time; the owning
/// controller attaches its listener on swap-in and the old provider's
/// listener is detached on swap-out.
pub trait ModelProvider: Send + Sync {
    /// The registered kind name of this provider.
    fn kind(&self) -> &str;

    /// Produces the model value handed to the compiler backend.
    fn model(&self) -> Result<serde_json::Value>;

    /// Serializes the provider's current state to text.
    fn serialize(&self) -> String;

    /// Restores state from previously serialized text.
    ///
    /// # Errors
    ///
    /// Returns `QuillError::InvalidProviderState` on malformed input,
    /// leaving the provider in its prior valid state.
    fn deserialize(&self, text: &str) -> Result<()>;

    /// Attaches the single change-signal subscriber, replacing any
    /// previous one.
    fn attach_listener(&self, listener: ChangeListener);

    /// Detaches the current subscriber, if any.
    fn detach_listener(&self);

    /// Downcasting hook for model-editing front ends that need the
    /// concrete provider type.
    fn as_any(&self) -> &dyn Any;
}
