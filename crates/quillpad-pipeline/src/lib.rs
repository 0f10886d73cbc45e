//! Per-document template pipeline.
//!
//! A [`PipelineController`] owns one document and drives its
//! compile→generate→execute cycle on background tasks: source edits,
//! provider swaps, model-change signals, and explicit run requests each
//! trigger a fresh run, and a generation counter makes sure a
//! superseded run can never publish stale output.

pub mod controller;
pub mod log;
pub mod state;

pub use controller::PipelineController;
pub use log::MessageLog;
pub use state::RunState;
