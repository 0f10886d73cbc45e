//! Run state machine.

/// State of a document's compile/execute cycle.
///
/// `Idle → Parsing → (ParseFailed | Parsed) → Executing →
/// (ExecuteFailed | Executed)`, looping back to `Parsing` on the next
/// trigger. Both failure states are normal terminal outcomes of a run,
/// not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// No run has happened yet.
    #[default]
    Idle,
    /// Code generation in progress.
    Parsing,
    /// Generation produced diagnostics; execution skipped this cycle.
    ParseFailed,
    /// Generation succeeded.
    Parsed,
    /// Backend execution in progress.
    Executing,
    /// Execution raised; the failure is the run's output.
    ExecuteFailed,
    /// Execution completed with output.
    Executed,
}

impl RunState {
    /// Whether a run has reached a terminal state for its cycle.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunState::ParseFailed | RunState::ExecuteFailed | RunState::Executed
        )
    }
}
