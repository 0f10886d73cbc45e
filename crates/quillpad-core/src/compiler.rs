//! Compiler backend contract.
//!
//! The template language itself is a black box to the pipeline: a
//! backend exposes "generate code from source" and "run against the
//! document's model" and nothing else. Parse failures are data
//! (diagnostics), not errors; only execution raises.

use crate::document::TemplateDocument;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One generation-time problem, positioned by source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based source line the problem was reported at; 0 when the
    /// backend could not attribute a line.
    pub line: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Outcome of the code-generation step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorResults {
    /// Generated code listing; empty on failure.
    pub code: String,
    /// Problems found during generation; empty on success.
    pub diagnostics: Vec<Diagnostic>,
    pub success: bool,
}

impl GeneratorResults {
    /// Successful generation with the given code listing.
    pub fn ok(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            diagnostics: Vec::new(),
            success: true,
        }
    }

    /// Failed generation carrying at least one diagnostic.
    pub fn failed(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            code: String::new(),
            diagnostics,
            success: false,
        }
    }
}

/// Renders diagnostics one per line as `Line <n>: <message>`.
///
/// This is the human-readable form shown as the run's output when
/// generation fails.
pub fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("Line {}: {}", d.line, d.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The pluggable compiler backend.
///
/// `generate` never raises; problems come back as diagnostics.
/// `execute` assumes a successful prior generation and may raise a
/// runtime failure, which the pipeline captures at its boundary.
#[async_trait]
pub trait TemplateCompiler: Send + Sync {
    /// Generates executable code for the document's current source.
    async fn generate(&self, document: &TemplateDocument) -> GeneratorResults;

    /// Runs the document against its model and returns the textual output.
    async fn execute(&self, document: &TemplateDocument) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_diagnostics_one_per_line() {
        let rendered = render_diagnostics(&[
            Diagnostic::new(1, "unexpected token"),
            Diagnostic::new(4, "unclosed block"),
        ]);
        assert_eq!(rendered, "Line 1: unexpected token\nLine 4: unclosed block");
    }

    #[test]
    fn test_render_diagnostics_empty() {
        assert_eq!(render_diagnostics(&[]), "");
    }

    #[test]
    fn test_generator_results_constructors() {
        let ok = GeneratorResults::ok("code");
        assert!(ok.success);
        assert!(ok.diagnostics.is_empty());

        let failed = GeneratorResults::failed(vec![Diagnostic::new(2, "oops")]);
        assert!(!failed.success);
        assert_eq!(failed.diagnostics.len(), 1);
    }
}
