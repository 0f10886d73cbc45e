//! minijinja compiler backend.

use async_trait::async_trait;
use minijinja::machinery::{self, WhitespaceConfig};
use minijinja::syntax::SyntaxConfig;
use minijinja::Environment;
use quillpad_core::compiler::{Diagnostic, GeneratorResults, TemplateCompiler};
use quillpad_core::document::TemplateDocument;
use quillpad_core::error::{QuillError, Result};

/// Template backend built on minijinja.
///
/// Generation parses the source and publishes the instruction listing;
/// execution renders the source against the document provider's model.
/// The two steps are independent compilations of the same source, so a
/// source that parses can still fail at execution (undefined access in
/// strict blocks, runtime filter errors) and that failure is reported
/// as an execution error, not a diagnostic.
pub struct JinjaCompiler;

impl JinjaCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JinjaCompiler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemplateCompiler for JinjaCompiler {
    async fn generate(&self, document: &TemplateDocument) -> GeneratorResults {
        match machinery::parse(
            &document.source,
            "template",
            SyntaxConfig::default(),
            WhitespaceConfig::default(),
        ) {
            Ok(stmt) => GeneratorResults::ok(format!("{stmt:#?}")),
            Err(err) => {
                tracing::debug!(error = %err, "Template parse failed");
                GeneratorResults::failed(vec![Diagnostic::new(
                    err.line().unwrap_or(0),
                    err.to_string(),
                )])
            }
        }
    }

    async fn execute(&self, document: &TemplateDocument) -> Result<String> {
        let model = match &document.provider {
            Some(provider) => provider.model()?,
            None => serde_json::json!({}),
        };

        let env = Environment::new();
        env.render_str(&document.source, model)
            .map_err(|err| QuillError::execution(format!("{err:#}")))
    }
}
