//! Pipeline controller: the compile/execute state machine for one
//! document.

use crate::log::MessageLog;
use crate::state::RunState;
use once_cell::sync::Lazy;
use quillpad_core::compiler::{render_diagnostics, Diagnostic, GeneratorResults, TemplateCompiler};
use quillpad_core::document::{DocumentId, StoredDocument, TemplateDocument};
use quillpad_core::notify::Notifier;
use quillpad_core::provider::{ModelChanged, ModelProvider, ProviderStateCache};
use regex::Regex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// Comment lines are stripped from the generated-code listing for
/// display only; the stripped form is never fed back into execution.
/// Anchored to whole lines so a `//` or `#` inside a string (URLs,
/// color codes) is left alone.
static LINE_COMMENTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(//|#).*$").expect("valid comment pattern"));

fn strip_comment_lines(code: &str) -> String {
    LINE_COMMENTS.replace_all(code, "").trim().to_string()
}

struct Inner {
    id: DocumentId,
    document: RwLock<TemplateDocument>,
    compiler: Arc<dyn TemplateCompiler>,
    state_cache: Arc<ProviderStateCache>,
    run_state: RwLock<RunState>,
    generated_code: RwLock<String>,
    diagnostics: RwLock<Vec<Diagnostic>>,
    executed_output: RwLock<String>,
    dirty: AtomicBool,
    log: MessageLog,
    /// Monotonic run generation. A run commits its results only while
    /// its generation is still the latest, so overlapping runs cannot
    /// publish stale output and a run finishing after its document was
    /// closed writes nothing.
    generation: AtomicU64,
    notifier: Notifier,
    run_completed: mpsc::UnboundedSender<DocumentId>,
    change_signals: mpsc::UnboundedSender<ModelChanged>,
}

/// Drives the compile→execute cycle for one document.
///
/// Created together with its document and destroyed when the document
/// is closed; it holds no state that outlives the document. Cloning is
/// cheap and shares the same document.
///
/// Runs happen off the interaction path: every trigger (source edit,
/// provider swap, model-change signal, explicit request) starts a
/// fresh background run at a new generation. Must be created on a
/// Tokio runtime.
#[derive(Clone)]
pub struct PipelineController {
    inner: Arc<Inner>,
}

impl PipelineController {
    /// Wraps a document in a new controller.
    ///
    /// Attaches this controller as the single change-signal subscriber
    /// of the document's provider, if one is present. Completed runs
    /// report the document id on `run_completed` (the session layer's
    /// auto-save trigger).
    pub fn new(
        document: TemplateDocument,
        compiler: Arc<dyn TemplateCompiler>,
        state_cache: Arc<ProviderStateCache>,
        notifier: Notifier,
        run_completed: mpsc::UnboundedSender<DocumentId>,
    ) -> Self {
        let (change_signals, signal_rx) = mpsc::unbounded_channel();

        if let Some(provider) = &document.provider {
            provider.attach_listener(change_signals.clone());
        }

        let inner = Arc::new(Inner {
            id: DocumentId::new(),
            document: RwLock::new(document),
            compiler,
            state_cache,
            run_state: RwLock::new(RunState::Idle),
            generated_code: RwLock::new(String::new()),
            diagnostics: RwLock::new(Vec::new()),
            executed_output: RwLock::new(String::new()),
            dirty: AtomicBool::new(false),
            log: MessageLog::new(),
            generation: AtomicU64::new(0),
            notifier,
            run_completed,
            change_signals,
        });

        Self::spawn_signal_pump(&inner, signal_rx);

        Self { inner }
    }

    /// Forwards model-change signals into runs. Holds only a weak
    /// reference so a closed document's pump winds down on its own.
    fn spawn_signal_pump(inner: &Arc<Inner>, mut signal_rx: mpsc::UnboundedReceiver<ModelChanged>) {
        let weak = Arc::downgrade(inner);
        tokio::spawn(async move {
            while signal_rx.recv().await.is_some() {
                let Some(inner) = weak.upgrade() else { break };
                let controller = PipelineController { inner };
                tracing::debug!(document = %controller.id(), "Model changed");
                controller.inner.dirty.store(true, Ordering::SeqCst);
                controller.trigger_run();
            }
        });
    }

    pub fn id(&self) -> DocumentId {
        self.inner.id
    }

    // ------------------------------------------------------------------
    // Document access
    // ------------------------------------------------------------------

    pub async fn source(&self) -> String {
        self.inner.document.read().await.source.clone()
    }

    /// Replaces the template source, marks the document dirty, and
    /// triggers a run.
    pub async fn set_source(&self, source: impl Into<String>) {
        {
            let mut document = self.inner.document.write().await;
            document.source = source.into();
        }
        self.inner.dirty.store(true, Ordering::SeqCst);
        self.trigger_run();
    }

    pub async fn filename(&self) -> Option<PathBuf> {
        self.inner.document.read().await.filename.clone()
    }

    /// Updates the filename without touching the dirty flag; used by
    /// the session layer after a successful save-as.
    pub async fn set_filename(&self, filename: Option<PathBuf>) {
        let mut document = self.inner.document.write().await;
        document.filename = filename;
    }

    pub async fn display_name(&self) -> String {
        self.inner.document.read().await.display_name()
    }

    pub async fn can_save_to_current_file(&self) -> bool {
        self.inner.document.read().await.can_save_to_current_file()
    }

    /// Runs a closure against the active provider, if one is attached.
    /// Model-editing front ends downcast through
    /// [`ModelProvider::as_any`] here.
    pub async fn with_provider<R>(&self, f: impl FnOnce(&dyn ModelProvider) -> R) -> Option<R> {
        let document = self.inner.document.read().await;
        document.provider.as_deref().map(f)
    }

    /// Copies the document out for one run. The lock is released
    /// before the backend is awaited, so a slow or hung backend never
    /// blocks edits, saves, or a superseding run.
    async fn snapshot(&self) -> TemplateDocument {
        let document = self.inner.document.read().await;
        TemplateDocument {
            source: document.source.clone(),
            filename: document.filename.clone(),
            provider: document.provider.clone(),
        }
    }

    pub async fn provider_kind(&self) -> Option<String> {
        self.with_provider(|p| p.kind().to_string()).await
    }

    /// Snapshots the document into its persistence form.
    pub async fn to_stored(&self) -> StoredDocument {
        let document = self.inner.document.read().await;
        StoredDocument {
            source: document.source.clone(),
            filename: document.filename.clone(),
            provider_kind: document.provider.as_ref().map(|p| p.kind().to_string()),
            model_state: document.provider.as_ref().map(|p| p.serialize()),
            saved_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    // ------------------------------------------------------------------
    // Dirty tracking
    // ------------------------------------------------------------------

    /// Dirty is a one-way latch: set by edits and provider activity,
    /// cleared only here, immediately after a successful save.
    pub fn mark_saved(&self) {
        self.inner.dirty.store(false, Ordering::SeqCst);
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.load(Ordering::SeqCst)
    }

    // ------------------------------------------------------------------
    // Provider management
    // ------------------------------------------------------------------

    /// Swaps the document's model provider.
    ///
    /// The outgoing provider's state is serialized into the session's
    /// state cache under its kind and its change subscription detached;
    /// the incoming provider gets this controller's subscription and,
    /// if the cache holds prior state for its kind, that state back.
    /// The swap marks the document dirty and triggers a re-run.
    pub async fn set_model_provider(&self, provider: Arc<dyn ModelProvider>) {
        {
            let mut document = self.inner.document.write().await;

            if let Some(old) = document.provider.take() {
                self.inner.state_cache.store(old.kind(), old.serialize());
                old.detach_listener();
            }

            provider.attach_listener(self.inner.change_signals.clone());

            if let Some(state) = self.inner.state_cache.restore(provider.kind()) {
                if let Err(err) = provider.deserialize(&state) {
                    tracing::warn!(
                        kind = provider.kind(),
                        error = %err,
                        "Cached provider state was invalid - provider keeps defaults"
                    );
                }
            }

            tracing::debug!(document = %self.inner.id, kind = provider.kind(), "Model provider changed");
            document.provider = Some(provider);
        }

        self.inner.dirty.store(true, Ordering::SeqCst);
        self.trigger_run();
    }

    // ------------------------------------------------------------------
    // Run outputs
    // ------------------------------------------------------------------

    pub async fn run_state(&self) -> RunState {
        *self.inner.run_state.read().await
    }

    /// Generated-code listing with comment lines stripped; display
    /// only, never fed back into execution.
    pub async fn generated_code(&self) -> String {
        self.inner.generated_code.read().await.clone()
    }

    pub async fn diagnostics(&self) -> Vec<Diagnostic> {
        self.inner.diagnostics.read().await.clone()
    }

    pub async fn executed_output(&self) -> String {
        self.inner.executed_output.read().await.clone()
    }

    pub fn log_lines(&self) -> Vec<String> {
        self.inner.log.lines()
    }

    pub fn flush_log(&self) {
        self.inner.log.flush();
    }

    // ------------------------------------------------------------------
    // Run machinery
    // ------------------------------------------------------------------

    fn bump_generation(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.inner.generation.load(Ordering::SeqCst) == generation
    }

    /// Invalidates all in-flight runs. Called when the document is
    /// closed so a run completing afterwards cannot write into it.
    pub fn invalidate(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Starts a background run. Returns immediately; results land in
    /// the accessors when (and if) the run finishes unsuperseded.
    pub fn trigger_run(&self) {
        let generation = self.bump_generation();
        let controller = self.clone();
        tokio::spawn(async move {
            controller.run(generation).await;
        });
    }

    /// Runs the generation step only, committing code and diagnostics.
    pub async fn parse(&self) {
        let generation = self.bump_generation();
        self.parse_step(generation).await;
    }

    /// Runs a full parse→execute cycle and waits for it.
    pub async fn execute(&self) {
        let generation = self.bump_generation();
        self.run(generation).await;
    }

    async fn set_state(&self, state: RunState, generation: u64) {
        if self.is_latest(generation) {
            *self.inner.run_state.write().await = state;
        }
    }

    async fn run(&self, generation: u64) {
        self.inner.log.append("Parsing template...");

        let Some(results) = self.parse_step(generation).await else {
            tracing::debug!(document = %self.inner.id, generation, "Run superseded during parse");
            return;
        };

        if !results.success {
            // Parse failure is this run's terminal outcome; execution
            // is skipped for the cycle.
            self.emit_run_completed();
            return;
        }

        self.inner.log.append("Executing template...");
        self.set_state(RunState::Executing, generation).await;

        let snapshot = self.snapshot().await;
        let outcome = self.inner.compiler.execute(&snapshot).await;

        if !self.is_latest(generation) {
            tracing::debug!(document = %self.inner.id, generation, "Run superseded during execute");
            return;
        }

        match outcome {
            Ok(output) => {
                *self.inner.executed_output.write().await = output;
                self.set_state(RunState::Executed, generation).await;
                self.inner.log.append("Success!");
                self.inner.notifier.status("Success!");
            }
            Err(err) => {
                tracing::debug!(document = %self.inner.id, error = %err, "Template execution failed");
                self.inner.log.append(&format!("{err}\n{err:?}"));
                *self.inner.executed_output.write().await = err.to_string();
                self.set_state(RunState::ExecuteFailed, generation).await;
                self.inner.notifier.status(err.to_string());
            }
        }

        self.emit_run_completed();
    }

    /// Generation step. Returns `None` when the run was superseded
    /// before it could commit.
    async fn parse_step(&self, generation: u64) -> Option<GeneratorResults> {
        self.inner.notifier.status("Parsing template...");
        self.set_state(RunState::Parsing, generation).await;

        let snapshot = self.snapshot().await;
        let results = self.inner.compiler.generate(&snapshot).await;

        if !self.is_latest(generation) {
            return None;
        }

        *self.inner.generated_code.write().await = strip_comment_lines(&results.code);
        *self.inner.diagnostics.write().await = results.diagnostics.clone();

        if results.success {
            self.inner.notifier.status("Template successfully parsed");
            self.set_state(RunState::Parsed, generation).await;
        } else {
            self.inner.notifier.status("Template parsing failed!");
            self.inner.log.append("***  Template Parsing Failed  ***");

            let rendered = render_diagnostics(&results.diagnostics);
            self.inner.log.append(&rendered);
            *self.inner.executed_output.write().await = rendered;
            self.set_state(RunState::ParseFailed, generation).await;
        }

        Some(results)
    }

    fn emit_run_completed(&self) {
        let _ = self.inner.run_completed.send(self.inner.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quillpad_core::error::{QuillError, Result};
    use quillpad_core::provider::ChangeListener;
    use std::any::Any;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Compiler stand-in mirroring the backend contract: `<bad>` in
    /// the source fails generation, `<boom>` raises at execution, and
    /// `@Model.<field>` references substitute from the provider model.
    struct FakeCompiler;

    #[async_trait]
    impl TemplateCompiler for FakeCompiler {
        async fn generate(&self, document: &TemplateDocument) -> GeneratorResults {
            if document.source.contains("<bad>") {
                return GeneratorResults::failed(vec![Diagnostic::new(1, "unexpected token '<bad>'")]);
            }
            GeneratorResults::ok(format!(
                "// generated listing\nrender({:?});\n# end",
                document.source
            ))
        }

        async fn execute(&self, document: &TemplateDocument) -> Result<String> {
            if document.source.contains("<boom>") {
                return Err(QuillError::execution("model blew up"));
            }

            let model = match &document.provider {
                Some(provider) => provider.model()?,
                None => serde_json::Value::Null,
            };

            let mut output = document.source.clone();
            if let Some(fields) = model.as_object() {
                for (key, value) in fields {
                    let needle = format!("@Model.{key}");
                    let text = match value {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    output = output.replace(&needle, &text);
                }
            }
            Ok(output)
        }
    }

    /// Compiler whose execution blocks until released; used to force
    /// run overlap.
    struct GatedCompiler {
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl TemplateCompiler for GatedCompiler {
        async fn generate(&self, _document: &TemplateDocument) -> GeneratorResults {
            GeneratorResults::ok("code")
        }

        async fn execute(&self, document: &TemplateDocument) -> Result<String> {
            if document.source == "slow" {
                self.release.notified().await;
                return Ok("stale".to_string());
            }
            Ok("fresh".to_string())
        }
    }

    struct TestProvider {
        kind: &'static str,
        value: Mutex<serde_json::Value>,
        listener: Mutex<Option<ChangeListener>>,
    }

    impl TestProvider {
        fn new(kind: &'static str) -> Self {
            Self {
                kind,
                value: Mutex::new(serde_json::json!({})),
                listener: Mutex::new(None),
            }
        }

        fn with_model(kind: &'static str, value: serde_json::Value) -> Self {
            let provider = Self::new(kind);
            *provider.value.lock().unwrap() = value;
            provider
        }

        fn set_field(&self, key: &str, value: serde_json::Value) {
            {
                let mut model = self.value.lock().unwrap();
                if let Some(fields) = model.as_object_mut() {
                    fields.insert(key.to_string(), value);
                }
            }
            if let Some(listener) = self.listener.lock().unwrap().as_ref() {
                let _ = listener.send(ModelChanged);
            }
        }
    }

    impl ModelProvider for TestProvider {
        fn kind(&self) -> &str {
            self.kind
        }

        fn model(&self) -> Result<serde_json::Value> {
            Ok(self.value.lock().unwrap().clone())
        }

        fn serialize(&self) -> String {
            self.value.lock().unwrap().to_string()
        }

        fn deserialize(&self, text: &str) -> Result<()> {
            let parsed: serde_json::Value = serde_json::from_str(text)
                .map_err(|e| QuillError::invalid_provider_state(e.to_string()))?;
            *self.value.lock().unwrap() = parsed;
            Ok(())
        }

        fn attach_listener(&self, listener: ChangeListener) {
            *self.listener.lock().unwrap() = Some(listener);
        }

        fn detach_listener(&self) {
            *self.listener.lock().unwrap() = None;
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn controller_with(
        compiler: Arc<dyn TemplateCompiler>,
        provider: Option<Arc<dyn ModelProvider>>,
    ) -> (PipelineController, mpsc::UnboundedReceiver<DocumentId>) {
        let document = match provider {
            Some(provider) => TemplateDocument::with_provider(provider),
            None => TemplateDocument::new(),
        };
        let (run_tx, run_rx) = mpsc::unbounded_channel();
        let controller = PipelineController::new(
            document,
            compiler,
            Arc::new(ProviderStateCache::new()),
            Notifier::new(),
            run_tx,
        );
        (controller, run_rx)
    }

    async fn wait_for_output(controller: &PipelineController, expected: &str) {
        for _ in 0..200 {
            if controller.executed_output().await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!(
            "timed out waiting for output {expected:?}, last was {:?}",
            controller.executed_output().await
        );
    }

    #[tokio::test]
    async fn test_fresh_controller_is_clean_and_idle() {
        let (controller, _rx) = controller_with(Arc::new(FakeCompiler), None);
        assert!(!controller.is_dirty());
        assert_eq!(controller.run_state().await, RunState::Idle);
        assert!(controller.log_lines().is_empty());
    }

    #[tokio::test]
    async fn test_execute_renders_model_into_output() {
        let provider = TestProvider::with_model("json", serde_json::json!({"Name": "World"}));
        let (controller, _rx) = controller_with(Arc::new(FakeCompiler), Some(Arc::new(provider)));

        controller.set_source("Hello @Model.Name").await;
        controller.execute().await;

        assert_eq!(controller.executed_output().await, "Hello World");
        assert!(controller.diagnostics().await.is_empty());
        assert!(controller.is_dirty());
        assert_eq!(controller.run_state().await, RunState::Executed);

        let lines = controller.log_lines();
        assert!(lines.last().unwrap().ends_with("Success!"));
    }

    #[tokio::test]
    async fn test_parse_failure_renders_diagnostics_as_output() {
        let (controller, _rx) = controller_with(Arc::new(FakeCompiler), None);

        controller.set_source("broken <bad> template").await;
        controller.execute().await;

        let diagnostics = controller.diagnostics().await;
        assert!(!diagnostics.is_empty());
        assert_eq!(diagnostics[0].line, 1);

        let output = controller.executed_output().await;
        assert!(output.contains("Line "));
        assert!(output.contains("unexpected token"));
        assert_eq!(controller.run_state().await, RunState::ParseFailed);
    }

    #[tokio::test]
    async fn test_generated_code_has_comment_lines_stripped() {
        let (controller, _rx) = controller_with(Arc::new(FakeCompiler), None);

        controller.set_source("plain").await;
        controller.execute().await;

        let code = controller.generated_code().await;
        assert!(!code.contains("// generated listing"));
        assert!(!code.contains("# end"));
        assert!(code.contains("render"));
    }

    #[tokio::test]
    async fn test_execution_failure_is_captured_not_propagated() {
        let (controller, _rx) = controller_with(Arc::new(FakeCompiler), None);

        controller.set_source("kaboom <boom>").await;
        controller.execute().await;

        assert_eq!(controller.run_state().await, RunState::ExecuteFailed);
        let output = controller.executed_output().await;
        assert!(output.contains("model blew up"));

        let lines = controller.log_lines();
        assert!(lines.iter().any(|l| l.contains("model blew up")));
    }

    #[tokio::test]
    async fn test_mark_saved_clears_dirty_latch() {
        let (controller, _rx) = controller_with(Arc::new(FakeCompiler), None);
        controller.set_source("x").await;
        assert!(controller.is_dirty());
        controller.mark_saved();
        assert!(!controller.is_dirty());
    }

    #[tokio::test]
    async fn test_provider_round_trip_restores_state() {
        let alpha = TestProvider::with_model("alpha", serde_json::json!({"count": 7}));
        let (controller, _rx) = controller_with(Arc::new(FakeCompiler), Some(Arc::new(alpha)));

        controller
            .set_model_provider(Arc::new(TestProvider::new("beta")))
            .await;
        assert_eq!(controller.provider_kind().await.as_deref(), Some("beta"));

        // A fresh alpha instance must come back with alpha's old state.
        controller
            .set_model_provider(Arc::new(TestProvider::new("alpha")))
            .await;

        let restored = controller
            .with_provider(|p| p.model().unwrap())
            .await
            .unwrap();
        assert_eq!(restored, serde_json::json!({"count": 7}));
    }

    #[tokio::test]
    async fn test_model_change_signal_triggers_rerun() {
        let provider = TestProvider::with_model("json", serde_json::json!({"Name": "World"}));
        let (controller, _rx) = controller_with(Arc::new(FakeCompiler), Some(Arc::new(provider)));

        controller.set_source("Hello @Model.Name").await;
        controller.execute().await;
        controller.mark_saved();

        controller
            .with_provider(|p| {
                p.as_any()
                    .downcast_ref::<TestProvider>()
                    .unwrap()
                    .set_field("Name", serde_json::json!("Quill"));
            })
            .await;

        wait_for_output(&controller, "Hello Quill").await;
        assert!(controller.is_dirty());
    }

    #[tokio::test]
    async fn test_superseded_run_does_not_overwrite_newer_output() {
        let compiler = Arc::new(GatedCompiler {
            release: tokio::sync::Notify::new(),
        });
        let (controller, _rx) = controller_with(compiler.clone(), None);

        // First run blocks inside the backend.
        controller.set_source("slow").await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Second run supersedes it and completes.
        controller.set_source("fast").await;
        wait_for_output(&controller, "fresh").await;

        // Releasing the first run must not resurrect its result.
        compiler.release.notify_one();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(controller.executed_output().await, "fresh");
    }

    #[tokio::test]
    async fn test_every_terminal_run_reports_completion() {
        let (controller, mut rx) = controller_with(Arc::new(FakeCompiler), None);

        controller.execute().await;
        assert_eq!(rx.recv().await, Some(controller.id()));

        controller.set_source("<bad>").await;
        controller.execute().await;
        // Both the background run from the edit and the explicit
        // execute settle; at least one completion per terminal run.
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_inflight_backend_call_does_not_block_edits() {
        let compiler = Arc::new(GatedCompiler {
            release: tokio::sync::Notify::new(),
        });
        let (controller, _rx) = controller_with(compiler.clone(), None);

        // First run parks inside the backend.
        controller.set_source("slow").await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Edits and reads must go through while the backend hangs.
        tokio::time::timeout(Duration::from_millis(500), async {
            controller.set_source("fast").await;
            assert_eq!(controller.source().await, "fast");
            controller.set_filename(Some(PathBuf::from("/tmp/x.qp"))).await;
        })
        .await
        .unwrap_or_else(|_| panic!("edit blocked behind an in-flight backend call"));

        compiler.release.notify_one();
        wait_for_output(&controller, "fresh").await;
    }

    #[tokio::test]
    async fn test_comment_stripping_spares_inline_slashes_and_hashes() {
        let (controller, _rx) = controller_with(Arc::new(FakeCompiler), None);

        controller
            .set_source("see https://example.com #anchor")
            .await;
        controller.execute().await;

        // Whole comment lines go; a // or # inside a line stays.
        let code = controller.generated_code().await;
        assert!(!code.contains("// generated listing"));
        assert!(!code.contains("# end"));
        assert!(code.contains("https://example.com"));
        assert!(code.contains("#anchor"));
    }

    #[tokio::test]
    async fn test_invalidate_discards_in_flight_run() {
        let compiler = Arc::new(GatedCompiler {
            release: tokio::sync::Notify::new(),
        });
        let (controller, _rx) = controller_with(compiler.clone(), None);

        controller.set_source("slow").await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        controller.invalidate();
        compiler.release.notify_one();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_ne!(controller.executed_output().await, "stale");
    }
}
