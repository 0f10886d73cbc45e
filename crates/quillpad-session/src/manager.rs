//! Session manager: document lifecycle and coordination.

use crate::recent::RecentFiles;
use quillpad_core::autosave::AutoSaver;
use quillpad_core::compiler::TemplateCompiler;
use quillpad_core::document::{DocumentId, DocumentStore, StoredDocument, TemplateDocument};
use quillpad_core::error::{QuillError, Result};
use quillpad_core::notify::{Notification, Notifier};
use quillpad_core::prompt::{Prompter, SavePrompt};
use quillpad_core::provider::{ProviderRegistry, ProviderStateCache};
use quillpad_pipeline::PipelineController;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, mpsc, Mutex, RwLock};

/// What to do with unsaved changes when closing a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveIntent {
    /// Ask the confirmation collaborator (Yes/No/Cancel).
    Prompt,
    /// Save without asking.
    Save,
    /// Discard changes without asking.
    Discard,
}

struct DocumentEntry {
    controller: PipelineController,
    /// Serializes auto-save snapshots and the explicit save's "clear"
    /// for this document, so a clear happens-after any snapshot it is
    /// meant to supersede.
    autosave_gate: Arc<Mutex<()>>,
}

/// Owns the open documents of one editing session.
///
/// The session is the arena: documents live in an ordered collection
/// (insertion order = open order) and "current" is an identifier into
/// it, cleared automatically when the referenced document is removed.
/// All collaborator access (store, dialogs, auto-saver) goes through
/// the traits handed in at construction, so the manager is fully
/// driveable from tests.
pub struct SessionManager {
    documents: RwLock<Vec<DocumentEntry>>,
    current: RwLock<Option<DocumentId>>,
    store: Arc<dyn DocumentStore>,
    registry: Arc<ProviderRegistry>,
    compiler: Arc<dyn TemplateCompiler>,
    prompter: Arc<dyn Prompter>,
    autosaver: Option<Arc<dyn AutoSaver>>,
    state_cache: Arc<ProviderStateCache>,
    recent: RecentFiles,
    notifier: Notifier,
    run_events_tx: mpsc::UnboundedSender<DocumentId>,
}

impl SessionManager {
    /// Creates a session and starts its auto-save pump.
    ///
    /// The provider-state cache is session-scoped: it is handed in
    /// here, shared by every controller the session creates, and
    /// dropped with the session.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registry: Arc<ProviderRegistry>,
        compiler: Arc<dyn TemplateCompiler>,
        prompter: Arc<dyn Prompter>,
        autosaver: Option<Arc<dyn AutoSaver>>,
        state_cache: Arc<ProviderStateCache>,
    ) -> Arc<Self> {
        let (run_events_tx, run_events_rx) = mpsc::unbounded_channel();

        let manager = Arc::new(Self {
            documents: RwLock::new(Vec::new()),
            current: RwLock::new(None),
            store,
            registry,
            compiler,
            prompter,
            autosaver,
            state_cache,
            recent: RecentFiles::new(),
            notifier: Notifier::new(),
            run_events_tx,
        });

        Self::spawn_autosave_pump(Arc::downgrade(&manager), run_events_rx);

        manager
    }

    /// Drains run-completed signals into auto-save snapshots. Holds a
    /// weak reference so the pump winds down with the session.
    fn spawn_autosave_pump(
        weak: Weak<SessionManager>,
        mut run_events_rx: mpsc::UnboundedReceiver<DocumentId>,
    ) {
        tokio::spawn(async move {
            while let Some(id) = run_events_rx.recv().await {
                let Some(manager) = weak.upgrade() else { break };
                manager.auto_save_snapshot(id).await;
            }
        });
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Open document ids in open order.
    pub async fn documents(&self) -> Vec<DocumentId> {
        let documents = self.documents.read().await;
        documents.iter().map(|e| e.controller.id()).collect()
    }

    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    /// The controller for an open document.
    pub async fn controller(&self, id: DocumentId) -> Option<PipelineController> {
        let documents = self.documents.read().await;
        documents
            .iter()
            .find(|e| e.controller.id() == id)
            .map(|e| e.controller.clone())
    }

    async fn entry(&self, id: DocumentId) -> Option<(PipelineController, Arc<Mutex<()>>)> {
        let documents = self.documents.read().await;
        documents
            .iter()
            .find(|e| e.controller.id() == id)
            .map(|e| (e.controller.clone(), e.autosave_gate.clone()))
    }

    pub async fn current(&self) -> Option<DocumentId> {
        *self.current.read().await
    }

    pub async fn current_controller(&self) -> Option<PipelineController> {
        let id = self.current().await?;
        self.controller(id).await
    }

    /// Makes a document current. Switching never mutates the document;
    /// it only changes which one receives the session's forwarded
    /// intents.
    pub async fn select(&self, id: DocumentId) -> Result<()> {
        if self.controller(id).await.is_none() {
            return Err(QuillError::not_found("document", id.to_string()));
        }
        *self.current.write().await = Some(id);
        tracing::debug!(document = %id, "Current document changed");
        Ok(())
    }

    /// Recently used filenames, most recent first.
    pub fn recent_files(&self) -> Vec<PathBuf> {
        self.recent.list()
    }

    /// Registered model-provider kinds, in stable order.
    pub fn provider_kinds(&self) -> Vec<String> {
        self.registry.list_kinds()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Subscribes to status/error notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    // ------------------------------------------------------------------
    // Open
    // ------------------------------------------------------------------

    /// Opens a fresh unsaved document with the default provider kind,
    /// makes it current, and triggers its first run.
    pub async fn open_new(&self) -> Result<DocumentId> {
        let provider = self.registry.create_default()?;
        let document = TemplateDocument::with_provider(provider);
        let id = self.add_document(document).await;
        self.notifier.status("New document");
        Ok(id)
    }

    /// Opens a document from the store.
    ///
    /// A blank path is logged and ignored. If a document with the same
    /// filename (case-insensitive) is already open it is selected
    /// instead of loaded twice. Load failures are reported through the
    /// error notification and returned.
    pub async fn open(&self, path: &Path) -> Result<Option<DocumentId>> {
        if path.as_os_str().is_empty() {
            tracing::warn!("Attempted to open without specifying a filename - ignoring");
            return Ok(None);
        }

        if let Some(existing) = self.find_by_filename(path).await {
            tracing::debug!(path = %path.display(), "Document already open - selecting it");
            self.select(existing).await?;
            return Ok(Some(existing));
        }

        let stored = match self.store.load(path).await {
            Ok(stored) => stored,
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "Error loading document");
                self.notifier.error(err.to_string());
                return Err(err);
            }
        };

        let document = self.document_from_stored(stored, Some(path.to_path_buf()))?;
        let id = self.add_document(document).await;
        self.notifier
            .status(format!("Opened {}", path.display()));
        Ok(Some(id))
    }

    /// Opens whatever the file-dialog collaborator picks, if anything.
    pub async fn open_with_dialog(&self) -> Result<Option<DocumentId>> {
        match self.prompter.open_filename().await {
            Some(path) => self.open(&path).await,
            None => {
                tracing::debug!("Open dialog cancelled");
                Ok(None)
            }
        }
    }

    async fn find_by_filename(&self, path: &Path) -> Option<DocumentId> {
        let folded = path.to_string_lossy().to_lowercase();
        let documents = self.documents.read().await;
        for entry in documents.iter() {
            if let Some(filename) = entry.controller.filename().await {
                if filename.to_string_lossy().to_lowercase() == folded {
                    return Some(entry.controller.id());
                }
            }
        }
        None
    }

    /// Rewires a stored document into a live one: provider recreated
    /// from the registry and its serialized state restored. Invalid
    /// stored state downgrades to provider defaults with a warning.
    fn document_from_stored(
        &self,
        stored: StoredDocument,
        filename: Option<PathBuf>,
    ) -> Result<TemplateDocument> {
        let kind = stored
            .provider_kind
            .clone()
            .or_else(|| self.registry.default_kind().map(str::to_string));

        let provider = match kind {
            Some(kind) => {
                let provider = self.registry.create(&kind)?;
                if let Some(state) = &stored.model_state {
                    if let Err(err) = provider.deserialize(state) {
                        tracing::warn!(
                            kind = kind.as_str(),
                            error = %err,
                            "Stored model state was invalid - provider keeps defaults"
                        );
                    }
                }
                Some(provider)
            }
            None => None,
        };

        Ok(TemplateDocument {
            source: stored.source,
            filename: filename.or(stored.filename),
            provider,
        })
    }

    async fn add_document(&self, document: TemplateDocument) -> DocumentId {
        let filename = document.filename.clone();
        let controller = PipelineController::new(
            document,
            self.compiler.clone(),
            self.state_cache.clone(),
            self.notifier.clone(),
            self.run_events_tx.clone(),
        );
        let id = controller.id();

        {
            let mut documents = self.documents.write().await;
            documents.push(DocumentEntry {
                controller: controller.clone(),
                autosave_gate: Arc::new(Mutex::new(())),
            });
        }

        if let Some(filename) = filename {
            self.recent.record(&filename);
        }

        *self.current.write().await = Some(id);
        controller.trigger_run();

        tracing::info!(document = %id, "Added document");
        id
    }

    // ------------------------------------------------------------------
    // Close
    // ------------------------------------------------------------------

    /// Closes a document. Returns `Ok(false)` when the user cancelled.
    ///
    /// A dirty document with `SaveIntent::Prompt` asks the confirmation
    /// collaborator; Cancel aborts the close entirely, leaving the
    /// document present and still current. In-flight runs for the
    /// closed document are invalidated so they cannot write into it
    /// when they finish.
    pub async fn close(&self, id: DocumentId, intent: SaveIntent) -> Result<bool> {
        let controller = self
            .controller(id)
            .await
            .ok_or_else(|| QuillError::not_found("document", id.to_string()))?;

        if controller.is_dirty() {
            match intent {
                SaveIntent::Prompt => {
                    let answer = self
                        .prompter
                        .confirm_save(&controller.display_name().await)
                        .await;
                    tracing::debug!(document = %id, ?answer, "Dirty close confirmation");
                    match answer {
                        SavePrompt::Cancel => return Ok(false),
                        SavePrompt::Yes => self.save(id).await?,
                        SavePrompt::No => {}
                    }
                }
                SaveIntent::Save => self.save(id).await?,
                SaveIntent::Discard => {}
            }
        }

        {
            let mut documents = self.documents.write().await;
            documents.retain(|e| e.controller.id() != id);
        }
        controller.invalidate();

        {
            let mut current = self.current.write().await;
            if *current == Some(id) {
                *current = None;
            }
        }

        tracing::info!(document = %id, "Document closed");
        self.notifier.status("Document closed");
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Save
    // ------------------------------------------------------------------

    /// Saves a document to its current filename, or delegates to
    /// [`save_as`](Self::save_as) when it has none.
    pub async fn save(&self, id: DocumentId) -> Result<()> {
        let controller = self
            .controller(id)
            .await
            .ok_or_else(|| QuillError::not_found("document", id.to_string()))?;

        match controller.filename().await {
            Some(filename) if controller.can_save_to_current_file().await => {
                self.persist(id, filename).await
            }
            _ => self.save_as(id, None).await,
        }
    }

    /// Saves under a new filename, asking the save dialog when none is
    /// supplied. A blank answer means "user cancelled" and is not an
    /// error; the document simply stays dirty.
    pub async fn save_as(&self, id: DocumentId, filename: Option<PathBuf>) -> Result<()> {
        let controller = self
            .controller(id)
            .await
            .ok_or_else(|| QuillError::not_found("document", id.to_string()))?;

        let filename = match filename {
            Some(filename) => Some(filename),
            None => {
                tracing::debug!(document = %id, "No filename - asking the save dialog");
                self.prompter
                    .save_as_filename(&controller.display_name().await)
                    .await
            }
        };

        let Some(filename) = filename.filter(|f| !f.as_os_str().is_empty()) else {
            tracing::warn!(document = %id, "Filename is empty - skipping save");
            return Ok(());
        };

        self.persist(id, filename).await
    }

    /// Writes the document through the store. Store failures are
    /// logged, surfaced through an error notification, and abort only
    /// this save; the session keeps running and the document stays
    /// dirty.
    async fn persist(&self, id: DocumentId, filename: PathBuf) -> Result<()> {
        let Some((controller, autosave_gate)) = self.entry(id).await else {
            return Err(QuillError::not_found("document", id.to_string()));
        };

        let mut stored = controller.to_stored().await;
        stored.filename = Some(filename.clone());

        tracing::debug!(document = %id, path = %filename.display(), "Saving document");

        if let Err(err) = self.store.save(&stored, &filename).await {
            tracing::error!(path = %filename.display(), error = %err, "Error saving document");
            self.notifier.error(err.to_string());
            return Ok(());
        }

        controller.set_filename(Some(filename.clone())).await;
        controller.mark_saved();
        self.recent.record(&filename);

        // An explicit save supersedes the recovery snapshot; take the
        // per-document gate so the clear lands after any snapshot that
        // is still in flight.
        if let Some(saver) = &self.autosaver {
            let _gate = autosave_gate.lock().await;
            if let Err(err) = saver.clear().await {
                tracing::warn!(error = %err, "Failed to clear the recovery snapshot");
            }
        }

        tracing::info!(document = %id, path = %filename.display(), "Document saved");
        self.notifier
            .status(format!("Saved {}", filename.display()));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Providers
    // ------------------------------------------------------------------

    /// Switches the current document to a different provider kind.
    pub async fn set_current_provider(&self, kind: &str) -> Result<()> {
        let controller = self
            .current_controller()
            .await
            .ok_or_else(|| QuillError::internal("No current document"))?;
        let provider = self.registry.create(kind)?;
        controller.set_model_provider(provider).await;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Auto-save
    // ------------------------------------------------------------------

    /// Best-effort recovery snapshot after a completed run. Failures
    /// are logged and swallowed; a run that completed for an
    /// already-closed document is skipped.
    async fn auto_save_snapshot(&self, id: DocumentId) {
        let Some(saver) = self.autosaver.clone() else {
            return;
        };
        let Some((controller, autosave_gate)) = self.entry(id).await else {
            tracing::debug!(document = %id, "Run completed for a closed document - skipping auto-save");
            return;
        };

        let stored = controller.to_stored().await;

        let _gate = autosave_gate.lock().await;
        match saver.save(&stored).await {
            Ok(()) => tracing::info!(document = %id, "Auto-saved recovery snapshot"),
            Err(err) => tracing::warn!(document = %id, error = %err, "Auto-save failed"),
        }
    }

    /// Opens the auto-saver's recovered document, if one exists.
    /// Failures are logged as warnings, never propagated.
    pub async fn load_auto_save(&self) -> Option<DocumentId> {
        let saver = self.autosaver.clone()?;
        match saver.load().await {
            Ok(Some(stored)) => {
                let filename = stored.filename.clone();
                match self.document_from_stored(stored, filename) {
                    Ok(document) => {
                        let id = self.add_document(document).await;
                        self.notifier.status("Recovered auto-saved document");
                        Some(id)
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Recovered document could not be wired up");
                        None
                    }
                }
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(error = %err, "Auto-save snapshot found, but there was an error loading it");
                None
            }
        }
    }
}
