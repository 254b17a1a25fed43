//! Per-document editing sessions
//!
//! Every open document owns one [`EditingEngine`] behind an async mutex, so
//! commands against the same document run one at a time while different
//! documents proceed independently. Snapshots are read without the lock.

use crate::settings::EditingSettings;
use crate::Result;
use chrono::{DateTime, Utc};
use doc_model::{DocumentTree, Selection};
use docx_import::{ConversionOutput, Diagnostic};
use edit_engine::{EditingEngine, EditorSnapshot, ToolbarAction};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use uuid::Uuid;

/// One open document
pub struct DocumentSession {
    id: Uuid,
    title: String,
    opened_at: DateTime<Utc>,
    diagnostics: Vec<Diagnostic>,
    engine: Mutex<EditingEngine>,
    snapshots: watch::Receiver<Arc<EditorSnapshot>>,
}

impl DocumentSession {
    pub fn new(title: impl Into<String>, engine: EditingEngine) -> Self {
        Self::with_diagnostics(title, engine, Vec::new())
    }

    fn with_diagnostics(
        title: impl Into<String>,
        engine: EditingEngine,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let snapshots = engine.subscribe();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            opened_at: Utc::now(),
            diagnostics,
            engine: Mutex::new(engine),
            snapshots,
        }
    }

    /// Open a converted document; import diagnostics stay with the session
    pub fn from_conversion(
        title: impl Into<String>,
        output: ConversionOutput,
        settings: &EditingSettings,
    ) -> Self {
        let engine = EditingEngine::with_tree(output.tree).with_history_limit(settings.history_limit);
        Self::with_diagnostics(title, engine, output.diagnostics)
    }

    /// Open a document from editor markup
    pub fn from_markup(
        title: impl Into<String>,
        markup: &str,
        settings: &EditingSettings,
    ) -> Result<Self> {
        let engine = EditingEngine::from_markup(markup)?.with_history_limit(settings.history_limit);
        Ok(Self::new(title, engine))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Diagnostics reported when the document was imported
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Run a toolbar action. Returns whether the document changed.
    pub async fn execute_action(&self, action: &ToolbarAction) -> Result<bool> {
        let mut engine = self.engine.lock().await;
        Ok(engine.execute_action(action)?)
    }

    pub async fn undo(&self) -> bool {
        self.engine.lock().await.undo()
    }

    pub async fn redo(&self) -> bool {
        self.engine.lock().await.redo()
    }

    pub async fn set_selection(&self, selection: Selection) -> Result<()> {
        self.engine.lock().await.set_selection(selection)?;
        Ok(())
    }

    pub async fn is_action_active(&self, action: &ToolbarAction) -> bool {
        self.engine.lock().await.is_action_active(action)
    }

    pub async fn can_execute_action(&self, action: &ToolbarAction) -> bool {
        self.engine.lock().await.can_execute_action(action)
    }

    /// Copy of the current tree
    pub async fn tree(&self) -> DocumentTree {
        self.engine.lock().await.tree().clone()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<EditorSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Receive every snapshot published after this call
    pub fn subscribe(&self) -> watch::Receiver<Arc<EditorSnapshot>> {
        let mut receiver = self.snapshots.clone();
        receiver.mark_unchanged();
        receiver
    }
}

impl std::fmt::Debug for DocumentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSession")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("opened_at", &self.opened_at)
            .field("revision", &self.snapshots.borrow().revision)
            .finish()
    }
}

/// All open sessions, keyed by id
#[derive(Debug, Default)]
pub struct SessionRegistry {
    editing: EditingSettings,
    sessions: RwLock<HashMap<Uuid, Arc<DocumentSession>>>,
}

impl SessionRegistry {
    pub fn new(editing: EditingSettings) -> Self {
        Self {
            editing,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Open a session on a finished conversion
    pub async fn open(&self, title: impl Into<String>, output: ConversionOutput) -> Arc<DocumentSession> {
        self.insert(DocumentSession::from_conversion(title, output, &self.editing))
            .await
    }

    pub async fn open_markup(
        &self,
        title: impl Into<String>,
        markup: &str,
    ) -> Result<Arc<DocumentSession>> {
        let session = DocumentSession::from_markup(title, markup, &self.editing)?;
        Ok(self.insert(session).await)
    }

    async fn insert(&self, session: DocumentSession) -> Arc<DocumentSession> {
        let session = Arc::new(session);
        tracing::info!(id = %session.id(), title = session.title(), "session opened");
        self.sessions
            .write()
            .await
            .insert(session.id(), Arc::clone(&session));
        session
    }

    pub async fn get(&self, id: Uuid) -> Result<Arc<DocumentSession>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(crate::SessionError::SessionNotFound(id))
    }

    /// Close a session. Handles already held keep working until dropped.
    pub async fn close(&self, id: Uuid) -> Result<()> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                tracing::info!(%id, "session closed");
                Ok(())
            }
            None => Err(crate::SessionError::SessionNotFound(id)),
        }
    }

    pub async fn ids(&self) -> Vec<Uuid> {
        self.sessions.read().await.keys().copied().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
