//! Command execution engine

use crate::{Command, EditError, History, HistoryEntry, RejectReason, Result};
use doc_model::{parse_markup, to_markup, DocumentTree, Selection};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Immutable view of the document published after every committed change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    /// Increases by one with every execute, undo and redo
    pub revision: u64,
    pub markup: String,
    pub word_count: usize,
    pub character_count: usize,
    pub selection: Selection,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// The main editing engine that manages document state and command execution
pub struct EditingEngine {
    /// Current document tree
    tree: Arc<DocumentTree>,
    /// Current selection
    selection: Selection,
    history: History,
    revision: u64,
    snapshots: watch::Sender<Arc<EditorSnapshot>>,
}

impl EditingEngine {
    /// Create a new editing engine with an empty document
    pub fn new() -> Self {
        Self::with_tree(DocumentTree::new())
    }

    /// Create an editing engine with a specific document tree
    pub fn with_tree(mut tree: DocumentTree) -> Self {
        tree.normalize();
        let selection = Selection::collapsed(tree.start_position());
        let tree = Arc::new(tree);
        let history = History::new();
        let snapshot = build_snapshot(&tree, &selection, &history, 0);
        let (snapshots, _) = watch::channel(Arc::new(snapshot));
        Self {
            tree,
            selection,
            history,
            revision: 0,
            snapshots,
        }
    }

    /// Parse markup into a new engine
    pub fn from_markup(markup: &str) -> Result<Self> {
        Ok(Self::with_tree(parse_markup(markup)?))
    }

    /// Replace the history with one of a different size; existing entries
    /// are dropped
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history = History::with_limit(limit);
        self.publish();
        self
    }

    /// Get the current document tree
    pub fn tree(&self) -> &DocumentTree {
        &self.tree
    }

    /// Get the current selection
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Set the selection. Both ends must point into textblocks.
    pub fn set_selection(&mut self, selection: Selection) -> Result<()> {
        for position in [&selection.anchor, &selection.head] {
            if !self.tree.is_valid_position(position) {
                return Err(RejectReason::InvalidSelection(format!(
                    "{:?}@{} does not point into a textblock",
                    position.path, position.offset
                ))
                .into());
            }
        }
        self.selection = selection;
        self.publish();
        Ok(())
    }

    /// Execute a command.
    ///
    /// A rejection leaves tree, selection and history untouched. A result
    /// that breaks a model invariant is refused as a hard error.
    pub fn execute(&mut self, command: &dyn Command) -> Result<()> {
        let result = match command.apply(&self.tree, &self.selection) {
            Ok(result) => result,
            Err(err) => {
                if let EditError::Rejected(reason) = &err {
                    tracing::debug!(command = command.display_name(), %reason, "command rejected");
                }
                return Err(err);
            }
        };
        result.tree.validate().map_err(EditError::Invariant)?;

        let after = Arc::new(result.tree);
        self.history.push(HistoryEntry {
            before_tree: Arc::clone(&self.tree),
            after_tree: Arc::clone(&after),
            selection_before: self.selection.clone(),
            selection_after: result.selection.clone(),
            label: command.display_name().to_string(),
        });
        self.tree = after;
        self.selection = result.selection;
        self.bump();
        Ok(())
    }

    /// Undo the last command. Returns `false` at the start of history.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.undo() else {
            tracing::trace!("nothing to undo");
            return false;
        };
        tracing::trace!(command = %entry.label, "undo");
        self.tree = Arc::clone(&entry.before_tree);
        self.selection = entry.selection_before.clone();
        self.bump();
        true
    }

    /// Redo the last undone command. Returns `false` at the end of history.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.history.redo() else {
            tracing::trace!("nothing to redo");
            return false;
        };
        tracing::trace!(command = %entry.label, "redo");
        self.tree = Arc::clone(&entry.after_tree);
        self.selection = entry.selection_after.clone();
        self.bump();
        true
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Whether a command would succeed on the current state
    pub fn can_execute(&self, command: &dyn Command) -> bool {
        crate::query::can_execute(&self.tree, &self.selection, command)
    }

    pub fn is_active(&self, query: &crate::ActiveQuery) -> bool {
        crate::query::is_active(&self.tree, &self.selection, query)
    }

    pub fn markup(&self) -> String {
        to_markup(&self.tree)
    }

    pub fn plain_text(&self) -> String {
        self.tree.plain_text()
    }

    pub fn word_count(&self) -> usize {
        self.tree.word_count()
    }

    pub fn character_count(&self) -> usize {
        self.tree.character_count()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Receive a new snapshot after every committed change
    pub fn subscribe(&self) -> watch::Receiver<Arc<EditorSnapshot>> {
        self.snapshots.subscribe()
    }

    /// The most recently published snapshot
    pub fn snapshot(&self) -> Arc<EditorSnapshot> {
        self.snapshots.borrow().clone()
    }

    fn bump(&mut self) {
        self.revision += 1;
        self.publish();
    }

    fn publish(&self) {
        let snapshot = build_snapshot(&self.tree, &self.selection, &self.history, self.revision);
        self.snapshots.send_replace(Arc::new(snapshot));
    }
}

impl Default for EditingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EditingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditingEngine")
            .field("revision", &self.revision)
            .field("selection", &self.selection)
            .field("history", &self.history.len())
            .finish()
    }
}

fn build_snapshot(
    tree: &DocumentTree,
    selection: &Selection,
    history: &History,
    revision: u64,
) -> EditorSnapshot {
    EditorSnapshot {
        revision,
        markup: to_markup(tree),
        word_count: tree.word_count(),
        character_count: tree.character_count(),
        selection: selection.clone(),
        can_undo: history.can_undo(),
        can_redo: history.can_redo(),
    }
}
