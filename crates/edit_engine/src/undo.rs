//! Linear undo/redo history of tree snapshots

use doc_model::{DocumentTree, Selection};
use std::collections::VecDeque;
use std::sync::Arc;

/// Default number of history entries kept
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// One undoable step
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub before_tree: Arc<DocumentTree>,
    pub after_tree: Arc<DocumentTree>,
    pub selection_before: Selection,
    pub selection_after: Selection,
    /// Display name of the command that produced this step
    pub label: String,
}

/// History stack with a cursor.
///
/// Entries before the cursor can be undone, entries at and after it can be
/// redone. Pushing a new entry discards the redo branch.
#[derive(Debug)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    cursor: usize,
    /// Maximum number of entries; 0 keeps everything
    max_entries: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            max_entries,
        }
    }

    /// Record a step, dropping anything that could have been redone
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.truncate(self.cursor);
        self.entries.push_back(entry);

        if self.max_entries > 0 {
            while self.entries.len() > self.max_entries {
                self.entries.pop_front();
            }
        }
        self.cursor = self.entries.len();
    }

    /// Step back, returning the entry to revert
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward, returning the entry to reapply
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        let entry = self.entries.get(self.cursor)?;
        self.cursor += 1;
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.max_entries
    }

    /// Label of the step the next undo would revert
    pub fn undo_label(&self) -> Option<&str> {
        self.cursor
            .checked_sub(1)
            .and_then(|index| self.entries.get(index))
            .map(|entry| entry.label.as_str())
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Node, Position, TextRun};

    fn entry(label: &str) -> HistoryEntry {
        let tree = Arc::new(DocumentTree::from_blocks(vec![Node::paragraph(vec![
            TextRun::new(label),
        ])]));
        HistoryEntry {
            before_tree: tree.clone(),
            after_tree: tree,
            selection_before: Selection::collapsed(Position::start_of(vec![0])),
            selection_after: Selection::collapsed(Position::start_of(vec![0])),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_undo_redo_moves_cursor() {
        let mut history = History::new();
        history.push(entry("a"));
        history.push(entry("b"));

        assert_eq!(history.undo().map(|e| e.label.clone()), Some("b".into()));
        assert_eq!(history.undo().map(|e| e.label.clone()), Some("a".into()));
        assert!(history.undo().is_none());
        assert_eq!(history.redo().map(|e| e.label.clone()), Some("a".into()));
        assert!(history.can_redo());
    }

    #[test]
    fn test_push_discards_redo_branch() {
        let mut history = History::new();
        history.push(entry("a"));
        history.push(entry("b"));
        history.undo();
        history.push(entry("c"));

        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
        assert_eq!(history.undo_label(), Some("c"));
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let mut history = History::with_limit(2);
        for label in ["a", "b", "c"] {
            history.push(entry(label));
        }
        assert_eq!(history.len(), 2);
        history.undo();
        assert_eq!(history.undo().map(|e| e.label.clone()), Some("b".into()));
        assert!(!history.can_undo());
    }

    #[test]
    fn test_zero_limit_is_unbounded() {
        let mut history = History::with_limit(0);
        for index in 0..250 {
            history.push(entry(&index.to_string()));
        }
        assert_eq!(history.len(), 250);
    }
}
