//! Selection and position types

use serde::{Deserialize, Serialize};

/// A position within a textblock.
///
/// `path` is the index path of the textblock from the document root;
/// `offset` counts characters into its text. Positions order in document
/// order: paths compare lexicographically, then offsets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub path: Vec<usize>,
    pub offset: usize,
}

impl Position {
    pub fn new(path: Vec<usize>, offset: usize) -> Self {
        Self { path, offset }
    }

    /// Position at the very start of the textblock at `path`
    pub fn start_of(path: Vec<usize>) -> Self {
        Self { path, offset: 0 }
    }
}

/// A selection in the document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    /// The anchor (start) of the selection
    pub anchor: Position,
    /// The head (end/cursor) of the selection
    pub head: Position,
}

impl Selection {
    pub fn new(anchor: Position, head: Position) -> Self {
        Self { anchor, head }
    }

    /// Create a collapsed selection (cursor)
    pub fn collapsed(position: Position) -> Self {
        Self {
            anchor: position.clone(),
            head: position,
        }
    }

    /// Check if the selection is collapsed (cursor with no selection)
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    /// Get the start position (earlier in document order)
    pub fn from(&self) -> &Position {
        if self.anchor <= self.head {
            &self.anchor
        } else {
            &self.head
        }
    }

    /// Get the end position (later in document order)
    pub fn to(&self) -> &Position {
        if self.anchor <= self.head {
            &self.head
        } else {
            &self.anchor
        }
    }

    /// Whether the selection starts and ends in the same textblock
    pub fn is_within_block(&self) -> bool {
        self.anchor.path == self.head.path
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::collapsed(Position::start_of(vec![0]))
    }
}
