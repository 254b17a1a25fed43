//! Command system for document editing

use crate::{RejectReason, Result};
use doc_model::{
    marks_at, marks_at_cursor, replace_range, split_runs_at, Content, DocumentTree, MarkSet,
    MarkType, Node, NodeKind, Position, Selection,
};

/// Result of applying a command
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// The new document tree after the command
    pub tree: DocumentTree,
    /// The new selection after the command
    pub selection: Selection,
}

/// Trait for all editing commands.
///
/// `apply` is pure: it reads the current tree and selection and either
/// returns the next state or a rejection. The engine owns history.
pub trait Command: std::fmt::Debug + Send + Sync {
    /// Apply this command to a document
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult>;

    /// Get a display name for this command
    fn display_name(&self) -> &str;
}

// ============================================================================
// Helper functions shared by the command modules
// ============================================================================

pub(crate) fn reject<T>(reason: RejectReason) -> Result<T> {
    Err(reason.into())
}

/// Both ends of the selection must point into textblocks
pub(crate) fn require_valid_selection(tree: &DocumentTree, selection: &Selection) -> Result<()> {
    for (label, position) in [("anchor", &selection.anchor), ("head", &selection.head)] {
        if !tree.is_valid_position(position) {
            return reject(RejectReason::InvalidSelection(format!(
                "{label} {:?}@{} does not point into a textblock",
                position.path, position.offset
            )));
        }
    }
    Ok(())
}

/// Paths of the textblocks touched by the selection, in document order
pub(crate) fn touched_textblocks(tree: &DocumentTree, selection: &Selection) -> Vec<Vec<usize>> {
    tree.text_ranges(selection)
        .into_iter()
        .map(|range| range.path)
        .collect()
}

/// Whether children of the node at `path` are free-standing blocks
pub(crate) fn is_block_parent(tree: &DocumentTree, path: &[usize]) -> bool {
    path.is_empty() || tree.node(path).is_some_and(Node::is_container)
}

/// The nearest node on `path` that sits directly in the root or in a
/// container. For a list item this is its list.
pub(crate) fn block_anchor(tree: &DocumentTree, path: &[usize]) -> Vec<usize> {
    (1..=path.len())
        .rev()
        .find(|&len| is_block_parent(tree, &path[..len - 1]))
        .map(|len| path[..len].to_vec())
        .unwrap_or_else(|| path.iter().take(1).copied().collect())
}

/// Insert a block node at a position, returning the path of the new node.
///
/// An empty paragraph is replaced. Inside a textblock the node goes before
/// or after it at either edge and splits it in the middle. Inside a list
/// the node goes after the whole list.
pub(crate) fn insert_block(tree: &mut DocumentTree, at: &Position, node: Node) -> Option<Vec<usize>> {
    let anchor = block_anchor(tree, &at.path);
    let (&index, parent) = anchor.split_last()?;
    let target = tree.node(&anchor)?;
    let replace = target.kind == NodeKind::Paragraph && target.char_len() == 0;
    let in_textblock = anchor == at.path;
    let len = target.char_len();

    let siblings = tree.children_at_mut(parent)?;
    let inserted_at = if replace {
        siblings[index] = node;
        index
    } else if !in_textblock || at.offset >= len {
        siblings.insert(index + 1, node);
        index + 1
    } else if at.offset == 0 {
        siblings.insert(index, node);
        index
    } else {
        let mut tail = siblings[index].clone();
        if let Some(runs) = siblings[index].runs_mut() {
            let split = split_runs_at(runs, at.offset);
            tail.content = Content::Runs(runs.split_off(split));
        }
        siblings.insert(index + 1, tail);
        siblings.insert(index + 1, node);
        index + 1
    };

    let mut path = parent.to_vec();
    path.push(inserted_at);
    Some(path)
}

/// Start of the textblock following a freshly inserted leaf. An empty
/// paragraph is added when the next sibling is not a textblock.
pub(crate) fn position_after_leaf(tree: &mut DocumentTree, leaf: &[usize]) -> Option<Position> {
    let (&index, parent) = leaf.split_last()?;
    let siblings = tree.children_at_mut(parent)?;
    let next_is_text = siblings
        .get(index + 1)
        .is_some_and(|node| node.is_textblock() && node.kind != NodeKind::ListItem);
    if !next_is_text {
        siblings.insert(index + 1, Node::empty_paragraph());
    }
    let mut path = parent.to_vec();
    path.push(index + 1);
    Some(Position::start_of(path))
}

/// Map a selection across a structural change that keeps the number and
/// order of textblocks.
pub(crate) fn remap_selection(
    before: &DocumentTree,
    after: &DocumentTree,
    selection: &Selection,
) -> Selection {
    let map = |position: &Position| {
        match before
            .textblock_ordinal(&position.path)
            .and_then(|ordinal| after.textblock_at_ordinal(ordinal))
        {
            Some(path) => after.clamp_position(&Position::new(path, position.offset)),
            None => after.clamp_position(position),
        }
    };
    Selection::new(map(&selection.anchor), map(&selection.head))
}

/// Normalize the new tree and refuse results that change nothing, so that
/// every successful command is a real step in history.
pub(crate) fn finish(
    original: &DocumentTree,
    mut tree: DocumentTree,
    selection: Selection,
) -> Result<CommandResult> {
    tree.normalize();
    if tree == *original {
        return reject(RejectReason::NotApplicable(
            "command would not change the document".to_string(),
        ));
    }
    let selection = tree.clamp_selection(&selection);
    Ok(CommandResult { tree, selection })
}

// ============================================================================
// Replace Text Command
// ============================================================================

/// Replace the selected text (or insert at the cursor) within one textblock.
///
/// Inserted text takes the marks of the character before the cursor. A link
/// is not continued past its end.
#[derive(Debug, Clone)]
pub struct ReplaceText {
    pub text: String,
}

impl ReplaceText {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Command for ReplaceText {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        require_valid_selection(tree, selection)?;
        if !selection.is_within_block() {
            return reject(RejectReason::CrossBlockEdit);
        }
        if selection.is_collapsed() && self.text.is_empty() {
            return reject(RejectReason::InvalidArgument(
                "nothing to insert or replace".to_string(),
            ));
        }

        let from = selection.from().clone();
        let to = selection.to().clone();
        let mut new_tree = tree.clone();
        let node = new_tree.node_mut(&from.path).ok_or_else(|| {
            RejectReason::InvalidSelection(format!("no textblock at {:?}", from.path))
        })?;
        let is_code = node.kind == NodeKind::CodeBlock;
        let runs = node
            .runs_mut()
            .ok_or_else(|| RejectReason::InvalidSelection("not a textblock".to_string()))?;

        let marks = if is_code {
            MarkSet::new()
        } else {
            inherited_marks(runs, from.offset)
        };
        replace_range(runs, from.offset, to.offset, &self.text, marks);

        let cursor = Position::new(from.path, from.offset + self.text.chars().count());
        finish(tree, new_tree, Selection::collapsed(cursor))
    }

    fn display_name(&self) -> &str {
        "Type"
    }
}

fn inherited_marks(runs: &[doc_model::TextRun], offset: usize) -> MarkSet {
    let mut marks = marks_at_cursor(runs, offset).cloned().unwrap_or_default();
    if let Some(link) = marks.get(MarkType::Link).cloned() {
        let continues = marks_at(runs, offset).is_some_and(|after| after.contains(&link));
        if !continues {
            marks.remove(MarkType::Link);
        }
    }
    marks
}
