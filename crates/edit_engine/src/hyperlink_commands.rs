//! Hyperlink commands for creating, editing, and removing links

use crate::command::{finish, reject, require_valid_selection};
use crate::{Command, CommandResult, RejectReason, Result, SetMark, UnsetMark};
use doc_model::{
    map_marks_in_range, mark_range_at, marks_at_cursor, replace_range, DocumentTree, Mark, MarkType,
    NodeKind, Position, Selection,
};

/// Apply a link over the selection.
///
/// On a cursor inside an existing link the whole link is retargeted. On a
/// bare cursor the display text, when given, is inserted already linked.
#[derive(Debug, Clone)]
pub struct SetLink {
    /// The link target
    pub href: String,
    /// Text to insert when the selection is collapsed
    pub display_text: Option<String>,
}

impl SetLink {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            display_text: None,
        }
    }

    pub fn with_display_text(href: impl Into<String>, display_text: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            display_text: Some(display_text.into()),
        }
    }

    fn href(&self) -> Result<String> {
        let href = self.href.trim();
        if href.is_empty() {
            return reject(RejectReason::EmptyUri);
        }
        Ok(href.to_string())
    }
}

impl Command for SetLink {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        let href = self.href()?;
        if !selection.is_collapsed() {
            return SetMark::new(Mark::Link(href)).apply(tree, selection);
        }

        require_valid_selection(tree, selection)?;
        let head = &selection.head;
        let node = tree
            .node(&head.path)
            .ok_or_else(|| RejectReason::InvalidSelection("no textblock".to_string()))?;
        if node.kind == NodeKind::CodeBlock {
            return reject(RejectReason::NotApplicable(
                "links are not allowed in code blocks".to_string(),
            ));
        }
        let runs = node.runs().map(Vec::as_slice).unwrap_or_default();

        let mut new_tree = tree.clone();
        let new_runs = new_tree
            .node_mut(&head.path)
            .and_then(|node| node.runs_mut())
            .ok_or_else(|| RejectReason::InvalidSelection("no textblock".to_string()))?;

        if let Some((start, end)) = mark_range_at(runs, head.offset, MarkType::Link) {
            map_marks_in_range(new_runs, start, end, |marks| {
                marks.insert(Mark::Link(href.clone()))
            });
            return finish(tree, new_tree, selection.clone());
        }

        let text = match self.display_text.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => return reject(RejectReason::EmptySelection),
        };
        let mut marks = marks_at_cursor(runs, head.offset)
            .cloned()
            .unwrap_or_default();
        marks.insert(Mark::Link(href));
        replace_range(new_runs, head.offset, head.offset, text, marks);
        let end = Position::new(head.path.clone(), head.offset + text.chars().count());
        finish(tree, new_tree, Selection::new(head.clone(), end))
    }

    fn display_name(&self) -> &str {
        "Insert Link"
    }
}

/// Remove the link under the selection, or the whole link around a cursor
#[derive(Debug, Clone, Default)]
pub struct UnsetLink;

impl UnsetLink {
    pub fn new() -> Self {
        Self
    }
}

impl Command for UnsetLink {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        UnsetMark::new(MarkType::Link).apply(tree, selection)
    }

    fn display_name(&self) -> &str {
        "Remove Link"
    }
}
