//! Image and horizontal rule insertion
//!
//! Both are leaf blocks. They are placed at the cursor and the cursor
//! moves to the textblock that follows them.

use crate::command::{finish, insert_block, position_after_leaf, reject, require_valid_selection};
use crate::{Command, CommandResult, RejectReason, Result};
use doc_model::{DocumentTree, Node, Selection};

fn insert_leaf(tree: &DocumentTree, selection: &Selection, leaf: Node) -> Result<CommandResult> {
    require_valid_selection(tree, selection)?;
    let mut new_tree = tree.clone();
    let path = insert_block(&mut new_tree, &selection.head, leaf)
        .ok_or_else(|| RejectReason::InvalidSelection("no block at cursor".to_string()))?;
    let cursor = position_after_leaf(&mut new_tree, &path)
        .ok_or_else(|| RejectReason::InvalidSelection("no block after insertion".to_string()))?;
    finish(tree, new_tree, Selection::collapsed(cursor))
}

// =============================================================================
// InsertImage Command
// =============================================================================

/// Insert an image block at the cursor.
///
/// The source is taken as given; nothing is fetched or checked beyond
/// being non-empty.
#[derive(Debug, Clone)]
pub struct InsertImage {
    /// Image source URI (may be a `data:` URI)
    pub src: String,
    /// Alternative text
    pub alt: Option<String>,
}

impl InsertImage {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt: None,
        }
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }
}

impl Command for InsertImage {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        let src = self.src.trim();
        if src.is_empty() {
            return reject(RejectReason::EmptyUri);
        }
        let alt = self.alt.clone().filter(|alt| !alt.is_empty());
        insert_leaf(tree, selection, Node::image(src, alt))
    }

    fn display_name(&self) -> &str {
        "Insert Image"
    }
}

// =============================================================================
// InsertHorizontalRule Command
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct InsertHorizontalRule;

impl InsertHorizontalRule {
    pub fn new() -> Self {
        Self
    }
}

impl Command for InsertHorizontalRule {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        insert_leaf(tree, selection, Node::horizontal_rule())
    }

    fn display_name(&self) -> &str {
        "Insert Horizontal Line"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Mark, MarkSet, NodeKind, Position, TextRun};

    fn para(text: &str) -> Node {
        Node::paragraph(vec![TextRun::new(text)])
    }

    fn cursor(path: Vec<usize>, offset: usize) -> Selection {
        Selection::collapsed(Position::new(path, offset))
    }

    fn kinds(tree: &DocumentTree) -> Vec<NodeKind> {
        tree.blocks.iter().map(|node| node.kind).collect()
    }

    #[test]
    fn test_insert_image_mid_paragraph_splits() {
        let tree = DocumentTree::from_blocks(vec![para("left right")]);
        let result = InsertImage::new("https://a.test/x.png")
            .with_alt("x")
            .apply(&tree, &cursor(vec![0], 5))
            .unwrap();
        assert_eq!(
            kinds(&result.tree),
            vec![NodeKind::Paragraph, NodeKind::Image, NodeKind::Paragraph]
        );
        assert_eq!(result.tree.blocks[1].attrs.alt.as_deref(), Some("x"));
        assert_eq!(result.selection, cursor(vec![2], 0));
        assert_eq!(result.tree.node(&[0]).unwrap().text(), "left ");
        assert_eq!(result.tree.node(&[2]).unwrap().text(), "right");
    }

    #[test]
    fn test_insert_image_at_run_boundary_keeps_marks() {
        let tree = DocumentTree::from_blocks(vec![Node::paragraph(vec![
            TextRun::with_marks("bold", MarkSet::new().with(Mark::Bold)),
            TextRun::new("plain"),
        ])]);
        let result = InsertImage::new("https://a.test/x.png")
            .apply(&tree, &cursor(vec![0], 4))
            .unwrap();

        let head = result.tree.node(&[0]).unwrap().runs().unwrap();
        let tail = result.tree.node(&[2]).unwrap().runs().unwrap();
        assert_eq!(head, &vec![TextRun::with_marks("bold", MarkSet::new().with(Mark::Bold))]);
        assert_eq!(tail, &vec![TextRun::new("plain")]);
    }

    #[test]
    fn test_insert_image_at_end_adds_paragraph() {
        let tree = DocumentTree::from_blocks(vec![para("text")]);
        let result = InsertImage::new("data:image/png;base64,AAAA")
            .apply(&tree, &cursor(vec![0], 4))
            .unwrap();
        assert_eq!(
            kinds(&result.tree),
            vec![NodeKind::Paragraph, NodeKind::Image, NodeKind::Paragraph]
        );
        assert_eq!(result.selection, cursor(vec![2], 0));
    }

    #[test]
    fn test_empty_src_rejected() {
        let tree = DocumentTree::new();
        let err = InsertImage::new("  ").apply(&tree, &cursor(vec![0], 0)).unwrap_err();
        assert_eq!(err.reject_reason(), Some(&RejectReason::EmptyUri));
    }

    #[test]
    fn test_rule_replaces_empty_paragraph() {
        let tree = DocumentTree::from_blocks(vec![para("a"), Node::empty_paragraph(), para("b")]);
        let result = InsertHorizontalRule::new()
            .apply(&tree, &cursor(vec![1], 0))
            .unwrap();
        assert_eq!(
            kinds(&result.tree),
            vec![NodeKind::Paragraph, NodeKind::HorizontalRule, NodeKind::Paragraph]
        );
        assert_eq!(result.selection, cursor(vec![2], 0));
    }

    #[test]
    fn test_rule_in_list_goes_after_list() {
        let tree = DocumentTree::from_blocks(vec![Node::list(
            false,
            vec![Node::list_item(0, vec![TextRun::new("item")])],
        )]);
        let result = InsertHorizontalRule::new()
            .apply(&tree, &cursor(vec![0, 0], 2))
            .unwrap();
        assert_eq!(
            kinds(&result.tree),
            vec![NodeKind::BulletList, NodeKind::HorizontalRule, NodeKind::Paragraph]
        );
    }
}
