//! Block-type and alignment commands: paragraph, heading, code block,
//! blockquote, text alignment and clear formatting

use crate::command::{
    finish, is_block_parent, reject, remap_selection, require_valid_selection, touched_textblocks,
};
use crate::list_commands::lift_out_of_lists;
use crate::{Command, CommandResult, RejectReason, Result};
use doc_model::{
    clear_marks_in_range, Alignment, Content, DocumentTree, Node, NodeKind, Selection,
};

// =============================================================================
// Helper Functions
// =============================================================================

/// Retype every touched textblock for which `target` yields a new kind
fn retype_textblocks<F>(tree: &mut DocumentTree, paths: &[Vec<usize>], target: F)
where
    F: Fn(&Node) -> Option<NodeKind>,
{
    for path in paths {
        if let Some(node) = tree.node_mut(path) {
            if let Some(kind) = target(node) {
                if kind != node.kind {
                    *node = node.retyped(kind);
                }
            }
        }
    }
}

/// Touched textblocks that are not list items
fn free_textblocks(tree: &DocumentTree, selection: &Selection) -> Vec<Vec<usize>> {
    touched_textblocks(tree, selection)
        .into_iter()
        .filter(|path| {
            tree.node(path)
                .is_some_and(|node| node.kind != NodeKind::ListItem)
        })
        .collect()
}

/// Toggle the touched textblocks between `kind` and a plain paragraph.
///
/// Selected list items are lifted out of their lists before retyping, so
/// the toggle only reverts when no list item is involved.
fn toggle_block_kind(
    tree: &DocumentTree,
    selection: &Selection,
    kind: NodeKind,
) -> Result<CommandResult> {
    require_valid_selection(tree, selection)?;
    let targets = touched_textblocks(tree, selection);
    let active = targets
        .iter()
        .all(|path| tree.node(path).is_some_and(|node| node.kind == kind));
    let next = if active { NodeKind::Paragraph } else { kind };

    let ordinals: Vec<usize> = targets
        .iter()
        .filter_map(|path| tree.textblock_ordinal(path))
        .collect();
    let items: Vec<Vec<usize>> = targets
        .iter()
        .filter(|path| {
            tree.node(path)
                .is_some_and(|node| node.kind == NodeKind::ListItem)
        })
        .cloned()
        .collect();

    let mut new_tree = tree.clone();
    lift_out_of_lists(&mut new_tree, &items);
    let targets = paths_for_ordinals(&new_tree, &ordinals);
    retype_textblocks(&mut new_tree, &targets, |_| Some(next));
    let selection = remap_selection(tree, &new_tree, selection);
    finish(tree, new_tree, selection)
}

fn blockquote_of(tree: &DocumentTree, path: &[usize]) -> Option<Vec<usize>> {
    tree.find_ancestor(path, |node| node.kind == NodeKind::Blockquote)
}

/// Replace each node at `paths` by its children. Paths are processed from
/// last to first so earlier ones stay valid.
fn unwrap_nodes(tree: &mut DocumentTree, mut paths: Vec<Vec<usize>>) {
    paths.sort();
    paths.dedup();
    for path in paths.into_iter().rev() {
        let Some((&index, parent)) = path.split_last() else {
            continue;
        };
        let Some(siblings) = tree.children_at_mut(parent) else {
            continue;
        };
        if index >= siblings.len() {
            continue;
        }
        let node = siblings.remove(index);
        let inner = match node.content {
            Content::Blocks(children) => children,
            _ => Vec::new(),
        };
        siblings.splice(index..index, inner);
    }
}

/// Find the shared block parent of two textblocks and the sibling range
/// between them.
fn block_range(
    tree: &DocumentTree,
    from: &[usize],
    to: &[usize],
) -> Option<(Vec<usize>, usize, usize)> {
    let common = from.iter().zip(to).take_while(|(a, b)| a == b).count();
    let max = from.len().min(to.len()).checked_sub(1)?;
    let mut len = common.min(max);
    loop {
        let parent = &from[..len];
        if is_block_parent(tree, parent) {
            return Some((parent.to_vec(), from[len], to[len]));
        }
        len = len.checked_sub(1)?;
    }
}

fn paths_for_ordinals(tree: &DocumentTree, ordinals: &[usize]) -> Vec<Vec<usize>> {
    let paths = tree.textblock_paths();
    ordinals
        .iter()
        .filter_map(|&ordinal| paths.get(ordinal).cloned())
        .collect()
}

// =============================================================================
// Set Paragraph Command
// =============================================================================

/// Turn headings and code blocks in the selection into plain paragraphs
#[derive(Debug, Clone, Default)]
pub struct SetParagraph;

impl SetParagraph {
    pub fn new() -> Self {
        Self
    }
}

impl Command for SetParagraph {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        require_valid_selection(tree, selection)?;
        let targets = free_textblocks(tree, selection);
        let mut new_tree = tree.clone();
        retype_textblocks(&mut new_tree, &targets, |_| Some(NodeKind::Paragraph));
        finish(tree, new_tree, selection.clone())
    }

    fn display_name(&self) -> &str {
        "Paragraph"
    }
}

// =============================================================================
// Toggle Heading / Code Block Commands
// =============================================================================

/// Toggle a heading level on the selected blocks
#[derive(Debug, Clone)]
pub struct ToggleHeading {
    pub level: u8,
}

impl ToggleHeading {
    pub fn new(level: u8) -> Self {
        Self { level }
    }
}

impl Command for ToggleHeading {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        if !(1..=6).contains(&self.level) {
            return reject(RejectReason::InvalidArgument(format!(
                "heading level {} is outside 1..=6",
                self.level
            )));
        }
        toggle_block_kind(tree, selection, NodeKind::Heading(self.level))
    }

    fn display_name(&self) -> &str {
        "Heading"
    }
}

/// Toggle code block formatting. Code blocks carry no marks.
#[derive(Debug, Clone, Default)]
pub struct ToggleCodeBlock;

impl ToggleCodeBlock {
    pub fn new() -> Self {
        Self
    }
}

impl Command for ToggleCodeBlock {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        toggle_block_kind(tree, selection, NodeKind::CodeBlock)
    }

    fn display_name(&self) -> &str {
        "Code Block"
    }
}

// =============================================================================
// Toggle Blockquote Command
// =============================================================================

/// Wrap the selected blocks in a blockquote, or lift them out when every
/// selected block is already quoted
#[derive(Debug, Clone, Default)]
pub struct ToggleBlockquote;

impl ToggleBlockquote {
    pub fn new() -> Self {
        Self
    }
}

impl Command for ToggleBlockquote {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        require_valid_selection(tree, selection)?;
        let touched = touched_textblocks(tree, selection);
        let quotes: Vec<Option<Vec<usize>>> = touched
            .iter()
            .map(|path| blockquote_of(tree, path))
            .collect();

        let mut new_tree = tree.clone();
        if !quotes.is_empty() && quotes.iter().all(Option::is_some) {
            unwrap_nodes(&mut new_tree, quotes.into_iter().flatten().collect());
        } else {
            let from = &selection.from().path;
            let to = &selection.to().path;
            let (parent, start, end) = block_range(tree, from, to).ok_or_else(|| {
                RejectReason::InvalidSelection("selection has no common block parent".to_string())
            })?;
            let siblings = new_tree.children_at_mut(&parent).ok_or_else(|| {
                RejectReason::InvalidSelection(format!("no container at {parent:?}"))
            })?;
            let wrapped: Vec<Node> = siblings.drain(start..=end).collect();
            siblings.insert(start, Node::blockquote(wrapped));
        }

        let selection = remap_selection(tree, &new_tree, selection);
        finish(tree, new_tree, selection)
    }

    fn display_name(&self) -> &str {
        "Blockquote"
    }
}

// =============================================================================
// Text Alignment Commands
// =============================================================================

/// Set alignment on the selected paragraphs and headings
#[derive(Debug, Clone)]
pub struct SetTextAlign {
    pub align: Alignment,
}

impl SetTextAlign {
    pub fn new(align: Alignment) -> Self {
        Self { align }
    }
}

fn set_alignment(
    tree: &DocumentTree,
    selection: &Selection,
    align: Option<Alignment>,
) -> Result<CommandResult> {
    require_valid_selection(tree, selection)?;
    let targets: Vec<Vec<usize>> = touched_textblocks(tree, selection)
        .into_iter()
        .filter(|path| {
            tree.node(path)
                .is_some_and(|node| node.kind.accepts_alignment())
        })
        .collect();
    if targets.is_empty() {
        return reject(RejectReason::NotApplicable(
            "alignment applies to paragraphs and headings only".to_string(),
        ));
    }
    let mut new_tree = tree.clone();
    for path in &targets {
        if let Some(node) = new_tree.node_mut(path) {
            node.attrs.align = align;
        }
    }
    finish(tree, new_tree, selection.clone())
}

impl Command for SetTextAlign {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        set_alignment(tree, selection, Some(self.align))
    }

    fn display_name(&self) -> &str {
        match self.align {
            Alignment::Left => "Align Left",
            Alignment::Center => "Center",
            Alignment::Right => "Align Right",
            Alignment::Justify => "Justify",
        }
    }
}

/// Drop explicit alignment from the selected blocks
#[derive(Debug, Clone, Default)]
pub struct UnsetTextAlign;

impl UnsetTextAlign {
    pub fn new() -> Self {
        Self
    }
}

impl Command for UnsetTextAlign {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        set_alignment(tree, selection, None)
    }

    fn display_name(&self) -> &str {
        "Reset Alignment"
    }
}

// =============================================================================
// Clear Formatting Command
// =============================================================================

/// Strip all marks and revert every touched block to a plain paragraph:
/// list items are lifted, blockquotes unwrapped, alignment removed.
#[derive(Debug, Clone, Default)]
pub struct ClearFormatting;

impl ClearFormatting {
    pub fn new() -> Self {
        Self
    }
}

impl Command for ClearFormatting {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        require_valid_selection(tree, selection)?;
        let ranges = tree.text_ranges(selection);
        let touched: Vec<Vec<usize>> = ranges.iter().map(|range| range.path.clone()).collect();
        let ordinals: Vec<usize> = touched
            .iter()
            .filter_map(|path| tree.textblock_ordinal(path))
            .collect();

        let mut new_tree = tree.clone();
        for range in ranges.iter().filter(|range| !range.is_empty()) {
            if let Some(runs) = new_tree.node_mut(&range.path).and_then(|node| node.runs_mut()) {
                clear_marks_in_range(runs, range.start, range.end);
            }
        }

        retype_textblocks(&mut new_tree, &touched, |node| match node.kind {
            NodeKind::Heading(_) | NodeKind::CodeBlock => Some(NodeKind::Paragraph),
            _ => None,
        });
        for path in &touched {
            if let Some(node) = new_tree.node_mut(path) {
                node.attrs.align = None;
            }
        }

        let items: Vec<Vec<usize>> = touched
            .iter()
            .filter(|path| {
                new_tree
                    .node(path)
                    .is_some_and(|node| node.kind == NodeKind::ListItem)
            })
            .cloned()
            .collect();
        lift_out_of_lists(&mut new_tree, &items);

        // Each pass removes one level of quoting around the touched blocks.
        loop {
            let quotes: Vec<Vec<usize>> = paths_for_ordinals(&new_tree, &ordinals)
                .iter()
                .filter_map(|path| blockquote_of(&new_tree, path))
                .collect();
            if quotes.is_empty() {
                break;
            }
            unwrap_nodes(&mut new_tree, quotes);
        }

        let selection = remap_selection(tree, &new_tree, selection);
        finish(tree, new_tree, selection)
    }

    fn display_name(&self) -> &str {
        "Clear Formatting"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Mark, MarkSet, Position, TextRun};

    fn para(text: &str) -> Node {
        Node::paragraph(vec![TextRun::new(text)])
    }

    fn cursor(path: Vec<usize>, offset: usize) -> Selection {
        Selection::collapsed(Position::new(path, offset))
    }

    #[test]
    fn test_toggle_heading_on_and_off() {
        let tree = DocumentTree::from_blocks(vec![para("Title")]);
        let cmd = ToggleHeading::new(2);
        let on = cmd.apply(&tree, &cursor(vec![0], 1)).unwrap();
        assert_eq!(on.tree.blocks[0].kind, NodeKind::Heading(2));
        let off = cmd.apply(&on.tree, &on.selection).unwrap();
        assert_eq!(off.tree, tree);
    }

    #[test]
    fn test_heading_level_validated() {
        let tree = DocumentTree::from_blocks(vec![para("x")]);
        let err = ToggleHeading::new(7).apply(&tree, &cursor(vec![0], 0)).unwrap_err();
        assert!(matches!(
            err.reject_reason(),
            Some(RejectReason::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_mixed_selection_sets_heading() {
        let tree = DocumentTree::from_blocks(vec![
            Node::heading(1, vec![TextRun::new("a")]),
            para("b"),
        ]);
        let selection = Selection::new(Position::new(vec![0], 0), Position::new(vec![1], 1));
        let result = ToggleHeading::new(1).apply(&tree, &selection).unwrap();
        assert!(result
            .tree
            .blocks
            .iter()
            .all(|node| node.kind == NodeKind::Heading(1)));
    }

    #[test]
    fn test_code_block_strips_marks() {
        let bold = MarkSet::new().with(Mark::Bold);
        let tree = DocumentTree::from_blocks(vec![Node::paragraph(vec![
            TextRun::with_marks("let", bold),
            TextRun::new(" x"),
        ])]);
        let result = ToggleCodeBlock::new().apply(&tree, &cursor(vec![0], 0)).unwrap();
        let node = &result.tree.blocks[0];
        assert_eq!(node.kind, NodeKind::CodeBlock);
        assert_eq!(node.runs().unwrap(), &vec![TextRun::new("let x")]);
    }

    #[test]
    fn test_set_paragraph_without_change_rejected() {
        let tree = DocumentTree::from_blocks(vec![para("x")]);
        let err = SetParagraph::new().apply(&tree, &cursor(vec![0], 0)).unwrap_err();
        assert!(err.is_rejection());
    }

    #[test]
    fn test_blockquote_wraps_range_and_unwraps() {
        let tree = DocumentTree::from_blocks(vec![para("a"), para("b"), para("c")]);
        let selection = Selection::new(Position::new(vec![0], 0), Position::new(vec![1], 1));

        let wrapped = ToggleBlockquote::new().apply(&tree, &selection).unwrap();
        assert_eq!(wrapped.tree.blocks.len(), 2);
        assert_eq!(wrapped.tree.blocks[0].kind, NodeKind::Blockquote);
        assert_eq!(wrapped.selection.anchor, Position::new(vec![0, 0], 0));
        assert_eq!(wrapped.selection.head, Position::new(vec![0, 1], 1));

        let unwrapped = ToggleBlockquote::new()
            .apply(&wrapped.tree, &wrapped.selection)
            .unwrap();
        assert_eq!(unwrapped.tree, tree);
        assert_eq!(unwrapped.selection, selection);
    }

    #[test]
    fn test_blockquote_wraps_whole_list() {
        let tree = DocumentTree::from_blocks(vec![Node::list(
            false,
            vec![
                Node::list_item(0, vec![TextRun::new("a")]),
                Node::list_item(0, vec![TextRun::new("b")]),
            ],
        )]);
        let result = ToggleBlockquote::new()
            .apply(&tree, &cursor(vec![0, 1], 0))
            .unwrap();
        assert_eq!(result.tree.blocks[0].kind, NodeKind::Blockquote);
        assert_eq!(result.selection.head.path, vec![0, 0, 1]);
    }

    #[test]
    fn test_heading_lifts_list_item() {
        let tree = DocumentTree::from_blocks(vec![Node::list(
            true,
            vec![
                Node::list_item(0, vec![TextRun::new("a")]),
                Node::list_item(1, vec![TextRun::new("b")]),
                Node::list_item(0, vec![TextRun::new("c")]),
            ],
        )]);
        let cmd = ToggleHeading::new(2);
        let on = cmd.apply(&tree, &cursor(vec![0, 1], 1)).unwrap();
        let kinds: Vec<NodeKind> = on.tree.blocks.iter().map(|node| node.kind).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::OrderedList, NodeKind::Heading(2), NodeKind::OrderedList]
        );
        assert_eq!(on.tree.plain_text(), "a\n\nb\n\nc");
        assert_eq!(on.selection, cursor(vec![1], 1));

        let off = cmd.apply(&on.tree, &on.selection).unwrap();
        assert_eq!(off.tree.blocks[1].kind, NodeKind::Paragraph);

        let code = ToggleCodeBlock::new()
            .apply(&tree, &cursor(vec![0, 2], 0))
            .unwrap();
        assert_eq!(code.tree.blocks[1].kind, NodeKind::CodeBlock);
        assert_eq!(code.tree.blocks.len(), 2);
    }

    #[test]
    fn test_alignment_skips_list_items() {
        let tree = DocumentTree::from_blocks(vec![
            para("a"),
            Node::list(false, vec![Node::list_item(0, vec![TextRun::new("b")])]),
        ]);
        let selection = Selection::new(Position::new(vec![0], 0), Position::new(vec![1, 0], 1));
        let result = SetTextAlign::new(Alignment::Center)
            .apply(&tree, &selection)
            .unwrap();
        assert_eq!(result.tree.blocks[0].attrs.align, Some(Alignment::Center));

        let err = SetTextAlign::new(Alignment::Center)
            .apply(&tree, &cursor(vec![1, 0], 0))
            .unwrap_err();
        assert!(err.is_rejection());
    }

    #[test]
    fn test_clear_formatting_flattens_everything() {
        let bold = MarkSet::new().with(Mark::Bold);
        let tree = DocumentTree::from_blocks(vec![
            Node::heading(1, vec![TextRun::with_marks("Head", bold.clone())])
                .with_align(Alignment::Right),
            Node::blockquote(vec![Node::list(
                true,
                vec![Node::list_item(0, vec![TextRun::with_marks("item", bold)])],
            )]),
        ]);
        let selection = Selection::new(Position::new(vec![0], 0), Position::new(vec![1, 0, 0], 4));
        let result = ClearFormatting::new().apply(&tree, &selection).unwrap();

        let expected = DocumentTree::from_blocks(vec![para("Head"), para("item")]);
        assert_eq!(result.tree, expected);
        assert_eq!(result.selection.head, Position::new(vec![1], 4));
    }
}
