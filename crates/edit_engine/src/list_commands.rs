//! List commands for toggling, indenting, and outdenting lists
//!
//! Lists are flat: every item carries its own depth. Indenting an item moves
//! its whole subtree (the following items that are deeper than it) along.

use crate::command::{
    finish, is_block_parent, reject, remap_selection, require_valid_selection, touched_textblocks,
};
use crate::{Command, CommandResult, RejectReason, Result};
use doc_model::{Content, DocumentTree, Node, NodeKind, Selection, MAX_LIST_DEPTH};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// Helper Functions
// =============================================================================

fn list_kind(ordered: bool) -> NodeKind {
    if ordered {
        NodeKind::OrderedList
    } else {
        NodeKind::BulletList
    }
}

fn take_items(list: Node) -> Vec<Node> {
    match list.content {
        Content::Blocks(items) => items,
        _ => Vec::new(),
    }
}

/// Build a list from a run of items, shifting depths so the shallowest
/// item sits at the top level
fn rebased_list(kind: NodeKind, class: Option<String>, mut items: Vec<Node>) -> Node {
    let base = items.iter().map(|item| item.attrs.depth).min().unwrap_or(0);
    for item in &mut items {
        item.attrs.depth -= base;
    }
    let mut list = Node::list(kind == NodeKind::OrderedList, items);
    list.attrs.class = class;
    list
}

/// Turn the list items at `item_paths` into paragraphs, splitting their
/// lists around them. Textblock order is preserved.
pub(crate) fn lift_out_of_lists(tree: &mut DocumentTree, item_paths: &[Vec<usize>]) {
    let mut groups: BTreeMap<Vec<usize>, BTreeSet<usize>> = BTreeMap::new();
    for path in item_paths {
        if let Some((&index, list_path)) = path.split_last() {
            groups.entry(list_path.to_vec()).or_default().insert(index);
        }
    }

    for (list_path, lifted) in groups.into_iter().rev() {
        let Some((&list_index, parent)) = list_path.split_last() else {
            continue;
        };
        let Some(siblings) = tree.children_at_mut(parent) else {
            continue;
        };
        if siblings.get(list_index).map_or(true, |node| !node.is_list()) {
            continue;
        }
        let list = siblings.remove(list_index);
        let kind = list.kind;
        let class = list.attrs.class.clone();

        let mut replacement = Vec::new();
        let mut pending = Vec::new();
        for (index, item) in take_items(list).into_iter().enumerate() {
            if lifted.contains(&index) {
                if !pending.is_empty() {
                    let items = std::mem::take(&mut pending);
                    replacement.push(rebased_list(kind, class.clone(), items));
                }
                replacement.push(item.retyped(NodeKind::Paragraph));
            } else {
                pending.push(item);
            }
        }
        if !pending.is_empty() {
            replacement.push(rebased_list(kind, class, pending));
        }
        siblings.splice(list_index..list_index, replacement);
    }
}

/// The list holding the selection and the selected item index range.
///
/// Both ends must be items of the same list.
fn selected_items(tree: &DocumentTree, selection: &Selection) -> Result<(Vec<usize>, usize, usize)> {
    require_valid_selection(tree, selection)?;
    let from = &selection.from().path;
    let to = &selection.to().path;
    let is_item = |path: &[usize]| {
        tree.node(path)
            .is_some_and(|node| node.kind == NodeKind::ListItem)
    };
    if !is_item(from) || !is_item(to) || from[..from.len() - 1] != to[..to.len() - 1] {
        return reject(RejectReason::NotInList);
    }
    let list_path = from[..from.len() - 1].to_vec();
    Ok((list_path, from[from.len() - 1], to[to.len() - 1]))
}

/// Extend an item range over the subtree hanging below its last items
fn subtree_end(items: &[Node], start: usize, end: usize) -> (usize, usize) {
    let min_depth = items[start..=end]
        .iter()
        .map(|item| item.attrs.depth)
        .min()
        .unwrap_or(0);
    let mut last = end;
    while items
        .get(last + 1)
        .is_some_and(|item| item.attrs.depth > min_depth)
    {
        last += 1;
    }
    (min_depth, last)
}

fn toggle_list(tree: &DocumentTree, selection: &Selection, ordered: bool) -> Result<CommandResult> {
    require_valid_selection(tree, selection)?;
    let target = list_kind(ordered);
    let touched = touched_textblocks(tree, selection);
    let parent_kind = |path: &[usize]| {
        path.split_last()
            .and_then(|(_, parent)| tree.node(parent))
            .map(|node| node.kind)
    };
    let is_item = |path: &Vec<usize>| {
        tree.node(path)
            .is_some_and(|node| node.kind == NodeKind::ListItem)
    };

    let mut new_tree = tree.clone();
    let all_in_target = touched
        .iter()
        .all(|path| is_item(path) && parent_kind(path) == Some(target));

    if all_in_target {
        lift_out_of_lists(&mut new_tree, &touched);
    } else {
        // Lists touched by the selection switch kind; free blocks become
        // single-item lists that merge with their neighbours below.
        let mut involved: BTreeMap<Vec<usize>, BTreeSet<usize>> = BTreeMap::new();
        for path in &touched {
            if is_item(path) {
                let list_path = &path[..path.len() - 1];
                if let Some(list) = new_tree.node_mut(list_path) {
                    list.kind = target;
                }
                if let Some((&index, parent)) = list_path.split_last() {
                    involved.entry(parent.to_vec()).or_default().insert(index);
                }
            } else if let Some((&index, parent)) = path.split_last() {
                if !is_block_parent(tree, parent) {
                    continue;
                }
                if let Some(node) = new_tree.node_mut(path) {
                    let item = node.retyped(NodeKind::ListItem);
                    *node = Node::list(ordered, vec![item]);
                }
                involved.entry(parent.to_vec()).or_default().insert(index);
            }
        }
        for (parent, indices) in involved.iter().rev() {
            if let Some(siblings) = new_tree.children_at_mut(parent) {
                merge_adjacent_lists(siblings, target, indices);
            }
        }
    }

    let selection = remap_selection(tree, &new_tree, selection);
    finish(tree, new_tree, selection)
}

/// Merge neighbouring lists of `kind` when at least one of them was touched
fn merge_adjacent_lists(siblings: &mut Vec<Node>, kind: NodeKind, involved: &BTreeSet<usize>) {
    let mut involved: BTreeSet<usize> = involved.clone();
    let mut index = siblings.len();
    while index > 1 {
        index -= 1;
        let mergeable = siblings[index].kind == kind
            && siblings[index - 1].kind == kind
            && (involved.contains(&index) || involved.contains(&(index - 1)));
        if !mergeable {
            continue;
        }
        let next = siblings.remove(index);
        if let Some(items) = siblings[index - 1].children_mut() {
            items.extend(take_items(next));
        }
        involved.insert(index - 1);
    }
}

// =============================================================================
// Toggle List Commands
// =============================================================================

/// Toggle a bullet list over the selected blocks
#[derive(Debug, Clone, Default)]
pub struct ToggleBulletList;

impl ToggleBulletList {
    pub fn new() -> Self {
        Self
    }
}

impl Command for ToggleBulletList {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        toggle_list(tree, selection, false)
    }

    fn display_name(&self) -> &str {
        "Bullet List"
    }
}

/// Toggle a numbered list over the selected blocks
#[derive(Debug, Clone, Default)]
pub struct ToggleOrderedList;

impl ToggleOrderedList {
    pub fn new() -> Self {
        Self
    }
}

impl Command for ToggleOrderedList {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        toggle_list(tree, selection, true)
    }

    fn display_name(&self) -> &str {
        "Numbered List"
    }
}

// =============================================================================
// Sink / Lift List Item Commands
// =============================================================================

/// Nest the selected items one level under their preceding sibling
#[derive(Debug, Clone, Default)]
pub struct SinkListItem;

impl SinkListItem {
    pub fn new() -> Self {
        Self
    }
}

impl Command for SinkListItem {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        let (list_path, start, end) = selected_items(tree, selection)?;
        let items = tree
            .node(&list_path)
            .and_then(Node::children)
            .ok_or(RejectReason::NotInList)?;

        let first_depth = items[start].attrs.depth;
        let has_parent = start > 0 && items[start - 1].attrs.depth >= first_depth;
        if !has_parent {
            return reject(RejectReason::NoPrecedingSibling);
        }
        let (_, last) = subtree_end(items, start, end);
        let deepest = items[start..=last]
            .iter()
            .map(|item| item.attrs.depth)
            .max()
            .unwrap_or(0);
        if deepest + 1 > MAX_LIST_DEPTH {
            return reject(RejectReason::MaxDepthExceeded);
        }

        let mut new_tree = tree.clone();
        if let Some(items) = new_tree.node_mut(&list_path).and_then(Node::children_mut) {
            for item in &mut items[start..=last] {
                item.attrs.depth += 1;
            }
        }
        finish(tree, new_tree, selection.clone())
    }

    fn display_name(&self) -> &str {
        "Increase Indent"
    }
}

/// Move the selected items one level up
#[derive(Debug, Clone, Default)]
pub struct LiftListItem;

impl LiftListItem {
    pub fn new() -> Self {
        Self
    }
}

impl Command for LiftListItem {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        let (list_path, start, end) = selected_items(tree, selection)?;
        let items = tree
            .node(&list_path)
            .and_then(Node::children)
            .ok_or(RejectReason::NotInList)?;

        let (min_depth, last) = subtree_end(items, start, end);
        if min_depth == 0 {
            return reject(RejectReason::AtTopLevel);
        }

        let mut new_tree = tree.clone();
        if let Some(items) = new_tree.node_mut(&list_path).and_then(Node::children_mut) {
            for item in &mut items[start..=last] {
                item.attrs.depth -= 1;
            }
        }
        finish(tree, new_tree, selection.clone())
    }

    fn display_name(&self) -> &str {
        "Decrease Indent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Position, TextRun};

    fn para(text: &str) -> Node {
        Node::paragraph(vec![TextRun::new(text)])
    }

    fn item(depth: usize, text: &str) -> Node {
        Node::list_item(depth, vec![TextRun::new(text)])
    }

    fn cursor(path: Vec<usize>) -> Selection {
        Selection::collapsed(Position::new(path, 0))
    }

    fn depths(tree: &DocumentTree, list: usize) -> Vec<usize> {
        tree.blocks[list]
            .children()
            .unwrap()
            .iter()
            .map(|item| item.attrs.depth)
            .collect()
    }

    #[test]
    fn test_toggle_bullet_list_round_trip() {
        let tree = DocumentTree::from_blocks(vec![para("a"), para("b")]);
        let selection = Selection::new(Position::new(vec![0], 0), Position::new(vec![1], 1));

        let on = ToggleBulletList::new().apply(&tree, &selection).unwrap();
        assert_eq!(on.tree.blocks.len(), 1);
        assert_eq!(on.tree.blocks[0].kind, NodeKind::BulletList);
        assert_eq!(on.selection.head, Position::new(vec![0, 1], 1));

        let off = ToggleBulletList::new().apply(&on.tree, &on.selection).unwrap();
        assert_eq!(off.tree, tree);
        assert_eq!(off.selection, selection);
    }

    #[test]
    fn test_toggle_other_kind_switches() {
        let tree = DocumentTree::from_blocks(vec![Node::list(false, vec![item(0, "a"), item(1, "b")])]);
        let result = ToggleOrderedList::new().apply(&tree, &cursor(vec![0, 0])).unwrap();
        assert_eq!(result.tree.blocks[0].kind, NodeKind::OrderedList);
        assert_eq!(depths(&result.tree, 0), vec![0, 1]);
    }

    #[test]
    fn test_new_list_joins_neighbour() {
        let tree = DocumentTree::from_blocks(vec![
            Node::list(false, vec![item(0, "a")]),
            para("b"),
        ]);
        let result = ToggleBulletList::new().apply(&tree, &cursor(vec![1])).unwrap();
        assert_eq!(result.tree.blocks.len(), 1);
        assert_eq!(result.tree.blocks[0].children().unwrap().len(), 2);
        assert_eq!(result.selection.head.path, vec![0, 1]);
    }

    #[test]
    fn test_lift_middle_item_splits_list() {
        let tree = DocumentTree::from_blocks(vec![Node::list(
            true,
            vec![item(0, "a"), item(0, "b"), item(1, "c"), item(1, "d")],
        )]);
        let result = ToggleOrderedList::new().apply(&tree, &cursor(vec![0, 1])).unwrap();
        let kinds: Vec<NodeKind> = result.tree.blocks.iter().map(|node| node.kind).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::OrderedList, NodeKind::Paragraph, NodeKind::OrderedList]
        );
        assert_eq!(depths(&result.tree, 2), vec![0, 0]);
    }

    #[test]
    fn test_sink_moves_subtree() {
        let tree = DocumentTree::from_blocks(vec![Node::list(
            false,
            vec![item(0, "a"), item(0, "b"), item(1, "c"), item(0, "d")],
        )]);
        let result = SinkListItem::new().apply(&tree, &cursor(vec![0, 1])).unwrap();
        assert_eq!(depths(&result.tree, 0), vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_sink_then_lift_restores() {
        let tree = DocumentTree::from_blocks(vec![Node::list(
            false,
            vec![item(0, "a"), item(0, "b"), item(1, "c")],
        )]);
        let sunk = SinkListItem::new().apply(&tree, &cursor(vec![0, 1])).unwrap();
        let lifted = LiftListItem::new().apply(&sunk.tree, &sunk.selection).unwrap();
        assert_eq!(lifted.tree, tree);
    }

    #[test]
    fn test_sink_first_item_rejected() {
        let tree = DocumentTree::from_blocks(vec![Node::list(false, vec![item(0, "a"), item(0, "b")])]);
        let err = SinkListItem::new().apply(&tree, &cursor(vec![0, 0])).unwrap_err();
        assert_eq!(err.reject_reason(), Some(&RejectReason::NoPrecedingSibling));
    }

    #[test]
    fn test_sink_beyond_max_depth_rejected() {
        let items: Vec<Node> = (0..=MAX_LIST_DEPTH)
            .map(|depth| item(depth, "x"))
            .chain(std::iter::once(item(MAX_LIST_DEPTH, "y")))
            .collect();
        let tree = DocumentTree::from_blocks(vec![Node::list(false, items)]);
        let last = MAX_LIST_DEPTH + 1;
        let err = SinkListItem::new().apply(&tree, &cursor(vec![0, last])).unwrap_err();
        assert_eq!(err.reject_reason(), Some(&RejectReason::MaxDepthExceeded));
    }

    #[test]
    fn test_lift_top_level_rejected() {
        let tree = DocumentTree::from_blocks(vec![Node::list(false, vec![item(0, "a")])]);
        let err = LiftListItem::new().apply(&tree, &cursor(vec![0, 0])).unwrap_err();
        assert_eq!(err.reject_reason(), Some(&RejectReason::AtTopLevel));
    }

    #[test]
    fn test_sink_outside_list_rejected() {
        let tree = DocumentTree::from_blocks(vec![para("a")]);
        let err = SinkListItem::new().apply(&tree, &cursor(vec![0])).unwrap_err();
        assert_eq!(err.reject_reason(), Some(&RejectReason::NotInList));
    }
}
