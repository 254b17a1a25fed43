//! Active-state queries for toolbar controls
//!
//! Everything here is read-only: queries inspect a tree and selection and
//! never touch history.

use crate::command::touched_textblocks;
use crate::Command;
use doc_model::{
    marks_at_cursor, range_all, Alignment, DocumentTree, Mark, MarkSet, MarkType, Node, NodeKind,
    Selection,
};
use serde::{Deserialize, Serialize};

/// Something a toolbar control can show as active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ActiveQuery {
    /// Any mark of this type
    Mark(MarkType),
    /// This exact mark, value included
    MarkValue(Mark),
    Paragraph,
    Heading(u8),
    CodeBlock,
    BulletList,
    OrderedList,
    Blockquote,
    Table,
    Align(Alignment),
}

/// Whether `query` holds for the selection.
///
/// Marks over a range must cover every selected character; on a cursor the
/// character before it decides, or the one after at the start of a block.
/// Block queries must hold for every touched textblock.
pub fn is_active(tree: &DocumentTree, selection: &Selection, query: &ActiveQuery) -> bool {
    if !tree.is_valid_position(&selection.anchor) || !tree.is_valid_position(&selection.head) {
        return false;
    }
    match query {
        ActiveQuery::Mark(mark_type) => {
            mark_active(tree, selection, |marks| marks.has_type(*mark_type))
        }
        ActiveQuery::MarkValue(mark) => mark_active(tree, selection, |marks| marks.contains(mark)),
        ActiveQuery::Paragraph => has_kind(tree, selection, NodeKind::Paragraph),
        ActiveQuery::Heading(level) => has_kind(tree, selection, NodeKind::Heading(*level)),
        ActiveQuery::CodeBlock => has_kind(tree, selection, NodeKind::CodeBlock),
        ActiveQuery::BulletList => in_list(tree, selection, NodeKind::BulletList),
        ActiveQuery::OrderedList => in_list(tree, selection, NodeKind::OrderedList),
        ActiveQuery::Blockquote => all_blocks(tree, selection, |path, _| {
            tree.find_ancestor(path, |node| node.kind == NodeKind::Blockquote)
                .is_some()
        }),
        ActiveQuery::Table => tree
            .find_ancestor(&selection.head.path, Node::is_cell)
            .is_some(),
        ActiveQuery::Align(align) => {
            let alignable: Vec<&Node> = touched_textblocks(tree, selection)
                .iter()
                .filter_map(|path| tree.node(path))
                .filter(|node| node.kind.accepts_alignment())
                .collect();
            !alignable.is_empty()
                && alignable
                    .iter()
                    .all(|node| node.attrs.align == Some(*align))
        }
    }
}

/// Dry run of a command; nothing is mutated
pub fn can_execute(tree: &DocumentTree, selection: &Selection, command: &dyn Command) -> bool {
    command.apply(tree, selection).is_ok()
}

fn mark_active<P>(tree: &DocumentTree, selection: &Selection, pred: P) -> bool
where
    P: Fn(&MarkSet) -> bool,
{
    let ranges: Vec<_> = tree
        .text_ranges(selection)
        .into_iter()
        .filter(|range| !range.is_empty())
        .collect();

    if ranges.is_empty() {
        let head = &selection.head;
        return tree
            .node(&head.path)
            .and_then(Node::runs)
            .and_then(|runs| marks_at_cursor(runs, head.offset))
            .is_some_and(pred);
    }
    ranges.iter().all(|range| {
        tree.node(&range.path)
            .and_then(Node::runs)
            .is_some_and(|runs| range_all(runs, range.start, range.end, &pred))
    })
}

fn all_blocks<P>(tree: &DocumentTree, selection: &Selection, pred: P) -> bool
where
    P: Fn(&[usize], &Node) -> bool,
{
    let touched = touched_textblocks(tree, selection);
    !touched.is_empty()
        && touched
            .iter()
            .all(|path| tree.node(path).is_some_and(|node| pred(path, node)))
}

fn has_kind(tree: &DocumentTree, selection: &Selection, kind: NodeKind) -> bool {
    all_blocks(tree, selection, |_, node| node.kind == kind)
}

fn in_list(tree: &DocumentTree, selection: &Selection, kind: NodeKind) -> bool {
    all_blocks(tree, selection, |path, node| {
        node.kind == NodeKind::ListItem
            && path
                .split_last()
                .and_then(|(_, parent)| tree.node(parent))
                .is_some_and(|list| list.kind == kind)
    })
}
