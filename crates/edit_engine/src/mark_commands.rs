//! Inline mark commands: toggle, set and unset

use crate::command::{finish, reject, require_valid_selection};
use crate::{Command, CommandResult, RejectReason, Result};
use doc_model::{
    map_marks_in_range, mark_range_at, range_all, DocumentTree, Mark, MarkSet, MarkType, NodeKind,
    Selection, TextRange,
};

/// Non-empty ranges of the selection that may carry marks
fn markable_ranges(tree: &DocumentTree, selection: &Selection) -> Result<Vec<TextRange>> {
    require_valid_selection(tree, selection)?;
    if selection.is_collapsed() {
        return reject(RejectReason::EmptySelection);
    }
    let ranges: Vec<TextRange> = tree
        .text_ranges(selection)
        .into_iter()
        .filter(|range| !range.is_empty())
        .filter(|range| {
            tree.node(&range.path)
                .is_some_and(|node| node.kind != NodeKind::CodeBlock)
        })
        .collect();
    if ranges.is_empty() {
        return reject(RejectReason::NotApplicable(
            "no markable text in selection".to_string(),
        ));
    }
    Ok(ranges)
}

/// Reject valued marks the markup cannot carry.
///
/// Color, highlight and font values are written into an inline `style`
/// attribute, so they must not contain its declaration delimiters.
fn check_mark_value(mark: &Mark) -> Result<()> {
    let Some(value) = mark.value() else {
        return Ok(());
    };
    if value.trim().is_empty() {
        return reject(RejectReason::InvalidArgument(
            "mark value must not be empty".to_string(),
        ));
    }
    let styled = matches!(
        mark.mark_type(),
        MarkType::TextColor | MarkType::Highlight | MarkType::FontFamily
    );
    if styled && value.contains([';', ':']) {
        return reject(RejectReason::InvalidArgument(format!(
            "mark value {value:?} must not contain ';' or ':'"
        )));
    }
    Ok(())
}

fn apply_to_ranges<F>(tree: &mut DocumentTree, ranges: &[TextRange], mut f: F)
where
    F: FnMut(&mut MarkSet),
{
    for range in ranges {
        if let Some(runs) = tree.node_mut(&range.path).and_then(|node| node.runs_mut()) {
            map_marks_in_range(runs, range.start, range.end, &mut f);
        }
    }
}

/// Whether `pred` holds on every character of every range
pub(crate) fn ranges_all<P>(tree: &DocumentTree, ranges: &[TextRange], pred: P) -> bool
where
    P: Fn(&MarkSet) -> bool,
{
    !ranges.is_empty()
        && ranges.iter().all(|range| {
            tree.node(&range.path)
                .and_then(|node| node.runs())
                .is_some_and(|runs| range_all(runs, range.start, range.end, &pred))
        })
}

// =============================================================================
// Toggle Mark Command
// =============================================================================

/// Toggle a mark over the selection.
///
/// When the exact mark already covers the whole selection it is removed,
/// otherwise it is applied to all of it.
#[derive(Debug, Clone)]
pub struct ToggleMark {
    pub mark: Mark,
}

impl ToggleMark {
    pub fn new(mark: Mark) -> Self {
        Self { mark }
    }
}

impl Command for ToggleMark {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        check_mark_value(&self.mark)?;
        let ranges = markable_ranges(tree, selection)?;
        let active = ranges_all(tree, &ranges, |marks| marks.contains(&self.mark));

        let mut new_tree = tree.clone();
        let mark_type = self.mark.mark_type();
        if active {
            apply_to_ranges(&mut new_tree, &ranges, |marks| {
                marks.remove(mark_type);
            });
        } else {
            apply_to_ranges(&mut new_tree, &ranges, |marks| marks.insert(self.mark.clone()));
        }
        finish(tree, new_tree, selection.clone())
    }

    fn display_name(&self) -> &str {
        match self.mark.mark_type() {
            MarkType::Bold => "Bold",
            MarkType::Italic => "Italic",
            MarkType::Underline => "Underline",
            MarkType::Strike => "Strikethrough",
            MarkType::Subscript => "Subscript",
            MarkType::Superscript => "Superscript",
            MarkType::TextColor => "Text Color",
            MarkType::Highlight => "Highlight",
            MarkType::Link => "Link",
            MarkType::FontFamily => "Font",
        }
    }
}

// =============================================================================
// Set Mark Command
// =============================================================================

/// Apply a mark over the selection, replacing any value of the same type
#[derive(Debug, Clone)]
pub struct SetMark {
    pub mark: Mark,
}

impl SetMark {
    pub fn new(mark: Mark) -> Self {
        Self { mark }
    }
}

impl Command for SetMark {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        check_mark_value(&self.mark)?;
        let ranges = markable_ranges(tree, selection)?;
        let mut new_tree = tree.clone();
        apply_to_ranges(&mut new_tree, &ranges, |marks| marks.insert(self.mark.clone()));
        finish(tree, new_tree, selection.clone())
    }

    fn display_name(&self) -> &str {
        "Set Format"
    }
}

// =============================================================================
// Unset Mark Command
// =============================================================================

/// Remove every mark of one type from the selection.
///
/// On a cursor the command extends to the contiguous stretch carrying the
/// mark around it.
#[derive(Debug, Clone)]
pub struct UnsetMark {
    pub mark_type: MarkType,
}

impl UnsetMark {
    pub fn new(mark_type: MarkType) -> Self {
        Self { mark_type }
    }
}

impl Command for UnsetMark {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        require_valid_selection(tree, selection)?;
        let ranges = if selection.is_collapsed() {
            let head = &selection.head;
            let (start, end) = tree
                .node(&head.path)
                .and_then(|node| node.runs())
                .and_then(|runs| mark_range_at(runs, head.offset, self.mark_type))
                .ok_or(RejectReason::MarkNotActive)?;
            vec![TextRange {
                path: head.path.clone(),
                start,
                end,
            }]
        } else {
            markable_ranges(tree, selection)?
        };

        let mut new_tree = tree.clone();
        apply_to_ranges(&mut new_tree, &ranges, |marks| {
            marks.remove(self.mark_type);
        });
        if new_tree == *tree {
            return reject(RejectReason::MarkNotActive);
        }
        finish(tree, new_tree, selection.clone())
    }

    fn display_name(&self) -> &str {
        "Remove Format"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Node, Position, TextRun};

    fn sample() -> DocumentTree {
        DocumentTree::from_blocks(vec![
            Node::paragraph(vec![TextRun::new("hello world")]),
            Node::code_block("code"),
        ])
    }

    fn select(path: Vec<usize>, start: usize, end: usize) -> Selection {
        Selection::new(Position::new(path.clone(), start), Position::new(path, end))
    }

    #[test]
    fn test_toggle_bold_twice_restores() {
        let tree = sample();
        let selection = select(vec![0], 0, 5);
        let cmd = ToggleMark::new(Mark::Bold);

        let once = cmd.apply(&tree, &selection).unwrap();
        let runs = once.tree.node(&[0]).unwrap().runs().unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs[0].marks.has_type(MarkType::Bold));

        let twice = cmd.apply(&once.tree, &once.selection).unwrap();
        assert_eq!(twice.tree, tree);
    }

    #[test]
    fn test_partial_coverage_applies() {
        let tree = sample();
        let bolded = ToggleMark::new(Mark::Bold)
            .apply(&tree, &select(vec![0], 0, 5))
            .unwrap()
            .tree;
        let result = ToggleMark::new(Mark::Bold)
            .apply(&bolded, &select(vec![0], 3, 8))
            .unwrap();
        let runs = result.tree.node(&[0]).unwrap().runs().unwrap();
        assert_eq!(runs[0].text, "hello wo");
        assert!(runs[0].marks.has_type(MarkType::Bold));
    }

    #[test]
    fn test_superscript_clears_subscript() {
        let tree = sample();
        let sub = ToggleMark::new(Mark::Subscript)
            .apply(&tree, &select(vec![0], 0, 11))
            .unwrap()
            .tree;
        let sup = ToggleMark::new(Mark::Superscript)
            .apply(&sub, &select(vec![0], 0, 11))
            .unwrap()
            .tree;
        let runs = sup.node(&[0]).unwrap().runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert!(runs[0].marks.has_type(MarkType::Superscript));
        assert!(!runs[0].marks.has_type(MarkType::Subscript));
    }

    #[test]
    fn test_collapsed_toggle_rejected() {
        let tree = sample();
        let err = ToggleMark::new(Mark::Italic)
            .apply(&tree, &select(vec![0], 2, 2))
            .unwrap_err();
        assert_eq!(err.reject_reason(), Some(&RejectReason::EmptySelection));
    }

    #[test]
    fn test_code_block_not_markable() {
        let tree = sample();
        let err = ToggleMark::new(Mark::Bold)
            .apply(&tree, &select(vec![1], 0, 4))
            .unwrap_err();
        assert!(matches!(
            err.reject_reason(),
            Some(RejectReason::NotApplicable(_))
        ));
    }

    #[test]
    fn test_set_color_replaces_value() {
        let tree = sample();
        let red = SetMark::new(Mark::TextColor("#ff0000".into()))
            .apply(&tree, &select(vec![0], 0, 11))
            .unwrap()
            .tree;
        let blue = SetMark::new(Mark::TextColor("#0000ff".into()))
            .apply(&red, &select(vec![0], 0, 5))
            .unwrap()
            .tree;
        let runs = blue.node(&[0]).unwrap().runs().unwrap();
        assert!(runs[0].marks.contains(&Mark::TextColor("#0000ff".into())));
        assert!(runs[1].marks.contains(&Mark::TextColor("#ff0000".into())));
    }

    #[test]
    fn test_set_mark_rejects_style_delimiters() {
        let tree = sample();
        let selection = select(vec![0], 0, 5);
        for mark in [
            Mark::FontFamily("Arial; color: red".into()),
            Mark::TextColor("red:blue".into()),
            Mark::Highlight("#ffff00;".into()),
        ] {
            let err = SetMark::new(mark.clone()).apply(&tree, &selection).unwrap_err();
            assert!(matches!(
                err.reject_reason(),
                Some(RejectReason::InvalidArgument(_))
            ));
            let err = ToggleMark::new(mark).apply(&tree, &selection).unwrap_err();
            assert!(matches!(
                err.reject_reason(),
                Some(RejectReason::InvalidArgument(_))
            ));
        }

        // Link targets live in href, where colons are expected
        let linked = SetMark::new(Mark::Link("https://law.test/a;b".into()))
            .apply(&tree, &selection)
            .unwrap();
        let runs = linked.tree.node(&[0]).unwrap().runs().unwrap();
        assert!(runs[0]
            .marks
            .contains(&Mark::Link("https://law.test/a;b".into())));
    }

    #[test]
    fn test_unset_on_cursor_extends() {
        let link = MarkSet::new().with(Mark::Link("https://a.test".into()));
        let tree = DocumentTree::from_blocks(vec![Node::paragraph(vec![
            TextRun::new("go "),
            TextRun::with_marks("here", link),
            TextRun::new(" now"),
        ])]);
        let result = UnsetMark::new(MarkType::Link)
            .apply(&tree, &select(vec![0], 5, 5))
            .unwrap();
        assert_eq!(result.tree.node(&[0]).unwrap().runs().unwrap().len(), 1);

        let err = UnsetMark::new(MarkType::Link)
            .apply(&result.tree, &select(vec![0], 1, 1))
            .unwrap_err();
        assert_eq!(err.reject_reason(), Some(&RejectReason::MarkNotActive));
    }
}
