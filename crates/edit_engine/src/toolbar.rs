//! Toolbar actions
//!
//! The serializable surface a UI drives the engine through. Each action
//! maps to one command (or to undo/redo) and, where it makes sense, to the
//! query that lights up its button.

use crate::{
    ActiveQuery, AddColumn, AddRow, ClearFormatting, Command, DeleteColumn, DeleteRow,
    DeleteTable, EditingEngine, InsertHorizontalRule, InsertImage, InsertTable, LiftListItem,
    ReplaceText, Result, SetLink, SetMark, SetParagraph, SetTextAlign, SinkListItem,
    ToggleBlockquote, ToggleBulletList, ToggleCodeBlock, ToggleHeading, ToggleMark,
    ToggleOrderedList, UnsetLink, UnsetMark, UnsetTextAlign,
};
use doc_model::{Alignment, Mark, MarkType};
use serde::{Deserialize, Serialize};

fn default_table_size() -> usize {
    3
}

fn default_true() -> bool {
    true
}

/// A toolbar or keyboard action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "args", rename_all = "camelCase")]
pub enum ToolbarAction {
    ToggleBold,
    ToggleItalic,
    ToggleUnderline,
    ToggleStrike,
    ToggleSubscript,
    ToggleSuperscript,
    SetTextColor {
        color: String,
    },
    UnsetTextColor,
    SetHighlight {
        color: String,
    },
    UnsetHighlight,
    SetFontFamily {
        family: String,
    },
    UnsetFontFamily,
    SetLink {
        href: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    UnsetLink,
    SetParagraph,
    ToggleHeading {
        level: u8,
    },
    ToggleCodeBlock,
    ToggleBulletList,
    ToggleOrderedList,
    ToggleBlockquote,
    SinkListItem,
    LiftListItem,
    SetTextAlign {
        align: Alignment,
    },
    UnsetTextAlign,
    InsertTable {
        #[serde(default = "default_table_size")]
        rows: usize,
        #[serde(default = "default_table_size")]
        cols: usize,
        #[serde(rename = "withHeaderRow", default = "default_true")]
        with_header_row: bool,
    },
    AddRowBefore,
    AddRowAfter,
    DeleteRow,
    AddColumnBefore,
    AddColumnAfter,
    DeleteColumn,
    DeleteTable,
    InsertImage {
        src: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
    },
    InsertHorizontalRule,
    ClearFormatting,
    InsertText {
        text: String,
    },
    Undo,
    Redo,
}

impl ToolbarAction {
    /// The command behind this action; `None` for undo and redo
    pub fn command(&self) -> Option<Box<dyn Command>> {
        use ToolbarAction as A;
        let command: Box<dyn Command> = match self {
            A::ToggleBold => Box::new(ToggleMark::new(Mark::Bold)),
            A::ToggleItalic => Box::new(ToggleMark::new(Mark::Italic)),
            A::ToggleUnderline => Box::new(ToggleMark::new(Mark::Underline)),
            A::ToggleStrike => Box::new(ToggleMark::new(Mark::Strike)),
            A::ToggleSubscript => Box::new(ToggleMark::new(Mark::Subscript)),
            A::ToggleSuperscript => Box::new(ToggleMark::new(Mark::Superscript)),
            A::SetTextColor { color } => Box::new(SetMark::new(Mark::TextColor(color.clone()))),
            A::UnsetTextColor => Box::new(UnsetMark::new(MarkType::TextColor)),
            A::SetHighlight { color } => Box::new(SetMark::new(Mark::Highlight(color.clone()))),
            A::UnsetHighlight => Box::new(UnsetMark::new(MarkType::Highlight)),
            A::SetFontFamily { family } => Box::new(SetMark::new(Mark::FontFamily(family.clone()))),
            A::UnsetFontFamily => Box::new(UnsetMark::new(MarkType::FontFamily)),
            A::SetLink { href, text } => Box::new(match text {
                Some(text) => SetLink::with_display_text(href.clone(), text.clone()),
                None => SetLink::new(href.clone()),
            }),
            A::UnsetLink => Box::new(UnsetLink::new()),
            A::SetParagraph => Box::new(SetParagraph::new()),
            A::ToggleHeading { level } => Box::new(ToggleHeading::new(*level)),
            A::ToggleCodeBlock => Box::new(ToggleCodeBlock::new()),
            A::ToggleBulletList => Box::new(ToggleBulletList::new()),
            A::ToggleOrderedList => Box::new(ToggleOrderedList::new()),
            A::ToggleBlockquote => Box::new(ToggleBlockquote::new()),
            A::SinkListItem => Box::new(SinkListItem::new()),
            A::LiftListItem => Box::new(LiftListItem::new()),
            A::SetTextAlign { align } => Box::new(SetTextAlign::new(*align)),
            A::UnsetTextAlign => Box::new(UnsetTextAlign::new()),
            A::InsertTable {
                rows,
                cols,
                with_header_row,
            } => Box::new(InsertTable::new(*rows, *cols).with_header_row(*with_header_row)),
            A::AddRowBefore => Box::new(AddRow::before()),
            A::AddRowAfter => Box::new(AddRow::after()),
            A::DeleteRow => Box::new(DeleteRow::new()),
            A::AddColumnBefore => Box::new(AddColumn::before()),
            A::AddColumnAfter => Box::new(AddColumn::after()),
            A::DeleteColumn => Box::new(DeleteColumn::new()),
            A::DeleteTable => Box::new(DeleteTable::new()),
            A::InsertImage { src, alt } => {
                let image = InsertImage::new(src.clone());
                Box::new(match alt {
                    Some(alt) => image.with_alt(alt.clone()),
                    None => image,
                })
            }
            A::InsertHorizontalRule => Box::new(InsertHorizontalRule::new()),
            A::ClearFormatting => Box::new(ClearFormatting::new()),
            A::InsertText { text } => Box::new(ReplaceText::new(text.clone())),
            A::Undo | A::Redo => return None,
        };
        Some(command)
    }

    /// The query that shows this action as active, if it has one
    pub fn active_query(&self) -> Option<ActiveQuery> {
        use ToolbarAction as A;
        let query = match self {
            A::ToggleBold => ActiveQuery::Mark(MarkType::Bold),
            A::ToggleItalic => ActiveQuery::Mark(MarkType::Italic),
            A::ToggleUnderline => ActiveQuery::Mark(MarkType::Underline),
            A::ToggleStrike => ActiveQuery::Mark(MarkType::Strike),
            A::ToggleSubscript => ActiveQuery::Mark(MarkType::Subscript),
            A::ToggleSuperscript => ActiveQuery::Mark(MarkType::Superscript),
            A::SetTextColor { color } => ActiveQuery::MarkValue(Mark::TextColor(color.clone())),
            A::SetHighlight { color } => ActiveQuery::MarkValue(Mark::Highlight(color.clone())),
            A::SetFontFamily { family } => {
                ActiveQuery::MarkValue(Mark::FontFamily(family.clone()))
            }
            A::SetLink { .. } | A::UnsetLink => ActiveQuery::Mark(MarkType::Link),
            A::SetParagraph => ActiveQuery::Paragraph,
            A::ToggleHeading { level } => ActiveQuery::Heading(*level),
            A::ToggleCodeBlock => ActiveQuery::CodeBlock,
            A::ToggleBulletList => ActiveQuery::BulletList,
            A::ToggleOrderedList => ActiveQuery::OrderedList,
            A::ToggleBlockquote => ActiveQuery::Blockquote,
            A::SetTextAlign { align } => ActiveQuery::Align(*align),
            _ => return None,
        };
        Some(query)
    }
}

impl EditingEngine {
    /// Run a toolbar action. Returns whether anything changed; undo and
    /// redo at the ends of history are not errors.
    pub fn execute_action(&mut self, action: &ToolbarAction) -> Result<bool> {
        match action {
            ToolbarAction::Undo => Ok(self.undo()),
            ToolbarAction::Redo => Ok(self.redo()),
            _ => match action.command() {
                Some(command) => self.execute(command.as_ref()).map(|()| true),
                None => Ok(false),
            },
        }
    }

    pub fn is_action_active(&self, action: &ToolbarAction) -> bool {
        action
            .active_query()
            .is_some_and(|query| self.is_active(&query))
    }

    pub fn can_execute_action(&self, action: &ToolbarAction) -> bool {
        match action {
            ToolbarAction::Undo => self.can_undo(),
            ToolbarAction::Redo => self.can_redo(),
            _ => action
                .command()
                .is_some_and(|command| self.can_execute(command.as_ref())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Position, Selection};

    #[test]
    fn test_action_json_shape() {
        let action: ToolbarAction =
            serde_json::from_str(r#"{"action":"toggleHeading","args":{"level":2}}"#).unwrap();
        assert_eq!(action, ToolbarAction::ToggleHeading { level: 2 });

        let action: ToolbarAction =
            serde_json::from_str(r#"{"action":"insertTable","args":{}}"#).unwrap();
        assert_eq!(
            action,
            ToolbarAction::InsertTable {
                rows: 3,
                cols: 3,
                with_header_row: true
            }
        );

        let json = serde_json::to_string(&ToolbarAction::Undo).unwrap();
        assert_eq!(json, r#"{"action":"undo"}"#);
    }

    #[test]
    fn test_toolbar_session() {
        let mut engine = EditingEngine::new();
        engine
            .execute_action(&ToolbarAction::InsertText {
                text: "Title".into(),
            })
            .unwrap();
        engine
            .execute_action(&ToolbarAction::ToggleHeading { level: 1 })
            .unwrap();
        assert!(engine.is_action_active(&ToolbarAction::ToggleHeading { level: 1 }));
        assert!(!engine.can_execute_action(&ToolbarAction::DeleteRow));

        let whole = Selection::new(Position::new(vec![0], 0), Position::new(vec![0], 5));
        engine.set_selection(whole).unwrap();
        engine.execute_action(&ToolbarAction::ToggleBold).unwrap();
        assert!(engine.is_action_active(&ToolbarAction::ToggleBold));
        assert_eq!(engine.markup(), "<h1><strong>Title</strong></h1>");

        assert!(engine.execute_action(&ToolbarAction::Undo).unwrap());
        assert!(!engine.is_action_active(&ToolbarAction::ToggleBold));
        assert!(engine.can_execute_action(&ToolbarAction::Redo));
    }

    #[test]
    fn test_undo_at_start_is_not_an_error() {
        let mut engine = EditingEngine::new();
        assert!(!engine.execute_action(&ToolbarAction::Undo).unwrap());
        assert!(!engine.can_execute_action(&ToolbarAction::Undo));
    }
}
