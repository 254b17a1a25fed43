//! Block nodes

use crate::TextRun;
use serde::{Deserialize, Serialize};

/// Kind of a block node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "level", rename_all = "camelCase")]
pub enum NodeKind {
    Paragraph,
    /// Heading with level 1..=6
    Heading(u8),
    BulletList,
    OrderedList,
    ListItem,
    Blockquote,
    Table,
    TableRow,
    TableCell,
    TableHeader,
    Image,
    HorizontalRule,
    CodeBlock,
}

impl NodeKind {
    /// Blocks holding text runs directly
    pub fn is_textblock(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph | NodeKind::Heading(_) | NodeKind::CodeBlock | NodeKind::ListItem
        )
    }

    /// Blocks holding arbitrary child blocks
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Blockquote | NodeKind::TableCell | NodeKind::TableHeader
        )
    }

    pub fn is_list(&self) -> bool {
        matches!(self, NodeKind::BulletList | NodeKind::OrderedList)
    }

    pub fn is_cell(&self) -> bool {
        matches!(self, NodeKind::TableCell | NodeKind::TableHeader)
    }

    /// Whether text alignment applies to this kind
    pub fn accepts_alignment(&self) -> bool {
        matches!(self, NodeKind::Paragraph | NodeKind::Heading(_))
    }
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_css(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }

    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }
}

fn default_span() -> u32 {
    1
}

fn is_default_span(span: &u32) -> bool {
    *span == 1
}

fn is_zero(depth: &usize) -> bool {
    *depth == 0
}

/// Node-level attributes. Which ones are meaningful depends on the kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Alignment>,
    /// List item nesting depth
    #[serde(default, skip_serializing_if = "is_zero")]
    pub depth: usize,
    #[serde(default = "default_span", skip_serializing_if = "is_default_span")]
    pub colspan: u32,
    #[serde(default = "default_span", skip_serializing_if = "is_default_span")]
    pub rowspan: u32,
    /// Image source URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    /// Presentation class hint carried through to markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

impl Default for NodeAttrs {
    fn default() -> Self {
        Self {
            align: None,
            depth: 0,
            colspan: 1,
            rowspan: 1,
            src: None,
            alt: None,
            class: None,
        }
    }
}

/// Children of a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "items", rename_all = "camelCase")]
pub enum Content {
    Runs(Vec<TextRun>),
    Blocks(Vec<Node>),
    Empty,
}

/// A block node in the document tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    #[serde(default)]
    pub attrs: NodeAttrs,
    pub content: Content,
}

impl Node {
    fn textblock(kind: NodeKind, runs: Vec<TextRun>) -> Self {
        Self {
            kind,
            attrs: NodeAttrs::default(),
            content: Content::Runs(runs),
        }
    }

    fn with_blocks(kind: NodeKind, children: Vec<Node>) -> Self {
        Self {
            kind,
            attrs: NodeAttrs::default(),
            content: Content::Blocks(children),
        }
    }

    pub fn paragraph(runs: Vec<TextRun>) -> Self {
        Self::textblock(NodeKind::Paragraph, runs)
    }

    pub fn empty_paragraph() -> Self {
        Self::paragraph(Vec::new())
    }

    /// Create a heading. The level is clamped into 1..=6.
    pub fn heading(level: u8, runs: Vec<TextRun>) -> Self {
        Self::textblock(NodeKind::Heading(level.clamp(1, 6)), runs)
    }

    pub fn code_block(text: impl Into<String>) -> Self {
        let text = text.into();
        let runs = if text.is_empty() {
            Vec::new()
        } else {
            vec![TextRun::new(text)]
        };
        Self::textblock(NodeKind::CodeBlock, runs)
    }

    /// Create a list. `ordered` selects the numbered kind.
    pub fn list(ordered: bool, items: Vec<Node>) -> Self {
        let kind = if ordered {
            NodeKind::OrderedList
        } else {
            NodeKind::BulletList
        };
        Self::with_blocks(kind, items)
    }

    pub fn list_item(depth: usize, runs: Vec<TextRun>) -> Self {
        let mut item = Self::textblock(NodeKind::ListItem, runs);
        item.attrs.depth = depth;
        item
    }

    pub fn blockquote(children: Vec<Node>) -> Self {
        Self::with_blocks(NodeKind::Blockquote, children)
    }

    pub fn table(rows: Vec<Node>) -> Self {
        Self::with_blocks(NodeKind::Table, rows)
    }

    pub fn row(cells: Vec<Node>) -> Self {
        Self::with_blocks(NodeKind::TableRow, cells)
    }

    pub fn cell(children: Vec<Node>) -> Self {
        Self::with_blocks(NodeKind::TableCell, children)
    }

    pub fn header(children: Vec<Node>) -> Self {
        Self::with_blocks(NodeKind::TableHeader, children)
    }

    pub fn image(src: impl Into<String>, alt: Option<String>) -> Self {
        let mut image = Self {
            kind: NodeKind::Image,
            attrs: NodeAttrs::default(),
            content: Content::Empty,
        };
        image.attrs.src = Some(src.into());
        image.attrs.alt = alt;
        image
    }

    pub fn horizontal_rule() -> Self {
        Self {
            kind: NodeKind::HorizontalRule,
            attrs: NodeAttrs::default(),
            content: Content::Empty,
        }
    }

    /// Builder: set the class hint
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.attrs.class = Some(class.into());
        self
    }

    /// Builder: set alignment
    pub fn with_align(mut self, align: Alignment) -> Self {
        self.attrs.align = Some(align);
        self
    }

    pub fn is_textblock(&self) -> bool {
        self.kind.is_textblock()
    }

    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    pub fn is_list(&self) -> bool {
        self.kind.is_list()
    }

    pub fn is_cell(&self) -> bool {
        self.kind.is_cell()
    }

    pub fn runs(&self) -> Option<&Vec<TextRun>> {
        match &self.content {
            Content::Runs(runs) => Some(runs),
            _ => None,
        }
    }

    pub fn runs_mut(&mut self) -> Option<&mut Vec<TextRun>> {
        match &mut self.content {
            Content::Runs(runs) => Some(runs),
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&Vec<Node>> {
        match &self.content {
            Content::Blocks(children) => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match &mut self.content {
            Content::Blocks(children) => Some(children),
            _ => None,
        }
    }

    /// Plain text of a textblock (empty for other kinds)
    pub fn text(&self) -> String {
        self.runs().map(|runs| crate::runs_text(runs)).unwrap_or_default()
    }

    /// Character length of a textblock
    pub fn char_len(&self) -> usize {
        self.runs().map(|runs| crate::runs_char_len(runs)).unwrap_or(0)
    }

    /// Number of rows of a table
    pub fn row_count(&self) -> usize {
        match self.kind {
            NodeKind::Table => self.children().map(Vec::len).unwrap_or(0),
            _ => 0,
        }
    }

    /// Number of cells in the widest row of a table
    pub fn column_count(&self) -> usize {
        match self.kind {
            NodeKind::Table => self
                .children()
                .map(|rows| {
                    rows.iter()
                        .map(|row| row.children().map(Vec::len).unwrap_or(0))
                        .max()
                        .unwrap_or(0)
                })
                .unwrap_or(0),
            _ => 0,
        }
    }

    /// Convert a textblock into another textblock kind, keeping its runs.
    ///
    /// Kind-specific attributes (depth, class) are reset; alignment is kept
    /// only where the new kind accepts it.
    pub fn retyped(&self, kind: NodeKind) -> Node {
        let runs = self.runs().cloned().unwrap_or_default();
        let mut node = Node::textblock(kind, runs);
        if kind.accepts_alignment() {
            node.attrs.align = self.attrs.align;
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_clamped() {
        assert_eq!(Node::heading(0, vec![]).kind, NodeKind::Heading(1));
        assert_eq!(Node::heading(9, vec![]).kind, NodeKind::Heading(6));
    }

    #[test]
    fn test_column_count_uses_widest_row() {
        let table = Node::table(vec![
            Node::row(vec![Node::cell(vec![]), Node::cell(vec![])]),
            Node::row(vec![
                Node::cell(vec![]),
                Node::cell(vec![]),
                Node::cell(vec![]),
            ]),
        ]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 3);
        assert_eq!(Node::empty_paragraph().column_count(), 0);
    }

    #[test]
    fn test_retyped_drops_class_and_depth() {
        let item = Node::list_item(2, vec![TextRun::new("x")]).with_class("list-para");
        let para = item.retyped(NodeKind::Paragraph);
        assert_eq!(para.kind, NodeKind::Paragraph);
        assert_eq!(para.attrs.depth, 0);
        assert_eq!(para.attrs.class, None);
        assert_eq!(para.text(), "x");
    }

    #[test]
    fn test_attrs_serde_defaults() {
        let node = Node::image("data:image/png;base64,AA==", Some("logo".into()));
        let json = serde_json::to_string(&node).unwrap();
        assert!(!json.contains("colspan"));
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_alignment_css() {
        assert_eq!(Alignment::from_css(" Center "), Some(Alignment::Center));
        assert_eq!(Alignment::from_css("start"), None);
        assert_eq!(Alignment::Justify.as_css(), "justify");
    }
}
