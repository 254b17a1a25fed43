//! Assembly of parsed body primitives into document nodes
//!
//! Applies the style map, numbering and relationships, places inlined
//! images, groups numbered paragraphs into lists and resolves table spans.
//! Document order is preserved throughout.

use crate::diagnostics::Diagnostic;
use crate::document::{
    BodyElement, CellData, Inline, LinkTarget, ParagraphData, RunProps, TableData, VMerge,
    VertAlign,
};
use crate::media::{placeholder_data_uri, PLACEHOLDER_CLASS};
use crate::numbering::{ListKind, Numbering};
use crate::options::ImportOptions;
use crate::relationships::{relationship_types, Relationships};
use crate::style_map::{BlockTarget, SemanticTarget, StyleContext};
use crate::styles::{StyleKind, StyleNames};
use doc_model::{Mark, MarkSet, Node, NodeKind, TextRun, MAX_LIST_DEPTH};
use std::collections::{HashMap, HashSet};

/// Where an image's `src` comes from once media has been inlined
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// `data:` URI, or the URL of a linked image
    Resolved(String),
    /// The asset failed; a placeholder is shown
    Failed,
}

/// Image relationship IDs in document order, each once
pub fn image_references(elements: &[BodyElement]) -> Vec<String> {
    fn walk(elements: &[BodyElement], seen: &mut HashSet<String>, out: &mut Vec<String>) {
        for element in elements {
            match element {
                BodyElement::Paragraph(paragraph) => {
                    for inline in &paragraph.inlines {
                        if let Inline::Image { rel_id, .. } = inline {
                            if seen.insert(rel_id.clone()) {
                                out.push(rel_id.clone());
                            }
                        }
                    }
                }
                BodyElement::Table(table) => {
                    for cell in table.rows.iter().flat_map(|row| &row.cells) {
                        walk(&cell.content, seen, out);
                    }
                }
            }
        }
    }

    let mut out = Vec::new();
    walk(elements, &mut HashSet::new(), &mut out);
    out
}

/// Package lookups the assembler consults
pub struct AssemblyContext<'a> {
    pub options: &'a ImportOptions,
    pub styles: &'a StyleNames,
    pub numbering: &'a Numbering,
    pub rels: &'a Relationships,
    pub images: &'a HashMap<String, ImageSource>,
}

/// Build the block list for a body
pub fn assemble(elements: &[BodyElement], context: AssemblyContext<'_>) -> (Vec<Node>, Vec<Diagnostic>) {
    let mut assembler = Assembler {
        context,
        diagnostics: Vec::new(),
        warned_links: HashSet::new(),
    };
    let blocks = assembler.blocks(elements, false);
    (blocks, assembler.diagnostics)
}

/// Intermediate output before lists and quotes are grouped
enum Piece {
    Block(Node),
    Quote(Node),
    Item { kind: ListKind, node: Node },
}

enum Segment {
    Text(Vec<TextRun>),
    Image(Node),
}

struct Assembler<'a> {
    context: AssemblyContext<'a>,
    diagnostics: Vec<Diagnostic>,
    warned_links: HashSet<String>,
}

impl<'a> Assembler<'a> {
    fn blocks(&mut self, elements: &[BodyElement], in_table: bool) -> Vec<Node> {
        let mut pieces = Vec::new();
        for element in elements {
            match element {
                BodyElement::Paragraph(paragraph) => self.paragraph(paragraph, &mut pieces),
                BodyElement::Table(table) if in_table => {
                    self.diagnostics
                        .push(Diagnostic::info("Nested table flattened into its cell"));
                    pieces.extend(self.flatten_table(table).into_iter().map(Piece::Block));
                }
                BodyElement::Table(table) => pieces.push(Piece::Block(self.table(table))),
            }
        }
        group(pieces)
    }

    // ========================================================================
    // Paragraphs
    // ========================================================================

    fn paragraph(&mut self, paragraph: &ParagraphData, pieces: &mut Vec<Piece>) {
        let (target, class) = self.block_target(paragraph);

        // An explicit block style outranks numbering
        let list = match target {
            BlockTarget::Paragraph => paragraph.numbering.and_then(|numbering| {
                self.context
                    .numbering
                    .list_kind(numbering.num_id, numbering.ilvl)
                    .map(|kind| (kind, numbering.ilvl as usize))
            }),
            _ => None,
        };

        let mut segments = Vec::new();
        let mut runs = Vec::new();
        for inline in &paragraph.inlines {
            match inline {
                Inline::Text { text, props, link } => {
                    let marks = self.marks(props, link.as_ref());
                    runs.push(TextRun::with_marks(text.clone(), marks));
                }
                Inline::Image { rel_id, alt } => {
                    segments.push(Segment::Text(std::mem::take(&mut runs)));
                    segments.push(Segment::Image(self.image(rel_id, alt.as_ref())));
                }
            }
        }
        segments.push(Segment::Text(runs));

        let split = segments.len() > 1;
        for segment in segments {
            match segment {
                Segment::Image(node) => pieces.push(Piece::Block(node)),
                Segment::Text(runs) => {
                    let blank = runs.iter().all(|run| run.text.trim().is_empty());
                    if blank && (split || self.context.options.ignore_empty_paragraphs) {
                        continue;
                    }
                    pieces.push(match list {
                        Some((kind, depth)) => Piece::Item {
                            kind,
                            node: Node::list_item(depth.min(MAX_LIST_DEPTH), runs),
                        },
                        None => {
                            let mut node = Node::paragraph(runs);
                            node.kind = target.textblock_kind();
                            node.attrs.class = class.clone();
                            if node.kind.accepts_alignment() {
                                node.attrs.align = paragraph.align;
                            }
                            if target == BlockTarget::Blockquote {
                                Piece::Quote(node)
                            } else {
                                Piece::Block(node)
                            }
                        }
                    });
                }
            }
        }
    }

    fn block_target(&self, paragraph: &ParagraphData) -> (BlockTarget, Option<String>) {
        let Some(style_id) = paragraph.style_id.as_deref() else {
            return (BlockTarget::Paragraph, None);
        };
        let name = self.context.styles.resolve(StyleKind::Paragraph, style_id);
        match self
            .context
            .options
            .style_map
            .resolve(&StyleContext::paragraph(name))
        {
            SemanticTarget::Block { target, class } => (target, class),
            _ => (BlockTarget::Paragraph, None),
        }
    }

    fn marks(&mut self, props: &RunProps, link: Option<&LinkTarget>) -> MarkSet {
        let mut marks = MarkSet::new();

        if let Some(style_id) = props.style_id.as_deref() {
            let name = self.context.styles.resolve(StyleKind::Character, style_id);
            if let SemanticTarget::Mark(mark) =
                self.context.options.style_map.resolve(&StyleContext::run(name))
            {
                marks.insert(mark);
            }
        }

        if props.bold {
            marks.insert(Mark::Bold);
        }
        if props.italic {
            marks.insert(Mark::Italic);
        }
        if props.underline {
            marks.insert(Mark::Underline);
        }
        if props.strike {
            marks.insert(Mark::Strike);
        }
        match props.vert_align {
            Some(VertAlign::Superscript) => marks.insert(Mark::Superscript),
            Some(VertAlign::Subscript) => marks.insert(Mark::Subscript),
            None => {}
        }
        if let Some(color) = &props.color {
            marks.insert(Mark::TextColor(color.clone()));
        }
        if let Some(highlight) = &props.highlight {
            marks.insert(Mark::Highlight(highlight.clone()));
        }
        if let Some(href) = link.and_then(|link| self.link_href(link)) {
            marks.insert(Mark::Link(href));
        }
        marks
    }

    fn link_href(&mut self, link: &LinkTarget) -> Option<String> {
        match link {
            LinkTarget::Anchor(anchor) => Some(format!("#{anchor}")),
            LinkTarget::Relationship(id) => match self
                .context
                .rels
                .get(id)
                .filter(|rel| rel.rel_type == relationship_types::HYPERLINK)
            {
                Some(rel) => Some(rel.target.clone()),
                None => {
                    if self.warned_links.insert(id.clone()) {
                        tracing::warn!("Hyperlink relationship {} not found or not a hyperlink", id);
                        self.diagnostics.push(Diagnostic::warning(format!(
                            "hyperlink relationship {id} not found or not a hyperlink; link dropped"
                        )));
                    }
                    None
                }
            },
        }
    }

    fn image(&self, rel_id: &str, alt: Option<&String>) -> Node {
        match self.context.images.get(rel_id) {
            Some(ImageSource::Resolved(src)) => Node::image(src.clone(), alt.cloned()),
            _ => Node::image(placeholder_data_uri(), alt.cloned()).with_class(PLACEHOLDER_CLASS),
        }
    }

    // ========================================================================
    // Tables
    // ========================================================================

    fn table(&mut self, table: &TableData) -> Node {
        let classes = self.context.options.style_map.table_classes.clone();
        let spans = row_spans(table);

        let rows = table
            .rows
            .iter()
            .enumerate()
            .map(|(r, row)| {
                let cells = row
                    .cells
                    .iter()
                    .enumerate()
                    .filter(|(_, cell)| cell.v_merge != Some(VMerge::Continue))
                    .map(|(c, cell)| {
                        let content = self.blocks(&cell.content, true);
                        let mut node = if row.header {
                            Node::header(content)
                        } else {
                            let node = Node::cell(content);
                            match &classes.cell {
                                Some(class) => node.with_class(class.clone()),
                                None => node,
                            }
                        };
                        node.attrs.colspan = cell.grid_span.max(1);
                        node.attrs.rowspan = spans[r][c];
                        node
                    })
                    .collect();
                let row = Node::row(cells);
                match &classes.row {
                    Some(class) => row.with_class(class.clone()),
                    None => row,
                }
            })
            .collect();

        let table = Node::table(rows);
        match classes.table {
            Some(class) => table.with_class(class),
            None => table,
        }
    }

    fn flatten_table(&mut self, table: &TableData) -> Vec<Node> {
        let cells: Vec<&CellData> = table
            .rows
            .iter()
            .flat_map(|row| &row.cells)
            .filter(|cell| cell.v_merge != Some(VMerge::Continue))
            .collect();
        cells
            .into_iter()
            .flat_map(|cell| self.blocks(&cell.content, true))
            .collect()
    }
}

/// Row span of every cell, indexed like `table.rows[r].cells[c]`.
///
/// A `vMerge` restart spans every directly following row whose cell at the
/// same grid column continues the merge.
fn row_spans(table: &TableData) -> Vec<Vec<u32>> {
    let columns: Vec<Vec<usize>> = table
        .rows
        .iter()
        .map(|row| {
            let mut column = 0;
            row.cells
                .iter()
                .map(|cell| {
                    let start = column;
                    column += cell.grid_span.max(1) as usize;
                    start
                })
                .collect()
        })
        .collect();

    let continues_at = |r: usize, column: usize| {
        columns[r]
            .iter()
            .position(|start| *start == column)
            .is_some_and(|c| table.rows[r].cells[c].v_merge == Some(VMerge::Continue))
    };

    table
        .rows
        .iter()
        .enumerate()
        .map(|(r, row)| {
            row.cells
                .iter()
                .enumerate()
                .map(|(c, cell)| {
                    if cell.v_merge != Some(VMerge::Restart) {
                        return 1;
                    }
                    let column = columns[r][c];
                    let extra = (r + 1..table.rows.len())
                        .take_while(|next| continues_at(*next, column))
                        .count();
                    1 + extra as u32
                })
                .collect()
        })
        .collect()
}

/// Group list items into lists and adjacent quote paragraphs into one
/// blockquote.
///
/// A depth-0 item of a different kind starts a new list; deeper items join
/// the list they follow.
fn group(pieces: Vec<Piece>) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::new();
    let mut current_kind: Option<ListKind> = None;

    for piece in pieces {
        match piece {
            Piece::Block(node) => {
                current_kind = None;
                out.push(node);
            }
            Piece::Quote(node) => {
                current_kind = None;
                match out.last_mut() {
                    Some(last) if last.kind == NodeKind::Blockquote => {
                        if let Some(children) = last.children_mut() {
                            children.push(node);
                        }
                    }
                    _ => out.push(Node::blockquote(vec![node])),
                }
            }
            Piece::Item { kind, node } => {
                let continues = match current_kind {
                    Some(current) => node.attrs.depth > 0 || current == kind,
                    None => false,
                };
                match out.last_mut() {
                    Some(last) if continues && last.is_list() => {
                        if let Some(items) = last.children_mut() {
                            items.push(node);
                        }
                    }
                    _ => {
                        current_kind = Some(kind);
                        out.push(Node::list(kind.is_ordered(), vec![node]));
                    }
                }
            }
        }
    }
    out
}
