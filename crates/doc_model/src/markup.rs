//! Markup serialization
//!
//! Writes the tree as a small XHTML subset. The output is well-formed XML
//! so that [`crate::parse_markup`] can read it back losslessly.

use crate::{Content, DocumentTree, Mark, Node, NodeKind, TextRun};
use quick_xml::escape::escape;
use std::fmt::Write;

/// Serialize a document tree to markup
pub fn to_markup(tree: &DocumentTree) -> String {
    let mut out = String::new();
    if let Some(layout) = &tree.layout {
        out.push_str("<div");
        push_attr(&mut out, "class", layout.class.as_deref());
        push_attr(&mut out, "dir", layout.direction.map(|d| d.as_str()));
        let style = layout
            .typography
            .as_ref()
            .map(|family| format!("font-family: {family}"));
        push_attr(&mut out, "style", style.as_deref());
        out.push('>');
        write_blocks(&mut out, &tree.blocks);
        out.push_str("</div>");
    } else {
        write_blocks(&mut out, &tree.blocks);
    }
    out
}

fn push_attr(out: &mut String, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        let _ = write!(out, " {}=\"{}\"", name, escape(value));
    }
}

fn write_blocks(out: &mut String, blocks: &[Node]) {
    for block in blocks {
        write_block(out, block);
    }
}

fn write_block(out: &mut String, node: &Node) {
    let class = node.attrs.class.as_deref();
    match node.kind {
        NodeKind::Paragraph | NodeKind::Heading(_) => {
            let tag = match node.kind {
                NodeKind::Heading(level) => format!("h{}", level.clamp(1, 6)),
                _ => "p".to_string(),
            };
            out.push('<');
            out.push_str(&tag);
            push_attr(out, "class", class);
            let style = node
                .attrs
                .align
                .map(|align| format!("text-align: {}", align.as_css()));
            push_attr(out, "style", style.as_deref());
            out.push('>');
            write_runs(out, node.runs().map(Vec::as_slice).unwrap_or_default());
            let _ = write!(out, "</{tag}>");
        }
        NodeKind::CodeBlock => {
            out.push_str("<pre");
            push_attr(out, "class", class);
            out.push_str("><code>");
            out.push_str(&escape(node.text().as_str()));
            out.push_str("</code></pre>");
        }
        NodeKind::Blockquote => {
            out.push_str("<blockquote");
            push_attr(out, "class", class);
            out.push('>');
            write_blocks(out, node.children().map(Vec::as_slice).unwrap_or_default());
            out.push_str("</blockquote>");
        }
        NodeKind::BulletList | NodeKind::OrderedList => {
            let tag = if node.kind == NodeKind::OrderedList {
                "ol"
            } else {
                "ul"
            };
            let items = node.children().map(Vec::as_slice).unwrap_or_default();
            let _ = write!(out, "<{tag}");
            push_attr(out, "class", class);
            out.push('>');
            let mut cursor = 0;
            write_list_items(out, tag, items, &mut cursor, 0);
            let _ = write!(out, "</{tag}>");
        }
        NodeKind::Table => {
            out.push_str("<table");
            push_attr(out, "class", class);
            out.push('>');
            for row in node.children().map(Vec::as_slice).unwrap_or_default() {
                out.push_str("<tr");
                push_attr(out, "class", row.attrs.class.as_deref());
                out.push('>');
                for cell in row.children().map(Vec::as_slice).unwrap_or_default() {
                    write_cell(out, cell);
                }
                out.push_str("</tr>");
            }
            out.push_str("</table>");
        }
        NodeKind::Image => {
            out.push_str("<img");
            push_attr(out, "src", node.attrs.src.as_deref());
            push_attr(out, "alt", node.attrs.alt.as_deref());
            push_attr(out, "class", class);
            out.push_str("/>");
        }
        NodeKind::HorizontalRule => {
            out.push_str("<hr");
            push_attr(out, "class", class);
            out.push_str("/>");
        }
        // Structural children never appear at block level in a valid tree.
        NodeKind::ListItem | NodeKind::TableRow | NodeKind::TableCell | NodeKind::TableHeader => {
            match &node.content {
                Content::Runs(runs) => {
                    out.push_str("<p>");
                    write_runs(out, runs);
                    out.push_str("</p>");
                }
                Content::Blocks(children) => write_blocks(out, children),
                Content::Empty => {}
            }
        }
    }
}

/// Write items of one depth level, recursing into deeper runs of items as
/// nested lists inside the preceding `<li>`.
fn write_list_items(out: &mut String, tag: &str, items: &[Node], cursor: &mut usize, depth: usize) {
    while let Some(item) = items.get(*cursor) {
        if item.attrs.depth != depth {
            break;
        }
        *cursor += 1;
        out.push_str("<li");
        push_attr(out, "class", item.attrs.class.as_deref());
        out.push_str("><p>");
        write_runs(out, item.runs().map(Vec::as_slice).unwrap_or_default());
        out.push_str("</p>");
        if items.get(*cursor).is_some_and(|next| next.attrs.depth > depth) {
            let _ = write!(out, "<{tag}>");
            write_list_items(out, tag, items, cursor, depth + 1);
            let _ = write!(out, "</{tag}>");
        }
        out.push_str("</li>");
    }
}

fn write_cell(out: &mut String, cell: &Node) {
    let tag = if cell.kind == NodeKind::TableHeader {
        "th"
    } else {
        "td"
    };
    let _ = write!(out, "<{tag}");
    push_attr(out, "class", cell.attrs.class.as_deref());
    if cell.attrs.colspan > 1 {
        let _ = write!(out, " colspan=\"{}\"", cell.attrs.colspan);
    }
    if cell.attrs.rowspan > 1 {
        let _ = write!(out, " rowspan=\"{}\"", cell.attrs.rowspan);
    }
    out.push('>');
    write_blocks(out, cell.children().map(Vec::as_slice).unwrap_or_default());
    let _ = write!(out, "</{tag}>");
}

fn write_runs(out: &mut String, runs: &[TextRun]) {
    for run in runs {
        for mark in run.marks.iter() {
            open_mark(out, mark);
        }
        write_text(out, &run.text);
        for mark in run.marks.iter().rev() {
            out.push_str(close_tag(mark));
        }
    }
}

fn write_text(out: &mut String, text: &str) {
    let mut lines = text.split('\n');
    if let Some(first) = lines.next() {
        out.push_str(&escape(first));
    }
    for line in lines {
        out.push_str("<br/>");
        out.push_str(&escape(line));
    }
}

fn open_mark(out: &mut String, mark: &Mark) {
    match mark {
        Mark::Bold => out.push_str("<strong>"),
        Mark::Italic => out.push_str("<em>"),
        Mark::Underline => out.push_str("<u>"),
        Mark::Strike => out.push_str("<s>"),
        Mark::Subscript => out.push_str("<sub>"),
        Mark::Superscript => out.push_str("<sup>"),
        Mark::Link(href) => {
            out.push_str("<a");
            push_attr(out, "href", Some(href));
            out.push('>');
        }
        Mark::FontFamily(family) => {
            let style = format!("font-family: {family}");
            out.push_str("<span");
            push_attr(out, "style", Some(&style));
            out.push('>');
        }
        Mark::TextColor(color) => {
            let style = format!("color: {color}");
            out.push_str("<span");
            push_attr(out, "style", Some(&style));
            out.push('>');
        }
        Mark::Highlight(color) => {
            let style = format!("background-color: {color}");
            out.push_str("<mark");
            push_attr(out, "data-color", Some(color));
            push_attr(out, "style", Some(&style));
            out.push('>');
        }
    }
}

fn close_tag(mark: &Mark) -> &'static str {
    match mark {
        Mark::Bold => "</strong>",
        Mark::Italic => "</em>",
        Mark::Underline => "</u>",
        Mark::Strike => "</s>",
        Mark::Subscript => "</sub>",
        Mark::Superscript => "</sup>",
        Mark::Link(_) => "</a>",
        Mark::FontFamily(_) | Mark::TextColor(_) => "</span>",
        Mark::Highlight(_) => "</mark>",
    }
}
