//! Markup parsing
//!
//! Reads the XHTML subset produced by [`crate::to_markup`] back into a tree.
//! Parsing goes through a small element tree first, which keeps the block
//! and inline conversions independent of the event stream.

use crate::{
    Alignment, DocModelError, DocumentLayout, DocumentTree, Mark, MarkSet, Node, Result,
    TextDirection, TextRun,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Debug)]
enum Dom {
    Element(Element),
    Text(String),
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Dom>,
}

impl Element {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Look up one declaration of the inline `style` attribute
    fn style(&self, property: &str) -> Option<String> {
        self.attr("style")?
            .split(';')
            .filter_map(|decl| decl.split_once(':'))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case(property))
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn class(&self) -> Option<String> {
        self.attr("class")
            .filter(|class| !class.is_empty())
            .map(str::to_string)
    }

    fn span(&self, name: &str) -> u32 {
        self.attr(name)
            .and_then(|value| value.trim().parse::<u32>().ok())
            .unwrap_or(1)
            .max(1)
    }
}

/// Parse markup into a document tree.
///
/// A single top-level `div` is read as the layout envelope. The result is
/// normalized before it is returned.
pub fn parse_markup(input: &str) -> Result<DocumentTree> {
    let roots = build_dom(input)?;

    let significant: Vec<&Dom> = roots.iter().filter(|node| !is_blank(node)).collect();
    let (layout, body) = match significant.as_slice() {
        [Dom::Element(div)] if div.name == "div" => {
            let layout = DocumentLayout {
                direction: div.attr("dir").and_then(TextDirection::parse),
                typography: div.style("font-family"),
                class: div.class(),
            };
            (Some(layout), div.children.as_slice())
        }
        _ => (None, roots.as_slice()),
    };

    let mut blocks = Vec::new();
    convert_blocks(body, &mut blocks);
    let mut tree = DocumentTree { blocks, layout };
    tree.normalize();
    Ok(tree)
}

fn markup_error(err: impl std::fmt::Display) -> DocModelError {
    DocModelError::Markup(err.to_string())
}

fn build_dom(input: &str) -> Result<Vec<Dom>> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = vec![Element::default()];
    loop {
        match reader.read_event().map_err(markup_error)? {
            Event::Start(ref e) => stack.push(element_from(e)?),
            Event::Empty(ref e) => {
                let element = element_from(e)?;
                push_child(&mut stack, Dom::Element(element))?;
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(markup_error("unbalanced closing tag"));
                }
                if let Some(element) = stack.pop() {
                    push_child(&mut stack, Dom::Element(element))?;
                }
            }
            Event::Text(ref e) => {
                let text = e.unescape().map_err(markup_error)?;
                push_child(&mut stack, Dom::Text(text.into_owned()))?;
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                push_child(&mut stack, Dom::Text(text))?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(root), true) => Ok(root.children),
        _ => Err(markup_error("unclosed element at end of input")),
    }
}

fn element_from(start: &BytesStart) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(markup_error)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
        let value = attr.unescape_value().map_err(markup_error)?.into_owned();
        attrs.push((key, value));
    }
    Ok(Element {
        name,
        attrs,
        children: Vec::new(),
    })
}

fn push_child(stack: &mut [Element], child: Dom) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(child);
            Ok(())
        }
        None => Err(markup_error("content outside of any element")),
    }
}

fn is_blank(node: &Dom) -> bool {
    matches!(node, Dom::Text(text) if text.trim().is_empty())
}

fn is_inline(name: &str) -> bool {
    matches!(
        name,
        "strong" | "b" | "em" | "i" | "u" | "s" | "strike" | "del" | "sub" | "sup" | "a" | "span"
            | "mark" | "br" | "code"
    )
}

// ============================================================================
// Blocks
// ============================================================================

fn convert_blocks(nodes: &[Dom], out: &mut Vec<Node>) {
    // Loose inline content between blocks becomes an implicit paragraph.
    let mut pending: Vec<TextRun> = Vec::new();
    let flush = |pending: &mut Vec<TextRun>, out: &mut Vec<Node>| {
        if pending.iter().any(|run| !run.text.trim().is_empty()) {
            out.push(Node::paragraph(std::mem::take(pending)));
        }
        pending.clear();
    };

    for node in nodes {
        let element = match node {
            Dom::Text(text) => {
                if !text.trim().is_empty() {
                    pending.push(TextRun::new(inline_text(text)));
                }
                continue;
            }
            Dom::Element(element) => element,
        };
        if is_inline(&element.name) {
            collect_runs(std::slice::from_ref(node), &MarkSet::new(), &mut pending);
            continue;
        }
        flush(&mut pending, out);
        convert_block(element, out);
    }
    flush(&mut pending, out);
}

fn convert_block(element: &Element, out: &mut Vec<Node>) {
    match element.name.as_str() {
        "p" => convert_paragraph(element, None, out),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = element.name[1..].parse::<u8>().unwrap_or(1);
            convert_paragraph(element, Some(level), out);
        }
        "pre" => {
            let mut text = String::new();
            collect_raw_text(&element.children, &mut text);
            let mut node = Node::code_block(text);
            node.attrs.class = element.class();
            out.push(node);
        }
        "blockquote" => {
            let mut children = Vec::new();
            convert_blocks(&element.children, &mut children);
            let mut node = Node::blockquote(children);
            node.attrs.class = element.class();
            out.push(node);
        }
        "ul" | "ol" => {
            let mut items = Vec::new();
            collect_list_items(element, 0, &mut items);
            let mut node = Node::list(element.name == "ol", items);
            node.attrs.class = element.class();
            out.push(node);
        }
        "table" => {
            let mut rows = Vec::new();
            collect_rows(&element.children, &mut rows);
            let mut node = Node::table(rows);
            node.attrs.class = element.class();
            out.push(node);
        }
        "img" => {
            if let Some(node) = convert_image(element) {
                out.push(node);
            }
        }
        "hr" => {
            let mut node = Node::horizontal_rule();
            node.attrs.class = element.class();
            out.push(node);
        }
        "li" => {
            let mut items = Vec::new();
            convert_list_item(element, 0, &mut items);
            out.push(Node::list(false, items));
        }
        "tr" => out.push(Node::table(vec![convert_row(element)])),
        // div, section, tbody and anything unknown are transparent
        _ => convert_blocks(&element.children, out),
    }
}

/// Convert a `p`/`hN` element. Images directly inside it split the block.
fn convert_paragraph(element: &Element, level: Option<u8>, out: &mut Vec<Node>) {
    let make = |runs: Vec<TextRun>| {
        let mut node = match level {
            Some(level) => Node::heading(level, runs),
            None => Node::paragraph(runs),
        };
        node.attrs.class = element.class();
        node.attrs.align = element
            .style("text-align")
            .and_then(|value| Alignment::from_css(&value));
        node
    };

    let mut runs = Vec::new();
    let mut emitted = false;
    for child in &element.children {
        match child {
            Dom::Element(img) if img.name == "img" => {
                if !runs.is_empty() {
                    out.push(make(std::mem::take(&mut runs)));
                }
                if let Some(image) = convert_image(img) {
                    out.push(image);
                }
                emitted = true;
            }
            _ => collect_runs(std::slice::from_ref(child), &MarkSet::new(), &mut runs),
        }
    }
    if !runs.is_empty() || !emitted {
        out.push(make(runs));
    }
}

fn convert_image(element: &Element) -> Option<Node> {
    let src = element.attr("src").filter(|src| !src.is_empty())?;
    let mut node = Node::image(src, element.attr("alt").map(str::to_string));
    node.attrs.class = element.class();
    Some(node)
}

fn collect_list_items(list: &Element, depth: usize, items: &mut Vec<Node>) {
    for child in &list.children {
        if let Dom::Element(element) = child {
            match element.name.as_str() {
                "li" => convert_list_item(element, depth, items),
                "ul" | "ol" => collect_list_items(element, depth + 1, items),
                _ => {}
            }
        }
    }
}

fn convert_list_item(li: &Element, depth: usize, items: &mut Vec<Node>) {
    let mut runs = Vec::new();
    let mut nested = Vec::new();
    let mut paragraphs = 0;
    for child in &li.children {
        match child {
            Dom::Element(element) if element.name == "ul" || element.name == "ol" => {
                nested.push(element);
            }
            Dom::Element(element) if element.name == "p" => {
                if paragraphs > 0 {
                    runs.push(TextRun::new("\n"));
                }
                paragraphs += 1;
                collect_runs(&element.children, &MarkSet::new(), &mut runs);
            }
            Dom::Text(text) if text.trim().is_empty() => {}
            other => collect_runs(std::slice::from_ref(other), &MarkSet::new(), &mut runs),
        }
    }
    let mut item = Node::list_item(depth, runs);
    item.attrs.class = li.class();
    items.push(item);
    for list in nested {
        collect_list_items(list, depth + 1, items);
    }
}

fn collect_rows(nodes: &[Dom], rows: &mut Vec<Node>) {
    for node in nodes {
        let Dom::Element(element) = node else {
            continue;
        };
        match element.name.as_str() {
            "tr" => rows.push(convert_row(element)),
            "thead" | "tbody" | "tfoot" => collect_rows(&element.children, rows),
            _ => {}
        }
    }
}

fn convert_row(element: &Element) -> Node {
    let mut cells = Vec::new();
    for child in &element.children {
        if let Dom::Element(cell) = child {
            if cell.name == "td" || cell.name == "th" {
                cells.push(convert_cell(cell));
            }
        }
    }
    let mut row = Node::row(cells);
    row.attrs.class = element.class();
    row
}

fn convert_cell(element: &Element) -> Node {
    let mut children = Vec::new();
    convert_blocks(&element.children, &mut children);
    let mut cell = if element.name == "th" {
        Node::header(children)
    } else {
        Node::cell(children)
    };
    cell.attrs.class = element.class();
    cell.attrs.colspan = element.span("colspan");
    cell.attrs.rowspan = element.span("rowspan");
    cell
}

// ============================================================================
// Inline content
// ============================================================================

/// Literal newlines in inline text are layout whitespace; hard breaks are
/// written as `<br/>`.
fn inline_text(text: &str) -> String {
    text.replace('\n', " ")
}

fn collect_runs(nodes: &[Dom], marks: &MarkSet, out: &mut Vec<TextRun>) {
    for node in nodes {
        match node {
            Dom::Text(text) => out.push(TextRun::with_marks(inline_text(text), marks.clone())),
            Dom::Element(element) => {
                if element.name == "br" {
                    out.push(TextRun::with_marks("\n", marks.clone()));
                    continue;
                }
                let mut inner = marks.clone();
                for mark in element_marks(element) {
                    inner.insert(mark);
                }
                collect_runs(&element.children, &inner, out);
            }
        }
    }
}

fn element_marks(element: &Element) -> Vec<Mark> {
    let mut marks = Vec::new();
    match element.name.as_str() {
        "strong" | "b" => marks.push(Mark::Bold),
        "em" | "i" => marks.push(Mark::Italic),
        "u" => marks.push(Mark::Underline),
        "s" | "strike" | "del" => marks.push(Mark::Strike),
        "sub" => marks.push(Mark::Subscript),
        "sup" => marks.push(Mark::Superscript),
        "a" => {
            if let Some(href) = element.attr("href").filter(|href| !href.is_empty()) {
                marks.push(Mark::Link(href.to_string()));
            }
        }
        "mark" => {
            let color = element
                .attr("data-color")
                .map(str::to_string)
                .or_else(|| element.style("background-color"))
                .unwrap_or_else(|| "#ffff00".to_string());
            marks.push(Mark::Highlight(color));
        }
        "span" => {
            if let Some(family) = element.style("font-family") {
                marks.push(Mark::FontFamily(family));
            }
            if let Some(color) = element.style("color") {
                marks.push(Mark::TextColor(color));
            }
            if let Some(color) = element.style("background-color") {
                marks.push(Mark::Highlight(color));
            }
        }
        _ => {}
    }
    marks
}

fn collect_raw_text(nodes: &[Dom], out: &mut String) {
    for node in nodes {
        match node {
            Dom::Text(text) => out.push_str(text),
            Dom::Element(element) if element.name == "br" => out.push('\n'),
            Dom::Element(element) => collect_raw_text(&element.children, out),
        }
    }
}
