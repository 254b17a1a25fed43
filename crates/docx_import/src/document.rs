//! document.xml body parser
//!
//! Reads the main part into flat primitives (paragraphs with their runs,
//! tables with their cells). Nothing here consults the style map or the
//! package; that happens during assembly.

use crate::error::{ConversionError, ConversionResult};
use crate::reader::XmlParser;
use doc_model::Alignment;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A block-level element of the body
#[derive(Debug, Clone, PartialEq)]
pub enum BodyElement {
    Paragraph(ParagraphData),
    Table(TableData),
}

/// Reference into numbering.xml
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberingRef {
    pub num_id: u32,
    pub ilvl: u8,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphData {
    pub style_id: Option<String>,
    pub numbering: Option<NumberingRef>,
    pub align: Option<Alignment>,
    pub inlines: Vec<Inline>,
}

/// Where a hyperlink points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Relationship ID resolved against the document rels
    Relationship(String),
    /// Bookmark inside the document
    Anchor(String),
}

/// Vertical alignment of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertAlign {
    Superscript,
    Subscript,
}

/// Direct run formatting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunProps {
    pub style_id: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub vert_align: Option<VertAlign>,
    /// `#rrggbb`
    pub color: Option<String>,
    /// `#rrggbb`
    pub highlight: Option<String>,
}

/// Inline content of a paragraph
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text {
        text: String,
        props: RunProps,
        link: Option<LinkTarget>,
    },
    Image {
        rel_id: String,
        alt: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableData {
    pub rows: Vec<RowData>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowData {
    /// Repeated header row (`w:tblHeader`)
    pub header: bool,
    pub cells: Vec<CellData>,
}

/// Vertical merge state of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VMerge {
    Restart,
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellData {
    pub grid_span: u32,
    pub v_merge: Option<VMerge>,
    pub content: Vec<BodyElement>,
}

impl Default for CellData {
    fn default() -> Self {
        Self {
            grid_span: 1,
            v_merge: None,
            content: Vec::new(),
        }
    }
}

type XmlReader<'a> = Reader<&'a [u8]>;

/// Elements whose whole subtree is ignored: deleted or moved-away text,
/// section and change-tracking properties, and the VML fallback that
/// duplicates a DrawingML choice.
fn is_skipped(local: &str) -> bool {
    matches!(
        local,
        "del"
            | "moveFrom"
            | "sectPr"
            | "pPrChange"
            | "rPrChange"
            | "tblPrChange"
            | "Fallback"
            | "instrText"
            | "delText"
            | "commentReference"
            | "footnoteReference"
            | "endnoteReference"
            | "object"
    )
}

/// Parse document.xml into body elements
pub fn parse_body(content: &str) -> ConversionResult<Vec<BodyElement>> {
    let mut reader = XmlParser::from_string_untrimmed(content);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) if XmlParser::matches_element(e.name().as_ref(), "body") => {
                return parse_blocks(&mut reader);
            }
            Event::Empty(ref e) if XmlParser::matches_element(e.name().as_ref(), "body") => {
                return Ok(Vec::new());
            }
            Event::Eof => {
                return Err(ConversionError::InvalidStructure(
                    "main document part has no body".to_string(),
                ))
            }
            _ => {}
        }
        buf.clear();
    }
}

/// Block content up to the end of the enclosing element (body or cell).
/// Unknown wrappers such as content controls are descended into.
fn parse_blocks(reader: &mut XmlReader<'_>) -> ConversionResult<Vec<BodyElement>> {
    let mut blocks = Vec::new();
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let name = e.name();
                match XmlParser::local_name(name.as_ref()) {
                    "p" => blocks.push(BodyElement::Paragraph(parse_paragraph(reader)?)),
                    "tbl" => blocks.push(BodyElement::Table(parse_table(reader)?)),
                    local if is_skipped(local) => skip(reader, e)?,
                    _ => depth += 1,
                }
            }
            Event::Empty(ref e) if XmlParser::matches_element(e.name().as_ref(), "p") => {
                blocks.push(BodyElement::Paragraph(ParagraphData::default()));
            }
            Event::End(_) => {
                if depth == 0 {
                    return Ok(blocks);
                }
                depth -= 1;
            }
            Event::Eof => return Err(unexpected_eof("body")),
            _ => {}
        }
        buf.clear();
    }
}

// ============================================================================
// Paragraphs
// ============================================================================

fn parse_paragraph(reader: &mut XmlReader<'_>) -> ConversionResult<ParagraphData> {
    let mut paragraph = ParagraphData::default();
    parse_inlines(reader, None, &mut paragraph)?;
    Ok(paragraph)
}

/// Inline content of a paragraph or hyperlink, up to its end tag
fn parse_inlines(
    reader: &mut XmlReader<'_>,
    link: Option<&LinkTarget>,
    paragraph: &mut ParagraphData,
) -> ConversionResult<()> {
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let name = e.name();
                match XmlParser::local_name(name.as_ref()) {
                    "pPr" => parse_paragraph_properties(reader, paragraph)?,
                    "r" => parse_run(reader, link, &mut paragraph.inlines)?,
                    "hyperlink" => {
                        let target = hyperlink_target(e);
                        parse_inlines(reader, target.as_ref().or(link), paragraph)?;
                    }
                    local if is_skipped(local) => skip(reader, e)?,
                    _ => depth += 1,
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Event::Eof => return Err(unexpected_eof("paragraph")),
            _ => {}
        }
        buf.clear();
    }
}

fn hyperlink_target(e: &BytesStart) -> Option<LinkTarget> {
    XmlParser::get_r_attribute(e, "id")
        .map(LinkTarget::Relationship)
        .or_else(|| XmlParser::get_w_attribute(e, "anchor").map(LinkTarget::Anchor))
}

fn parse_paragraph_properties(
    reader: &mut XmlReader<'_>,
    paragraph: &mut ParagraphData,
) -> ConversionResult<()> {
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut num_id: Option<u32> = None;
    let mut ilvl: u8 = 0;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let name = e.name();
                match XmlParser::local_name(name.as_ref()) {
                    // Paragraph-mark run properties never reach the text
                    "rPr" => skip(reader, e)?,
                    local if is_skipped(local) => skip(reader, e)?,
                    _ => depth += 1,
                }
            }
            Event::Empty(ref e) => {
                let name = e.name();
                let value = XmlParser::get_w_attribute(e, "val");
                match (XmlParser::local_name(name.as_ref()), value) {
                    ("pStyle", Some(style)) => paragraph.style_id = Some(style),
                    ("numId", Some(id)) => num_id = id.parse().ok(),
                    ("ilvl", Some(level)) => ilvl = level.parse().unwrap_or(0),
                    ("jc", Some(jc)) => paragraph.align = parse_alignment(&jc),
                    _ => {}
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Eof => return Err(unexpected_eof("paragraph properties")),
            _ => {}
        }
        buf.clear();
    }

    paragraph.numbering = num_id.map(|num_id| NumberingRef { num_id, ilvl });
    Ok(())
}

/// `w:jc` value. `start`/`end` depend on the paragraph direction and are
/// left unset.
pub fn parse_alignment(value: &str) -> Option<Alignment> {
    match value {
        "left" => Some(Alignment::Left),
        "center" => Some(Alignment::Center),
        "right" => Some(Alignment::Right),
        "both" | "justify" | "distribute" => Some(Alignment::Justify),
        _ => None,
    }
}

// ============================================================================
// Runs
// ============================================================================

fn parse_run(
    reader: &mut XmlReader<'_>,
    link: Option<&LinkTarget>,
    inlines: &mut Vec<Inline>,
) -> ConversionResult<()> {
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut props = RunProps::default();
    let mut text = String::new();

    let flush = |text: &mut String, props: &RunProps, inlines: &mut Vec<Inline>| {
        if !text.is_empty() {
            inlines.push(Inline::Text {
                text: std::mem::take(text),
                props: props.clone(),
                link: link.cloned(),
            });
        }
    };

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let name = e.name();
                match XmlParser::local_name(name.as_ref()) {
                    "rPr" => props = parse_run_properties(reader)?,
                    "t" => text.push_str(&read_text(reader)?),
                    "drawing" | "pict" => {
                        if let Some(image) = parse_picture(reader)? {
                            flush(&mut text, &props, inlines);
                            inlines.push(image);
                        }
                    }
                    local if is_skipped(local) => skip(reader, e)?,
                    _ => depth += 1,
                }
            }
            Event::Empty(ref e) => {
                let name = e.name();
                match XmlParser::local_name(name.as_ref()) {
                    "tab" => text.push('\t'),
                    "br" => {
                        let kind = XmlParser::get_w_attribute(e, "type");
                        if !matches!(kind.as_deref(), Some("page") | Some("column")) {
                            text.push('\n');
                        }
                    }
                    "cr" => text.push('\n'),
                    "noBreakHyphen" => text.push('-'),
                    _ => {}
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Eof => return Err(unexpected_eof("run")),
            _ => {}
        }
        buf.clear();
    }

    flush(&mut text, &props, inlines);
    Ok(())
}

fn parse_run_properties(reader: &mut XmlReader<'_>) -> ConversionResult<RunProps> {
    let mut props = RunProps::default();
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let name = e.name();
                if is_skipped(XmlParser::local_name(name.as_ref())) {
                    skip(reader, e)?;
                } else {
                    depth += 1;
                }
            }
            Event::Empty(ref e) => {
                let name = e.name();
                let value = XmlParser::get_w_attribute(e, "val");
                match XmlParser::local_name(name.as_ref()) {
                    "rStyle" => props.style_id = value,
                    "b" => props.bold = XmlParser::toggle_value(e),
                    "i" => props.italic = XmlParser::toggle_value(e),
                    "u" => props.underline = value.map_or(true, |v| v != "none" && v != "0"),
                    "strike" | "dstrike" => props.strike = props.strike || XmlParser::toggle_value(e),
                    "vertAlign" => {
                        props.vert_align = match value.as_deref() {
                            Some("superscript") => Some(VertAlign::Superscript),
                            Some("subscript") => Some(VertAlign::Subscript),
                            _ => None,
                        }
                    }
                    "color" => props.color = value.as_deref().and_then(hex_color),
                    "highlight" => {
                        props.highlight = value
                            .filter(|v| v != "none")
                            .map(|v| highlight_to_color(&v))
                    }
                    _ => {}
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    return Ok(props);
                }
                depth -= 1;
            }
            Event::Eof => return Err(unexpected_eof("run properties")),
            _ => {}
        }
        buf.clear();
    }
}

/// Text content of a `w:t`, entities resolved, whitespace kept
fn read_text(reader: &mut XmlReader<'_>) -> ConversionResult<String> {
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(ref e) => {
                let unescaped = e
                    .unescape()
                    .map_err(|e| ConversionError::Xml(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e.into_inner())),
            Event::End(_) => return Ok(text),
            Event::Eof => return Err(unexpected_eof("text")),
            _ => {}
        }
        buf.clear();
    }
}

/// `w:drawing` (DrawingML) or `w:pict` (VML). Returns the first embedded
/// picture; linked or shape-only drawings yield nothing.
fn parse_picture(reader: &mut XmlReader<'_>) -> ConversionResult<Option<Inline>> {
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut picture = PictureRefs::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                if XmlParser::matches_element(e.name().as_ref(), "Fallback") {
                    skip(reader, e)?;
                } else {
                    picture.note(e);
                    depth += 1;
                }
            }
            Event::Empty(ref e) => picture.note(e),
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Eof => return Err(unexpected_eof("drawing")),
            _ => {}
        }
        buf.clear();
    }

    Ok(picture
        .rel_id
        .map(|rel_id| Inline::Image { rel_id, alt: picture.alt }))
}

#[derive(Default)]
struct PictureRefs {
    rel_id: Option<String>,
    alt: Option<String>,
}

impl PictureRefs {
    fn note(&mut self, e: &BytesStart) {
        let name = e.name();
        match XmlParser::local_name(name.as_ref()) {
            "blip" if self.rel_id.is_none() => self.rel_id = XmlParser::get_r_attribute(e, "embed"),
            "imagedata" if self.rel_id.is_none() => self.rel_id = XmlParser::get_r_attribute(e, "id"),
            "docPr" | "cNvPr" if self.alt.is_none() => {
                self.alt = XmlParser::get_attribute(e, b"descr")
                    .or_else(|| XmlParser::get_attribute(e, b"title"))
                    .filter(|text| !text.trim().is_empty());
            }
            _ => {}
        }
    }
}

// ============================================================================
// Tables
// ============================================================================

fn parse_table(reader: &mut XmlReader<'_>) -> ConversionResult<TableData> {
    let mut table = TableData::default();
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let name = e.name();
                match XmlParser::local_name(name.as_ref()) {
                    "tr" => table.rows.push(parse_row(reader)?),
                    "tblPr" | "tblGrid" => skip(reader, e)?,
                    local if is_skipped(local) => skip(reader, e)?,
                    _ => depth += 1,
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    return Ok(table);
                }
                depth -= 1;
            }
            Event::Eof => return Err(unexpected_eof("table")),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_row(reader: &mut XmlReader<'_>) -> ConversionResult<RowData> {
    let mut row = RowData::default();
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let name = e.name();
                match XmlParser::local_name(name.as_ref()) {
                    "tc" => row.cells.push(parse_cell(reader)?),
                    "trPr" => row.header = parse_row_header(reader)?,
                    "tblPrEx" => skip(reader, e)?,
                    local if is_skipped(local) => skip(reader, e)?,
                    _ => depth += 1,
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    return Ok(row);
                }
                depth -= 1;
            }
            Event::Eof => return Err(unexpected_eof("table row")),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_row_header(reader: &mut XmlReader<'_>) -> ConversionResult<bool> {
    let mut header = false;
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::Empty(ref e) if XmlParser::matches_element(e.name().as_ref(), "tblHeader") => {
                header = XmlParser::toggle_value(e);
            }
            Event::End(_) => {
                if depth == 0 {
                    return Ok(header);
                }
                depth -= 1;
            }
            Event::Eof => return Err(unexpected_eof("row properties")),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_cell(reader: &mut XmlReader<'_>) -> ConversionResult<CellData> {
    let mut cell = CellData::default();
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let name = e.name();
                match XmlParser::local_name(name.as_ref()) {
                    "tcPr" => parse_cell_properties(reader, &mut cell)?,
                    "p" => cell
                        .content
                        .push(BodyElement::Paragraph(parse_paragraph(reader)?)),
                    "tbl" => cell.content.push(BodyElement::Table(parse_table(reader)?)),
                    local if is_skipped(local) => skip(reader, e)?,
                    _ => depth += 1,
                }
            }
            Event::Empty(ref e) if XmlParser::matches_element(e.name().as_ref(), "p") => {
                cell.content
                    .push(BodyElement::Paragraph(ParagraphData::default()));
            }
            Event::End(_) => {
                if depth == 0 {
                    return Ok(cell);
                }
                depth -= 1;
            }
            Event::Eof => return Err(unexpected_eof("table cell")),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_cell_properties(reader: &mut XmlReader<'_>, cell: &mut CellData) -> ConversionResult<()> {
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::Empty(ref e) => {
                let name = e.name();
                let value = XmlParser::get_w_attribute(e, "val");
                match XmlParser::local_name(name.as_ref()) {
                    "gridSpan" => {
                        cell.grid_span = value.and_then(|v| v.parse().ok()).unwrap_or(1).max(1);
                    }
                    "vMerge" => {
                        cell.v_merge = Some(match value.as_deref() {
                            Some("restart") => VMerge::Restart,
                            _ => VMerge::Continue,
                        });
                    }
                    _ => {}
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Event::Eof => return Err(unexpected_eof("cell properties")),
            _ => {}
        }
        buf.clear();
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn skip(reader: &mut XmlReader<'_>, start: &BytesStart) -> ConversionResult<()> {
    let mut buf = Vec::new();
    reader.read_to_end_into(start.name(), &mut buf)?;
    Ok(())
}

fn unexpected_eof(context: &str) -> ConversionError {
    ConversionError::Xml(format!("unexpected end of document inside {context}"))
}

/// `w:color` value as `#rrggbb`; `auto` and malformed values are dropped
fn hex_color(value: &str) -> Option<String> {
    let is_hex = value.len() == 6 && value.chars().all(|c| c.is_ascii_hexdigit());
    is_hex.then(|| format!("#{}", value.to_ascii_lowercase()))
}

/// Map a `w:highlight` name to a hex color
fn highlight_to_color(name: &str) -> String {
    match name {
        "yellow" => "#ffff00",
        "green" => "#00ff00",
        "cyan" => "#00ffff",
        "magenta" => "#ff00ff",
        "blue" => "#0000ff",
        "red" => "#ff0000",
        "darkBlue" => "#000080",
        "darkCyan" => "#008080",
        "darkGreen" => "#008000",
        "darkMagenta" => "#800080",
        "darkRed" => "#800000",
        "darkYellow" => "#808000",
        "darkGray" | "darkGrey" => "#808080",
        "lightGray" | "lightGrey" => "#c0c0c0",
        "black" => "#000000",
        "white" => "#ffffff",
        _ => "#ffff00", // Default to yellow
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(inner: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
            xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"
            xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
            xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing">
  <w:body>{inner}<w:sectPr><w:pgSz w:w="11906"/></w:sectPr></w:body>
</w:document>"#
        )
    }

    fn only_paragraph(xml: &str) -> ParagraphData {
        match parse_body(&body(xml)).unwrap().as_slice() {
            [BodyElement::Paragraph(p)] => p.clone(),
            other => panic!("expected one paragraph, got {other:?}"),
        }
    }

    fn texts(paragraph: &ParagraphData) -> Vec<&str> {
        paragraph
            .inlines
            .iter()
            .filter_map(|inline| match inline {
                Inline::Text { text, .. } => Some(text.as_str()),
                Inline::Image { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_paragraph_properties_and_runs() {
        let p = only_paragraph(
            r#"<w:p>
                 <w:pPr><w:pStyle w:val="Heading1"/><w:jc w:val="center"/><w:rPr><w:b/></w:rPr></w:pPr>
                 <w:r><w:rPr><w:b/><w:color w:val="FF0000"/></w:rPr><w:t>Bold</w:t></w:r>
                 <w:r><w:t xml:space="preserve"> and </w:t></w:r>
                 <w:r><w:rPr><w:i w:val="false"/><w:u w:val="single"/><w:vertAlign w:val="superscript"/></w:rPr><w:t>x&amp;y</w:t></w:r>
               </w:p>"#,
        );
        assert_eq!(p.style_id.as_deref(), Some("Heading1"));
        assert_eq!(p.align, Some(Alignment::Center));
        assert_eq!(texts(&p), vec!["Bold", " and ", "x&y"]);

        match &p.inlines[0] {
            Inline::Text { props, .. } => {
                assert!(props.bold);
                assert_eq!(props.color.as_deref(), Some("#ff0000"));
            }
            other => panic!("unexpected {other:?}"),
        }
        match &p.inlines[2] {
            Inline::Text { props, .. } => {
                assert!(!props.italic);
                assert!(props.underline);
                assert_eq!(props.vert_align, Some(VertAlign::Superscript));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_breaks_tabs_and_deleted_text() {
        let p = only_paragraph(
            r#"<w:p>
                 <w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t><w:br w:type="page"/></w:r>
                 <w:del w:id="1"><w:r><w:delText>gone</w:delText></w:r></w:del>
                 <w:ins w:id="2"><w:r><w:t>new</w:t></w:r></w:ins>
               </w:p>"#,
        );
        assert_eq!(texts(&p), vec!["a\tb\nc", "new"]);
    }

    #[test]
    fn test_numbering_and_hyperlinks() {
        let p = only_paragraph(
            r##"<w:p>
                 <w:pPr><w:numPr><w:ilvl w:val="1"/><w:numId w:val="3"/></w:numPr></w:pPr>
                 <w:hyperlink r:id="rId7"><w:r><w:t>site</w:t></w:r></w:hyperlink>
                 <w:hyperlink w:anchor="clause2"><w:r><w:t>see</w:t></w:r></w:hyperlink>
               </w:p>"##,
        );
        assert_eq!(p.numbering, Some(NumberingRef { num_id: 3, ilvl: 1 }));
        let links: Vec<_> = p
            .inlines
            .iter()
            .map(|inline| match inline {
                Inline::Text { link, .. } => link.clone(),
                Inline::Image { .. } => None,
            })
            .collect();
        assert_eq!(
            links,
            vec![
                Some(LinkTarget::Relationship("rId7".into())),
                Some(LinkTarget::Anchor("clause2".into()))
            ]
        );
    }

    #[test]
    fn test_drawing_splits_run_text() {
        let p = only_paragraph(
            r#"<w:p><w:r>
                 <w:t>before</w:t>
                 <w:drawing><wp:inline>
                   <wp:docPr id="1" name="Picture 1" descr="Seal"/>
                   <a:graphic><a:graphicData><pic:pic xmlns:pic="p"><pic:blipFill><a:blip r:embed="rId5"/></pic:blipFill></pic:pic></a:graphicData></a:graphic>
                 </wp:inline></w:drawing>
                 <w:t>after</w:t>
               </w:r></w:p>"#,
        );
        assert_eq!(p.inlines.len(), 3);
        assert_eq!(
            p.inlines[1],
            Inline::Image {
                rel_id: "rId5".into(),
                alt: Some("Seal".into())
            }
        );
    }

    #[test]
    fn test_table_structure() {
        let elements = parse_body(&body(
            r#"<w:tbl>
                 <w:tblPr><w:tblW w:w="0"/></w:tblPr>
                 <w:tblGrid><w:gridCol w:w="100"/><w:gridCol w:w="100"/></w:tblGrid>
                 <w:tr><w:trPr><w:tblHeader/></w:trPr>
                   <w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:r><w:t>H</w:t></w:r></w:p></w:tc>
                 </w:tr>
                 <w:tr>
                   <w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p/></w:tc>
                   <w:tc><w:p><w:r><w:t>x</w:t></w:r></w:p></w:tc>
                 </w:tr>
                 <w:tr>
                   <w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc>
                   <w:tc><w:p><w:r><w:t>y</w:t></w:r></w:p></w:tc>
                 </w:tr>
               </w:tbl>"#,
        ))
        .unwrap();

        let table = match elements.as_slice() {
            [BodyElement::Table(table)] => table,
            other => panic!("expected a table, got {other:?}"),
        };
        assert_eq!(table.rows.len(), 3);
        assert!(table.rows[0].header);
        assert_eq!(table.rows[0].cells[0].grid_span, 2);
        assert_eq!(table.rows[1].cells[0].v_merge, Some(VMerge::Restart));
        assert_eq!(table.rows[2].cells[0].v_merge, Some(VMerge::Continue));
        assert_eq!(table.rows[2].cells[1].content.len(), 1);
    }

    #[test]
    fn test_content_controls_are_transparent() {
        let elements = parse_body(&body(
            r#"<w:sdt><w:sdtPr><w:alias w:val="Party"/></w:sdtPr><w:sdtContent>
                 <w:p><w:r><w:t>inside</w:t></w:r></w:p>
               </w:sdtContent></w:sdt>
               <w:p><w:r><w:t>outside</w:t></w:r></w:p>"#,
        ))
        .unwrap();
        assert_eq!(elements.len(), 2);
    }

    #[test]
    fn test_missing_body_is_structural_error() {
        let result = parse_body(r#"<w:document xmlns:w="w"></w:document>"#);
        assert!(matches!(result, Err(ConversionError::InvalidStructure(_))));
    }

    #[test]
    fn test_truncated_xml_is_error() {
        let result = parse_body(r#"<w:document xmlns:w="w"><w:body><w:p><w:r><w:t>cut"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_alignment_values() {
        assert_eq!(parse_alignment("both"), Some(Alignment::Justify));
        assert_eq!(parse_alignment("right"), Some(Alignment::Right));
        assert_eq!(parse_alignment("start"), None);
        assert_eq!(parse_alignment("end"), None);
    }

    #[test]
    fn test_colors() {
        assert_eq!(hex_color("auto"), None);
        assert_eq!(hex_color("1F4E79").as_deref(), Some("#1f4e79"));
        assert_eq!(highlight_to_color("darkBlue"), "#000080");
        assert_eq!(highlight_to_color("unknown"), "#ffff00");
    }
}
