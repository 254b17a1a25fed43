//! End-to-end conversions of in-memory DOCX packages

use docx_import::{
    convert, convert_async, ConversionError, DocumentImporter, ImportOptions, Severity, StyleMap,
    StyleRule, BlockTarget, PLACEHOLDER_CLASS,
};
use doc_model::NodeKind;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="png" ContentType="image/png"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
</Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style>
  <w:style w:type="character" w:styleId="Strong"><w:name w:val="Strong"/></w:style>
</w:styles>"#;

fn document(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
            xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"
            xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
            xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing">
  <w:body>{body}</w:body>
</w:document>"#
    )
}

fn package(parts: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in parts {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn docx(body: &str, media: Option<&[u8]>) -> Vec<u8> {
    let document = document(body);
    let mut parts: Vec<(&str, &[u8])> = vec![
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()),
        ("word/styles.xml", STYLES.as_bytes()),
        ("word/document.xml", document.as_bytes()),
    ];
    if let Some(bytes) = media {
        parts.push(("word/media/image1.png", bytes));
    }
    package(&parts)
}

const HEADING_STRONG_TABLE: &str = r#"
<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Lease Agreement</w:t></w:r></w:p>
<w:p>
  <w:r><w:t xml:space="preserve">The </w:t></w:r>
  <w:r><w:rPr><w:rStyle w:val="Strong"/></w:rPr><w:t>Tenant</w:t></w:r>
  <w:r><w:t xml:space="preserve"> agrees.</w:t></w:r>
</w:p>
<w:tbl>
  <w:tblPr><w:tblStyle w:val="TableGrid"/></w:tblPr>
  <w:tblGrid><w:gridCol w:w="4000"/><w:gridCol w:w="4000"/></w:tblGrid>
  <w:tr><w:tc><w:p><w:r><w:t>A1</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>B1</w:t></w:r></w:p></w:tc></w:tr>
  <w:tr><w:tc><w:p><w:r><w:t>A2</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>B2</w:t></w:r></w:p></w:tc></w:tr>
</w:tbl>
<w:sectPr/>"#;

const IMAGE_PARAGRAPH: &str = r#"
<w:p><w:r>
  <w:t>Signed:</w:t>
  <w:drawing><wp:inline>
    <wp:docPr id="1" name="Picture 1" descr="signature"/>
    <a:graphic><a:graphicData><pic:pic xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">
      <pic:blipFill><a:blip r:embed="rId5"/></pic:blipFill>
    </pic:pic></a:graphicData></a:graphic>
  </wp:inline></w:drawing>
</w:r></w:p>"#;

#[test]
fn test_heading_strong_and_table() {
    let output = convert(&docx(HEADING_STRONG_TABLE, None)).unwrap();

    assert_eq!(
        output.markup,
        "<div class=\"docx-content\" dir=\"rtl\" style=\"font-family: &apos;David&apos;, &apos;Times New Roman&apos;, serif\">\
         <h1 class=\"heading-1\">Lease Agreement</h1>\
         <p>The <strong>Tenant</strong> agrees.</p>\
         <table class=\"docx-table\">\
         <tr class=\"docx-tr\"><td class=\"docx-td\"><p>A1</p></td><td class=\"docx-td\"><p>B1</p></td></tr>\
         <tr class=\"docx-tr\"><td class=\"docx-td\"><p>A2</p></td><td class=\"docx-td\"><p>B2</p></td></tr>\
         </table></div>"
    );
    assert!(output.diagnostics.is_empty());

    let table = &output.tree.blocks[2];
    assert_eq!(table.kind, NodeKind::Table);
    assert_eq!((table.row_count(), table.column_count()), (2, 2));
}

#[test]
fn test_corrupt_image_yields_one_diagnostic() {
    let output = convert(&docx(IMAGE_PARAGRAPH, Some(b"definitely not a png".as_slice()))).unwrap();

    assert_eq!(output.diagnostics.len(), 1);
    let diagnostic = &output.diagnostics[0];
    assert_eq!(diagnostic.severity, Severity::Warning);
    assert_eq!(diagnostic.asset.as_deref(), Some("word/media/image1.png"));

    let image = &output.tree.blocks[1];
    assert_eq!(image.kind, NodeKind::Image);
    assert_eq!(image.attrs.class.as_deref(), Some(PLACEHOLDER_CLASS));
    assert_eq!(image.attrs.alt.as_deref(), Some("signature"));
    assert_eq!(output.tree.plain_text(), "Signed:");
}

#[test]
fn test_missing_image_part_yields_one_diagnostic() {
    let output = convert(&docx(IMAGE_PARAGRAPH, None)).unwrap();
    assert_eq!(output.diagnostics.len(), 1);
    assert!(output.markup.contains(PLACEHOLDER_CLASS));
}

#[test]
fn test_image_pointing_at_non_image_part_yields_placeholder() {
    let body = IMAGE_PARAGRAPH.replace("rId5", "rId1");
    let output = convert(&docx(&body, None)).unwrap();

    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].asset.as_deref(), Some("rId1"));
    assert_eq!(
        output.tree.blocks[1].attrs.class.as_deref(),
        Some(PLACEHOLDER_CLASS)
    );
}

#[tokio::test]
async fn test_async_conversion_inlines_images() {
    let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";
    let output = convert_async(docx(IMAGE_PARAGRAPH, Some(png.as_slice()))).await.unwrap();

    assert!(output.diagnostics.is_empty());
    let src = output.tree.blocks[1].attrs.src.as_deref().unwrap();
    assert!(src.starts_with("data:image/png;base64,iVBORw0KGgo"));
}

#[test]
fn test_not_a_zip() {
    let result = convert(b"this is not a zip archive");
    assert!(matches!(result, Err(ConversionError::Zip(_))));
}

#[test]
fn test_missing_main_part() {
    let bytes = package(&[("[Content_Types].xml", CONTENT_TYPES.as_bytes())]);
    match convert(&bytes) {
        Err(ConversionError::MissingPart(part)) => assert_eq!(part, "word/document.xml"),
        other => panic!("expected a missing part error, got {other:?}"),
    }
}

#[test]
fn test_invalid_xml_in_main_part() {
    let bytes = package(&[
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        ("word/document.xml", b"<w:document><w:body><w:p></w:body>".as_slice()),
    ]);
    assert!(matches!(convert(&bytes), Err(ConversionError::Xml(_))));
}

#[test]
fn test_custom_options() {
    let style_map = StyleMap::default()
        .prepend_rule(StyleRule::paragraph("Heading 1", BlockTarget::Heading(2)));
    let options = ImportOptions::default()
        .with_style_map(style_map)
        .with_direction(None)
        .with_typography(None);
    let importer = DocumentImporter::new(options);

    let output = importer.convert(&docx(HEADING_STRONG_TABLE, None)).unwrap();
    assert!(output
        .markup
        .starts_with("<div class=\"docx-content\"><h2>Lease Agreement</h2>"));
}
