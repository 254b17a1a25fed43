//! [Content_Types].xml parsing
//!
//! Declares the MIME type of every part, by extension or by part name.

use crate::error::ConversionResult;
use crate::reader::XmlParser;
use quick_xml::events::Event;
use std::collections::HashMap;

/// Content type values used during import
pub mod content_type_values {
    pub const DOCX: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
    pub const MAIN_DOCUMENT: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
    pub const MACRO_DOCUMENT: &str = "application/vnd.ms-word.document.macroEnabled.main+xml";
    pub const TEMPLATE_DOCUMENT: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.template.main+xml";
}

/// The content types declared by a package
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    /// Default content types by lowercase extension (e.g. "png" -> "image/png")
    pub defaults: HashMap<String, String>,
    /// Override content types by part name (e.g. "/word/document.xml" -> "...")
    pub overrides: HashMap<String, String>,
}

impl ContentTypes {
    /// Parse [Content_Types].xml from its content
    pub fn parse(content: &str) -> ConversionResult<Self> {
        let mut result = Self::default();
        let mut reader = XmlParser::from_string(content);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(ref e) | Event::Start(ref e) => {
                    let name = e.name();
                    if XmlParser::matches_element(name.as_ref(), "Default") {
                        if let (Some(ext), Some(ct)) = (
                            XmlParser::get_attribute(e, b"Extension"),
                            XmlParser::get_attribute(e, b"ContentType"),
                        ) {
                            result.defaults.insert(ext.to_ascii_lowercase(), ct);
                        }
                    } else if XmlParser::matches_element(name.as_ref(), "Override") {
                        if let (Some(part), Some(ct)) = (
                            XmlParser::get_attribute(e, b"PartName"),
                            XmlParser::get_attribute(e, b"ContentType"),
                        ) {
                            result.overrides.insert(part, ct);
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(result)
    }

    /// Get the content type for a part path (with or without leading `/`)
    pub fn get_content_type(&self, path: &str) -> Option<&str> {
        let normalized_path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };

        if let Some(ct) = self.overrides.get(&normalized_path) {
            return Some(ct);
        }

        let (_, ext) = path.rsplit_once('.')?;
        self.defaults
            .get(&ext.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="PNG" ContentType="image/png"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

    #[test]
    fn test_parse_and_lookup() {
        let ct = ContentTypes::parse(SAMPLE).unwrap();
        assert_eq!(ct.get_content_type("word/media/image1.png"), Some("image/png"));
        assert_eq!(
            ct.get_content_type("/word/document.xml"),
            Some(content_type_values::MAIN_DOCUMENT)
        );
        assert_eq!(ct.get_content_type("word/media/blob"), None);
    }
}
