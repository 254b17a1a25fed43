//! styles.xml parser
//!
//! Only the style identity matters for import: the style map matches on
//! display names (`heading 1`), while the body references style IDs
//! (`Heading1`).

use crate::error::ConversionResult;
use crate::reader::XmlParser;
use quick_xml::events::Event;
use std::collections::HashMap;

/// Kind of a style definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleKind {
    Paragraph,
    Character,
    Table,
    Numbering,
}

impl StyleKind {
    fn parse(value: &str) -> Self {
        match value {
            "character" => StyleKind::Character,
            "table" => StyleKind::Table,
            "numbering" => StyleKind::Numbering,
            _ => StyleKind::Paragraph,
        }
    }
}

/// Style ID to display name lookup
#[derive(Debug, Clone, Default)]
pub struct StyleNames {
    names: HashMap<(StyleKind, String), String>,
}

impl StyleNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse styles.xml
    pub fn parse(content: &str) -> ConversionResult<Self> {
        let mut result = Self::new();
        let mut reader = XmlParser::from_string(content);
        let mut buf = Vec::new();

        let mut current: Option<(StyleKind, String)> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) if XmlParser::matches_element(e.name().as_ref(), "style") => {
                    let kind = XmlParser::get_w_attribute(e, "type")
                        .map(|t| StyleKind::parse(&t))
                        .unwrap_or(StyleKind::Paragraph);
                    current = XmlParser::get_w_attribute(e, "styleId").map(|id| (kind, id));
                }
                Event::Empty(ref e) | Event::Start(ref e)
                    if XmlParser::matches_element(e.name().as_ref(), "name") =>
                {
                    if let (Some(key), Some(name)) =
                        (current.as_ref(), XmlParser::get_w_attribute(e, "val"))
                    {
                        result.names.insert(key.clone(), name);
                    }
                }
                Event::End(ref e) if XmlParser::matches_element(e.name().as_ref(), "style") => {
                    current = None;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(result)
    }

    /// Display name for a style ID, if the package defines one
    pub fn name_of(&self, kind: StyleKind, style_id: &str) -> Option<&str> {
        self.names
            .get(&(kind, style_id.to_string()))
            .map(String::as_str)
    }

    /// Display name, falling back to the ID itself for undefined styles
    pub fn resolve<'a>(&'a self, kind: StyleKind, style_id: &'a str) -> &'a str {
        self.name_of(kind, style_id).unwrap_or(style_id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/>
    <w:basedOn w:val="Normal"/>
    <w:rPr><w:b/></w:rPr>
  </w:style>
  <w:style w:type="character" w:styleId="Strong">
    <w:name w:val="Strong"/>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Strong">
    <w:name w:val="Strong Paragraph"/>
  </w:style>
</w:styles>"#;

    #[test]
    fn test_names_by_kind() {
        let names = StyleNames::parse(STYLES).unwrap();
        assert_eq!(names.len(), 3);
        assert_eq!(names.name_of(StyleKind::Paragraph, "Heading1"), Some("heading 1"));
        assert_eq!(names.name_of(StyleKind::Character, "Strong"), Some("Strong"));
        assert_eq!(names.name_of(StyleKind::Paragraph, "Strong"), Some("Strong Paragraph"));
    }

    #[test]
    fn test_unknown_id_falls_back() {
        let names = StyleNames::new();
        assert_eq!(names.resolve(StyleKind::Paragraph, "Custom7"), "Custom7");
    }
}
