//! Relationships (.rels) parsing
//!
//! DOCX uses relationships to connect parts of the document together.

use crate::error::{ConversionError, ConversionResult};
use crate::reader::XmlParser;
use quick_xml::events::Event;
use std::collections::HashMap;

/// Relationship type URIs the importer follows
pub mod relationship_types {
    pub const DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const DOCUMENT_STRICT: &str =
        "http://purl.oclc.org/ooxml/officeDocument/relationships/officeDocument";
    pub const STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const NUMBERING: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
}

/// A single relationship in a .rels file
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Unique ID within the rels file (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative to the source part) or URL
    pub target: String,
    pub target_mode: TargetMode,
}

/// Target mode for relationships
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TargetMode {
    /// Internal target within the package
    #[default]
    Internal,
    /// External target (URL)
    External,
}

/// Collection of relationships from a .rels file
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    relationships: HashMap<String, Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a .rels file from its XML content
    pub fn parse(content: &str) -> ConversionResult<Self> {
        let mut result = Self::new();
        let mut reader = XmlParser::from_string(content);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(ref e) | Event::Start(ref e) => {
                    if XmlParser::matches_element(e.name().as_ref(), "Relationship") {
                        let missing = |attr: &str| {
                            ConversionError::InvalidStructure(format!("Relationship missing {attr}"))
                        };
                        let id = XmlParser::get_attribute(e, b"Id").ok_or_else(|| missing("Id"))?;
                        let rel_type =
                            XmlParser::get_attribute(e, b"Type").ok_or_else(|| missing("Type"))?;
                        let target =
                            XmlParser::get_attribute(e, b"Target").ok_or_else(|| missing("Target"))?;
                        let target_mode = match XmlParser::get_attribute(e, b"TargetMode") {
                            Some(mode) if mode == "External" => TargetMode::External,
                            _ => TargetMode::Internal,
                        };

                        result.relationships.insert(
                            id.clone(),
                            Relationship {
                                id,
                                rel_type,
                                target,
                                target_mode,
                            },
                        );
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(result)
    }

    /// Get a relationship by ID
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.relationships.get(id)
    }

    /// Get a relationship by type. Ties resolve to the lowest ID so the
    /// result does not depend on map order.
    pub fn get_by_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.get_all_by_type(rel_type).into_iter().next()
    }

    /// Get all relationships of a given type, ordered by ID
    pub fn get_all_by_type(&self, rel_type: &str) -> Vec<&Relationship> {
        let mut found: Vec<&Relationship> = self
            .relationships
            .values()
            .filter(|r| r.rel_type == rel_type)
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }

    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }
}

/// Resolve an internal relationship target against the folder of its
/// source part, e.g. `media/image1.png` from `word/document.xml` becomes
/// `word/media/image1.png`. Absolute targets start at the package root.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((folder, _)) => folder.split('/').filter(|s| !s.is_empty()).collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Folder-level rels path for a part: `word/document.xml` ->
/// `word/_rels/document.xml.rels`
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((folder, file)) => format!("{folder}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}
