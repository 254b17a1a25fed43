//! numbering.xml parser
//!
//! Resolves a paragraph's `(numId, ilvl)` to the kind of list it belongs
//! to. Only the bullet/ordered distinction survives import.

use crate::error::ConversionResult;
use crate::reader::XmlParser;
use quick_xml::events::Event;
use std::collections::HashMap;

/// Bullet or numbered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Bullet,
    Ordered,
}

impl ListKind {
    fn from_format(num_fmt: &str) -> Self {
        match num_fmt {
            "bullet" | "none" => ListKind::Bullet,
            _ => ListKind::Ordered,
        }
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self, ListKind::Ordered)
    }
}

/// Numbering definitions of a package
#[derive(Debug, Clone, Default)]
pub struct Numbering {
    /// abstractNumId -> ilvl -> numFmt
    abstract_formats: HashMap<u32, HashMap<u8, String>>,
    /// numId -> abstractNumId
    instances: HashMap<u32, u32>,
}

impl Numbering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse numbering.xml
    pub fn parse(content: &str) -> ConversionResult<Self> {
        let mut result = Self::new();
        let mut reader = XmlParser::from_string(content);
        let mut buf = Vec::new();

        let mut current_abstract: Option<u32> = None;
        let mut current_level: Option<u8> = None;
        let mut current_num: Option<u32> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    let name = e.name();
                    let local = XmlParser::local_name(name.as_ref());
                    match local {
                        "abstractNum" => {
                            current_abstract = XmlParser::get_w_attribute(e, "abstractNumId")
                                .and_then(|id| id.parse().ok());
                        }
                        "lvl" => {
                            current_level =
                                XmlParser::get_w_attribute(e, "ilvl").and_then(|l| l.parse().ok());
                        }
                        "num" => {
                            current_num =
                                XmlParser::get_w_attribute(e, "numId").and_then(|n| n.parse().ok());
                        }
                        _ => {}
                    }
                }
                Event::Empty(ref e) => {
                    let name = e.name();
                    let local = XmlParser::local_name(name.as_ref());
                    let value = XmlParser::get_w_attribute(e, "val");
                    match (local, value) {
                        ("numFmt", Some(fmt)) => {
                            if let (Some(abs), Some(level)) = (current_abstract, current_level) {
                                result
                                    .abstract_formats
                                    .entry(abs)
                                    .or_default()
                                    .insert(level, fmt);
                            }
                        }
                        ("abstractNumId", Some(abs)) => {
                            if let (Some(num), Ok(abs)) = (current_num, abs.parse()) {
                                result.instances.insert(num, abs);
                            }
                        }
                        _ => {}
                    }
                }
                Event::End(ref e) => {
                    let name = e.name();
                    match XmlParser::local_name(name.as_ref()) {
                        "abstractNum" => current_abstract = None,
                        "lvl" => current_level = None,
                        "num" => current_num = None,
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(result)
    }

    /// List kind for a numbering reference. `numId` 0 is Word's explicit
    /// "no numbering"; unknown IDs also yield `None`.
    pub fn list_kind(&self, num_id: u32, ilvl: u8) -> Option<ListKind> {
        if num_id == 0 {
            return None;
        }
        let abs = self.instances.get(&num_id)?;
        let levels = self.abstract_formats.get(abs)?;
        let format = levels.get(&ilvl).or_else(|| levels.get(&0))?;
        Some(ListKind::from_format(format))
    }
}
