//! ZIP archive reading and XML parsing utilities

use crate::error::{ConversionError, ConversionResult};
use quick_xml::events::BytesStart;
use quick_xml::Reader;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// A wrapper around a ZIP archive for reading DOCX packages
pub struct DocxReader<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> DocxReader<R> {
    /// Open a package from a source that implements Read + Seek
    pub fn new(reader: R) -> ConversionResult<Self> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { archive })
    }

    /// Read a part from the archive as a string
    pub fn read_file_as_string(&mut self, path: &str) -> ConversionResult<String> {
        let bytes = self.read_file_as_bytes(path)?;
        String::from_utf8(bytes)
            .map_err(|e| ConversionError::Xml(format!("{} is not valid UTF-8: {}", path, e)))
    }

    /// Read a part from the archive as bytes
    pub fn read_file_as_bytes(&mut self, path: &str) -> ConversionResult<Vec<u8>> {
        let mut file = self.archive.by_name(path).map_err(|e| {
            if matches!(e, zip::result::ZipError::FileNotFound) {
                ConversionError::MissingPart(path.to_string())
            } else {
                ConversionError::from(e)
            }
        })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        Ok(contents)
    }

    /// Read an optional part; absence is not an error
    pub fn read_optional_string(&mut self, path: &str) -> ConversionResult<Option<String>> {
        if !self.file_exists(path) {
            return Ok(None);
        }
        self.read_file_as_string(path).map(Some)
    }

    /// Check if a part exists in the archive
    pub fn file_exists(&self, path: &str) -> bool {
        self.archive.file_names().any(|name| name == path)
    }
}

/// XML reader utilities for DOCX parts
pub struct XmlParser;

impl XmlParser {
    /// Reader for metadata parts, where whitespace between elements is noise
    pub fn from_string(content: &str) -> Reader<&[u8]> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);
        reader
    }

    /// Reader for body text. `w:t` runs may be pure whitespace
    /// (`xml:space="preserve"`), so nothing is trimmed.
    pub fn from_string_untrimmed(content: &str) -> Reader<&[u8]> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(false);
        reader
    }

    /// Get an attribute value from an element
    pub fn get_attribute(event: &BytesStart, name: &[u8]) -> Option<String> {
        event
            .attributes()
            .filter_map(|a| a.ok())
            .find(|a| a.key.as_ref() == name)
            .map(|a| match a.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(_) => String::from_utf8_lossy(&a.value).to_string(),
            })
    }

    /// Get an attribute value with a namespace prefix
    pub fn get_prefixed_attribute(event: &BytesStart, prefix: &str, local: &str) -> Option<String> {
        let key = format!("{}:{}", prefix, local);
        Self::get_attribute(event, key.as_bytes())
    }

    /// Get a w: namespaced attribute (most common in DOCX)
    pub fn get_w_attribute(event: &BytesStart, name: &str) -> Option<String> {
        Self::get_prefixed_attribute(event, "w", name)
            .or_else(|| Self::get_attribute(event, name.as_bytes()))
    }

    /// Get a r: namespaced attribute
    pub fn get_r_attribute(event: &BytesStart, name: &str) -> Option<String> {
        Self::get_prefixed_attribute(event, "r", name)
    }

    /// Parse a boolean value (0/1, true/false, on/off)
    pub fn parse_bool(value: &str) -> bool {
        matches!(value.to_lowercase().as_str(), "1" | "true" | "on" | "yes")
    }

    /// Toggle properties like `<w:b/>` are on unless `w:val` says otherwise
    pub fn toggle_value(event: &BytesStart) -> bool {
        Self::get_w_attribute(event, "val")
            .map(|v| Self::parse_bool(&v))
            .unwrap_or(true)
    }

    /// Check if an element name matches with optional namespace prefix
    pub fn matches_element(name: &[u8], expected: &str) -> bool {
        Self::local_name(name) == expected
    }

    /// Element name without its namespace prefix
    pub fn local_name(name: &[u8]) -> &str {
        let name_str = std::str::from_utf8(name).unwrap_or("");
        match name_str.rsplit_once(':') {
            Some((_, local)) => local,
            None => name_str,
        }
    }
}
