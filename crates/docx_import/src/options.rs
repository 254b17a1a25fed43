//! Import options

use crate::style_map::StyleMap;
use doc_model::{DocumentLayout, TextDirection};
use std::sync::Arc;

/// Typography applied to imported documents unless overridden
pub const DEFAULT_TYPOGRAPHY: &str = "'David', 'Times New Roman', serif";

/// Class of the envelope `div`
pub const DEFAULT_ENVELOPE_CLASS: &str = "docx-content";

/// How a package is turned into a document
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Envelope direction; `None` leaves `dir` off
    pub direction: Option<TextDirection>,
    /// CSS font-family list for the envelope; `None` leaves it off
    pub typography: Option<String>,
    pub envelope_class: Option<String>,
    pub ignore_empty_paragraphs: bool,
    pub style_map: Arc<StyleMap>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            direction: Some(TextDirection::Rtl),
            typography: Some(DEFAULT_TYPOGRAPHY.to_string()),
            envelope_class: Some(DEFAULT_ENVELOPE_CLASS.to_string()),
            ignore_empty_paragraphs: true,
            style_map: Arc::new(StyleMap::default()),
        }
    }
}

impl ImportOptions {
    pub fn with_style_map(mut self, style_map: StyleMap) -> Self {
        self.style_map = Arc::new(style_map);
        self
    }

    pub fn with_direction(mut self, direction: Option<TextDirection>) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_typography(mut self, typography: Option<String>) -> Self {
        self.typography = typography;
        self
    }

    pub fn keep_empty_paragraphs(mut self) -> Self {
        self.ignore_empty_paragraphs = false;
        self
    }

    /// The envelope for the converted document, if any part of it is set
    pub fn layout(&self) -> Option<DocumentLayout> {
        let layout = DocumentLayout {
            direction: self.direction,
            typography: self.typography.clone(),
            class: self.envelope_class.clone(),
        };
        (layout != DocumentLayout::default()).then_some(layout)
    }
}
