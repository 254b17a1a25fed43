//! DOCX import
//!
//! Converts an office word-processing package into the rich-text document
//! model. Paragraph and run styles are mapped to semantics through an
//! ordered [`StyleMap`], embedded images are inlined as `data:` URIs and
//! the result is wrapped in a direction/typography envelope.
//!
//! ```no_run
//! let bytes = std::fs::read("agreement.docx")?;
//! let output = docx_import::convert(&bytes)?;
//! println!("{}", output.markup);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod assemble;
mod content_types;
mod diagnostics;
mod document;
mod error;
mod media;
mod numbering;
mod options;
mod pipeline;
mod reader;
mod relationships;
pub mod style_map;
mod styles;

pub use content_types::content_type_values;
pub use diagnostics::{Diagnostic, Severity};
pub use error::{AssetInlineFailure, ConversionError, ConversionResult};
pub use media::{
    mime_from_extension, placeholder_data_uri, InlineResource, MediaAsset, MediaInliner,
    RasterFormat, PLACEHOLDER_CLASS,
};
pub use options::{ImportOptions, DEFAULT_ENVELOPE_CLASS, DEFAULT_TYPOGRAPHY};
pub use pipeline::{
    convert, convert_async, passthrough, ConversionOutput, DocumentImporter, PreviewPayload,
};
pub use style_map::{
    BlockTarget, MatchKind, SemanticTarget, StyleContext, StyleMap, StyleRule, TableClasses,
};
