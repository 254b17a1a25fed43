//! Error types for DOCX import

use thiserror::Error;

/// Errors that abort a conversion
#[derive(Debug, Error)]
pub enum ConversionError {
    /// IO error while reading the input
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not a readable ZIP archive
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error in one of the package parts
    #[error("XML parsing error: {0}")]
    Xml(String),

    /// The package is a ZIP but not a word-processing document
    #[error("Invalid DOCX structure: {0}")]
    InvalidStructure(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// The assembled document could not be serialized or read back
    #[error("Document model error: {0}")]
    Markup(#[from] doc_model::DocModelError),

    /// A background conversion task was cancelled or panicked
    #[error("Conversion task failed: {0}")]
    Task(String),
}

impl From<quick_xml::Error> for ConversionError {
    fn from(err: quick_xml::Error) -> Self {
        ConversionError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ConversionError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        ConversionError::Xml(format!("Attribute error: {}", err))
    }
}

/// Result type for conversion operations
pub type ConversionResult<T> = std::result::Result<T, ConversionError>;

/// Why a single embedded asset could not be inlined.
///
/// These never abort a conversion; each one becomes a placeholder image
/// and a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetInlineFailure {
    #[error("asset {0} is not present in the package")]
    Missing(String),

    #[error("asset {0} is empty")]
    Empty(String),

    #[error("asset {reference} is declared as {declared} but its bytes do not match")]
    SignatureMismatch { reference: String, declared: String },

    #[error("asset {0} has no recognizable image type")]
    UnknownType(String),

    #[error("asset {reference} could not be read: {reason}")]
    Unreadable { reference: String, reason: String },
}

impl AssetInlineFailure {
    /// The package reference of the failed asset
    pub fn reference(&self) -> &str {
        match self {
            AssetInlineFailure::Missing(reference)
            | AssetInlineFailure::Empty(reference)
            | AssetInlineFailure::UnknownType(reference) => reference,
            AssetInlineFailure::SignatureMismatch { reference, .. }
            | AssetInlineFailure::Unreadable { reference, .. } => reference,
        }
    }
}
