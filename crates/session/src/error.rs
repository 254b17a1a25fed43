//! Error types for sessions and settings

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Import failed: {0}")]
    Conversion(#[from] docx_import::ConversionError),

    #[error("Edit failed: {0}")]
    Edit(#[from] edit_engine::EditError),

    #[error("Document model error: {0}")]
    DocModel(#[from] doc_model::DocModelError),

    #[error("No open session {0}")]
    SessionNotFound(Uuid),

    #[error("Import was cancelled")]
    ImportCancelled,

    #[error("Import task failed: {0}")]
    ImportTask(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
