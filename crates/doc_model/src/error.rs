//! Error types for document model operations

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocModelError {
    #[error("No node at path {0:?}")]
    InvalidPath(Vec<usize>),

    #[error("Invalid position: path {path:?}, offset {offset}")]
    InvalidPosition { path: Vec<usize>, offset: usize },

    #[error("Markup error: {0}")]
    Markup(String),

    #[error("Invariant violation at {path:?}: {reason}")]
    InvariantViolation { path: Vec<usize>, reason: String },
}

pub type Result<T> = std::result::Result<T, DocModelError>;
