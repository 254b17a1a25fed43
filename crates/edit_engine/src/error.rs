//! Error types for editing operations

use doc_model::DocModelError;
use thiserror::Error;

/// Why a command refused to run.
///
/// Rejections are expected outcomes: the toolbar probes them through
/// `can_execute` and the engine leaves all state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("selection is empty")]
    EmptySelection,

    #[error("no active table cell")]
    NoActiveTableCell,

    #[error("tables cannot be nested")]
    NestedTable,

    #[error("selection is not inside a list")]
    NotInList,

    #[error("list item is already at the top level")]
    AtTopLevel,

    #[error("no preceding list item to nest under")]
    NoPrecedingSibling,

    #[error("maximum list depth exceeded")]
    MaxDepthExceeded,

    #[error("URI must not be empty")]
    EmptyUri,

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not applicable: {0}")]
    NotApplicable(String),

    #[error("text replacement must stay within one block")]
    CrossBlockEdit,

    #[error("mark is not active at the selection")]
    MarkNotActive,
}

#[derive(Debug, Error)]
pub enum EditError {
    #[error("Command rejected: {0}")]
    Rejected(#[from] RejectReason),

    /// A command produced a tree that breaks a model invariant
    #[error("Invariant violation: {0}")]
    Invariant(DocModelError),

    #[error("Document model error: {0}")]
    DocModel(#[from] DocModelError),
}

impl EditError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, EditError::Rejected(_))
    }

    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match self {
            EditError::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EditError>;
