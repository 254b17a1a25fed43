//! Conversion diagnostics

use crate::error::AssetInlineFailure;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A non-fatal note about a conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Package reference of the asset concerned, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
}

impl Diagnostic {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            asset: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            asset: None,
        }
    }

    /// One diagnostic per failed asset
    pub fn asset_failure(failure: &AssetInlineFailure) -> Self {
        Self {
            severity: Severity::Warning,
            message: failure.to_string(),
            asset: Some(failure.reference().to_string()),
        }
    }
}
