//! Sessions - Open documents, background import and editor settings
//!
//! Ties the import pipeline to the editing engine: an [`ImportHandle`]
//! converts a package in the background, a [`SessionRegistry`] opens the
//! result as a [`DocumentSession`] and serializes commands against it.

pub mod chat;
mod error;
mod import;
mod session;
pub mod settings;

pub use error::*;
pub use import::ImportHandle;
pub use session::{DocumentSession, SessionRegistry};
pub use settings::{EditingSettings, EditorSettings, ImportSettings, SettingsManager};
