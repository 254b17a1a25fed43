//! Edit Engine - Command system, active-state queries, and undo/redo
//!
//! Commands are pure functions from a tree and selection to a new tree and
//! selection. The [`EditingEngine`] owns the current snapshot, records one
//! history entry per committed command and notifies subscribers.

mod command;
mod executor;
mod undo;
mod error;
mod mark_commands;
mod hyperlink_commands;
mod paragraph_commands;
mod list_commands;
mod table_commands;
mod image_commands;
pub mod query;
mod toolbar;

pub use command::*;
pub use executor::*;
pub use undo::*;
pub use error::*;
pub use mark_commands::*;
pub use hyperlink_commands::*;
pub use paragraph_commands::*;
pub use list_commands::*;
pub use table_commands::*;
pub use image_commands::*;
pub use query::{can_execute, is_active, ActiveQuery};
pub use toolbar::*;
