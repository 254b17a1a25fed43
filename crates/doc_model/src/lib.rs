//! Document Model - Rich-text tree of block nodes and marked text runs
//!
//! The tree is a plain value: editing code clones it, mutates the copy and
//! hands back a new snapshot. Positions address textblocks by index path,
//! which keeps snapshots free of identity bookkeeping.

mod error;
mod mark;
mod run;
mod node;
mod selection;
mod tree;
pub mod markup;
mod markup_parser;

pub use error::*;
pub use mark::*;
pub use run::*;
pub use node::*;
pub use selection::*;
pub use tree::*;
pub use markup::to_markup;
pub use markup_parser::parse_markup;

/// Deepest nesting level a list item may reach (depth is zero-based).
pub const MAX_LIST_DEPTH: usize = 8;
