//! Table editing commands
//!
//! This module implements commands for creating and modifying tables:
//! - InsertTable: Create a new table with specified rows and columns
//! - AddRow (before/after): Add a row next to the active row
//! - AddColumn (before/after): Add a column next to the active cell
//! - DeleteRow/DeleteColumn/DeleteTable: Remove table elements
//!
//! Every command except InsertTable works on the cell holding the
//! selection head. Columns are addressed by cell index within the row.

use crate::command::{finish, insert_block, reject, require_valid_selection};
use crate::{Command, CommandResult, RejectReason, Result};
use doc_model::{DocumentTree, Node, NodeKind, Position, Selection};

// =============================================================================
// Active Cell
// =============================================================================

/// The table cell holding the selection head
#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveCell {
    table: Vec<usize>,
    row: usize,
    column: usize,
}

impl ActiveCell {
    fn locate(tree: &DocumentTree, selection: &Selection) -> Result<Self> {
        require_valid_selection(tree, selection)?;
        let cell = tree
            .find_ancestor(&selection.head.path, Node::is_cell)
            .ok_or(RejectReason::NoActiveTableCell)?;
        if cell.len() < 3 {
            return reject(RejectReason::NoActiveTableCell);
        }
        let len = cell.len();
        Ok(Self {
            table: cell[..len - 2].to_vec(),
            row: cell[len - 2],
            column: cell[len - 1],
        })
    }

    fn row_path(&self, row: usize) -> Vec<usize> {
        let mut path = self.table.clone();
        path.push(row);
        path
    }
}

fn rows_mut<'a>(tree: &'a mut DocumentTree, table: &[usize]) -> Result<&'a mut Vec<Node>> {
    tree.node_mut(table)
        .and_then(Node::children_mut)
        .ok_or_else(|| RejectReason::NoActiveTableCell.into())
}

fn empty_cell(header: bool) -> Node {
    let content = vec![Node::empty_paragraph()];
    if header {
        Node::header(content)
    } else {
        Node::cell(content)
    }
}

/// Cursor at the start of the first textblock of a cell, falling back to
/// the nearest valid position
fn cursor_in_cell(tree: &DocumentTree, cell: &[usize]) -> Selection {
    let position = tree
        .first_textblock_in(cell)
        .map(Position::start_of)
        .unwrap_or_else(|| tree.clamp_position(&Position::start_of(cell.to_vec())));
    Selection::collapsed(position)
}

/// Remove the table and put the cursor where it stood
fn remove_table(tree: &DocumentTree, table: &[usize]) -> Result<CommandResult> {
    let Some((&index, parent)) = table.split_last() else {
        return reject(RejectReason::NoActiveTableCell);
    };
    let mut new_tree = tree.clone();
    if let Some(siblings) = new_tree.children_at_mut(parent) {
        siblings.remove(index);
    }
    new_tree.normalize();

    // The next block now sits at the table's old path
    let position = new_tree
        .first_textblock_in(table)
        .map(Position::start_of)
        .unwrap_or_else(|| new_tree.clamp_position(&Position::start_of(table.to_vec())));
    finish(tree, new_tree, Selection::collapsed(position))
}

// =============================================================================
// InsertTable Command
// =============================================================================

/// Insert a new table at the cursor
#[derive(Debug, Clone)]
pub struct InsertTable {
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
    /// Render the first row as header cells
    pub with_header_row: bool,
}

impl InsertTable {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            with_header_row: false,
        }
    }

    pub fn with_header_row(mut self, with_header_row: bool) -> Self {
        self.with_header_row = with_header_row;
        self
    }

    fn build(&self) -> Node {
        let rows = (0..self.rows)
            .map(|row| {
                let header = self.with_header_row && row == 0;
                Node::row((0..self.cols).map(|_| empty_cell(header)).collect())
            })
            .collect();
        Node::table(rows)
    }
}

impl Default for InsertTable {
    fn default() -> Self {
        Self::new(3, 3).with_header_row(true)
    }
}

impl Command for InsertTable {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        require_valid_selection(tree, selection)?;
        if self.rows == 0 || self.cols == 0 {
            return reject(RejectReason::InvalidArgument(format!(
                "table size {}x{} must be at least 1x1",
                self.rows, self.cols
            )));
        }
        if tree.find_ancestor(&selection.head.path, Node::is_cell).is_some() {
            return reject(RejectReason::NestedTable);
        }

        let mut new_tree = tree.clone();
        let table = insert_block(&mut new_tree, &selection.head, self.build())
            .ok_or_else(|| RejectReason::InvalidSelection("no block at cursor".to_string()))?;
        let mut first_cell = table;
        first_cell.extend([0, 0]);
        let selection = cursor_in_cell(&new_tree, &first_cell);
        finish(tree, new_tree, selection)
    }

    fn display_name(&self) -> &str {
        "Insert Table"
    }
}

// =============================================================================
// DeleteTable Command
// =============================================================================

/// Delete the table holding the cursor
#[derive(Debug, Clone, Default)]
pub struct DeleteTable;

impl DeleteTable {
    pub fn new() -> Self {
        Self
    }
}

impl Command for DeleteTable {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        let active = ActiveCell::locate(tree, selection)?;
        remove_table(tree, &active.table)
    }

    fn display_name(&self) -> &str {
        "Delete Table"
    }
}

// =============================================================================
// AddRow Command
// =============================================================================

/// Add an empty row above or below the active row
#[derive(Debug, Clone, Default)]
pub struct AddRow {
    /// Insert above the active row instead of below
    pub before: bool,
}

impl AddRow {
    pub fn before() -> Self {
        Self { before: true }
    }

    pub fn after() -> Self {
        Self { before: false }
    }
}

impl Command for AddRow {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        let active = ActiveCell::locate(tree, selection)?;
        let mut new_tree = tree.clone();
        let rows = rows_mut(&mut new_tree, &active.table)?;
        let width = rows[active.row].children().map_or(1, Vec::len).max(1);
        let row = Node::row((0..width).map(|_| empty_cell(false)).collect());
        let index = if self.before { active.row } else { active.row + 1 };
        rows.insert(index, row);

        // Rows above the cursor shift it down by one
        let mut selection = selection.clone();
        if self.before {
            let depth = active.table.len();
            for position in [&mut selection.anchor, &mut selection.head] {
                if position.path.starts_with(&active.table) && position.path[depth] >= index {
                    position.path[depth] += 1;
                }
            }
        }
        finish(tree, new_tree, selection)
    }

    fn display_name(&self) -> &str {
        if self.before {
            "Insert Row Above"
        } else {
            "Insert Row Below"
        }
    }
}

// =============================================================================
// DeleteRow Command
// =============================================================================

/// Delete the active row; deleting the only row deletes the table
#[derive(Debug, Clone, Default)]
pub struct DeleteRow;

impl DeleteRow {
    pub fn new() -> Self {
        Self
    }
}

impl Command for DeleteRow {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        let active = ActiveCell::locate(tree, selection)?;
        let row_count = tree.node(&active.table).map_or(0, Node::row_count);
        if row_count <= 1 {
            return remove_table(tree, &active.table);
        }

        let mut new_tree = tree.clone();
        let rows = rows_mut(&mut new_tree, &active.table)?;
        rows.remove(active.row);
        let target_row = active.row.min(rows.len() - 1);
        let width = rows[target_row].children().map_or(0, Vec::len);
        let mut cell = active.row_path(target_row);
        cell.push(active.column.min(width.saturating_sub(1)));
        let selection = cursor_in_cell(&new_tree, &cell);
        finish(tree, new_tree, selection)
    }

    fn display_name(&self) -> &str {
        "Delete Row"
    }
}

// =============================================================================
// AddColumn Command
// =============================================================================

/// Add an empty column left or right of the active cell
#[derive(Debug, Clone, Default)]
pub struct AddColumn {
    /// Insert left of the active column instead of right
    pub before: bool,
}

impl AddColumn {
    pub fn before() -> Self {
        Self { before: true }
    }

    pub fn after() -> Self {
        Self { before: false }
    }
}

impl Command for AddColumn {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        let active = ActiveCell::locate(tree, selection)?;
        let index = if self.before {
            active.column
        } else {
            active.column + 1
        };

        let mut new_tree = tree.clone();
        let rows = rows_mut(&mut new_tree, &active.table)?;
        for row in rows.iter_mut() {
            let Some(cells) = row.children_mut() else {
                continue;
            };
            // Header rows stay header rows
            let reference = index.min(cells.len()).saturating_sub(usize::from(!self.before));
            let header = cells
                .get(reference)
                .is_some_and(|cell| cell.kind == NodeKind::TableHeader);
            cells.insert(index.min(cells.len()), empty_cell(header));
        }

        let mut selection = selection.clone();
        if self.before {
            let depth = active.table.len() + 1;
            for position in [&mut selection.anchor, &mut selection.head] {
                if position.path.starts_with(&active.table) && position.path[depth] >= index {
                    position.path[depth] += 1;
                }
            }
        }
        finish(tree, new_tree, selection)
    }

    fn display_name(&self) -> &str {
        if self.before {
            "Insert Column Left"
        } else {
            "Insert Column Right"
        }
    }
}

// =============================================================================
// DeleteColumn Command
// =============================================================================

/// Delete the active column; deleting the only column deletes the table
#[derive(Debug, Clone, Default)]
pub struct DeleteColumn;

impl DeleteColumn {
    pub fn new() -> Self {
        Self
    }
}

impl Command for DeleteColumn {
    fn apply(&self, tree: &DocumentTree, selection: &Selection) -> Result<CommandResult> {
        let active = ActiveCell::locate(tree, selection)?;
        let column_count = tree.node(&active.table).map_or(0, Node::column_count);
        if column_count <= 1 {
            return remove_table(tree, &active.table);
        }

        let mut new_tree = tree.clone();
        let rows = rows_mut(&mut new_tree, &active.table)?;
        for row in rows.iter_mut() {
            if let Some(cells) = row.children_mut() {
                if active.column < cells.len() {
                    cells.remove(active.column);
                }
            }
        }
        // Rows that were a single cell wide are now empty and get dropped
        rows.retain(|row| row.children().is_some_and(|cells| !cells.is_empty()));
        if rows.is_empty() {
            return remove_table(tree, &active.table);
        }

        let target_row = active.row.min(rows.len() - 1);
        let width = rows[target_row].children().map_or(0, Vec::len);
        let mut cell = active.row_path(target_row);
        cell.push(active.column.min(width.saturating_sub(1)));
        let selection = cursor_in_cell(&new_tree, &cell);
        finish(tree, new_tree, selection)
    }

    fn display_name(&self) -> &str {
        "Delete Column"
    }
}
