//! Document tree operations

use crate::{
    normalize_runs, runs_are_canonical, Content, DocModelError, Node, NodeKind, Position, Result,
    Selection, MAX_LIST_DEPTH,
};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Document-level text direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Rtl,
    Ltr,
}

impl TextDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextDirection::Rtl => "rtl",
            TextDirection::Ltr => "ltr",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rtl" => Some(TextDirection::Rtl),
            "ltr" => Some(TextDirection::Ltr),
            _ => None,
        }
    }
}

/// Envelope wrapped around the whole document: direction and typography
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLayout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<TextDirection>,
    /// CSS font-family list applied to the whole document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typography: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

/// A character range inside one textblock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRange {
    pub path: Vec<usize>,
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// The complete document: a sequence of top-level blocks plus an optional
/// layout envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTree {
    pub blocks: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<DocumentLayout>,
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree {
    /// Create a document holding a single empty paragraph
    pub fn new() -> Self {
        Self {
            blocks: vec![Node::empty_paragraph()],
            layout: None,
        }
    }

    /// Create a document from blocks, bringing them into canonical form
    pub fn from_blocks(blocks: Vec<Node>) -> Self {
        let mut tree = Self {
            blocks,
            layout: None,
        };
        tree.normalize();
        tree
    }

    pub fn with_layout(mut self, layout: DocumentLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    // ========================================================================
    // Path addressing
    // ========================================================================

    /// Get the node at an index path
    pub fn node(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.blocks.get(*first)?;
        for &index in rest {
            node = node.children()?.get(index)?;
        }
        Some(node)
    }

    pub fn node_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.blocks.get_mut(*first)?;
        for &index in rest {
            node = node.children_mut()?.get_mut(index)?;
        }
        Some(node)
    }

    pub fn children_at_mut(&mut self, path: &[usize]) -> Option<&mut Vec<Node>> {
        if path.is_empty() {
            Some(&mut self.blocks)
        } else {
            self.node_mut(path)?.children_mut()
        }
    }

    /// Paths of every textblock, in document order
    pub fn textblock_paths(&self) -> Vec<Vec<usize>> {
        let mut paths = Vec::new();
        let mut prefix = Vec::new();
        collect_textblocks(&self.blocks, &mut prefix, &mut paths);
        paths
    }

    /// First textblock at or below `path`
    pub fn first_textblock_in(&self, path: &[usize]) -> Option<Vec<usize>> {
        let node = self.node(path)?;
        let mut prefix = path.to_vec();
        let mut found = Vec::new();
        collect_textblocks(std::slice::from_ref(node), &mut Vec::new(), &mut found);
        let relative = found.into_iter().next()?;
        prefix.extend_from_slice(&relative[1..]);
        Some(prefix)
    }

    /// Last textblock at or below `path`
    pub fn last_textblock_in(&self, path: &[usize]) -> Option<Vec<usize>> {
        let node = self.node(path)?;
        let mut prefix = path.to_vec();
        let mut found = Vec::new();
        collect_textblocks(std::slice::from_ref(node), &mut Vec::new(), &mut found);
        let relative = found.pop()?;
        prefix.extend_from_slice(&relative[1..]);
        Some(prefix)
    }

    /// Nearest node on `path` (the node itself included) matching `pred`
    pub fn find_ancestor<P>(&self, path: &[usize], pred: P) -> Option<Vec<usize>>
    where
        P: Fn(&Node) -> bool,
    {
        (1..=path.len())
            .rev()
            .map(|len| &path[..len])
            .find(|prefix| self.node(prefix).is_some_and(&pred))
            .map(<[usize]>::to_vec)
    }

    /// Index of a textblock in document order
    pub fn textblock_ordinal(&self, path: &[usize]) -> Option<usize> {
        self.textblock_paths()
            .iter()
            .position(|candidate| candidate.as_slice() == path)
    }

    /// Path of the n-th textblock, clamped to the last one
    pub fn textblock_at_ordinal(&self, ordinal: usize) -> Option<Vec<usize>> {
        let mut paths = self.textblock_paths();
        if paths.is_empty() {
            return None;
        }
        let index = ordinal.min(paths.len() - 1);
        Some(paths.swap_remove(index))
    }

    // ========================================================================
    // Positions and selections
    // ========================================================================

    /// Check that a position points into a textblock
    pub fn is_valid_position(&self, position: &Position) -> bool {
        self.node(&position.path)
            .is_some_and(|node| node.is_textblock() && position.offset <= node.char_len())
    }

    /// Position at the start of the first textblock
    pub fn start_position(&self) -> Position {
        self.textblock_paths()
            .into_iter()
            .next()
            .map(Position::start_of)
            .unwrap_or_else(|| Position::start_of(vec![0]))
    }

    /// Position at the end of the textblock at `path`
    pub fn end_of(&self, path: Vec<usize>) -> Position {
        let offset = self.node(&path).map(Node::char_len).unwrap_or(0);
        Position::new(path, offset)
    }

    /// Move a position to the nearest valid spot
    pub fn clamp_position(&self, position: &Position) -> Position {
        if let Some(node) = self.node(&position.path) {
            if node.is_textblock() {
                return Position::new(position.path.clone(), position.offset.min(node.char_len()));
            }
        }
        let paths = self.textblock_paths();
        match paths
            .iter()
            .rev()
            .find(|path| path.as_slice() < position.path.as_slice())
        {
            Some(path) => self.end_of(path.clone()),
            None => self.start_position(),
        }
    }

    pub fn clamp_selection(&self, selection: &Selection) -> Selection {
        Selection::new(
            self.clamp_position(&selection.anchor),
            self.clamp_position(&selection.head),
        )
    }

    /// Per-textblock character ranges covered by a selection, in document
    /// order. A cursor yields one empty range.
    pub fn text_ranges(&self, selection: &Selection) -> Vec<TextRange> {
        let from = selection.from();
        let to = selection.to();
        self.textblock_paths()
            .into_iter()
            .filter(|path| {
                path.as_slice() >= from.path.as_slice() && path.as_slice() <= to.path.as_slice()
            })
            .map(|path| {
                let len = self.node(&path).map(Node::char_len).unwrap_or(0);
                let start = if path == from.path {
                    from.offset.min(len)
                } else {
                    0
                };
                let end = if path == to.path { to.offset.min(len) } else { len };
                TextRange {
                    path,
                    start,
                    end: end.max(start),
                }
            })
            .collect()
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// Text of every textblock, blocks separated by a blank line
    pub fn plain_text(&self) -> String {
        self.textblock_paths()
            .iter()
            .filter_map(|path| self.node(path))
            .map(Node::text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Number of whitespace-separated words
    pub fn word_count(&self) -> usize {
        self.plain_text().split_whitespace().count()
    }

    /// Number of user-perceived characters (grapheme clusters)
    pub fn character_count(&self) -> usize {
        self.plain_text().graphemes(true).count()
    }

    // ========================================================================
    // Canonical form
    // ========================================================================

    /// Bring the tree into canonical form.
    ///
    /// Merges runs, strips marks inside code blocks, repairs list depths,
    /// drops empty lists/rows/tables, flattens tables nested in cells and
    /// fills empty containers with an empty paragraph.
    pub fn normalize(&mut self) {
        normalize_blocks(&mut self.blocks, false);
        if self.blocks.is_empty() {
            self.blocks.push(Node::empty_paragraph());
        }
    }

    /// Check every structural invariant of the tree
    pub fn validate(&self) -> Result<()> {
        if self.blocks.is_empty() {
            return Err(violation(&[], "document has no blocks"));
        }
        let mut path = Vec::new();
        validate_blocks(&self.blocks, &mut path, false)
    }
}

fn collect_textblocks(nodes: &[Node], prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
    for (index, node) in nodes.iter().enumerate() {
        prefix.push(index);
        if node.is_textblock() {
            out.push(prefix.clone());
        } else if let Some(children) = node.children() {
            collect_textblocks(children, prefix, out);
        }
        prefix.pop();
    }
}

fn violation(path: &[usize], reason: impl Into<String>) -> DocModelError {
    DocModelError::InvariantViolation {
        path: path.to_vec(),
        reason: reason.into(),
    }
}

// ============================================================================
// Normalization
// ============================================================================

fn normalize_blocks(blocks: &mut Vec<Node>, in_table: bool) {
    let mut out = Vec::with_capacity(blocks.len());
    for mut node in blocks.drain(..) {
        match node.kind {
            NodeKind::ListItem => {
                let mut para = node.retyped(NodeKind::Paragraph);
                normalize_textblock(&mut para);
                out.push(para);
            }
            kind if kind.is_textblock() => {
                normalize_textblock(&mut node);
                out.push(node);
            }
            NodeKind::BulletList | NodeKind::OrderedList => {
                normalize_list(&mut node);
                if node.children().is_some_and(|items| !items.is_empty()) {
                    out.push(node);
                }
            }
            NodeKind::Blockquote => {
                let mut children = take_blocks(&mut node);
                normalize_blocks(&mut children, in_table);
                if children.is_empty() {
                    children.push(Node::empty_paragraph());
                }
                node.content = Content::Blocks(children);
                out.push(node);
            }
            NodeKind::Table if in_table => {
                // Nested tables collapse into the surrounding cell.
                let mut flattened: Vec<Node> = take_blocks(&mut node)
                    .into_iter()
                    .flat_map(|mut row| take_blocks(&mut row))
                    .flat_map(|mut cell| {
                        if cell.is_cell() {
                            take_blocks(&mut cell)
                        } else {
                            vec![cell]
                        }
                    })
                    .collect();
                normalize_blocks(&mut flattened, true);
                out.extend(flattened);
            }
            NodeKind::Table => {
                normalize_table(&mut node);
                if node.row_count() > 0 {
                    out.push(node);
                }
            }
            NodeKind::TableRow => {
                let mut table = Node::table(vec![node]);
                if in_table {
                    let mut wrapped = vec![table];
                    normalize_blocks(&mut wrapped, true);
                    out.extend(wrapped);
                } else {
                    normalize_table(&mut table);
                    if table.row_count() > 0 {
                        out.push(table);
                    }
                }
            }
            NodeKind::TableCell | NodeKind::TableHeader => {
                let mut children = take_blocks(&mut node);
                normalize_blocks(&mut children, in_table);
                out.extend(children);
            }
            NodeKind::Image | NodeKind::HorizontalRule => {
                node.content = Content::Empty;
                node.attrs.depth = 0;
                out.push(node);
            }
            _ => out.push(node),
        }
    }
    *blocks = out;
}

fn take_blocks(node: &mut Node) -> Vec<Node> {
    match std::mem::replace(&mut node.content, Content::Empty) {
        Content::Blocks(children) => children,
        _ => Vec::new(),
    }
}

fn normalize_textblock(node: &mut Node) {
    if !matches!(node.content, Content::Runs(_)) {
        node.content = Content::Runs(Vec::new());
    }
    if let NodeKind::Heading(level) = node.kind {
        node.kind = NodeKind::Heading(level.clamp(1, 6));
    }
    if node.kind != NodeKind::ListItem {
        node.attrs.depth = 0;
    }
    if !node.kind.accepts_alignment() {
        node.attrs.align = None;
    }
    let is_code = node.kind == NodeKind::CodeBlock;
    if let Some(runs) = node.runs_mut() {
        if is_code {
            for run in runs.iter_mut() {
                run.marks.clear();
            }
        }
        normalize_runs(runs);
    }
}

fn normalize_list(list: &mut Node) {
    let mut items = Vec::new();
    let mut previous: Option<usize> = None;
    for child in take_blocks(list) {
        if !child.is_textblock() {
            continue;
        }
        let mut item = if child.kind == NodeKind::ListItem {
            child
        } else {
            child.retyped(NodeKind::ListItem)
        };
        normalize_textblock(&mut item);
        let limit = previous.map(|depth| depth + 1).unwrap_or(0);
        item.attrs.depth = item.attrs.depth.min(limit).min(MAX_LIST_DEPTH);
        previous = Some(item.attrs.depth);
        items.push(item);
    }
    list.content = Content::Blocks(items);
}

fn normalize_table(table: &mut Node) {
    let mut rows = Vec::new();
    for mut row in take_blocks(table) {
        if row.kind != NodeKind::TableRow {
            continue;
        }
        let mut cells = Vec::new();
        for mut cell in take_blocks(&mut row) {
            if !cell.is_cell() {
                continue;
            }
            let mut children = take_blocks(&mut cell);
            normalize_blocks(&mut children, true);
            if children.is_empty() {
                children.push(Node::empty_paragraph());
            }
            cell.content = Content::Blocks(children);
            cell.attrs.colspan = cell.attrs.colspan.max(1);
            cell.attrs.rowspan = cell.attrs.rowspan.max(1);
            cells.push(cell);
        }
        if !cells.is_empty() {
            row.content = Content::Blocks(cells);
            rows.push(row);
        }
    }
    table.content = Content::Blocks(rows);
}

// ============================================================================
// Validation
// ============================================================================

fn validate_blocks(blocks: &[Node], path: &mut Vec<usize>, in_table: bool) -> Result<()> {
    for (index, node) in blocks.iter().enumerate() {
        path.push(index);
        validate_block(node, path, in_table)?;
        path.pop();
    }
    Ok(())
}

fn validate_block(node: &Node, path: &mut Vec<usize>, in_table: bool) -> Result<()> {
    match node.kind {
        NodeKind::ListItem | NodeKind::TableRow | NodeKind::TableCell | NodeKind::TableHeader => {
            Err(violation(path, format!("{:?} outside its parent structure", node.kind)))
        }
        kind if kind.is_textblock() => validate_textblock(node, path),
        NodeKind::BulletList | NodeKind::OrderedList => validate_list(node, path),
        NodeKind::Blockquote => {
            let children = non_empty_blocks(node, path)?;
            validate_blocks(children, path, in_table)
        }
        NodeKind::Table if in_table => Err(violation(path, "table nested inside a table")),
        NodeKind::Table => validate_table(node, path),
        NodeKind::Image => {
            if node.content != Content::Empty {
                return Err(violation(path, "image has content"));
            }
            match node.attrs.src.as_deref() {
                Some(src) if !src.is_empty() => Ok(()),
                _ => Err(violation(path, "image without source")),
            }
        }
        NodeKind::HorizontalRule => {
            if node.content == Content::Empty {
                Ok(())
            } else {
                Err(violation(path, "horizontal rule has content"))
            }
        }
        _ => Ok(()),
    }
}

fn validate_textblock(node: &Node, path: &[usize]) -> Result<()> {
    let runs = node
        .runs()
        .ok_or_else(|| violation(path, "textblock without runs"))?;
    if let NodeKind::Heading(level) = node.kind {
        if !(1..=6).contains(&level) {
            return Err(violation(path, format!("heading level {level} out of range")));
        }
    }
    if !runs_are_canonical(runs) {
        return Err(violation(path, "runs are not canonical"));
    }
    if node.kind == NodeKind::CodeBlock && runs.iter().any(|run| !run.marks.is_empty()) {
        return Err(violation(path, "marks inside a code block"));
    }
    Ok(())
}

fn validate_list(list: &Node, path: &mut Vec<usize>) -> Result<()> {
    let items = non_empty_blocks(list, path)?;
    let mut previous: Option<usize> = None;
    for (index, item) in items.iter().enumerate() {
        path.push(index);
        if item.kind != NodeKind::ListItem {
            return Err(violation(path, "list child is not a list item"));
        }
        validate_textblock(item, path)?;
        let depth = item.attrs.depth;
        let limit = previous.map(|d| d + 1).unwrap_or(0);
        if depth > limit || depth > MAX_LIST_DEPTH {
            return Err(violation(path, format!("list depth {depth} exceeds {limit}")));
        }
        previous = Some(depth);
        path.pop();
    }
    Ok(())
}

fn validate_table(table: &Node, path: &mut Vec<usize>) -> Result<()> {
    let rows = non_empty_blocks(table, path)?;
    for (row_index, row) in rows.iter().enumerate() {
        path.push(row_index);
        if row.kind != NodeKind::TableRow {
            return Err(violation(path, "table child is not a row"));
        }
        let cells = non_empty_blocks(row, path)?;
        for (cell_index, cell) in cells.iter().enumerate() {
            path.push(cell_index);
            if !cell.is_cell() {
                return Err(violation(path, "row child is not a cell"));
            }
            if cell.attrs.colspan == 0 || cell.attrs.rowspan == 0 {
                return Err(violation(path, "zero cell span"));
            }
            let children = non_empty_blocks(cell, path)?;
            validate_blocks(children, path, true)?;
            path.pop();
        }
        path.pop();
    }
    Ok(())
}

fn non_empty_blocks<'a>(node: &'a Node, path: &[usize]) -> Result<&'a Vec<Node>> {
    match node.children() {
        Some(children) if !children.is_empty() => Ok(children),
        Some(_) => Err(violation(path, format!("empty {:?}", node.kind))),
        None => Err(violation(path, format!("{:?} without child blocks", node.kind))),
    }
}
