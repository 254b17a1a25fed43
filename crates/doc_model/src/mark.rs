//! Inline formatting marks

use serde::{Deserialize, Serialize};

/// Kind of an inline mark, independent of its value.
///
/// The declaration order doubles as the nesting order used when marks are
/// written out as markup (outermost first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkType {
    Link,
    FontFamily,
    TextColor,
    Highlight,
    Bold,
    Italic,
    Underline,
    Strike,
    Subscript,
    Superscript,
}

/// An inline mark applied over a text run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Subscript,
    Superscript,
    /// Text color as a CSS color string (usually `#rrggbb`)
    TextColor(String),
    /// Background highlight color
    Highlight(String),
    /// Hyperlink target
    Link(String),
    /// Font family list, CSS syntax
    FontFamily(String),
}

impl Mark {
    /// Get the kind of this mark
    pub fn mark_type(&self) -> MarkType {
        match self {
            Mark::Bold => MarkType::Bold,
            Mark::Italic => MarkType::Italic,
            Mark::Underline => MarkType::Underline,
            Mark::Strike => MarkType::Strike,
            Mark::Subscript => MarkType::Subscript,
            Mark::Superscript => MarkType::Superscript,
            Mark::TextColor(_) => MarkType::TextColor,
            Mark::Highlight(_) => MarkType::Highlight,
            Mark::Link(_) => MarkType::Link,
            Mark::FontFamily(_) => MarkType::FontFamily,
        }
    }

    /// Get the value carried by this mark, if any
    pub fn value(&self) -> Option<&str> {
        match self {
            Mark::TextColor(v) | Mark::Highlight(v) | Mark::Link(v) | Mark::FontFamily(v) => Some(v),
            _ => None,
        }
    }
}

/// The set of marks active on a run.
///
/// Holds at most one mark per [`MarkType`], kept sorted by type. Subscript
/// and superscript exclude each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Mark>", into = "Vec<Mark>")]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert a mark, replacing any mark of the same type
    pub fn insert(&mut self, mark: Mark) {
        let mark_type = mark.mark_type();
        match mark_type {
            MarkType::Subscript => {
                self.remove(MarkType::Superscript);
            }
            MarkType::Superscript => {
                self.remove(MarkType::Subscript);
            }
            _ => {}
        }
        match self.0.binary_search_by_key(&mark_type, Mark::mark_type) {
            Ok(index) => self.0[index] = mark,
            Err(index) => self.0.insert(index, mark),
        }
    }

    /// Builder form of [`MarkSet::insert`]
    pub fn with(mut self, mark: Mark) -> Self {
        self.insert(mark);
        self
    }

    /// Remove the mark of the given type. Returns true if one was present.
    pub fn remove(&mut self, mark_type: MarkType) -> bool {
        match self.0.binary_search_by_key(&mark_type, Mark::mark_type) {
            Ok(index) => {
                self.0.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    pub fn get(&self, mark_type: MarkType) -> Option<&Mark> {
        self.0
            .binary_search_by_key(&mark_type, Mark::mark_type)
            .ok()
            .map(|index| &self.0[index])
    }

    pub fn has_type(&self, mark_type: MarkType) -> bool {
        self.get(mark_type).is_some()
    }

    /// Check for this exact mark, value included
    pub fn contains(&self, mark: &Mark) -> bool {
        self.get(mark.mark_type()) == Some(mark)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mark> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl From<Vec<Mark>> for MarkSet {
    fn from(marks: Vec<Mark>) -> Self {
        let mut set = MarkSet::new();
        for mark in marks {
            set.insert(mark);
        }
        set
    }
}

impl From<MarkSet> for Vec<Mark> {
    fn from(set: MarkSet) -> Self {
        set.0
    }
}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        let mut set = MarkSet::new();
        for mark in iter {
            set.insert(mark);
        }
        set
    }
}
