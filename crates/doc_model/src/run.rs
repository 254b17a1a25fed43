//! Text runs - contiguous text sharing one mark set

use crate::{Mark, MarkSet, MarkType};
use serde::{Deserialize, Serialize};

/// A text run - contiguous text with consistent formatting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content of this run
    pub text: String,
    /// Marks applied to the whole run
    #[serde(default, skip_serializing_if = "MarkSet::is_empty")]
    pub marks: MarkSet,
}

impl TextRun {
    /// Create an unmarked run
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: MarkSet::new(),
        }
    }

    /// Create a run carrying the given marks
    pub fn with_marks(text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Total character length of a run sequence
pub fn runs_char_len(runs: &[TextRun]) -> usize {
    runs.iter().map(TextRun::char_len).sum()
}

/// Concatenated text of a run sequence
pub fn runs_text(runs: &[TextRun]) -> String {
    runs.iter().map(|run| run.text.as_str()).collect()
}

/// Bring runs into canonical form: no empty runs and no two adjacent runs
/// with identical mark sets.
pub fn normalize_runs(runs: &mut Vec<TextRun>) {
    let mut merged: Vec<TextRun> = Vec::with_capacity(runs.len());
    for run in runs.drain(..) {
        if run.text.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.marks == run.marks => last.text.push_str(&run.text),
            _ => merged.push(run),
        }
    }
    *runs = merged;
}

/// Check the canonical form without modifying anything
pub fn runs_are_canonical(runs: &[TextRun]) -> bool {
    runs.iter().all(|run| !run.text.is_empty())
        && runs.windows(2).all(|pair| pair[0].marks != pair[1].marks)
}

/// Split runs so that a run boundary falls on `offset`.
///
/// Returns the index of the first run starting at or after `offset`.
pub fn split_runs_at(runs: &mut Vec<TextRun>, offset: usize) -> usize {
    let mut start = 0;
    for index in 0..runs.len() {
        let len = runs[index].char_len();
        if offset <= start {
            return index;
        }
        if offset < start + len {
            let local = offset - start;
            let byte = runs[index]
                .text
                .char_indices()
                .nth(local)
                .map(|(byte, _)| byte)
                .unwrap_or(runs[index].text.len());
            let tail = runs[index].text.split_off(byte);
            let marks = runs[index].marks.clone();
            runs.insert(index + 1, TextRun::with_marks(tail, marks));
            return index + 1;
        }
        start += len;
    }
    runs.len()
}

/// Apply `f` to the mark set of every character in `start..end`, splitting
/// runs at the boundaries and re-merging afterwards.
pub fn map_marks_in_range<F>(runs: &mut Vec<TextRun>, start: usize, end: usize, mut f: F)
where
    F: FnMut(&mut MarkSet),
{
    if start >= end {
        return;
    }
    let first = split_runs_at(runs, start);
    let last = split_runs_at(runs, end);
    for run in &mut runs[first..last] {
        f(&mut run.marks);
    }
    normalize_runs(runs);
}

/// Check that every character in `start..end` satisfies `pred`.
///
/// An empty range is vacuously false: there is nothing to be active on.
pub fn range_all<P>(runs: &[TextRun], start: usize, end: usize, pred: P) -> bool
where
    P: Fn(&MarkSet) -> bool,
{
    if start >= end {
        return false;
    }
    let mut run_start = 0;
    for run in runs {
        let run_end = run_start + run.char_len();
        if run_end > start && run_start < end && !pred(&run.marks) {
            return false;
        }
        run_start = run_end;
        if run_start >= end {
            break;
        }
    }
    run_start >= end
}

/// Marks of the character at `offset`, if there is one
pub fn marks_at(runs: &[TextRun], offset: usize) -> Option<&MarkSet> {
    let mut start = 0;
    for run in runs {
        let end = start + run.char_len();
        if offset >= start && offset < end {
            return Some(&run.marks);
        }
        start = end;
    }
    None
}

/// Marks that apply at a cursor: the character before it, else the one after.
pub fn marks_at_cursor(runs: &[TextRun], offset: usize) -> Option<&MarkSet> {
    if offset > 0 {
        if let Some(marks) = marks_at(runs, offset - 1) {
            return Some(marks);
        }
    }
    marks_at(runs, offset)
}

/// Character range of the contiguous stretch carrying the same mark of
/// `mark_type` around a cursor.
pub fn mark_range_at(runs: &[TextRun], offset: usize, mark_type: MarkType) -> Option<(usize, usize)> {
    let mut bounds = Vec::with_capacity(runs.len());
    let mut start = 0;
    for run in runs {
        let end = start + run.char_len();
        bounds.push((start, end));
        start = end;
    }

    let carries = |index: &usize| runs[*index].marks.has_type(mark_type);
    let before = bounds.iter().position(|&(s, e)| offset > s && offset <= e);
    let after = bounds.iter().position(|&(s, e)| offset >= s && offset < e);
    let index = before.filter(carries).or(after.filter(carries))?;

    let mark: &Mark = runs[index].marks.get(mark_type)?;
    let mut first = index;
    while first > 0 && runs[first - 1].marks.get(mark_type) == Some(mark) {
        first -= 1;
    }
    let mut last = index;
    while last + 1 < runs.len() && runs[last + 1].marks.get(mark_type) == Some(mark) {
        last += 1;
    }
    Some((bounds[first].0, bounds[last].1))
}

/// Replace the characters in `start..end` with `text` carrying `marks`.
pub fn replace_range(runs: &mut Vec<TextRun>, start: usize, end: usize, text: &str, marks: MarkSet) {
    let first = split_runs_at(runs, start);
    let last = split_runs_at(runs, end.max(start));
    runs.drain(first..last);
    if !text.is_empty() {
        runs.insert(first, TextRun::with_marks(text, marks));
    }
    normalize_runs(runs);
}

/// Remove every mark from the characters in `start..end`
pub fn clear_marks_in_range(runs: &mut Vec<TextRun>, start: usize, end: usize) {
    map_marks_in_range(runs, start, end, MarkSet::clear);
}
