//! Text edits

use crate::base::{Position, TextRange, TextSize};

/// One replacement of a byte range of the old text.
///
/// Offsets are bytes; positions are the matching 0-indexed line/columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edit {
    pub start: TextSize,
    /// End of the replaced range in the old text.
    pub old_end: TextSize,
    /// End of the replacement in the new text.
    pub new_end: TextSize,
    pub start_position: Position,
    pub old_end_position: Position,
    pub new_end_position: Position,
}

impl Edit {
    /// Edit replacing `range` of `old_text` with `replacement`.
    ///
    /// A range past the end of the text is clamped to it.
    pub fn new(old_text: &str, range: TextRange, replacement: &str) -> Self {
        let len = TextSize::of(old_text);
        let start = range.start().min(len);
        let old_end = range.end().min(len);
        let start_position = Position::default().advance(prefix(old_text, start));
        let old_end_position =
            start_position.advance(old_text.get(usize::from(start)..usize::from(old_end)).unwrap_or(""));
        let new_end_position = start_position.advance(replacement);
        Self {
            start,
            old_end,
            new_end: start + TextSize::of(replacement),
            start_position,
            old_end_position,
            new_end_position,
        }
    }

    /// Insertion of `text` at `offset`.
    pub fn insert(old_text: &str, offset: TextSize, text: &str) -> Self {
        Self::new(old_text, TextRange::empty(offset), text)
    }

    /// Deletion of `range`.
    pub fn delete(old_text: &str, range: TextRange) -> Self {
        Self::new(old_text, range, "")
    }

    pub fn old_range(&self) -> TextRange {
        TextRange::new(self.start, self.old_end)
    }

    pub fn new_range(&self) -> TextRange {
        TextRange::new(self.start, self.new_end)
    }

    /// Change in text length.
    pub fn delta(&self) -> i64 {
        i64::from(u32::from(self.new_end)) - i64::from(u32::from(self.old_end))
    }

    /// Apply the edit to `old_text`, given the replacement text.
    pub fn apply(&self, old_text: &str, replacement: &str) -> String {
        let mut out = String::with_capacity(old_text.len() + replacement.len());
        out.push_str(prefix(old_text, self.start));
        out.push_str(replacement);
        out.push_str(old_text.get(usize::from(self.old_end)..).unwrap_or(""));
        out
    }
}

fn prefix(text: &str, end: TextSize) -> &str {
    text.get(..usize::from(end)).unwrap_or(text)
}
