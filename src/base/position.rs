/// Line/column tracking for tokens and syntax nodes.
///
/// Stores the source location of a token or node for editor features
/// and error reporting. Columns count bytes, not characters.
/// A span representing a range in source code (0-indexed for LSP compatibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// A position in source code (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create a span from line/column coordinates
    pub fn from_coords(
        start_line: usize,
        start_col: usize,
        end_line: usize,
        end_col: usize,
    ) -> Self {
        Self {
            start: Position::new(start_line, start_col),
            end: Position::new(end_line, end_col),
        }
    }

    /// Check if a position falls within this span (end inclusive)
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// The position reached after scanning `text` starting at `self`.
    ///
    /// Line breaks are `\n`, `\r\n`, a lone `\r`, U+2028 and U+2029.
    pub fn advance(self, text: &str) -> Self {
        let mut line = self.line;
        let mut column = self.column;
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match break_len(text, i) {
                Some(len) => {
                    line += 1;
                    column = 0;
                    i += len;
                }
                None => {
                    column += 1;
                    i += 1;
                }
            }
        }
        Self { line, column }
    }
}

/// Length in bytes of the line break starting at byte `i`, if any.
pub(crate) fn break_len(text: &str, i: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    match bytes[i] {
        b'\n' => Some(1),
        b'\r' if bytes.get(i + 1) == Some(&b'\n') => Some(2),
        b'\r' => Some(1),
        0xE2 if bytes.get(i + 1) == Some(&0x80) && matches!(bytes.get(i + 2), Some(0xA8 | 0xA9)) => {
            Some(3)
        }
        _ => None,
    }
}
