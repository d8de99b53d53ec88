/*!
# Source position types (Position, Span)

Location types shared by the parser, the runner and the reporters.
Lines and columns are 1-based for display; offsets are byte offsets into
the original source text.
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Position in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }

    /// First character of a file.
    pub fn start() -> Self {
        Self::new(1, 1, 0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Span in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Line index for fast offset->(line,column) mapping.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offsets where each line starts.
    line_starts: Arc<Vec<usize>>, // Arc для дешёвого клонирования
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = Vec::with_capacity(text.len() / 32 + 1);
        starts.push(0usize);
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        Self {
            line_starts: Arc::new(starts),
            len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Offsets past the end of the text are clamped to the last position.
    pub fn to_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        // Бинарный поиск последнего line_start <= offset
        let starts = &self.line_starts;
        let mut lo = 0usize;
        let mut hi = starts.len();
        while lo + 1 < hi {
            let mid = (lo + hi) / 2;
            if starts[mid] <= offset {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Position::new(lo + 1, offset - starts[lo] + 1, offset)
    }

    pub fn span(&self, start: usize, end: usize) -> Span {
        Span::new(self.to_position(start), self.to_position(end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_basic() {
        let text = "line1\nline2\nlast";
        let idx = LineIndex::new(text);
        assert_eq!(idx.line_count(), 3);
        let p = idx.to_position(7); // 'i' in line2
        assert_eq!(p.line, 2);
        assert_eq!(p.column, 2);
        assert_eq!(p.to_string(), "2:2");
    }

    #[test]
    fn test_span_and_clamping() {
        let text = "ab\ncd"; // offsets: a=0 b=1 \n=2 c=3 d=4
        let idx = LineIndex::new(text);
        let span = idx.span(3, 5);
        assert_eq!(span.start.line, 2);
        assert_eq!(span.start.column, 1);
        assert_eq!(span.end.column, 3);
        assert_eq!(idx.to_position(100).offset, 5);
    }
}
