//! Source location types.
//!
//! Syntax nodes, tokens, and diagnostic targets all carry byte ranges into
//! the text of the file they came from.

use std::fmt;
use std::ops::Range;

/// A byte offset into source text.
pub type TextPos = u32;

/// A half-open byte range `[pos, end)` in a source file.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct TextRange {
    pub pos: TextPos,
    pub end: TextPos,
}

impl TextRange {
    #[inline]
    pub fn new(pos: TextPos, end: TextPos) -> Self {
        debug_assert!(end >= pos);
        Self { pos, end }
    }

    #[inline]
    pub fn empty(pos: TextPos) -> Self {
        Self { pos, end: pos }
    }

    #[inline]
    pub fn len(&self) -> TextPos {
        self.end - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos == self.end
    }

    #[inline]
    pub fn contains(&self, pos: TextPos) -> bool {
        pos >= self.pos && pos < self.end
    }

    /// The smallest range covering both `self` and `other`.
    pub fn cover(&self, other: &TextRange) -> TextRange {
        TextRange::new(self.pos.min(other.pos), self.end.max(other.end))
    }

    #[inline]
    pub fn to_range(&self) -> Range<usize> {
        self.pos as usize..self.end as usize
    }
}

impl fmt::Debug for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.pos, self.end)
    }
}

/// 1-based line and column, as printed in diagnostics.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LineAndColumn {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for LineAndColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets to line/column positions.
#[derive(Debug, Clone)]
pub struct LineMap {
    line_starts: Vec<TextPos>,
}

impl LineMap {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self { line_starts }
    }

    /// 0-based line index containing `pos`.
    pub fn line_of(&self, pos: TextPos) -> usize {
        match self.line_starts.binary_search(&pos) {
            Ok(line) => line,
            Err(line) => line - 1,
        }
    }

    pub fn position_of(&self, pos: TextPos) -> LineAndColumn {
        let line = self.line_of(pos);
        LineAndColumn {
            line: line as u32 + 1,
            column: pos - self.line_starts[line] + 1,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
