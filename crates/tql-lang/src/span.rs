//! Byte ranges into TQL source text.

use std::ops::Range;

/// A half-open byte range `start..end` of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span, used to point past the last token.
    pub fn at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Smallest span containing both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 1-based line and column of the span start in `source`.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        offset_to_line_col(source, self.start)
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

/// A column id, literal or bound tagged with its position in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }
}

/// 1-based (line, column) of a byte offset. Columns count characters.
/// Offsets past the end resolve to the position after the last character.
pub fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let end = source
        .char_indices()
        .map(|(index, _)| index)
        .find(|&index| index >= offset)
        .unwrap_or(source.len());
    let before = &source[..end];

    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |newline| newline + 1);
    let col = before[line_start..].chars().count() + 1;
    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge() {
        let a = Span::new(1, 6);
        let b = Span::new(12, 20);
        assert_eq!(a.merge(b), Span::new(1, 20));
        assert_eq!(b.merge(a), Span::new(1, 20));
    }

    #[test]
    fn test_offset_to_line_col() {
        let source = "(0001 = 'a')\nand\n(0002 is empty)";

        assert_eq!(offset_to_line_col(source, 0), (1, 1));
        assert_eq!(offset_to_line_col(source, 8), (1, 9));
        assert_eq!(offset_to_line_col(source, 13), (2, 1));
        assert_eq!(offset_to_line_col(source, 17), (3, 1));
        assert_eq!(Span::new(19, 21).line_col(source), (3, 3));
    }

    #[test]
    fn test_offset_past_end() {
        assert_eq!(offset_to_line_col("ab", 10), (1, 3));
        assert_eq!(offset_to_line_col("", 0), (1, 1));
    }

    #[test]
    fn test_zero_width_span() {
        let span = Span::at(7);
        assert!(span.is_empty());
        assert_eq!(span.len(), 0);
    }
}
