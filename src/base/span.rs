//! Source text positions and ranges.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

// Re-export from text-size for compatibility
pub use text_size::TextRange;
pub use text_size::TextSize;

/// A line and column position in source text.
///
/// Both line and column are 0-indexed. Columns count UTF-8 bytes from the
/// start of the line.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd, Serialize, Deserialize)]
pub struct LineCol {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed column (in UTF-8 bytes, not characters)
    pub col: u32,
}

impl LineCol {
    /// Create a new LineCol position.
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Debug for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

/// A half-open, zero-based line/column range: `[start, end)`.
///
/// This is the range shape carried by occurrences and diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: LineCol,
    pub end: LineCol,
}

impl Range {
    pub const fn new(start: LineCol, end: LineCol) -> Self {
        Self { start, end }
    }

    /// Single-line range helper.
    pub const fn on_line(line: u32, start_col: u32, end_col: u32) -> Self {
        Self {
            start: LineCol::new(line, start_col),
            end: LineCol::new(line, end_col),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// True if `other` lies entirely within `self` (equal ranges included).
    pub fn contains_range(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True if the two ranges share no position.
    pub fn is_disjoint(&self, other: &Range) -> bool {
        self.end <= other.start || other.end <= self.start
    }

    /// Partial overlap: neither disjoint nor nested.
    pub fn partially_overlaps(&self, other: &Range) -> bool {
        !self.is_disjoint(other) && !self.contains_range(other) && !other.contains_range(self)
    }
}

impl Ord for Range {
    fn cmp(&self, other: &Self) -> Ordering {
        // Wider ranges first when the start is shared, so containers precede contents.
        self.start
            .cmp(&other.start)
            .then_with(|| other.end.cmp(&self.end))
    }
}

impl PartialOrd for Range {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

/// Index for converting between byte offsets and line/column positions.
#[derive(Clone, Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line
    line_starts: Vec<TextSize>,
    len: TextSize,
}

impl LineIndex {
    /// Build a line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];

        for (offset, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(TextSize::from((offset + 1) as u32));
            }
        }

        Self {
            line_starts,
            len: TextSize::of(text),
        }
    }

    /// Convert a byte offset to a line/column position.
    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let offset = offset.min(self.len);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);

        let line_start = self.line_starts.get(line).copied().unwrap_or_default();
        let col = offset - line_start;

        LineCol {
            line: line as u32,
            col: col.into(),
        }
    }

    /// Convert a byte range to a line/column range.
    pub fn range(&self, range: TextRange) -> Range {
        Range::new(self.line_col(range.start()), self.line_col(range.end()))
    }

    /// Convert a line/column position to a byte offset.
    pub fn offset(&self, line_col: LineCol) -> Option<TextSize> {
        let line_start = self.line_starts.get(line_col.line as usize)?;
        Some(*line_start + TextSize::from(line_col.col))
    }

    /// Get the number of lines.
    pub fn len(&self) -> usize {
        self.line_starts.len()
    }

    /// Check if there are no lines (never true: an empty text has one line).
    pub fn is_empty(&self) -> bool {
        self.line_starts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_display_is_one_indexed() {
        let pos = LineCol::new(5, 10);
        assert_eq!(format!("{}", pos), "6:11");
        assert_eq!(format!("{:?}", pos), "5:10");
    }

    #[test]
    fn test_line_index_multi_line() {
        let index = LineIndex::new("hello\nworld\n!");

        assert_eq!(index.line_col(TextSize::from(0)), LineCol::new(0, 0));
        assert_eq!(index.line_col(TextSize::from(5)), LineCol::new(0, 5));
        assert_eq!(index.line_col(TextSize::from(6)), LineCol::new(1, 0));
        assert_eq!(index.line_col(TextSize::from(11)), LineCol::new(1, 5));
        assert_eq!(index.line_col(TextSize::from(12)), LineCol::new(2, 0));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_line_index_offset() {
        let index = LineIndex::new("hello\nworld");

        assert_eq!(index.offset(LineCol::new(1, 3)), Some(TextSize::from(9)));
        assert_eq!(index.offset(LineCol::new(4, 0)), None);
    }

    #[test]
    fn test_range_from_text_range() {
        let index = LineIndex::new("class A {\n  int x;\n}");
        let range = index.range(TextRange::new(16.into(), 17.into()));
        assert_eq!(range, Range::on_line(1, 6, 7));
    }

    #[test]
    fn test_range_containment_and_overlap() {
        let outer = Range::on_line(0, 0, 10);
        let inner = Range::on_line(0, 2, 4);
        let crossing = Range::on_line(0, 8, 12);
        let apart = Range::on_line(0, 10, 12);

        assert!(outer.contains_range(&inner));
        assert!(!inner.contains_range(&outer));
        assert!(outer.partially_overlaps(&crossing));
        assert!(outer.is_disjoint(&apart));
        assert!(!outer.partially_overlaps(&inner));
    }

    #[test]
    fn test_range_ordering_puts_container_first() {
        let mut ranges = vec![Range::on_line(0, 2, 4), Range::on_line(0, 2, 9), Range::on_line(0, 0, 1)];
        ranges.sort();
        assert_eq!(
            ranges,
            vec![Range::on_line(0, 0, 1), Range::on_line(0, 2, 9), Range::on_line(0, 2, 4)]
        );
    }
}
