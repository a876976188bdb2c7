use std::fmt;

use serde::Serialize;

/// Byte-offset span into source text. Start is inclusive, end is exclusive.
///
/// Positions throughout the Sigma compiler are byte offsets into the
/// original source string; lexemes are recovered by slicing with
/// [`Span::text`] rather than stored. Human-readable positions come from
/// [`SourceMap`] when a diagnostic is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Create a new span from byte offsets.
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start ({start}) must be <= end ({end})");
        Self { start, end }
    }

    /// A zero-length span at the given offset.
    pub fn point(offset: u32) -> Self {
        Self::new(offset, offset)
    }

    /// The smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// The verbatim source text this span covers.
    ///
    /// # Panics
    ///
    /// Panics if the span is out of bounds for `source` or not on UTF-8
    /// boundaries.
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        &source[self.start as usize..self.end as usize]
    }
}

/// A 1-based human-readable source position.
///
/// Displays as `line L:C`, the prefix every textual Sigma diagnostic
/// carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}:{}", self.line, self.column)
    }
}

/// Maps byte offsets back to human positions for one source file.
///
/// Stores the exclusive end offset of every line (the offset one past its
/// `\n`, or past the final character for an unterminated last line), so a
/// lookup is a binary search for the first line that ends after the
/// offset. Offsets at or past end of input resolve to the last line, which
/// keeps end-of-file diagnostics pointing at real text.
#[derive(Debug)]
pub struct SourceMap {
    line_ends: Vec<u32>,
}

impl SourceMap {
    /// Build the map by walking the source line by line.
    pub fn new(source: &str) -> Self {
        let mut line_ends = Vec::new();
        let mut offset = 0u32;
        for line in source.split_inclusive('\n') {
            offset += line.len() as u32;
            line_ends.push(offset);
        }
        Self { line_ends }
    }

    /// The position of a byte offset.
    pub fn position(&self, offset: u32) -> Position {
        let idx = self.line_ends.partition_point(|&end| end <= offset);
        let idx = idx.min(self.line_ends.len().saturating_sub(1));
        let line_start = if idx == 0 {
            0
        } else {
            self.line_ends[idx - 1]
        };
        Position {
            line: idx as u32 + 1,
            column: offset.saturating_sub(line_start) + 1,
        }
    }

    /// Render a diagnostic in the standard textual form:
    /// `line L:C: message`, positioned at the start of `span`.
    pub fn describe(&self, span: Span, message: impl fmt::Display) -> String {
        format!("{}: {message}", self.position(span.start))
    }

    /// Number of lines in the source. An empty source counts as one line.
    pub fn line_count(&self) -> usize {
        self.line_ends.len().max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_merge_covers_both() {
        let a = Span::new(5, 10);
        let b = Span::new(8, 15);
        assert_eq!(a.merge(b), Span::new(5, 15));
        assert_eq!(b.merge(a), Span::new(5, 15));
    }

    #[test]
    fn span_point_and_text() {
        assert_eq!(Span::point(3), Span::new(3, 3));
        let source = "int value;";
        assert_eq!(Span::new(4, 9).text(source), "value");
    }

    #[test]
    fn position_displays_as_diagnostic_prefix() {
        let pos = Position { line: 3, column: 7 };
        assert_eq!(pos.to_string(), "line 3:7");
    }

    #[test]
    fn positions_on_a_single_line() {
        let map = SourceMap::new("hello");
        assert_eq!(map.position(0), Position { line: 1, column: 1 });
        assert_eq!(map.position(4), Position { line: 1, column: 5 });
    }

    #[test]
    fn positions_across_lines() {
        let map = SourceMap::new("int x;\nint y;\nx = y;");
        assert_eq!(map.position(0), Position { line: 1, column: 1 });
        assert_eq!(map.position(7), Position { line: 2, column: 1 });
        assert_eq!(map.position(14), Position { line: 3, column: 1 });
        assert_eq!(map.position(18), Position { line: 3, column: 5 });
    }

    #[test]
    fn newline_belongs_to_its_own_line() {
        let map = SourceMap::new("ab\ncd");
        assert_eq!(map.position(2), Position { line: 1, column: 3 });
        assert_eq!(map.position(3), Position { line: 2, column: 1 });
    }

    #[test]
    fn offsets_past_the_end_clamp_to_the_last_line() {
        let map = SourceMap::new("ab\ncd");
        assert_eq!(map.position(5), Position { line: 2, column: 3 });
        assert_eq!(map.position(400), Position { line: 2, column: 398 });
    }

    #[test]
    fn empty_source_is_one_line() {
        let map = SourceMap::new("");
        assert_eq!(map.position(0), Position { line: 1, column: 1 });
        assert_eq!(map.line_count(), 1);
    }

    #[test]
    fn describe_prefixes_the_message() {
        let map = SourceMap::new("int x;\nint = 5;");
        assert_eq!(
            map.describe(Span::new(11, 12), "expected identifier"),
            "line 2:5: expected identifier"
        );
    }

    #[test]
    fn line_count() {
        assert_eq!(SourceMap::new("a\nb\nc").line_count(), 3);
        assert_eq!(SourceMap::new("a\nb\n").line_count(), 2);
    }
}
