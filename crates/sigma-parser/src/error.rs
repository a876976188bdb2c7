use std::fmt;

use sigma_common::span::{SourceMap, Span};

/// A parse error: a message anchored to a source span.
///
/// Errors are collected, never thrown; the parser always returns an AST,
/// possibly partial. Messages containing the phrase "Did you mean" are
/// recovery hints, which the driver classifies as warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    /// Whether this diagnostic is a recovery hint rather than a hard error.
    pub fn is_hint(&self) -> bool {
        self.message.contains("Did you mean")
    }

    /// Render as `line L:C: message` using the given source map.
    pub fn format(&self, map: &SourceMap) -> String {
        map.describe(self.span, &self.message)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_includes_line_and_column() {
        let map = SourceMap::new("int x;\nint = 5;");
        let err = ParseError::new("expected identifier", Span::new(11, 12));
        assert_eq!(err.format(&map), "line 2:5: expected identifier");
    }

    #[test]
    fn hint_classification() {
        let hint = ParseError::new("unexpected '&'. Did you mean '&&'?", Span::new(0, 1));
        let hard = ParseError::new("expected ';'", Span::new(0, 1));
        assert!(hint.is_hint());
        assert!(!hard.is_hint());
    }
}
