//! Recursive-descent parser for Sigma.
//!
//! The parser walks the token stream with single-token lookahead plus an
//! `nth()` peek for the declaration tie-breaks, building AST values
//! directly. A position mark (`save`/`restore`) supports speculative
//! attempts; `synchronize()` implements panic-mode recovery by skipping to
//! the next `;`, `}`, or statement-starting keyword, always consuming at
//! least one token so the parser is guaranteed to terminate.

pub(crate) mod expressions;
pub(crate) mod items;
pub(crate) mod statements;

use sigma_common::span::Span;
use sigma_common::token::{Token, TokenKind};

use crate::ast::ExprId;
use crate::error::ParseError;

/// A saved parser position, for speculative parsing.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Mark {
    pos: usize,
    errors: usize,
    next_expr_id: u32,
}

/// Recursive-descent parser state over a lexed token stream.
pub(crate) struct Parser<'src> {
    /// All tokens from the lexer, terminated by `Eof`.
    tokens: Vec<Token>,
    /// Current position in the token stream.
    pos: usize,
    /// Original source text, for extracting token lexemes.
    source: &'src str,
    /// Collected parse errors.
    pub(crate) errors: Vec<ParseError>,
    /// Monotonic counter for expression identities.
    next_expr_id: u32,
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token stream and its source text.
    pub(crate) fn new(tokens: Vec<Token>, source: &'src str) -> Self {
        debug_assert!(
            matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof),
            "token stream must be Eof-terminated"
        );
        Self {
            tokens,
            pos: 0,
            source,
            errors: Vec::new(),
            next_expr_id: 0,
        }
    }

    // ── Lookahead ──────────────────────────────────────────────────────

    /// Kind of the current token.
    pub(crate) fn current(&self) -> TokenKind {
        self.nth(0)
    }

    /// Kind of the token `n` positions ahead. Clamps to `Eof` past the end.
    pub(crate) fn nth(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    /// Verbatim text of the current token.
    pub(crate) fn current_text(&self) -> &'src str {
        self.tokens
            .get(self.pos)
            .map(|t| t.text(self.source))
            .unwrap_or("")
    }

    /// Span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|t| t.span)
            .unwrap_or_else(|| Span::point(self.source.len() as u32))
    }

    /// Whether the current token matches `kind`.
    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    /// Whether the parser has reached the end of the stream.
    pub(crate) fn at_eof(&self) -> bool {
        self.at(TokenKind::Eof)
    }

    // ── Consumption ────────────────────────────────────────────────────

    /// Consume the current token and return it. At `Eof`, returns the
    /// `Eof` token without moving.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// If the current token matches `kind`, consume it and return true.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the current token if it matches `kind`, otherwise record an
    /// error naming `what` and return `None`.
    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> Option<Token> {
        if self.at(kind) {
            Some(self.advance())
        } else {
            self.error(format!("expected {what}, found '{}'", self.describe_current()));
            None
        }
    }

    /// A printable description of the current token for error messages.
    pub(crate) fn describe_current(&self) -> String {
        if self.at_eof() {
            "end of file".to_string()
        } else {
            self.current_text().to_string()
        }
    }

    // ── Speculation ────────────────────────────────────────────────────

    /// Save the current position for a later `restore`.
    pub(crate) fn save(&self) -> Mark {
        Mark {
            pos: self.pos,
            errors: self.errors.len(),
            next_expr_id: self.next_expr_id,
        }
    }

    /// Roll back to a saved position, discarding errors and expression ids
    /// allocated since the mark.
    pub(crate) fn restore(&mut self, mark: Mark) {
        self.pos = mark.pos;
        self.errors.truncate(mark.errors);
        self.next_expr_id = mark.next_expr_id;
    }

    // ── Errors and recovery ────────────────────────────────────────────

    /// Record a parse error at the current token.
    pub(crate) fn error(&mut self, message: impl Into<String>) {
        let span = self.current_span();
        self.errors.push(ParseError::new(message, span));
    }

    /// Record a parse error at the given span.
    pub(crate) fn error_at(&mut self, message: impl Into<String>, span: Span) {
        self.errors.push(ParseError::new(message, span));
    }

    /// Position in the token stream, for progress checks during recovery.
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    /// Panic-mode recovery: skip tokens until a statement boundary.
    ///
    /// Stops after `;`, before `}`, or before a token that can start a
    /// statement. Callers guarantee one-token progress via [`Parser::recover`]
    /// when the failed parse consumed nothing.
    pub(crate) fn synchronize(&mut self) {
        while !self.at_eof() {
            match self.current() {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace => return,
                kind if kind.starts_statement() => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Recover after a failed statement parse that began at token position
    /// `before`. Forces at least one token of progress so the parse loop
    /// terminates, then synchronizes to a statement boundary.
    pub(crate) fn recover(&mut self, before: usize) {
        if self.pos == before && !self.at_eof() {
            self.advance();
        }
        self.synchronize();
    }

    // ── Expression identities ──────────────────────────────────────────

    /// Allocate the next expression id.
    pub(crate) fn fresh_id(&mut self) -> ExprId {
        let id = ExprId(self.next_expr_id);
        self.next_expr_id += 1;
        id
    }
}
