//! Sigma parser: recursive descent over the lexer's token stream.
//!
//! The parser always returns an AST, possibly partial: errors are collected
//! into a list instead of being thrown, so downstream phases can operate on
//! recovered structure. A fatal lexical error becomes the leading
//! diagnostic and parsing proceeds on the tokens produced before the
//! failure.

pub mod ast;
pub mod error;
mod parser;

use sigma_common::error::LexError;
use sigma_common::span::SourceMap;
use sigma_lexer::Lexer;

pub use error::ParseError;

use ast::CompilationUnit;

/// Result of parsing a Sigma source file.
pub struct Parse {
    pub unit: CompilationUnit,
    pub errors: Vec<ParseError>,
    /// The fatal lexical error, when tokenization was cut short. Also
    /// present in `errors` as the leading diagnostic.
    pub lex_error: Option<LexError>,
}

impl Parse {
    /// Whether parsing completed without hard errors (hints don't count).
    pub fn ok(&self) -> bool {
        self.errors.iter().all(|e| e.is_hint())
    }

    /// Render every diagnostic as `line L:C: message`, in source order.
    pub fn formatted_errors(&self, source: &str) -> Vec<String> {
        let map = SourceMap::new(source);
        self.errors.iter().map(|e| e.format(&map)).collect()
    }
}

/// Parse a Sigma source file.
///
/// Lexes the source, then parses the (possibly truncated) token stream.
pub fn parse(source: &str) -> Parse {
    let lexed = Lexer::lex(source);

    let mut p = parser::Parser::new(lexed.tokens, source);
    let unit = parser::items::compilation_unit(&mut p);
    let mut errors = p.errors;

    if let Some(lex_error) = &lexed.error {
        errors.insert(0, ParseError::new(lex_error.kind.to_string(), lex_error.span));
    }

    Parse {
        unit,
        errors,
        lex_error: lexed.error,
    }
}
