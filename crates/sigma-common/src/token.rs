use serde::Serialize;

use crate::span::Span;

/// A token produced by the Sigma lexer.
///
/// The lexeme is not stored: it is recovered verbatim by slicing the source
/// with [`Token::text`], so string tokens keep their surrounding quotes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Create a new token from a kind and byte offsets.
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }

    /// The verbatim source text of this token.
    pub fn text<'src>(&self, source: &'src str) -> &'src str {
        self.span.text(source)
    }
}

/// Every kind of token in the Sigma language.
///
/// This enum is the complete vocabulary for the lexer: keywords, type
/// keywords, literals, operators, punctuation, identifiers, and `Eof`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    // ── Keywords (13) ──────────────────────────────────────────────────
    Class,
    If,
    Else,
    For,
    While,
    Return,
    Final,
    In,
    New,
    Void,
    True,
    False,
    Null,

    // ── Type keywords (5) ──────────────────────────────────────────────
    Int,
    Double,
    Float,
    Boolean,
    /// The `String` type keyword. Named `StringKw` to avoid conflict with
    /// Rust's `String`.
    StringKw,

    // ── Operators (19) ─────────────────────────────────────────────────
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    StarStar,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `!`
    Bang,
    /// `=`
    Eq,
    /// Lone `&`. Never valid Sigma; kept as its own kind so the parser can
    /// suggest `&&`.
    Amp,
    /// Lone `|`. Never valid Sigma; kept as its own kind so the parser can
    /// suggest `||`.
    Bar,

    // ── Punctuation (7) ────────────────────────────────────────────────
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `.`
    Dot,

    // ── Literals and identifiers (4) ───────────────────────────────────
    /// Integer literal, e.g. `42`.
    IntLiteral,
    /// Floating-point literal, e.g. `3.14`.
    FloatLiteral,
    /// String literal including the surrounding quotes.
    StringLiteral,
    /// Regular identifier, e.g. `foo`, `my_var`.
    Ident,

    // ── Special (1) ────────────────────────────────────────────────────
    /// End of file.
    Eof,
}

impl TokenKind {
    /// Whether this kind starts a type in declaration position
    /// (a type keyword or a class name identifier).
    pub fn starts_type(self) -> bool {
        matches!(
            self,
            TokenKind::Int
                | TokenKind::Double
                | TokenKind::Float
                | TokenKind::Boolean
                | TokenKind::StringKw
                | TokenKind::Void
                | TokenKind::Ident
        )
    }

    /// Whether this kind can begin a statement. Used by the parser's
    /// error-recovery synchronization.
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            TokenKind::Class
                | TokenKind::If
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Return
                | TokenKind::Final
                | TokenKind::LBrace
        ) || self.starts_type()
    }
}

/// Look up a keyword or type keyword from its string representation.
///
/// Returns `Some(TokenKind)` if the string is a Sigma keyword, `None`
/// otherwise. The lexer calls this after scanning an identifier-shaped
/// token.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "class" => Some(TokenKind::Class),
        "if" => Some(TokenKind::If),
        "else" => Some(TokenKind::Else),
        "for" => Some(TokenKind::For),
        "while" => Some(TokenKind::While),
        "return" => Some(TokenKind::Return),
        "final" => Some(TokenKind::Final),
        "in" => Some(TokenKind::In),
        "new" => Some(TokenKind::New),
        "void" => Some(TokenKind::Void),
        "true" => Some(TokenKind::True),
        "false" => Some(TokenKind::False),
        "null" => Some(TokenKind::Null),
        "int" => Some(TokenKind::Int),
        "double" => Some(TokenKind::Double),
        "float" => Some(TokenKind::Float),
        "boolean" => Some(TokenKind::Boolean),
        "String" => Some(TokenKind::StringKw),
        _ => None,
    }
}
