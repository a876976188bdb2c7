// Sigma lexer -- tokenizer for the Sigma programming language.

mod cursor;

use cursor::Cursor;
use sigma_common::error::{LexError, LexErrorKind};
use sigma_common::span::Span;
use sigma_common::token::{keyword_from_str, Token, TokenKind};

/// The result of lexing a source file.
///
/// `tokens` is always terminated by an `Eof` token, even when a fatal
/// lexical error cut the stream short. The parser uses the partial stream
/// for recovery; the strict entry point [`Lexer::tokenize`] collapses this
/// pair into a `Result`.
#[derive(Debug)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub error: Option<LexError>,
}

impl LexOutput {
    /// Whether lexing completed without an error.
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}

/// The Sigma lexer. Converts source text into a stream of tokens.
///
/// A hand-written single pass over a [`Cursor`]. Whitespace and comments
/// are consumed but never emitted; every token carries the byte span of
/// its source text. Lexical errors are fatal: the lexer stops at the
/// offending position.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    /// Tokenize the entire source, keeping whatever was produced before a
    /// fatal error. The returned token vector always ends with `Eof`.
    pub fn lex(source: &str) -> LexOutput {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            match lexer.next_token() {
                Ok(token) => {
                    let done = token.kind == TokenKind::Eof;
                    tokens.push(token);
                    if done {
                        break;
                    }
                }
                Err(error) => {
                    let at = lexer.cursor.pos();
                    tokens.push(Token::new(TokenKind::Eof, at, at));
                    return LexOutput {
                        tokens,
                        error: Some(error),
                    };
                }
            }
        }
        LexOutput {
            tokens,
            error: None,
        }
    }

    /// Strict tokenization: the full token stream or the first fatal error.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
        let output = Lexer::lex(source);
        match output.error {
            Some(error) => Err(error),
            None => Ok(output.tokens),
        }
    }

    /// Produce the next token, skipping whitespace and comments first.
    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia()?;

        let start = self.cursor.pos();

        let Some(c) = self.cursor.peek() else {
            return Ok(Token::new(TokenKind::Eof, start, start));
        };

        // Punctuation and single-character operators.
        if let Some(kind) = single_char_kind(c) {
            self.cursor.bump();
            return Ok(Token::new(kind, start, self.cursor.pos()));
        }

        let kind = match c {
            // Operators with one character of lookahead. A lone `&` or `|`
            // keeps its own kind so the parser can suggest the doubled
            // form.
            '*' => self
                .cursor
                .select('*', TokenKind::StarStar, TokenKind::Star),
            '=' => self.cursor.select('=', TokenKind::EqEq, TokenKind::Eq),
            '!' => self.cursor.select('=', TokenKind::NotEq, TokenKind::Bang),
            '<' => self.cursor.select('=', TokenKind::LtEq, TokenKind::Lt),
            '>' => self.cursor.select('=', TokenKind::GtEq, TokenKind::Gt),
            '&' => self.cursor.select('&', TokenKind::AmpAmp, TokenKind::Amp),
            '|' => self
                .cursor
                .select('|', TokenKind::PipePipe, TokenKind::Bar),

            '0'..='9' => self.number(),

            '"' => return self.string(start),

            c if is_ident_start(c) => self.ident_or_keyword(start),

            _ => {
                self.cursor.bump();
                return Err(LexError::new(
                    LexErrorKind::UnexpectedCharacter(c),
                    Span::new(start, self.cursor.pos()),
                ));
            }
        };
        Ok(Token::new(kind, start, self.cursor.pos()))
    }

    // ── Trivia ─────────────────────────────────────────────────────────

    /// Skip whitespace and comments. `// ...` runs to end of line;
    /// `/* ... */` is non-nesting and must be terminated.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match self.cursor.peek() {
                Some(' ' | '\t' | '\n' | '\r') => {
                    self.cursor.bump();
                }
                Some('/') if self.cursor.peek_second() == Some('/') => {
                    self.cursor.eat_while(|c| c != '\n');
                }
                Some('/') if self.cursor.peek_second() == Some('*') => {
                    self.skip_block_comment()?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Skip a `/* ... */` block comment. Errors at EOF without `*/`.
    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.cursor.pos();
        self.cursor.bump(); // consume '/'
        self.cursor.bump(); // consume '*'

        loop {
            match self.cursor.bump() {
                None => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedBlockComment,
                        Span::new(start, self.cursor.pos()),
                    ));
                }
                Some('*') => {
                    if self.cursor.bump_if('/') {
                        return Ok(());
                    }
                }
                Some(_) => {}
            }
        }
    }

    // ── Literals ───────────────────────────────────────────────────────

    /// A number literal starting at the current digit.
    ///
    /// `[0-9]+` is an integer. A `.` followed by another digit reclassifies
    /// it as a float `[0-9]+.[0-9]+`. A trailing `.` without a digit stays
    /// an integer; the dot is lexed separately.
    fn number(&mut self) -> TokenKind {
        self.cursor.eat_while(|c| c.is_ascii_digit());

        if self.cursor.peek() == Some('.')
            && self.cursor.peek_second().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.bump(); // consume '.'
            self.cursor.eat_while(|c| c.is_ascii_digit());
            return TokenKind::FloatLiteral;
        }

        TokenKind::IntLiteral
    }

    /// A double-quoted string literal.
    ///
    /// Recognized escapes: `\n \t \r \" \\`. Any other escape, a raw
    /// newline, or EOF before the closing quote is fatal. The token's span
    /// includes both quotes.
    fn string(&mut self, start: u32) -> Result<Token, LexError> {
        self.cursor.bump(); // consume opening '"'

        loop {
            match self.cursor.peek() {
                None => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedString,
                        Span::new(start, self.cursor.pos()),
                    ));
                }
                Some('"') => {
                    self.cursor.bump();
                    return Ok(Token::new(
                        TokenKind::StringLiteral,
                        start,
                        self.cursor.pos(),
                    ));
                }
                Some('\n' | '\r') => {
                    return Err(LexError::new(
                        LexErrorKind::NewlineInString,
                        Span::new(self.cursor.pos(), self.cursor.pos() + 1),
                    ));
                }
                Some('\\') => {
                    let escape_at = self.cursor.pos();
                    self.cursor.bump(); // consume '\'
                    match self.cursor.bump() {
                        Some('n' | 't' | 'r' | '"' | '\\') => {}
                        Some(other) => {
                            return Err(LexError::new(
                                LexErrorKind::InvalidEscapeSequence(other),
                                Span::new(escape_at, self.cursor.pos()),
                            ));
                        }
                        None => {
                            return Err(LexError::new(
                                LexErrorKind::UnterminatedString,
                                Span::new(start, self.cursor.pos()),
                            ));
                        }
                    }
                }
                Some(_) => {
                    self.cursor.bump();
                }
            }
        }
    }

    // ── Identifiers and keywords ───────────────────────────────────────

    /// An identifier, checked against the keyword table after full capture.
    fn ident_or_keyword(&mut self, start: u32) -> TokenKind {
        self.cursor.eat_while(is_ident_continue);
        keyword_from_str(self.cursor.lexeme_from(start)).unwrap_or(TokenKind::Ident)
    }
}

/// Punctuation and operators that are always a single character.
fn single_char_kind(c: char) -> Option<TokenKind> {
    Some(match c {
        '(' => TokenKind::LParen,
        ')' => TokenKind::RParen,
        '{' => TokenKind::LBrace,
        '}' => TokenKind::RBrace,
        ';' => TokenKind::Semicolon,
        ',' => TokenKind::Comma,
        '.' => TokenKind::Dot,
        '+' => TokenKind::Plus,
        '-' => TokenKind::Minus,
        '/' => TokenKind::Slash,
        '%' => TokenKind::Percent,
        _ => return None,
    })
}

/// Whether a character can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Whether a character can continue an identifier.
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .expect("lexing should succeed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lex_simple_declaration() {
        assert_eq!(
            kinds("int x = 42;"),
            vec![
                TokenKind::Int,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::IntLiteral,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_spans_accurate() {
        let tokens = Lexer::tokenize("int x = 42;").unwrap();
        assert_eq!(tokens[0].span, Span::new(0, 3)); // int
        assert_eq!(tokens[1].span, Span::new(4, 5)); // x
        assert_eq!(tokens[2].span, Span::new(6, 7)); // =
        assert_eq!(tokens[3].span, Span::new(8, 10)); // 42
        assert_eq!(tokens[4].span, Span::new(10, 11)); // ;
    }

    #[test]
    fn lex_float_reclassification() {
        assert_eq!(
            kinds("3.14"),
            vec![TokenKind::FloatLiteral, TokenKind::Eof]
        );
    }

    #[test]
    fn lex_trailing_dot_stays_integer() {
        assert_eq!(
            kinds("3."),
            vec![TokenKind::IntLiteral, TokenKind::Dot, TokenKind::Eof]
        );
    }

    #[test]
    fn lex_power_operator() {
        assert_eq!(
            kinds("2 ** 3"),
            vec![
                TokenKind::IntLiteral,
                TokenKind::StarStar,
                TokenKind::IntLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_lone_amp_and_bar() {
        assert_eq!(
            kinds("a & b | c"),
            vec![
                TokenKind::Ident,
                TokenKind::Amp,
                TokenKind::Ident,
                TokenKind::Bar,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_string_keeps_quotes_in_span() {
        let source = "\"hello\"";
        let tokens = Lexer::tokenize(source).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].text(source), "\"hello\"");
    }

    #[test]
    fn lex_string_with_escapes() {
        let source = r#""a\n\t\r\"\\b""#;
        let tokens = Lexer::tokenize(source).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn lex_invalid_escape_is_fatal() {
        let err = Lexer::tokenize(r#""bad\q""#).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::InvalidEscapeSequence('q'));
    }

    #[test]
    fn lex_unterminated_string_is_fatal() {
        let err = Lexer::tokenize("\"never closed").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
    }

    #[test]
    fn lex_newline_in_string_is_fatal() {
        let err = Lexer::tokenize("\"line one\nline two\"").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::NewlineInString);
    }

    #[test]
    fn lex_comments_are_invisible() {
        assert_eq!(
            kinds("int x; // trailing\n/* block\ncomment */ int y;"),
            vec![
                TokenKind::Int,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Int,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_unterminated_block_comment_is_fatal() {
        let err = Lexer::tokenize("int x; /* never").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedBlockComment);
    }

    #[test]
    fn lex_unexpected_character_is_fatal() {
        let err = Lexer::tokenize("int @x;").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('@'));
    }

    #[test]
    fn lex_partial_stream_survives_error() {
        let output = Lexer::lex("int x = @");
        assert!(output.error.is_some());
        let kinds: Vec<_> = output.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_empty_source() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn lex_whitespace_only_source() {
        assert_eq!(kinds("  \t\r\n  "), vec![TokenKind::Eof]);
    }
}
