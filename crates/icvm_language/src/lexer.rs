//! Lexer for icvm intermediate code.
//!
//! The lexer converts IR text into a lazy stream of tokens. It is an
//! [`Iterator`] over `Result<Token, BuildError>`; cloning it or calling
//! [`Lexer::reset`] restarts the stream. Comments (`;` to end of line) and
//! whitespace, including line breaks, are skipped. Line information survives
//! in each token's [`Span`].

use icvm_foundation::BuildError;

use crate::instruction::BinOp;
use crate::span::Span;
use crate::token::{Keyword, Operator, Token, TokenKind};

/// Lexer for IR source text.
#[derive(Clone, Debug)]
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
    /// Set after the first error; the stream is fused from then on.
    failed: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub const fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
            failed: false,
        }
    }

    /// Rewinds to the beginning of the source.
    pub fn reset(&mut self) {
        *self = Self::new(self.source);
    }

    /// Tokenizes all source and returns a vector of tokens.
    ///
    /// # Errors
    ///
    /// Returns the first lexical error encountered.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, BuildError> {
        Lexer::new(source).collect()
    }

    /// Returns the next token, `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Lex`] on an unterminated string, an integer
    /// literal that does not fit in 64 bits, or an unrecognized character.
    pub fn next_token(&mut self) -> Result<Option<Token>, BuildError> {
        self.skip_trivia();

        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek_char() else {
            return Ok(None);
        };

        let kind = match c {
            '\'' => self.scan_string()?,
            '@' => self.scan_global()?,
            c if c.is_ascii_digit() => self.scan_number()?,
            c if is_ident_start(c) => self.scan_word(),
            _ => self.scan_operator()?,
        };

        Ok(Some(Token::new(
            kind,
            Span::new(start, self.position, start_line, start_column),
        )))
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Peeks at the character `n` positions ahead.
    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    /// Advances past the next character.
    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Skips whitespace and `;` comments.
    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.advance();
            } else if c == ';' {
                while let Some(c) = self.peek_char() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    /// Builds a lex error at the current position.
    fn error_here(&self, message: impl Into<String>) -> BuildError {
        BuildError::Lex {
            message: message.into(),
            offset: self.position,
            line: self.line,
            column: self.column,
        }
    }

    /// Scans a single-quoted string literal. No escapes are processed.
    fn scan_string(&mut self) -> Result<TokenKind, BuildError> {
        let open = self.error_here("unterminated string literal");
        self.advance(); // consume opening quote
        let start = self.position;
        loop {
            match self.peek_char() {
                Some('\'') => {
                    let text = self.source[start..self.position].to_string();
                    self.advance();
                    return Ok(TokenKind::Str(text));
                }
                Some(_) => self.advance(),
                None => return Err(open),
            }
        }
    }

    /// Scans `@name`.
    fn scan_global(&mut self) -> Result<TokenKind, BuildError> {
        let at = self.error_here("expected identifier after '@'");
        self.advance(); // consume '@'
        match self.peek_char() {
            Some(c) if is_ident_start(c) => Ok(TokenKind::GlobalRef(self.scan_ident_text())),
            _ => Err(at),
        }
    }

    /// Scans a nonnegative integer literal.
    fn scan_number(&mut self) -> Result<TokenKind, BuildError> {
        let start_err = self.error_here("integer literal out of range");
        let start = self.position;
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        self.source[start..self.position]
            .parse::<i64>()
            .map(TokenKind::Number)
            .map_err(|_| start_err)
    }

    /// Scans an identifier, keyword, or label definition.
    fn scan_word(&mut self) -> TokenKind {
        let name = self.scan_ident_text();

        if let Some(keyword) = Keyword::from_ident(&name) {
            return TokenKind::Keyword(keyword);
        }

        // `name:` is a label, `name:=` is an assignment target.
        if self.peek_char() == Some(':') && self.peek_char_n(1) != Some('=') {
            self.advance();
            return TokenKind::Label(name);
        }

        TokenKind::Ident(name)
    }

    /// Scans identifier text.
    fn scan_ident_text(&mut self) -> String {
        let start = self.position;
        while self.peek_char().is_some_and(is_ident_char) {
            self.advance();
        }
        self.source[start..self.position].to_string()
    }

    /// Scans one of the fixed operators.
    fn scan_operator(&mut self) -> Result<TokenKind, BuildError> {
        let here = self.error_here(match self.peek_char() {
            Some(c) => format!("unexpected character: {c}"),
            None => "unexpected end of input".to_string(),
        });
        let first = self.peek_char();
        let second = self.peek_char_n(1);

        let (op, len) = match (first, second) {
            (Some(':'), Some('=')) => (Operator::Assign, 2),
            (Some('='), Some('=')) => (Operator::Binary(BinOp::Eq), 2),
            (Some('<'), Some('=')) => (Operator::Binary(BinOp::Le), 2),
            (Some('>'), Some('=')) => (Operator::Binary(BinOp::Ge), 2),
            (Some('<'), _) => (Operator::Binary(BinOp::Lt), 1),
            (Some('>'), _) => (Operator::Binary(BinOp::Gt), 1),
            (Some('+'), _) => (Operator::Binary(BinOp::Add), 1),
            (Some('-'), _) => (Operator::Binary(BinOp::Sub), 1),
            (Some('*'), _) => (Operator::Binary(BinOp::Mul), 1),
            (Some('/'), _) => (Operator::Binary(BinOp::Div), 1),
            (Some('%'), _) => (Operator::Binary(BinOp::Mod), 1),
            _ => return Err(here),
        };

        for _ in 0..len {
            self.advance();
        }
        Ok(TokenKind::Op(op))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, BuildError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Returns true if `c` can start an identifier.
///
/// Compiler-generated temporaries (`_t0`, `_L0`) begin with an underscore, so
/// it counts as a letter here.
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Returns true if `c` can appear in an identifier after the first character.
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
