//! Token types for icvm intermediate code.
//!
//! Tokens are the output of the lexer and input to the program builder.
//! Comments never become tokens.

use std::fmt;

use crate::instruction::BinOp;
use crate::span::Span;

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns the 1-based line this token starts on.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.span.line
    }

    /// Returns the 1-based line this token ends on. Only string literals
    /// can span lines.
    #[must_use]
    pub fn end_line(&self) -> u32 {
        match &self.kind {
            TokenKind::Str(text) => {
                let breaks = text.matches('\n').count();
                self.span
                    .line
                    .saturating_add(u32::try_from(breaks).unwrap_or(u32::MAX))
            }
            _ => self.span.line,
        }
    }
}

/// Token types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier like `x` or `_t0`.
    Ident(String),
    /// Global reference like `@main`; stores the name without `@`.
    GlobalRef(String),
    /// Label definition like `loop:`; stores the name without `:`.
    Label(String),
    /// Nonnegative integer literal.
    Number(i64),
    /// Single-quoted string literal, contents only.
    Str(String),
    /// `:=` or a binary operator.
    Op(Operator),
    /// Reserved word.
    Keyword(Keyword),
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ident(_) => "identifier",
            Self::GlobalRef(_) => "global reference",
            Self::Label(_) => "label",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Op(Operator::Assign) => "':='",
            Self::Op(Operator::Binary(_)) => "operator",
            Self::Keyword(_) => "keyword",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "{name}"),
            Self::GlobalRef(name) => write!(f, "@{name}"),
            Self::Label(name) => write!(f, "{name}:"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "'{s}'"),
            Self::Op(op) => write!(f, "{op}"),
            Self::Keyword(kw) => write!(f, "{kw}"),
        }
    }
}

/// Operator tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    /// `:=`
    Assign,
    /// One of `+ - * / % == <= >= > <`.
    Binary(BinOp),
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assign => write!(f, ":="),
            Self::Binary(op) => write!(f, "{op}"),
        }
    }
}

/// Reserved words. They are keywords only when they form a whole identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    /// `goto`
    Goto,
    /// `call`
    Call,
    /// `arg`
    Arg,
    /// `ret`
    Ret,
    /// `ifnz`
    Ifnz,
    /// `ifz`
    Ifz,
}

impl Keyword {
    /// Looks up a keyword by its exact spelling.
    #[must_use]
    pub fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "goto" => Some(Self::Goto),
            "call" => Some(Self::Call),
            "arg" => Some(Self::Arg),
            "ret" => Some(Self::Ret),
            "ifnz" => Some(Self::Ifnz),
            "ifz" => Some(Self::Ifz),
            _ => None,
        }
    }

    /// Returns the keyword's spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Goto => "goto",
            Self::Call => "call",
            Self::Arg => "arg",
            Self::Ret => "ret",
            Self::Ifnz => "ifnz",
            Self::Ifz => "ifz",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
