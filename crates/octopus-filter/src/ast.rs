//! Raw syntax tree produced by the parser
//!
//! Names are not resolved and literals are not coerced here; that happens in
//! [`compiler`](crate::compiler) once the function's parameter shape is known.

use crate::lexer::TokenKind;

/// A function call: `(name arg*)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    /// Function name as written
    pub name: String,
    /// Arguments in source order
    pub args: Vec<Arg>,
}

/// One argument of a function call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Nested function call
    Statement(Expression),
    /// Literal value
    Literal(Literal),
}

/// Literal kinds the grammar knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    /// `"..."` with escapes
    String,
    /// `r"..."` without escapes
    RawString,
    /// Integer in base 10, 16 (`0x`) or 2 (`0b`)
    Number,
    /// `true` / `false`
    Boolean,
}

impl LiteralKind {
    pub(crate) fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::String => Some(Self::String),
            TokenKind::RawString => Some(Self::RawString),
            TokenKind::Number => Some(Self::Number),
            TokenKind::Boolean => Some(Self::Boolean),
            TokenKind::LParen | TokenKind::RParen | TokenKind::FuncName => None,
        }
    }
}

/// Literal argument, kept as source text until bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    /// Literal kind
    pub kind: LiteralKind,
    /// Exact source text, quotes and prefixes included
    pub text: String,
}

impl Literal {
    /// Create a literal
    pub fn new(kind: LiteralKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}
