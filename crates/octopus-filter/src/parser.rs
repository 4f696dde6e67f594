//! Recursive-descent parser
//!
//! ```text
//! expression := "(" FUNCNAME arg* ")"
//! arg        := expression | literal
//! literal    := STRING | RAW_STRING | NUMBER | BOOLEAN
//! ```

use crate::ast::{Arg, Expression, Literal, LiteralKind};
use crate::error::SyntaxError;
use crate::lexer::{tokenize, Token, TokenKind};

/// Deepest nesting of expressions a filter may use
pub const MAX_DEPTH: usize = 256;

/// Parse a complete filter source into an [`Expression`]
///
/// The whole input must be exactly one expression.
pub fn parse(source: &str) -> Result<Expression, SyntaxError> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse_root()
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<Token<'a>>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn parse_root(&mut self) -> Result<Expression, SyntaxError> {
        if self.tokens.is_empty() {
            return Err(SyntaxError::Empty);
        }
        let expr = self.parse_expression()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(unexpected(token)),
        }
    }

    fn parse_expression(&mut self) -> Result<Expression, SyntaxError> {
        let open = self.bump().ok_or(SyntaxError::UnexpectedEnd)?;
        if open.kind != TokenKind::LParen {
            return Err(unexpected(open));
        }
        if self.depth == MAX_DEPTH {
            return Err(SyntaxError::TooDeep {
                limit: MAX_DEPTH,
                offset: open.offset,
            });
        }

        self.depth += 1;
        let expr = self.parse_call();
        self.depth -= 1;
        expr
    }

    fn parse_call(&mut self) -> Result<Expression, SyntaxError> {
        let name = match self.bump() {
            Some(token) if token.kind == TokenKind::FuncName => token.text.to_string(),
            Some(token) => {
                return Err(SyntaxError::ExpectedFunctionName {
                    offset: token.offset,
                })
            }
            None => return Err(SyntaxError::UnexpectedEnd),
        };

        let mut args = Vec::new();
        loop {
            let token = self.peek().ok_or(SyntaxError::UnexpectedEnd)?;
            match token.kind {
                TokenKind::RParen => {
                    self.pos += 1;
                    return Ok(Expression { name, args });
                }
                TokenKind::LParen => args.push(Arg::Statement(self.parse_expression()?)),
                TokenKind::FuncName => return Err(unexpected(token)),
                kind => {
                    self.pos += 1;
                    let kind = LiteralKind::from_token(kind).ok_or_else(|| unexpected(token))?;
                    args.push(Arg::Literal(Literal::new(kind, token.text)));
                }
            }
        }
    }
}

fn unexpected(token: Token<'_>) -> SyntaxError {
    SyntaxError::UnexpectedToken {
        found: token.text.to_string(),
        offset: token.offset,
    }
}
