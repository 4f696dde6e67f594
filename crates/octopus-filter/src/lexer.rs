//! Tokenizer for filter expressions
//!
//! The grammar is parenthesized prefix notation:
//!
//! ```text
//! (and (not (has-header "Authorization")) (path-matches r"^/api/.*"))
//! ```
//!
//! Tokens borrow their text from the source so later stages can quote it
//! verbatim in error messages.

use crate::error::LexError;

/// Kind of a lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// Bare identifier such as `has-header`
    FuncName,
    /// `"..."`, escapes are processed when the literal is bound
    String,
    /// `r"..."`, contents used verbatim
    RawString,
    /// Decimal, `0x` hex or `0b` binary integer
    Number,
    /// `true` or `false`
    Boolean,
}

/// A token and the exact source slice it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token kind
    pub kind: TokenKind,
    /// Source text, including quotes and prefixes
    pub text: &'a str,
    /// Byte offset of the token in the source
    pub offset: usize,
}

/// Split `source` into tokens
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexError> {
    Lexer::new(source).collect()
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches([' ', '\t', '\r', '\n']);
        self.pos += rest.len() - trimmed.len();
    }

    fn token(&mut self, kind: TokenKind, len: usize) -> Token<'a> {
        let start = self.pos;
        self.pos += len;
        Token {
            kind,
            text: &self.source[start..self.pos],
            offset: start,
        }
    }

    /// Length of a quoted string starting at `quote` (the opening `"`)
    fn quoted_len(&self, quote: usize, escapes: bool) -> Result<usize, LexError> {
        let bytes = self.source.as_bytes();
        let mut i = quote + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' if escapes => i += 2,
                b'"' => return Ok(i + 1 - self.pos),
                _ => i += 1,
            }
        }
        Err(LexError::UnterminatedString { offset: self.pos })
    }

    fn number(&mut self) -> Result<Token<'a>, LexError> {
        let rest = self.rest();
        let (prefix, digits): (usize, fn(&char) -> bool) =
            if rest.starts_with("0x") || rest.starts_with("0X") {
                (2, |c| c.is_ascii_hexdigit())
            } else if rest.starts_with("0b") || rest.starts_with("0B") {
                (2, |c| matches!(*c, '0' | '1'))
            } else {
                (0, |c| c.is_ascii_digit())
            };

        let body = rest[prefix..].chars().take_while(digits).count();
        let len = prefix + body;
        let trailing = rest[len..].chars().next();

        if body == 0 || trailing.map_or(false, is_name_char) {
            let end = len + rest[len..].chars().take_while(|c| is_name_char(*c)).count();
            return Err(LexError::MalformedNumber {
                text: rest[..end].to_string(),
                offset: self.pos,
            });
        }

        Ok(self.token(TokenKind::Number, len))
    }

    fn name(&mut self) -> Token<'a> {
        let len = self
            .rest()
            .chars()
            .take_while(|c| is_name_char(*c))
            .count();
        let kind = match &self.rest()[..len] {
            "true" | "false" => TokenKind::Boolean,
            _ => TokenKind::FuncName,
        };
        self.token(kind, len)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        let rest = self.rest();
        let c = rest.chars().next()?;

        let token = match c {
            '(' => Ok(self.token(TokenKind::LParen, 1)),
            ')' => Ok(self.token(TokenKind::RParen, 1)),
            '"' => self
                .quoted_len(self.pos, true)
                .map(|len| self.token(TokenKind::String, len)),
            'r' if rest.starts_with("r\"") => self
                .quoted_len(self.pos + 1, false)
                .map(|len| self.token(TokenKind::RawString, len)),
            '0'..='9' => self.number(),
            c if c.is_ascii_alphabetic() => Ok(self.name()),
            found => Err(LexError::UnexpectedCharacter {
                found,
                offset: self.pos,
            }),
        };

        if token.is_err() {
            // Stop after the first error
            self.pos = self.source.len();
        }
        Some(token)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}
