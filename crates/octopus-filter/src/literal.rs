//! Literal coercions applied while binding arguments

use crate::ast::{Literal, LiteralKind};
use crate::error::{FilterError, Result};
use crate::pattern::Pattern;

impl Literal {
    /// String value of a quoted or raw string literal
    pub fn must_get_string(&self, function: &'static str) -> Result<String> {
        match self.kind {
            LiteralKind::String => unquote(&self.text),
            LiteralKind::RawString => Ok(extract_raw(&self.text).to_string()),
            LiteralKind::Number | LiteralKind::Boolean => {
                Err(FilterError::invalid_arg(function, &self.text))
            }
        }
    }

    /// Integer value of a number literal
    pub fn must_get_int(&self, function: &'static str) -> Result<i64> {
        if self.kind != LiteralKind::Number {
            return Err(FilterError::invalid_arg(function, &self.text));
        }
        parse_int(&self.text).ok_or_else(|| FilterError::invalid_arg(function, &self.text))
    }

    /// Compile a string or raw string literal into a [`Pattern`]
    pub fn must_pattern(&self, function: &'static str) -> Result<Pattern> {
        let source = self.must_get_string(function)?;
        Pattern::new(&source).map_err(|cause| FilterError::InvalidPattern {
            function,
            pattern: source,
            cause,
        })
    }

    /// Value of a boolean literal
    pub fn as_bool(&self) -> Option<bool> {
        match (self.kind, self.text.as_str()) {
            (LiteralKind::Boolean, "true") => Some(true),
            (LiteralKind::Boolean, "false") => Some(false),
            _ => None,
        }
    }
}

fn parse_int(text: &str) -> Option<i64> {
    let (digits, radix) = if let Some(hex) = text.strip_prefix("0x").or(text.strip_prefix("0X")) {
        (hex, 16)
    } else if let Some(bin) = text.strip_prefix("0b").or(text.strip_prefix("0B")) {
        (bin, 2)
    } else {
        (text, 10)
    };
    i64::from_str_radix(digits, radix).ok()
}

/// Contents of a raw string literal `r"..."`, verbatim
pub fn extract_raw(text: &str) -> &str {
    text.strip_prefix("r\"")
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(text)
}

/// Contents of a quoted string literal with escapes processed
///
/// Supported escapes are `\n`, `\t`, `\r`, `\\`, `\"` and `\xHH`. `\xHH`
/// yields the character with code point `0xHH`.
pub fn unquote(text: &str) -> Result<String> {
    let inner = text
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(text);

    let invalid = |escape: String| FilterError::InvalidStringEscape {
        string: text.to_string(),
        escape,
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('x') => {
                let digits: String = chars.by_ref().take(2).collect();
                let code = (digits.len() == 2 && digits.chars().all(|d| d.is_ascii_hexdigit()))
                    .then(|| u8::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .ok_or_else(|| invalid(format!("\\x{digits}")))?;
                out.push(char::from(code));
            }
            Some(other) => return Err(invalid(format!("\\{other}"))),
            None => return Err(invalid("\\".to_string())),
        }
    }
    Ok(out)
}
