//! Error types for filter expressions

use crate::subject::SubjectKind;

/// Result type alias using [`FilterError`]
pub type Result<T, E = FilterError> = std::result::Result<T, E>;

/// Errors raised while parsing, binding or evaluating a filter expression
///
/// Everything except [`FilterError::InvalidTarget`] is raised by
/// [`FilterExpression::parse`](crate::FilterExpression::parse). `InvalidTarget`
/// only appears during evaluation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FilterError {
    /// The source is not a well formed expression
    #[error("invalid expression: {expression}")]
    InvalidExpression {
        /// Original filter source
        expression: String,
        /// Underlying syntax error
        #[source]
        cause: SyntaxError,
    },

    /// A function name that is not in the registry
    #[error("invalid function `{0}`")]
    UnknownFunction(String),

    /// An argument that does not fit the parameter at its position
    #[error("invalid argument `{arg}` to {function}")]
    InvalidArg {
        /// Function being called
        function: &'static str,
        /// Source text of the offending argument
        arg: String,
    },

    /// More arguments than the function accepts
    #[error("too many arguments for `{function}`, expected {expected}")]
    TooManyArgs {
        /// Function being called
        function: &'static str,
        /// Number of declared parameters
        expected: usize,
    },

    /// A required argument was not supplied
    #[error("function {function} missing arg {arg} at {position}")]
    MissingArg {
        /// Function being called
        function: &'static str,
        /// Declared parameter name
        arg: &'static str,
        /// 1-based parameter position
        position: usize,
    },

    /// A pattern argument failed to compile
    #[error("invalid pattern in call to {function} - {pattern}")]
    InvalidPattern {
        /// Function being called
        function: &'static str,
        /// Pattern source
        pattern: String,
        /// Regex compiler error
        #[source]
        cause: regex::Error,
    },

    /// Unrecognised `\X` escape in a quoted string literal
    #[error("invalid string escape `{escape}` in `{string}`")]
    InvalidStringEscape {
        /// The quoted literal as written
        string: String,
        /// The offending escape sequence
        escape: String,
    },

    /// A function evaluated against a subject it does not support
    #[error("cannot use function {function} with target {target}")]
    InvalidTarget {
        /// Function being evaluated
        function: &'static str,
        /// Subject variant it was evaluated against
        target: SubjectKind,
    },
}

impl FilterError {
    /// Create an invalid argument error
    pub fn invalid_arg(function: &'static str, arg: impl Into<String>) -> Self {
        Self::InvalidArg {
            function,
            arg: arg.into(),
        }
    }

    /// True for errors that can only surface during evaluation
    pub fn is_runtime(&self) -> bool {
        matches!(self, Self::InvalidTarget { .. })
    }
}

/// Token or grammar level failure
///
/// These never reach callers directly; [`FilterExpression::parse`](crate::FilterExpression::parse)
/// folds them into [`FilterError::InvalidExpression`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    /// The lexer could not recognise the input
    #[error(transparent)]
    Lex(#[from] LexError),

    /// A token that is not valid at this position
    #[error("unexpected `{found}` at offset {offset}")]
    UnexpectedToken {
        /// Token text
        found: String,
        /// Byte offset in the source
        offset: usize,
    },

    /// `(` not followed by a function name
    #[error("expected function name at offset {offset}")]
    ExpectedFunctionName {
        /// Byte offset in the source
        offset: usize,
    },

    /// Input ended inside an expression
    #[error("unexpected end of input")]
    UnexpectedEnd,

    /// Expressions nested deeper than [`MAX_DEPTH`](crate::parser::MAX_DEPTH)
    #[error("expression nested deeper than {limit} levels at offset {offset}")]
    TooDeep {
        /// Nesting limit
        limit: usize,
        /// Byte offset of the `(` that exceeded it
        offset: usize,
    },

    /// Nothing to parse
    #[error("empty expression")]
    Empty,
}

/// Lexer failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    /// A character that starts no token
    #[error("unrecognised character `{found}` at offset {offset}")]
    UnexpectedCharacter {
        /// The character
        found: char,
        /// Byte offset in the source
        offset: usize,
    },

    /// String literal without a closing quote
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString {
        /// Byte offset of the opening quote
        offset: usize,
    },

    /// Numeric prefix with no digits after it
    #[error("malformed number `{text}` at offset {offset}")]
    MalformedNumber {
        /// Token text
        text: String,
        /// Byte offset in the source
        offset: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = FilterError::MissingArg {
            function: "has-header",
            arg: "headers",
            position: 1,
        };
        assert_eq!(err.to_string(), "function has-header missing arg headers at 1");

        let err = FilterError::InvalidTarget {
            function: "status-code-eq",
            target: SubjectKind::Request,
        };
        assert_eq!(
            err.to_string(),
            "cannot use function status-code-eq with target Request"
        );
        assert!(err.is_runtime());
    }

    #[test]
    fn test_invalid_expression_keeps_cause() {
        use std::error::Error as _;

        let err = FilterError::InvalidExpression {
            expression: "(and".to_string(),
            cause: SyntaxError::UnexpectedEnd,
        };
        assert_eq!(err.to_string(), "invalid expression: (and");
        assert!(err.source().is_some());
        assert!(!err.is_runtime());
    }
}
