//! # Octopus Filter
//!
//! Filter expressions that decide whether a script or addon runs for an
//! intercepted request or response.
//!
//! ```text
//! (and (not (has-header "Authorization")) (path-matches r"^/api/.*"))
//! ```
//!
//! A filter is lexed, parsed, and bound against a fixed catalog of predicate
//! functions when it is created. Binding checks names, arity and argument
//! types and compiles every regex, so a filter that parses is ready to run.
//! Evaluation happens against a [`Subject`], which is either a
//! [`ScriptRequest`] or a [`ScriptResponse`] supplied by the host.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod ast;
mod collector;
pub mod compiler;
pub mod error;
pub mod filter;
mod functions;
pub mod lexer;
mod literal;
pub mod parser;
pub mod pattern;
pub mod predicate;
pub mod registry;
pub mod subject;

#[cfg(test)]
mod testing;

pub use error::{FilterError, LexError, Result, SyntaxError};
pub use filter::{FilterExpression, RequestFilter, ResponseFilter};
pub use literal::{extract_raw, unquote};
pub use pattern::Pattern;
pub use registry::{list_functions, ArgType, FunctionDoc, ParamDoc};
pub use subject::{
    HttpMessage, HttpParameter, HttpService, ParameterType, ScriptRequest, ScriptResponse,
    Subject, SubjectKind, ToolType,
};

/// Prelude with commonly used types
pub mod prelude {
    pub use crate::error::{FilterError, Result};
    pub use crate::filter::{FilterExpression, RequestFilter, ResponseFilter};
    pub use crate::subject::{
        HttpMessage, HttpParameter, HttpService, ParameterType, ScriptRequest, ScriptResponse,
        Subject, SubjectKind, ToolType,
    };
}
