//! Script loading and dispatch error types

use octopus_filter::FilterError;
use std::fmt;

/// Script result type
pub type Result<T> = std::result::Result<T, ScriptError>;

/// Script loading or dispatch error
#[derive(Debug, Clone)]
pub enum ScriptError {
    /// An addon's filter did not parse
    FilterParse {
        /// Addon name
        addon: String,
        /// Which filter failed (`REQ_FILTER` or `RES_FILTER`)
        field: &'static str,
        /// Parse error
        source: FilterError,
    },

    /// Invalid configuration
    Config {
        /// Error message
        message: String,
    },

    /// A message context could not be built or written back
    Context {
        /// Error message
        message: String,
    },

    /// An addon handler failed
    Handler {
        /// Addon name
        addon: String,
        /// Error message
        message: String,
    },

    /// IO error (reading config files)
    Io {
        /// Error message
        message: String,
    },
}

impl ScriptError {
    /// Create a filter parse error
    pub fn filter_parse<S: Into<String>>(addon: S, field: &'static str, source: FilterError) -> Self {
        Self::FilterParse {
            addon: addon.into(),
            field,
            source,
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a context error
    pub fn context<S: Into<String>>(message: S) -> Self {
        Self::Context {
            message: message.into(),
        }
    }

    /// Create a handler error
    pub fn handler<A: Into<String>, S: Into<String>>(addon: A, message: S) -> Self {
        Self::Handler {
            addon: addon.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FilterParse {
                addon,
                field,
                source,
            } => {
                write!(f, "Error parsing {field} for addon '{addon}': {source}")
            }
            Self::Config { message } => write!(f, "Script config error: {message}"),
            Self::Context { message } => write!(f, "Invalid message context: {message}"),
            Self::Handler { addon, message } => {
                write!(f, "Addon '{addon}' failed: {message}")
            }
            Self::Io { message } => write!(f, "Script IO error: {message}"),
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FilterParse { source, .. } => Some(source),
            _ => None,
        }
    }
}
