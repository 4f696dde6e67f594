//! # Octopus Scripting
//!
//! Addons that run on intercepted traffic, selected by filter expressions.
//!
//! ## Features
//!
//! - Request and response contexts that filters can inspect
//! - Per-addon `REQ_FILTER` / `RES_FILTER` selection, parsed at load time
//! - YAML, TOML and JSON addon configuration with `${VAR:-default}` expansion
//! - Ordered addon chains
//!
//! ## Example
//!
//! ```
//! use octopus_scripting::prelude::*;
//! use std::sync::Arc;
//!
//! let config = AddonConfig::new("api-only").with_req_filter(r#"(path-matches r"^/api/.*")"#);
//! let addon = Addon::new(&config, Arc::new(PassThrough)).unwrap();
//!
//! let request = RequestContext::new("GET", "https://example.com/api/users").unwrap();
//! assert!(addon.filters().should_handle_request(&request));
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod addon;
pub mod config;
pub mod context;
pub mod error;

pub use addon::{Addon, AddonChain, AddonConfig, AddonFilters, AddonHandler, PassThrough};
pub use config::{ConfigFormat, ScriptsConfig};
pub use context::{RequestContext, ResponseContext};
pub use error::{Result, ScriptError};

/// Prelude with commonly used types
pub mod prelude {
    pub use crate::addon::{Addon, AddonChain, AddonConfig, AddonFilters, AddonHandler, PassThrough};
    pub use crate::config::{ConfigFormat, ScriptsConfig};
    pub use crate::context::{RequestContext, ResponseContext};
    pub use crate::error::{Result, ScriptError};
    pub use octopus_filter::{HttpMessage, ScriptRequest, ScriptResponse, ToolType};
}
