//! The messages a filter is evaluated against
//!
//! Hosts expose intercepted traffic through [`ScriptRequest`] and
//! [`ScriptResponse`]; a filter sees one of them wrapped in a [`Subject`].

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Tool that produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    /// The suite itself
    Suite,
    /// Site map / target tool
    Target,
    /// Intercepting proxy
    Proxy,
    /// Scanner
    Scanner,
    /// Intruder
    Intruder,
    /// Repeater
    Repeater,
    /// Logger
    Logger,
    /// Sequencer
    Sequencer,
    /// Decoder
    Decoder,
    /// Comparer
    Comparer,
    /// Extensions
    Extensions,
    /// Organizer
    Organizer,
}

impl ToolType {
    /// All tool types
    pub const ALL: [ToolType; 12] = [
        Self::Suite,
        Self::Target,
        Self::Proxy,
        Self::Scanner,
        Self::Intruder,
        Self::Repeater,
        Self::Logger,
        Self::Sequencer,
        Self::Decoder,
        Self::Comparer,
        Self::Extensions,
        Self::Organizer,
    ];

    /// Display name of the tool
    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::Suite => "Suite",
            Self::Target => "Target",
            Self::Proxy => "Proxy",
            Self::Scanner => "Scanner",
            Self::Intruder => "Intruder",
            Self::Repeater => "Repeater",
            Self::Logger => "Logger",
            Self::Sequencer => "Sequencer",
            Self::Decoder => "Decoder",
            Self::Comparer => "Comparer",
            Self::Extensions => "Extensions",
            Self::Organizer => "Organizer",
        }
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool_name())
    }
}

impl FromStr for ToolType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.tool_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown tool type: {s}"))
    }
}

/// Where a request parameter came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterType {
    /// Query string
    Url,
    /// Form-encoded body
    Body,
    /// `Cookie` header
    Cookie,
}

/// A request parameter with its raw (still encoded) value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpParameter {
    /// Parameter name
    pub name: String,
    /// Raw value
    pub value: String,
    /// Parameter origin
    pub kind: ParameterType,
}

impl HttpParameter {
    /// Create a parameter
    pub fn new(name: impl Into<String>, value: impl Into<String>, kind: ParameterType) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind,
        }
    }
}

/// Service a request was sent to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HttpService {
    /// Host name or address
    pub host: String,
    /// Port
    pub port: u16,
    /// Whether TLS is used
    pub secure: bool,
}

impl HttpService {
    /// Create a service description
    pub fn new(host: impl Into<String>, port: u16, secure: bool) -> Self {
        Self {
            host: host.into(),
            port,
            secure,
        }
    }
}

/// Operations shared by requests and responses
pub trait HttpMessage {
    /// First value of the named header, compared case-insensitively
    fn header_value(&self, name: &str) -> Option<&str>;

    /// All headers in order
    fn headers(&self) -> Vec<(&str, &str)>;

    /// Raw body
    fn body(&self) -> &[u8];

    /// Tool that produced this message
    fn tool_source(&self) -> ToolType;

    /// Value attached to this message by a script
    fn attachment(&self, key: &str) -> Option<&str>;

    /// True if the named header is present
    fn has_header(&self, name: &str) -> bool {
        self.header_value(name).is_some()
    }

    /// Body decoded as UTF-8, lossily
    fn body_to_string(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.body())
    }

    /// Body parsed as JSON, `None` when it is not valid JSON
    fn body_to_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(self.body()).ok()
    }

    /// True if a script attached a value under `key`
    fn has_attachment(&self, key: &str) -> bool {
        self.attachment(key).is_some()
    }
}

/// An intercepted request
pub trait ScriptRequest: HttpMessage {
    /// HTTP method
    fn method(&self) -> &str;

    /// Absolute URL
    fn url(&self) -> &str;

    /// Path including the query string
    fn path(&self) -> &str;

    /// Path without the query string, `None` if the request has no path
    fn path_without_query(&self) -> Option<&str>;

    /// Parsed URL, body and cookie parameters
    fn parameters(&self) -> &[HttpParameter];

    /// Service the request targets
    fn http_service(&self) -> &HttpService;

    /// True if the target is in the configured scope
    fn is_in_scope(&self) -> bool;

    /// True if a parameter of the given type and name exists
    fn has_parameter(&self, name: &str, kind: ParameterType) -> bool {
        self.parameters()
            .iter()
            .any(|p| p.kind == kind && p.name == name)
    }
}

/// An intercepted response
pub trait ScriptResponse: HttpMessage {
    /// HTTP status code
    fn status_code(&self) -> u16;

    /// True if the response sets the named cookie
    fn has_cookie(&self, name: &str) -> bool;

    /// The request this response answers
    fn initiating_request(&self) -> &dyn ScriptRequest;
}

/// Which variant of [`Subject`] a filter saw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubjectKind {
    /// A request
    Request,
    /// A response
    Response,
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => write!(f, "Request"),
            Self::Response => write!(f, "Response"),
        }
    }
}

/// The message a filter is evaluated against
#[derive(Clone, Copy)]
pub enum Subject<'a> {
    /// Evaluate against a request
    Request(&'a dyn ScriptRequest),
    /// Evaluate against a response
    Response(&'a dyn ScriptResponse),
}

impl<'a> Subject<'a> {
    /// Variant of this subject
    pub fn kind(&self) -> SubjectKind {
        match self {
            Self::Request(_) => SubjectKind::Request,
            Self::Response(_) => SubjectKind::Response,
        }
    }

    /// The request itself, or the request a response answers
    pub fn request(&self) -> &'a dyn ScriptRequest {
        match *self {
            Self::Request(req) => req,
            Self::Response(res) => res.initiating_request(),
        }
    }
}

impl fmt::Debug for Subject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(req) => f
                .debug_struct("Request")
                .field("method", &req.method())
                .field("url", &req.url())
                .field("tool", &req.tool_source())
                .finish(),
            Self::Response(res) => {
                let req = res.initiating_request();
                f.debug_struct("Response")
                    .field("status", &res.status_code())
                    .field("method", &req.method())
                    .field("url", &req.url())
                    .field("tool", &res.tool_source())
                    .finish()
            }
        }
    }
}
