//! Addon filters and dispatch
//!
//! An addon pairs a handler with optional request and response filters. The
//! filters are parsed when the addon is loaded; an addon with an invalid
//! filter never loads.

use crate::context::{RequestContext, ResponseContext};
use crate::error::{Result, ScriptError};
use octopus_filter::{RequestFilter, ResponseFilter, ScriptRequest, ScriptResponse};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, trace};

/// Addon configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonConfig {
    /// Addon name, used in logs and errors
    pub name: String,

    /// Filter deciding which requests the addon sees (default: all)
    #[serde(default, alias = "REQ_FILTER", skip_serializing_if = "Option::is_none")]
    pub req_filter: Option<String>,

    /// Filter deciding which responses the addon sees (default: all)
    #[serde(default, alias = "RES_FILTER", skip_serializing_if = "Option::is_none")]
    pub res_filter: Option<String>,

    /// Whether to keep the original message when the handler fails (default: false)
    #[serde(default)]
    pub continue_on_error: bool,
}

impl AddonConfig {
    /// Create config for an addon that handles everything
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the request filter
    pub fn with_req_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.req_filter = Some(filter.into());
        self
    }

    /// Set the response filter
    pub fn with_res_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.res_filter = Some(filter.into());
        self
    }

    /// Continue on errors
    pub fn continue_on_error(mut self) -> Self {
        self.continue_on_error = true;
        self
    }
}

/// Parsed request and response filters of one addon
#[derive(Debug, Clone, Default)]
pub struct AddonFilters {
    request: Option<RequestFilter>,
    response: Option<ResponseFilter>,
}

impl AddonFilters {
    /// Parse both filters of `config`
    pub fn from_config(config: &AddonConfig) -> Result<Self> {
        let request = config
            .req_filter
            .as_deref()
            .map(RequestFilter::parse)
            .transpose()
            .map_err(|e| ScriptError::filter_parse(&config.name, "REQ_FILTER", e))?;
        let response = config
            .res_filter
            .as_deref()
            .map(ResponseFilter::parse)
            .transpose()
            .map_err(|e| ScriptError::filter_parse(&config.name, "RES_FILTER", e))?;
        Ok(Self { request, response })
    }

    /// True if the addon should see this request
    pub fn should_handle_request(&self, request: &dyn ScriptRequest) -> bool {
        self.request.as_ref().map_or(true, |f| f.matches(request))
    }

    /// True if the addon should see this response
    pub fn should_handle_response(&self, response: &dyn ScriptResponse) -> bool {
        self.response.as_ref().map_or(true, |f| f.matches(response))
    }

    /// The request filter, if any
    pub fn request_filter(&self) -> Option<&RequestFilter> {
        self.request.as_ref()
    }

    /// The response filter, if any
    pub fn response_filter(&self) -> Option<&ResponseFilter> {
        self.response.as_ref()
    }
}

/// Callbacks an addon runs on matching messages
///
/// Both default to passing the message through unchanged.
pub trait AddonHandler: Send + Sync {
    /// Handle a request
    fn on_request(&self, request: RequestContext) -> Result<RequestContext> {
        Ok(request)
    }

    /// Handle a response
    fn on_response(&self, response: ResponseContext) -> Result<ResponseContext> {
        Ok(response)
    }
}

/// A handler that changes nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl AddonHandler for PassThrough {}

/// A loaded addon
pub struct Addon {
    name: String,
    filters: AddonFilters,
    handler: Arc<dyn AddonHandler>,
    continue_on_error: bool,
}

impl Addon {
    /// Load an addon, parsing its filters
    pub fn new(config: &AddonConfig, handler: Arc<dyn AddonHandler>) -> Result<Self> {
        let filters = AddonFilters::from_config(config)?;
        debug!(
            addon = %config.name,
            req_filter = config.req_filter.as_deref().unwrap_or("-"),
            res_filter = config.res_filter.as_deref().unwrap_or("-"),
            "Loaded addon"
        );
        Ok(Self {
            name: config.name.clone(),
            filters,
            handler,
            continue_on_error: config.continue_on_error,
        })
    }

    /// Addon name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parsed filters
    pub fn filters(&self) -> &AddonFilters {
        &self.filters
    }

    /// Run the handler if the request filter matches
    pub fn on_request(&self, request: RequestContext) -> Result<RequestContext> {
        if !self.filters.should_handle_request(&request) {
            trace!(addon = %self.name, url = %request.url(), "Request filtered out");
            return Ok(request);
        }

        let original = self.continue_on_error.then(|| request.clone());
        match self.handler.on_request(request) {
            Ok(request) => Ok(request),
            Err(e) => {
                error!(addon = %self.name, error = %e, "Addon failed on request");
                original.ok_or(e)
            }
        }
    }

    /// Run the handler if the response filter matches
    pub fn on_response(&self, response: ResponseContext) -> Result<ResponseContext> {
        if !self.filters.should_handle_response(&response) {
            trace!(
                addon = %self.name,
                status = response.status(),
                "Response filtered out"
            );
            return Ok(response);
        }

        let original = self.continue_on_error.then(|| response.clone());
        match self.handler.on_response(response) {
            Ok(response) => Ok(response),
            Err(e) => {
                error!(addon = %self.name, error = %e, "Addon failed on response");
                original.ok_or(e)
            }
        }
    }
}

impl fmt::Debug for Addon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Addon")
            .field("name", &self.name)
            .field("filters", &self.filters)
            .field("continue_on_error", &self.continue_on_error)
            .finish()
    }
}

/// Addons run in registration order
#[derive(Debug, Default)]
pub struct AddonChain {
    addons: Vec<Addon>,
}

impl AddonChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an addon
    pub fn push(&mut self, addon: Addon) {
        self.addons.push(addon);
    }

    /// Number of addons
    pub fn len(&self) -> usize {
        self.addons.len()
    }

    /// True if the chain has no addons
    pub fn is_empty(&self) -> bool {
        self.addons.is_empty()
    }

    /// Addons in order
    pub fn iter(&self) -> impl Iterator<Item = &Addon> {
        self.addons.iter()
    }

    /// Pass a request through every addon
    pub fn on_request(&self, request: RequestContext) -> Result<RequestContext> {
        self.addons
            .iter()
            .try_fold(request, |request, addon| addon.on_request(request))
    }

    /// Pass a response through every addon
    pub fn on_response(&self, response: ResponseContext) -> Result<ResponseContext> {
        self.addons
            .iter()
            .try_fold(response, |response, addon| addon.on_response(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octopus_filter::{FilterError, HttpMessage};

    struct Tag(&'static str);

    impl AddonHandler for Tag {
        fn on_request(&self, request: RequestContext) -> Result<RequestContext> {
            Ok(request.with_attachment(self.0, "1"))
        }

        fn on_response(&self, response: ResponseContext) -> Result<ResponseContext> {
            Ok(response.with_attachment(self.0, "1"))
        }
    }

    struct Fail;

    impl AddonHandler for Fail {
        fn on_request(&self, _request: RequestContext) -> Result<RequestContext> {
            Err(ScriptError::handler("fail", "boom"))
        }
    }

    fn request(url: &str) -> RequestContext {
        RequestContext::new("GET", url).unwrap()
    }

    #[test]
    fn test_config_aliases() {
        let config: AddonConfig = serde_json::from_str(
            r#"{"name": "a", "REQ_FILTER": "(in-scope)", "RES_FILTER": "(status-code-eq 200)"}"#,
        )
        .unwrap();
        assert_eq!(config.req_filter.as_deref(), Some("(in-scope)"));
        assert_eq!(config.res_filter.as_deref(), Some("(status-code-eq 200)"));
        assert!(!config.continue_on_error);
    }

    #[test]
    fn test_invalid_filter_aborts_loading() {
        let config = AddonConfig::new("broken").with_res_filter("(status-code-eq \"x\")");
        let err = Addon::new(&config, Arc::new(PassThrough)).unwrap_err();
        match err {
            ScriptError::FilterParse { addon, field, source } => {
                assert_eq!(addon, "broken");
                assert_eq!(field, "RES_FILTER");
                assert!(matches!(source, FilterError::InvalidArg { .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_absent_filter_handles_everything() {
        let filters = AddonFilters::from_config(&AddonConfig::new("all")).unwrap();
        let req = request("https://example.com/");
        assert!(filters.should_handle_request(&req));
        assert!(filters.should_handle_response(&ResponseContext::new(req, 500)));
    }

    #[test]
    fn test_filter_selects_requests() {
        let config = AddonConfig::new("api").with_req_filter(r#"(path-matches r"^/api/.*")"#);
        let addon = Addon::new(&config, Arc::new(Tag("api"))).unwrap();

        let req = addon.on_request(request("https://example.com/api/users")).unwrap();
        assert!(req.has_attachment("api"));

        let req = addon.on_request(request("https://example.com/static/app.js")).unwrap();
        assert!(!req.has_attachment("api"));
    }

    #[test]
    fn test_response_filter_selects() {
        let config = AddonConfig::new("errors").with_res_filter("(status-code-in 500 599)");
        let addon = Addon::new(&config, Arc::new(Tag("errors"))).unwrap();

        let res = addon
            .on_response(ResponseContext::new(request("https://example.com/"), 503))
            .unwrap();
        assert!(res.has_attachment("errors"));

        let res = addon
            .on_response(ResponseContext::new(request("https://example.com/"), 200))
            .unwrap();
        assert!(!res.has_attachment("errors"));
    }

    #[test]
    fn test_handler_errors() {
        let addon = Addon::new(&AddonConfig::new("fail"), Arc::new(Fail)).unwrap();
        assert!(matches!(
            addon.on_request(request("https://example.com/")),
            Err(ScriptError::Handler { .. })
        ));

        let config = AddonConfig::new("fail").continue_on_error();
        let addon = Addon::new(&config, Arc::new(Fail)).unwrap();
        let req = addon.on_request(request("https://example.com/x")).unwrap();
        assert_eq!(req.url(), "https://example.com/x");
    }

    #[test]
    fn test_chain_runs_in_order() {
        let mut chain = AddonChain::new();
        chain.push(Addon::new(&AddonConfig::new("first"), Arc::new(Tag("first"))).unwrap());
        chain.push(
            Addon::new(
                &AddonConfig::new("second").with_req_filter(r#"(has-attachment "first")"#),
                Arc::new(Tag("second")),
            )
            .unwrap(),
        );
        assert_eq!(chain.len(), 2);

        let req = chain.on_request(request("https://example.com/")).unwrap();
        assert!(req.has_attachment("first"));
        assert!(req.has_attachment("second"));
    }
}
