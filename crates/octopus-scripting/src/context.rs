//! Intercepted messages exposed to filters and addons

use crate::error::{Result, ScriptError};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, COOKIE, HOST, SET_COOKIE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use octopus_filter::{
    HttpMessage, HttpParameter, HttpService, ParameterType, ScriptRequest, ScriptResponse,
    ToolType,
};
use std::collections::HashMap;
use std::str::FromStr;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_str(name)
        .map_err(|e| ScriptError::context(format!("Invalid header name '{name}': {e}")))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|e| ScriptError::context(format!("Invalid header value for '{name}': {e}")))?;
    Ok((header_name, header_value))
}

/// `name=value` pairs separated by `sep`, values left encoded
fn raw_pairs(input: &str, sep: char) -> impl Iterator<Item = (&str, &str)> {
    input
        .split(sep)
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
}

fn resolve_service(uri: &Uri) -> HttpService {
    let secure = uri.scheme() == Some(&http::uri::Scheme::HTTPS);
    let default_port = if secure { 443 } else { 80 };
    HttpService::new(
        uri.host().unwrap_or_default(),
        uri.port_u16().unwrap_or(default_port),
        secure,
    )
}

/// Request context exposed to filters and addons
///
/// URL, form body and cookie parameters are parsed once, when the context is
/// built or its headers or body change.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: String,
    url: String,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    service: HttpService,
    tool: ToolType,
    in_scope: bool,
    attachments: HashMap<String, String>,
    params: Vec<HttpParameter>,
}

impl RequestContext {
    /// Create a request for `method` and an absolute `url`
    pub fn new<S: Into<String>>(method: S, url: &str) -> Result<Self> {
        let uri = Uri::from_str(url)
            .map_err(|e| ScriptError::context(format!("Invalid URI '{url}': {e}")))?;
        Ok(Self::from_parts(method.into(), uri, HeaderMap::new(), Bytes::new()))
    }

    /// Create from an HTTP request and its collected body
    ///
    /// An origin-form URI is made absolute with the `Host` header.
    pub fn from_request<B>(req: &http::Request<B>, body: impl Into<Bytes>) -> Self {
        let host = req.headers().get(HOST).and_then(|v| v.to_str().ok());
        let uri = match (req.uri().scheme(), host) {
            (None, Some(host)) => {
                let path = req.uri().path_and_query().map_or("/", |pq| pq.as_str());
                Uri::builder()
                    .scheme("http")
                    .authority(host)
                    .path_and_query(path)
                    .build()
                    .unwrap_or_else(|_| req.uri().clone())
            }
            _ => req.uri().clone(),
        };
        Self::from_parts(
            req.method().to_string(),
            uri,
            req.headers().clone(),
            body.into(),
        )
    }

    fn from_parts(method: String, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        let mut ctx = Self {
            method,
            url: uri.to_string(),
            service: resolve_service(&uri),
            uri,
            headers,
            body,
            tool: ToolType::Proxy,
            in_scope: false,
            attachments: HashMap::new(),
            params: Vec::new(),
        };
        ctx.parse_parameters();
        ctx
    }

    /// Append a header
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let (name, value) = header_pair(name, value)?;
        self.headers.append(name, value);
        self.parse_parameters();
        Ok(self)
    }

    /// Replace the body
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self.parse_parameters();
        self
    }

    /// Set the tool that produced this request
    pub fn with_tool_source(mut self, tool: ToolType) -> Self {
        self.tool = tool;
        self
    }

    /// Mark the target as in or out of scope
    pub fn with_in_scope(mut self, in_scope: bool) -> Self {
        self.in_scope = in_scope;
        self
    }

    /// Attach a value under `key`
    pub fn with_attachment(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attachment(key, value);
        self
    }

    /// Override the target service
    pub fn with_service(mut self, service: HttpService) -> Self {
        self.service = service;
        self
    }

    /// Attach a value under `key`
    pub fn set_attachment(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attachments.insert(key.into(), value.into());
    }

    /// Parsed request URI
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request headers
    pub fn header_map(&self) -> &HeaderMap {
        &self.headers
    }

    fn is_form(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map_or(false, |mime| mime.trim().eq_ignore_ascii_case(FORM_URLENCODED))
    }

    fn parse_parameters(&mut self) {
        let mut params = Vec::new();

        if let Some(query) = self.uri.query() {
            params.extend(
                raw_pairs(query, '&').map(|(n, v)| HttpParameter::new(n, v, ParameterType::Url)),
            );
        }

        if self.is_form() {
            let body = String::from_utf8_lossy(&self.body);
            params.extend(
                raw_pairs(&body, '&').map(|(n, v)| HttpParameter::new(n, v, ParameterType::Body)),
            );
        }

        for cookie in self.headers.get_all(COOKIE) {
            if let Ok(cookie) = cookie.to_str() {
                params.extend(
                    raw_pairs(cookie, ';')
                        .map(|(n, v)| HttpParameter::new(n, v, ParameterType::Cookie)),
                );
            }
        }

        self.params = params;
    }

    /// Apply method, URI and headers back to an HTTP request
    pub fn apply_to_request<B>(&self, req: &mut http::Request<B>) -> Result<()> {
        *req.method_mut() = Method::from_str(&self.method)
            .map_err(|e| ScriptError::context(format!("Invalid method: {e}")))?;
        *req.uri_mut() = self.uri.clone();
        *req.headers_mut() = self.headers.clone();
        Ok(())
    }
}

impl HttpMessage for RequestContext {
    fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        self.headers
            .iter()
            .filter_map(|(k, v)| Some((k.as_str(), v.to_str().ok()?)))
            .collect()
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn tool_source(&self) -> ToolType {
        self.tool
    }

    fn attachment(&self, key: &str) -> Option<&str> {
        self.attachments.get(key).map(String::as_str)
    }
}

impl ScriptRequest for RequestContext {
    fn method(&self) -> &str {
        &self.method
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn path(&self) -> &str {
        self.uri.path_and_query().map_or("", |pq| pq.as_str())
    }

    fn path_without_query(&self) -> Option<&str> {
        Some(self.uri.path()).filter(|p| !p.is_empty())
    }

    fn parameters(&self) -> &[HttpParameter] {
        &self.params
    }

    fn http_service(&self) -> &HttpService {
        &self.service
    }

    fn is_in_scope(&self) -> bool {
        self.in_scope
    }
}

/// Response context exposed to filters and addons
#[derive(Debug, Clone)]
pub struct ResponseContext {
    status: u16,
    headers: HeaderMap,
    body: Bytes,
    attachments: HashMap<String, String>,
    request: RequestContext,
}

impl ResponseContext {
    /// Create a response to `request`
    pub fn new(request: RequestContext, status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            attachments: HashMap::new(),
            request,
        }
    }

    /// Create from an HTTP response, its collected body and the request it answers
    pub fn from_response<B>(
        res: &http::Response<B>,
        body: impl Into<Bytes>,
        request: RequestContext,
    ) -> Self {
        Self {
            status: res.status().as_u16(),
            headers: res.headers().clone(),
            body: body.into(),
            attachments: HashMap::new(),
            request,
        }
    }

    /// Append a header
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let (name, value) = header_pair(name, value)?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Replace the body
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Attach a value under `key`
    pub fn with_attachment(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attachment(key, value);
        self
    }

    /// Attach a value under `key`
    pub fn set_attachment(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attachments.insert(key.into(), value.into());
    }

    /// Status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers
    pub fn header_map(&self) -> &HeaderMap {
        &self.headers
    }

    /// The request this response answers
    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    /// Apply status and headers back to an HTTP response
    pub fn apply_to_response<B>(&self, res: &mut http::Response<B>) -> Result<()> {
        *res.status_mut() = StatusCode::from_u16(self.status)
            .map_err(|e| ScriptError::context(format!("Invalid status code: {e}")))?;
        *res.headers_mut() = self.headers.clone();
        Ok(())
    }
}

impl HttpMessage for ResponseContext {
    fn header_value(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        self.headers
            .iter()
            .filter_map(|(k, v)| Some((k.as_str(), v.to_str().ok()?)))
            .collect()
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn tool_source(&self) -> ToolType {
        self.request.tool
    }

    fn attachment(&self, key: &str) -> Option<&str> {
        self.attachments.get(key).map(String::as_str)
    }
}

impl ScriptResponse for ResponseContext {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn has_cookie(&self, name: &str) -> bool {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|cookie| cookie.split(';').next()?.split_once('='))
            .any(|(cookie_name, _)| cookie_name.trim() == name)
    }

    fn initiating_request(&self) -> &dyn ScriptRequest {
        &self.request
    }
}
