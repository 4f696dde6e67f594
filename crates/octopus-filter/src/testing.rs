//! In-memory messages for unit tests

use crate::subject::{
    HttpMessage, HttpParameter, HttpService, ParameterType, ScriptRequest, ScriptResponse,
    ToolType,
};

#[derive(Debug, Clone)]
pub(crate) struct TestRequest {
    pub(crate) method: String,
    pub(crate) url: String,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
    pub(crate) params: Vec<HttpParameter>,
    pub(crate) service: HttpService,
    pub(crate) in_scope: bool,
    pub(crate) tool: ToolType,
    pub(crate) attachments: Vec<(String, String)>,
    pub(crate) panic_on_method: bool,
}

impl Default for TestRequest {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            url: "https://example.com/api/users?id=1".to_string(),
            path: "/api/users?id=1".to_string(),
            headers: vec![("Host".to_string(), "example.com".to_string())],
            body: Vec::new(),
            params: vec![HttpParameter::new("id", "1", ParameterType::Url)],
            service: HttpService::new("example.com", 443, true),
            in_scope: false,
            tool: ToolType::Proxy,
            attachments: Vec::new(),
            panic_on_method: false,
        }
    }
}

impl HttpMessage for TestRequest {
    fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        self.headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn tool_source(&self) -> ToolType {
        self.tool
    }

    fn attachment(&self, key: &str) -> Option<&str> {
        self.attachments
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl ScriptRequest for TestRequest {
    fn method(&self) -> &str {
        if self.panic_on_method {
            panic!("method unavailable");
        }
        &self.method
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn path_without_query(&self) -> Option<&str> {
        self.path.split('?').next().filter(|p| !p.is_empty())
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

#[derive(Debug, Clone)]
pub(crate) struct TestResponse {
    pub(crate) request: TestRequest,
    pub(crate) status: u16,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
    pub(crate) cookies: Vec<String>,
}

impl TestResponse {
    pub(crate) fn new(request: TestRequest, status: u16) -> Self {
        Self {
            request,
            status,
            headers: Vec::new(),
            body: Vec::new(),
            cookies: Vec::new(),
        }
    }
}

impl HttpMessage for TestResponse {
    fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        self.headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn tool_source(&self) -> ToolType {
        self.request.tool
    }

    fn attachment(&self, _key: &str) -> Option<&str> {
        None
    }
}

impl ScriptResponse for TestResponse {
    fn status_code(&self) -> u16 {
        self.status
    }

    fn has_cookie(&self, name: &str) -> bool {
        self.cookies.iter().any(|c| c == name)
    }

    fn initiating_request(&self) -> &dyn ScriptRequest {
        &self.request
    }
}
