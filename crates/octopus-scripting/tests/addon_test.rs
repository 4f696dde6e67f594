//! End-to-end filter selection over real message contexts

use octopus_filter::FilterExpression;
use octopus_scripting::prelude::*;
use std::io::Write;
use std::sync::Arc;

struct Mark(&'static str);

impl AddonHandler for Mark {
    fn on_request(&self, request: RequestContext) -> Result<RequestContext> {
        Ok(request.with_attachment(self.0, "seen"))
    }

    fn on_response(&self, response: ResponseContext) -> Result<ResponseContext> {
        Ok(response.with_attachment(self.0, "seen"))
    }
}

fn get(url: &str) -> RequestContext {
    RequestContext::new("GET", url).unwrap()
}

#[test]
fn test_filter_applies_to_both_message_kinds() {
    let filter = FilterExpression::parse(r#"(has-header "X-Trace")"#).unwrap();

    let request = get("https://example.com/").with_header("X-Trace", "1").unwrap();
    let response = ResponseContext::new(get("https://example.com/"), 200)
        .with_header("X-Trace", "1")
        .unwrap();

    assert!(filter.matches_request(&request));
    assert!(filter.matches_response(&response));
    assert!(!filter.matches_request(&get("https://example.com/")));
}

#[test]
fn test_request_functions_see_initiating_request() {
    let filter = FilterExpression::parse(r#"(and (method-eq "POST") (status-code-eq 201))"#).unwrap();
    let request = RequestContext::new("POST", "https://example.com/items").unwrap();

    assert!(filter.matches_response(&ResponseContext::new(request.clone(), 201)));
    assert!(!filter.matches_response(&ResponseContext::new(request, 200)));
}

#[test]
fn test_query_param_values_are_decoded() {
    let filter = FilterExpression::parse(r#"(query-param-matches "q" r"such value=asdf")"#).unwrap();
    assert!(filter.matches_request(&get("https://example.com/search?q=such+value%3dasdf")));
    assert!(!filter.matches_request(&get("https://example.com/search?q=other")));
}

#[test]
fn test_status_filter_fails_closed_on_requests() {
    let filter = FilterExpression::parse("(status-code-eq 200)").unwrap();
    assert!(!filter.matches_request(&get("https://example.com/")));
}

#[test]
fn test_form_and_cookie_parameters() {
    let request = RequestContext::new("POST", "https://example.com/login")
        .unwrap()
        .with_header("Content-Type", "application/x-www-form-urlencoded; charset=utf-8")
        .unwrap()
        .with_header("Cookie", "session=abc; theme=dark")
        .unwrap()
        .with_body("user=admin&password=hunter2");

    let filter =
        FilterExpression::parse(r#"(and (has-form-param "password") (has-cookie "session"))"#)
            .unwrap();
    assert!(filter.matches_request(&request));
}

#[test]
fn test_tool_source_and_scope() {
    let request = get("https://example.com/")
        .with_tool_source(ToolType::Repeater)
        .with_in_scope(true);

    let filter = FilterExpression::parse(r#"(and (in-scope) (tool-source-eq "repeater"))"#).unwrap();
    assert!(filter.matches_request(&request));

    let filter = FilterExpression::parse("(from-proxy)").unwrap();
    assert!(!filter.matches_request(&request));
}

#[test]
fn test_chain_from_config_file() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        r#"addons:
  - name: api
    REQ_FILTER: '(path-matches r"^/api/.*")'
  - name: server-errors
    RES_FILTER: '(status-code-in 500 599)'
  - name: json
    RES_FILTER: '(header-matches "Content-Type" r"application/json.*")'
"#
    )
    .unwrap();

    let config = ScriptsConfig::load_from_file(file.path()).unwrap();
    config.validate().unwrap();

    let names = ["api", "server-errors", "json"];
    let mut next = names.iter();
    let chain = config.build_chain(|_| Arc::new(Mark(next.next().copied().unwrap_or("unknown"))));
    assert_eq!(chain.len(), 3);

    let request = chain.on_request(get("https://example.com/api/users")).unwrap();
    assert!(request.has_attachment("api"));

    let response = ResponseContext::new(request, 502)
        .with_header("Content-Type", "text/html")
        .unwrap();
    let response = chain.on_response(response).unwrap();
    assert!(response.has_attachment("server-errors"));
    assert!(!response.has_attachment("json"));
}

#[test]
fn test_invalid_filter_in_config_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{"addons": [{{"name": "typo", "req_filter": "(has-headr \"X\")"}}]}}"#
    )
    .unwrap();

    let config = ScriptsConfig::load_from_file(file.path()).unwrap();
    let err = config.validate().unwrap_err();
    assert!(matches!(err, ScriptError::FilterParse { ref addon, .. } if addon == "typo"));
    assert!(err.to_string().contains("has-headr"));
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = ScriptsConfig::load_from_file(dir.path().join("missing.yaml"));
    assert!(matches!(result, Err(ScriptError::Io { .. })));
}
