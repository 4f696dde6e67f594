//! Compiled filter expressions

use crate::compiler::bind;
use crate::error::{FilterError, Result};
use crate::parser::parse;
use crate::predicate::Predicate;
use crate::subject::{ScriptRequest, ScriptResponse, Subject};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error};

/// A parsed and bound filter
///
/// Construction does all validation, so a `FilterExpression` that exists can
/// only fail at evaluation time with [`FilterError::InvalidTarget`]. The
/// compiled tree is immutable and cheap to clone; share it freely across
/// threads.
#[derive(Clone)]
pub struct FilterExpression {
    source: String,
    root: Arc<dyn Predicate>,
}

impl FilterExpression {
    /// Lex, parse and bind `source`
    pub fn parse(source: &str) -> Result<Self> {
        let ast = parse(source).map_err(|cause| FilterError::InvalidExpression {
            expression: source.to_string(),
            cause,
        })?;
        let root = bind(&ast)?;
        debug!(filter = %source, "compiled filter expression");
        Ok(Self {
            source: source.to_string(),
            root: Arc::from(root),
        })
    }

    /// Source text as given to [`parse`](Self::parse)
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate, surfacing runtime errors
    pub fn evaluate(&self, subject: Subject<'_>) -> Result<bool> {
        self.root.matches(subject)
    }

    /// Evaluate, failing closed
    ///
    /// Any error, or a panic raised by the subject implementation, is logged
    /// and treated as "does not match".
    pub fn matches(&self, subject: Subject<'_>) -> bool {
        match catch_unwind(AssertUnwindSafe(|| self.evaluate(subject))) {
            Ok(Ok(matched)) => matched,
            Ok(Err(err)) => {
                error!(
                    filter = %self.source,
                    subject = %describe(subject),
                    error = %err,
                    "filter evaluation failed"
                );
                false
            }
            Err(payload) => {
                error!(
                    filter = %self.source,
                    subject = %describe(subject),
                    panic = %panic_message(payload.as_ref()),
                    "filter evaluation panicked"
                );
                false
            }
        }
    }

    /// Evaluate against a request, failing closed
    pub fn matches_request(&self, request: &dyn ScriptRequest) -> bool {
        self.matches(Subject::Request(request))
    }

    /// Evaluate against a response, failing closed
    pub fn matches_response(&self, response: &dyn ScriptResponse) -> bool {
        self.matches(Subject::Response(response))
    }
}

/// Debug form of the subject, or just its kind if the host panics while
/// formatting it
fn describe(subject: Subject<'_>) -> String {
    catch_unwind(AssertUnwindSafe(|| format!("{subject:?}")))
        .unwrap_or_else(|_| subject.kind().to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl fmt::Debug for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FilterExpression").field(&self.source).finish()
    }
}

impl FromStr for FilterExpression {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A filter that is only ever evaluated against requests
#[derive(Debug, Clone)]
pub struct RequestFilter(FilterExpression);

impl RequestFilter {
    /// Parse a request filter
    pub fn parse(source: &str) -> Result<Self> {
        FilterExpression::parse(source).map(Self)
    }

    /// Evaluate, failing closed
    pub fn matches(&self, request: &dyn ScriptRequest) -> bool {
        self.0.matches_request(request)
    }

    /// The underlying expression
    pub fn expression(&self) -> &FilterExpression {
        &self.0
    }
}

impl fmt::Display for RequestFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RequestFilter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A filter that is only ever evaluated against responses
#[derive(Debug, Clone)]
pub struct ResponseFilter(FilterExpression);

impl ResponseFilter {
    /// Parse a response filter
    pub fn parse(source: &str) -> Result<Self> {
        FilterExpression::parse(source).map(Self)
    }

    /// Evaluate, failing closed
    pub fn matches(&self, response: &dyn ScriptResponse) -> bool {
        self.0.matches_response(response)
    }

    /// The underlying expression
    pub fn expression(&self) -> &FilterExpression {
        &self.0
    }
}

impl fmt::Display for ResponseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ResponseFilter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::SubjectKind;
    use crate::testing::{TestRequest, TestResponse};

    #[test]
    fn test_invalid_expression() {
        let err = FilterExpression::parse("(has-header \"a\"").unwrap_err();
        match err {
            FilterError::InvalidExpression { expression, .. } => {
                assert_eq!(expression, "(has-header \"a\"");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(matches!(
            FilterExpression::parse(""),
            Err(FilterError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_display_is_source() {
        let source = "(and  (in-scope)\n (has-header \"X\"))";
        let filter: FilterExpression = source.parse().unwrap();
        assert_eq!(filter.to_string(), source);
        assert_eq!(filter.source(), source);
    }

    #[test]
    fn test_status_code_on_request() {
        let filter = FilterExpression::parse("(status-code-eq 200)").unwrap();
        let req = TestRequest::default();

        assert!(matches!(
            filter.evaluate(Subject::Request(&req)),
            Err(FilterError::InvalidTarget {
                function: "status-code-eq",
                target: SubjectKind::Request
            })
        ));
        assert!(!filter.matches_request(&req));

        let filter = FilterExpression::parse("(status-code-in 200 299)").unwrap();
        assert!(matches!(
            filter.evaluate(Subject::Request(&req)),
            Err(FilterError::InvalidTarget { function: "status-code-in", .. })
        ));
    }

    #[test]
    fn test_short_circuit_hides_invalid_target() {
        let req = TestRequest::default();
        let filter = FilterExpression::parse("(and false (status-code-eq 200))").unwrap();
        assert!(!filter.evaluate(Subject::Request(&req)).unwrap());

        let filter = FilterExpression::parse("(or true (status-code-eq 200))").unwrap();
        assert!(filter.evaluate(Subject::Request(&req)).unwrap());
    }

    #[test]
    fn test_panicking_subject_fails_closed() {
        let req = TestRequest {
            panic_on_method: true,
            ..TestRequest::default()
        };
        let filter = FilterExpression::parse("(method-eq \"GET\")").unwrap();
        assert!(!filter.matches_request(&req));
        assert_eq!(describe(Subject::Request(&req)), "Request");
    }

    #[test]
    fn test_describe_subject() {
        let req = TestRequest::default();
        let described = describe(Subject::Request(&req));
        assert!(described.contains("GET"));
        assert!(described.contains("https://example.com/api/users?id=1"));
    }

    #[test]
    fn test_unauthenticated_admin_access() {
        let filter = FilterExpression::parse(
            r#"(and (not (has-header "Authorization")) (path-contains r"/admin"))"#,
        )
        .unwrap();

        let anonymous = TestRequest {
            url: "https://example.com/admin/users".to_string(),
            path: "/admin/users".to_string(),
            ..TestRequest::default()
        };
        assert!(filter.matches_request(&anonymous));

        let mut authenticated = anonymous.clone();
        authenticated
            .headers
            .push(("Authorization".to_string(), "Bearer token".to_string()));
        assert!(!filter.matches_request(&authenticated));

        let elsewhere = TestRequest::default();
        assert!(!filter.matches_request(&elsewhere));
    }

    #[test]
    fn test_too_deep_is_invalid_expression() {
        let depth = crate::parser::MAX_DEPTH + 1;
        let source = format!("{}(in-scope){}", "(not ".repeat(depth - 1), ")".repeat(depth - 1));
        assert!(matches!(
            FilterExpression::parse(&source),
            Err(FilterError::InvalidExpression {
                cause: crate::error::SyntaxError::TooDeep { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_typed_filters() {
        let res = TestResponse::new(TestRequest::default(), 404);
        let filter = ResponseFilter::parse("(status-code-in 400 499)").unwrap();
        assert!(filter.matches(&res));
        assert_eq!(filter.to_string(), "(status-code-in 400 499)");

        let filter: RequestFilter = "(method-eq \"GET\")".parse().unwrap();
        assert!(filter.matches(&TestRequest::default()));
    }

    #[test]
    fn test_filter_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FilterExpression>();
        assert_send_sync::<RequestFilter>();
    }
}
