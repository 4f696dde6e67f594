//! Functions over headers, bodies and metadata shared by both messages

use super::{on_message, FilterFunction, MessageCheck};
use crate::collector::{ArgCollector, NoArgs, Pair, Single, Vararg};
use crate::error::Result;
use crate::pattern::Pattern;
use crate::predicate::{BoxedPredicate, Predicate};
use crate::registry::{ArgType, FunctionSpec, ParamSpec};
use crate::subject::{HttpMessage, ParameterType, Subject, ToolType};
use serde_json::Value;

#[derive(Debug)]
pub(crate) struct HeaderMatches {
    header: String,
    pattern: Pattern,
}

impl HeaderMatches {
    fn build(header: String, pattern: Pattern) -> BoxedPredicate {
        Box::new(Self { header, pattern })
    }
}

impl FilterFunction for HeaderMatches {
    const NAME: &'static str = "header-matches";
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("header", ArgType::String),
        ParamSpec::new("pattern", ArgType::Pattern),
    ];
    const DOC: &'static str = "True if the value of the named header matches the pattern";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Pair::new(spec, Self::build))
    }
}

impl MessageCheck for HeaderMatches {
    fn check<M: HttpMessage + ?Sized>(&self, message: &M) -> bool {
        message
            .header_value(&self.header)
            .map_or(false, |value| self.pattern.full_match(value))
    }
}

impl Predicate for HeaderMatches {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        on_message(self, subject)
    }
}

#[derive(Debug)]
pub(crate) struct HasHeader {
    headers: Vec<String>,
}

impl HasHeader {
    fn build(headers: Vec<String>) -> BoxedPredicate {
        Box::new(Self { headers })
    }
}

impl FilterFunction for HasHeader {
    const NAME: &'static str = "has-header";
    const PARAMS: &'static [ParamSpec] = &[ParamSpec::vararg("headers", ArgType::String)];
    const DOC: &'static str = "True if any of the named headers is present";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Vararg::new(spec, Self::build))
    }
}

impl MessageCheck for HasHeader {
    fn check<M: HttpMessage + ?Sized>(&self, message: &M) -> bool {
        self.headers.iter().any(|h| message.has_header(h))
    }
}

impl Predicate for HasHeader {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        on_message(self, subject)
    }
}

#[derive(Debug)]
pub(crate) struct HasCookie {
    cookies: Vec<String>,
}

impl HasCookie {
    fn build(cookies: Vec<String>) -> BoxedPredicate {
        Box::new(Self { cookies })
    }
}

impl FilterFunction for HasCookie {
    const NAME: &'static str = "has-cookie";
    const PARAMS: &'static [ParamSpec] = &[ParamSpec::vararg("cookie", ArgType::String)];
    const DOC: &'static str =
        "True if the request sends, or the response sets, any of the named cookies";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Vararg::new(spec, Self::build))
    }
}

impl Predicate for HasCookie {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        Ok(match subject {
            Subject::Request(req) => self
                .cookies
                .iter()
                .any(|c| req.has_parameter(c, ParameterType::Cookie)),
            Subject::Response(res) => self.cookies.iter().any(|c| res.has_cookie(c)),
        })
    }
}

/// Walk a dotted key path (`a.b.c`) through nested objects
fn has_dotted(object: &Value, path: &str) -> bool {
    let mut current = object;
    for key in path.split('.') {
        match current.as_object().and_then(|map| map.get(key)) {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}

#[derive(Debug)]
pub(crate) struct HasJsonKey {
    keys: Vec<String>,
}

impl HasJsonKey {
    fn build(keys: Vec<String>) -> BoxedPredicate {
        Box::new(Self { keys })
    }
}

impl FilterFunction for HasJsonKey {
    const NAME: &'static str = "has-json-key";
    const PARAMS: &'static [ParamSpec] = &[ParamSpec::vararg("json-keys", ArgType::String)];
    const DOC: &'static str =
        "True if the JSON object body has any of the dotted keys, e.g. \"user.id\"";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Vararg::new(spec, Self::build))
    }
}

impl MessageCheck for HasJsonKey {
    fn check<M: HttpMessage + ?Sized>(&self, message: &M) -> bool {
        match message.body_to_json() {
            Some(body @ Value::Object(_)) => self.keys.iter().any(|k| has_dotted(&body, k)),
            _ => false,
        }
    }
}

impl Predicate for HasJsonKey {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        on_message(self, subject)
    }
}

#[derive(Debug)]
pub(crate) struct BodyContains {
    pattern: Pattern,
}

impl BodyContains {
    fn build(pattern: Pattern) -> BoxedPredicate {
        Box::new(Self { pattern })
    }
}

impl FilterFunction for BodyContains {
    const NAME: &'static str = "body-contains";
    const PARAMS: &'static [ParamSpec] =
        &[ParamSpec::new("contains-pattern", ArgType::Pattern)];
    const DOC: &'static str = "True if the pattern is found anywhere in the body";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Single::new(spec, Self::build))
    }
}

impl MessageCheck for BodyContains {
    fn check<M: HttpMessage + ?Sized>(&self, message: &M) -> bool {
        self.pattern.find(&message.body_to_string())
    }
}

impl Predicate for BodyContains {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        on_message(self, subject)
    }
}

#[derive(Debug)]
pub(crate) struct BodyMatches {
    pattern: Pattern,
}

impl BodyMatches {
    fn build(pattern: Pattern) -> BoxedPredicate {
        Box::new(Self { pattern })
    }
}

impl FilterFunction for BodyMatches {
    const NAME: &'static str = "body-matches";
    const PARAMS: &'static [ParamSpec] = &[ParamSpec::new("match-pattern", ArgType::Pattern)];
    const DOC: &'static str = "True if the whole body matches the pattern";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Single::new(spec, Self::build))
    }
}

impl MessageCheck for BodyMatches {
    fn check<M: HttpMessage + ?Sized>(&self, message: &M) -> bool {
        self.pattern.full_match(&message.body_to_string())
    }
}

impl Predicate for BodyMatches {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        on_message(self, subject)
    }
}

#[derive(Debug)]
pub(crate) struct HasAttachment {
    keys: Vec<String>,
}

impl HasAttachment {
    fn build(keys: Vec<String>) -> BoxedPredicate {
        Box::new(Self { keys })
    }
}

impl FilterFunction for HasAttachment {
    const NAME: &'static str = "has-attachment";
    const PARAMS: &'static [ParamSpec] =
        &[ParamSpec::vararg("attachment-keys", ArgType::String)];
    const DOC: &'static str = "True if a script attached a value under any of the keys";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Vararg::new(spec, Self::build))
    }
}

impl MessageCheck for HasAttachment {
    fn check<M: HttpMessage + ?Sized>(&self, message: &M) -> bool {
        self.keys.iter().any(|k| message.has_attachment(k))
    }
}

impl Predicate for HasAttachment {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        on_message(self, subject)
    }
}

#[derive(Debug)]
pub(crate) struct FromProxy;

impl FromProxy {
    fn build() -> BoxedPredicate {
        Box::new(Self)
    }
}

impl FilterFunction for FromProxy {
    const NAME: &'static str = "from-proxy";
    const PARAMS: &'static [ParamSpec] = &[];
    const DOC: &'static str = "True if the message came from the proxy tool";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(NoArgs::new(spec, Self::build))
    }
}

impl MessageCheck for FromProxy {
    fn check<M: HttpMessage + ?Sized>(&self, message: &M) -> bool {
        message.tool_source() == ToolType::Proxy
    }
}

impl Predicate for FromProxy {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        on_message(self, subject)
    }
}

#[derive(Debug)]
pub(crate) struct ToolSourceEq {
    sources: Vec<String>,
}

impl ToolSourceEq {
    fn build(sources: Vec<String>) -> BoxedPredicate {
        let sources = sources.into_iter().map(|s| s.to_lowercase()).collect();
        Box::new(Self { sources })
    }
}

impl FilterFunction for ToolSourceEq {
    const NAME: &'static str = "tool-source-eq";
    const PARAMS: &'static [ParamSpec] = &[ParamSpec::vararg("tool-sources", ArgType::String)];
    const DOC: &'static str =
        "True if the tool that produced the message is one of the named tools (case-insensitive)";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Vararg::new(spec, Self::build))
    }
}

impl MessageCheck for ToolSourceEq {
    fn check<M: HttpMessage + ?Sized>(&self, message: &M) -> bool {
        let tool = message.tool_source().tool_name().to_lowercase();
        self.sources.iter().any(|s| *s == tool)
    }
}

impl Predicate for ToolSourceEq {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        on_message(self, subject)
    }
}
