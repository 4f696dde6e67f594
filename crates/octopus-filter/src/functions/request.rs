//! Functions that inspect the request side
//!
//! On a response these read the initiating request, so the result is the same
//! whichever subject variant they are given.

use super::FilterFunction;
use crate::collector::{ArgCollector, NoArgs, Pair, Single, Vararg};
use crate::error::Result;
use crate::pattern::Pattern;
use crate::predicate::{BoxedPredicate, Predicate};
use crate::registry::{ArgType, FunctionSpec, ParamSpec};
use crate::subject::{ParameterType, ScriptRequest, Subject};
use percent_encoding::percent_decode_str;
use std::borrow::Cow;

#[derive(Debug)]
pub(crate) struct InScope;

impl InScope {
    fn build() -> BoxedPredicate {
        Box::new(Self)
    }
}

impl FilterFunction for InScope {
    const NAME: &'static str = "in-scope";
    const PARAMS: &'static [ParamSpec] = &[];
    const DOC: &'static str = "True if the request target is in scope";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(NoArgs::new(spec, Self::build))
    }
}

impl Predicate for InScope {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        Ok(subject.request().is_in_scope())
    }
}

#[derive(Debug)]
pub(crate) struct HostMatches {
    pattern: Pattern,
}

impl HostMatches {
    fn build(pattern: Pattern) -> BoxedPredicate {
        Box::new(Self { pattern })
    }
}

impl FilterFunction for HostMatches {
    const NAME: &'static str = "host-matches";
    const PARAMS: &'static [ParamSpec] = &[ParamSpec::new("host-pattern", ArgType::Pattern)];
    const DOC: &'static str = "True if the URL host matches the pattern";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Single::new(spec, Self::build))
    }
}

impl Predicate for HostMatches {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        let uri = subject.request().url().parse::<http::Uri>().ok();
        Ok(uri
            .as_ref()
            .and_then(http::Uri::host)
            .map_or(false, |host| self.pattern.full_match(host)))
    }
}

#[derive(Debug)]
pub(crate) struct PathMatches {
    pattern: Pattern,
}

impl PathMatches {
    fn build(pattern: Pattern) -> BoxedPredicate {
        Box::new(Self { pattern })
    }
}

impl FilterFunction for PathMatches {
    const NAME: &'static str = "path-matches";
    const PARAMS: &'static [ParamSpec] = &[ParamSpec::new("path-pattern", ArgType::Pattern)];
    const DOC: &'static str = "True if the path, without the query string, matches the pattern";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Single::new(spec, Self::build))
    }
}

impl Predicate for PathMatches {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        Ok(subject
            .request()
            .path_without_query()
            .map_or(false, |path| self.pattern.full_match(path)))
    }
}

#[derive(Debug)]
pub(crate) struct PathContains {
    pattern: Pattern,
}

impl PathContains {
    fn build(pattern: Pattern) -> BoxedPredicate {
        Box::new(Self { pattern })
    }
}

impl FilterFunction for PathContains {
    const NAME: &'static str = "path-contains";
    const PARAMS: &'static [ParamSpec] = &[ParamSpec::new("path", ArgType::Pattern)];
    const DOC: &'static str = "True if the pattern is found anywhere in the path";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Single::new(spec, Self::build))
    }
}

impl Predicate for PathContains {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        Ok(subject
            .request()
            .path_without_query()
            .map_or(false, |path| self.pattern.find(path)))
    }
}

#[derive(Debug)]
pub(crate) struct FileExtEq {
    extensions: Vec<String>,
}

impl FileExtEq {
    fn build(extensions: Vec<String>) -> BoxedPredicate {
        let extensions = extensions
            .into_iter()
            .map(|ext| {
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
        Box::new(Self { extensions })
    }
}

impl FilterFunction for FileExtEq {
    const NAME: &'static str = "file-ext-eq";
    const PARAMS: &'static [ParamSpec] =
        &[ParamSpec::vararg("file-extensions", ArgType::String)];
    const DOC: &'static str = "True if the last path segment ends with one of the extensions";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Vararg::new(spec, Self::build))
    }
}

impl Predicate for FileExtEq {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        let file = subject
            .request()
            .path_without_query()
            .and_then(|path| path.rsplit('/').next());
        Ok(file.map_or(false, |file| {
            self.extensions.iter().any(|ext| file.ends_with(ext.as_str()))
        }))
    }
}

#[derive(Debug)]
pub(crate) struct MethodEq {
    methods: Vec<String>,
}

impl MethodEq {
    fn build(methods: Vec<String>) -> BoxedPredicate {
        Box::new(Self { methods })
    }
}

impl FilterFunction for MethodEq {
    const NAME: &'static str = "method-eq";
    const PARAMS: &'static [ParamSpec] = &[ParamSpec::vararg("http-methods", ArgType::String)];
    const DOC: &'static str = "True if the request method is one of the given methods";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Vararg::new(spec, Self::build))
    }
}

impl Predicate for MethodEq {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        let method = subject.request().method();
        Ok(self.methods.iter().any(|m| m == method))
    }
}

#[derive(Debug)]
pub(crate) struct ListenerPortEq {
    ports: Vec<i64>,
}

impl ListenerPortEq {
    fn build(ports: Vec<i64>) -> BoxedPredicate {
        Box::new(Self { ports })
    }
}

impl FilterFunction for ListenerPortEq {
    const NAME: &'static str = "listener-port-eq";
    const PARAMS: &'static [ParamSpec] = &[ParamSpec::vararg("port", ArgType::Integer)];
    const DOC: &'static str = "True if the service port is one of the given ports";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Vararg::new(spec, Self::build))
    }
}

impl Predicate for ListenerPortEq {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        let port = i64::from(subject.request().http_service().port);
        Ok(self.ports.contains(&port))
    }
}

fn has_any_parameter(req: &dyn ScriptRequest, names: &[String], kind: ParameterType) -> bool {
    names.iter().any(|name| req.has_parameter(name, kind))
}

#[derive(Debug)]
pub(crate) struct HasQueryParam {
    names: Vec<String>,
}

impl HasQueryParam {
    fn build(names: Vec<String>) -> BoxedPredicate {
        Box::new(Self { names })
    }
}

impl FilterFunction for HasQueryParam {
    const NAME: &'static str = "has-query-param";
    const PARAMS: &'static [ParamSpec] = &[ParamSpec::vararg("query-params", ArgType::String)];
    const DOC: &'static str = "True if any of the named query parameters is present";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Vararg::new(spec, Self::build))
    }
}

impl Predicate for HasQueryParam {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        Ok(has_any_parameter(
            subject.request(),
            &self.names,
            ParameterType::Url,
        ))
    }
}

#[derive(Debug)]
pub(crate) struct HasFormParam {
    names: Vec<String>,
}

impl HasFormParam {
    fn build(names: Vec<String>) -> BoxedPredicate {
        Box::new(Self { names })
    }
}

impl FilterFunction for HasFormParam {
    const NAME: &'static str = "has-form-param";
    const PARAMS: &'static [ParamSpec] = &[ParamSpec::vararg("form-param", ArgType::String)];
    const DOC: &'static str = "True if any of the named form body parameters is present";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Vararg::new(spec, Self::build))
    }
}

impl Predicate for HasFormParam {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        Ok(has_any_parameter(
            subject.request(),
            &self.names,
            ParameterType::Body,
        ))
    }
}

/// Decode a query-string value: `+` is a space, then percent escapes
pub(crate) fn url_decode(value: &str) -> Cow<'_, str> {
    if value.contains('+') {
        let spaced = value.replace('+', " ");
        Cow::Owned(percent_decode_str(&spaced).decode_utf8_lossy().into_owned())
    } else {
        percent_decode_str(value).decode_utf8_lossy()
    }
}

#[derive(Debug)]
pub(crate) struct QueryParamMatches {
    name: String,
    pattern: Pattern,
}

impl QueryParamMatches {
    fn build(name: String, pattern: Pattern) -> BoxedPredicate {
        Box::new(Self { name, pattern })
    }
}

impl FilterFunction for QueryParamMatches {
    const NAME: &'static str = "query-param-matches";
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("param-name", ArgType::String),
        ParamSpec::new("value-pattern", ArgType::Pattern),
    ];
    const DOC: &'static str = "True if the URL-decoded value of the query parameter matches the pattern";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Pair::new(spec, Self::build))
    }
}

impl Predicate for QueryParamMatches {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        let param = subject
            .request()
            .parameters()
            .iter()
            .find(|p| p.kind == ParameterType::Url && p.name == self.name);
        Ok(param.map_or(false, |p| self.pattern.full_match(&url_decode(&p.value))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_decode() {
        assert_eq!(url_decode("such+value%3dasdf"), "such value=asdf");
        assert_eq!(url_decode("plain"), "plain");
        assert_eq!(url_decode("%E2%9C%93"), "\u{2713}");
    }
}
