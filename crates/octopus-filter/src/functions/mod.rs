//! Built-in filter functions
//!
//! Each function is a predicate type that also describes itself to the
//! registry through [`FilterFunction`].

pub(crate) mod logic;
mod message;
mod request;
mod response;

use crate::collector::ArgCollector;
use crate::error::Result;
use crate::registry::{FunctionSpec, ParamSpec};
use crate::subject::{HttpMessage, Subject};

/// Registry metadata and argument shape of a function
pub(crate) trait FilterFunction {
    const NAME: &'static str;
    const PARAMS: &'static [ParamSpec];
    const DOC: &'static str;

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector>;
}

fn entry<F: FilterFunction>() -> FunctionSpec {
    FunctionSpec {
        name: F::NAME,
        params: F::PARAMS,
        doc: F::DOC,
        collector: F::collector,
    }
}

/// Every built-in function in display order
pub(crate) fn all() -> Vec<FunctionSpec> {
    vec![
        entry::<logic::And>(),
        entry::<logic::Or>(),
        entry::<logic::Not>(),
        entry::<request::HostMatches>(),
        entry::<request::FileExtEq>(),
        entry::<request::PathContains>(),
        entry::<request::PathMatches>(),
        entry::<request::InScope>(),
        entry::<message::HeaderMatches>(),
        entry::<message::HasHeader>(),
        entry::<message::HasJsonKey>(),
        entry::<message::HasCookie>(),
        entry::<request::HasFormParam>(),
        entry::<request::HasQueryParam>(),
        entry::<message::BodyMatches>(),
        entry::<message::BodyContains>(),
        entry::<request::QueryParamMatches>(),
        entry::<response::StatusCodeEq>(),
        entry::<response::StatusCodeIn>(),
        entry::<request::MethodEq>(),
        entry::<message::HasAttachment>(),
        entry::<request::ListenerPortEq>(),
        entry::<message::ToolSourceEq>(),
        entry::<message::FromProxy>(),
    ]
}

/// A check over the surface requests and responses share
pub(crate) trait MessageCheck {
    fn check<M: HttpMessage + ?Sized>(&self, message: &M) -> bool;
}

/// Run a [`MessageCheck`] against whichever message the subject holds
pub(crate) fn on_message<C: MessageCheck>(check: &C, subject: Subject<'_>) -> Result<bool> {
    Ok(match subject {
        Subject::Request(req) => check.check(req),
        Subject::Response(res) => check.check(res),
    })
}
