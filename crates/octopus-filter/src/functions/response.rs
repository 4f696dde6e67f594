//! Response-only functions

use super::FilterFunction;
use crate::collector::{ArgCollector, Pair, Vararg};
use crate::error::{FilterError, Result};
use crate::predicate::{BoxedPredicate, Predicate};
use crate::registry::{ArgType, FunctionSpec, ParamSpec};
use crate::subject::{Subject, SubjectKind};

fn status_code<F: FilterFunction>(subject: Subject<'_>) -> Result<i64> {
    match subject {
        Subject::Response(res) => Ok(i64::from(res.status_code())),
        Subject::Request(_) => Err(FilterError::InvalidTarget {
            function: F::NAME,
            target: SubjectKind::Request,
        }),
    }
}

#[derive(Debug)]
pub(crate) struct StatusCodeEq {
    codes: Vec<i64>,
}

impl StatusCodeEq {
    fn build(codes: Vec<i64>) -> BoxedPredicate {
        Box::new(Self { codes })
    }
}

impl FilterFunction for StatusCodeEq {
    const NAME: &'static str = "status-code-eq";
    const PARAMS: &'static [ParamSpec] = &[ParamSpec::vararg("status-code", ArgType::Integer)];
    const DOC: &'static str = "True if the response status is one of the given codes";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Vararg::new(spec, Self::build))
    }
}

impl Predicate for StatusCodeEq {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        let code = status_code::<Self>(subject)?;
        Ok(self.codes.contains(&code))
    }
}

#[derive(Debug)]
pub(crate) struct StatusCodeIn {
    lower: i64,
    upper: i64,
}

impl StatusCodeIn {
    fn build(lower: i64, upper: i64) -> BoxedPredicate {
        Box::new(Self { lower, upper })
    }
}

impl FilterFunction for StatusCodeIn {
    const NAME: &'static str = "status-code-in";
    const PARAMS: &'static [ParamSpec] = &[
        ParamSpec::new("lower-bound", ArgType::Integer),
        ParamSpec::new("upper-bound", ArgType::Integer),
    ];
    const DOC: &'static str = "True if the response status is within the inclusive range";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Pair::new(spec, Self::build))
    }
}

impl Predicate for StatusCodeIn {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        let code = status_code::<Self>(subject)?;
        Ok((self.lower..=self.upper).contains(&code))
    }
}
