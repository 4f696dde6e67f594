//! Boolean combinators

use super::FilterFunction;
use crate::collector::{ArgCollector, SingleStatement, Statements};
use crate::error::Result;
use crate::predicate::{BoxedPredicate, Predicate};
use crate::registry::{ArgType, FunctionSpec, ParamSpec};
use crate::subject::Subject;

/// Boolean literal used as an argument to a combinator
#[derive(Debug)]
pub(crate) struct Constant(bool);

impl Constant {
    pub(crate) fn build(value: bool) -> BoxedPredicate {
        Box::new(Self(value))
    }
}

impl Predicate for Constant {
    fn matches(&self, _subject: Subject<'_>) -> Result<bool> {
        Ok(self.0)
    }
}

#[derive(Debug)]
pub(crate) struct And {
    statements: Vec<BoxedPredicate>,
}

impl And {
    fn build(statements: Vec<BoxedPredicate>) -> BoxedPredicate {
        Box::new(Self { statements })
    }
}

impl FilterFunction for And {
    const NAME: &'static str = "and";
    const PARAMS: &'static [ParamSpec] = &[ParamSpec::vararg(
        "expressions-or-boolean",
        ArgType::Expression,
    )];
    const DOC: &'static str = "True if every argument is true; stops at the first false one";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Statements::new(spec, Self::build))
    }
}

impl Predicate for And {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        for statement in &self.statements {
            if !statement.matches(subject)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[derive(Debug)]
pub(crate) struct Or {
    statements: Vec<BoxedPredicate>,
}

impl Or {
    fn build(statements: Vec<BoxedPredicate>) -> BoxedPredicate {
        Box::new(Self { statements })
    }
}

impl FilterFunction for Or {
    const NAME: &'static str = "or";
    const PARAMS: &'static [ParamSpec] = &[ParamSpec::vararg(
        "expressions-or-boolean",
        ArgType::Expression,
    )];
    const DOC: &'static str = "True if any argument is true; stops at the first true one";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(Statements::new(spec, Self::build))
    }
}

impl Predicate for Or {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        for statement in &self.statements {
            if statement.matches(subject)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[derive(Debug)]
pub(crate) struct Not {
    statement: BoxedPredicate,
}

impl Not {
    fn build(statement: BoxedPredicate) -> BoxedPredicate {
        Box::new(Self { statement })
    }
}

impl FilterFunction for Not {
    const NAME: &'static str = "not";
    const PARAMS: &'static [ParamSpec] =
        &[ParamSpec::new("expression-or-boolean", ArgType::Expression)];
    const DOC: &'static str = "Negates its argument";

    fn collector(spec: &'static FunctionSpec) -> Box<dyn ArgCollector> {
        Box::new(SingleStatement::new(spec, Self::build))
    }
}

impl Predicate for Not {
    fn matches(&self, subject: Subject<'_>) -> Result<bool> {
        Ok(!self.statement.matches(subject)?)
    }
}
