//! Argument collectors
//!
//! The binder feeds each function's collector one argument at a time and then
//! calls [`ArgCollector::build`]. A handful of generic shapes cover the whole
//! registry: no arguments, one or two typed literals, a homogeneous vararg
//! list, and the statement-or-boolean shapes used by the logical operators.

use crate::ast::Literal;
use crate::error::{FilterError, Result};
use crate::functions::logic::Constant;
use crate::pattern::Pattern;
use crate::predicate::BoxedPredicate;
use crate::registry::FunctionSpec;

/// Stateful builder for one function call
pub(crate) trait ArgCollector {
    /// Registry entry being built
    fn spec(&self) -> &'static FunctionSpec;

    /// Accept a nested, already bound statement
    fn add_statement(&mut self, _statement: BoxedPredicate) -> Result<()> {
        Err(FilterError::invalid_arg(self.spec().name, "nested statement"))
    }

    /// Accept a literal argument
    fn add_literal(&mut self, literal: &Literal) -> Result<()> {
        Err(FilterError::invalid_arg(self.spec().name, &literal.text))
    }

    /// Finish the call
    fn build(self: Box<Self>) -> Result<BoxedPredicate>;
}

/// Literal types a parameter can be coerced to
pub(crate) trait FromLiteral: Sized {
    fn from_literal(literal: &Literal, function: &'static str) -> Result<Self>;
}

impl FromLiteral for String {
    fn from_literal(literal: &Literal, function: &'static str) -> Result<Self> {
        literal.must_get_string(function)
    }
}

impl FromLiteral for i64 {
    fn from_literal(literal: &Literal, function: &'static str) -> Result<Self> {
        literal.must_get_int(function)
    }
}

impl FromLiteral for Pattern {
    fn from_literal(literal: &Literal, function: &'static str) -> Result<Self> {
        literal.must_pattern(function)
    }
}

fn missing(spec: &'static FunctionSpec, position: usize) -> FilterError {
    FilterError::MissingArg {
        function: spec.name,
        arg: spec.params.get(position - 1).map_or("arg", |p| p.name),
        position,
    }
}

fn too_many(spec: &'static FunctionSpec) -> FilterError {
    FilterError::TooManyArgs {
        function: spec.name,
        expected: spec.params.len(),
    }
}

/// Function without parameters
pub(crate) struct NoArgs {
    spec: &'static FunctionSpec,
    build: fn() -> BoxedPredicate,
}

impl NoArgs {
    pub(crate) fn new(spec: &'static FunctionSpec, build: fn() -> BoxedPredicate) -> Self {
        Self { spec, build }
    }
}

impl ArgCollector for NoArgs {
    fn spec(&self) -> &'static FunctionSpec {
        self.spec
    }

    fn add_statement(&mut self, _statement: BoxedPredicate) -> Result<()> {
        Err(too_many(self.spec))
    }

    fn add_literal(&mut self, _literal: &Literal) -> Result<()> {
        Err(too_many(self.spec))
    }

    fn build(self: Box<Self>) -> Result<BoxedPredicate> {
        Ok((self.build)())
    }
}

/// Exactly one typed literal
pub(crate) struct Single<T> {
    spec: &'static FunctionSpec,
    value: Option<T>,
    build: fn(T) -> BoxedPredicate,
}

impl<T: FromLiteral> Single<T> {
    pub(crate) fn new(spec: &'static FunctionSpec, build: fn(T) -> BoxedPredicate) -> Self {
        Self {
            spec,
            value: None,
            build,
        }
    }
}

impl<T: FromLiteral> ArgCollector for Single<T> {
    fn spec(&self) -> &'static FunctionSpec {
        self.spec
    }

    fn add_literal(&mut self, literal: &Literal) -> Result<()> {
        if self.value.is_some() {
            return Err(too_many(self.spec));
        }
        self.value = Some(T::from_literal(literal, self.spec.name)?);
        Ok(())
    }

    fn build(self: Box<Self>) -> Result<BoxedPredicate> {
        let value = self.value.ok_or_else(|| missing(self.spec, 1))?;
        Ok((self.build)(value))
    }
}

/// Exactly two typed literals
pub(crate) struct Pair<A, B> {
    spec: &'static FunctionSpec,
    first: Option<A>,
    second: Option<B>,
    build: fn(A, B) -> BoxedPredicate,
}

impl<A: FromLiteral, B: FromLiteral> Pair<A, B> {
    pub(crate) fn new(spec: &'static FunctionSpec, build: fn(A, B) -> BoxedPredicate) -> Self {
        Self {
            spec,
            first: None,
            second: None,
            build,
        }
    }
}

impl<A: FromLiteral, B: FromLiteral> ArgCollector for Pair<A, B> {
    fn spec(&self) -> &'static FunctionSpec {
        self.spec
    }

    fn add_literal(&mut self, literal: &Literal) -> Result<()> {
        if self.first.is_none() {
            self.first = Some(A::from_literal(literal, self.spec.name)?);
        } else if self.second.is_none() {
            self.second = Some(B::from_literal(literal, self.spec.name)?);
        } else {
            return Err(too_many(self.spec));
        }
        Ok(())
    }

    fn build(self: Box<Self>) -> Result<BoxedPredicate> {
        let first = self.first.ok_or_else(|| missing(self.spec, 1))?;
        let second = self.second.ok_or_else(|| missing(self.spec, 2))?;
        Ok((self.build)(first, second))
    }
}

/// One or more literals of a single type
pub(crate) struct Vararg<T> {
    spec: &'static FunctionSpec,
    values: Vec<T>,
    build: fn(Vec<T>) -> BoxedPredicate,
}

impl<T: FromLiteral> Vararg<T> {
    pub(crate) fn new(spec: &'static FunctionSpec, build: fn(Vec<T>) -> BoxedPredicate) -> Self {
        Self {
            spec,
            values: Vec::new(),
            build,
        }
    }
}

impl<T: FromLiteral> ArgCollector for Vararg<T> {
    fn spec(&self) -> &'static FunctionSpec {
        self.spec
    }

    fn add_literal(&mut self, literal: &Literal) -> Result<()> {
        self.values.push(T::from_literal(literal, self.spec.name)?);
        Ok(())
    }

    fn build(self: Box<Self>) -> Result<BoxedPredicate> {
        if self.values.is_empty() {
            return Err(missing(self.spec, 1));
        }
        Ok((self.build)(self.values))
    }
}

fn statement_or_boolean(spec: &'static FunctionSpec, literal: &Literal) -> Result<BoxedPredicate> {
    literal
        .as_bool()
        .map(Constant::build)
        .ok_or_else(|| FilterError::invalid_arg(spec.name, &literal.text))
}

/// Zero or more statements or boolean literals
pub(crate) struct Statements {
    spec: &'static FunctionSpec,
    statements: Vec<BoxedPredicate>,
    build: fn(Vec<BoxedPredicate>) -> BoxedPredicate,
}

impl Statements {
    pub(crate) fn new(
        spec: &'static FunctionSpec,
        build: fn(Vec<BoxedPredicate>) -> BoxedPredicate,
    ) -> Self {
        Self {
            spec,
            statements: Vec::new(),
            build,
        }
    }
}

impl ArgCollector for Statements {
    fn spec(&self) -> &'static FunctionSpec {
        self.spec
    }

    fn add_statement(&mut self, statement: BoxedPredicate) -> Result<()> {
        self.statements.push(statement);
        Ok(())
    }

    fn add_literal(&mut self, literal: &Literal) -> Result<()> {
        let statement = statement_or_boolean(self.spec, literal)?;
        self.statements.push(statement);
        Ok(())
    }

    fn build(self: Box<Self>) -> Result<BoxedPredicate> {
        Ok((self.build)(self.statements))
    }
}

/// Exactly one statement or boolean literal
pub(crate) struct SingleStatement {
    spec: &'static FunctionSpec,
    statement: Option<BoxedPredicate>,
    build: fn(BoxedPredicate) -> BoxedPredicate,
}

impl SingleStatement {
    pub(crate) fn new(
        spec: &'static FunctionSpec,
        build: fn(BoxedPredicate) -> BoxedPredicate,
    ) -> Self {
        Self {
            spec,
            statement: None,
            build,
        }
    }

    fn set(&mut self, statement: BoxedPredicate) -> Result<()> {
        if self.statement.is_some() {
            return Err(too_many(self.spec));
        }
        self.statement = Some(statement);
        Ok(())
    }
}

impl ArgCollector for SingleStatement {
    fn spec(&self) -> &'static FunctionSpec {
        self.spec
    }

    fn add_statement(&mut self, statement: BoxedPredicate) -> Result<()> {
        self.set(statement)
    }

    fn add_literal(&mut self, literal: &Literal) -> Result<()> {
        let statement = statement_or_boolean(self.spec, literal)?;
        self.set(statement)
    }

    fn build(self: Box<Self>) -> Result<BoxedPredicate> {
        let statement = self.statement.ok_or_else(|| missing(self.spec, 1))?;
        Ok((self.build)(statement))
    }
}
