//! Binds a parsed expression to the function registry
//!
//! Every check that does not depend on the subject happens here: unknown
//! names, arity, literal types, string escapes and pattern compilation.

use crate::ast::{Arg, Expression};
use crate::error::{FilterError, Result};
use crate::predicate::BoxedPredicate;
use crate::registry;

/// Resolve names, coerce arguments and build the predicate tree
pub fn bind(expression: &Expression) -> Result<BoxedPredicate> {
    let spec = registry::lookup(&expression.name)
        .ok_or_else(|| FilterError::UnknownFunction(expression.name.clone()))?;

    let mut collector = spec.collector();
    for arg in &expression.args {
        match arg {
            Arg::Statement(nested) => collector.add_statement(bind(nested)?)?,
            Arg::Literal(literal) => collector.add_literal(literal)?,
        }
    }
    collector.build()
}
