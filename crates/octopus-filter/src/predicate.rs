//! Executable form of a bound function call

use crate::error::Result;
use crate::subject::Subject;
use std::fmt;

/// A compiled function call
///
/// Arguments are captured already coerced (patterns compiled, strings
/// unescaped). Implementations hold no mutable state, so one tree can be
/// evaluated from many threads at once.
pub trait Predicate: fmt::Debug + Send + Sync {
    /// Evaluate against a subject
    fn matches(&self, subject: Subject<'_>) -> Result<bool>;
}

/// Owned, type-erased predicate
pub type BoxedPredicate = Box<dyn Predicate>;
