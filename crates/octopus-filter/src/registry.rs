//! Static catalog of filter functions

use crate::collector::ArgCollector;
use crate::functions;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Declared type of a function parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArgType {
    /// Quoted or raw string
    String,
    /// String compiled to a regex
    #[serde(rename = "Regex")]
    Pattern,
    /// `true` / `false`
    Boolean,
    /// Decimal, hex or binary number
    Integer,
    /// Nested expression (or boolean literal)
    Expression,
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "String",
            Self::Pattern => "Regex",
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Expression => "Expression",
        };
        f.write_str(name)
    }
}

/// One declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// Parameter name, used in error messages and docs
    pub name: &'static str,
    /// Expected type
    pub ty: ArgType,
    /// Accepts one or more values
    pub is_vararg: bool,
}

impl ParamSpec {
    pub(crate) const fn new(name: &'static str, ty: ArgType) -> Self {
        Self {
            name,
            ty,
            is_vararg: false,
        }
    }

    pub(crate) const fn vararg(name: &'static str, ty: ArgType) -> Self {
        Self {
            name,
            ty,
            is_vararg: true,
        }
    }
}

/// Registry entry for one function
pub struct FunctionSpec {
    /// Name used in filter source
    pub name: &'static str,
    /// Ordered parameters
    pub params: &'static [ParamSpec],
    /// One-line description
    pub doc: &'static str,
    pub(crate) collector: fn(&'static FunctionSpec) -> Box<dyn ArgCollector>,
}

impl FunctionSpec {
    pub(crate) fn collector(&'static self) -> Box<dyn ArgCollector> {
        (self.collector)(self)
    }
}

impl fmt::Debug for FunctionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionSpec")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

/// Name-indexed function table, built once
#[derive(Debug)]
pub(crate) struct Registry {
    functions: Vec<FunctionSpec>,
    by_name: HashMap<&'static str, usize>,
}

impl Registry {
    fn new(functions: Vec<FunctionSpec>) -> Self {
        let by_name = functions
            .iter()
            .enumerate()
            .map(|(i, spec)| (spec.name, i))
            .collect();
        Self { functions, by_name }
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&FunctionSpec> {
        self.by_name.get(name).map(|&i| &self.functions[i])
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &FunctionSpec> {
        self.functions.iter()
    }
}

static REGISTRY: Lazy<Registry> = Lazy::new(|| Registry::new(functions::all()));

pub(crate) fn registry() -> &'static Registry {
    &REGISTRY
}

/// Look up a function by name
pub fn lookup(name: &str) -> Option<&'static FunctionSpec> {
    registry().lookup(name)
}

/// Documentation for one parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamDoc {
    /// Parameter name
    pub name: &'static str,
    /// Expected type
    #[serde(rename = "type")]
    pub ty: ArgType,
    /// Accepts one or more values
    pub is_vararg: bool,
}

/// Documentation for one function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDoc {
    /// Function name
    pub name: &'static str,
    /// Ordered parameters
    pub params: Vec<ParamDoc>,
    /// One-line description
    pub short_doc: Option<&'static str>,
}

impl FunctionDoc {
    /// Call signature, e.g. `(header-matches header: String pattern: Regex)`
    pub fn signature(&self) -> String {
        let mut sig = format!("({}", self.name);
        for param in &self.params {
            sig.push_str(&format!(" {}: {}", param.name, param.ty));
            if param.is_vararg {
                sig.push_str("...");
            }
        }
        sig.push(')');
        sig
    }
}

impl From<&FunctionSpec> for FunctionDoc {
    fn from(spec: &FunctionSpec) -> Self {
        Self {
            name: spec.name,
            params: spec
                .params
                .iter()
                .map(|p| ParamDoc {
                    name: p.name,
                    ty: p.ty,
                    is_vararg: p.is_vararg,
                })
                .collect(),
            short_doc: (!spec.doc.is_empty()).then_some(spec.doc),
        }
    }
}

/// Reference for every registered function, in registration order
pub fn list_functions() -> Vec<FunctionDoc> {
    registry().iter().map(FunctionDoc::from).collect()
}
