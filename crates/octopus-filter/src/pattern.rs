//! Compiled regex with full-match and find semantics

use regex::Regex;
use std::fmt;

/// A regex compiled once at bind time
///
/// Holds an unanchored program for [`find`](Pattern::find) and an anchored
/// copy for [`full_match`](Pattern::full_match).
#[derive(Clone)]
pub struct Pattern {
    find: Regex,
    full: Regex,
}

impl Pattern {
    /// Compile a pattern source
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        let find = Regex::new(source)?;
        // A trailing `#` comment in verbose mode swallows the closing group
        // unless a newline ends it first.
        let full = Regex::new(&anchored(source, ""))
            .or_else(|err| Regex::new(&anchored(source, "\n")).map_err(|_| err))?;
        Ok(Self { find, full })
    }

    /// True if the whole of `text` matches
    pub fn full_match(&self, text: &str) -> bool {
        self.full.is_match(text)
    }

    /// True if any part of `text` matches
    pub fn find(&self, text: &str) -> bool {
        self.find.is_match(text)
    }

    /// The pattern source as written
    pub fn as_str(&self) -> &str {
        self.find.as_str()
    }
}

fn anchored(source: &str, terminator: &str) -> String {
    format!(r"\A(?:{source}{terminator})\z")
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.as_str()).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
