//! Ordered, keyed SQL fragments.
//!
//! Logic implementations build a statement fragment by fragment; dialect
//! overrides then replace, insert or drop individual keyed fragments instead
//! of re-parsing the finished SQL string.

use crate::error::{ActionError, Result};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
enum Fragment {
    Text(String),
    Nested(StringClauses),
}

impl Fragment {
    fn render(&self) -> String {
        match self {
            Fragment::Text(text) => text.clone(),
            Fragment::Nested(clauses) => clauses.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Clause {
    key: Option<String>,
    fragment: Fragment,
}

/// Ordered list of optionally keyed fragments rendered with a separator.
///
/// Keys match exactly, case included. Appending a key that already exists
/// replaces the earlier fragment in place. Empty fragments are skipped when rendering,
/// and a sequence with nothing to render produces an empty string without
/// its start and end markers.
#[derive(Clone, Debug, PartialEq)]
pub struct StringClauses {
    start: String,
    separator: String,
    end: String,
    clauses: Vec<Clause>,
}

impl Default for StringClauses {
    fn default() -> Self {
        Self::new()
    }
}

impl StringClauses {
    /// Space separated, no delimiters.
    pub fn new() -> Self {
        Self::with_delimiters("", " ", "")
    }

    pub fn with_separator(separator: &str) -> Self {
        Self::with_delimiters("", separator, "")
    }

    pub fn with_delimiters(start: &str, separator: &str, end: &str) -> Self {
        StringClauses {
            start: start.to_string(),
            separator: separator.to_string(),
            end: end.to_string(),
            clauses: Vec::new(),
        }
    }

    /// Comma separated list wrapped in parentheses, e.g. a column list.
    pub fn parenthesized_list() -> Self {
        Self::with_delimiters("(", ", ", ")")
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.clauses.iter().position(|c| c.key.as_deref() == Some(key))
    }

    fn require(&self, key: &str) -> Result<usize> {
        self.position(key)
            .ok_or_else(|| ActionError::unexpected(format!("Unknown clause key '{}'", key)))
    }

    fn push_keyed(&mut self, key: &str, fragment: Fragment) -> &mut Self {
        match self.position(key) {
            Some(idx) => self.clauses[idx].fragment = fragment,
            None => self.clauses.push(Clause {
                key: Some(key.to_string()),
                fragment,
            }),
        }
        self
    }

    /// Structural fragment with no key.
    pub fn append(&mut self, text: impl Into<String>) -> &mut Self {
        self.clauses.push(Clause {
            key: None,
            fragment: Fragment::Text(text.into()),
        });
        self
    }

    pub fn append_keyed(&mut self, key: &str, text: impl Into<String>) -> &mut Self {
        self.push_keyed(key, Fragment::Text(text.into()))
    }

    pub fn append_clauses(&mut self, key: &str, clauses: StringClauses) -> &mut Self {
        self.push_keyed(key, Fragment::Nested(clauses))
    }

    pub fn prepend(&mut self, text: impl Into<String>) -> &mut Self {
        self.clauses.insert(
            0,
            Clause {
                key: None,
                fragment: Fragment::Text(text.into()),
            },
        );
        self
    }

    pub fn insert_before(
        &mut self,
        existing: &str,
        key: &str,
        text: impl Into<String>,
    ) -> Result<&mut Self> {
        self.insert_at(existing, key, Fragment::Text(text.into()), 0)
    }

    pub fn insert_after(
        &mut self,
        existing: &str,
        key: &str,
        text: impl Into<String>,
    ) -> Result<&mut Self> {
        self.insert_at(existing, key, Fragment::Text(text.into()), 1)
    }

    fn insert_at(
        &mut self,
        existing: &str,
        key: &str,
        fragment: Fragment,
        offset: usize,
    ) -> Result<&mut Self> {
        if self.position(key).is_some() {
            return Err(ActionError::unexpected(format!(
                "Clause key '{}' already exists",
                key
            )));
        }
        let idx = self.require(existing)?;
        self.clauses.insert(
            idx + offset,
            Clause {
                key: Some(key.to_string()),
                fragment,
            },
        );
        Ok(self)
    }

    /// Replace the text of an existing keyed fragment.
    pub fn replace(&mut self, key: &str, text: impl Into<String>) -> Result<&mut Self> {
        let idx = self.require(key)?;
        self.clauses[idx].fragment = Fragment::Text(text.into());
        Ok(self)
    }

    /// Remove a keyed fragment, returning its rendered text.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.position(key)?;
        Some(self.clauses.remove(idx).fragment.render())
    }

    /// Rendered text of a keyed fragment.
    pub fn get(&self, key: &str) -> Option<String> {
        self.position(key).map(|idx| self.clauses[idx].fragment.render())
    }

    pub fn get_subclause(&self, key: &str) -> Option<&StringClauses> {
        match &self.clauses[self.position(key)?].fragment {
            Fragment::Nested(clauses) => Some(clauses),
            Fragment::Text(_) => None,
        }
    }

    pub fn get_subclause_mut(&mut self, key: &str) -> Option<&mut StringClauses> {
        let idx = self.position(key)?;
        match &mut self.clauses[idx].fragment {
            Fragment::Nested(clauses) => Some(clauses),
            Fragment::Text(_) => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Keys in order.
    pub fn keys(&self) -> Vec<&str> {
        self.clauses.iter().filter_map(|c| c.key.as_deref()).collect()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// True when rendering would produce nothing.
    pub fn is_empty(&self) -> bool {
        self.clauses.iter().all(|c| c.fragment.render().is_empty())
    }
}

impl fmt::Display for StringClauses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .clauses
            .iter()
            .map(|c| c.fragment.render())
            .filter(|text| !text.is_empty())
            .collect();
        if rendered.is_empty() {
            return Ok(());
        }
        write!(
            f,
            "{}{}{}",
            self.start,
            rendered.join(&self.separator),
            self.end
        )
    }
}

impl Serialize for StringClauses {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
