//! Filter - Equality predicates for collection queries.

use serde_json::{Map, Value};

/// A conjunction of `field == value` clauses. An empty filter matches everything.
///
/// Only equality is supported; ordering is applied by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    /// Match every document in the collection.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::all().and_eq(field, value)
    }

    pub fn and_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.clauses.push((field.to_string(), value.into()));
        self
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    /// The value required for `field`, if the filter constrains it.
    pub fn value_for(&self, field: &str) -> Option<&Value> {
        self.clauses
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn matches(&self, data: &Map<String, Value>) -> bool {
        self.clauses
            .iter()
            .all(|(field, expected)| data.get(field) == Some(expected))
    }
}
