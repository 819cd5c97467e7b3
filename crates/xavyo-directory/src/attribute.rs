//! Directory attributes.
//!
//! An attribute is a name plus an ordered list of raw values. Names compare
//! case-insensitively; value comparison ignores order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A named, multi-valued directory attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute type name as supplied (case preserved).
    name: String,
    /// Raw values in insertion order.
    values: Vec<Vec<u8>>,
}

impl Attribute {
    /// Create an attribute from raw values.
    pub fn new(name: impl Into<String>, values: Vec<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Create an attribute with no values.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Create an attribute from string values.
    pub fn from_strings<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            values
                .into_iter()
                .map(|v| v.into().into_bytes())
                .collect(),
        )
    }

    /// Get the attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether this attribute has the given name (case-insensitive).
    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Get the raw values.
    pub fn values(&self) -> &[Vec<u8>] {
        &self.values
    }

    /// Consume the attribute, returning its raw values.
    pub fn into_values(self) -> Vec<Vec<u8>> {
        self.values
    }

    /// Get the values as strings, replacing invalid UTF-8 sequences.
    pub fn string_values(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|v| String::from_utf8_lossy(v).into_owned())
            .collect()
    }

    /// Get the first value as a string, if there is one.
    pub fn first_string(&self) -> Option<String> {
        self.values
            .first()
            .map(|v| String::from_utf8_lossy(v).into_owned())
    }

    /// Check whether the attribute has at least one value.
    pub fn has_values(&self) -> bool {
        !self.values.is_empty()
    }

    /// Check whether the attribute holds the given value.
    pub fn has_value(&self, value: &[u8]) -> bool {
        self.values.iter().any(|v| v.as_slice() == value)
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check whether the attribute has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Append values not already present.
    pub fn merge(&mut self, values: impl IntoIterator<Item = Vec<u8>>) {
        for value in values {
            if !self.has_value(&value) {
                self.values.push(value);
            }
        }
    }

    fn value_set(&self) -> BTreeSet<&[u8]> {
        self.values.iter().map(Vec::as_slice).collect()
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.has_name(&other.name) && self.value_set() == other.value_set()
    }
}

impl Eq for Attribute {}
