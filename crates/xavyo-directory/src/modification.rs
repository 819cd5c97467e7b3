//! Attribute modifications for modify operations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of change a modification applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModificationType {
    /// Add values to the attribute.
    Add,
    /// Remove the given values, or the whole attribute when none are given.
    Delete,
    /// Replace all values. Replacing with no values removes the attribute.
    Replace,
    /// Increment an integer attribute by the given amount.
    Increment,
}

impl ModificationType {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ModificationType::Add => "add",
            ModificationType::Delete => "delete",
            ModificationType::Replace => "replace",
            ModificationType::Increment => "increment",
        }
    }
}

impl fmt::Display for ModificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single change to one attribute of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    /// The kind of change.
    pub modification_type: ModificationType,
    /// The attribute being changed.
    pub attribute: String,
    /// Raw values for the change (possibly empty).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Vec<u8>>,
}

impl Modification {
    /// Create a modification.
    pub fn new(
        modification_type: ModificationType,
        attribute: impl Into<String>,
        values: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            modification_type,
            attribute: attribute.into(),
            values,
        }
    }

    /// Replace all values of an attribute.
    pub fn replace(attribute: impl Into<String>, values: Vec<Vec<u8>>) -> Self {
        Self::new(ModificationType::Replace, attribute, values)
    }

    /// Remove an attribute entirely by replacing it with no values.
    pub fn replace_with_nothing(attribute: impl Into<String>) -> Self {
        Self::new(ModificationType::Replace, attribute, Vec::new())
    }

    /// Add values to an attribute.
    pub fn add(attribute: impl Into<String>, values: Vec<Vec<u8>>) -> Self {
        Self::new(ModificationType::Add, attribute, values)
    }

    /// Delete values (or the whole attribute when `values` is empty).
    pub fn delete(attribute: impl Into<String>, values: Vec<Vec<u8>>) -> Self {
        Self::new(ModificationType::Delete, attribute, values)
    }

    /// Check whether applying this modification removes the attribute.
    pub fn removes_attribute(&self) -> bool {
        self.values.is_empty()
            && matches!(
                self.modification_type,
                ModificationType::Replace | ModificationType::Delete
            )
    }

    /// Get the values as strings, replacing invalid UTF-8.
    pub fn string_values(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|v| String::from_utf8_lossy(v).into_owned())
            .collect()
    }
}
