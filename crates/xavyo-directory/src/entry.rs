//! Directory entries.
//!
//! An entry is a DN plus an ordered collection of attributes. Attribute
//! lookup is case-insensitive; insertion order is preserved.

use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::Arc;

use crate::attribute::Attribute;
use crate::dn::Dn;
use crate::error::DirectoryResult;

/// Name of the attribute holding an entry's object classes.
pub const OBJECT_CLASS_ATTRIBUTE: &str = "objectClass";

/// A directory entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entry {
    dn: String,
    attributes: Vec<Attribute>,
}

impl Entry {
    /// Create an entry. Attributes sharing a name are merged.
    pub fn new(dn: impl Into<String>, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        let mut entry = Self {
            dn: dn.into(),
            attributes: Vec::new(),
        };
        for attribute in attributes {
            entry.add_attribute(attribute);
        }
        entry
    }

    /// Get the DN as a string.
    pub fn dn(&self) -> &str {
        &self.dn
    }

    /// Parse the DN.
    pub fn parsed_dn(&self) -> DirectoryResult<Dn> {
        Dn::parse(&self.dn)
    }

    /// Replace the DN.
    pub fn set_dn(&mut self, dn: impl Into<String>) {
        self.dn = dn.into();
    }

    /// Get all attributes in insertion order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Get an attribute by name (case-insensitive).
    pub fn get_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.has_name(name))
    }

    /// Check whether the entry contains the named attribute.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Get the first value of an attribute as a string.
    pub fn attribute_value(&self, name: &str) -> Option<String> {
        self.get_attribute(name).and_then(Attribute::first_string)
    }

    /// Get all values of an attribute as strings.
    pub fn attribute_values(&self, name: &str) -> Vec<String> {
        self.get_attribute(name)
            .map(Attribute::string_values)
            .unwrap_or_default()
    }

    /// Add an attribute, merging values into an existing attribute of the
    /// same name.
    pub fn add_attribute(&mut self, attribute: Attribute) {
        match self
            .attributes
            .iter_mut()
            .find(|a| a.has_name(attribute.name()))
        {
            Some(existing) => existing.merge(attribute.into_values()),
            None => self.attributes.push(attribute),
        }
    }

    /// Set an attribute, replacing any existing attribute of the same name
    /// in place.
    pub fn set_attribute(&mut self, attribute: Attribute) {
        match self
            .attributes
            .iter_mut()
            .find(|a| a.has_name(attribute.name()))
        {
            Some(existing) => *existing = attribute,
            None => self.attributes.push(attribute),
        }
    }

    /// Remove an attribute, returning it if it was present.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        let index = self.attributes.iter().position(|a| a.has_name(name))?;
        Some(self.attributes.remove(index))
    }

    /// Get the object class values.
    pub fn object_classes(&self) -> Vec<String> {
        self.attribute_values(OBJECT_CLASS_ATTRIBUTE)
    }

    /// Check whether the entry has the given object class (case-insensitive).
    pub fn has_object_class(&self, object_class: &str) -> bool {
        self.object_classes()
            .iter()
            .any(|oc| oc.eq_ignore_ascii_case(object_class))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        let same_dn = match (self.parsed_dn(), other.parsed_dn()) {
            (Ok(a), Ok(b)) => a == b,
            _ => self.dn == other.dn,
        };

        same_dn
            && self.attributes.len() == other.attributes.len()
            && self
                .attributes
                .iter()
                .all(|a| other.get_attribute(a.name()) == Some(a))
    }
}

/// An immutable, cheaply clonable snapshot of an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOnlyEntry(Arc<Entry>);

impl ReadOnlyEntry {
    /// Take a snapshot of an entry.
    pub fn new(entry: Entry) -> Self {
        Self(Arc::new(entry))
    }

    /// Get a mutable copy of the snapshot.
    pub fn to_entry(&self) -> Entry {
        (*self.0).clone()
    }
}

impl Deref for ReadOnlyEntry {
    type Target = Entry;

    fn deref(&self) -> &Entry {
        &self.0
    }
}

impl From<Entry> for ReadOnlyEntry {
    fn from(entry: Entry) -> Self {
        Self::new(entry)
    }
}
