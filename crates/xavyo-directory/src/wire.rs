//! Conversions to and from the `ldap3` wire types.
//!
//! None of these perform I/O; they only reshape data for the connection
//! layer.

use std::collections::HashSet;

use ldap3::{Mod, SearchEntry};
use tracing::trace;

use crate::attribute::Attribute;
use crate::entry::Entry;
use crate::modification::{Modification, ModificationType};

impl From<SearchEntry> for Entry {
    fn from(search_entry: SearchEntry) -> Self {
        let mut names: Vec<&String> = search_entry
            .attrs
            .keys()
            .chain(search_entry.bin_attrs.keys())
            .collect();
        names.sort();
        names.dedup();

        let mut attributes = Vec::with_capacity(names.len());
        for name in names {
            let mut values: Vec<Vec<u8>> = search_entry
                .attrs
                .get(name)
                .map(|v| v.iter().map(|s| s.as_bytes().to_vec()).collect())
                .unwrap_or_default();
            if let Some(binary) = search_entry.bin_attrs.get(name) {
                values.extend(binary.iter().cloned());
            }
            attributes.push(Attribute::new(name.clone(), values));
        }

        trace!(dn = %search_entry.dn, attributes = attributes.len(), "Converted search entry");

        Entry::new(search_entry.dn, attributes)
    }
}

impl Entry {
    /// Attribute list in the shape taken by `ldap3::Ldap::add`.
    ///
    /// Attributes without values are omitted.
    pub fn to_add_attributes(&self) -> Vec<(Vec<u8>, HashSet<Vec<u8>>)> {
        self.attributes()
            .iter()
            .filter(|a| a.has_values())
            .map(|a| {
                (
                    a.name().as_bytes().to_vec(),
                    a.values().iter().cloned().collect(),
                )
            })
            .collect()
    }
}

impl Modification {
    /// Convert to the `ldap3` modification type.
    ///
    /// An increment uses the first value as the amount (`"1"` when empty).
    pub fn to_ldap3(&self) -> Mod<Vec<u8>> {
        let name = self.attribute.as_bytes().to_vec();
        let values: HashSet<Vec<u8>> = self.values.iter().cloned().collect();
        match self.modification_type {
            ModificationType::Add => Mod::Add(name, values),
            ModificationType::Delete => Mod::Delete(name, values),
            ModificationType::Replace => Mod::Replace(name, values),
            ModificationType::Increment => Mod::Increment(
                name,
                self.values.first().cloned().unwrap_or_else(|| b"1".to_vec()),
            ),
        }
    }
}
