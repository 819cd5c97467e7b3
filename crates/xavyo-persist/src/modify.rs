//! Modification differ.

use tracing::debug;
use xavyo_directory::{Attribute, Entry, Modification};

use crate::error::{PersistError, PersistResult};
use crate::handler::CompiledHandler;

impl<T> CompiledHandler<T> {
    /// Compute the modifications that bring the directory in line with the
    /// object.
    ///
    /// The entry stored in the object's entry field is the baseline: values
    /// equal to it are skipped. Without a baseline every member with a
    /// value is replaced. A member without a value yields a deletion only
    /// when `delete_null_values` is set and the attribute may exist.
    ///
    /// A non-empty `attributes` list restricts the result to those
    /// attribute names (case-insensitive).
    pub fn modifications(
        &self,
        object: &T,
        delete_null_values: bool,
        attributes: &[&str],
    ) -> PersistResult<Vec<Modification>> {
        let baseline = self.entry(object);
        let selected: Vec<String> = attributes.iter().map(|a| a.to_lowercase()).collect();
        let in_scope = |key: &str| selected.is_empty() || selected.iter().any(|s| s == key);

        let mut modifications = Vec::new();
        for (key, field) in &self.fields {
            if !field.policy.in_modify || !in_scope(key) {
                continue;
            }
            let values = field
                .encode(object)
                .map_err(|reason| PersistError::encode(self.type_name.clone(), reason))?;
            modifications.extend(diff_attribute(
                field.attribute_name(),
                values,
                baseline.as_deref(),
                delete_null_values,
            ));
        }
        for (key, getter) in &self.getters {
            if !getter.policy.in_modify || !in_scope(key) {
                continue;
            }
            let values = getter
                .encode(object)
                .map_err(|reason| PersistError::encode(self.type_name.clone(), reason))?;
            modifications.extend(diff_attribute(
                getter.attribute_name(),
                values,
                baseline.as_deref(),
                delete_null_values,
            ));
        }

        debug!(
            type_name = %self.type_name,
            has_baseline = baseline.is_some(),
            modifications = modifications.len(),
            "Computed modifications"
        );
        Ok(modifications)
    }
}

fn diff_attribute(
    name: &str,
    values: Option<Vec<Vec<u8>>>,
    baseline: Option<&Entry>,
    delete_null_values: bool,
) -> Option<Modification> {
    let previous = baseline.map(|entry| entry.get_attribute(name));
    match values {
        None => {
            let may_exist = match previous {
                None => true,
                Some(attribute) => attribute.is_some(),
            };
            (delete_null_values && may_exist).then(|| Modification::replace_with_nothing(name))
        }
        Some(values) => {
            let current = Attribute::new(name, values);
            if matches!(previous, Some(Some(attribute)) if *attribute == current) {
                return None;
            }
            Some(Modification::replace(name, current.into_values()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptor, GetterDescriptor, MemberPolicy, ObjectDescriptor, TypeDescriptor};
    use xavyo_directory::{ModificationType, ReadOnlyEntry};

    #[derive(Clone, Default)]
    struct Contact {
        entry: Option<ReadOnlyEntry>,
        cn: Option<String>,
        mail: Option<Vec<String>>,
        phone: Option<String>,
        created: Option<String>,
    }

    fn handler() -> CompiledHandler<Contact> {
        let descriptor = TypeDescriptor::new("Contact", ObjectDescriptor::new("person"))
            .default_constructor()
            .entry_field(
                "entry",
                |c: &Contact| c.entry.clone(),
                |c: &mut Contact, e| c.entry = Some(e),
            )
            .field(
                FieldDescriptor::new("cn", |c: &Contact| c.cn.clone(), |c: &mut Contact, v| {
                    c.cn = v
                })
                .with_policy(MemberPolicy::new().in_rdn()),
            )
            .field(FieldDescriptor::new(
                "mail",
                |c: &Contact| c.mail.clone(),
                |c: &mut Contact, v| c.mail = v,
            ))
            .field(
                FieldDescriptor::new(
                    "phone",
                    |c: &Contact| c.phone.clone(),
                    |c: &mut Contact, v| c.phone = v,
                )
                .with_policy(MemberPolicy::new().with_attribute("telephoneNumber")),
            )
            .field(
                FieldDescriptor::new(
                    "created",
                    |c: &Contact| c.created.clone(),
                    |c: &mut Contact, v| c.created = v,
                )
                .with_policy(MemberPolicy::new().with_attribute("createTimestamp").not_in_modify()),
            )
            .getter(GetterDescriptor::new("displayName", |c: &Contact| {
                c.cn.as_ref().map(|cn| cn.to_uppercase())
            }));
        CompiledHandler::compile(descriptor).unwrap()
    }

    fn baseline() -> Entry {
        Entry::new(
            "cn=ann,dc=example,dc=com",
            vec![
                Attribute::from_strings("objectClass", ["person"]),
                Attribute::from_strings("cn", ["ann"]),
                Attribute::from_strings("mail", ["ann@example.com", "a@example.com"]),
                Attribute::from_strings("telephoneNumber", ["555-0100"]),
                Attribute::from_strings("displayName", ["ANN"]),
            ],
        )
    }

    fn decoded() -> Contact {
        handler().decode(&baseline()).unwrap()
    }

    #[test]
    fn test_no_changes_yield_no_modifications() {
        let mods = handler().modifications(&decoded(), true, &[]).unwrap();
        assert!(mods.is_empty());
    }

    #[test]
    fn test_multi_valued_comparison_ignores_order() {
        let mut contact = decoded();
        contact.mail = Some(vec!["a@example.com".to_string(), "ann@example.com".to_string()]);
        assert!(handler().modifications(&contact, false, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_changed_value_is_replaced() {
        let mut contact = decoded();
        contact.phone = Some("555-0199".to_string());
        let mods = handler().modifications(&contact, false, &[]).unwrap();
        assert_eq!(
            mods,
            vec![Modification::replace(
                "telephoneNumber",
                vec![b"555-0199".to_vec()]
            )]
        );
    }

    #[test]
    fn test_null_value_deletion() {
        let mut contact = decoded();
        contact.phone = None;

        assert!(handler().modifications(&contact, false, &[]).unwrap().is_empty());

        let mods = handler().modifications(&contact, true, &[]).unwrap();
        assert_eq!(mods.len(), 1);
        assert_eq!(mods[0].attribute, "telephoneNumber");
        assert_eq!(mods[0].modification_type, ModificationType::Replace);
        assert!(mods[0].removes_attribute());
    }

    #[test]
    fn test_no_deletion_for_attribute_never_present() {
        let handler = handler();
        let mut entry = baseline();
        entry.remove_attribute("telephoneNumber");
        let mut contact = handler.decode(&entry).unwrap();
        contact.phone = None;
        assert!(handler.modifications(&contact, true, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_without_baseline_everything_is_replaced() {
        let contact = Contact {
            cn: Some("bob".to_string()),
            phone: None,
            created: Some("20240101000000Z".to_string()),
            ..Contact::default()
        };
        let mods = handler().modifications(&contact, true, &[]).unwrap();
        let summary: Vec<(&str, bool)> = mods
            .iter()
            .map(|m| (m.attribute.as_str(), m.removes_attribute()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("cn", false),
                ("mail", true),
                ("telephoneNumber", true),
                ("displayName", false),
            ]
        );
    }

    #[test]
    fn test_attribute_filter() {
        let mut contact = decoded();
        contact.cn = Some("anna".to_string());
        contact.phone = Some("555-0199".to_string());

        let mods = handler()
            .modifications(&contact, false, &["TelephoneNumber"])
            .unwrap();
        assert_eq!(mods.len(), 1);
        assert_eq!(mods[0].attribute, "telephoneNumber");

        let mods = handler().modifications(&contact, false, &[]).unwrap();
        let names: Vec<&str> = mods.iter().map(|m| m.attribute.as_str()).collect();
        assert_eq!(names, vec!["cn", "telephoneNumber", "displayName"]);
    }
}
