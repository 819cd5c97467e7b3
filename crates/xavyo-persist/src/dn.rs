//! DN resolution.

use xavyo_directory::{Attribute, Dn, Rdn};

use crate::error::{PersistError, PersistResult};
use crate::handler::CompiledHandler;

impl<T> CompiledHandler<T> {
    /// Compute the DN an object would be encoded with, from its RDN members
    /// alone.
    ///
    /// A DN already stored on the object is returned unchanged.
    pub fn construct_dn(&self, object: &T, parent_dn: Option<&str>) -> PersistResult<String> {
        if let Some(dn) = self.entry_dn(object) {
            return Ok(dn);
        }

        let mut attributes = Vec::new();
        for field in Self::members(&self.fields, &self.field_lists.rdn) {
            let values = field
                .encode(object)
                .map_err(|reason| PersistError::encode(self.type_name.clone(), reason))?;
            if let Some(values) = values {
                attributes.push(Attribute::new(field.attribute_name(), values));
            }
        }
        for getter in Self::members(&self.getters, &self.getter_lists.rdn) {
            let values = getter
                .encode(object)
                .map_err(|reason| PersistError::encode(self.type_name.clone(), reason))?;
            if let Some(values) = values {
                attributes.push(Attribute::new(getter.attribute_name(), values));
            }
        }
        self.resolve_dn(object, parent_dn, &attributes)
    }

    /// Resolve the DN for an object given its encoded attributes.
    ///
    /// RDN members contribute their first value in attribute-name order.
    /// An explicit parent, including `""` for the root, overrides the
    /// default parent DN.
    pub(crate) fn resolve_dn(
        &self,
        object: &T,
        parent_dn: Option<&str>,
        attributes: &[Attribute],
    ) -> PersistResult<String> {
        if let Some(dn) = self.entry_dn(object) {
            return Ok(dn);
        }

        let rdn_members = Self::members(&self.fields, &self.field_lists.rdn)
            .map(|f| (f.member(), f.attribute_name()))
            .chain(
                Self::members(&self.getters, &self.getter_lists.rdn)
                    .map(|g| (g.member(), g.attribute_name())),
            );
        let mut components = Vec::new();
        for (member, name) in rdn_members {
            let value = attributes
                .iter()
                .find(|a| a.has_name(name))
                .and_then(|a| a.values().first())
                .ok_or_else(|| {
                    PersistError::encode(
                        self.type_name.clone(),
                        format!(
                            "unable to construct the RDN because member '{member}' has no value for attribute '{name}'"
                        ),
                    )
                })?;
            components.push((name.to_string(), value.clone()));
        }
        let rdn = Rdn::new(components).map_err(|e| {
            PersistError::encode(self.type_name.clone(), format!("invalid RDN: {e}"))
        })?;

        let parent = match parent_dn {
            Some(parent) => Dn::parse(parent).map_err(|e| {
                PersistError::encode(
                    self.type_name.clone(),
                    format!("invalid parent DN '{parent}': {e}"),
                )
            })?,
            None => self.default_parent_dn.clone(),
        };

        Ok(Dn::from_rdn_and_parent(rdn, &parent).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptor, GetterDescriptor, MemberPolicy, ObjectDescriptor, TypeDescriptor};
    use xavyo_directory::{Entry, ReadOnlyEntry};

    #[derive(Default)]
    struct Printer {
        entry: Option<ReadOnlyEntry>,
        cn: Option<String>,
        location: Option<String>,
    }

    fn handler() -> CompiledHandler<Printer> {
        let descriptor = TypeDescriptor::new(
            "Printer",
            ObjectDescriptor::new("device").with_default_parent_dn("ou=Devices,dc=example,dc=com"),
        )
        .default_constructor()
        .entry_field(
            "entry",
            |p: &Printer| p.entry.clone(),
            |p: &mut Printer, e| p.entry = Some(e),
        )
        .field(
            FieldDescriptor::new("cn", |p: &Printer| p.cn.clone(), |p: &mut Printer, v| {
                p.cn = v
            })
            .with_policy(MemberPolicy::new().in_rdn()),
        )
        .getter(
            GetterDescriptor::new("location", |p: &Printer| p.location.clone())
                .with_policy(MemberPolicy::new().with_attribute("l").in_rdn()),
        );
        CompiledHandler::compile(descriptor).unwrap()
    }

    fn printer() -> Printer {
        Printer {
            cn: Some("lp1".to_string()),
            location: Some("Floor 2".to_string()),
            ..Printer::default()
        }
    }

    #[test]
    fn test_construct_dn_uses_default_parent() {
        let dn = handler().construct_dn(&printer(), None).unwrap();
        assert_eq!(dn, "cn=lp1+l=Floor 2,ou=Devices,dc=example,dc=com");
    }

    #[test]
    fn test_explicit_parent_overrides_default() {
        let handler = handler();
        assert_eq!(
            handler
                .construct_dn(&printer(), Some("ou=Lab,dc=example,dc=com"))
                .unwrap(),
            "cn=lp1+l=Floor 2,ou=Lab,dc=example,dc=com"
        );
        assert_eq!(
            handler.construct_dn(&printer(), Some("")).unwrap(),
            "cn=lp1+l=Floor 2"
        );
    }

    #[test]
    fn test_malformed_parent_is_an_encode_error() {
        let err = handler()
            .construct_dn(&printer(), Some("this is not a dn"))
            .unwrap_err();
        assert_eq!(err.error_code(), "ENCODE_FAILED");
        assert!(err.to_string().contains("invalid parent DN"));
    }

    #[test]
    fn test_missing_rdn_value_is_an_encode_error() {
        let printer = Printer {
            location: None,
            ..printer()
        };
        let err = handler().construct_dn(&printer, None).unwrap_err();
        assert!(err.to_string().contains("member 'location'"));
    }

    #[test]
    fn test_known_identity_wins() {
        let printer = Printer {
            entry: Some(Entry::new("cn=old,ou=Devices,dc=example,dc=com", vec![]).into()),
            ..printer()
        };
        assert_eq!(
            handler()
                .construct_dn(&printer, Some("ou=Elsewhere,dc=example,dc=com"))
                .unwrap(),
            "cn=old,ou=Devices,dc=example,dc=com"
        );
    }

    #[test]
    fn test_rdn_values_are_escaped() {
        let printer = Printer {
            cn: Some("lp1, west".to_string()),
            ..printer()
        };
        let dn = handler().construct_dn(&printer, Some("")).unwrap();
        assert_eq!(dn, "cn=lp1\\, west+l=Floor 2");
        assert_eq!(Dn::parse(&dn).unwrap().rdns().len(), 1);
    }
}
