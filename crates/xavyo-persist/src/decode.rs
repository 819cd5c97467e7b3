//! Decoding entries into objects.

use tracing::{debug, warn};
use xavyo_directory::Entry;

use crate::error::{BoxError, DecodeError, PersistError};
use crate::handler::CompiledHandler;

impl<T> CompiledHandler<T> {
    /// Create a new object and populate it from an entry.
    ///
    /// On failure the partially populated object is returned inside
    /// [`DecodeError::Incomplete`] with every collected reason.
    pub fn decode(&self, entry: &Entry) -> Result<T, DecodeError<T>> {
        let mut object = (self.constructor)().map_err(|e| {
            warn!(type_name = %self.type_name, error = %e, "Unable to create instance");
            DecodeError::Construction(PersistError::construction_with_source(
                self.type_name.clone(),
                e,
            ))
        })?;
        match self.decode_into(&mut object, entry) {
            Ok(()) => Ok(object),
            Err(error) => Err(DecodeError::Incomplete { object, error }),
        }
    }

    /// Populate an existing object from an entry.
    ///
    /// Every field and setter is attempted even after a failure. The
    /// post-decode hook runs only when all of them succeeded.
    pub fn decode_into(&self, object: &mut T, entry: &Entry) -> Result<(), PersistError> {
        self.store_identity(object, entry);

        let mut reasons = Vec::new();
        for field in self.fields.values() {
            if let Err(reason) = field.decode(object, entry) {
                reasons.push(reason);
            }
        }
        for setter in self.setters.values() {
            if let Err(reason) = setter.decode(object, entry) {
                reasons.push(reason);
            }
        }

        let mut source: Option<BoxError> = None;
        if reasons.is_empty() {
            if let Some((name, hook)) = &self.post_decode {
                if let Err(e) = hook(object) {
                    reasons.push(format!(
                        "post-decode hook '{name}' failed for entry '{}': {e}",
                        entry.dn()
                    ));
                    source = Some(e);
                }
            }
        }

        self.finish_decode(entry, reasons, source)
    }

    /// Populate only the lazily loaded fields from an entry retrieved with
    /// [`lazily_loaded_attributes`](Self::lazily_loaded_attributes).
    pub fn decode_lazily_loaded(&self, object: &mut T, entry: &Entry) -> Result<(), PersistError> {
        let reasons: Vec<String> = self
            .fields
            .values()
            .filter(|f| f.policy.lazily_load)
            .filter_map(|f| f.decode(object, entry).err())
            .collect();
        self.finish_decode(entry, reasons, None)
    }

    fn finish_decode(
        &self,
        entry: &Entry,
        reasons: Vec<String>,
        source: Option<BoxError>,
    ) -> Result<(), PersistError> {
        if reasons.is_empty() {
            debug!(type_name = %self.type_name, dn = %entry.dn(), "Decoded entry");
            return Ok(());
        }
        warn!(
            type_name = %self.type_name,
            dn = %entry.dn(),
            failures = reasons.len(),
            "Unable to decode entry"
        );
        Err(PersistError::Decode {
            type_name: self.type_name.clone(),
            reasons,
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptor, MemberPolicy, ObjectDescriptor, SetterDescriptor, TypeDescriptor};
    use xavyo_directory::{Attribute, ReadOnlyEntry};

    #[derive(Debug, Default)]
    struct Group {
        dn: Option<String>,
        entry: Option<ReadOnlyEntry>,
        cn: Option<String>,
        gid: Option<u32>,
        members: Option<Vec<String>>,
        photo: Option<Vec<u8>>,
        owner: Option<String>,
        finished: bool,
    }

    fn group_descriptor() -> TypeDescriptor<Group> {
        TypeDescriptor::new("Group", ObjectDescriptor::new("posixGroup"))
            .default_constructor()
            .dn_field("dn", |g: &Group| g.dn.clone(), |g: &mut Group, v| g.dn = Some(v))
            .entry_field(
                "entry",
                |g: &Group| g.entry.clone(),
                |g: &mut Group, e| g.entry = Some(e),
            )
            .field(
                FieldDescriptor::new("cn", |g: &Group| g.cn.clone(), |g: &mut Group, v| g.cn = v)
                    .with_policy(MemberPolicy::new().in_rdn().required()),
            )
            .field(
                FieldDescriptor::new("gid", |g: &Group| g.gid, |g: &mut Group, v| g.gid = v)
                    .with_policy(MemberPolicy::new().with_attribute("gidNumber")),
            )
            .field(
                FieldDescriptor::new(
                    "members",
                    |g: &Group| g.members.clone(),
                    |g: &mut Group, v| g.members = v,
                )
                .with_policy(MemberPolicy::new().with_attribute("memberUid")),
            )
            .field(
                FieldDescriptor::new(
                    "photo",
                    |g: &Group| g.photo.clone(),
                    |g: &mut Group, v| g.photo = v,
                )
                .with_policy(MemberPolicy::new().with_attribute("jpegPhoto").lazily_load()),
            )
            .setter(
                SetterDescriptor::new("owner", |g: &mut Group, v| g.owner = v)
                    .with_attribute("owner"),
            )
    }

    fn handler() -> CompiledHandler<Group> {
        CompiledHandler::compile(group_descriptor()).unwrap()
    }

    fn group_entry() -> Entry {
        Entry::new(
            "cn=admins,ou=Groups,dc=example,dc=com",
            vec![
                Attribute::from_strings("objectClass", ["posixGroup"]),
                Attribute::from_strings("cn", ["admins"]),
                Attribute::from_strings("gidNumber", ["500"]),
                Attribute::from_strings("memberUid", ["alice", "bob"]),
                Attribute::from_strings("owner", ["uid=alice,dc=example,dc=com"]),
            ],
        )
    }

    #[test]
    fn test_decode_populates_members_and_identity() {
        let group = handler().decode(&group_entry()).unwrap();
        assert_eq!(group.cn.as_deref(), Some("admins"));
        assert_eq!(group.gid, Some(500));
        assert_eq!(
            group.members,
            Some(vec!["alice".to_string(), "bob".to_string()])
        );
        assert_eq!(group.owner.as_deref(), Some("uid=alice,dc=example,dc=com"));
        assert_eq!(
            group.dn.as_deref(),
            Some("cn=admins,ou=Groups,dc=example,dc=com")
        );
        assert_eq!(group.entry.as_deref(), Some(&group_entry()));
        assert_eq!(group.photo, None);
    }

    #[test]
    fn test_decode_collects_every_failure() {
        let entry = Entry::new(
            "cn=broken,dc=example,dc=com",
            vec![
                Attribute::from_strings("gidNumber", ["not-a-number"]),
                Attribute::from_strings("owner", ["a", "b"]),
            ],
        );
        let err = handler().decode(&entry).unwrap_err();
        assert_eq!(err.reasons().len(), 3);
        assert!(err.reasons()[0].contains("required by field 'cn'"));
        assert!(err.reasons()[1].contains("into field 'gid'"));
        assert!(err.reasons()[2].contains("setter 'owner'"));

        let partial = err.into_partial_object().unwrap();
        assert_eq!(partial.dn.as_deref(), Some("cn=broken,dc=example,dc=com"));
        assert_eq!(partial.gid, None);
    }

    #[test]
    fn test_decode_into_clears_absent_members() {
        let handler = handler();
        let mut group = Group {
            gid: Some(1),
            ..Group::default()
        };
        let entry = Entry::new("cn=x,dc=example", vec![Attribute::from_strings("cn", ["x"])]);
        handler.decode_into(&mut group, &entry).unwrap();
        assert_eq!(group.gid, None);
        assert_eq!(group.cn.as_deref(), Some("x"));
    }

    #[test]
    fn test_post_decode_hook_runs_after_success() {
        let descriptor = TypeDescriptor {
            object: ObjectDescriptor::new("posixGroup").with_post_decode_hook("finish"),
            ..group_descriptor()
        }
        .post_decode_hook("finish", |g: &mut Group| {
            g.finished = true;
            Ok(())
        });
        let handler = CompiledHandler::compile(descriptor).unwrap();

        let group = handler.decode(&group_entry()).unwrap();
        assert!(group.finished);

        let err = handler
            .decode(&Entry::new("cn=x,dc=example", vec![]))
            .unwrap_err();
        assert!(!err.partial_object().unwrap().finished);
    }

    #[test]
    fn test_post_decode_hook_failure_is_recorded() {
        let descriptor = TypeDescriptor {
            object: ObjectDescriptor::new("posixGroup").with_post_decode_hook("check"),
            ..group_descriptor()
        }
        .post_decode_hook("check", |_g: &mut Group| Err("gid out of range".into()));
        let handler = CompiledHandler::compile(descriptor).unwrap();

        let err = handler.decode(&group_entry()).unwrap_err();
        assert_eq!(err.reasons().len(), 1);
        assert!(err.reasons()[0].contains("gid out of range"));
        match err.into_error() {
            PersistError::Decode { source, .. } => assert!(source.is_some()),
            other => panic!("Expected decode error, got {other}"),
        }
    }

    #[test]
    fn test_constructor_failure() {
        let descriptor = group_descriptor().constructor(|| Err("no instances today".into()));
        let handler = CompiledHandler::compile(descriptor).unwrap();
        match handler.decode(&group_entry()) {
            Err(DecodeError::Construction(e)) => {
                assert_eq!(e.error_code(), "CONSTRUCTION_FAILED");
                assert!(e.to_string().contains("no instances today"));
            }
            other => panic!("Expected construction error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_lazily_loaded() {
        let handler = handler();
        let mut group = handler.decode(&group_entry()).unwrap();
        assert_eq!(group.photo, None);

        let lazy = Entry::new(
            "cn=admins,ou=Groups,dc=example,dc=com",
            vec![Attribute::new("jpegPhoto", vec![vec![0xff, 0xd8]])],
        );
        handler.decode_lazily_loaded(&mut group, &lazy).unwrap();
        assert_eq!(group.photo, Some(vec![0xff, 0xd8]));
        assert_eq!(group.cn.as_deref(), Some("admins"));
    }
}
