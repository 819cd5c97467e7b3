//! Shared fixtures for xavyo-persist integration tests.
//!
//! Provides a `Person` type mapped to `inetOrgPerson`-style entries and
//! helpers for building entries.

#![allow(dead_code)]

use std::sync::Once;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use xavyo_persist::prelude::*;

static INIT: Once = Once::new();

/// Initialize logging for tests (once).
pub fn init_test_logging() {
    INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

pub const PEOPLE_DN: &str = "ou=People,dc=example,dc=com";

/// A directory person.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub dn: Option<String>,
    pub entry: Option<ReadOnlyEntry>,
    pub uid: Option<String>,
    pub common_name: Option<String>,
    pub surname: Option<String>,
    pub employee_number: Option<String>,
    pub mail: Option<Vec<String>>,
    pub uid_number: Option<u32>,
    pub enabled: Option<bool>,
    pub last_login: Option<DateTime<Utc>>,
    pub external_id: Option<Uuid>,
    pub manager: Option<Dn>,
    pub photo: Option<Vec<u8>>,
    pub notes: Option<String>,
}

impl Persistent for Person {
    fn type_descriptor() -> TypeDescriptor<Self> {
        TypeDescriptor::new(
            "Person",
            ObjectDescriptor::new("person")
                .with_auxiliary_class("extensibleObject")
                .with_default_parent_dn(PEOPLE_DN),
        )
        .default_constructor()
        .dn_field("dn", |p: &Person| p.dn.clone(), |p: &mut Person, dn| p.dn = Some(dn))
        .entry_field(
            "entry",
            |p: &Person| p.entry.clone(),
            |p: &mut Person, entry| p.entry = Some(entry),
        )
        .field(
            FieldDescriptor::new("uid", |p: &Person| p.uid.clone(), |p: &mut Person, v| p.uid = v)
                .with_policy(
                    MemberPolicy::new()
                        .in_rdn()
                        .with_filter_usage(FilterUsage::Excluded),
                ),
        )
        .field(
            FieldDescriptor::new(
                "common_name",
                |p: &Person| p.common_name.clone(),
                |p: &mut Person, v| p.common_name = v,
            )
            .with_policy(MemberPolicy::new().with_attribute("cn")),
        )
        .field(
            FieldDescriptor::new(
                "surname",
                |p: &Person| p.surname.clone(),
                |p: &mut Person, v| p.surname = v,
            )
            .with_policy(MemberPolicy::new().with_attribute("sn")),
        )
        .field(
            FieldDescriptor::new(
                "employee_number",
                |p: &Person| p.employee_number.clone(),
                |p: &mut Person, v| p.employee_number = v,
            )
            .with_policy(
                MemberPolicy::new()
                    .with_attribute("employeeNumber")
                    .with_filter_usage(FilterUsage::Required),
            ),
        )
        .field(
            FieldDescriptor::new("mail", |p: &Person| p.mail.clone(), |p: &mut Person, v| {
                p.mail = v
            })
            .with_policy(MemberPolicy::new().with_filter_usage(FilterUsage::AlwaysAllowed)),
        )
        .field(
            FieldDescriptor::new(
                "uid_number",
                |p: &Person| p.uid_number,
                |p: &mut Person, v| p.uid_number = v,
            )
            .with_policy(MemberPolicy::new().with_attribute("uidNumber")),
        )
        .field(
            FieldDescriptor::new(
                "enabled",
                |p: &Person| p.enabled,
                |p: &mut Person, v| p.enabled = v,
            )
            .with_policy(
                MemberPolicy::new()
                    .with_attribute("accountEnabled")
                    .with_default_decode_value("TRUE"),
            ),
        )
        .field(
            FieldDescriptor::new(
                "last_login",
                |p: &Person| p.last_login,
                |p: &mut Person, v| p.last_login = v,
            )
            .with_policy(MemberPolicy::new().with_attribute("lastLoginTime").not_in_add()),
        )
        .field(
            FieldDescriptor::new(
                "external_id",
                |p: &Person| p.external_id,
                |p: &mut Person, v| p.external_id = v,
            )
            .with_policy(MemberPolicy::new().with_attribute("externalId")),
        )
        .field(
            FieldDescriptor::new(
                "manager",
                |p: &Person| p.manager.clone(),
                |p: &mut Person, v| p.manager = v,
            )
            .with_policy(MemberPolicy::new().with_filter_usage(FilterUsage::Excluded)),
        )
        .field(
            FieldDescriptor::new(
                "photo",
                |p: &Person| p.photo.clone(),
                |p: &mut Person, v| p.photo = v,
            )
            .with_policy(
                MemberPolicy::new()
                    .with_attribute("jpegPhoto")
                    .with_filter_usage(FilterUsage::Excluded)
                    .lazily_load(),
            ),
        )
        .getter(
            GetterDescriptor::new("display_name", |p: &Person| {
                match (&p.common_name, &p.surname) {
                    (Some(cn), Some(sn)) => Some(format!("{cn} ({sn})")),
                    _ => None,
                }
            })
            .with_policy(
                MemberPolicy::new()
                    .with_attribute("displayName")
                    .with_filter_usage(FilterUsage::Excluded),
            ),
        )
        .setter(
            SetterDescriptor::new("notes", |p: &mut Person, v| p.notes = v)
                .with_attribute("description"),
        )
    }
}

/// A populated person without a stored identity.
pub fn jdoe() -> Person {
    Person {
        uid: Some("jdoe".to_string()),
        common_name: Some("John Doe".to_string()),
        surname: Some("Doe".to_string()),
        employee_number: Some("12345".to_string()),
        mail: Some(vec![
            "jdoe@example.com".to_string(),
            "john.doe@example.com".to_string(),
        ]),
        uid_number: Some(1001),
        enabled: Some(true),
        external_id: Some(Uuid::parse_str("6f1c1e2a-8d5b-4c1e-9a7f-2b3c4d5e6f70").unwrap()),
        manager: Some(Dn::parse("uid=boss,ou=People,dc=example,dc=com").unwrap()),
        ..Person::default()
    }
}

/// Build an entry from string attributes.
pub fn entry(dn: &str, attributes: &[(&str, &[&str])]) -> Entry {
    Entry::new(
        dn,
        attributes
            .iter()
            .map(|(name, values)| Attribute::from_strings(*name, values.iter().copied())),
    )
}

/// Compile the `Person` handler.
pub fn person_handler() -> std::sync::Arc<CompiledHandler<Person>> {
    init_test_logging();
    HandlerCache::new()
        .get_or_compile::<Person>()
        .expect("Person descriptor must compile")
}
