//! Handler compiler.
//!
//! [`CompiledHandler::compile`] validates a [`TypeDescriptor`] once and
//! produces an immutable marshalling plan shared by decode, encode, diff,
//! filter and schema operations.

use std::collections::BTreeMap;

use tracing::{debug, warn};
use xavyo_directory::{
    validate_ldap_name, Attribute, Dn, Entry, ReadOnlyEntry, OBJECT_CLASS_ATTRIBUTE,
};

use crate::descriptor::{
    Constructor, DnField, EntryField, FieldDescriptor, FilterUsage, GetterDescriptor, Hook,
    MemberPolicy, ObjectDescriptor, PostDecodeHook, PostEncodeHook, SetterDescriptor,
    TypeDescriptor,
};
use crate::error::{PersistError, PersistResult};

/// Wildcards requesting all user and operational attributes.
pub const ALL_ATTRIBUTES: [&str; 2] = ["*", "+"];

/// Members grouped by filter usage and RDN membership, as sorted map keys.
#[derive(Debug, Default)]
pub(crate) struct MemberLists {
    pub(crate) required: Vec<String>,
    pub(crate) always_allowed: Vec<String>,
    pub(crate) conditionally_allowed: Vec<String>,
    pub(crate) rdn: Vec<String>,
}

impl MemberLists {
    fn add(&mut self, key: &str, policy: &MemberPolicy) {
        match policy.filter_usage {
            FilterUsage::Required => self.required.push(key.to_string()),
            FilterUsage::AlwaysAllowed => self.always_allowed.push(key.to_string()),
            FilterUsage::ConditionallyAllowed => {
                self.conditionally_allowed.push(key.to_string())
            }
            FilterUsage::Excluded => {}
        }
        if policy.in_rdn {
            self.rdn.push(key.to_string());
        }
    }
}

/// A validated, immutable marshalling plan for one type.
///
/// Every operation takes `&self`, so one handler can serve any number of
/// threads, each working on its own object.
pub struct CompiledHandler<T> {
    pub(crate) type_name: String,
    pub(crate) object: ObjectDescriptor,
    pub(crate) structural_class: String,
    pub(crate) object_class_attribute: Attribute,
    pub(crate) default_parent_dn: Dn,
    pub(crate) constructor: Constructor<T>,
    pub(crate) post_decode: Option<(String, PostDecodeHook<T>)>,
    pub(crate) post_encode: Option<(String, PostEncodeHook<T>)>,
    pub(crate) dn_field: Option<DnField<T>>,
    pub(crate) entry_field: Option<EntryField<T>>,
    pub(crate) fields: BTreeMap<String, FieldDescriptor<T>>,
    pub(crate) getters: BTreeMap<String, GetterDescriptor<T>>,
    pub(crate) setters: BTreeMap<String, SetterDescriptor<T>>,
    pub(crate) field_lists: MemberLists,
    pub(crate) getter_lists: MemberLists,
    attributes_to_request: Vec<String>,
    lazily_loaded_attributes: Vec<String>,
}

impl<T> CompiledHandler<T> {
    /// Validate a descriptor and build the handler.
    pub fn compile(descriptor: TypeDescriptor<T>) -> PersistResult<Self> {
        let type_name = descriptor.type_name.clone();
        Self::build(descriptor).inspect_err(|e| {
            warn!(type_name = %type_name, error = %e, "Invalid type descriptor");
        })
    }

    fn build(descriptor: TypeDescriptor<T>) -> PersistResult<Self> {
        let TypeDescriptor {
            type_name,
            object,
            constructor,
            fields: declared_fields,
            getters: declared_getters,
            setters: declared_setters,
            mut dn_fields,
            mut entry_fields,
            mut hooks,
        } = descriptor;
        let invalid = |message: String| PersistError::validation(type_name.clone(), message);

        let structural_class = match object.structural_class.as_deref() {
            Some(class) if !class.is_empty() => class.to_string(),
            _ => type_name
                .rsplit("::")
                .next()
                .unwrap_or(&type_name)
                .to_string(),
        };
        validate_ldap_name(&structural_class).map_err(|e| {
            invalid(format!(
                "invalid structural object class '{structural_class}': {e}"
            ))
        })?;
        for class in &object.auxiliary_classes {
            validate_ldap_name(class)
                .map_err(|e| invalid(format!("invalid auxiliary object class '{class}': {e}")))?;
        }
        let object_class_attribute = Attribute::from_strings(
            OBJECT_CLASS_ATTRIBUTE,
            std::iter::once(&structural_class).chain(object.auxiliary_classes.iter()),
        );

        let default_parent_dn = Dn::parse(&object.default_parent_dn).map_err(|e| {
            invalid(format!(
                "invalid default parent DN '{}': {e}",
                object.default_parent_dn
            ))
        })?;

        let mut take_hook = |name: &Option<String>,
                             arity: usize|
         -> PersistResult<Option<(String, Hook<T>)>> {
            let Some(name) = name else {
                return Ok(None);
            };
            // A decode hook and an encode hook may share a name.
            if let Some(position) = hooks
                .iter()
                .position(|(registered, hook)| registered == name && hook.arity() == arity)
            {
                return Ok(Some(hooks.swap_remove(position)));
            }
            match hooks.iter().find(|(registered, _)| registered == name) {
                Some((_, hook)) => Err(invalid(format!(
                    "hook '{name}' takes {} argument(s), expected {arity}",
                    hook.arity()
                ))),
                None => Err(invalid(format!("no hook named '{name}' is registered"))),
            }
        };
        let post_decode = match take_hook(&object.post_decode_hook, 0)? {
            Some((name, Hook::PostDecode(hook))) => Some((name, hook)),
            _ => None,
        };
        let post_encode = match take_hook(&object.post_encode_hook, 1)? {
            Some((name, Hook::PostEncode(hook))) => Some((name, hook)),
            _ => None,
        };

        let constructor = constructor.ok_or_else(|| {
            invalid("no constructor is available to create new instances".to_string())
        })?;

        let mut fields: BTreeMap<String, FieldDescriptor<T>> = BTreeMap::new();
        for mut field in declared_fields {
            validate_member(&field.policy, field.member(), field.attribute_name())
                .map_err(&invalid)?;
            if field.policy.lazily_load
                && (field.policy.in_rdn
                    || field.policy.required_for_decode
                    || field.policy.required_for_encode)
            {
                return Err(invalid(format!(
                    "lazily loaded field '{}' cannot be part of the RDN or required",
                    field.member()
                )));
            }
            if field.policy.object_classes.is_empty() {
                field.policy.object_classes.push(structural_class.clone());
            }
            let key = field.attribute_name().to_lowercase();
            if let Some(existing) = fields.get(&key) {
                return Err(invalid(format!(
                    "fields '{}' and '{}' both map to attribute '{}'",
                    existing.member(),
                    field.member(),
                    field.attribute_name()
                )));
            }
            fields.insert(key, field);
        }

        if dn_fields.len() > 1 {
            return Err(invalid(format!(
                "fields '{}' and '{}' are both marked as the DN field",
                dn_fields[0].member, dn_fields[1].member
            )));
        }
        if entry_fields.len() > 1 {
            return Err(invalid(format!(
                "fields '{}' and '{}' are both marked as the entry field",
                entry_fields[0].member, entry_fields[1].member
            )));
        }
        let dn_field = dn_fields.pop();
        let entry_field = entry_fields.pop();
        for (role, member) in [
            ("DN", dn_field.as_ref().map(|f| f.member.as_str())),
            ("entry", entry_field.as_ref().map(|f| f.member.as_str())),
        ] {
            if let Some(member) = member {
                if fields.values().any(|f| f.member() == member) {
                    return Err(invalid(format!(
                        "field '{member}' cannot be both a persisted field and the {role} field"
                    )));
                }
            }
        }
        if let (Some(dn), Some(entry)) = (&dn_field, &entry_field) {
            if dn.member == entry.member {
                return Err(invalid(format!(
                    "field '{}' cannot be both the DN field and the entry field",
                    dn.member
                )));
            }
        }

        let mut getters: BTreeMap<String, GetterDescriptor<T>> = BTreeMap::new();
        for mut getter in declared_getters {
            validate_member(&getter.policy, getter.member(), getter.attribute_name())
                .map_err(&invalid)?;
            if getter.policy.uses_field_only_options() {
                return Err(invalid(format!(
                    "getter '{}' uses options that only apply to fields",
                    getter.member()
                )));
            }
            if getter.policy.object_classes.is_empty() {
                getter.policy.object_classes.push(structural_class.clone());
            }
            let key = getter.attribute_name().to_lowercase();
            if let Some(field) = fields.get(&key) {
                return Err(invalid(format!(
                    "getter '{}' conflicts with field '{}' on attribute '{}'",
                    getter.member(),
                    field.member(),
                    getter.attribute_name()
                )));
            }
            if let Some(existing) = getters.get(&key) {
                return Err(invalid(format!(
                    "getters '{}' and '{}' both map to attribute '{}'",
                    existing.member(),
                    getter.member(),
                    getter.attribute_name()
                )));
            }
            getters.insert(key, getter);
        }

        let mut setters: BTreeMap<String, SetterDescriptor<T>> = BTreeMap::new();
        for setter in declared_setters {
            validate_ldap_name(setter.attribute_name()).map_err(|e| {
                invalid(format!(
                    "setter '{}' has an invalid attribute name: {e}",
                    setter.member()
                ))
            })?;
            let key = setter.attribute_name().to_lowercase();
            if let Some(field) = fields.get(&key) {
                return Err(invalid(format!(
                    "setter '{}' conflicts with field '{}' on attribute '{}'",
                    setter.member(),
                    field.member(),
                    setter.attribute_name()
                )));
            }
            if let Some(existing) = setters.get(&key) {
                return Err(invalid(format!(
                    "setters '{}' and '{}' both map to attribute '{}'",
                    existing.member(),
                    setter.member(),
                    setter.attribute_name()
                )));
            }
            setters.insert(key, setter);
        }

        let mut field_lists = MemberLists::default();
        for (key, field) in &fields {
            field_lists.add(key, &field.policy);
        }
        let mut getter_lists = MemberLists::default();
        for (key, getter) in &getters {
            getter_lists.add(key, &getter.policy);
        }
        if field_lists.rdn.is_empty() && getter_lists.rdn.is_empty() {
            return Err(invalid(
                "no RDN defined: at least one field or getter must be part of the RDN"
                    .to_string(),
            ));
        }

        let lazily_loaded_attributes: Vec<String> = fields
            .values()
            .filter(|f| f.policy.lazily_load)
            .map(|f| f.attribute_name().to_string())
            .collect();
        let attributes_to_request: Vec<String> = if object.request_all_attributes {
            ALL_ATTRIBUTES.iter().map(|a| a.to_string()).collect()
        } else {
            fields
                .values()
                .filter(|f| !f.policy.lazily_load)
                .map(|f| f.attribute_name().to_string())
                .chain(setters.values().map(|s| s.attribute_name().to_string()))
                .collect()
        };

        debug!(
            type_name = %type_name,
            structural_class = %structural_class,
            fields = fields.len(),
            getters = getters.len(),
            setters = setters.len(),
            "Compiled handler"
        );

        Ok(Self {
            type_name,
            object,
            structural_class,
            object_class_attribute,
            default_parent_dn,
            constructor,
            post_decode,
            post_encode,
            dn_field,
            entry_field,
            fields,
            getters,
            setters,
            field_lists,
            getter_lists,
            attributes_to_request,
            lazily_loaded_attributes,
        })
    }

    /// Name of the mapped type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The object-level descriptor the handler was compiled from.
    pub fn object_descriptor(&self) -> &ObjectDescriptor {
        &self.object
    }

    /// Structural object class.
    pub fn structural_class(&self) -> &str {
        &self.structural_class
    }

    /// Auxiliary object classes.
    pub fn auxiliary_classes(&self) -> &[String] {
        &self.object.auxiliary_classes
    }

    /// The `objectClass` attribute written to every encoded entry.
    pub fn object_class_attribute(&self) -> &Attribute {
        &self.object_class_attribute
    }

    /// Parent DN used when encoding without an explicit parent.
    pub fn default_parent_dn(&self) -> &Dn {
        &self.default_parent_dn
    }

    /// Attributes to request when searching for entries of this type.
    pub fn attributes_to_request(&self) -> &[String] {
        &self.attributes_to_request
    }

    /// Attributes left out of normal searches.
    pub fn lazily_loaded_attributes(&self) -> &[String] {
        &self.lazily_loaded_attributes
    }

    /// Fields keyed by lowercase attribute name.
    pub fn fields(&self) -> &BTreeMap<String, FieldDescriptor<T>> {
        &self.fields
    }

    /// Getters keyed by lowercase attribute name.
    pub fn getters(&self) -> &BTreeMap<String, GetterDescriptor<T>> {
        &self.getters
    }

    /// Setters keyed by lowercase attribute name.
    pub fn setters(&self) -> &BTreeMap<String, SetterDescriptor<T>> {
        &self.setters
    }

    /// Whether a member holds the entry DN.
    pub fn has_dn_field(&self) -> bool {
        self.dn_field.is_some()
    }

    /// Whether a member holds the source entry.
    pub fn has_entry_field(&self) -> bool {
        self.entry_field.is_some()
    }

    /// The DN previously stored on the object, from its DN field or else
    /// its entry field.
    pub fn entry_dn(&self, object: &T) -> Option<String> {
        if let Some(dn) = self.dn_field.as_ref().and_then(|f| (f.get)(object)) {
            return Some(dn);
        }
        self.entry(object).map(|entry| entry.dn().to_string())
    }

    /// The entry snapshot stored on the object, if any.
    pub fn entry(&self, object: &T) -> Option<ReadOnlyEntry> {
        self.entry_field.as_ref().and_then(|f| (f.get)(object))
    }

    pub(crate) fn store_identity(&self, object: &mut T, entry: &Entry) {
        if let Some(field) = &self.dn_field {
            (field.set)(object, entry.dn().to_string());
        }
        if let Some(field) = &self.entry_field {
            (field.set)(object, ReadOnlyEntry::new(entry.clone()));
        }
    }

    pub(crate) fn members<'a, M>(
        map: &'a BTreeMap<String, M>,
        keys: &'a [String],
    ) -> impl Iterator<Item = &'a M> + 'a {
        keys.iter().filter_map(move |key| map.get(key))
    }
}

impl<T> std::fmt::Debug for CompiledHandler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledHandler")
            .field("type_name", &self.type_name)
            .field("structural_class", &self.structural_class)
            .field("auxiliary_classes", &self.object.auxiliary_classes)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("getters", &self.getters.keys().collect::<Vec<_>>())
            .field("setters", &self.setters.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn validate_member(policy: &MemberPolicy, member: &str, attribute: &str) -> Result<(), String> {
    validate_ldap_name(attribute)
        .map_err(|e| format!("member '{member}' has an invalid attribute name: {e}"))?;
    for class in &policy.object_classes {
        validate_ldap_name(class).map_err(|e| {
            format!("member '{member}' names an invalid object class '{class}': {e}")
        })?;
    }
    Ok(())
}
