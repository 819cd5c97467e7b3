//! Descriptor model.
//!
//! A [`TypeDescriptor`] declares how one Rust type maps to directory
//! entries: the object-level policy ([`ObjectDescriptor`]), the persisted
//! fields, derived getters, setters and hooks. Policies are plain data that
//! can be loaded from configuration; accessors are bound in code.

use serde::{Deserialize, Serialize};

use xavyo_directory::{Entry, ReadOnlyEntry};

use crate::codec::{AttributeCodec, FnReader, FnWriter, ValueReader, ValueWriter};
use crate::error::BoxError;

/// How a member contributes to a search filter built from an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterUsage {
    /// Never included.
    Excluded,
    /// Included when it has a value, and counts as a filter criterion.
    AlwaysAllowed,
    /// Included when it has a value, but only alongside other criteria.
    #[default]
    ConditionallyAllowed,
    /// Must have a value; building the filter fails otherwise.
    Required,
}

impl FilterUsage {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterUsage::Excluded => "excluded",
            FilterUsage::AlwaysAllowed => "always_allowed",
            FilterUsage::ConditionallyAllowed => "conditionally_allowed",
            FilterUsage::Required => "required",
        }
    }
}

/// Object-level mapping policy for a type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    /// Structural object class. Defaults to the unqualified type name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structural_class: Option<String>,

    /// Auxiliary object classes, in the order they are written.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auxiliary_classes: Vec<String>,

    /// Parent DN used when encoding without an explicit parent. Empty means
    /// the root DSE.
    #[serde(default)]
    pub default_parent_dn: String,

    /// Name of the hook run after a successful decode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_decode_hook: Option<String>,

    /// Name of the hook run after an entry is encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_encode_hook: Option<String>,

    /// Request every user and operational attribute on search.
    #[serde(default)]
    pub request_all_attributes: bool,
}

impl ObjectDescriptor {
    /// Create a descriptor with the given structural class.
    pub fn new(structural_class: impl Into<String>) -> Self {
        Self {
            structural_class: Some(structural_class.into()),
            ..Self::default()
        }
    }

    /// Add an auxiliary class.
    #[must_use]
    pub fn with_auxiliary_class(mut self, class: impl Into<String>) -> Self {
        self.auxiliary_classes.push(class.into());
        self
    }

    /// Set the default parent DN.
    #[must_use]
    pub fn with_default_parent_dn(mut self, dn: impl Into<String>) -> Self {
        self.default_parent_dn = dn.into();
        self
    }

    /// Name the post-decode hook.
    #[must_use]
    pub fn with_post_decode_hook(mut self, name: impl Into<String>) -> Self {
        self.post_decode_hook = Some(name.into());
        self
    }

    /// Name the post-encode hook.
    #[must_use]
    pub fn with_post_encode_hook(mut self, name: impl Into<String>) -> Self {
        self.post_encode_hook = Some(name.into());
        self
    }

    /// Request all attributes on search.
    #[must_use]
    pub fn request_all_attributes(mut self) -> Self {
        self.request_all_attributes = true;
        self
    }
}

/// Per-member mapping policy shared by fields and getters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPolicy {
    /// Attribute name. Defaults to the member name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,

    /// Contribution to generated search filters.
    #[serde(default)]
    pub filter_usage: FilterUsage,

    /// Whether the member is part of the RDN.
    #[serde(default)]
    pub in_rdn: bool,

    /// Whether the member is written when adding an entry.
    #[serde(default = "default_true")]
    pub in_add: bool,

    /// Whether the member is considered when computing modifications.
    #[serde(default = "default_true")]
    pub in_modify: bool,

    /// Whether the attribute is left out of normal searches (fields only).
    #[serde(default)]
    pub lazily_load: bool,

    /// Whether decoding fails when the attribute is absent (fields only).
    #[serde(default)]
    pub required_for_decode: bool,

    /// Whether the attribute is mandatory in generated schema (fields only).
    #[serde(default)]
    pub required_for_encode: bool,

    /// Object classes the attribute belongs to. Empty means the structural
    /// class.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_classes: Vec<String>,

    /// Values used when the attribute is absent on decode (fields only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_decode_values: Vec<String>,

    /// Values used when the member is unset on encode (fields only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_encode_values: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Default for MemberPolicy {
    fn default() -> Self {
        Self {
            attribute: None,
            filter_usage: FilterUsage::default(),
            in_rdn: false,
            in_add: true,
            in_modify: true,
            lazily_load: false,
            required_for_decode: false,
            required_for_encode: false,
            object_classes: Vec::new(),
            default_decode_values: Vec::new(),
            default_encode_values: Vec::new(),
        }
    }
}

impl MemberPolicy {
    /// Create a policy with the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map to an explicit attribute name.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>) -> Self {
        self.attribute = Some(name.into());
        self
    }

    /// Set the filter usage.
    #[must_use]
    pub fn with_filter_usage(mut self, usage: FilterUsage) -> Self {
        self.filter_usage = usage;
        self
    }

    /// Include the member in the RDN.
    #[must_use]
    pub fn in_rdn(mut self) -> Self {
        self.in_rdn = true;
        self
    }

    /// Leave the member out of add requests.
    #[must_use]
    pub fn not_in_add(mut self) -> Self {
        self.in_add = false;
        self
    }

    /// Leave the member out of modifications.
    #[must_use]
    pub fn not_in_modify(mut self) -> Self {
        self.in_modify = false;
        self
    }

    /// Load the attribute only on request.
    #[must_use]
    pub fn lazily_load(mut self) -> Self {
        self.lazily_load = true;
        self
    }

    /// Fail decoding when the attribute is absent.
    #[must_use]
    pub fn required_for_decode(mut self) -> Self {
        self.required_for_decode = true;
        self
    }

    /// Mark the attribute as mandatory in generated schema.
    #[must_use]
    pub fn required_for_encode(mut self) -> Self {
        self.required_for_encode = true;
        self
    }

    /// Shorthand for required on both decode and encode.
    #[must_use]
    pub fn required(self) -> Self {
        self.required_for_decode().required_for_encode()
    }

    /// Add an owning object class.
    #[must_use]
    pub fn with_object_class(mut self, class: impl Into<String>) -> Self {
        self.object_classes.push(class.into());
        self
    }

    /// Add a value used when the attribute is absent on decode.
    #[must_use]
    pub fn with_default_decode_value(mut self, value: impl Into<String>) -> Self {
        self.default_decode_values.push(value.into());
        self
    }

    /// Add a value used when the member is unset on encode.
    #[must_use]
    pub fn with_default_encode_value(mut self, value: impl Into<String>) -> Self {
        self.default_encode_values.push(value.into());
        self
    }

    pub(crate) fn uses_field_only_options(&self) -> bool {
        self.lazily_load
            || self.required_for_decode
            || self.required_for_encode
            || !self.default_decode_values.is_empty()
            || !self.default_encode_values.is_empty()
    }
}

fn raw_values(values: &[String]) -> Vec<Vec<u8>> {
    values.iter().map(|v| v.as_bytes().to_vec()).collect()
}

/// A persisted data member: read on encode, written on decode.
pub struct FieldDescriptor<T> {
    member: String,
    pub(crate) policy: MemberPolicy,
    reader: Box<dyn ValueReader<T>>,
    writer: Box<dyn ValueWriter<T>>,
}

impl<T: 'static> FieldDescriptor<T> {
    /// Bind a field to its accessors with the default policy.
    pub fn new<V: AttributeCodec + 'static>(
        member: impl Into<String>,
        get: fn(&T) -> Option<V>,
        set: fn(&mut T, Option<V>),
    ) -> Self {
        Self {
            member: member.into(),
            policy: MemberPolicy::default(),
            reader: Box::new(FnReader::new(get)),
            writer: Box::new(FnWriter::new(set)),
        }
    }
}

impl<T> FieldDescriptor<T> {
    /// Replace the policy.
    #[must_use]
    pub fn with_policy(mut self, policy: MemberPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Member name, used in messages.
    pub fn member(&self) -> &str {
        &self.member
    }

    /// Attribute the field maps to.
    pub fn attribute_name(&self) -> &str {
        self.policy.attribute.as_deref().unwrap_or(&self.member)
    }

    /// The field's policy.
    pub fn policy(&self) -> &MemberPolicy {
        &self.policy
    }

    /// Encode the current value, falling back to the default encode values.
    pub(crate) fn encode(&self, object: &T) -> Result<Option<Vec<Vec<u8>>>, String> {
        let values = self.reader.read(object).map_err(|reason| {
            format!(
                "unable to encode field '{}' as attribute '{}': {reason}",
                self.member,
                self.attribute_name()
            )
        })?;
        if values.is_none() && !self.policy.default_encode_values.is_empty() {
            return Ok(Some(raw_values(&self.policy.default_encode_values)));
        }
        Ok(values)
    }

    /// Decode the field from an entry, applying its absence policy.
    ///
    /// An absent attribute clears the field unless the field is lazily
    /// loaded, has default decode values, or is required for decode.
    pub(crate) fn decode(&self, object: &mut T, entry: &Entry) -> Result<(), String> {
        let name = self.attribute_name();
        let present = entry.get_attribute(name).filter(|a| a.has_values());
        let result = match present {
            Some(attribute) => self.writer.write(object, Some(attribute.values())),
            // Not requested by normal searches, so absence says nothing.
            None if self.policy.lazily_load => Ok(()),
            None if !self.policy.default_decode_values.is_empty() => {
                let defaults = raw_values(&self.policy.default_decode_values);
                self.writer.write(object, Some(&defaults))
            }
            None if self.policy.required_for_decode => {
                return Err(format!(
                    "entry '{}' does not have a value for attribute '{name}' required by field '{}'",
                    entry.dn(),
                    self.member
                ));
            }
            None => self.writer.write(object, None),
        };
        result.map_err(|reason| {
            format!(
                "unable to decode attribute '{name}' of entry '{}' into field '{}': {reason}",
                entry.dn(),
                self.member
            )
        })
    }
}

/// A derived value written to entries but never read back.
pub struct GetterDescriptor<T> {
    member: String,
    pub(crate) policy: MemberPolicy,
    reader: Box<dyn ValueReader<T>>,
}

impl<T: 'static> GetterDescriptor<T> {
    /// Bind a getter with the default policy.
    pub fn new<V: AttributeCodec + 'static>(
        member: impl Into<String>,
        get: fn(&T) -> Option<V>,
    ) -> Self {
        Self {
            member: member.into(),
            policy: MemberPolicy::default(),
            reader: Box::new(FnReader::new(get)),
        }
    }
}

impl<T> GetterDescriptor<T> {
    /// Replace the policy.
    #[must_use]
    pub fn with_policy(mut self, policy: MemberPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Member name, used in messages.
    pub fn member(&self) -> &str {
        &self.member
    }

    /// Attribute the getter maps to.
    pub fn attribute_name(&self) -> &str {
        self.policy.attribute.as_deref().unwrap_or(&self.member)
    }

    /// The getter's policy.
    pub fn policy(&self) -> &MemberPolicy {
        &self.policy
    }

    pub(crate) fn encode(&self, object: &T) -> Result<Option<Vec<Vec<u8>>>, String> {
        self.reader.read(object).map_err(|reason| {
            format!(
                "unable to encode getter '{}' as attribute '{}': {reason}",
                self.member,
                self.attribute_name()
            )
        })
    }
}

/// A sink receiving an attribute on decode.
pub struct SetterDescriptor<T> {
    member: String,
    attribute: Option<String>,
    writer: Box<dyn ValueWriter<T>>,
}

impl<T: 'static> SetterDescriptor<T> {
    /// Bind a setter. It receives `None` when the attribute is absent.
    pub fn new<V: AttributeCodec + 'static>(
        member: impl Into<String>,
        set: fn(&mut T, Option<V>),
    ) -> Self {
        Self {
            member: member.into(),
            attribute: None,
            writer: Box::new(FnWriter::new(set)),
        }
    }
}

impl<T> SetterDescriptor<T> {
    /// Map to an explicit attribute name.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>) -> Self {
        self.attribute = Some(name.into());
        self
    }

    /// Member name, used in messages.
    pub fn member(&self) -> &str {
        &self.member
    }

    /// Attribute the setter reads.
    pub fn attribute_name(&self) -> &str {
        self.attribute.as_deref().unwrap_or(&self.member)
    }

    pub(crate) fn decode(&self, object: &mut T, entry: &Entry) -> Result<(), String> {
        let name = self.attribute_name();
        let values = entry
            .get_attribute(name)
            .filter(|a| a.has_values())
            .map(|a| a.values());
        self.writer.write(object, values).map_err(|reason| {
            format!(
                "unable to invoke setter '{}' with attribute '{name}' of entry '{}': {reason}",
                self.member,
                entry.dn()
            )
        })
    }
}

/// The member holding an object's DN.
pub struct DnField<T> {
    pub(crate) member: String,
    pub(crate) get: fn(&T) -> Option<String>,
    pub(crate) set: fn(&mut T, String),
}

/// The member holding a read-only snapshot of the source entry.
pub struct EntryField<T> {
    pub(crate) member: String,
    pub(crate) get: fn(&T) -> Option<ReadOnlyEntry>,
    pub(crate) set: fn(&mut T, ReadOnlyEntry),
}

/// Hook run after every member decoded successfully.
pub type PostDecodeHook<T> = fn(&mut T) -> Result<(), BoxError>;

/// Hook run on a freshly encoded entry before it is returned.
pub type PostEncodeHook<T> = fn(&mut T, &mut Entry) -> Result<(), BoxError>;

/// Creates an empty instance for decoding.
pub type Constructor<T> = fn() -> Result<T, BoxError>;

pub(crate) enum Hook<T> {
    PostDecode(PostDecodeHook<T>),
    PostEncode(PostEncodeHook<T>),
}

impl<T> Hook<T> {
    pub(crate) fn arity(&self) -> usize {
        match self {
            Hook::PostDecode(_) => 0,
            Hook::PostEncode(_) => 1,
        }
    }
}

/// The complete, uncompiled mapping declaration for a type.
///
/// Hooks are registered by name and resolved against the names the
/// [`ObjectDescriptor`] refers to when the handler is compiled.
pub struct TypeDescriptor<T> {
    pub(crate) type_name: String,
    pub(crate) object: ObjectDescriptor,
    pub(crate) constructor: Option<Constructor<T>>,
    pub(crate) fields: Vec<FieldDescriptor<T>>,
    pub(crate) getters: Vec<GetterDescriptor<T>>,
    pub(crate) setters: Vec<SetterDescriptor<T>>,
    pub(crate) dn_fields: Vec<DnField<T>>,
    pub(crate) entry_fields: Vec<EntryField<T>>,
    pub(crate) hooks: Vec<(String, Hook<T>)>,
}

impl<T> TypeDescriptor<T> {
    /// Start a descriptor for the named type.
    pub fn new(type_name: impl Into<String>, object: ObjectDescriptor) -> Self {
        Self {
            type_name: type_name.into(),
            object,
            constructor: None,
            fields: Vec::new(),
            getters: Vec::new(),
            setters: Vec::new(),
            dn_fields: Vec::new(),
            entry_fields: Vec::new(),
            hooks: Vec::new(),
        }
    }

    /// Name of the described type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Set how empty instances are created.
    #[must_use]
    pub fn constructor(mut self, constructor: Constructor<T>) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Add a persisted field.
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor<T>) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a getter.
    #[must_use]
    pub fn getter(mut self, getter: GetterDescriptor<T>) -> Self {
        self.getters.push(getter);
        self
    }

    /// Add a setter.
    #[must_use]
    pub fn setter(mut self, setter: SetterDescriptor<T>) -> Self {
        self.setters.push(setter);
        self
    }

    /// Declare the member holding the entry DN.
    #[must_use]
    pub fn dn_field(
        mut self,
        member: impl Into<String>,
        get: fn(&T) -> Option<String>,
        set: fn(&mut T, String),
    ) -> Self {
        self.dn_fields.push(DnField {
            member: member.into(),
            get,
            set,
        });
        self
    }

    /// Declare the member holding the source entry.
    #[must_use]
    pub fn entry_field(
        mut self,
        member: impl Into<String>,
        get: fn(&T) -> Option<ReadOnlyEntry>,
        set: fn(&mut T, ReadOnlyEntry),
    ) -> Self {
        self.entry_fields.push(EntryField {
            member: member.into(),
            get,
            set,
        });
        self
    }

    /// Register a post-decode hook under a name.
    #[must_use]
    pub fn post_decode_hook(mut self, name: impl Into<String>, hook: PostDecodeHook<T>) -> Self {
        self.hooks.push((name.into(), Hook::PostDecode(hook)));
        self
    }

    /// Register a post-encode hook under a name.
    #[must_use]
    pub fn post_encode_hook(mut self, name: impl Into<String>, hook: PostEncodeHook<T>) -> Self {
        self.hooks.push((name.into(), Hook::PostEncode(hook)));
        self
    }
}

fn default_instance<T: Default>() -> Result<T, BoxError> {
    Ok(T::default())
}

impl<T: Default> TypeDescriptor<T> {
    /// Create empty instances with `Default`.
    #[must_use]
    pub fn default_constructor(self) -> Self {
        self.constructor(default_instance::<T>)
    }
}

/// A type with a declared directory mapping.
pub trait Persistent: Sized + 'static {
    /// Declare the mapping. Called once per compile.
    fn type_descriptor() -> TypeDescriptor<Self>;
}
