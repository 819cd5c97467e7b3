//! Schema element definitions.
//!
//! Object class definitions and the OID allocation capability used when
//! deriving schema from mapped types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of object class (RFC 4512).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClassKind {
    /// Structural class - can be instantiated, one per entry.
    #[default]
    Structural,
    /// Auxiliary class - can be added to a structural class.
    Auxiliary,
    /// Abstract class - cannot be instantiated (e.g., "top").
    Abstract,
}

impl ObjectClassKind {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectClassKind::Structural => "structural",
            ObjectClassKind::Auxiliary => "auxiliary",
            ObjectClassKind::Abstract => "abstract",
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "structural" => Some(ObjectClassKind::Structural),
            "auxiliary" => Some(ObjectClassKind::Auxiliary),
            "abstract" => Some(ObjectClassKind::Abstract),
            _ => None,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            ObjectClassKind::Structural => "STRUCTURAL",
            ObjectClassKind::Auxiliary => "AUXILIARY",
            ObjectClassKind::Abstract => "ABSTRACT",
        }
    }
}

impl fmt::Display for ObjectClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An object class definition as published in a subschema entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectClassDefinition {
    /// Numeric (or descriptive) OID.
    pub oid: String,

    /// Names, first one primary.
    pub names: Vec<String>,

    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the class is obsolete.
    #[serde(default)]
    pub obsolete: bool,

    /// Superior classes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub superior_classes: Vec<String>,

    /// Class kind.
    #[serde(default)]
    pub kind: ObjectClassKind,

    /// Attributes entries of this class must contain.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_attributes: Vec<String>,

    /// Attributes entries of this class may contain.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_attributes: Vec<String>,
}

impl ObjectClassDefinition {
    /// Create a definition with a single name and no attributes.
    pub fn new(oid: impl Into<String>, name: impl Into<String>, kind: ObjectClassKind) -> Self {
        Self {
            oid: oid.into(),
            names: vec![name.into()],
            description: None,
            obsolete: false,
            superior_classes: Vec::new(),
            kind,
            required_attributes: Vec::new(),
            optional_attributes: Vec::new(),
        }
    }

    /// Set the superior classes.
    #[must_use]
    pub fn with_superior_classes(mut self, superior: Vec<String>) -> Self {
        self.superior_classes = superior;
        self
    }

    /// Set the required attributes.
    #[must_use]
    pub fn with_required_attributes(mut self, attributes: Vec<String>) -> Self {
        self.required_attributes = attributes;
        self
    }

    /// Set the optional attributes.
    #[must_use]
    pub fn with_optional_attributes(mut self, attributes: Vec<String>) -> Self {
        self.optional_attributes = attributes;
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Primary name of the class.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    /// Check whether the class requires the attribute (case-insensitive).
    #[must_use]
    pub fn requires(&self, attribute: &str) -> bool {
        self.required_attributes
            .iter()
            .any(|a| a.eq_ignore_ascii_case(attribute))
    }

    /// Check whether the class allows the attribute as optional (case-insensitive).
    #[must_use]
    pub fn allows(&self, attribute: &str) -> bool {
        self.optional_attributes
            .iter()
            .any(|a| a.eq_ignore_ascii_case(attribute))
    }
}

fn write_oids(f: &mut fmt::Formatter<'_>, keyword: &str, values: &[String]) -> fmt::Result {
    match values {
        [] => Ok(()),
        [single] => write!(f, " {keyword} {single}"),
        many => write!(f, " {keyword} ( {} )", many.join(" $ ")),
    }
}

/// Renders the RFC 4512 `ObjectClassDescription` form.
impl fmt::Display for ObjectClassDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( {}", self.oid)?;
        match self.names.as_slice() {
            [] => {}
            [single] => write!(f, " NAME '{single}'")?,
            many => {
                let quoted: Vec<String> = many.iter().map(|n| format!("'{n}'")).collect();
                write!(f, " NAME ( {} )", quoted.join(" "))?;
            }
        }
        if let Some(description) = &self.description {
            write!(f, " DESC '{}'", description.replace('\\', "\\5c").replace('\'', "\\27"))?;
        }
        if self.obsolete {
            f.write_str(" OBSOLETE")?;
        }
        write_oids(f, "SUP", &self.superior_classes)?;
        write!(f, " {}", self.kind.keyword())?;
        write_oids(f, "MUST", &self.required_attributes)?;
        write_oids(f, "MAY", &self.optional_attributes)?;
        f.write_str(" )")
    }
}

/// Supplies OIDs for generated schema elements.
///
/// Implementations must be deterministic: the same name always yields the
/// same OID.
pub trait OidAllocator: Send + Sync {
    /// Allocate the OID for the named object class.
    fn allocate_object_class_oid(&self, name: &str) -> String;

    /// Allocate the OID for the named attribute type.
    fn allocate_attribute_type_oid(&self, name: &str) -> String;
}

/// Allocates descriptive OIDs of the form `<lowercased-name>-oid`.
///
/// These are accepted by most directory servers for locally defined schema
/// but are not globally unique.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameBasedOidAllocator;

impl OidAllocator for NameBasedOidAllocator {
    fn allocate_object_class_oid(&self, name: &str) -> String {
        format!("{}-oid", name.to_lowercase())
    }

    fn allocate_attribute_type_oid(&self, name: &str) -> String {
        format!("{}-oid", name.to_lowercase())
    }
}
