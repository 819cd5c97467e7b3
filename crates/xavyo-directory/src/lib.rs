//! # Directory Primitives
//!
//! Entry, attribute, DN, filter, modification and schema types shared by the
//! xavyo directory crates.
//!
//! These types model what an LDAP client needs above the wire protocol:
//!
//! - [`Entry`] / [`ReadOnlyEntry`] - a DN plus ordered, multi-valued attributes
//! - [`Dn`] / [`Rdn`] - RFC 4514 parsing, composition and rendering
//! - [`Filter`] - search filters rendering to RFC 4515 strings
//! - [`Modification`] - replace/add/delete changes for modify operations
//! - [`ObjectClassDefinition`] / [`OidAllocator`] - generated schema elements
//!
//! Conversions to the `ldap3` wire types live in [`wire`].
//!
//! ## Example
//!
//! ```
//! use xavyo_directory::prelude::*;
//!
//! let parent = Dn::parse("ou=People,dc=example,dc=com").unwrap();
//! let dn = Dn::from_rdn_and_parent(Rdn::single("uid", "jdoe").unwrap(), &parent);
//! assert_eq!(dn.to_string(), "uid=jdoe,ou=People,dc=example,dc=com");
//!
//! let filter = Filter::eq("objectClass", "person").and_with(Filter::eq("uid", "jdoe"));
//! assert_eq!(filter.to_string(), "(&(objectClass=person)(uid=jdoe))");
//! ```

pub mod attribute;
pub mod dn;
pub mod entry;
pub mod error;
pub mod filter;
pub mod modification;
pub mod name;
pub mod schema;
pub mod wire;

pub use attribute::Attribute;
pub use dn::{Dn, Rdn};
pub use entry::{Entry, ReadOnlyEntry, OBJECT_CLASS_ATTRIBUTE};
pub use error::{DirectoryError, DirectoryResult};
pub use filter::{Filter, MatchType};
pub use modification::{Modification, ModificationType};
pub use name::{is_valid_ldap_name, validate_ldap_name};
pub use schema::{NameBasedOidAllocator, ObjectClassDefinition, ObjectClassKind, OidAllocator};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::attribute::Attribute;
    pub use crate::dn::{Dn, Rdn};
    pub use crate::entry::{Entry, ReadOnlyEntry, OBJECT_CLASS_ATTRIBUTE};
    pub use crate::error::{DirectoryError, DirectoryResult};
    pub use crate::filter::{Filter, MatchType};
    pub use crate::modification::{Modification, ModificationType};
    pub use crate::name::{is_valid_ldap_name, validate_ldap_name};
    pub use crate::schema::{
        NameBasedOidAllocator, ObjectClassDefinition, ObjectClassKind, OidAllocator,
    };
}
