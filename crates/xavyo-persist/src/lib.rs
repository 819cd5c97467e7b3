//! # Object Persistence
//!
//! Maps Rust types to directory entries.
//!
//! A type declares its mapping once as a [`TypeDescriptor`]: the object
//! classes and default parent DN, the persisted fields, derived getters,
//! setters, and optional post-decode/post-encode hooks. Compiling the
//! descriptor validates it and yields a [`CompiledHandler`] that is then
//! reused for every operation:
//!
//! - **Decode** an [`Entry`](xavyo_directory::Entry) into an object, collecting every failure
//! - **Encode** an object into an entry for an add request, building its DN
//! - **Diff** an object against the entry it was read from
//! - **Build a search filter** matching an object
//! - **Project schema** object class definitions from the mapping
//!
//! ## Example
//!
//! ```
//! use xavyo_persist::prelude::*;
//!
//! #[derive(Default)]
//! struct Person {
//!     uid: Option<String>,
//!     employee_number: Option<String>,
//! }
//!
//! impl Persistent for Person {
//!     fn type_descriptor() -> TypeDescriptor<Self> {
//!         TypeDescriptor::new(
//!             "Person",
//!             ObjectDescriptor::new("person").with_default_parent_dn("ou=People,dc=example,dc=com"),
//!         )
//!         .default_constructor()
//!         .field(
//!             FieldDescriptor::new("uid", |p: &Person| p.uid.clone(), |p: &mut Person, v| p.uid = v)
//!                 .with_policy(MemberPolicy::new().in_rdn().with_filter_usage(FilterUsage::Excluded)),
//!         )
//!         .field(
//!             FieldDescriptor::new(
//!                 "employee_number",
//!                 |p: &Person| p.employee_number.clone(),
//!                 |p: &mut Person, v| p.employee_number = v,
//!             )
//!             .with_policy(
//!                 MemberPolicy::new()
//!                     .with_attribute("employeeNumber")
//!                     .with_filter_usage(FilterUsage::Required),
//!             ),
//!         )
//!     }
//! }
//!
//! let cache = HandlerCache::new();
//! let handler = cache.get_or_compile::<Person>().unwrap();
//!
//! let mut person = Person {
//!     uid: Some("jdoe".to_string()),
//!     employee_number: Some("12345".to_string()),
//! };
//! let entry = handler.encode(&mut person, None).unwrap();
//! assert_eq!(entry.dn(), "uid=jdoe,ou=People,dc=example,dc=com");
//!
//! let filter = handler.build_filter(&person).unwrap();
//! assert_eq!(filter.to_string(), "(&(objectClass=person)(employeeNumber=12345))");
//! ```

pub mod cache;
pub mod codec;
mod decode;
pub mod descriptor;
mod dn;
mod encode;
pub mod error;
mod filter;
pub mod handler;
mod modify;
mod schema;

pub use cache::HandlerCache;
pub use codec::AttributeCodec;
pub use descriptor::{
    Constructor, FieldDescriptor, FilterUsage, GetterDescriptor, MemberPolicy, ObjectDescriptor,
    Persistent, PostDecodeHook, PostEncodeHook, SetterDescriptor, TypeDescriptor,
};
pub use error::{BoxError, DecodeError, PersistError, PersistResult};
pub use handler::{CompiledHandler, ALL_ATTRIBUTES};

/// Directory primitives used by the mapping API.
pub use xavyo_directory as directory;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::cache::HandlerCache;
    pub use crate::codec::AttributeCodec;
    pub use crate::descriptor::{
        FieldDescriptor, FilterUsage, GetterDescriptor, MemberPolicy, ObjectDescriptor,
        Persistent, SetterDescriptor, TypeDescriptor,
    };
    pub use crate::error::{BoxError, DecodeError, PersistError, PersistResult};
    pub use crate::handler::CompiledHandler;
    pub use xavyo_directory::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let _object = ObjectDescriptor::new("person");
        let _policy = MemberPolicy::new().in_rdn();
        let _usage = FilterUsage::Required;
        let _cache = HandlerCache::new();
        let _dn = Dn::root();
        let _err = PersistError::validation("Person", "no RDN defined");
    }
}
