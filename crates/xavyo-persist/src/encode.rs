//! Encoding objects into entries.

use tracing::{debug, warn};
use xavyo_directory::{Attribute, Entry};

use crate::error::{PersistError, PersistResult};
use crate::handler::CompiledHandler;

impl<T> CompiledHandler<T> {
    /// Encode an object as an entry suitable for an add request.
    ///
    /// `parent_dn` overrides the default parent DN; `Some("")` places the
    /// entry directly below the root. On success the DN and entry fields of
    /// the object are updated as if the entry had been read back.
    pub fn encode(&self, object: &mut T, parent_dn: Option<&str>) -> PersistResult<Entry> {
        let mut attributes = vec![self.object_class_attribute.clone()];
        attributes.extend(self.add_attributes(object)?);

        let dn = self.resolve_dn(object, parent_dn, &attributes)?;
        let mut entry = Entry::new(dn, attributes);

        if let Some((name, hook)) = &self.post_encode {
            hook(object, &mut entry).map_err(|e| {
                warn!(type_name = %self.type_name, hook = %name, error = %e, "Post-encode hook failed");
                PersistError::encode_with_source(
                    self.type_name.clone(),
                    format!("post-encode hook '{name}' failed: {e}"),
                    e,
                )
            })?;
        }

        self.store_identity(object, &entry);
        debug!(
            type_name = %self.type_name,
            dn = %entry.dn(),
            attributes = entry.attributes().len(),
            "Encoded object"
        );
        Ok(entry)
    }

    /// Encoded attributes of every add-included field, then getter.
    fn add_attributes(&self, object: &T) -> PersistResult<Vec<Attribute>> {
        let mut attributes = Vec::new();
        for field in self.fields.values().filter(|f| f.policy.in_add) {
            let values = field
                .encode(object)
                .map_err(|reason| PersistError::encode(self.type_name.clone(), reason))?;
            if let Some(values) = values {
                attributes.push(Attribute::new(field.attribute_name(), values));
            }
        }
        for getter in self.getters.values().filter(|g| g.policy.in_add) {
            let values = getter
                .encode(object)
                .map_err(|reason| PersistError::encode(self.type_name.clone(), reason))?;
            if let Some(values) = values {
                attributes.push(Attribute::new(getter.attribute_name(), values));
            }
        }
        Ok(attributes)
    }
}
