//! Filter builder.

use tracing::debug;
use xavyo_directory::{Attribute, Filter};

use crate::descriptor::{FieldDescriptor, GetterDescriptor};
use crate::error::{PersistError, PersistResult};
use crate::handler::CompiledHandler;

impl<T> CompiledHandler<T> {
    /// Build a search filter matching entries that look like the object.
    ///
    /// The filter always matches the object classes. Members with
    /// [`FilterUsage::Required`](crate::FilterUsage::Required) must have a
    /// value, and at least one required or always-allowed member must
    /// contribute one. Every value of every contributing attribute becomes
    /// its own equality term, and all terms are ANDed.
    pub fn build_filter(&self, object: &T) -> PersistResult<Filter> {
        let mut attributes = vec![self.object_class_attribute.clone()];

        for field in Self::members(&self.fields, &self.field_lists.required) {
            let attribute = self.field_attribute(field, object)?.ok_or_else(|| {
                self.missing_required(field.member(), field.attribute_name())
            })?;
            attributes.push(attribute);
        }
        for getter in Self::members(&self.getters, &self.getter_lists.required) {
            let attribute = self.getter_attribute(getter, object)?.ok_or_else(|| {
                self.missing_required(getter.member(), getter.attribute_name())
            })?;
            attributes.push(attribute);
        }
        for field in Self::members(&self.fields, &self.field_lists.always_allowed) {
            attributes.extend(self.field_attribute(field, object)?);
        }
        for getter in Self::members(&self.getters, &self.getter_lists.always_allowed) {
            attributes.extend(self.getter_attribute(getter, object)?);
        }

        if attributes.len() == 1 {
            return Err(PersistError::filter(
                self.type_name.clone(),
                "no filter criteria available: no required or always-allowed member has a value",
            ));
        }

        for field in Self::members(&self.fields, &self.field_lists.conditionally_allowed) {
            attributes.extend(self.field_attribute(field, object)?);
        }
        for getter in Self::members(&self.getters, &self.getter_lists.conditionally_allowed) {
            attributes.extend(self.getter_attribute(getter, object)?);
        }

        let terms: Vec<Filter> = attributes
            .iter()
            .flat_map(|a| a.values().iter().map(move |v| Filter::eq(a.name(), v.clone())))
            .collect();
        let filter = Filter::and(terms);
        debug!(type_name = %self.type_name, filter = %filter, "Built search filter");
        Ok(filter)
    }

    fn field_attribute(
        &self,
        field: &FieldDescriptor<T>,
        object: &T,
    ) -> PersistResult<Option<Attribute>> {
        let values = field
            .encode(object)
            .map_err(|reason| PersistError::filter(self.type_name.clone(), reason))?;
        Ok(values.map(|v| Attribute::new(field.attribute_name(), v)))
    }

    fn getter_attribute(
        &self,
        getter: &GetterDescriptor<T>,
        object: &T,
    ) -> PersistResult<Option<Attribute>> {
        let values = getter
            .encode(object)
            .map_err(|reason| PersistError::filter(self.type_name.clone(), reason))?;
        Ok(values.map(|v| Attribute::new(getter.attribute_name(), v)))
    }

    fn missing_required(&self, member: &str, attribute: &str) -> PersistError {
        PersistError::filter(
            self.type_name.clone(),
            format!("required filter member '{member}' has no value for attribute '{attribute}'"),
        )
    }
}
