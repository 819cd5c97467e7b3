//! Schema projection.

use std::collections::BTreeMap;

use xavyo_directory::{ObjectClassDefinition, ObjectClassKind, OidAllocator};

use crate::descriptor::MemberPolicy;
use crate::handler::CompiledHandler;

/// Superior class of every generated object class.
const TOP: &str = "top";

impl<T> CompiledHandler<T> {
    /// Derive object class definitions for the structural class followed by
    /// each auxiliary class.
    ///
    /// A member is required by a class when it is part of the RDN or, for
    /// fields, required for both decode and encode. Setter attributes are
    /// optional in the structural class.
    pub fn project_object_classes(
        &self,
        allocator: &dyn OidAllocator,
    ) -> Vec<ObjectClassDefinition> {
        let mut definitions = Vec::with_capacity(1 + self.object.auxiliary_classes.len());
        definitions.push(self.object_class_definition(
            &self.structural_class,
            ObjectClassKind::Structural,
            allocator,
        ));
        for class in &self.object.auxiliary_classes {
            definitions.push(self.object_class_definition(
                class,
                ObjectClassKind::Auxiliary,
                allocator,
            ));
        }
        definitions
    }

    fn object_class_definition(
        &self,
        class: &str,
        kind: ObjectClassKind,
        allocator: &dyn OidAllocator,
    ) -> ObjectClassDefinition {
        // Keyed by lowercase name for case-insensitive alphabetical order.
        let mut required = BTreeMap::new();
        let mut optional = BTreeMap::new();

        let members = self
            .fields
            .values()
            .map(|f| (f.attribute_name(), &f.policy, true))
            .chain(self.getters.values().map(|g| (g.attribute_name(), &g.policy, false)));
        for (name, policy, is_field) in members {
            if !belongs_to(policy, class) {
                continue;
            }
            let is_required = policy.in_rdn
                || (is_field && policy.required_for_decode && policy.required_for_encode);
            let target = if is_required { &mut required } else { &mut optional };
            target.insert(name.to_lowercase(), name.to_string());
        }

        if kind == ObjectClassKind::Structural {
            for setter in self.setters.values() {
                let key = setter.attribute_name().to_lowercase();
                if !required.contains_key(&key) && !optional.contains_key(&key) {
                    optional.insert(key, setter.attribute_name().to_string());
                }
            }
        }

        ObjectClassDefinition::new(allocator.allocate_object_class_oid(class), class, kind)
            .with_superior_classes(vec![TOP.to_string()])
            .with_required_attributes(required.into_values().collect())
            .with_optional_attributes(optional.into_values().collect())
    }
}

fn belongs_to(policy: &MemberPolicy, class: &str) -> bool {
    policy
        .object_classes
        .iter()
        .any(|c| c.eq_ignore_ascii_case(class))
}
