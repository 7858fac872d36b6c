use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::{EntityModel, GeneratedAccessor, PropertyAccessor, PropertyModel},
    value::Value,
    vm::{ObjectRef, Vm},
};
use critter_schema::{prelude::*, types::parse_signature};
use std::sync::Arc;

fn corrupt(what: &str, err: impl std::fmt::Display) -> InternalError {
    InternalError::new(
        ErrorClass::Corruption,
        ErrorOrigin::Model,
        format!("static model {what}: {err}"),
    )
}

fn parse_type(signature: &str) -> Result<TypeDescriptor, InternalError> {
    parse_signature(signature).map_err(|e| corrupt(signature, e))
}

fn parse_annotations(json: &str) -> Result<Vec<AnnotationMeta>, InternalError> {
    serde_json::from_str(json).map_err(|e| corrupt("annotation table", e))
}

///
/// StaticPropertyModel
///
/// One row of an ahead-of-time emitted model table. Every field is a
/// `'static` literal so the table can live in a `const`.
///

#[derive(Clone, Copy, Debug)]
pub struct StaticPropertyModel {
    pub name: &'static str,
    pub full_name: &'static str,
    pub mapped_name: &'static str,
    pub load_names: &'static [&'static str],
    pub type_signature: &'static str,
    pub accessor_class: &'static str,
    pub is_array: bool,
    pub is_map: bool,
    pub is_set: bool,
    pub is_collection: bool,
    pub is_final: bool,
    pub is_transient: bool,
    pub is_reference: bool,
    pub is_id: bool,
    pub is_version: bool,

    /// JSON array of completed annotations.
    pub annotations_json: &'static str,
}

impl StaticPropertyModel {
    /// Instantiate the generated accessor class this row points at.
    pub fn accessor_in(&self, vm: &Vm) -> Result<GeneratedAccessor, InternalError> {
        GeneratedAccessor::instantiate(vm.clone(), self.accessor_class)
    }
}

impl PropertyModel for StaticPropertyModel {
    fn name(&self) -> Result<String, InternalError> {
        Ok(self.name.to_string())
    }

    fn full_name(&self) -> Result<String, InternalError> {
        Ok(self.full_name.to_string())
    }

    fn mapped_name(&self) -> Result<String, InternalError> {
        Ok(self.mapped_name.to_string())
    }

    fn load_names(&self) -> Result<Vec<String>, InternalError> {
        Ok(self.load_names.iter().map(ToString::to_string).collect())
    }

    fn type_descriptor(&self) -> Result<TypeDescriptor, InternalError> {
        parse_type(self.type_signature)
    }

    fn is_array(&self) -> Result<bool, InternalError> {
        Ok(self.is_array)
    }

    fn is_map(&self) -> Result<bool, InternalError> {
        Ok(self.is_map)
    }

    fn is_set(&self) -> Result<bool, InternalError> {
        Ok(self.is_set)
    }

    fn is_collection(&self) -> Result<bool, InternalError> {
        Ok(self.is_collection)
    }

    fn is_final(&self) -> Result<bool, InternalError> {
        Ok(self.is_final)
    }

    fn is_transient(&self) -> Result<bool, InternalError> {
        Ok(self.is_transient)
    }

    fn is_reference(&self) -> Result<bool, InternalError> {
        Ok(self.is_reference)
    }

    fn is_id(&self) -> Result<bool, InternalError> {
        Ok(self.is_id)
    }

    fn is_version(&self) -> Result<bool, InternalError> {
        Ok(self.is_version)
    }

    fn annotations(&self) -> Result<Vec<AnnotationMeta>, InternalError> {
        parse_annotations(self.annotations_json)
    }

    // A table row has no interpreter to run the accessor in.
    fn accessor(&self) -> Result<Arc<dyn PropertyAccessor>, InternalError> {
        Err(InternalError::model_unsupported(format!(
            "static model {} carries no accessor; use accessor_in",
            self.full_name
        )))
    }
}

///
/// StaticEntityModel
///

#[derive(Clone, Copy, Debug)]
pub struct StaticEntityModel {
    pub name: &'static str,
    pub simple_name: &'static str,
    pub collection_name: &'static str,
    pub discriminator: &'static str,
    pub discriminator_key: &'static str,
    pub use_discriminator: bool,
    pub is_abstract: bool,
    pub is_interface: bool,
    pub is_embedded: bool,
    pub annotations_json: &'static str,
    pub properties: &'static [StaticPropertyModel],
}

impl StaticEntityModel {
    #[must_use]
    pub fn static_property(&self, name: &str) -> Option<&'static StaticPropertyModel> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Read a property of `instance` through the generated accessor class
    /// recorded for it.
    pub fn get(&self, vm: &Vm, property: &str, instance: &ObjectRef) -> Result<Value, InternalError> {
        let row = self.static_property(property).ok_or_else(|| {
            InternalError::missing_target(
                ErrorOrigin::Model,
                format!("{} has no property '{property}'", self.name),
            )
        })?;

        row.accessor_in(vm)?.get(instance)
    }
}

impl EntityModel for StaticEntityModel {
    fn name(&self) -> Result<String, InternalError> {
        Ok(self.name.to_string())
    }

    fn simple_name(&self) -> Result<String, InternalError> {
        Ok(self.simple_name.to_string())
    }

    fn collection_name(&self) -> Result<String, InternalError> {
        Ok(self.collection_name.to_string())
    }

    fn discriminator(&self) -> Result<String, InternalError> {
        Ok(self.discriminator.to_string())
    }

    fn discriminator_key(&self) -> Result<String, InternalError> {
        Ok(self.discriminator_key.to_string())
    }

    fn use_discriminator(&self) -> Result<bool, InternalError> {
        Ok(self.use_discriminator)
    }

    fn is_abstract(&self) -> Result<bool, InternalError> {
        Ok(self.is_abstract)
    }

    fn is_interface(&self) -> Result<bool, InternalError> {
        Ok(self.is_interface)
    }

    fn is_embedded(&self) -> Result<bool, InternalError> {
        Ok(self.is_embedded)
    }

    fn type_descriptor(&self) -> Result<TypeDescriptor, InternalError> {
        Ok(TypeDescriptor::class(self.name))
    }

    fn annotations(&self) -> Result<Vec<AnnotationMeta>, InternalError> {
        parse_annotations(self.annotations_json)
    }

    fn properties(&self) -> Result<Vec<Arc<dyn PropertyModel>>, InternalError> {
        Ok(self
            .properties
            .iter()
            .map(|p| {
                let model: Arc<dyn PropertyModel> = Arc::new(*p);
                model
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntitySnapshot;

    const PROPERTIES: &[StaticPropertyModel] = &[StaticPropertyModel {
        name: "tags",
        full_name: "com.example.Post#tags",
        mapped_name: "tags",
        load_names: &["labels"],
        type_signature: "Ljava/util/List<Ljava/lang/String;>;",
        accessor_class: "com.example.__critter.Post.tagsAccessor",
        is_array: false,
        is_map: false,
        is_set: false,
        is_collection: true,
        is_final: false,
        is_transient: false,
        is_reference: false,
        is_id: false,
        is_version: false,
        annotations_json: r#"[{"type_name":"critter.annotations.AlsoLoad","values":{"value":{"Array":[{"Text":"labels"}]}}}]"#,
    }];

    const POST: StaticEntityModel = StaticEntityModel {
        name: "com.example.Post",
        simple_name: "Post",
        collection_name: "post",
        discriminator: "Post",
        discriminator_key: "_t",
        use_discriminator: true,
        is_abstract: false,
        is_interface: false,
        is_embedded: false,
        annotations_json: "[]",
        properties: PROPERTIES,
    };

    #[test]
    fn tables_answer_the_entity_contract() {
        let snapshot = EntitySnapshot::capture(&POST).unwrap();
        let tags = snapshot.property("tags").unwrap();

        assert_eq!(snapshot.collection_name, "post");
        assert_eq!(tags.load_names, vec!["labels".to_string()]);
        assert_eq!(tags.type_descriptor.raw(), "java.util.List");
        assert_eq!(tags.type_descriptor.args()[0].raw(), "java.lang.String");
        assert!(tags.flags.collection);
        assert_eq!(tags.annotations[0].texts("value"), vec!["labels".to_string()]);
    }

    #[test]
    fn rows_have_no_accessor_of_their_own() {
        let err = PROPERTIES[0].accessor().err().unwrap();
        assert_eq!(err.class, ErrorClass::Unsupported);
    }

    #[test]
    fn broken_signatures_are_corruption() {
        let row = StaticPropertyModel {
            type_signature: "Ljava/util/List<",
            ..PROPERTIES[0]
        };

        assert_eq!(row.type_descriptor().unwrap_err().class, ErrorClass::Corruption);
    }
}
