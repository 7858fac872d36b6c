use crate::{
    error::BuildError,
    model::{replay_annotations, replayable},
    names,
};
use critter_core::{
    annotation::AnnotationRegistry,
    class::{ClassBuilder, ClassKind},
    contract::{self, property_model},
    error::InternalError,
    registry::GeneratedClassRecord,
};
use critter_schema::prelude::*;

///
/// PropertyModelGenerator
///
/// Emits the model class for one property. The constructor replays the
/// property's annotations and instantiates its accessor; every other member
/// returns a constant baked in at generation time.
///

pub struct PropertyModelGenerator<'a> {
    entity: &'a EntityDescriptor,
    property: &'a PropertyDescriptor,
    annotations: &'a AnnotationRegistry,
}

impl<'a> PropertyModelGenerator<'a> {
    #[must_use]
    pub const fn new(
        entity: &'a EntityDescriptor,
        property: &'a PropertyDescriptor,
        annotations: &'a AnnotationRegistry,
    ) -> Self {
        Self {
            entity,
            property,
            annotations,
        }
    }

    #[must_use]
    pub fn class_name(&self) -> String {
        names::property_model_class(&self.entity.name, &self.property.name)
    }

    pub fn generate(&self) -> Result<GeneratedClassRecord, BuildError> {
        let entity = self.entity.name.as_str();
        let property = self.property;
        let class = self.class_name();
        let accessor_class = names::accessor_class(entity, &property.name);
        let replayed = replayable(entity, self.annotations, &property.annotations)?;
        let bits = property.flags;

        let mut builder = ClassBuilder::new(&class, ClassKind::PropertyModel)
            .flags(flags::PUBLIC | flags::FINAL)
            .extends(contract::OBJECT)
            .implements(contract::PROPERTY_MODEL)
            .field(
                contract::ANNOTATIONS_FIELD,
                contract::LIST_DESCRIPTOR,
                flags::PRIVATE,
            )
            .field(
                property_model::ACCESSOR_FIELD,
                contract::ACCESSOR_DESCRIPTOR,
                flags::PRIVATE | flags::FINAL,
            )
            .try_method(
                contract::CONSTRUCTOR,
                contract::NO_ARG_CONSTRUCTOR,
                flags::PUBLIC,
                |c| {
                    replay_annotations(c, entity, &class, &replayed)?;
                    c.load_this()
                        .new_object(&accessor_class, contract::NO_ARG_CONSTRUCTOR)
                        .put_field(&class, property_model::ACCESSOR_FIELD)
                        .ret_void();
                    Ok::<_, BuildError>(())
                },
            )?;

        for (member, value) in [
            (property_model::NAME, property.name.clone()),
            (property_model::FULL_NAME, property.full_name(entity)),
            (property_model::MAPPED_NAME, property.mapped_name.clone()),
        ] {
            builder = builder.member(member, |c| {
                c.ldc_text(value).ret();
            });
        }

        for (member, value) in [
            (property_model::IS_ARRAY, bits.array),
            (property_model::IS_MAP, bits.map),
            (property_model::IS_SET, bits.set),
            (property_model::IS_COLLECTION, bits.collection),
            (property_model::IS_FINAL, bits.final_),
            (property_model::IS_TRANSIENT, bits.transient),
            (property_model::IS_REFERENCE, bits.reference),
            (property_model::IS_ID, bits.id),
            (property_model::IS_VERSION, bits.version),
        ] {
            builder = builder.member(member, |c| {
                c.push_bool(value).ret();
            });
        }

        let body = builder
            .try_member(property_model::LOAD_NAMES, |c| {
                c.text_list(&property.load_names)?.ret();
                Ok::<_, InternalError>(())
            })?
            .try_member(property_model::TYPE_DATA, |c| {
                c.type_data(&property.type_descriptor)?.ret();
                Ok::<_, InternalError>(())
            })?
            .member(property_model::ACCESSOR, |c| {
                c.load_this()
                    .get_field(&class, property_model::ACCESSOR_FIELD)
                    .ret();
            })
            .member(property_model::ANNOTATIONS, |c| {
                c.load_this()
                    .get_field(&class, contract::ANNOTATIONS_FIELD)
                    .ret();
            })
            .build();

        log::trace!(
            "property model {class}: {} of {} annotations replayed",
            replayed.len(),
            property.annotations.len()
        );

        Ok(GeneratedClassRecord::from_body(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use critter_core::{
        class::{ClassBody, Instr},
        error::ErrorClass,
    };
    use critter_schema::annotation::names as annotation_names;

    fn entity() -> EntityDescriptor {
        EntityDescriptor {
            name: "com.example.Person".to_string(),
            simple_name: "Person".to_string(),
            package: "com.example".to_string(),
            properties: vec![PropertyDescriptor {
                name: "name".to_string(),
                mapped_name: "fullName".to_string(),
                load_names: vec!["n".to_string()],
                type_descriptor: TypeDescriptor::class("java.lang.String"),
                access: PropertyAccess::Field,
                annotations: vec![
                    AnnotationMeta::new(annotation_names::PROPERTY).with("value", "fullName"),
                    AnnotationMeta::new("com.example.Unregistered"),
                ],
                flags: PropertyFlags::default(),
            }],
            annotations: Vec::new(),
            is_abstract: false,
            is_interface: false,
            entity: critter_schema::descriptor::EntityAnnotation::default(),
        }
    }

    #[test]
    fn unregistered_annotations_are_not_replayed() {
        let entity = entity();
        let registry = AnnotationRegistry::with_builtins();
        let record = PropertyModelGenerator::new(&entity, &entity.properties[0], &registry)
            .generate()
            .unwrap();

        let body = ClassBody::decode(record.body()).unwrap();
        let ctor = body
            .method(contract::CONSTRUCTOR, contract::NO_ARG_CONSTRUCTOR)
            .unwrap();
        let begins: Vec<_> = ctor
            .code
            .iter()
            .filter_map(|i| match i {
                Instr::AnnotationBegin(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();

        assert_eq!(begins, vec![annotation_names::PROPERTY]);
    }

    #[test]
    fn model_class_implements_every_member() {
        let entity = entity();
        let registry = AnnotationRegistry::with_builtins();
        let record = PropertyModelGenerator::new(&entity, &entity.properties[0], &registry)
            .generate()
            .unwrap();
        let body = ClassBody::decode(record.body()).unwrap();

        assert_eq!(body.kind, ClassKind::PropertyModel);
        assert_eq!(body.interfaces, vec![contract::PROPERTY_MODEL.to_string()]);
        for member in [
            property_model::NAME,
            property_model::FULL_NAME,
            property_model::MAPPED_NAME,
            property_model::LOAD_NAMES,
            property_model::TYPE_DATA,
            property_model::IS_ID,
            property_model::ACCESSOR,
            property_model::ANNOTATIONS,
        ] {
            assert!(
                body.method(member.name, member.descriptor).is_some(),
                "missing {}",
                member.name
            );
        }
    }

    #[test]
    fn ill_typed_elements_fail_the_build() {
        let mut entity = entity();
        entity.properties[0].annotations = vec![
            AnnotationMeta::new(annotation_names::PROPERTY).with(
                "value",
                AnnotationValue::Annotation(AnnotationMeta::new("com.example.Inner")),
            ),
        ];
        let registry = AnnotationRegistry::with_builtins();

        let err = PropertyModelGenerator::new(&entity, &entity.properties[0], &registry)
            .generate()
            .unwrap_err();
        assert!(matches!(err, BuildError::Internal(_)), "{err}");
    }

    #[test]
    fn oversized_load_name_lists_fail_the_build() {
        let mut entity = entity();
        entity.properties[0].load_names = vec!["n".to_string(); usize::from(u16::MAX) + 1];
        let registry = AnnotationRegistry::with_builtins();

        let err = PropertyModelGenerator::new(&entity, &entity.properties[0], &registry)
            .generate()
            .unwrap_err();
        assert!(
            matches!(err, BuildError::Internal(ref e) if e.class == ErrorClass::Unsupported),
            "{err}"
        );
    }
}
