use crate::{
    error::BuildError,
    model::{replay_annotations, replayable},
    names,
};
use critter_core::{
    annotation::AnnotationRegistry,
    class::{ClassBuilder, ClassKind, Intrinsic},
    contract::{self, entity_model},
    error::InternalError,
    registry::GeneratedClassRecord,
};
use critter_schema::prelude::*;

const TEXT_DESCRIPTOR: &str = "Ljava/lang/String;";

///
/// EntityModelGenerator
///
/// Emits the entity model class. Names the entity pins down explicitly are
/// baked in as constants; the rest are computed once in the constructor
/// from the `MappingConfig` it is handed.
///

pub struct EntityModelGenerator<'a> {
    entity: &'a EntityDescriptor,
    annotations: &'a AnnotationRegistry,
}

impl<'a> EntityModelGenerator<'a> {
    #[must_use]
    pub const fn new(entity: &'a EntityDescriptor, annotations: &'a AnnotationRegistry) -> Self {
        Self {
            entity,
            annotations,
        }
    }

    #[must_use]
    pub fn class_name(&self) -> String {
        names::entity_model_class(&self.entity.name)
    }

    pub fn generate(&self) -> Result<GeneratedClassRecord, BuildError> {
        let entity = self.entity;
        let class = self.class_name();
        let replayed = replayable(&entity.name, self.annotations, &entity.annotations)?;
        let property_models: Vec<String> = entity
            .properties
            .iter()
            .map(|p| names::property_model_class(&entity.name, &p.name))
            .collect();
        let count = u16::try_from(property_models.len())
            .map_err(|_| BuildError::unsupported(&entity.name, "too many properties"))?;

        let builder = ClassBuilder::new(&class, ClassKind::EntityModel)
            .flags(flags::PUBLIC | flags::FINAL)
            .extends(contract::OBJECT)
            .implements(contract::ENTITY_MODEL)
            .field(
                entity_model::CONFIG_FIELD,
                contract::CONFIG_DESCRIPTOR,
                flags::PRIVATE | flags::FINAL,
            )
            .field(contract::ANNOTATIONS_FIELD, contract::LIST_DESCRIPTOR, flags::PRIVATE)
            .field(entity_model::COLLECTION_NAME_FIELD, TEXT_DESCRIPTOR, flags::PRIVATE | flags::FINAL)
            .field(entity_model::DISCRIMINATOR_FIELD, TEXT_DESCRIPTOR, flags::PRIVATE | flags::FINAL)
            .field(
                entity_model::DISCRIMINATOR_KEY_FIELD,
                TEXT_DESCRIPTOR,
                flags::PRIVATE | flags::FINAL,
            )
            .field(
                entity_model::PROPERTIES_FIELD,
                contract::LIST_DESCRIPTOR,
                flags::PRIVATE | flags::FINAL,
            );

        let builder = builder.try_method(
            contract::CONSTRUCTOR,
            entity_model::CONSTRUCTOR_DESCRIPTOR,
            flags::PUBLIC,
            |c| {
                c.load_this()
                    .load(1)
                    .put_field(&class, entity_model::CONFIG_FIELD);

                replay_annotations(c, &entity.name, &class, &replayed)?;

                // explicit names win, otherwise the configuration decides
                c.load_this();
                match &entity.entity.collection {
                    Some(name) => c.ldc_text(name.clone()),
                    None => c
                        .load(1)
                        .ldc_text(entity.simple_name.clone())
                        .intrinsic(Intrinsic::CollectionName),
                };
                c.put_field(&class, entity_model::COLLECTION_NAME_FIELD);

                c.load_this();
                match &entity.entity.discriminator {
                    Some(value) => c.ldc_text(value.clone()),
                    None => c
                        .load(1)
                        .ldc_text(entity.name.clone())
                        .intrinsic(Intrinsic::Discriminator),
                };
                c.put_field(&class, entity_model::DISCRIMINATOR_FIELD);

                c.load_this();
                match &entity.entity.discriminator_key {
                    Some(key) => c.ldc_text(key.clone()),
                    None => c.load(1).intrinsic(Intrinsic::DiscriminatorKey),
                };
                c.put_field(&class, entity_model::DISCRIMINATOR_KEY_FIELD);

                c.load_this();
                for model in &property_models {
                    c.new_object(model, contract::NO_ARG_CONSTRUCTOR);
                }
                c.new_list(count)
                    .put_field(&class, entity_model::PROPERTIES_FIELD)
                    .ret_void();

                Ok::<_, BuildError>(())
            },
        )?;

        let mut builder = builder
            .member(entity_model::NAME, |c| {
                c.ldc_text(entity.name.clone()).ret();
            })
            .member(entity_model::SIMPLE_NAME, |c| {
                c.ldc_text(entity.simple_name.clone()).ret();
            })
            .try_member(entity_model::TYPE, |c| {
                c.type_data(&entity.type_descriptor())?.ret();
                Ok::<_, InternalError>(())
            })?;

        for (member, field) in [
            (entity_model::COLLECTION_NAME, entity_model::COLLECTION_NAME_FIELD),
            (entity_model::DISCRIMINATOR, entity_model::DISCRIMINATOR_FIELD),
            (entity_model::DISCRIMINATOR_KEY, entity_model::DISCRIMINATOR_KEY_FIELD),
            (entity_model::PROPERTIES, entity_model::PROPERTIES_FIELD),
            (entity_model::ANNOTATIONS, contract::ANNOTATIONS_FIELD),
            (entity_model::CONFIG, entity_model::CONFIG_FIELD),
        ] {
            builder = builder.member(member, |c| {
                c.load_this().get_field(&class, field).ret();
            });
        }

        for (member, value) in [
            (entity_model::USE_DISCRIMINATOR, entity.entity.use_discriminator),
            (entity_model::IS_ABSTRACT, entity.is_abstract),
            (entity_model::IS_INTERFACE, entity.is_interface),
            (entity_model::IS_EMBEDDED, entity.entity.embedded),
        ] {
            builder = builder.member(member, |c| {
                c.push_bool(value).ret();
            });
        }

        Ok(GeneratedClassRecord::from_body(&builder.build())?)
    }
}
