use crate::{
    error::InternalError,
    model::{EntityModel, PropertyModel},
};
use critter_schema::prelude::*;

///
/// PropertySnapshot
///
/// Every zero-argument answer of a [`PropertyModel`], captured once so two
/// implementations can be compared with `==`.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PropertySnapshot {
    pub name: String,
    pub full_name: String,
    pub mapped_name: String,
    pub load_names: Vec<String>,
    pub type_descriptor: TypeDescriptor,
    pub flags: PropertyFlags,
    pub annotations: Vec<AnnotationMeta>,
}

impl PropertySnapshot {
    pub fn capture(model: &dyn PropertyModel) -> Result<Self, InternalError> {
        Ok(Self {
            name: model.name()?,
            full_name: model.full_name()?,
            mapped_name: model.mapped_name()?,
            load_names: model.load_names()?,
            type_descriptor: model.type_descriptor()?,
            flags: PropertyFlags {
                transient: model.is_transient()?,
                final_: model.is_final()?,
                reference: model.is_reference()?,
                array: model.is_array()?,
                map: model.is_map()?,
                set: model.is_set()?,
                collection: model.is_collection()?,
                id: model.is_id()?,
                version: model.is_version()?,
            },
            annotations: model.annotations()?,
        })
    }
}

///
/// EntitySnapshot
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub name: String,
    pub simple_name: String,
    pub collection_name: String,
    pub discriminator: String,
    pub discriminator_key: String,
    pub use_discriminator: bool,
    pub is_abstract: bool,
    pub is_interface: bool,
    pub is_embedded: bool,
    pub type_descriptor: TypeDescriptor,
    pub annotations: Vec<AnnotationMeta>,
    pub properties: Vec<PropertySnapshot>,
}

impl EntitySnapshot {
    pub fn capture(model: &dyn EntityModel) -> Result<Self, InternalError> {
        let properties = model
            .properties()?
            .iter()
            .map(|p| PropertySnapshot::capture(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: model.name()?,
            simple_name: model.simple_name()?,
            collection_name: model.collection_name()?,
            discriminator: model.discriminator()?,
            discriminator_key: model.discriminator_key()?,
            use_discriminator: model.use_discriminator()?,
            is_abstract: model.is_abstract()?,
            is_interface: model.is_interface()?,
            is_embedded: model.is_embedded()?,
            type_descriptor: model.type_descriptor()?,
            annotations: model.annotations()?,
            properties,
        })
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertySnapshot> {
        self.properties.iter().find(|p| p.name == name)
    }
}
