//! Property and entity descriptors produced by discovery.
//!
//! Both are built once per generation pass and never mutated afterwards.

use crate::{ID_FIELD_NAME, annotation::names, err, prelude::*};
use derive_more::Display;
use std::collections::BTreeMap;

///
/// MethodRef
///

#[derive(Clone, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[display("{name}{descriptor}")]
pub struct MethodRef {
    pub name: String,
    pub descriptor: String,
}

impl MethodRef {
    #[must_use]
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }
}

///
/// PropertyAccess
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum PropertyAccess {
    Field,
    Method {
        getter: MethodRef,
        setter: Option<MethodRef>,
    },
}

impl PropertyAccess {
    #[must_use]
    pub const fn is_field(&self) -> bool {
        matches!(self, Self::Field)
    }

    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        matches!(self, Self::Method { setter: None, .. })
    }
}

///
/// PropertyFlags
///

#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PropertyFlags {
    pub transient: bool,
    #[serde(rename = "final")]
    pub final_: bool,
    pub reference: bool,
    pub array: bool,
    pub map: bool,
    pub set: bool,
    pub collection: bool,
    pub id: bool,
    pub version: bool,
}

impl PropertyFlags {
    /// Holds more than one value: arrays, maps and collections.
    #[must_use]
    pub const fn is_multiple_values(&self) -> bool {
        self.array || self.map || self.collection
    }
}

///
/// PropertyDescriptor
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub mapped_name: String,

    /// Alternative document names accepted on load, mapped name excluded.
    #[serde(default)]
    pub load_names: Vec<String>,
    pub type_descriptor: TypeDescriptor,
    pub access: PropertyAccess,

    #[serde(default)]
    pub annotations: Vec<AnnotationMeta>,
    pub flags: PropertyFlags,
}

impl PropertyDescriptor {
    /// `entity#property`
    #[must_use]
    pub fn full_name(&self, entity: &str) -> String {
        format!("{entity}#{}", self.name)
    }

    #[must_use]
    pub fn annotation(&self, type_name: &str) -> Option<&AnnotationMeta> {
        self.annotations.iter().find(|a| a.type_name == type_name)
    }
}

///
/// EntityAnnotation
///
/// Explicit policy written on the entity's own `Entity` annotation. Unset
/// elements fall back to the mapping configuration.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EntityAnnotation {
    pub collection: Option<String>,
    pub discriminator: Option<String>,
    pub discriminator_key: Option<String>,
    pub use_discriminator: bool,
    pub embedded: bool,
}

impl Default for EntityAnnotation {
    fn default() -> Self {
        Self {
            collection: None,
            discriminator: None,
            discriminator_key: None,
            use_discriminator: true,
            embedded: false,
        }
    }
}

impl EntityAnnotation {
    #[must_use]
    pub fn from_annotations(annotations: &[AnnotationMeta]) -> Self {
        let mut out = Self::default();

        if let Some(entity) = annotations.iter().find(|a| a.type_name == names::ENTITY) {
            out.collection = entity.explicit_text("value").map(str::to_string);
            out.discriminator = entity.explicit_text("discriminator").map(str::to_string);
            out.discriminator_key = entity
                .explicit_text("discriminatorKey")
                .map(str::to_string);
            out.use_discriminator = entity.bool("useDiscriminator").unwrap_or(true);
        }
        out.embedded = annotations.iter().any(|a| a.type_name == names::EMBEDDED);

        out
    }
}

///
/// EntityDescriptor
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EntityDescriptor {
    pub name: String,
    pub simple_name: String,
    pub package: String,
    pub properties: Vec<PropertyDescriptor>,

    #[serde(default)]
    pub annotations: Vec<AnnotationMeta>,
    pub is_abstract: bool,
    pub is_interface: bool,
    pub entity: EntityAnnotation,
}

impl EntityDescriptor {
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn id_property(&self) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.flags.id)
    }

    #[must_use]
    pub fn collection_name(&self, config: &MappingConfig) -> String {
        self.entity
            .collection
            .clone()
            .unwrap_or_else(|| config.collection_name(&self.simple_name))
    }

    #[must_use]
    pub fn discriminator(&self, config: &MappingConfig) -> String {
        self.entity
            .discriminator
            .clone()
            .unwrap_or_else(|| config.discriminator(&self.name))
    }

    #[must_use]
    pub fn discriminator_key(&self, config: &MappingConfig) -> String {
        self.entity
            .discriminator_key
            .clone()
            .unwrap_or_else(|| config.discriminator_key().to_string())
    }

    #[must_use]
    pub fn type_descriptor(&self) -> TypeDescriptor {
        TypeDescriptor::class(&self.name)
    }

    /// Report every mapped-name clash and every surplus id, per property.
    pub fn validate(&self) -> Result<(), ErrorTree> {
        let mut errs = ErrorTree::new();

        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
        for prop in &self.properties {
            for mapped in std::iter::once(&prop.mapped_name).chain(&prop.load_names) {
                let first = *seen.entry(mapped.as_str()).or_insert(prop.name.as_str());
                if first != prop.name {
                    errs.add_at(
                        &prop.name,
                        format!("mapped name '{mapped}' already used by '{first}'"),
                    );
                }
            }
        }

        let ids: Vec<&str> = self
            .properties
            .iter()
            .filter(|p| p.flags.id)
            .map(|p| p.name.as_str())
            .collect();
        if ids.len() > 1 {
            err!(errs, "more than one id property: {}", ids.join(", "));
        }

        for prop in &self.properties {
            if prop.flags.id && prop.mapped_name != ID_FIELD_NAME {
                errs.add_at(&prop.name, format!("id property must map to '{ID_FIELD_NAME}'"));
            }
        }

        errs.result()
    }
}
