//! Accessor generation.
//!
//! Every backend emits one class per property implementing
//! `PropertyAccessor`: a no-arg constructor plus `get(Object)Object` and
//! `set(Object, Object)V`. Values cross the contract boxed; primitives are
//! unboxed on the way in and boxed on the way out.

mod builder;
mod direct;
mod resolved;

use crate::{error::BuildError, names};
use critter_core::registry::GeneratedClassRecord;
use critter_schema::prelude::*;
use std::fmt;

///
/// Backend
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum Backend {
    /// Builder-assisted emission of the direct backend's code.
    Builder,
    /// Raw instruction emission calling the entity's synthetic reader/writer.
    #[default]
    Direct,
    /// Members bound once in the constructor, then used through handles.
    Resolved,
}

impl Backend {
    pub const ALL: [Self; 3] = [Self::Direct, Self::Builder, Self::Resolved];

    /// Whether this backend depends on synthetic reader/writer methods being
    /// injected into the entity.
    #[must_use]
    pub const fn needs_augmentation(self) -> bool {
        matches!(self, Self::Builder | Self::Direct)
    }

    /// Emit the accessor class for `property`.
    pub fn generate(
        self,
        entity: &EntityDescriptor,
        property: &PropertyDescriptor,
    ) -> Result<GeneratedClassRecord, BuildError> {
        let shape = AccessorShape::new(entity, property);

        if self.needs_augmentation() && !property.access.is_field() {
            return Err(BuildError::unsupported(
                &entity.name,
                format!(
                    "{self} accessors need a field to front; '{}' is getter-backed",
                    property.name
                ),
            ));
        }

        let record = match self {
            Self::Builder => builder::generate(&shape)?,
            Self::Direct => direct::generate(&shape)?,
            Self::Resolved => resolved::generate(&shape)?,
        };
        log::debug!("{self} accessor {} ({} bytes)", record.name(), record.body().len());

        Ok(record)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Builder => "builder",
            Self::Direct => "direct",
            Self::Resolved => "resolved",
        };
        write!(f, "{label}")
    }
}

///
/// AccessorShape
///
/// Everything a backend needs to know about one property, computed once.
///

pub(crate) struct AccessorShape<'a> {
    pub class: String,
    pub entity: &'a str,
    pub property: &'a PropertyDescriptor,
    pub ty: &'a TypeDescriptor,
    pub signature: String,
}

impl<'a> AccessorShape<'a> {
    fn new(entity: &'a EntityDescriptor, property: &'a PropertyDescriptor) -> Self {
        let ty = &property.type_descriptor;
        let boxed = match ty.primitive_type() {
            Some(p) => TypeDescriptor::class(p.boxed()).to_signature(),
            None => ty.to_signature(),
        };
        let signature = format!(
            "Ljava/lang/Object;Lcritter/mapping/PropertyAccessor<{}{boxed}>;",
            entity.type_descriptor().to_signature()
        );

        Self {
            class: names::accessor_class(&entity.name, &property.name),
            entity: &entity.name,
            property,
            ty,
            signature,
        }
    }

    pub fn name(&self) -> &str {
        &self.property.name
    }

    pub fn reader(&self) -> (String, String) {
        (
            names::reader_method(&self.property.name),
            format!("(){}", self.ty.erased_descriptor()),
        )
    }

    pub fn writer(&self) -> (String, String) {
        (
            names::writer_method(&self.property.name),
            format!("({})V", self.ty.erased_descriptor()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use critter_core::class::ClassBody;
    use critter_schema::descriptor::MethodRef;

    fn entity() -> EntityDescriptor {
        EntityDescriptor {
            name: "com.example.Person".to_string(),
            simple_name: "Person".to_string(),
            package: "com.example".to_string(),
            properties: vec![PropertyDescriptor {
                name: "age".to_string(),
                mapped_name: "age".to_string(),
                load_names: Vec::new(),
                type_descriptor: TypeDescriptor::primitive(Primitive::Int),
                access: PropertyAccess::Field,
                annotations: Vec::new(),
                flags: PropertyFlags::default(),
            }],
            annotations: Vec::new(),
            is_abstract: false,
            is_interface: false,
            entity: critter_schema::descriptor::EntityAnnotation::default(),
        }
    }

    #[test]
    fn direct_and_builder_emit_the_same_class() {
        let entity = entity();
        let property = &entity.properties[0];

        let direct = Backend::Direct.generate(&entity, property).unwrap();
        let builder = Backend::Builder.generate(&entity, property).unwrap();

        assert_eq!(direct.name(), builder.name());
        assert_eq!(
            ClassBody::decode(direct.body()).unwrap(),
            ClassBody::decode(builder.body()).unwrap()
        );
    }

    #[test]
    fn accessor_signature_names_entity_and_boxed_type() {
        let entity = entity();
        let shape = AccessorShape::new(&entity, &entity.properties[0]);

        assert_eq!(
            shape.signature,
            "Ljava/lang/Object;Lcritter/mapping/PropertyAccessor<Lcom/example/Person;Ljava/lang/Integer;>;"
        );
        assert_eq!(shape.reader(), ("__read_age".to_string(), "()I".to_string()));
        assert_eq!(shape.writer(), ("__write_age".to_string(), "(I)V".to_string()));
    }

    #[test]
    fn getter_backed_properties_need_resolved_accessors() {
        let mut entity = entity();
        entity.properties[0].access = PropertyAccess::Method {
            getter: MethodRef::new("getAge", "()I"),
            setter: None,
        };
        let property = &entity.properties[0];

        for backend in [Backend::Direct, Backend::Builder] {
            let err = backend.generate(&entity, property).unwrap_err();
            assert!(err.is_unsupported());
        }
        assert!(Backend::Resolved.generate(&entity, property).is_ok());
    }
}
