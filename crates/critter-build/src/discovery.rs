//! Property discovery: pick the members of a compiled entity type that are
//! mapped properties and describe each one.

use crate::error::BuildError;
use critter_core::contract;
use critter_schema::{
    ID_FIELD_NAME,
    annotation::names,
    descriptor::{EntityAnnotation, MethodRef},
    prelude::*,
    types::{parse_method_signature, parse_signature},
};

const SKIPPED_FLAGS: u16 = flags::STATIC | flags::SYNTHETIC | flags::BRIDGE | flags::TRANSIENT;

// Annotations whose `value` element overrides the mapped name.
const NAMING_ANNOTATIONS: &[&str] = &[
    names::PROPERTY,
    names::REFERENCE,
    names::VERSION,
];

///
/// Discovery
///

pub struct Discovery<'a> {
    meta: &'a ClassMeta,
    config: &'a MappingConfig,
}

impl<'a> Discovery<'a> {
    #[must_use]
    pub const fn new(meta: &'a ClassMeta, config: &'a MappingConfig) -> Self {
        Self { meta, config }
    }

    /// Describe the entity. Field properties come first in declaration
    /// order, then getter-backed properties.
    pub fn discover(&self) -> Result<EntityDescriptor, BuildError> {
        let mut properties = Vec::new();

        for field in self.meta.fields.iter().filter(|f| self.field_qualifies(f)) {
            properties.push(self.field_property(field)?);
        }

        for method in self.meta.methods.iter().filter(|m| self.method_qualifies(m)) {
            let property = self.method_property(method)?;
            if properties.iter().any(|p: &PropertyDescriptor| p.name == property.name) {
                return Err(BuildError::unsupported(
                    &self.meta.name,
                    format!(
                        "property '{}' is declared on both a field and a method",
                        property.name
                    ),
                ));
            }
            properties.push(property);
        }

        log::debug!(
            "discovered {} properties on {}",
            properties.len(),
            self.meta.name
        );

        Ok(EntityDescriptor {
            name: self.meta.name.clone(),
            simple_name: self.meta.simple_name().to_string(),
            package: self.meta.package().to_string(),
            properties,
            annotations: self.meta.annotations.clone(),
            is_abstract: self.meta.is_abstract(),
            is_interface: self.meta.is_interface(),
            entity: EntityAnnotation::from_annotations(&self.meta.annotations),
        })
    }

    fn is_transient(&self, annotations: &[AnnotationMeta]) -> bool {
        annotations
            .iter()
            .any(|a| self.config.is_transient_annotation(&a.type_name))
    }

    fn is_provided(&self, annotations: &[AnnotationMeta]) -> bool {
        annotations
            .iter()
            .any(|a| self.config.is_property_annotation(&a.type_name))
    }

    fn field_qualifies(&self, field: &FieldMeta) -> bool {
        if field.flags & SKIPPED_FLAGS != 0 || self.is_transient(&field.annotations) {
            return false;
        }

        !self.config.is_annotated_mode() || self.is_provided(&field.annotations)
    }

    // Methods never qualify by convention alone.
    fn method_qualifies(&self, method: &MethodMeta) -> bool {
        self.config.is_annotated_mode()
            && method.flags & SKIPPED_FLAGS == 0
            && !self.is_transient(&method.annotations)
            && self.is_provided(&method.annotations)
    }

    fn resolve(&self, property: &str, signature: &str) -> Result<TypeDescriptor, BuildError> {
        parse_signature(signature).map_err(|source| BuildError::Signature {
            entity: self.meta.name.clone(),
            property: property.to_string(),
            signature: signature.to_string(),
            source,
        })
    }

    fn field_property(&self, field: &FieldMeta) -> Result<PropertyDescriptor, BuildError> {
        let ty = self.resolve(&field.name, field.type_signature())?;

        Ok(self.describe(
            &field.name,
            ty,
            PropertyAccess::Field,
            field.annotations.clone(),
            field.has_flag(flags::FINAL),
        ))
    }

    fn method_property(&self, getter: &MethodMeta) -> Result<PropertyDescriptor, BuildError> {
        let name = getter_property_name(getter).ok_or_else(|| {
            BuildError::unsupported(
                &self.meta.name,
                format!(
                    "annotated method {}{} is not a getter",
                    getter.name, getter.descriptor
                ),
            )
        })?;

        let sig = parse_method_signature(getter.type_signature()).map_err(|source| {
            BuildError::Signature {
                entity: self.meta.name.clone(),
                property: name.clone(),
                signature: getter.type_signature().to_string(),
                source,
            }
        })?;
        let ty = sig.ret.ok_or_else(|| {
            BuildError::unsupported(&self.meta.name, format!("getter {} returns void", getter.name))
        })?;

        // the setter must take exactly the getter's erased return type
        let returned = getter.descriptor.split_once(')').map_or("", |(_, r)| r);
        let setter_descriptor = format!("({returned})V");
        let setter_name = format!("set{}", crate::names::capitalize(&name));
        let setter = self
            .meta
            .methods
            .iter()
            .find(|m| {
                m.name == setter_name
                    && m.descriptor == setter_descriptor
                    && !m.has_flag(flags::STATIC)
            })
            .map(|m| MethodRef::new(&m.name, &m.descriptor));

        let read_only = setter.is_none();
        let access = PropertyAccess::Method {
            getter: MethodRef::new(&getter.name, &getter.descriptor),
            setter,
        };

        Ok(self.describe(&name, ty, access, getter.annotations.clone(), read_only))
    }

    fn describe(
        &self,
        name: &str,
        ty: TypeDescriptor,
        access: PropertyAccess,
        annotations: Vec<AnnotationMeta>,
        is_final: bool,
    ) -> PropertyDescriptor {
        let has = |type_name: &str| annotations.iter().any(|a| a.type_name == type_name);

        let id = has(names::ID);
        let mapped_name = if id {
            ID_FIELD_NAME.to_string()
        } else {
            annotations
                .iter()
                .filter(|a| NAMING_ANNOTATIONS.contains(&a.type_name.as_str()))
                .find_map(|a| a.explicit_text("value"))
                .map_or_else(|| self.config.property_name(name), str::to_string)
        };

        let load_names = annotations
            .iter()
            .filter(|a| a.type_name == names::ALSO_LOAD)
            .flat_map(|a| a.texts("value"))
            .filter(|n| n != &mapped_name)
            .collect();

        let array = ty.is_array();
        let flags = PropertyFlags {
            transient: false,
            final_: is_final,
            reference: has(names::REFERENCE),
            array,
            map: !array && contract::is_map_type(ty.raw()),
            set: !array && contract::is_set_type(ty.raw()),
            collection: !array && contract::is_collection_type(ty.raw()),
            id,
            version: has(names::VERSION),
        };

        PropertyDescriptor {
            name: name.to_string(),
            mapped_name,
            load_names,
            type_descriptor: ty,
            access,
            annotations,
            flags,
        }
    }
}

/// `getName()` -> `name`, `isActive()Z` -> `active`.
fn getter_property_name(method: &MethodMeta) -> Option<String> {
    if !method.descriptor.starts_with("()") || method.descriptor.ends_with(")V") {
        return None;
    }

    let suffix = match method.name.strip_prefix("get") {
        Some(rest) => rest,
        None if method.descriptor == "()Z" => method.name.strip_prefix("is")?,
        None => return None,
    };

    if suffix.is_empty() || !suffix.starts_with(char::is_uppercase) {
        return None;
    }

    Some(crate::names::decapitalize(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> ClassMeta {
        ClassMeta::new("com.example.Person")
            .with_field(FieldMeta::new("name", "Ljava/lang/String;").with_flags(flags::PRIVATE))
            .with_field(
                FieldMeta::new("age", "I")
                    .with_flags(flags::PRIVATE)
                    .with_constant(Constant::Int(21)),
            )
            .with_field(FieldMeta::new("cache", "Ljava/lang/String;").with_flags(flags::TRANSIENT))
            .with_field(FieldMeta::new("COUNT", "I").with_flags(flags::STATIC))
            .with_field(
                FieldMeta::new("scratch", "I").annotate(AnnotationMeta::new(names::NOT_SAVED)),
            )
            .with_field(
                FieldMeta::new("tags", "Ljava/util/Set;")
                    .with_signature("Ljava/util/Set<Ljava/lang/String;>;"),
            )
    }

    #[test]
    fn unannotated_mode_takes_every_plain_field() {
        let config = MappingConfig::default();
        let entity = Discovery::new(&person(), &config).discover().unwrap();

        let names: Vec<_> = entity.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["name", "age", "tags"]);

        let tags = entity.property("tags").unwrap();
        assert!(tags.flags.set && tags.flags.collection && !tags.flags.map);
        assert_eq!(tags.type_descriptor.args()[0].raw(), "java.lang.String");
        assert_eq!(entity.collection_name(&config), "person");
    }

    #[test]
    fn annotated_mode_needs_provider_annotations() {
        let meta = person()
            .with_field(
                FieldMeta::new("id", "Ljava/lang/Long;").annotate(AnnotationMeta::new(names::ID)),
            )
            .with_field(
                FieldMeta::new("email", "Ljava/lang/String;")
                    .annotate(AnnotationMeta::new(names::PROPERTY).with("value", "mail"))
                    .annotate(AnnotationMeta::new(names::ALSO_LOAD).with(
                        "value",
                        AnnotationValue::Array(vec!["eMail".into(), "mail".into()]),
                    )),
            );
        let config = MappingConfig::annotated();
        let entity = Discovery::new(&meta, &config).discover().unwrap();

        let names: Vec<_> = entity.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["id", "email"]);

        let id = entity.id_property().unwrap();
        assert_eq!(id.mapped_name, ID_FIELD_NAME);

        let email = entity.property("email").unwrap();
        assert_eq!(email.mapped_name, "mail");
        assert_eq!(email.load_names, vec!["eMail".to_string()]);
    }

    #[test]
    fn id_name_beats_explicit_names() {
        let meta = ClassMeta::new("com.example.Doc").with_field(
            FieldMeta::new("key", "Ljava/lang/String;")
                .annotate(AnnotationMeta::new(names::ID))
                .annotate(AnnotationMeta::new(names::PROPERTY).with("value", "k")),
        );
        let entity = Discovery::new(&meta, &MappingConfig::annotated())
            .discover()
            .unwrap();

        assert_eq!(entity.properties[0].mapped_name, "_id");
    }

    #[test]
    fn annotated_getters_pair_with_setters() {
        let meta = ClassMeta::new("com.example.Account")
            .with_method(
                MethodMeta::new("getOwner", "()Ljava/lang/String;")
                    .annotate(AnnotationMeta::new(names::PROPERTY)),
            )
            .with_method(MethodMeta::new("setOwner", "(Ljava/lang/String;)V"))
            .with_method(
                MethodMeta::new("isActive", "()Z").annotate(AnnotationMeta::new(names::PROPERTY)),
            )
            .with_method(MethodMeta::new("setActive", "(Ljava/lang/Boolean;)V"));
        let entity = Discovery::new(&meta, &MappingConfig::annotated())
            .discover()
            .unwrap();

        let owner = entity.property("owner").unwrap();
        match &owner.access {
            PropertyAccess::Method { getter, setter } => {
                assert_eq!(getter.name, "getOwner");
                assert_eq!(setter.as_ref().unwrap().name, "setOwner");
            }
            PropertyAccess::Field => panic!("expected method access"),
        }
        assert!(!owner.flags.final_);

        // setter parameter type differs from the getter's return type
        let active = entity.property("active").unwrap();
        assert!(active.access.is_read_only());
        assert!(active.flags.final_);
    }

    #[test]
    fn annotated_non_getters_fail_loudly() {
        let meta = ClassMeta::new("com.example.Bad").with_method(
            MethodMeta::new("compute", "(I)I").annotate(AnnotationMeta::new(names::PROPERTY)),
        );
        let err = Discovery::new(&meta, &MappingConfig::annotated())
            .discover()
            .unwrap_err();

        assert!(err.is_unsupported());
    }

    #[test]
    fn bad_signatures_name_the_property() {
        let meta = ClassMeta::new("com.example.Bad")
            .with_field(FieldMeta::new("broken", "Ljava/util/List;").with_signature("Ljava/util/List<"));
        let err = Discovery::new(&meta, &MappingConfig::default())
            .discover()
            .unwrap_err();

        assert!(matches!(err, BuildError::Signature { ref property, .. } if property == "broken"));
    }
}
