//! Entity class compilation.
//!
//! Turns compiled metadata into a class body the interpreter can run:
//! declared fields keep their initializers, convention getters and setters
//! that front a declared field get real bodies, and everything else throws
//! when called. Self-contained passes also inject one synthetic reader and
//! writer per field property, which the direct accessor backends call.

use crate::{error::BuildError, names};
use critter_core::{
    class::{ClassBody, ClassBuilder, ClassKind},
    contract,
};
use critter_schema::prelude::*;

const SYNTHETIC_FLAGS: u16 = flags::PUBLIC | flags::SYNTHETIC;

///
/// FieldRole
///
/// What a compiled method does with the field it fronts.
///

enum FieldRole<'a> {
    Read(&'a FieldMeta),
    Write(&'a FieldMeta),
}

fn instance_field<'a>(meta: &'a ClassMeta, property: &str) -> Option<&'a FieldMeta> {
    meta.fields
        .iter()
        .find(|f| f.name == property && !f.has_flag(flags::STATIC))
}

// Matches `getX()T` / `isX()Z` / `setX(T)V` against a declared field `x`.
fn field_role<'a>(meta: &'a ClassMeta, method: &MethodMeta) -> Option<FieldRole<'a>> {
    if method.has_flag(flags::STATIC) || method.has_flag(flags::ABSTRACT) {
        return None;
    }

    let lookup = |suffix: &str| {
        (!suffix.is_empty())
            .then(|| instance_field(meta, &names::decapitalize(suffix)))
            .flatten()
    };

    if let Some(suffix) = method.name.strip_prefix("set") {
        return lookup(suffix)
            .filter(|f| method.descriptor == format!("({})V", f.descriptor))
            .map(FieldRole::Write);
    }

    let suffix = method
        .name
        .strip_prefix("get")
        .or_else(|| method.name.strip_prefix("is"))?;

    lookup(suffix)
        .filter(|f| method.descriptor == format!("(){}", f.descriptor))
        .map(FieldRole::Read)
}

///
/// EntityCompiler
///

pub struct EntityCompiler<'a> {
    meta: &'a ClassMeta,
    entity: &'a EntityDescriptor,
}

impl<'a> EntityCompiler<'a> {
    #[must_use]
    pub const fn new(meta: &'a ClassMeta, entity: &'a EntityDescriptor) -> Self {
        Self { meta, entity }
    }

    /// The entity exactly as declared; nothing is injected.
    #[must_use]
    pub fn compile(&self) -> ClassBody {
        self.declared().build()
    }

    /// The entity plus `__read_<prop>` / `__write_<prop>` for every field
    /// property. Getter-backed properties have no field to front and are
    /// rejected.
    pub fn compile_augmented(&self) -> Result<ClassBody, BuildError> {
        let mut builder = self.declared();
        let name = self.meta.name.as_str();

        for property in &self.entity.properties {
            if !property.access.is_field() {
                return Err(BuildError::unsupported(
                    name,
                    format!(
                        "property '{}' is getter-backed; only resolved-reference accessors support it",
                        property.name
                    ),
                ));
            }

            let descriptor = property.type_descriptor.erased_descriptor();
            builder = builder
                .method(
                    names::reader_method(&property.name),
                    format!("(){descriptor}"),
                    SYNTHETIC_FLAGS,
                    |c| {
                        c.load_this().get_field(name, &property.name).ret();
                    },
                )
                .method(
                    names::writer_method(&property.name),
                    format!("({descriptor})V"),
                    SYNTHETIC_FLAGS,
                    |c| {
                        c.load_this()
                            .load(1)
                            .put_field(name, &property.name)
                            .ret_void();
                    },
                );
        }

        log::debug!(
            "augmented {name} with {} synthetic accessors",
            self.entity.properties.len() * 2
        );

        Ok(builder.build())
    }

    fn declared(&self) -> ClassBuilder {
        let meta = self.meta;
        let name = meta.name.as_str();

        let mut builder = ClassBuilder::new(name, ClassKind::Entity)
            .flags(meta.flags)
            .extends(meta.super_name.as_deref().unwrap_or(contract::OBJECT));
        if let Some(signature) = &meta.signature {
            builder = builder.signature(signature);
        }

        for field in &meta.fields {
            builder = builder.field_with_initial(
                &field.name,
                &field.descriptor,
                field.flags,
                field.constant.clone(),
            );
        }

        for method in &meta.methods {
            if method.name == "<clinit>" {
                continue;
            }

            builder = match (method.name.as_str(), field_role(meta, method)) {
                (contract::CONSTRUCTOR, _) if method.descriptor == contract::NO_ARG_CONSTRUCTOR => {
                    builder.method(&method.name, &method.descriptor, method.flags, |c| {
                        c.ret_void();
                    })
                }
                (_, Some(FieldRole::Read(field))) => {
                    builder.method(&method.name, &method.descriptor, method.flags, |c| {
                        c.load_this().get_field(name, &field.name).ret();
                    })
                }
                (_, Some(FieldRole::Write(field))) => {
                    builder.method(&method.name, &method.descriptor, method.flags, |c| {
                        c.load_this()
                            .load(1)
                            .put_field(name, &field.name)
                            .ret_void();
                    })
                }
                _ => builder.method(&method.name, &method.descriptor, method.flags, |c| {
                    c.throw(format!(
                        "{name}.{}{} has no compiled body",
                        method.name, method.descriptor
                    ));
                }),
            };
        }

        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::Discovery;

    fn meta() -> ClassMeta {
        ClassMeta::new("com.example.Person")
            .with_field(
                FieldMeta::new("age", "I")
                    .with_flags(flags::PRIVATE)
                    .with_constant(Constant::Int(21)),
            )
            .with_method(MethodMeta::new("<init>", "()V"))
            .with_method(MethodMeta::new("getAge", "()I"))
            .with_method(MethodMeta::new("setAge", "(I)V"))
            .with_method(MethodMeta::new("setAge", "(J)V"))
            .with_method(MethodMeta::new("describe", "()Ljava/lang/String;"))
    }

    #[test]
    fn convention_methods_get_bodies() {
        let meta = meta();
        let entity = Discovery::new(&meta, &MappingConfig::default())
            .discover()
            .unwrap();
        let body = EntityCompiler::new(&meta, &entity).compile();

        assert_eq!(body.field("age").unwrap().initial, Some(Constant::Int(21)));
        assert_eq!(body.super_name.as_deref(), Some(contract::OBJECT));
        assert!(body.method("__read_age", "()I").is_none());

        let getter = body.method("getAge", "()I").unwrap();
        assert!(!getter.code.iter().any(|i| matches!(i, critter_core::class::Instr::Throw(_))));

        for (name, desc) in [("setAge", "(J)V"), ("describe", "()Ljava/lang/String;")] {
            let method = body.method(name, desc).unwrap();
            assert!(matches!(method.code[0], critter_core::class::Instr::Throw(_)));
        }
    }

    #[test]
    fn augmentation_adds_reader_and_writer_per_field() {
        let meta = meta();
        let entity = Discovery::new(&meta, &MappingConfig::default())
            .discover()
            .unwrap();
        let body = EntityCompiler::new(&meta, &entity).compile_augmented().unwrap();

        assert!(body.method("__read_age", "()I").is_some());
        assert!(body.method("__write_age", "(I)V").is_some());
        assert!(body.encode().is_ok());
    }
}
