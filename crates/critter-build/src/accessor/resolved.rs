use crate::{accessor::AccessorShape, error::BuildError};
use critter_core::{
    class::{ClassBuilder, ClassKind, CodeBuilder},
    contract::{self, accessor},
    registry::GeneratedClassRecord,
};
use critter_schema::prelude::*;

const FIELD_HANDLE: &str = "$field";
const GETTER_HANDLE: &str = "$getter";
const SETTER_HANDLE: &str = "$setter";

const HANDLE_FLAGS: u16 = flags::PRIVATE | flags::FINAL;

// Boxed value in local 2 checked against the property type.
fn checked_value(c: &mut CodeBuilder, ty: &TypeDescriptor) {
    c.load(2);
    match ty.primitive_type() {
        Some(p) => c.unbox_value(p),
        None => c.check_cast(ty.cast_name()),
    };
}

pub(super) fn generate(shape: &AccessorShape<'_>) -> Result<GeneratedClassRecord, BuildError> {
    let class = shape.class.as_str();
    let entity = shape.entity;
    let property = shape.name();
    let ty = shape.ty;

    // field access reads and writes through one handle
    let (get_handle, set_handle) = match &shape.property.access {
        PropertyAccess::Field => (FIELD_HANDLE, Some(FIELD_HANDLE)),
        PropertyAccess::Method { setter, .. } => {
            (GETTER_HANDLE, Some(SETTER_HANDLE).filter(|_| setter.is_some()))
        }
    };

    let mut builder = ClassBuilder::new(class, ClassKind::Accessor)
        .flags(flags::PUBLIC | flags::FINAL)
        .extends(contract::OBJECT)
        .signature(&shape.signature)
        .implements(contract::ACCESSOR);

    builder = match &shape.property.access {
        PropertyAccess::Field => builder.field(FIELD_HANDLE, contract::HANDLE_DESCRIPTOR, HANDLE_FLAGS),
        PropertyAccess::Method { .. } => builder
            .field(GETTER_HANDLE, contract::HANDLE_DESCRIPTOR, HANDLE_FLAGS)
            .field(SETTER_HANDLE, contract::HANDLE_DESCRIPTOR, HANDLE_FLAGS),
    };

    // every lookup happens once, here
    builder = builder.method(
        contract::CONSTRUCTOR,
        contract::NO_ARG_CONSTRUCTOR,
        flags::PUBLIC,
        |c| {
            match &shape.property.access {
                PropertyAccess::Field => {
                    c.load_this()
                        .resolve_field(entity, property)
                        .put_field(class, FIELD_HANDLE);
                }
                PropertyAccess::Method { getter, setter } => {
                    c.load_this()
                        .resolve_method(entity, &getter.name, &getter.descriptor, true)
                        .put_field(class, GETTER_HANDLE)
                        .load_this();
                    match setter {
                        Some(setter) => c.resolve_method(entity, &setter.name, &setter.descriptor, true),
                        None => c.push_null(),
                    };
                    c.put_field(class, SETTER_HANDLE);
                }
            }
            c.ret_void();
        },
    );

    let body = builder
        .member(accessor::GET, |c| {
            c.load_this()
                .get_field(class, get_handle)
                .load(1)
                .check_cast(entity)
                .handle_get();
            if let Some(p) = ty.primitive_type() {
                c.box_value(p);
            }
            c.ret();
        })
        .member(accessor::SET, |c| match set_handle {
            Some(handle) => {
                c.load_this().get_field(class, handle).load(1).check_cast(entity);
                checked_value(c, ty);
                c.handle_set(entity, property).ret_void();
            }
            // the null setter handle makes HANDLE_SET report the property as read-only
            None => {
                c.load_this()
                    .get_field(class, SETTER_HANDLE)
                    .load(1)
                    .check_cast(entity)
                    .load(2)
                    .handle_set(entity, property)
                    .ret_void();
            }
        })
        .build();

    Ok(GeneratedClassRecord::from_body(&body)?)
}
