use crate::{accessor::AccessorShape, error::BuildError};
use critter_core::{
    class::{ClassBuilder, ClassKind},
    contract::{self, accessor},
    registry::GeneratedClassRecord,
};
use critter_schema::prelude::*;

pub(super) fn generate(shape: &AccessorShape<'_>) -> Result<GeneratedClassRecord, BuildError> {
    let entity = shape.entity;
    let ty = shape.ty;
    let (reader, reader_desc) = shape.reader();
    let (writer, writer_desc) = shape.writer();

    let body = ClassBuilder::new(&shape.class, ClassKind::Accessor)
        .flags(flags::PUBLIC | flags::FINAL)
        .extends(contract::OBJECT)
        .signature(&shape.signature)
        .implements(contract::ACCESSOR)
        .method(
            contract::CONSTRUCTOR,
            contract::NO_ARG_CONSTRUCTOR,
            flags::PUBLIC,
            |c| {
                c.ret_void();
            },
        )
        .member(accessor::GET, |c| {
            c.load(1).check_cast(entity).invoke(entity, reader, reader_desc);
            if let Some(p) = ty.primitive_type() {
                c.box_value(p);
            }
            c.ret();
        })
        .member(accessor::SET, |c| {
            c.load(1).check_cast(entity).load(2);
            match ty.primitive_type() {
                Some(p) => c.unbox_value(p),
                None => c.check_cast(ty.cast_name()),
            };
            c.invoke(entity, writer, writer_desc).ret_void();
        })
        .build();

    Ok(GeneratedClassRecord::from_body(&body)?)
}
