use crate::{accessor::AccessorShape, error::BuildError};
use critter_core::{
    class::{ClassKind, ClassWriter},
    contract::{self, accessor},
    registry::GeneratedClassRecord,
};
use critter_schema::prelude::*;

// Raw emission: opcodes and pool indices are written as they are chosen.
pub(super) fn generate(shape: &AccessorShape<'_>) -> Result<GeneratedClassRecord, BuildError> {
    let entity = shape.entity;
    let (reader, reader_desc) = shape.reader();
    let (writer, writer_desc) = shape.writer();

    let mut w = ClassWriter::new(&shape.class, ClassKind::Accessor, flags::PUBLIC | flags::FINAL);
    w.set_super(contract::OBJECT)
        .set_signature(&shape.signature)
        .add_interface(contract::ACCESSOR);

    w.method(contract::CONSTRUCTOR, contract::NO_ARG_CONSTRUCTOR, flags::PUBLIC, 1)
        .ret_void();

    {
        let mut m = w.method(accessor::GET.name, accessor::GET.descriptor, flags::PUBLIC, 2);
        m.load(1)
            .check_cast(entity)
            .invoke(entity, &reader, &reader_desc);
        if let Some(p) = shape.ty.primitive_type() {
            m.box_value(p);
        }
        m.ret();
    }

    {
        let mut m = w.method(accessor::SET.name, accessor::SET.descriptor, flags::PUBLIC, 3);
        m.load(1).check_cast(entity).load(2);
        match shape.ty.primitive_type() {
            Some(p) => m.unbox_value(p),
            None => m.check_cast(&shape.ty.cast_name()),
        };
        m.invoke(entity, &writer, &writer_desc).ret_void();
    }

    Ok(GeneratedClassRecord::new(shape.class.clone(), w.to_bytes()?))
}
