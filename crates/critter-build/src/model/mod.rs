//! Property and entity model generation.

mod entity;
mod property;

pub use entity::EntityModelGenerator;
pub use property::PropertyModelGenerator;

use crate::error::BuildError;
use critter_core::{annotation::AnnotationRegistry, class::CodeBuilder, contract};
use critter_schema::prelude::*;

/// Annotations a generated model replays: the registered ones, each checked
/// against its builder up front so a bad element fails the build rather
/// than the constructor.
pub(crate) fn replayable<'a>(
    entity: &str,
    registry: &AnnotationRegistry,
    annotations: &'a [AnnotationMeta],
) -> Result<Vec<&'a AnnotationMeta>, BuildError> {
    let mut out = Vec::new();

    for annotation in annotations {
        if !registry.contains(&annotation.type_name) {
            log::trace!("{entity}: no builder for {}, not replayed", annotation.type_name);
            continue;
        }
        registry.complete(annotation)?;
        out.push(annotation);
    }

    Ok(out)
}

/// Emit the constructor prologue that resets the annotation list and then
/// replays each annotation element by element.
pub(crate) fn replay_annotations(
    c: &mut CodeBuilder,
    entity: &str,
    class: &str,
    annotations: &[&AnnotationMeta],
) -> Result<(), BuildError> {
    c.load_this()
        .new_list(0)
        .put_field(class, contract::ANNOTATIONS_FIELD);

    for annotation in annotations {
        c.load_this().annotation_begin(&annotation.type_name);
        for (element, value) in &annotation.values {
            push_annotation_value(c, entity, value)?;
            c.annotation_set(element);
        }
        c.annotation_end();
    }

    Ok(())
}

fn push_annotation_value(
    c: &mut CodeBuilder,
    entity: &str,
    value: &AnnotationValue,
) -> Result<(), BuildError> {
    match value {
        AnnotationValue::Bool(v) => {
            c.push_bool(*v);
        }
        AnnotationValue::Int(v) => {
            c.ldc(Constant::Int(*v));
        }
        AnnotationValue::Long(v) => {
            c.ldc(Constant::Long(*v));
        }
        AnnotationValue::Double(v) => {
            c.ldc(Constant::Double(*v));
        }
        AnnotationValue::Text(v) => {
            c.ldc_text(v.clone());
        }
        AnnotationValue::Enum { type_name, variant } => {
            c.new_enum(type_name, variant);
        }
        AnnotationValue::Class(name) => {
            c.type_data(&TypeDescriptor::class(name))?;
        }
        AnnotationValue::Array(items) => {
            let len = u16::try_from(items.len()).map_err(|_| {
                BuildError::unsupported(entity, "annotation array has too many elements")
            })?;
            for item in items {
                push_annotation_value(c, entity, item)?;
            }
            c.new_list(len);
        }
        AnnotationValue::Annotation(nested) => {
            return Err(BuildError::unsupported(
                entity,
                format!(
                    "nested annotation {} cannot be replayed",
                    nested.type_name
                ),
            ));
        }
    }

    Ok(())
}
