//! Runtime side of critter.
//!
//! Generated accessors and models are encoded as class bodies, held by the
//! [`ClassRegistry`](registry::ClassRegistry) and executed by the
//! [`Vm`](vm::Vm). The [`model`] contracts are what a mapping runtime codes
//! against, whichever implementation sits behind them.

pub mod annotation;
pub mod class;
pub mod contract;
pub mod error;
pub mod model;
pub mod registry;
pub mod value;
pub mod vm;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        annotation::{AnnotationBuilder, AnnotationRegistry},
        class::{ClassBody, ClassBuilder, ClassKind},
        error::{ErrorClass, ErrorOrigin, InternalError},
        model::{
            EntityModel, EntitySnapshot, GeneratedEntityModel, PropertyAccessor, PropertyModel,
            PropertySnapshot, ReflectiveEntityModel, StaticEntityModel, StaticPropertyModel,
        },
        registry::{ClassRegistry, GeneratedClassRecord, Registration},
        value::Value,
        vm::{ObjectRef, Vm},
    };
}
