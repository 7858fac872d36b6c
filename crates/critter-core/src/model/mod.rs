//! Contracts the mapping runtime programs against.
//!
//! Three families implement them: handles over generated classes running in
//! the [`Vm`](crate::vm::Vm), a reflective reference built straight from
//! descriptors, and static tables emitted as Rust source.

mod generated;
mod reflective;
mod snapshot;
mod static_model;

pub use generated::{GeneratedAccessor, GeneratedEntityModel, GeneratedPropertyModel};
pub use reflective::{ReflectiveAccessor, ReflectiveEntityModel, ReflectivePropertyModel};
pub use snapshot::{EntitySnapshot, PropertySnapshot};
pub use static_model::{StaticEntityModel, StaticPropertyModel};

use crate::{error::InternalError, value::Value, vm::ObjectRef};
use critter_schema::prelude::*;
use std::sync::Arc;

///
/// PropertyAccessor
///
/// Uniform get/set over one property of one entity type. Values cross this
/// boundary boxed.
///

pub trait PropertyAccessor: Send + Sync {
    fn get(&self, instance: &ObjectRef) -> Result<Value, InternalError>;

    fn set(&self, instance: &ObjectRef, value: Value) -> Result<(), InternalError>;
}

///
/// PropertyModel
///

pub trait PropertyModel: Send + Sync {
    fn name(&self) -> Result<String, InternalError>;

    /// `entity#property`
    fn full_name(&self) -> Result<String, InternalError>;

    fn mapped_name(&self) -> Result<String, InternalError>;

    /// Alternate document keys accepted on load.
    fn load_names(&self) -> Result<Vec<String>, InternalError>;

    fn type_descriptor(&self) -> Result<TypeDescriptor, InternalError>;

    fn is_array(&self) -> Result<bool, InternalError>;

    fn is_map(&self) -> Result<bool, InternalError>;

    fn is_set(&self) -> Result<bool, InternalError>;

    fn is_collection(&self) -> Result<bool, InternalError>;

    fn is_final(&self) -> Result<bool, InternalError>;

    fn is_transient(&self) -> Result<bool, InternalError>;

    fn is_reference(&self) -> Result<bool, InternalError>;

    fn is_id(&self) -> Result<bool, InternalError>;

    fn is_version(&self) -> Result<bool, InternalError>;

    fn annotations(&self) -> Result<Vec<AnnotationMeta>, InternalError>;

    fn accessor(&self) -> Result<Arc<dyn PropertyAccessor>, InternalError>;

    fn is_multiple_values(&self) -> Result<bool, InternalError> {
        Ok(self.is_array()? || self.is_map()? || self.is_collection()?)
    }

    fn annotation(&self, type_name: &str) -> Result<Option<AnnotationMeta>, InternalError> {
        Ok(self
            .annotations()?
            .into_iter()
            .find(|a| a.type_name == type_name))
    }
}

///
/// EntityModel
///

pub trait EntityModel: Send + Sync {
    fn name(&self) -> Result<String, InternalError>;

    fn simple_name(&self) -> Result<String, InternalError>;

    fn collection_name(&self) -> Result<String, InternalError>;

    fn discriminator(&self) -> Result<String, InternalError>;

    fn discriminator_key(&self) -> Result<String, InternalError>;

    fn use_discriminator(&self) -> Result<bool, InternalError>;

    fn is_abstract(&self) -> Result<bool, InternalError>;

    fn is_interface(&self) -> Result<bool, InternalError>;

    fn is_embedded(&self) -> Result<bool, InternalError>;

    fn type_descriptor(&self) -> Result<TypeDescriptor, InternalError>;

    fn annotations(&self) -> Result<Vec<AnnotationMeta>, InternalError>;

    fn properties(&self) -> Result<Vec<Arc<dyn PropertyModel>>, InternalError>;

    fn property(&self, name: &str) -> Result<Option<Arc<dyn PropertyModel>>, InternalError> {
        for property in self.properties()? {
            if property.name()? == name {
                return Ok(Some(property));
            }
        }

        Ok(None)
    }

    fn id_property(&self) -> Result<Option<Arc<dyn PropertyModel>>, InternalError> {
        for property in self.properties()? {
            if property.is_id()? {
                return Ok(Some(property));
            }
        }

        Ok(None)
    }
}
