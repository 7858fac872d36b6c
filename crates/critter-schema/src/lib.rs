//! Input side of critter: compiled type metadata, annotations, type
//! descriptors, property/entity descriptors and the mapping configuration.
//!
//! Nothing in this crate executes generated code. It describes *what exists*
//! on the entity types handed to the build; `critter-core` defines *what runs*.

pub mod annotation;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod meta;
pub mod types;

use thiserror::Error as ThisError;

/// Reserved document field name for identity properties.
pub const ID_FIELD_NAME: &str = "_id";

/// Sentinel used by annotation elements to mean "not set".
pub const IGNORED_FIELDNAME: &str = ".";

/// Default document key that stores the discriminator value.
pub const DEFAULT_DISCRIMINATOR_KEY: &str = "_t";

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        annotation::{AnnotationMeta, AnnotationValue},
        config::{DiscriminatorFunction, MappingConfig, NamingStrategy},
        descriptor::{EntityDescriptor, PropertyAccess, PropertyDescriptor, PropertyFlags},
        err,
        error::ErrorTree,
        meta::{ClassMeta, Constant, FieldMeta, MethodMeta, flags},
        types::{Bound, Primitive, TypeDescriptor, TypeKind},
    };
    pub use serde::{Deserialize, Serialize};
}

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Meta(#[from] meta::MetaError),

    #[error(transparent)]
    Signature(#[from] types::SignatureError),
}
