//! Build side of critter.
//!
//! Turns compiled entity metadata into registered classes: the entity class
//! itself, one accessor and one property model per property, and one entity
//! model. [`Critter`] runs the whole pipeline; the pieces are public for
//! builds that need only some of them.

pub mod accessor;
pub mod augment;
pub mod discovery;
pub mod error;
pub mod generator;
pub mod model;
pub mod names;
pub mod source;

pub use error::BuildError;
pub use generator::{Critter, GeneratedEntity, GenerationMode, GenerationReport};

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        accessor::Backend,
        discovery::Discovery,
        error::BuildError,
        generator::{Critter, GeneratedEntity, GenerationMode, GenerationReport},
        source::{EmittedSource, SourceEmitter},
    };
}
