//! ## Crate layout
//! - `schema`: compiled metadata, annotations, type descriptors and the
//!   mapping configuration.
//! - `core`: class bodies, the class registry, the interpreter and the model
//!   contracts.
//! - `build`: property discovery, accessor and model generation, and the
//!   [`Critter`] facade.
//!
//! Most builds only need the `prelude`.

pub use critter_build as build;
pub use critter_core as core;
pub use critter_schema as schema;

pub use build::{BuildError, Critter, GenerationMode};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::build::prelude::*;
    pub use crate::core::prelude::*;
    pub use crate::schema::prelude::*;
}
