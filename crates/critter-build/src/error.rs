use critter_core::error::{FormatError, InternalError};
use critter_schema::{error::ErrorTree, types::SignatureError};
use thiserror::Error as ThisError;

///
/// BuildError
///
/// Failure of one entity's generation pass. Multi-entity runs collect these
/// per entity instead of stopping at the first.
///

#[derive(Debug, ThisError)]
pub enum BuildError {
    #[error("{entity}: {message}")]
    Unsupported { entity: String, message: String },

    #[error("{entity}#{property}: bad type signature '{signature}': {source}")]
    Signature {
        entity: String,
        property: String,
        signature: String,
        source: SignatureError,
    },

    #[error("{entity} failed validation:\n{errors}")]
    Invalid { entity: String, errors: ErrorTree },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Internal(#[from] InternalError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("emitted source for {entity} does not parse: {message}")]
    Source { entity: String, message: String },

    #[error("{entity}: generation panicked: {message}")]
    Panicked { entity: String, message: String },
}

impl BuildError {
    pub fn unsupported(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unsupported {
            entity: entity.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}
