use crate::{DEFAULT_DISCRIMINATOR_KEY, annotation::names, meta::simple_name, prelude::*};
use convert_case::{Case, Casing};
use std::{fs, path::Path};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("cannot read mapping config '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid mapping config: {0}")]
    Toml(#[from] toml::de::Error),
}

///
/// NamingStrategy
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[remain::sorted]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    CamelCase,
    #[default]
    Identity,
    KebabCase,
    LowerCase,
    PascalCase,
    SnakeCase,
}

impl NamingStrategy {
    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::CamelCase => name.to_case(Case::Camel),
            Self::Identity => name.to_string(),
            Self::KebabCase => name.to_case(Case::Kebab),
            Self::LowerCase => name.to_case(Case::Flat),
            Self::PascalCase => name.to_case(Case::Pascal),
            Self::SnakeCase => name.to_case(Case::Snake),
        }
    }
}

///
/// DiscriminatorFunction
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[remain::sorted]
#[serde(rename_all = "snake_case")]
pub enum DiscriminatorFunction {
    ClassName,
    LowerClassName,
    LowerSimpleName,
    #[default]
    SimpleName,
}

impl DiscriminatorFunction {
    /// Discriminator value for a qualified class name.
    #[must_use]
    pub fn apply(self, qualified: &str) -> String {
        match self {
            Self::ClassName => qualified.to_string(),
            Self::LowerClassName => qualified.to_lowercase(),
            Self::LowerSimpleName => simple_name(qualified).to_lowercase(),
            Self::SimpleName => simple_name(qualified).to_string(),
        }
    }
}

///
/// MappingConfig
///
/// Load-once mapping policy. Shared by reference (`Arc<MappingConfig>`) with
/// every generation pass and every generated entity model constructor.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct MappingConfig {
    pub discriminator: DiscriminatorFunction,
    pub discriminator_key: String,
    pub collection_naming: NamingStrategy,
    pub property_naming: NamingStrategy,

    /// Property-provider annotation types; empty means unannotated mode.
    pub property_annotations: Vec<String>,
    pub transient_annotations: Vec<String>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            discriminator: DiscriminatorFunction::default(),
            discriminator_key: DEFAULT_DISCRIMINATOR_KEY.to_string(),
            collection_naming: NamingStrategy::CamelCase,
            property_naming: NamingStrategy::Identity,
            property_annotations: Vec::new(),
            transient_annotations: vec![
                names::TRANSIENT.to_string(),
                names::NOT_SAVED.to_string(),
                names::BEANS_TRANSIENT.to_string(),
            ],
        }
    }
}

impl MappingConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&s)
    }

    /// Annotated mode with the library's own property-provider annotations.
    #[must_use]
    pub fn annotated() -> Self {
        Self {
            property_annotations: vec![
                names::ID.to_string(),
                names::PROPERTY.to_string(),
                names::REFERENCE.to_string(),
                names::VERSION.to_string(),
            ],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn collection_name(&self, simple_name: &str) -> String {
        self.collection_naming.apply(simple_name)
    }

    #[must_use]
    pub fn property_name(&self, name: &str) -> String {
        self.property_naming.apply(name)
    }

    #[must_use]
    pub fn discriminator(&self, qualified: &str) -> String {
        self.discriminator.apply(qualified)
    }

    #[must_use]
    pub fn discriminator_key(&self) -> &str {
        &self.discriminator_key
    }

    #[must_use]
    pub fn is_annotated_mode(&self) -> bool {
        !self.property_annotations.is_empty()
    }

    #[must_use]
    pub fn is_property_annotation(&self, type_name: &str) -> bool {
        self.property_annotations.iter().any(|a| a == type_name)
    }

    #[must_use]
    pub fn is_transient_annotation(&self, type_name: &str) -> bool {
        self.transient_annotations.iter().any(|a| a == type_name)
    }
}
