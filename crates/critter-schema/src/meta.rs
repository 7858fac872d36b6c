//! Compiled type metadata handed to the build by a metadata provider.
//!
//! Shapes follow a compiled class file: member lists with JVM descriptors,
//! optional generic signatures, access flags and annotation tables. Class
//! names are always dotted (`com.example.Person`).

use crate::{annotation::AnnotationMeta, prelude::*};
use std::{fmt, fs, path::Path};
use thiserror::Error as ThisError;

///
/// Access flags
///
/// One flag space shared by classes, fields and methods.
///

pub mod flags {
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const PROTECTED: u16 = 0x0004;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const TRANSIENT: u16 = 0x0020;
    pub const SYNTHETIC: u16 = 0x0040;
    pub const BRIDGE: u16 = 0x0080;
    pub const ABSTRACT: u16 = 0x0100;
    pub const INTERFACE: u16 = 0x0200;
}

///
/// MetaError
///

#[derive(Debug, ThisError)]
pub enum MetaError {
    #[error("invalid class metadata: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read class metadata '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

///
/// Constant
///
/// A field initializer or pooled literal. Narrow integral types (boolean,
/// byte, char, short) travel as `Int` and are narrowed by the field descriptor.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Constant {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Text(String),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "int {v}"),
            Self::Long(v) => write!(f, "long {v}"),
            Self::Float(v) => write!(f, "float {v}"),
            Self::Double(v) => write!(f, "double {v}"),
            Self::Text(v) => write!(f, "utf8 {v:?}"),
        }
    }
}

///
/// ClassMeta
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ClassMeta {
    pub name: String,

    #[serde(default)]
    pub flags: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,

    #[serde(default)]
    pub fields: Vec<FieldMeta>,

    #[serde(default)]
    pub methods: Vec<MethodMeta>,

    #[serde(default)]
    pub annotations: Vec<AnnotationMeta>,
}

impl ClassMeta {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: flags::PUBLIC,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, MetaError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MetaError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| MetaError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_json_str(&json)
    }

    #[must_use]
    pub fn with_flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldMeta) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: MethodMeta) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub fn annotate(mut self, annotation: AnnotationMeta) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Last dotted segment of the qualified name.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    /// Everything before the last dot, empty for the default package.
    #[must_use]
    pub fn package(&self) -> &str {
        package_name(&self.name)
    }

    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.flags & flags::ABSTRACT != 0
    }

    #[must_use]
    pub const fn is_interface(&self) -> bool {
        self.flags & flags::INTERFACE != 0
    }

    #[must_use]
    pub fn annotation(&self, type_name: &str) -> Option<&AnnotationMeta> {
        find_annotation(&self.annotations, type_name)
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name)
    }
}

///
/// FieldMeta
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct FieldMeta {
    pub name: String,
    pub descriptor: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,

    #[serde(default)]
    pub flags: u16,

    #[serde(default)]
    pub annotations: Vec<AnnotationMeta>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<Constant>,
}

impl FieldMeta {
    #[must_use]
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
            flags: flags::PRIVATE,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_constant(mut self, constant: Constant) -> Self {
        self.constant = Some(constant);
        self
    }

    #[must_use]
    pub fn annotate(mut self, annotation: AnnotationMeta) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Generic signature when present, erased descriptor otherwise.
    #[must_use]
    pub fn type_signature(&self) -> &str {
        self.signature.as_deref().unwrap_or(&self.descriptor)
    }

    #[must_use]
    pub const fn has_flag(&self, flag: u16) -> bool {
        self.flags & flag != 0
    }

    #[must_use]
    pub fn annotation(&self, type_name: &str) -> Option<&AnnotationMeta> {
        find_annotation(&self.annotations, type_name)
    }
}

///
/// MethodMeta
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct MethodMeta {
    pub name: String,
    pub descriptor: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,

    #[serde(default)]
    pub flags: u16,

    #[serde(default)]
    pub annotations: Vec<AnnotationMeta>,
}

impl MethodMeta {
    #[must_use]
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
            flags: flags::PUBLIC,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn annotate(mut self, annotation: AnnotationMeta) -> Self {
        self.annotations.push(annotation);
        self
    }

    #[must_use]
    pub fn type_signature(&self) -> &str {
        self.signature.as_deref().unwrap_or(&self.descriptor)
    }

    #[must_use]
    pub const fn has_flag(&self, flag: u16) -> bool {
        self.flags & flag != 0
    }

    #[must_use]
    pub fn annotation(&self, type_name: &str) -> Option<&AnnotationMeta> {
        find_annotation(&self.annotations, type_name)
    }
}

fn find_annotation<'a>(list: &'a [AnnotationMeta], type_name: &str) -> Option<&'a AnnotationMeta> {
    list.iter().find(|a| a.type_name == type_name)
}

/// Last dotted segment of a qualified class name.
#[must_use]
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit_once('.').map_or(qualified, |(_, simple)| simple)
}

/// Package part of a qualified class name, empty for the default package.
#[must_use]
pub fn package_name(qualified: &str) -> &str {
    qualified.rsplit_once('.').map_or("", |(package, _)| package)
}
