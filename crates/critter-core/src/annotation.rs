//! Typed annotation builders. Generated model constructors replay each
//! captured annotation element by element; the builder for that annotation
//! kind checks every value and fills in the defaults the use site left out.

use crate::{error::InternalError, value::Value};
use critter_schema::{IGNORED_FIELDNAME, annotation::names, prelude::*};
use std::collections::BTreeMap;

///
/// ElementKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ElementKind {
    Any,
    Bool,
    Class,
    Double,
    Enum,
    Int,
    Long,
    Text,
    TextArray,
}

impl ElementKind {
    // Accepts `value` as this kind, widening where the element type allows.
    fn coerce(self, value: AnnotationValue) -> Option<AnnotationValue> {
        match (self, value) {
            (Self::Any, v) => Some(v),
            (Self::Bool, v @ AnnotationValue::Bool(_))
            | (Self::Double, v @ AnnotationValue::Double(_))
            | (Self::Enum, v @ AnnotationValue::Enum { .. })
            | (Self::Int, v @ AnnotationValue::Int(_))
            | (Self::Long, v @ AnnotationValue::Long(_))
            | (Self::Text, v @ AnnotationValue::Text(_))
            | (Self::Class, v @ AnnotationValue::Class(_)) => Some(v),
            (Self::Long, AnnotationValue::Int(i)) => Some(AnnotationValue::Long(i64::from(i))),
            (Self::Double, AnnotationValue::Int(i)) => Some(AnnotationValue::Double(f64::from(i))),
            (Self::Class, AnnotationValue::Text(s)) => Some(AnnotationValue::Class(s)),
            (Self::TextArray, AnnotationValue::Text(s)) => {
                Some(AnnotationValue::Array(vec![AnnotationValue::Text(s)]))
            }
            (Self::TextArray, AnnotationValue::Array(items))
                if items.iter().all(|i| matches!(i, AnnotationValue::Text(_))) =>
            {
                Some(AnnotationValue::Array(items))
            }
            _ => None,
        }
    }
}

///
/// ElementSpec
///

#[derive(Clone, Debug, PartialEq)]
pub struct ElementSpec {
    pub name: String,
    pub kind: ElementKind,
    pub default: Option<AnnotationValue>,
}

impl ElementSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ElementKind, default: Option<AnnotationValue>) -> Self {
        Self {
            name: name.into(),
            kind,
            default,
        }
    }

    /// Text element defaulting to the "unset" sentinel.
    #[must_use]
    pub fn sentinel(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Text, Some(IGNORED_FIELDNAME.into()))
    }

    #[must_use]
    pub fn flag(name: impl Into<String>, default: bool) -> Self {
        Self::new(name, ElementKind::Bool, Some(default.into()))
    }
}

///
/// AnnotationKind
///

#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationKind {
    pub type_name: String,
    pub elements: Vec<ElementSpec>,
}

impl AnnotationKind {
    #[must_use]
    pub fn new(type_name: impl Into<String>, elements: Vec<ElementSpec>) -> Self {
        Self {
            type_name: type_name.into(),
            elements,
        }
    }

    #[must_use]
    pub fn element(&self, name: &str) -> Option<&ElementSpec> {
        self.elements.iter().find(|e| e.name == name)
    }
}

///
/// AnnotationRegistry
///
/// Known annotation kinds keyed by type name. The library's own mapping
/// annotations are registered up front.
///

#[derive(Clone, Debug)]
pub struct AnnotationRegistry {
    kinds: BTreeMap<String, AnnotationKind>,
}

impl Default for AnnotationRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl AnnotationRegistry {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            kinds: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_builtins() -> Self {
        let mut reg = Self::empty();

        reg.register(AnnotationKind::new(names::ID, vec![]));
        reg.register(AnnotationKind::new(
            names::PROPERTY,
            vec![ElementSpec::sentinel("value")],
        ));
        reg.register(AnnotationKind::new(
            names::REFERENCE,
            vec![
                ElementSpec::sentinel("value"),
                ElementSpec::flag("lazy", false),
                ElementSpec::flag("ignoreMissing", false),
                ElementSpec::flag("idOnly", false),
            ],
        ));
        reg.register(AnnotationKind::new(
            names::VERSION,
            vec![ElementSpec::sentinel("value")],
        ));
        reg.register(AnnotationKind::new(
            names::ALSO_LOAD,
            vec![ElementSpec::new(
                "value",
                ElementKind::TextArray,
                Some(AnnotationValue::Array(Vec::new())),
            )],
        ));
        reg.register(AnnotationKind::new(
            names::ENTITY,
            vec![
                ElementSpec::sentinel("value"),
                ElementSpec::sentinel("discriminator"),
                ElementSpec::sentinel("discriminatorKey"),
                ElementSpec::flag("useDiscriminator", true),
            ],
        ));
        reg.register(AnnotationKind::new(
            names::EMBEDDED,
            vec![ElementSpec::sentinel("value")],
        ));
        reg.register(AnnotationKind::new(names::TRANSIENT, vec![]));
        reg.register(AnnotationKind::new(names::NOT_SAVED, vec![]));

        reg
    }

    /// Register or replace an annotation kind.
    pub fn register(&mut self, kind: AnnotationKind) {
        self.kinds.insert(kind.type_name.clone(), kind);
    }

    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&AnnotationKind> {
        self.kinds.get(type_name)
    }

    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.kinds.contains_key(type_name)
    }

    pub fn builder(&self, type_name: &str) -> Result<AnnotationBuilder, InternalError> {
        self.get(type_name)
            .cloned()
            .map(AnnotationBuilder::new)
            .ok_or_else(|| {
                InternalError::model_unsupported(format!(
                    "no annotation builder registered for {type_name}"
                ))
            })
    }

    /// Check a captured annotation against its kind and fill in defaults.
    pub fn complete(&self, meta: &AnnotationMeta) -> Result<AnnotationMeta, InternalError> {
        let mut builder = self.builder(&meta.type_name)?;
        for (element, value) in &meta.values {
            builder.set_value(element, value.clone())?;
        }

        Ok(builder.build())
    }
}

///
/// AnnotationBuilder
///

#[derive(Clone, Debug)]
pub struct AnnotationBuilder {
    kind: AnnotationKind,
    values: BTreeMap<String, AnnotationValue>,
}

impl AnnotationBuilder {
    #[must_use]
    pub const fn new(kind: AnnotationKind) -> Self {
        Self {
            kind,
            values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.kind.type_name
    }

    /// Set one element from an interpreter value.
    pub fn set(&mut self, element: &str, value: Value) -> Result<(), InternalError> {
        let value = to_annotation_value(value).ok_or_else(|| {
            InternalError::model_type_mismatch(format!(
                "{}.{element}: value cannot be an annotation element",
                self.kind.type_name
            ))
        })?;

        self.set_value(element, value)
    }

    pub fn set_value(&mut self, element: &str, value: AnnotationValue) -> Result<(), InternalError> {
        let decl = self.kind.element(element).ok_or_else(|| {
            InternalError::model_unsupported(format!(
                "{} has no element '{element}'",
                self.kind.type_name
            ))
        })?;

        let found = value.kind_name();
        let coerced = decl.kind.coerce(value).ok_or_else(|| {
            InternalError::model_type_mismatch(format!(
                "{}.{element} expects {:?}, found {found}",
                self.kind.type_name, decl.kind
            ))
        })?;
        self.values.insert(element.to_string(), coerced);

        Ok(())
    }

    /// Finish with every unset element at its default.
    #[must_use]
    pub fn build(self) -> AnnotationMeta {
        let mut meta = AnnotationMeta::new(self.kind.type_name.clone());
        meta.values = self.values;

        for decl in &self.kind.elements {
            if let Some(default) = &decl.default {
                meta.values
                    .entry(decl.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }

        meta
    }
}

fn to_annotation_value(value: Value) -> Option<AnnotationValue> {
    Some(match value {
        Value::Bool(v) => AnnotationValue::Bool(v),
        Value::Byte(v) => AnnotationValue::Int(i32::from(v)),
        Value::Short(v) => AnnotationValue::Int(i32::from(v)),
        Value::Char(v) => AnnotationValue::Text(v.to_string()),
        Value::Int(v) => AnnotationValue::Int(v),
        Value::Long(v) => AnnotationValue::Long(v),
        Value::Float(v) => AnnotationValue::Double(f64::from(v)),
        Value::Double(v) => AnnotationValue::Double(v),
        Value::Text(v) => AnnotationValue::Text(v),
        Value::Enum { type_name, variant } => AnnotationValue::Enum { type_name, variant },
        Value::Type(t) => AnnotationValue::Class(t.raw().to_string()),
        Value::Annotation(a) => AnnotationValue::Annotation(a),
        Value::List(items) => AnnotationValue::Array(
            items
                .into_iter()
                .map(to_annotation_value)
                .collect::<Option<Vec<_>>>()?,
        ),
        Value::Null
        | Value::Map(_)
        | Value::Config(_)
        | Value::Object(_)
        | Value::Handle(_) => return None,
    })
}
