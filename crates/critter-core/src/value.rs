use crate::{
    contract,
    error::InternalError,
    vm::{MemberHandle, ObjectRef},
};
use critter_schema::prelude::*;
use std::{fmt, sync::Arc};

///
/// Value
///
/// Everything the interpreter moves around. Primitive and boxed forms share
/// one representation; boxing only checks that the variant matches.
///

#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Text(String),
    List(Vec<Self>),
    Map(Vec<(Self, Self)>),
    Enum { type_name: String, variant: String },
    Type(TypeDescriptor),
    Annotation(AnnotationMeta),
    Config(Arc<MappingConfig>),
    Object(ObjectRef),
    Handle(Arc<MemberHandle>),
}

impl Value {
    /// Zero value of a field of this type before any initializer runs.
    #[must_use]
    pub const fn default_for(ty: &TypeDescriptor) -> Self {
        match ty.primitive_type() {
            Some(Primitive::Boolean) => Self::Bool(false),
            Some(Primitive::Byte) => Self::Byte(0),
            Some(Primitive::Char) => Self::Char('\0'),
            Some(Primitive::Short) => Self::Short(0),
            Some(Primitive::Int) => Self::Int(0),
            Some(Primitive::Long) => Self::Long(0),
            Some(Primitive::Float) => Self::Float(0.0),
            Some(Primitive::Double) => Self::Double(0.0),
            Some(Primitive::Void) | None => Self::Null,
        }
    }

    /// Materialize a field initializer, narrowing pooled ints to the field's
    /// declared primitive (or boxed) type.
    pub fn from_constant(constant: &Constant, ty: &TypeDescriptor) -> Result<Self, InternalError> {
        let target = ty
            .primitive_type()
            .or_else(|| (!ty.is_array()).then(|| Primitive::from_boxed(ty.raw())).flatten());

        let value = match (constant, target) {
            (Constant::Int(v), Some(Primitive::Boolean)) => Some(Self::Bool(*v != 0)),
            (Constant::Int(v), Some(Primitive::Byte)) => i8::try_from(*v).ok().map(Self::Byte),
            (Constant::Int(v), Some(Primitive::Char)) => u32::try_from(*v)
                .ok()
                .and_then(char::from_u32)
                .map(Self::Char),
            (Constant::Int(v), Some(Primitive::Short)) => i16::try_from(*v).ok().map(Self::Short),
            (Constant::Int(v), Some(Primitive::Int)) => Some(Self::Int(*v)),
            (Constant::Int(v), Some(Primitive::Long)) => Some(Self::Long(i64::from(*v))),
            (Constant::Long(v), Some(Primitive::Long)) => Some(Self::Long(*v)),
            (Constant::Float(v), Some(Primitive::Float)) => Some(Self::Float(*v)),
            (Constant::Float(v), Some(Primitive::Double)) => Some(Self::Double(f64::from(*v))),
            (Constant::Double(v), Some(Primitive::Double)) => Some(Self::Double(*v)),
            (Constant::Text(v), None) if ty.raw() == contract::STRING && !ty.is_array() => {
                Some(Self::Text(v.clone()))
            }
            _ => None,
        };

        value.ok_or_else(|| {
            InternalError::loader_type_mismatch(format!(
                "constant {constant} does not fit a field of type {ty}"
            ))
        })
    }

    /// Runtime form of a constant pool literal.
    #[must_use]
    pub fn from_literal(constant: &Constant) -> Self {
        match constant {
            Constant::Int(v) => Self::Int(*v),
            Constant::Long(v) => Self::Long(*v),
            Constant::Float(v) => Self::Float(*v),
            Constant::Double(v) => Self::Double(*v),
            Constant::Text(v) => Self::Text(v.clone()),
        }
    }

    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Byte(_) => "byte",
            Self::Char(_) => "char",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Text(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Enum { .. } => "enum",
            Self::Type(_) => "type",
            Self::Annotation(_) => "annotation",
            Self::Config(_) => "config",
            Self::Object(_) => "object",
            Self::Handle(_) => "handle",
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The primitive this value's variant carries, if any.
    #[must_use]
    pub const fn primitive(&self) -> Option<Primitive> {
        match self {
            Self::Bool(_) => Some(Primitive::Boolean),
            Self::Byte(_) => Some(Primitive::Byte),
            Self::Char(_) => Some(Primitive::Char),
            Self::Short(_) => Some(Primitive::Short),
            Self::Int(_) => Some(Primitive::Int),
            Self::Long(_) => Some(Primitive::Long),
            Self::Float(_) => Some(Primitive::Float),
            Self::Double(_) => Some(Primitive::Double),
            _ => None,
        }
    }

    /// Checked box: the value must already be the primitive's variant.
    pub fn boxed(self, primitive: Primitive) -> Result<Self, InternalError> {
        if self.primitive() == Some(primitive) {
            Ok(self)
        } else {
            Err(InternalError::vm_type_mismatch(format!(
                "cannot box {} as {}",
                self.kind_name(),
                primitive.boxed()
            )))
        }
    }

    /// Checked unbox: null and foreign variants are rejected.
    pub fn unboxed(self, primitive: Primitive) -> Result<Self, InternalError> {
        if self.is_null() {
            return Err(InternalError::vm_type_mismatch(format!(
                "cannot unbox null to {primitive}"
            )));
        }

        if self.primitive() == Some(primitive) {
            Ok(self)
        } else {
            Err(InternalError::vm_type_mismatch(format!(
                "cannot unbox {} to {primitive}",
                self.kind_name()
            )))
        }
    }

    fn mismatch(&self, expected: &str) -> InternalError {
        InternalError::model_type_mismatch(format!(
            "expected {expected}, found {}",
            self.kind_name()
        ))
    }

    pub fn into_text(self) -> Result<String, InternalError> {
        match self {
            Self::Text(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn into_bool(self) -> Result<bool, InternalError> {
        match self {
            Self::Bool(b) => Ok(b),
            other => Err(other.mismatch("boolean")),
        }
    }

    pub fn into_list(self) -> Result<Vec<Self>, InternalError> {
        match self {
            Self::List(items) => Ok(items),
            other => Err(other.mismatch("list")),
        }
    }

    pub fn into_texts(self) -> Result<Vec<String>, InternalError> {
        self.into_list()?.into_iter().map(Self::into_text).collect()
    }

    pub fn into_type(self) -> Result<TypeDescriptor, InternalError> {
        match self {
            Self::Type(ty) => Ok(ty),
            other => Err(other.mismatch("type")),
        }
    }

    pub fn into_annotation(self) -> Result<AnnotationMeta, InternalError> {
        match self {
            Self::Annotation(a) => Ok(a),
            other => Err(other.mismatch("annotation")),
        }
    }

    pub fn into_object(self) -> Result<ObjectRef, InternalError> {
        match self {
            Self::Object(obj) => Ok(obj),
            other => Err(other.mismatch("object")),
        }
    }

    pub fn into_config(self) -> Result<Arc<MappingConfig>, InternalError> {
        match self {
            Self::Config(config) => Ok(config),
            other => Err(other.mismatch("config")),
        }
    }

    /// Whether this value may be stored where `target` is expected. Object
    /// targets are checked by the interpreter, which knows the class graph.
    #[must_use]
    pub fn conforms_to_builtin(&self, target: &str) -> bool {
        self.conforms_with(target, &|_, _| false)
    }

    /// Conformance with object instances decided by `is_instance`. Array
    /// targets (`[I`, `[Ljava/lang/String;`) check every element.
    #[must_use]
    pub fn conforms_with(&self, target: &str, is_instance: &dyn Fn(&ObjectRef, &str) -> bool) -> bool {
        if target == contract::OBJECT {
            return true;
        }
        if let Some(element) = target.strip_prefix('[') {
            return match self {
                Self::Null => true,
                Self::List(items) => items
                    .iter()
                    .all(|item| item.conforms_to_element(element, is_instance)),
                _ => false,
            };
        }

        match self {
            Self::Null => true,
            Self::Text(_) => target == contract::STRING || target == "java.lang.CharSequence",
            Self::List(_) => contract::is_collection_type(target),
            Self::Map(_) => contract::is_map_type(target),
            Self::Enum { type_name, .. } => target == type_name || target == contract::ENUM,
            Self::Type(_) => target == contract::TYPE_DATA,
            Self::Annotation(_) => target == contract::ANNOTATION,
            Self::Config(_) => target == contract::CONFIG,
            Self::Handle(_) => target == contract::MEMBER_HANDLE,
            Self::Object(obj) => is_instance(obj, target),
            _ => self.primitive().is_some_and(|p| {
                Primitive::from_boxed(target) == Some(p)
                    || (target == "java.lang.Number" && is_numeric(p))
            }),
        }
    }

    // primitive elements take only their exact variant, never null
    fn conforms_to_element(&self, element: &str, is_instance: &dyn Fn(&ObjectRef, &str) -> bool) -> bool {
        if element.starts_with('[') {
            return self.conforms_with(element, is_instance);
        }
        if let Some(class) = element.strip_prefix('L').and_then(|c| c.strip_suffix(';')) {
            return self.conforms_with(&class.replace('/', "."), is_instance);
        }

        match element.as_bytes() {
            [code] => Primitive::from_code(*code).is_some_and(|p| self.primitive() == Some(p)),
            _ => false,
        }
    }
}

const fn is_numeric(p: Primitive) -> bool {
    !matches!(p, Primitive::Boolean | Primitive::Char | Primitive::Void)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Byte(a), Self::Byte(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::Short(a), Self::Short(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Double(a), Self::Double(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (
                Self::Enum {
                    type_name: ta,
                    variant: va,
                },
                Self::Enum {
                    type_name: tb,
                    variant: vb,
                },
            ) => ta == tb && va == vb,
            (Self::Type(a), Self::Type(b)) => a == b,
            (Self::Annotation(a), Self::Annotation(b)) => a == b,
            (Self::Config(a), Self::Config(b)) => Arc::ptr_eq(a, b) || a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Handle(a), Self::Handle(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v:?}"),
            Self::Short(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}L"),
            Self::Float(v) => write!(f, "{v}f"),
            Self::Double(v) => write!(f, "{v}d"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::List(items) => write!(f, "list[{}]", items.len()),
            Self::Map(entries) => write!(f, "map[{}]", entries.len()),
            Self::Enum { type_name, variant } => write!(f, "{type_name}.{variant}"),
            Self::Type(ty) => write!(f, "{ty}"),
            Self::Annotation(a) => write!(f, "@{}", a.type_name),
            Self::Config(_) => f.write_str("<config>"),
            Self::Object(obj) => write!(f, "<{}>", obj.class_name()),
            Self::Handle(h) => write!(f, "<handle {h}>"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Self::Object(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
