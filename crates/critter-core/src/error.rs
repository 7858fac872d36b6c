use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Every failure raised while loading, linking or running generated classes
/// is one of these.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: ErrorDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Construct a registry-origin not-found error.
    pub fn registry_not_found(name: impl Into<String>) -> Self {
        let name = name.into();

        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Registry,
            format!("generated class not found: {name}"),
        )
    }

    /// Construct a registry-origin conflict for a name already bound to a
    /// different body.
    pub fn registry_conflict(name: impl Into<String>) -> Self {
        let name = name.into();

        Self::new(
            ErrorClass::Conflict,
            ErrorOrigin::Registry,
            format!("generated class '{name}' already registered with a different body"),
        )
        .with_detail(ErrorDetail::Duplicate { name })
    }

    pub fn registry_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Registry,
            message,
        )
    }

    pub fn format_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Format, message)
    }

    pub fn loader_type_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::TypeMismatch, ErrorOrigin::Loader, message)
    }

    pub fn vm_type_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::TypeMismatch, ErrorOrigin::Vm, message)
    }

    pub fn vm_invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvariantViolation, ErrorOrigin::Vm, message)
    }

    pub fn vm_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Vm, message)
    }

    pub fn missing_target(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::MissingTarget, origin, message)
    }

    pub fn model_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Model, message)
    }

    pub fn model_type_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::TypeMismatch, ErrorOrigin::Model, message)
    }

    /// Wrap a failed one-time member lookup into the single error every
    /// resolved-reference constructor raises.
    pub fn missing_lookup(entity: impl Into<String>, member: impl Into<String>, cause: Self) -> Self {
        let entity = entity.into();
        let member = member.into();

        Self::new(
            ErrorClass::MissingTarget,
            ErrorOrigin::Accessor,
            format!("cannot resolve '{member}' on '{entity}': {cause}"),
        )
        .with_detail(ErrorDetail::MissingLookup {
            entity,
            member,
            cause: Box::new(cause),
        })
    }

    /// `set` called on a property without a writer.
    pub fn read_only(entity: impl Into<String>, property: impl Into<String>) -> Self {
        let entity = entity.into();
        let property = property.into();

        Self::new(
            ErrorClass::ReadOnly,
            ErrorOrigin::Accessor,
            format!("read-only property: {entity}#{property} has no setter"),
        )
        .with_detail(ErrorDetail::ReadOnlyProperty { entity, property })
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        matches!(self.detail, Some(ErrorDetail::ReadOnlyProperty { .. }))
    }

    #[must_use]
    pub const fn is_missing_lookup(&self) -> bool {
        matches!(self.detail, Some(ErrorDetail::MissingLookup { .. }))
    }

    #[must_use]
    pub const fn format_error(&self) -> Option<&FormatError> {
        match &self.detail {
            Some(ErrorDetail::Format(err)) => Some(err),
            _ => None,
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

impl From<FormatError> for InternalError {
    fn from(err: FormatError) -> Self {
        Self {
            class: ErrorClass::Corruption,
            origin: ErrorOrigin::Format,
            message: format!("malformed class body: {err}"),
            detail: Some(ErrorDetail::Format(err)),
        }
    }
}

///
/// ErrorDetail
///
/// Structured detail carried by [`InternalError`] for the failures callers
/// need to tell apart.
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("duplicate class name '{name}'")]
    Duplicate { name: String },

    #[error("{0}")]
    Format(FormatError),

    #[error("lookup of '{member}' on '{entity}' failed: {cause}")]
    MissingLookup {
        entity: String,
        member: String,
        cause: Box<InternalError>,
    },

    #[error("read-only property {entity}#{property}")]
    ReadOnlyProperty { entity: String, property: String },
}

///
/// FormatError
///
/// Binary class-body format violations, raised while encoding or decoding.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum FormatError {
    #[error("bad magic")]
    BadMagic,

    #[error("unknown class kind {0}")]
    BadClassKind(u8),

    #[error("bad bound tag {tag} at offset {offset}")]
    BadBound { tag: u8, offset: usize },

    #[error("constant pool index {index} out of range")]
    BadConstantIndex { index: u16 },

    #[error("unknown constant tag {tag} at offset {offset}")]
    BadConstantTag { tag: u8, offset: usize },

    #[error("bad descriptor '{descriptor}': {reason}")]
    BadDescriptor { descriptor: String, reason: String },

    #[error("unknown intrinsic {id} at offset {offset}")]
    BadIntrinsic { id: u8, offset: usize },

    #[error("unknown opcode 0x{opcode:02x} at offset {offset}")]
    BadOpcode { opcode: u8, offset: usize },

    #[error("unknown primitive code {code} at offset {offset}")]
    BadPrimitive { code: u8, offset: usize },

    #[error("constant {index} is not valid utf-8")]
    BadUtf8 { index: u16 },

    #[error("constant {index} is not a {expected}")]
    ConstantKind { index: u16, expected: &'static str },

    #[error("method '{method}' reads local {index} but declares {max} locals")]
    LocalOutOfBounds { method: String, index: u16, max: u16 },

    #[error("method '{method}' does not end in a return or throw")]
    MissingTerminator { method: String },

    #[error("method '{method}' returns in a way its descriptor forbids")]
    ReturnMismatch { method: String },

    #[error("{what} exceeds the format's limit")]
    TooLarge { what: &'static str },

    #[error("{count} trailing bytes after class body")]
    TrailingBytes { count: usize },

    #[error("unexpected end of body at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u16),
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorClass {
    Conflict,
    Corruption,
    InvariantViolation,
    MissingTarget,
    NotFound,
    ReadOnly,
    TypeMismatch,
    Unsupported,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Conflict => "conflict",
            Self::Corruption => "corruption",
            Self::InvariantViolation => "invariant_violation",
            Self::MissingTarget => "missing_target",
            Self::NotFound => "not_found",
            Self::ReadOnly => "read_only",
            Self::TypeMismatch => "type_mismatch",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorOrigin {
    Accessor,
    Format,
    Loader,
    Model,
    Registry,
    Vm,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Accessor => "accessor",
            Self::Format => "format",
            Self::Loader => "loader",
            Self::Model => "model",
            Self::Registry => "registry",
            Self::Vm => "vm",
        };
        write!(f, "{label}")
    }
}
