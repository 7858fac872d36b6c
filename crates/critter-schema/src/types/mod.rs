//! Type descriptors and the signature resolver that produces them.

mod signature;

pub use signature::{
    MAX_SIGNATURE_DEPTH, MethodSignature, SignatureError, parse_method_signature, parse_signature,
    parse_type_list,
};

use crate::prelude::*;
use std::fmt;

///
/// Primitive
///
/// Fixed primitive table. Each primitive has exactly one boxed counterpart.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[remain::sorted]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Void,
}

impl Primitive {
    pub const ALL: [Self; 9] = [
        Self::Boolean,
        Self::Byte,
        Self::Char,
        Self::Double,
        Self::Float,
        Self::Int,
        Self::Long,
        Self::Short,
        Self::Void,
    ];

    /// Single-character descriptor code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Boolean => b'Z',
            Self::Byte => b'B',
            Self::Char => b'C',
            Self::Double => b'D',
            Self::Float => b'F',
            Self::Int => b'I',
            Self::Long => b'J',
            Self::Short => b'S',
            Self::Void => b'V',
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            b'Z' => Some(Self::Boolean),
            b'B' => Some(Self::Byte),
            b'C' => Some(Self::Char),
            b'D' => Some(Self::Double),
            b'F' => Some(Self::Float),
            b'I' => Some(Self::Int),
            b'J' => Some(Self::Long),
            b'S' => Some(Self::Short),
            b'V' => Some(Self::Void),
            _ => None,
        }
    }

    /// Source-level keyword (`int`, `boolean`, ...).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Double => "double",
            Self::Float => "float",
            Self::Int => "int",
            Self::Long => "long",
            Self::Short => "short",
            Self::Void => "void",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Qualified name of the boxed counterpart.
    #[must_use]
    pub const fn boxed(self) -> &'static str {
        match self {
            Self::Boolean => "java.lang.Boolean",
            Self::Byte => "java.lang.Byte",
            Self::Char => "java.lang.Character",
            Self::Double => "java.lang.Double",
            Self::Float => "java.lang.Float",
            Self::Int => "java.lang.Integer",
            Self::Long => "java.lang.Long",
            Self::Short => "java.lang.Short",
            Self::Void => "java.lang.Void",
        }
    }

    #[must_use]
    pub fn from_boxed(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.boxed() == name)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

///
/// TypeKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum TypeKind {
    Primitive(Primitive),
    Class,
    Variable,
    Wildcard,
}

///
/// Bound
/// Variance marker carried by type arguments.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Bound {
    #[default]
    Exact,
    Extends,
    Super,
}

///
/// TypeDescriptor
///
/// One resolved type occurrence. Built once by the resolver and never
/// mutated; the `with_*` helpers consume and return a new value.
///

#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct TypeDescriptor {
    raw: String,
    args: Vec<Self>,
    dims: u8,
    kind: TypeKind,
    bound: Bound,
}

impl TypeDescriptor {
    #[must_use]
    pub fn primitive(primitive: Primitive) -> Self {
        Self {
            raw: primitive.name().to_string(),
            args: Vec::new(),
            dims: 0,
            kind: TypeKind::Primitive(primitive),
            bound: Bound::Exact,
        }
    }

    #[must_use]
    pub fn class(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            args: Vec::new(),
            dims: 0,
            kind: TypeKind::Class,
            bound: Bound::Exact,
        }
    }

    #[must_use]
    pub fn variable(name: impl Into<String>) -> Self {
        Self {
            raw: name.into(),
            args: Vec::new(),
            dims: 0,
            kind: TypeKind::Variable,
            bound: Bound::Exact,
        }
    }

    #[must_use]
    pub fn wildcard() -> Self {
        Self {
            raw: "?".to_string(),
            args: Vec::new(),
            dims: 0,
            kind: TypeKind::Wildcard,
            bound: Bound::Exact,
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<Self>) -> Self {
        self.args = args;
        self
    }

    #[must_use]
    pub const fn with_dims(mut self, dims: u8) -> Self {
        self.dims = dims;
        self
    }

    #[must_use]
    pub const fn with_bound(mut self, bound: Bound) -> Self {
        self.bound = bound;
        self
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn args(&self) -> &[Self] {
        &self.args
    }

    #[must_use]
    pub const fn dims(&self) -> u8 {
        self.dims
    }

    #[must_use]
    pub const fn kind(&self) -> TypeKind {
        self.kind
    }

    #[must_use]
    pub const fn bound(&self) -> Bound {
        self.bound
    }

    #[must_use]
    pub const fn is_array(&self) -> bool {
        self.dims > 0
    }

    /// The primitive this descriptor names, only when it is not an array.
    #[must_use]
    pub const fn primitive_type(&self) -> Option<Primitive> {
        match self.kind {
            TypeKind::Primitive(p) if self.dims == 0 => Some(p),
            _ => None,
        }
    }

    /// Element descriptor of an array (dimensions stripped).
    #[must_use]
    pub fn element(&self) -> Self {
        let mut element = self.clone();
        element.dims = 0;
        element
    }

    /// Qualified name used on an erased, boxed boundary.
    #[must_use]
    pub fn boxed_raw(&self) -> &str {
        match self.primitive_type() {
            Some(p) => p.boxed(),
            None if matches!(self.kind, TypeKind::Variable | TypeKind::Wildcard) => {
                "java.lang.Object"
            }
            None => &self.raw,
        }
    }

    /// Name a runtime cast checks against: the boxed class for primitives,
    /// the erased descriptor for arrays, `java.lang.Object` for variables.
    #[must_use]
    pub fn cast_name(&self) -> String {
        if self.is_array() {
            self.erased_descriptor()
        } else {
            self.boxed_raw().to_string()
        }
    }

    /// Erased JVM descriptor (generics dropped, variables erased to Object).
    #[must_use]
    pub fn erased_descriptor(&self) -> String {
        let mut out = "[".repeat(usize::from(self.dims));
        match self.kind {
            TypeKind::Primitive(p) => out.push(char::from(p.code())),
            TypeKind::Class => {
                out.push('L');
                out.push_str(&self.raw.replace('.', "/"));
                out.push(';');
            }
            TypeKind::Variable | TypeKind::Wildcard => out.push_str("Ljava/lang/Object;"),
        }

        out
    }

    /// Render back to the signature grammar this descriptor was parsed from.
    #[must_use]
    pub fn to_signature(&self) -> String {
        let mut out = String::new();
        self.write_signature(&mut out);

        out
    }

    fn write_signature(&self, out: &mut String) {
        match self.bound {
            Bound::Exact => {}
            Bound::Extends => out.push('+'),
            Bound::Super => out.push('-'),
        }
        for _ in 0..self.dims {
            out.push('[');
        }

        match self.kind {
            TypeKind::Primitive(p) => out.push(char::from(p.code())),
            TypeKind::Wildcard => out.push('*'),
            TypeKind::Variable => {
                out.push('T');
                out.push_str(&self.raw);
                out.push(';');
            }
            TypeKind::Class => {
                out.push('L');
                out.push_str(&self.raw.replace('.', "/"));
                if !self.args.is_empty() {
                    out.push('<');
                    for arg in &self.args {
                        arg.write_signature(out);
                    }
                    out.push('>');
                }
                out.push(';');
            }
        }
    }

    /// Number of descriptor nodes in the tree, this one included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.args.iter().map(Self::node_count).sum::<usize>()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bound {
            Bound::Exact => {}
            Bound::Extends => f.write_str("? extends ")?,
            Bound::Super => f.write_str("? super ")?,
        }

        f.write_str(&self.raw)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        for _ in 0..self.dims {
            f.write_str("[]")?;
        }

        Ok(())
    }
}
