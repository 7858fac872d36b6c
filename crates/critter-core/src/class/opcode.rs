use critter_schema::prelude::*;

///
/// Opcodes
///
/// Operands follow the opcode byte. `u16` operands are constant pool
/// indices unless noted otherwise; all multi-byte values are big-endian.
///

pub mod op {
    pub const NOP: u8 = 0x00;
    /// u8 local index
    pub const LOAD: u8 = 0x01;
    pub const DUP: u8 = 0x02;
    pub const POP: u8 = 0x03;
    pub const PUSH_NULL: u8 = 0x04;
    /// u8 0 | 1
    pub const PUSH_BOOL: u8 = 0x05;
    pub const LDC: u8 = 0x06;

    /// class, field
    pub const GET_FIELD: u8 = 0x10;
    /// class, field
    pub const PUT_FIELD: u8 = 0x11;
    /// class, name, descriptor
    pub const INVOKE: u8 = 0x12;
    /// class, constructor descriptor
    pub const NEW: u8 = 0x13;
    pub const CHECK_CAST: u8 = 0x14;
    /// u8 primitive code
    pub const BOX: u8 = 0x15;
    /// u8 primitive code
    pub const UNBOX: u8 = 0x16;

    /// u8 kind tag, raw, u8 bound, u8 dims, u8 argc
    pub const NEW_TYPE: u8 = 0x20;
    /// u16 element count (not a pool index)
    pub const NEW_LIST: u8 = 0x21;
    /// type, variant
    pub const NEW_ENUM: u8 = 0x22;
    pub const ANNOTATION_BEGIN: u8 = 0x23;
    pub const ANNOTATION_SET: u8 = 0x24;
    pub const ANNOTATION_END: u8 = 0x25;

    /// class, field
    pub const RESOLVE_FIELD: u8 = 0x30;
    /// class, name, descriptor, u8 required
    pub const RESOLVE_METHOD: u8 = 0x31;
    pub const HANDLE_GET: u8 = 0x32;
    /// entity, property
    pub const HANDLE_SET: u8 = 0x33;

    /// u8 intrinsic id
    pub const INTRINSIC: u8 = 0x40;

    pub const THROW: u8 = 0x50;
    pub const RETURN: u8 = 0x51;
    pub const RETURN_VOID: u8 = 0x52;
}

///
/// Intrinsic
///
/// Mapping-policy computations that read the configuration handed to a
/// generated constructor.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum Intrinsic {
    /// pops simple name, config; pushes collection name
    CollectionName,
    /// pops qualified name, config; pushes discriminator
    Discriminator,
    /// pops config; pushes discriminator key
    DiscriminatorKey,
}

impl Intrinsic {
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::CollectionName => 0,
            Self::Discriminator => 1,
            Self::DiscriminatorKey => 2,
        }
    }

    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::CollectionName),
            1 => Some(Self::Discriminator),
            2 => Some(Self::DiscriminatorKey),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CollectionName => "collection_name",
            Self::Discriminator => "discriminator",
            Self::DiscriminatorKey => "discriminator_key",
        }
    }
}

///
/// Instr
///
/// One decoded instruction with its pool operands resolved.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Instr {
    Nop,
    Load(u8),
    Dup,
    Pop,
    PushNull,
    PushBool(bool),
    Ldc(Constant),
    GetField {
        class: String,
        name: String,
    },
    PutField {
        class: String,
        name: String,
    },
    Invoke {
        class: String,
        name: String,
        descriptor: String,
    },
    New {
        class: String,
        descriptor: String,
    },
    CheckCast(String),
    Box(Primitive),
    Unbox(Primitive),
    NewType {
        kind: TypeKind,
        raw: String,
        bound: Bound,
        dims: u8,
        argc: u8,
    },
    NewList(u16),
    NewEnum {
        type_name: String,
        variant: String,
    },
    AnnotationBegin(String),
    AnnotationSet(String),
    AnnotationEnd,
    ResolveField {
        class: String,
        name: String,
    },
    ResolveMethod {
        class: String,
        name: String,
        descriptor: String,
        required: bool,
    },
    HandleGet,
    HandleSet {
        entity: String,
        property: String,
    },
    Intrinsic(Intrinsic),
    Throw(String),
    Return,
    ReturnVoid,
}

impl Instr {
    #[must_use]
    pub const fn opcode(&self) -> u8 {
        match self {
            Self::Nop => op::NOP,
            Self::Load(_) => op::LOAD,
            Self::Dup => op::DUP,
            Self::Pop => op::POP,
            Self::PushNull => op::PUSH_NULL,
            Self::PushBool(_) => op::PUSH_BOOL,
            Self::Ldc(_) => op::LDC,
            Self::GetField { .. } => op::GET_FIELD,
            Self::PutField { .. } => op::PUT_FIELD,
            Self::Invoke { .. } => op::INVOKE,
            Self::New { .. } => op::NEW,
            Self::CheckCast(_) => op::CHECK_CAST,
            Self::Box(_) => op::BOX,
            Self::Unbox(_) => op::UNBOX,
            Self::NewType { .. } => op::NEW_TYPE,
            Self::NewList(_) => op::NEW_LIST,
            Self::NewEnum { .. } => op::NEW_ENUM,
            Self::AnnotationBegin(_) => op::ANNOTATION_BEGIN,
            Self::AnnotationSet(_) => op::ANNOTATION_SET,
            Self::AnnotationEnd => op::ANNOTATION_END,
            Self::ResolveField { .. } => op::RESOLVE_FIELD,
            Self::ResolveMethod { .. } => op::RESOLVE_METHOD,
            Self::HandleGet => op::HANDLE_GET,
            Self::HandleSet { .. } => op::HANDLE_SET,
            Self::Intrinsic(_) => op::INTRINSIC,
            Self::Throw(_) => op::THROW,
            Self::Return => op::RETURN,
            Self::ReturnVoid => op::RETURN_VOID,
        }
    }

    #[must_use]
    pub const fn mnemonic(&self) -> &'static str {
        match self {
            Self::Nop => "NOP",
            Self::Load(_) => "LOAD",
            Self::Dup => "DUP",
            Self::Pop => "POP",
            Self::PushNull => "PUSH_NULL",
            Self::PushBool(_) => "PUSH_BOOL",
            Self::Ldc(_) => "LDC",
            Self::GetField { .. } => "GET_FIELD",
            Self::PutField { .. } => "PUT_FIELD",
            Self::Invoke { .. } => "INVOKE",
            Self::New { .. } => "NEW",
            Self::CheckCast(_) => "CHECK_CAST",
            Self::Box(_) => "BOX",
            Self::Unbox(_) => "UNBOX",
            Self::NewType { .. } => "NEW_TYPE",
            Self::NewList(_) => "NEW_LIST",
            Self::NewEnum { .. } => "NEW_ENUM",
            Self::AnnotationBegin(_) => "ANNOTATION_BEGIN",
            Self::AnnotationSet(_) => "ANNOTATION_SET",
            Self::AnnotationEnd => "ANNOTATION_END",
            Self::ResolveField { .. } => "RESOLVE_FIELD",
            Self::ResolveMethod { .. } => "RESOLVE_METHOD",
            Self::HandleGet => "HANDLE_GET",
            Self::HandleSet { .. } => "HANDLE_SET",
            Self::Intrinsic(_) => "INTRINSIC",
            Self::Throw(_) => "THROW",
            Self::Return => "RETURN",
            Self::ReturnVoid => "RETURN_VOID",
        }
    }

    /// Ends a method body.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Return | Self::ReturnVoid | Self::Throw(_))
    }
}

/// Type kind tag used by `NEW_TYPE`: the primitive's descriptor code, `L`
/// for classes, `T` for variables, `*` for wildcards.
#[must_use]
pub const fn kind_tag(kind: TypeKind) -> u8 {
    match kind {
        TypeKind::Primitive(p) => p.code(),
        TypeKind::Class => b'L',
        TypeKind::Variable => b'T',
        TypeKind::Wildcard => b'*',
    }
}

#[must_use]
pub const fn kind_from_tag(tag: u8) -> Option<TypeKind> {
    match tag {
        b'L' => Some(TypeKind::Class),
        b'T' => Some(TypeKind::Variable),
        b'*' => Some(TypeKind::Wildcard),
        code => match Primitive::from_code(code) {
            Some(p) => Some(TypeKind::Primitive(p)),
            None => None,
        },
    }
}

#[must_use]
pub const fn bound_tag(bound: Bound) -> u8 {
    match bound {
        Bound::Exact => 0,
        Bound::Extends => 1,
        Bound::Super => 2,
    }
}

#[must_use]
pub const fn bound_from_tag(tag: u8) -> Option<Bound> {
    match tag {
        0 => Some(Bound::Exact),
        1 => Some(Bound::Extends),
        2 => Some(Bound::Super),
        _ => None,
    }
}
