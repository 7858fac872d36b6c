use crate::vm::LoadedClass;
use critter_schema::prelude::*;
use std::{fmt, sync::Arc};

///
/// MemberHandle
///
/// A field or method bound once against a loaded class. Using a handle
/// never repeats the lookup; it only checks the receiver's class.
///

#[derive(Clone, Debug)]
pub enum MemberHandle {
    Field {
        class: Arc<LoadedClass>,
        slot: usize,
        name: String,
        ty: TypeDescriptor,
    },
    Method {
        class: Arc<LoadedClass>,
        name: String,
        descriptor: String,
        arity: usize,
    },
}

impl MemberHandle {
    #[must_use]
    pub const fn class(&self) -> &Arc<LoadedClass> {
        match self {
            Self::Field { class, .. } | Self::Method { class, .. } => class,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Field { name, .. } | Self::Method { name, .. } => name,
        }
    }

    #[must_use]
    pub const fn is_field(&self) -> bool {
        matches!(self, Self::Field { .. })
    }
}

impl fmt::Display for MemberHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field { class, name, .. } => write!(f, "field {}.{name}", class.name()),
            Self::Method {
                class,
                name,
                descriptor,
                ..
            } => write!(f, "method {}.{name}{descriptor}", class.name()),
        }
    }
}
