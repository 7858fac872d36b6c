use crate::{
    class::{ClassBody, ClassKind, MethodDef},
    error::InternalError,
    value::Value,
};
use critter_schema::{prelude::*, types::parse_signature};
use std::{collections::HashMap, sync::Arc};

///
/// FieldSlot
///
/// One instance field after linking. Inherited slots come first, so a slot
/// index is stable across a class and all of its subclasses.
///

#[derive(Clone, Debug)]
pub struct FieldSlot {
    pub owner: String,
    pub name: String,
    pub ty: TypeDescriptor,
    pub flags: u16,
    pub initial: Value,
}

///
/// LoadedClass
///

#[derive(Debug)]
pub struct LoadedClass {
    body: ClassBody,
    super_class: Option<Arc<Self>>,
    slots: Vec<FieldSlot>,
    slot_index: HashMap<String, usize>,
}

impl LoadedClass {
    /// Link a decoded body against its already-loaded superclass.
    pub fn link(body: ClassBody, super_class: Option<Arc<Self>>) -> Result<Self, InternalError> {
        let mut slots = super_class
            .as_ref()
            .map(|s| s.slots.clone())
            .unwrap_or_default();

        for field in body.fields.iter().filter(|f| f.flags & flags::STATIC == 0) {
            let ty = parse_signature(&field.descriptor).map_err(|e| {
                InternalError::loader_type_mismatch(format!(
                    "{}.{}: bad field descriptor: {e}",
                    body.name, field.name
                ))
            })?;
            let initial = match &field.initial {
                Some(constant) => Value::from_constant(constant, &ty)?,
                None => Value::default_for(&ty),
            };

            slots.push(FieldSlot {
                owner: body.name.clone(),
                name: field.name.clone(),
                ty,
                flags: field.flags,
                initial,
            });
        }

        // later slots shadow inherited ones of the same name
        let slot_index = slots
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.clone(), i))
            .collect();

        Ok(Self {
            body,
            super_class,
            slots,
            slot_index,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.body.name
    }

    #[must_use]
    pub const fn kind(&self) -> ClassKind {
        self.body.kind
    }

    #[must_use]
    pub const fn body(&self) -> &ClassBody {
        &self.body
    }

    #[must_use]
    pub const fn super_class(&self) -> Option<&Arc<Self>> {
        self.super_class.as_ref()
    }

    #[must_use]
    pub fn slots(&self) -> &[FieldSlot] {
        &self.slots
    }

    #[must_use]
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.slot_index.get(name).copied()
    }

    #[must_use]
    pub fn field_slot(&self, index: usize) -> Option<&FieldSlot> {
        self.slots.get(index)
    }

    /// Method lookup through the superclass chain.
    #[must_use]
    pub fn find_method(&self, name: &str, descriptor: &str) -> Option<&MethodDef> {
        self.body
            .method(name, descriptor)
            .or_else(|| self.super_class.as_ref()?.find_method(name, descriptor))
    }

    /// Declared (not inherited) method lookup.
    #[must_use]
    pub fn declared_method(&self, name: &str, descriptor: &str) -> Option<&MethodDef> {
        self.body.method(name, descriptor)
    }

    /// Whether instances of this class may be used where `target` is
    /// expected: the class itself, a superclass or an implemented interface.
    #[must_use]
    pub fn is_subclass_of(&self, target: &str) -> bool {
        if self.body.name == target || self.body.interfaces.iter().any(|i| i == target) {
            return true;
        }

        match &self.super_class {
            Some(s) => s.is_subclass_of(target),
            None => self.body.super_name.as_deref() == Some(target),
        }
    }

    /// Fresh field values for a new instance.
    #[must_use]
    pub fn initial_fields(&self) -> Vec<Value> {
        self.slots.iter().map(|s| s.initial.clone()).collect()
    }
}
