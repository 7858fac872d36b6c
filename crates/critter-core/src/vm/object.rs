use crate::{error::InternalError, value::Value, vm::LoadedClass};
use derive_more::Deref;
use std::{
    fmt,
    sync::{Arc, RwLock},
};

///
/// Object
///
/// One instance of a loaded class. Fields live in slot order.
///

pub struct Object {
    class: Arc<LoadedClass>,
    fields: RwLock<Vec<Value>>,
}

impl Object {
    #[must_use]
    pub const fn class(&self) -> &Arc<LoadedClass> {
        &self.class
    }

    pub fn read(&self, slot: usize) -> Result<Value, InternalError> {
        self.fields
            .read()
            .expect("object fields lock poisoned")
            .get(slot)
            .cloned()
            .ok_or_else(|| self.bad_slot(slot))
    }

    pub fn write(&self, slot: usize, value: Value) -> Result<(), InternalError> {
        let mut fields = self.fields.write().expect("object fields lock poisoned");
        let target = fields.get_mut(slot).ok_or_else(|| self.bad_slot(slot))?;
        *target = value;

        Ok(())
    }

    fn bad_slot(&self, slot: usize) -> InternalError {
        InternalError::vm_invariant(format!(
            "slot {slot} out of range for {}",
            self.class.name()
        ))
    }
}

///
/// ObjectRef
///
/// Shared handle to an [`Object`]. Equality is identity.
///

#[derive(Clone, Deref)]
pub struct ObjectRef(Arc<Object>);

impl ObjectRef {
    /// Allocate an instance with every field at its initial value.
    #[must_use]
    pub fn new(class: Arc<LoadedClass>) -> Self {
        let fields = RwLock::new(class.initial_fields());

        Self(Arc::new(Object { class, fields }))
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        self.0.class.name()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({}@{:p})", self.class_name(), Arc::as_ptr(&self.0))
    }
}
