//! Interpreter for generated classes.
//!
//! Objects are slot vectors behind a lock, methods are straight-line
//! instruction lists, and every class comes from the [`ClassRegistry`]. The
//! interpreter checks value kinds at each store and cast, so a bad body fails
//! with a typed error rather than corrupting an instance.

mod class;
mod handle;
mod interp;
mod object;

pub use class::{FieldSlot, LoadedClass};
pub use handle::MemberHandle;
pub use object::{Object, ObjectRef};

use crate::{
    contract,
    error::{ErrorOrigin, InternalError},
    registry::ClassRegistry,
    value::Value,
};
use critter_schema::{prelude::*, types::parse_method_signature};
use std::sync::Arc;

/// Nested calls allowed before a call chain is treated as runaway.
pub const MAX_CALL_DEPTH: usize = 256;

///
/// Vm
///

#[derive(Clone)]
pub struct Vm {
    registry: Arc<ClassRegistry>,
}

impl Vm {
    #[must_use]
    pub const fn new(registry: Arc<ClassRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<ClassRegistry> {
        &self.registry
    }

    /// Load `class` and run the constructor matching `descriptor`.
    pub fn instantiate(
        &self,
        class: &str,
        descriptor: &str,
        args: Vec<Value>,
    ) -> Result<ObjectRef, InternalError> {
        self.construct(class, descriptor, args, 0)
    }

    /// Invoke a method on `receiver`, dispatching on its runtime class.
    /// Void methods yield `Value::Null`.
    pub fn invoke(
        &self,
        receiver: &ObjectRef,
        name: &str,
        descriptor: &str,
        args: Vec<Value>,
    ) -> Result<Value, InternalError> {
        self.call(receiver, name, descriptor, args, 0)
    }

    pub fn get_field(&self, obj: &ObjectRef, name: &str) -> Result<Value, InternalError> {
        let slot = field_slot(obj, name)?;

        obj.read(slot)
    }

    pub fn set_field(&self, obj: &ObjectRef, name: &str, value: Value) -> Result<(), InternalError> {
        let slot = field_slot(obj, name)?;
        self.store(obj, slot, value)
    }

    /// Bind a field of `class` once.
    pub fn resolve_field(&self, class: &str, name: &str) -> Result<MemberHandle, InternalError> {
        let loaded = self.registry.load_class(class)?;
        let slot = loaded.slot(name).ok_or_else(|| {
            InternalError::missing_target(ErrorOrigin::Vm, format!("no field '{name}' on {class}"))
        })?;
        let ty = loaded
            .field_slot(slot)
            .map(|s| s.ty.clone())
            .ok_or_else(|| InternalError::vm_invariant(format!("dangling slot {slot} on {class}")))?;

        Ok(MemberHandle::Field {
            class: loaded,
            slot,
            name: name.to_string(),
            ty,
        })
    }

    /// Bind a method of `class` once. An absent method is `Ok(None)`; an
    /// absent class is an error.
    pub fn resolve_method(
        &self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<Option<MemberHandle>, InternalError> {
        let loaded = self.registry.load_class(class)?;
        if loaded.find_method(name, descriptor).is_none() {
            return Ok(None);
        }

        let arity = parse_method_signature(descriptor)
            .map_err(|e| InternalError::vm_invariant(format!("{descriptor}: {e}")))?
            .arity();

        Ok(Some(MemberHandle::Method {
            class: loaded,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            arity,
        }))
    }

    /// Read through a bound handle.
    pub fn handle_get(&self, handle: &MemberHandle, obj: &ObjectRef) -> Result<Value, InternalError> {
        self.handle_get_at(handle, obj, 0)
    }

    /// Write through a bound handle.
    pub fn handle_set(
        &self,
        handle: &MemberHandle,
        obj: &ObjectRef,
        value: Value,
    ) -> Result<(), InternalError> {
        self.handle_set_at(handle, obj, value, 0)
    }

    /// Whether `value` may be used where an instance of `target` is expected.
    #[must_use]
    pub fn conforms(&self, value: &Value, target: &str) -> bool {
        value.conforms_with(target, &|obj, class| obj.class().is_subclass_of(class))
    }

    /// Whether `value` may be stored in a slot of type `ty`. Primitive slots
    /// take only their exact variant; null never fits them.
    #[must_use]
    pub fn conforms_to_type(&self, value: &Value, ty: &TypeDescriptor) -> bool {
        match ty.primitive_type() {
            Some(p) => value.primitive() == Some(p),
            None => self.conforms(value, &ty.cast_name()),
        }
    }

    fn construct(
        &self,
        class: &str,
        descriptor: &str,
        args: Vec<Value>,
        depth: usize,
    ) -> Result<ObjectRef, InternalError> {
        let loaded = self.registry.load_class(class)?;
        let obj = ObjectRef::new(Arc::clone(&loaded));

        match loaded.declared_method(contract::CONSTRUCTOR, descriptor) {
            Some(ctor) => {
                self.execute(&obj, ctor, args, depth)?;
            }
            None if descriptor == contract::NO_ARG_CONSTRUCTOR && args.is_empty() => {}
            None => {
                return Err(InternalError::missing_target(
                    ErrorOrigin::Vm,
                    format!("{class} has no constructor {descriptor}"),
                ));
            }
        }

        Ok(obj)
    }

    fn call(
        &self,
        receiver: &ObjectRef,
        name: &str,
        descriptor: &str,
        args: Vec<Value>,
        depth: usize,
    ) -> Result<Value, InternalError> {
        let class = Arc::clone(receiver.class());
        let method = class.find_method(name, descriptor).ok_or_else(|| {
            InternalError::missing_target(
                ErrorOrigin::Vm,
                format!("no method {name}{descriptor} on {}", class.name()),
            )
        })?;

        self.execute(receiver, method, args, depth)
    }

    fn store(&self, obj: &ObjectRef, slot: usize, value: Value) -> Result<(), InternalError> {
        let field = obj.class().field_slot(slot).ok_or_else(|| {
            InternalError::vm_invariant(format!("slot {slot} out of range for {}", obj.class_name()))
        })?;

        if !self.conforms_to_type(&value, &field.ty) {
            return Err(InternalError::vm_type_mismatch(format!(
                "cannot store {} in {}.{} of type {}",
                value.kind_name(),
                obj.class_name(),
                field.name,
                field.ty
            )));
        }

        obj.write(slot, value)
    }

    fn check_receiver(handle: &MemberHandle, obj: &ObjectRef) -> Result<(), InternalError> {
        let owner = handle.class().name();
        if obj.class().is_subclass_of(owner) {
            Ok(())
        } else {
            Err(InternalError::vm_type_mismatch(format!(
                "{handle} used on an instance of {}",
                obj.class_name()
            )))
        }
    }

    fn handle_get_at(
        &self,
        handle: &MemberHandle,
        obj: &ObjectRef,
        depth: usize,
    ) -> Result<Value, InternalError> {
        Self::check_receiver(handle, obj)?;

        match handle {
            MemberHandle::Field { slot, .. } => obj.read(*slot),
            MemberHandle::Method {
                name,
                descriptor,
                arity: 0,
                ..
            } => self.call(obj, name, descriptor, Vec::new(), depth + 1),
            MemberHandle::Method { .. } => Err(InternalError::vm_type_mismatch(format!(
                "{handle} is not a getter"
            ))),
        }
    }

    fn handle_set_at(
        &self,
        handle: &MemberHandle,
        obj: &ObjectRef,
        value: Value,
        depth: usize,
    ) -> Result<(), InternalError> {
        Self::check_receiver(handle, obj)?;

        match handle {
            MemberHandle::Field { slot, .. } => self.store(obj, *slot, value),
            MemberHandle::Method {
                name,
                descriptor,
                arity: 1,
                ..
            } => self
                .call(obj, name, descriptor, vec![value], depth + 1)
                .map(|_| ()),
            MemberHandle::Method { .. } => Err(InternalError::vm_type_mismatch(format!(
                "{handle} is not a setter"
            ))),
        }
    }
}

fn field_slot(obj: &ObjectRef, name: &str) -> Result<usize, InternalError> {
    obj.class().slot(name).ok_or_else(|| {
        InternalError::missing_target(
            ErrorOrigin::Vm,
            format!("no field '{name}' on {}", obj.class_name()),
        )
    })
}

#[cfg(test)]
mod tests;
