use crate::{
    contract::{self, Member, accessor, entity_model, property_model},
    error::InternalError,
    model::{EntityModel, PropertyAccessor, PropertyModel},
    registry::ClassRegistry,
    value::Value,
    vm::{ObjectRef, Vm},
};
use critter_schema::prelude::*;
use std::sync::Arc;

// Zero-argument contract call on a generated instance.
fn call(vm: &Vm, object: &ObjectRef, member: Member) -> Result<Value, InternalError> {
    vm.invoke(object, member.name, member.descriptor, Vec::new())
}

fn annotations(value: Value) -> Result<Vec<AnnotationMeta>, InternalError> {
    value
        .into_list()?
        .into_iter()
        .map(Value::into_annotation)
        .collect()
}

///
/// GeneratedAccessor
///

#[derive(Clone)]
pub struct GeneratedAccessor {
    vm: Vm,
    object: ObjectRef,
}

impl GeneratedAccessor {
    /// Instantiate a generated accessor class through its no-arg constructor.
    pub fn instantiate(vm: Vm, class: &str) -> Result<Self, InternalError> {
        let object = vm.instantiate(class, contract::NO_ARG_CONSTRUCTOR, Vec::new())?;

        Self::from_object(vm, object)
    }

    /// Wrap an existing instance; it must implement the accessor contract.
    pub fn from_object(vm: Vm, object: ObjectRef) -> Result<Self, InternalError> {
        if !object.class().is_subclass_of(contract::ACCESSOR) {
            return Err(InternalError::model_type_mismatch(format!(
                "{} does not implement {}",
                object.class_name(),
                contract::ACCESSOR
            )));
        }

        Ok(Self { vm, object })
    }

    #[must_use]
    pub const fn object(&self) -> &ObjectRef {
        &self.object
    }
}

impl PropertyAccessor for GeneratedAccessor {
    fn get(&self, instance: &ObjectRef) -> Result<Value, InternalError> {
        self.vm.invoke(
            &self.object,
            accessor::GET.name,
            accessor::GET.descriptor,
            vec![Value::Object(instance.clone())],
        )
    }

    fn set(&self, instance: &ObjectRef, value: Value) -> Result<(), InternalError> {
        self.vm
            .invoke(
                &self.object,
                accessor::SET.name,
                accessor::SET.descriptor,
                vec![Value::Object(instance.clone()), value],
            )
            .map(|_| ())
    }
}

///
/// GeneratedPropertyModel
///

#[derive(Clone)]
pub struct GeneratedPropertyModel {
    vm: Vm,
    object: ObjectRef,
}

impl GeneratedPropertyModel {
    #[must_use]
    pub const fn new(vm: Vm, object: ObjectRef) -> Self {
        Self { vm, object }
    }

    #[must_use]
    pub const fn object(&self) -> &ObjectRef {
        &self.object
    }

    fn text(&self, member: Member) -> Result<String, InternalError> {
        call(&self.vm, &self.object, member)?.into_text()
    }

    fn flag(&self, member: Member) -> Result<bool, InternalError> {
        call(&self.vm, &self.object, member)?.into_bool()
    }
}

impl PropertyModel for GeneratedPropertyModel {
    fn name(&self) -> Result<String, InternalError> {
        self.text(property_model::NAME)
    }

    fn full_name(&self) -> Result<String, InternalError> {
        self.text(property_model::FULL_NAME)
    }

    fn mapped_name(&self) -> Result<String, InternalError> {
        self.text(property_model::MAPPED_NAME)
    }

    fn load_names(&self) -> Result<Vec<String>, InternalError> {
        call(&self.vm, &self.object, property_model::LOAD_NAMES)?.into_texts()
    }

    fn type_descriptor(&self) -> Result<TypeDescriptor, InternalError> {
        call(&self.vm, &self.object, property_model::TYPE_DATA)?.into_type()
    }

    fn is_array(&self) -> Result<bool, InternalError> {
        self.flag(property_model::IS_ARRAY)
    }

    fn is_map(&self) -> Result<bool, InternalError> {
        self.flag(property_model::IS_MAP)
    }

    fn is_set(&self) -> Result<bool, InternalError> {
        self.flag(property_model::IS_SET)
    }

    fn is_collection(&self) -> Result<bool, InternalError> {
        self.flag(property_model::IS_COLLECTION)
    }

    fn is_final(&self) -> Result<bool, InternalError> {
        self.flag(property_model::IS_FINAL)
    }

    fn is_transient(&self) -> Result<bool, InternalError> {
        self.flag(property_model::IS_TRANSIENT)
    }

    fn is_reference(&self) -> Result<bool, InternalError> {
        self.flag(property_model::IS_REFERENCE)
    }

    fn is_id(&self) -> Result<bool, InternalError> {
        self.flag(property_model::IS_ID)
    }

    fn is_version(&self) -> Result<bool, InternalError> {
        self.flag(property_model::IS_VERSION)
    }

    fn annotations(&self) -> Result<Vec<AnnotationMeta>, InternalError> {
        annotations(call(&self.vm, &self.object, property_model::ANNOTATIONS)?)
    }

    fn accessor(&self) -> Result<Arc<dyn PropertyAccessor>, InternalError> {
        let object = call(&self.vm, &self.object, property_model::ACCESSOR)?.into_object()?;
        let accessor = GeneratedAccessor::from_object(self.vm.clone(), object)?;

        Ok(Arc::new(accessor))
    }
}

///
/// GeneratedEntityModel
///
/// Handle over an instantiated entity-model class. The generated constructor
/// takes the mapping configuration as its only argument.
///

#[derive(Clone)]
pub struct GeneratedEntityModel {
    vm: Vm,
    object: ObjectRef,
}

impl GeneratedEntityModel {
    pub fn instantiate(
        registry: Arc<ClassRegistry>,
        class: &str,
        config: Arc<MappingConfig>,
    ) -> Result<Self, InternalError> {
        let vm = Vm::new(registry);
        let object = vm.instantiate(
            class,
            entity_model::CONSTRUCTOR_DESCRIPTOR,
            vec![Value::Config(config)],
        )?;

        Ok(Self { vm, object })
    }

    #[must_use]
    pub const fn vm(&self) -> &Vm {
        &self.vm
    }

    #[must_use]
    pub const fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// The configuration handed to the constructor.
    pub fn config(&self) -> Result<Arc<MappingConfig>, InternalError> {
        call(&self.vm, &self.object, entity_model::CONFIG)?.into_config()
    }

    fn text(&self, member: Member) -> Result<String, InternalError> {
        call(&self.vm, &self.object, member)?.into_text()
    }

    fn flag(&self, member: Member) -> Result<bool, InternalError> {
        call(&self.vm, &self.object, member)?.into_bool()
    }
}

impl EntityModel for GeneratedEntityModel {
    fn name(&self) -> Result<String, InternalError> {
        self.text(entity_model::NAME)
    }

    fn simple_name(&self) -> Result<String, InternalError> {
        self.text(entity_model::SIMPLE_NAME)
    }

    fn collection_name(&self) -> Result<String, InternalError> {
        self.text(entity_model::COLLECTION_NAME)
    }

    fn discriminator(&self) -> Result<String, InternalError> {
        self.text(entity_model::DISCRIMINATOR)
    }

    fn discriminator_key(&self) -> Result<String, InternalError> {
        self.text(entity_model::DISCRIMINATOR_KEY)
    }

    fn use_discriminator(&self) -> Result<bool, InternalError> {
        self.flag(entity_model::USE_DISCRIMINATOR)
    }

    fn is_abstract(&self) -> Result<bool, InternalError> {
        self.flag(entity_model::IS_ABSTRACT)
    }

    fn is_interface(&self) -> Result<bool, InternalError> {
        self.flag(entity_model::IS_INTERFACE)
    }

    fn is_embedded(&self) -> Result<bool, InternalError> {
        self.flag(entity_model::IS_EMBEDDED)
    }

    fn type_descriptor(&self) -> Result<TypeDescriptor, InternalError> {
        call(&self.vm, &self.object, entity_model::TYPE)?.into_type()
    }

    fn annotations(&self) -> Result<Vec<AnnotationMeta>, InternalError> {
        annotations(call(&self.vm, &self.object, entity_model::ANNOTATIONS)?)
    }

    fn properties(&self) -> Result<Vec<Arc<dyn PropertyModel>>, InternalError> {
        call(&self.vm, &self.object, entity_model::PROPERTIES)?
            .into_list()?
            .into_iter()
            .map(|v| {
                let object = v.into_object()?;
                let model: Arc<dyn PropertyModel> =
                    Arc::new(GeneratedPropertyModel::new(self.vm.clone(), object));
                Ok(model)
            })
            .collect()
    }
}
