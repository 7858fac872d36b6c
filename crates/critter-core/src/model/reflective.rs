use crate::{
    annotation::AnnotationRegistry,
    error::{ErrorOrigin, InternalError},
    model::{EntityModel, PropertyAccessor, PropertyModel},
    value::Value,
    vm::{MemberHandle, ObjectRef, Vm},
};
use critter_schema::prelude::*;
use std::sync::Arc;

// Annotations as a generated model would replay them: unknown types are
// dropped and absent elements take their declared defaults.
fn replayed(
    registry: &AnnotationRegistry,
    annotations: &[AnnotationMeta],
) -> Result<Vec<AnnotationMeta>, InternalError> {
    annotations
        .iter()
        .filter(|a| registry.contains(&a.type_name))
        .map(|a| registry.complete(a))
        .collect()
}

///
/// ReflectiveAccessor
///
/// Resolves its members once at construction and dispatches through the
/// bound handles afterwards. Behaves exactly like a resolved-reference
/// generated accessor, without generating anything.
///

pub struct ReflectiveAccessor {
    vm: Vm,
    entity: String,
    property: String,
    getter: MemberHandle,
    setter: Option<MemberHandle>,
}

impl ReflectiveAccessor {
    pub fn new(vm: Vm, entity: &str, property: &PropertyDescriptor) -> Result<Self, InternalError> {
        let lookup = |member: &str, err: InternalError| InternalError::missing_lookup(entity, member, err);

        let (getter, setter) = match &property.access {
            PropertyAccess::Field => {
                let handle = vm
                    .resolve_field(entity, &property.name)
                    .map_err(|e| lookup(&property.name, e))?;
                (handle.clone(), Some(handle))
            }
            PropertyAccess::Method { getter, setter } => {
                let get = vm
                    .resolve_method(entity, &getter.name, &getter.descriptor)
                    .map_err(|e| lookup(&getter.name, e))?
                    .ok_or_else(|| {
                        lookup(
                            &getter.name,
                            InternalError::missing_target(
                                ErrorOrigin::Accessor,
                                format!("no method {getter} on {entity}"),
                            ),
                        )
                    })?;
                let set = match setter {
                    Some(setter) => vm
                        .resolve_method(entity, &setter.name, &setter.descriptor)
                        .map_err(|e| lookup(&setter.name, e))?,
                    None => None,
                };
                (get, set)
            }
        };

        Ok(Self {
            vm,
            entity: entity.to_string(),
            property: property.name.clone(),
            getter,
            setter,
        })
    }

    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }
}

impl PropertyAccessor for ReflectiveAccessor {
    fn get(&self, instance: &ObjectRef) -> Result<Value, InternalError> {
        self.vm.handle_get(&self.getter, instance)
    }

    fn set(&self, instance: &ObjectRef, value: Value) -> Result<(), InternalError> {
        let setter = self
            .setter
            .as_ref()
            .ok_or_else(|| InternalError::read_only(&self.entity, &self.property))?;

        self.vm.handle_set(setter, instance, value)
    }
}

///
/// ReflectivePropertyModel
///

pub struct ReflectivePropertyModel {
    vm: Vm,
    entity: String,
    descriptor: PropertyDescriptor,
    annotations: Vec<AnnotationMeta>,
}

impl ReflectivePropertyModel {
    pub fn new(vm: Vm, entity: &str, descriptor: PropertyDescriptor) -> Result<Self, InternalError> {
        let annotations = replayed(vm.registry().annotations(), &descriptor.annotations)?;

        Ok(Self {
            vm,
            entity: entity.to_string(),
            descriptor,
            annotations,
        })
    }

    #[must_use]
    pub const fn descriptor(&self) -> &PropertyDescriptor {
        &self.descriptor
    }
}

impl PropertyModel for ReflectivePropertyModel {
    fn name(&self) -> Result<String, InternalError> {
        Ok(self.descriptor.name.clone())
    }

    fn full_name(&self) -> Result<String, InternalError> {
        Ok(self.descriptor.full_name(&self.entity))
    }

    fn mapped_name(&self) -> Result<String, InternalError> {
        Ok(self.descriptor.mapped_name.clone())
    }

    fn load_names(&self) -> Result<Vec<String>, InternalError> {
        Ok(self.descriptor.load_names.clone())
    }

    fn type_descriptor(&self) -> Result<TypeDescriptor, InternalError> {
        Ok(self.descriptor.type_descriptor.clone())
    }

    fn is_array(&self) -> Result<bool, InternalError> {
        Ok(self.descriptor.flags.array)
    }

    fn is_map(&self) -> Result<bool, InternalError> {
        Ok(self.descriptor.flags.map)
    }

    fn is_set(&self) -> Result<bool, InternalError> {
        Ok(self.descriptor.flags.set)
    }

    fn is_collection(&self) -> Result<bool, InternalError> {
        Ok(self.descriptor.flags.collection)
    }

    fn is_final(&self) -> Result<bool, InternalError> {
        Ok(self.descriptor.flags.final_)
    }

    fn is_transient(&self) -> Result<bool, InternalError> {
        Ok(self.descriptor.flags.transient)
    }

    fn is_reference(&self) -> Result<bool, InternalError> {
        Ok(self.descriptor.flags.reference)
    }

    fn is_id(&self) -> Result<bool, InternalError> {
        Ok(self.descriptor.flags.id)
    }

    fn is_version(&self) -> Result<bool, InternalError> {
        Ok(self.descriptor.flags.version)
    }

    fn annotations(&self) -> Result<Vec<AnnotationMeta>, InternalError> {
        Ok(self.annotations.clone())
    }

    fn accessor(&self) -> Result<Arc<dyn PropertyAccessor>, InternalError> {
        let accessor = ReflectiveAccessor::new(self.vm.clone(), &self.entity, &self.descriptor)?;

        Ok(Arc::new(accessor))
    }
}

///
/// ReflectiveEntityModel
///
/// Reference model computed straight from an [`EntityDescriptor`]. Generated
/// entity models must answer every query the same way.
///

pub struct ReflectiveEntityModel {
    descriptor: EntityDescriptor,
    collection_name: String,
    discriminator: String,
    discriminator_key: String,
    annotations: Vec<AnnotationMeta>,
    properties: Vec<Arc<dyn PropertyModel>>,
}

impl ReflectiveEntityModel {
    pub fn new(
        descriptor: EntityDescriptor,
        config: &MappingConfig,
        vm: Vm,
    ) -> Result<Self, InternalError> {
        let annotations = replayed(vm.registry().annotations(), &descriptor.annotations)?;
        let properties = descriptor
            .properties
            .iter()
            .map(|p| {
                let model: Arc<dyn PropertyModel> = Arc::new(ReflectivePropertyModel::new(
                    vm.clone(),
                    &descriptor.name,
                    p.clone(),
                )?);
                Ok(model)
            })
            .collect::<Result<Vec<_>, InternalError>>()?;

        Ok(Self {
            collection_name: descriptor.collection_name(config),
            discriminator: descriptor.discriminator(config),
            discriminator_key: descriptor.discriminator_key(config),
            annotations,
            properties,
            descriptor,
        })
    }

    #[must_use]
    pub const fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }
}

impl EntityModel for ReflectiveEntityModel {
    fn name(&self) -> Result<String, InternalError> {
        Ok(self.descriptor.name.clone())
    }

    fn simple_name(&self) -> Result<String, InternalError> {
        Ok(self.descriptor.simple_name.clone())
    }

    fn collection_name(&self) -> Result<String, InternalError> {
        Ok(self.collection_name.clone())
    }

    fn discriminator(&self) -> Result<String, InternalError> {
        Ok(self.discriminator.clone())
    }

    fn discriminator_key(&self) -> Result<String, InternalError> {
        Ok(self.discriminator_key.clone())
    }

    fn use_discriminator(&self) -> Result<bool, InternalError> {
        Ok(self.descriptor.entity.use_discriminator)
    }

    fn is_abstract(&self) -> Result<bool, InternalError> {
        Ok(self.descriptor.is_abstract)
    }

    fn is_interface(&self) -> Result<bool, InternalError> {
        Ok(self.descriptor.is_interface)
    }

    fn is_embedded(&self) -> Result<bool, InternalError> {
        Ok(self.descriptor.entity.embedded)
    }

    fn type_descriptor(&self) -> Result<TypeDescriptor, InternalError> {
        Ok(self.descriptor.type_descriptor())
    }

    fn annotations(&self) -> Result<Vec<AnnotationMeta>, InternalError> {
        Ok(self.annotations.clone())
    }

    fn properties(&self) -> Result<Vec<Arc<dyn PropertyModel>>, InternalError> {
        Ok(self.properties.clone())
    }
}
