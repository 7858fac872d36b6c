use super::*;
use crate::{
    class::{ClassBody, ClassBuilder, ClassKind, Intrinsic},
    error::ErrorClass,
};
use critter_schema::annotation::names;

const PERSON: &str = "com.example.Person";

fn person() -> ClassBuilder {
    ClassBuilder::new(PERSON, ClassKind::Entity)
        .extends(contract::OBJECT)
        .field("name", "Ljava/lang/String;", flags::PRIVATE)
        .field_with_initial("age", "I", flags::PRIVATE, Some(Constant::Int(21)))
        .method("getAge", "()I", flags::PUBLIC, |c| {
            c.load_this().get_field(PERSON, "age").ret();
        })
        .method("setAge", "(I)V", flags::PUBLIC, |c| {
            c.load_this().load(1).put_field(PERSON, "age").ret_void();
        })
        .method("getName", "()Ljava/lang/String;", flags::PUBLIC, |c| {
            c.load_this().get_field(PERSON, "name").ret();
        })
}

fn vm_with(bodies: &[ClassBody]) -> Vm {
    let registry = Arc::new(ClassRegistry::new());
    for body in bodies {
        registry.register_body(body).unwrap();
    }

    Vm::new(registry)
}

#[test]
fn fields_start_at_initializers_and_methods_run() {
    let vm = vm_with(&[person().build()]);
    let obj = vm.instantiate(PERSON, contract::NO_ARG_CONSTRUCTOR, vec![]).unwrap();

    assert_eq!(vm.invoke(&obj, "getAge", "()I", vec![]).unwrap(), Value::Int(21));
    assert_eq!(vm.invoke(&obj, "getName", "()Ljava/lang/String;", vec![]).unwrap(), Value::Null);

    vm.invoke(&obj, "setAge", "(I)V", vec![Value::Int(42)]).unwrap();
    assert_eq!(vm.get_field(&obj, "age").unwrap(), Value::Int(42));
}

#[test]
fn stores_check_value_kinds() {
    let vm = vm_with(&[person().build()]);
    let obj = vm.instantiate(PERSON, contract::NO_ARG_CONSTRUCTOR, vec![]).unwrap();

    let err = vm.set_field(&obj, "age", Value::Null).unwrap_err();
    assert_eq!(err.class, ErrorClass::TypeMismatch);

    let err = vm.invoke(&obj, "setAge", "(I)V", vec![Value::Long(1)]).unwrap_err();
    assert_eq!(err.class, ErrorClass::TypeMismatch);

    vm.set_field(&obj, "name", Value::from("hello")).unwrap();
    assert_eq!(vm.get_field(&obj, "name").unwrap(), Value::from("hello"));
}

#[test]
fn handles_bind_once_and_dispatch() {
    let vm = vm_with(&[person().build()]);
    let obj = vm.instantiate(PERSON, contract::NO_ARG_CONSTRUCTOR, vec![]).unwrap();

    let field = vm.resolve_field(PERSON, "age").unwrap();
    vm.handle_set(&field, &obj, Value::Int(7)).unwrap();
    assert_eq!(vm.handle_get(&field, &obj).unwrap(), Value::Int(7));

    let getter = vm.resolve_method(PERSON, "getAge", "()I").unwrap().unwrap();
    let setter = vm.resolve_method(PERSON, "setAge", "(I)V").unwrap().unwrap();
    vm.handle_set(&setter, &obj, Value::Int(9)).unwrap();
    assert_eq!(vm.handle_get(&getter, &obj).unwrap(), Value::Int(9));

    assert!(vm.resolve_method(PERSON, "setName", "(Ljava/lang/String;)V").unwrap().is_none());
    assert!(vm.resolve_field(PERSON, "missing").is_err());
}

#[test]
fn resolved_accessor_reports_missing_lookup_and_read_only() {
    let accessor = "com.example.PersonNameAccessor";
    let body = ClassBuilder::new(accessor, ClassKind::Accessor)
        .implements(contract::ACCESSOR)
        .field("$getter", contract::HANDLE_DESCRIPTOR, flags::PRIVATE | flags::FINAL)
        .field("$setter", contract::HANDLE_DESCRIPTOR, flags::PRIVATE | flags::FINAL)
        .method(contract::CONSTRUCTOR, contract::NO_ARG_CONSTRUCTOR, flags::PUBLIC, |c| {
            c.load_this()
                .resolve_method(PERSON, "getName", "()Ljava/lang/String;", true)
                .put_field(accessor, "$getter")
                .load_this()
                .resolve_method(PERSON, "setName", "(Ljava/lang/String;)V", false)
                .put_field(accessor, "$setter")
                .ret_void();
        })
        .member(contract::accessor::SET, |c| {
            c.load_this()
                .get_field(accessor, "$setter")
                .load(1)
                .check_cast(PERSON)
                .load(2)
                .check_cast(contract::STRING)
                .handle_set(PERSON, "name")
                .ret_void();
        })
        .build();

    // entity not registered yet: the constructor's lookup fails
    let vm = vm_with(&[body.clone()]);
    let err = vm.instantiate(accessor, contract::NO_ARG_CONSTRUCTOR, vec![]).unwrap_err();
    assert!(err.is_missing_lookup());

    let vm = vm_with(&[body, person().build()]);
    let acc = vm.instantiate(accessor, contract::NO_ARG_CONSTRUCTOR, vec![]).unwrap();
    let obj = vm.instantiate(PERSON, contract::NO_ARG_CONSTRUCTOR, vec![]).unwrap();

    let err = vm
        .invoke(
            &acc,
            contract::accessor::SET.name,
            contract::accessor::SET.descriptor,
            vec![Value::Object(obj), Value::from("x")],
        )
        .unwrap_err();
    assert!(err.is_read_only());
}

#[test]
fn constructors_replay_annotations_and_intrinsics() {
    let model = "com.example.PersonModel";
    let body = ClassBuilder::new(model, ClassKind::EntityModel)
        .field(contract::ANNOTATIONS_FIELD, contract::LIST_DESCRIPTOR, flags::PRIVATE)
        .field("collectionName", "Ljava/lang/String;", flags::PRIVATE)
        .field("config", contract::CONFIG_DESCRIPTOR, flags::PRIVATE)
        .method(
            contract::CONSTRUCTOR,
            contract::entity_model::CONSTRUCTOR_DESCRIPTOR,
            flags::PUBLIC,
            |c| {
                c.load_this()
                    .load(1)
                    .put_field(model, "config")
                    .load_this()
                    .new_list(0)
                    .put_field(model, contract::ANNOTATIONS_FIELD)
                    .load_this()
                    .annotation_begin(names::ENTITY)
                    .ldc_text("people")
                    .annotation_set("value")
                    .annotation_end()
                    .load_this()
                    .load(1)
                    .ldc_text("Person")
                    .intrinsic(Intrinsic::CollectionName)
                    .put_field(model, "collectionName")
                    .ret_void();
            },
        )
        .build();

    let vm = vm_with(&[body]);
    let config = Arc::new(MappingConfig::default());
    let obj = vm
        .instantiate(
            model,
            contract::entity_model::CONSTRUCTOR_DESCRIPTOR,
            vec![Value::Config(config)],
        )
        .unwrap();

    assert_eq!(vm.get_field(&obj, "collectionName").unwrap(), Value::from("person"));

    let annotations = vm.get_field(&obj, contract::ANNOTATIONS_FIELD).unwrap().into_list().unwrap();
    let entity = annotations[0].clone().into_annotation().unwrap();
    assert_eq!(entity.type_name, names::ENTITY);
    assert_eq!(entity.explicit_text("value"), Some("people"));
    assert_eq!(entity.bool("useDiscriminator"), Some(true));
}

#[test]
fn type_data_rebuilds_descriptor_trees() {
    let ty = critter_schema::types::parse_signature(
        "Ljava/util/Map<Ljava/lang/String;Ljava/util/List<[I>;>;",
    )
    .unwrap();
    let holder = "com.example.Holder";
    let body = ClassBuilder::new(holder, ClassKind::PropertyModel)
        .member(contract::property_model::TYPE_DATA, |c| {
            c.type_data(&ty).unwrap().ret();
        })
        .build();

    let vm = vm_with(&[body]);
    let obj = vm.instantiate(holder, contract::NO_ARG_CONSTRUCTOR, vec![]).unwrap();
    let out = vm
        .invoke(
            &obj,
            contract::property_model::TYPE_DATA.name,
            contract::property_model::TYPE_DATA.descriptor,
            vec![],
        )
        .unwrap();

    assert_eq!(out, Value::Type(ty));
}

#[test]
fn throw_bodies_fail_loudly() {
    let body = person()
        .method("compute", "()I", flags::PUBLIC, |c| {
            c.throw("no body for compute");
        })
        .build();
    let vm = vm_with(&[body]);
    let obj = vm.instantiate(PERSON, contract::NO_ARG_CONSTRUCTOR, vec![]).unwrap();

    let err = vm.invoke(&obj, "compute", "()I", vec![]).unwrap_err();
    assert_eq!(err.class, ErrorClass::Unsupported);
}

#[test]
fn runaway_recursion_is_stopped() {
    let body = ClassBuilder::new("com.example.Loop", ClassKind::Entity)
        .method("spin", "()V", flags::PUBLIC, |c| {
            c.load_this().invoke("com.example.Loop", "spin", "()V").ret_void();
        })
        .build();
    let vm = vm_with(&[body]);
    let obj = vm
        .instantiate("com.example.Loop", contract::NO_ARG_CONSTRUCTOR, vec![])
        .unwrap();

    let err = vm.invoke(&obj, "spin", "()V", vec![]).unwrap_err();
    assert_eq!(err.class, ErrorClass::InvariantViolation);
}
