mod fixtures;

use critter_build::prelude::*;
use critter_core::{
    class::{ClassBuilder, ClassKind},
    contract,
    error::ErrorClass,
    model::{EntityModel, GeneratedAccessor, PropertyAccessor, PropertyModel},
    registry::Registration,
    value::Value,
};
use critter_schema::prelude::*;
use fixtures::*;
use proptest::prelude::*;

fn generated(mode: GenerationMode, meta: &ClassMeta, config: MappingConfig) -> (Critter, GeneratedEntity) {
    let critter = Critter::new(config).mode(mode);
    let generated = critter.generate(meta).unwrap();

    (critter, generated)
}

#[test]
fn string_field_starts_absent() {
    init_logger();

    for mode in MODES {
        let (critter, generated) = generated(mode, &person(), MappingConfig::default());
        let model = critter.entity_model(&generated).unwrap();
        let vm = critter.vm();
        let instance = new_instance(&vm, PERSON);
        let name = accessor(&model, "name");

        assert_eq!(name.get(&instance).unwrap(), Value::Null, "{mode}");
        name.set(&instance, Value::from("hello")).unwrap();
        assert_eq!(name.get(&instance).unwrap(), Value::from("hello"), "{mode}");
    }
}

#[test]
fn primitive_field_starts_at_its_initializer() {
    init_logger();

    for mode in MODES {
        let (critter, generated) = generated(mode, &person(), MappingConfig::default());
        let model = critter.entity_model(&generated).unwrap();
        let vm = critter.vm();
        let instance = new_instance(&vm, PERSON);
        let age = accessor(&model, "age");

        assert_eq!(age.get(&instance).unwrap(), Value::Int(21), "{mode}");
        age.set(&instance, Value::Int(42)).unwrap();
        assert_eq!(age.get(&instance).unwrap(), Value::Int(42), "{mode}");

        // the entity's own getter sees the same slot
        assert_eq!(vm.invoke(&instance, "getAge", "()I", vec![]).unwrap(), Value::Int(42));
    }
}

#[test]
fn boxed_field_starts_at_its_initializer() {
    init_logger();

    for mode in MODES {
        let (critter, generated) = generated(mode, &person(), MappingConfig::default());
        let model = critter.entity_model(&generated).unwrap();
        let vm = critter.vm();
        let instance = new_instance(&vm, PERSON);
        let salary = accessor(&model, "salary");

        assert_eq!(salary.get(&instance).unwrap(), Value::Long(2), "{mode}");
        salary.set(&instance, Value::Long(100_000)).unwrap();
        assert_eq!(salary.get(&instance).unwrap(), Value::Long(100_000), "{mode}");

        // boxed properties accept null, primitives do not
        salary.set(&instance, Value::Null).unwrap();
        assert_eq!(salary.get(&instance).unwrap(), Value::Null, "{mode}");
    }
}

#[test]
fn collections_round_trip() {
    for mode in MODES {
        let (critter, generated) = generated(mode, &person(), MappingConfig::default());
        let model = critter.entity_model(&generated).unwrap();
        let vm = critter.vm();
        let instance = new_instance(&vm, PERSON);
        let tags = accessor(&model, "tags");

        tags.set(&instance, text_list(&["a", "b"])).unwrap();
        assert_eq!(tags.get(&instance).unwrap(), text_list(&["a", "b"]), "{mode}");
    }
}

#[test]
fn wrong_value_kinds_are_type_mismatches() {
    for mode in MODES {
        let (critter, generated) = generated(mode, &person(), MappingConfig::default());
        let model = critter.entity_model(&generated).unwrap();
        let vm = critter.vm();
        let instance = new_instance(&vm, PERSON);

        let err = accessor(&model, "age").set(&instance, Value::Null).unwrap_err();
        assert_eq!(err.class, ErrorClass::TypeMismatch, "{mode}");

        let err = accessor(&model, "name")
            .set(&instance, Value::Int(1))
            .unwrap_err();
        assert_eq!(err.class, ErrorClass::TypeMismatch, "{mode}");

        // the instance is left untouched
        assert_eq!(accessor(&model, "age").get(&instance).unwrap(), Value::Int(21));
    }
}

#[test]
fn accessors_reject_foreign_instances() {
    let (critter, generated) = generated(
        GenerationMode::Runtime,
        &account(),
        MappingConfig::annotated(),
    );
    critter.generate(&person()).unwrap();
    let model = critter.entity_model(&generated).unwrap();
    let vm = critter.vm();
    let stranger = new_instance(&vm, PERSON);

    let err = accessor(&model, "owner").get(&stranger).unwrap_err();
    assert_eq!(err.class, ErrorClass::TypeMismatch);
}

#[test]
fn getter_backed_properties_in_runtime_mode() {
    init_logger();

    let (critter, generated) = generated(
        GenerationMode::Runtime,
        &account(),
        MappingConfig::annotated(),
    );
    let model = critter.entity_model(&generated).unwrap();
    let vm = critter.vm();
    let instance = new_instance(&vm, ACCOUNT);

    let balance = accessor(&model, "balance");
    assert_eq!(balance.get(&instance).unwrap(), Value::Long(0));
    balance.set(&instance, Value::Long(500)).unwrap();
    assert_eq!(balance.get(&instance).unwrap(), Value::Long(500));
    assert_eq!(vm.get_field(&instance, "balance").unwrap(), Value::Long(500));

    let code = accessor(&model, "code");
    assert_eq!(code.get(&instance).unwrap(), Value::from("ACC"));

    let err = code.set(&instance, Value::from("XYZ")).unwrap_err();
    assert!(err.is_read_only());
    assert_eq!(err.class, ErrorClass::ReadOnly);
    assert_eq!(code.get(&instance).unwrap(), Value::from("ACC"));
}

#[test]
fn getter_backed_properties_need_runtime_mode() {
    for backend in [Backend::Direct, Backend::Builder] {
        let critter = Critter::new(MappingConfig::annotated())
            .mode(GenerationMode::SelfContained(backend));

        let err = critter.generate(&account()).unwrap_err();
        assert!(err.is_unsupported(), "{backend}: {err}");
        assert!(critter.registry().is_empty());
    }
}

#[test]
fn resolved_accessors_report_missing_members() {
    let critter = Critter::new(MappingConfig::default()).mode(GenerationMode::Runtime);
    let descriptor = critter.describe(&person()).unwrap();
    let age = descriptor.property("age").unwrap();

    // the registered entity lacks the field the accessor binds to
    let record = Backend::Resolved.generate(&descriptor, age).unwrap();
    let accessor_class = record.name().to_string();
    critter.registry().register_all(vec![record]).unwrap();
    critter
        .registry()
        .register_body(
            &ClassBuilder::new(PERSON, ClassKind::Entity)
                .extends(contract::OBJECT)
                .build(),
        )
        .unwrap();

    let err = GeneratedAccessor::instantiate(critter.vm(), &accessor_class)
        .err()
        .unwrap();
    assert!(err.is_missing_lookup(), "{err}");
}

#[test]
fn every_backend_agrees_on_the_same_instance() {
    // Direct and Builder emit identical bodies, so they can share a registry
    let critter = Critter::new(MappingConfig::default());
    let generated = critter.generate(&person()).unwrap();
    let descriptor = &generated.descriptor;
    let vm = critter.vm();
    let instance = new_instance(&vm, PERSON);

    let class = critter_build::names::accessor_class(PERSON, "age");
    let direct = GeneratedAccessor::instantiate(vm.clone(), &class).unwrap();
    direct.set(&instance, Value::Int(7)).unwrap();

    let record = Backend::Builder
        .generate(descriptor, descriptor.property("age").unwrap())
        .unwrap();
    assert_eq!(
        critter.registry().register_all(vec![record]).unwrap(),
        vec![Registration::Unchanged]
    );

    let model = critter.entity_model(&generated).unwrap();
    assert_eq!(accessor(&model, "age").get(&instance).unwrap(), Value::Int(7));
}

#[test]
fn narrow_primitives_start_at_their_initializers() {
    init_logger();

    for mode in MODES {
        let (critter, generated) = generated(mode, &gauge(), MappingConfig::default());
        let model = critter.entity_model(&generated).unwrap();
        let instance = new_instance(&critter.vm(), GAUGE);

        for (property, expected) in [
            ("flag", Value::Bool(true)),
            ("level", Value::Byte(i8::MIN)),
            ("code", Value::Char('A')),
            ("count", Value::Short(-2)),
            ("ratio", Value::Float(1.5)),
            ("weight", Value::Double(0.25)),
            ("small", Value::Byte(7)),
            ("readings", Value::Null),
            ("names", Value::Null),
        ] {
            assert_eq!(
                accessor(&model, property).get(&instance).unwrap(),
                expected,
                "{mode} {property}"
            );
        }
    }
}

#[test]
fn narrow_primitives_hold_their_bounds() {
    let cases = [
        ("flag", vec![Value::Bool(false), Value::Bool(true)]),
        ("level", vec![Value::Byte(i8::MIN), Value::Byte(i8::MAX), Value::Byte(0)]),
        ("code", vec![Value::Char('\0'), Value::Char('\u{FFFF}'), Value::Char('é')]),
        ("count", vec![Value::Short(i16::MIN), Value::Short(i16::MAX)]),
        (
            "ratio",
            vec![
                Value::Float(f32::MIN_POSITIVE),
                Value::Float(f32::INFINITY),
                Value::Float(-0.0),
            ],
        ),
        (
            "weight",
            vec![
                Value::Double(f64::MAX),
                Value::Double(f64::NEG_INFINITY),
                Value::Double(f64::EPSILON),
            ],
        ),
        ("small", vec![Value::Byte(i8::MAX), Value::Null]),
    ];

    for mode in MODES {
        let (critter, generated) = generated(mode, &gauge(), MappingConfig::default());
        let model = critter.entity_model(&generated).unwrap();
        let instance = new_instance(&critter.vm(), GAUGE);

        for (property, values) in &cases {
            let access = accessor(&model, property);
            for value in values {
                access.set(&instance, value.clone()).unwrap();
                assert_eq!(&access.get(&instance).unwrap(), value, "{mode} {property}");
            }
        }

        let ratio = accessor(&model, "ratio");
        ratio.set(&instance, Value::Float(f32::NAN)).unwrap();
        assert!(matches!(ratio.get(&instance).unwrap(), Value::Float(v) if v.is_nan()), "{mode}");

        let weight = accessor(&model, "weight");
        weight.set(&instance, Value::Double(f64::NAN)).unwrap();
        assert!(matches!(weight.get(&instance).unwrap(), Value::Double(v) if v.is_nan()), "{mode}");
    }
}

#[test]
fn narrow_primitives_take_only_their_own_kind() {
    for mode in MODES {
        let (critter, generated) = generated(mode, &gauge(), MappingConfig::default());
        let model = critter.entity_model(&generated).unwrap();
        let instance = new_instance(&critter.vm(), GAUGE);

        for (property, wrong) in [
            ("flag", Value::Int(1)),
            ("flag", Value::Null),
            ("level", Value::Int(1)),
            ("code", Value::from("A")),
            ("count", Value::Int(1)),
            ("ratio", Value::Double(1.5)),
            ("weight", Value::Float(0.25)),
            ("small", Value::Short(7)),
        ] {
            let err = accessor(&model, property).set(&instance, wrong).unwrap_err();
            assert_eq!(err.class, ErrorClass::TypeMismatch, "{mode} {property}");
        }

        assert_eq!(accessor(&model, "level").get(&instance).unwrap(), Value::Byte(i8::MIN));
    }
}

#[test]
fn arrays_round_trip() {
    for mode in MODES {
        let (critter, generated) = generated(mode, &gauge(), MappingConfig::default());
        let model = critter.entity_model(&generated).unwrap();
        let instance = new_instance(&critter.vm(), GAUGE);

        let readings = accessor(&model, "readings");
        let ints = Value::List(vec![Value::Int(i32::MIN), Value::Int(0), Value::Int(i32::MAX)]);
        readings.set(&instance, ints.clone()).unwrap();
        assert_eq!(readings.get(&instance).unwrap(), ints, "{mode}");
        readings.set(&instance, Value::List(vec![])).unwrap();
        assert_eq!(readings.get(&instance).unwrap(), Value::List(vec![]), "{mode}");

        let names = accessor(&model, "names");
        let texts = Value::List(vec![Value::from("a"), Value::Null]);
        names.set(&instance, texts.clone()).unwrap();
        assert_eq!(names.get(&instance).unwrap(), texts, "{mode}");
        names.set(&instance, Value::Null).unwrap();
        assert_eq!(names.get(&instance).unwrap(), Value::Null, "{mode}");

        let property = model.property("readings").unwrap().unwrap();
        assert!(property.is_array().unwrap());
        assert!(property.is_multiple_values().unwrap());
    }
}

#[test]
fn mistyped_array_elements_are_type_mismatches() {
    for mode in MODES {
        let (critter, generated) = generated(mode, &gauge(), MappingConfig::default());
        let model = critter.entity_model(&generated).unwrap();
        let instance = new_instance(&critter.vm(), GAUGE);
        let readings = accessor(&model, "readings");
        let ints = Value::List(vec![Value::Int(1), Value::Int(2)]);
        readings.set(&instance, ints.clone()).unwrap();

        for wrong in [
            Value::List(vec![Value::from("x")]),
            Value::List(vec![Value::Int(3), Value::Long(4)]),
            Value::List(vec![Value::Null]),
            Value::List(vec![Value::List(vec![Value::Int(5)])]),
            Value::from("x"),
        ] {
            let err = readings.set(&instance, wrong).unwrap_err();
            assert_eq!(err.class, ErrorClass::TypeMismatch, "{mode}");
        }
        assert_eq!(readings.get(&instance).unwrap(), ints, "{mode}");

        let err = accessor(&model, "names")
            .set(&instance, Value::List(vec![Value::Int(1)]))
            .unwrap_err();
        assert_eq!(err.class, ErrorClass::TypeMismatch, "{mode}");
    }
}

proptest! {
    #[test]
    fn int_property_holds_any_value(v in any::<i32>()) {
        for mode in MODES {
            let (critter, generated) = generated(mode, &person(), MappingConfig::default());
            let model = critter.entity_model(&generated).unwrap();
            let instance = new_instance(&critter.vm(), PERSON);
            let age = accessor(&model, "age");

            age.set(&instance, Value::Int(v)).unwrap();
            prop_assert_eq!(age.get(&instance).unwrap(), Value::Int(v));
        }
    }

    #[test]
    fn long_property_holds_any_value(v in any::<i64>()) {
        for mode in MODES {
            let (critter, generated) = generated(mode, &person(), MappingConfig::default());
            let model = critter.entity_model(&generated).unwrap();
            let instance = new_instance(&critter.vm(), PERSON);
            let salary = accessor(&model, "salary");

            salary.set(&instance, Value::Long(v)).unwrap();
            prop_assert_eq!(salary.get(&instance).unwrap(), Value::Long(v));
        }
    }

    #[test]
    fn text_property_holds_any_string(s in ".{0,32}") {
        for mode in MODES {
            let (critter, generated) = generated(mode, &person(), MappingConfig::default());
            let model = critter.entity_model(&generated).unwrap();
            let instance = new_instance(&critter.vm(), PERSON);
            let name = accessor(&model, "name");

            name.set(&instance, Value::from(s.as_str())).unwrap();
            prop_assert_eq!(name.get(&instance).unwrap(), Value::from(s.as_str()));
        }
    }
}
