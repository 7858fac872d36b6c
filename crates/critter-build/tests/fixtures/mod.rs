#![allow(dead_code)]

use critter_build::prelude::*;
use critter_core::{
    contract,
    model::{EntityModel, PropertyAccessor},
    value::Value,
    vm::{ObjectRef, Vm},
};
use critter_schema::{annotation::names, prelude::*};
use std::sync::Arc;

pub const PERSON: &str = "com.example.Person";
pub const ACCOUNT: &str = "com.example.Account";
pub const BROKEN: &str = "com.example.Broken";
pub const GAUGE: &str = "com.example.Gauge";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Every way an entity can be generated.
pub const MODES: [GenerationMode; 4] = [
    GenerationMode::SelfContained(Backend::Direct),
    GenerationMode::SelfContained(Backend::Builder),
    GenerationMode::SelfContained(Backend::Resolved),
    GenerationMode::Runtime,
];

/// String `name` with no initializer, `int age = 21`, `Long salary = 2L`
/// and a `List<String> tags` that also loads from `labels`.
pub fn person() -> ClassMeta {
    ClassMeta::new(PERSON)
        .with_field(FieldMeta::new("name", "Ljava/lang/String;").with_flags(flags::PRIVATE))
        .with_field(
            FieldMeta::new("age", "I")
                .with_flags(flags::PRIVATE)
                .with_constant(Constant::Int(21)),
        )
        .with_field(
            FieldMeta::new("salary", "Ljava/lang/Long;")
                .with_flags(flags::PRIVATE)
                .with_constant(Constant::Long(2)),
        )
        .with_field(
            FieldMeta::new("tags", "Ljava/util/List;")
                .with_signature("Ljava/util/List<Ljava/lang/String;>;")
                .with_flags(flags::PRIVATE)
                .annotate(AnnotationMeta::new(names::ALSO_LOAD).with("value", "labels")),
        )
        .with_field(FieldMeta::new("cache", "Ljava/lang/String;").with_flags(flags::TRANSIENT))
        .with_method(MethodMeta::new("getAge", "()I").with_flags(flags::PUBLIC))
        .with_method(MethodMeta::new("setAge", "(I)V").with_flags(flags::PUBLIC))
}

/// Annotated entity mixing field and getter-backed properties; `code` has
/// no setter.
pub fn account() -> ClassMeta {
    ClassMeta::new(ACCOUNT)
        .annotate(
            AnnotationMeta::new(names::ENTITY)
                .with("value", "accounts")
                .with("discriminator", "acct"),
        )
        .with_field(
            FieldMeta::new("id", "Ljava/lang/String;")
                .with_flags(flags::PRIVATE)
                .annotate(AnnotationMeta::new(names::ID)),
        )
        .with_field(
            FieldMeta::new("owner", "Ljava/lang/String;")
                .with_flags(flags::PRIVATE)
                .annotate(AnnotationMeta::new(names::PROPERTY).with("value", "holder"))
                .annotate(AnnotationMeta::new(names::ALSO_LOAD).with("value", "ownerName")),
        )
        .with_field(FieldMeta::new("balance", "J").with_flags(flags::PRIVATE))
        .with_field(
            FieldMeta::new("code", "Ljava/lang/String;")
                .with_flags(flags::PRIVATE)
                .with_constant(Constant::Text("ACC".to_string())),
        )
        .with_method(
            MethodMeta::new("getBalance", "()J")
                .with_flags(flags::PUBLIC)
                .annotate(AnnotationMeta::new(names::PROPERTY)),
        )
        .with_method(MethodMeta::new("setBalance", "(J)V").with_flags(flags::PUBLIC))
        .with_method(
            MethodMeta::new("getCode", "()Ljava/lang/String;")
                .with_flags(flags::PUBLIC)
                .annotate(AnnotationMeta::new(names::PROPERTY)),
        )
}

/// One field per narrow primitive, each initialised from a wider constant,
/// plus a boxed `Byte small = 7`, an `int[] readings` and a `String[] names`.
pub fn gauge() -> ClassMeta {
    let field = |name: &str, descriptor: &str| FieldMeta::new(name, descriptor).with_flags(flags::PRIVATE);

    ClassMeta::new(GAUGE)
        .with_field(field("flag", "Z").with_constant(Constant::Int(1)))
        .with_field(field("level", "B").with_constant(Constant::Int(-128)))
        .with_field(field("code", "C").with_constant(Constant::Int(65)))
        .with_field(field("count", "S").with_constant(Constant::Int(-2)))
        .with_field(field("ratio", "F").with_constant(Constant::Float(1.5)))
        .with_field(field("weight", "D").with_constant(Constant::Float(0.25)))
        .with_field(field("small", "Ljava/lang/Byte;").with_constant(Constant::Int(7)))
        .with_field(field("readings", "[I"))
        .with_field(field("names", "[Ljava/lang/String;"))
}

/// An entity whose only field carries an unterminated generic signature.
pub fn broken() -> ClassMeta {
    ClassMeta::new(BROKEN).with_field(
        FieldMeta::new("items", "Ljava/util/List;").with_signature("Ljava/util/List<"),
    )
}

pub fn new_instance(vm: &Vm, class: &str) -> ObjectRef {
    vm.instantiate(class, contract::NO_ARG_CONSTRUCTOR, vec![])
        .unwrap()
}

pub fn accessor(model: &dyn EntityModel, property: &str) -> Arc<dyn PropertyAccessor> {
    model
        .property(property)
        .unwrap()
        .unwrap_or_else(|| panic!("no property {property}"))
        .accessor()
        .unwrap()
}

pub fn text_list(items: &[&str]) -> Value {
    Value::List(items.iter().map(|s| Value::from(*s)).collect())
}
