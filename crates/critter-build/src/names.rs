//! Deterministic names for everything a generation pass emits.
//!
//! Names embed the entity's simple name and the property name verbatim, so
//! distinct identifiers always yield distinct names. Everything lives under a
//! reserved `__critter` sub-package of the entity's package:
//!
//! - `<pkg>.__critter.<Simple>EntityModel`
//! - `<pkg>.__critter.<Simple>.<property>Accessor`
//! - `<pkg>.__critter.<Simple>.<property>Model`
//!
//! Per-property classes sit one level below the entity models, and their two
//! suffixes never overlap, so no property name can produce another class's
//! name.

use critter_schema::meta::{package_name, simple_name};

const GENERATED_PACKAGE: &str = "__critter";

fn generated_package(entity: &str) -> String {
    match package_name(entity) {
        "" => GENERATED_PACKAGE.to_string(),
        package => format!("{package}.{GENERATED_PACKAGE}"),
    }
}

// One sub-package per entity, named after it exactly.
fn entity_scope(entity: &str) -> String {
    format!("{}.{}", generated_package(entity), simple_name(entity))
}

/// `firstName` -> `FirstName`, the bean-style capitalisation.
#[must_use]
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `getName` -> `name`, `URL` stays `URL`.
#[must_use]
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.clone().next()) {
        (Some(first), Some(second)) if first.is_uppercase() && second.is_uppercase() => {
            name.to_string()
        }
        (Some(first), _) => first.to_lowercase().chain(chars).collect(),
        (None, _) => String::new(),
    }
}

#[must_use]
pub fn accessor_class(entity: &str, property: &str) -> String {
    format!("{}.{property}Accessor", entity_scope(entity))
}

#[must_use]
pub fn property_model_class(entity: &str, property: &str) -> String {
    format!("{}.{property}Model", entity_scope(entity))
}

#[must_use]
pub fn entity_model_class(entity: &str) -> String {
    format!(
        "{}.{}EntityModel",
        generated_package(entity),
        simple_name(entity)
    )
}

/// Synthetic reader injected into self-contained entity classes.
#[must_use]
pub fn reader_method(property: &str) -> String {
    format!("__read_{property}")
}

#[must_use]
pub fn writer_method(property: &str) -> String {
    format!("__write_{property}")
}

/// File stem of an emitted static model: the simple name, like the class
/// file it sits beside.
#[must_use]
pub fn module_name(entity: &str) -> String {
    simple_name(entity).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn generated_names_are_scoped_per_entity() {
        assert_eq!(
            accessor_class("com.example.UserProfile", "firstName"),
            "com.example.__critter.UserProfile.firstNameAccessor"
        );
        assert_eq!(
            property_model_class("com.example.UserProfile", "firstName"),
            "com.example.__critter.UserProfile.firstNameModel"
        );
        assert_eq!(
            entity_model_class("com.example.UserProfile"),
            "com.example.__critter.UserProfileEntityModel"
        );
        assert_eq!(entity_model_class("Bare"), "__critter.BareEntityModel");
        assert_eq!(accessor_class("Bare", "x"), "__critter.Bare.xAccessor");
    }

    #[test]
    fn differently_cased_properties_get_distinct_names() {
        let properties = ["firstName", "first_name", "FirstName", "Entity"];
        let entity = "com.example.Person";

        let mut seen = BTreeSet::new();
        for property in properties {
            assert!(seen.insert(accessor_class(entity, property)), "{property}");
            assert!(seen.insert(property_model_class(entity, property)), "{property}");
            assert!(seen.insert(reader_method(property)), "{property}");
            assert!(seen.insert(writer_method(property)), "{property}");
        }
        assert!(seen.insert(entity_model_class(entity)));
    }

    #[test]
    fn differently_cased_entities_get_distinct_names() {
        let entities = ["com.example.UserProfile", "com.example.User_Profile", "com.example.userProfile"];

        let mut seen = BTreeSet::new();
        for entity in entities {
            assert!(seen.insert(accessor_class(entity, "name")), "{entity}");
            assert!(seen.insert(property_model_class(entity, "name")), "{entity}");
            assert!(seen.insert(entity_model_class(entity)), "{entity}");
            assert!(seen.insert(module_name(entity)), "{entity}");
        }
    }

    #[test]
    fn property_named_like_an_entity_model_does_not_clash() {
        // `PersonEntity` + `Model` would equal the entity model's simple name
        assert_ne!(
            property_model_class("com.example.Person", "PersonEntity"),
            entity_model_class("com.example.Person")
        );
    }

    #[test]
    fn bean_capitalisation() {
        assert_eq!(capitalize("age"), "Age");
        assert_eq!(reader_method("firstName"), "__read_firstName");
        assert_eq!(writer_method("x"), "__write_x");
        assert_eq!(decapitalize("FirstName"), "firstName");
        assert_eq!(decapitalize("URL"), "URL");
        assert_eq!(decapitalize(""), "");
    }
}
