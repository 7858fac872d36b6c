use crate::prelude::*;
use std::collections::BTreeMap;

///
/// Well-known annotation type names
///

pub mod names {
    pub const ALSO_LOAD: &str = "critter.annotations.AlsoLoad";
    pub const EMBEDDED: &str = "critter.annotations.Embedded";
    pub const ENTITY: &str = "critter.annotations.Entity";
    pub const ID: &str = "critter.annotations.Id";
    pub const NOT_SAVED: &str = "critter.annotations.NotSaved";
    pub const PROPERTY: &str = "critter.annotations.Property";
    pub const REFERENCE: &str = "critter.annotations.Reference";
    pub const TRANSIENT: &str = "critter.annotations.Transient";
    pub const VERSION: &str = "critter.annotations.Version";

    /// Bean-level transient marker honoured alongside the library's own.
    pub const BEANS_TRANSIENT: &str = "java.beans.Transient";
}

///
/// AnnotationMeta
///
/// One entry of an annotation table: the annotation type plus the element
/// values that were written explicitly at the use site.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct AnnotationMeta {
    pub type_name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, AnnotationValue>,
}

impl AnnotationMeta {
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, element: impl Into<String>, value: impl Into<AnnotationValue>) -> Self {
        self.values.insert(element.into(), value.into());
        self
    }

    #[must_use]
    pub fn value(&self, element: &str) -> Option<&AnnotationValue> {
        self.values.get(element)
    }

    #[must_use]
    pub fn text(&self, element: &str) -> Option<&str> {
        match self.values.get(element) {
            Some(AnnotationValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn bool(&self, element: &str) -> Option<bool> {
        match self.values.get(element) {
            Some(AnnotationValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Text element that is present and not the "unset" sentinel.
    #[must_use]
    pub fn explicit_text(&self, element: &str) -> Option<&str> {
        self.text(element)
            .filter(|s| !s.is_empty() && *s != crate::IGNORED_FIELDNAME)
    }

    /// Text elements of an array-valued element; a lone text counts as one.
    #[must_use]
    pub fn texts(&self, element: &str) -> Vec<String> {
        match self.values.get(element) {
            Some(AnnotationValue::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    AnnotationValue::Text(s) => Some(s.clone()),
                    _ => None,
                })
                .collect(),
            Some(AnnotationValue::Text(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }
}

///
/// AnnotationValue
///
/// Tagged element value. Class-valued elements carry the dotted class name.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum AnnotationValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Text(String),
    Enum { type_name: String, variant: String },
    Class(String),
    Array(Vec<Self>),
    Annotation(AnnotationMeta),
}

impl AnnotationValue {
    /// Short kind label used in diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::Text(_) => "text",
            Self::Enum { .. } => "enum",
            Self::Class(_) => "class",
            Self::Array(_) => "array",
            Self::Annotation(_) => "annotation",
        }
    }
}

impl From<bool> for AnnotationValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for AnnotationValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for AnnotationValue {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<&str> for AnnotationValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for AnnotationValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Self>> From<Vec<T>> for AnnotationValue {
    fn from(v: Vec<T>) -> Self {
        Self::Array(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_text_ignores_sentinel() {
        let ann = AnnotationMeta::new(names::PROPERTY).with("value", ".");
        assert_eq!(ann.explicit_text("value"), None);

        let ann = AnnotationMeta::new(names::PROPERTY).with("value", "full_name");
        assert_eq!(ann.explicit_text("value"), Some("full_name"));
    }

    #[test]
    fn texts_accepts_single_and_array() {
        let single = AnnotationMeta::new(names::ALSO_LOAD).with("value", "old");
        let many = AnnotationMeta::new(names::ALSO_LOAD).with("value", vec!["a", "b"]);

        assert_eq!(single.texts("value"), vec!["old".to_string()]);
        assert_eq!(many.texts("value"), vec!["a".to_string(), "b".to_string()]);
    }
}
