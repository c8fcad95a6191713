//! Form field bindings.
//!
//! A binding ties a parameter of a doodle class to a named form field. The
//! drawing keeps each bound field's text in step with the first doodle of the
//! class, and routes edited field text back through the resolver.

use crate::doodles::DoodleClass;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    class: DoodleClass,
    parameter: &'static str,
    field: String,
}

/// Bound fields of one drawing and their current text.
#[derive(Debug, Clone, Default)]
pub struct FieldBindings {
    bindings: Vec<Binding>,
    fields: BTreeMap<String, String>,
}

impl FieldBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `field` to `class.parameter`, replacing an earlier binding of the field.
    pub fn bind(&mut self, class: DoodleClass, parameter: &'static str, field: impl Into<String>) {
        let field = field.into();
        self.bindings.retain(|b| b.field != field);
        self.fields.entry(field.clone()).or_default();
        self.bindings.push(Binding {
            class,
            parameter,
            field,
        });
    }

    /// Remove the binding of a field. Returns false if it was not bound.
    pub fn unbind(&mut self, field: &str) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|b| b.field != field);
        self.fields.remove(field);
        self.bindings.len() != before
    }

    /// `(parameter, field)` pairs bound for a class.
    pub fn fields_for(&self, class: DoodleClass) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.bindings
            .iter()
            .filter(move |b| b.class == class)
            .map(|b| (b.parameter, b.field.as_str()))
    }

    /// The parameter a field is bound to.
    pub fn binding_for_field(&self, field: &str) -> Option<(DoodleClass, &'static str)> {
        self.bindings
            .iter()
            .find(|b| b.field == field)
            .map(|b| (b.class, b.parameter))
    }

    /// Set the text of a bound field. Returns true if the text changed.
    pub fn write(&mut self, field: &str, text: String) -> bool {
        match self.fields.get_mut(field) {
            Some(current) if *current != text => {
                *current = text;
                true
            }
            _ => false,
        }
    }

    pub fn field_value(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Every bound field with its text, ordered by field name.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Blank every field bound for a class.
    pub fn clear_class(&mut self, class: DoodleClass) {
        for b in self.bindings.iter().filter(|b| b.class == class) {
            if let Some(text) = self.fields.get_mut(&b.field) {
                text.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_and_write() {
        let mut bindings = FieldBindings::new();
        bindings.bind(DoodleClass::OpticCup, "cdRatio", "cd_ratio");
        assert_eq!(bindings.field_value("cd_ratio"), Some(""));
        assert!(bindings.write("cd_ratio", "0.5".to_string()));
        assert!(!bindings.write("cd_ratio", "0.5".to_string()));
        assert!(!bindings.write("missing", "1".to_string()));
        assert_eq!(
            bindings.binding_for_field("cd_ratio"),
            Some((DoodleClass::OpticCup, "cdRatio"))
        );
    }

    #[test]
    fn test_rebinding_a_field_replaces_it() {
        let mut bindings = FieldBindings::new();
        bindings.bind(DoodleClass::OpticCup, "cdRatio", "field");
        bindings.bind(DoodleClass::AntSeg, "pupilSize", "field");
        assert_eq!(bindings.fields_for(DoodleClass::OpticCup).count(), 0);
        assert_eq!(
            bindings.fields_for(DoodleClass::AntSeg).collect::<Vec<_>>(),
            vec![("pupilSize", "field")]
        );
    }

    #[test]
    fn test_clear_class() {
        let mut bindings = FieldBindings::new();
        bindings.bind(DoodleClass::OpticCup, "cdRatio", "cd");
        bindings.bind(DoodleClass::AntSeg, "pupilSize", "pupil");
        bindings.write("cd", "0.5".to_string());
        bindings.write("pupil", "Large".to_string());
        bindings.clear_class(DoodleClass::OpticCup);
        assert_eq!(bindings.field_value("cd"), Some(""));
        assert_eq!(bindings.field_value("pupil"), Some("Large"));
        assert!(bindings.unbind("cd"));
        assert_eq!(bindings.field_value("cd"), None);
    }
}
