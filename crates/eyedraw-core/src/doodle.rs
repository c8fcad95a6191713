//! Doodle instances.

use crate::doodles::DoodleClass;
use crate::drawing::Eye;
use crate::params::{ParamKind, ParamState, ParamValue};
use crate::resolver;
use uuid::Uuid;

/// Unique identifier for doodles.
pub type DoodleId = Uuid;

/// One annotated finding on a drawing.
///
/// Holds the live value of every declared parameter of its class. Values only
/// change through the owning [`Drawing`](crate::Drawing).
#[derive(Debug, Clone)]
pub struct Doodle {
    pub(crate) id: DoodleId,
    class: DoodleClass,
    values: ParamState,
    will_sync: bool,
}

impl Doodle {
    /// Create a doodle with the class defaults for `eye`.
    pub fn new(class: DoodleClass, eye: Eye) -> Self {
        let model = class.model();
        let mut values: ParamState = class
            .parameters()
            .iter()
            .map(|spec| (spec.name, spec.initial_value()))
            .collect();
        for (name, value) in model.defaults(eye) {
            if let Some(spec) = class.parameter(name) {
                values.insert(spec.name, value);
            }
        }
        resolver::clamp_all(class, &mut values);
        resolver::derive_all(class, &mut values);

        Self {
            id: Uuid::new_v4(),
            class,
            values,
            will_sync: model.will_sync(),
        }
    }

    pub fn id(&self) -> DoodleId {
        self.id
    }

    pub fn class(&self) -> DoodleClass {
        self.class
    }

    /// Current (live) value of a parameter.
    pub fn value(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Current numeric value of a parameter.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(ParamValue::as_f64)
    }

    pub fn values(&self) -> &ParamState {
        &self.values
    }

    /// Parameters that are stored when the drawing is saved (everything not derived).
    pub fn stored_values(&self) -> impl Iterator<Item = (&'static str, &ParamValue)> {
        self.class
            .parameters()
            .iter()
            .filter(|spec| spec.kind != ParamKind::Derived)
            .filter_map(|spec| self.values.get(spec.name).map(|v| (spec.name, v)))
    }

    /// Whether this doodle accepts changes propagated from another drawing.
    pub fn will_sync(&self) -> bool {
        self.will_sync
    }

    pub(crate) fn set_will_sync(&mut self, will_sync: bool) {
        self.will_sync = will_sync;
    }

    /// Overwrite a value, returning the previous one.
    pub(crate) fn set_value(&mut self, name: &'static str, value: ParamValue) -> Option<ParamValue> {
        self.values.insert(name, value)
    }

    pub(crate) fn replace_values(&mut self, values: ParamState) {
        self.values = values;
    }
}
