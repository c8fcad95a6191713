//! Blood (or pus) level in the anterior chamber.

use super::DoodleModel;
use crate::drawing::Eye;
use crate::params::{
    NumericRange, ParamKind, ParamSpec, ParamState, ParamType, ParamValue, Range, number,
};

const TYPES: &[&str] = &["Hyphaema", "Hypopyon"];

/// Lowest point of the anterior chamber; `apexY` here means an empty chamber.
const CHAMBER_FLOOR: f64 = 380.0;
const CHAMBER_HEIGHT: f64 = 2.0 * CHAMBER_FLOOR;

static PARAMETERS: [ParamSpec; 3] = [
    ParamSpec::simple("apexY", -CHAMBER_FLOOR, CHAMBER_FLOOR).animated(),
    ParamSpec::new(
        "level",
        ParamKind::Derived,
        ParamType::Int,
        Range::Numeric(NumericRange::new(0.0, 100.0)),
    ),
    ParamSpec::other_list("haemType", TYPES),
];

/// Fluid level, stored as the height of its surface and reported as a percentage.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hyphaema;

impl DoodleModel for Hyphaema {
    fn parameters(&self) -> &'static [ParamSpec] {
        &PARAMETERS
    }

    fn defaults(&self, _eye: Eye) -> Vec<(&'static str, ParamValue)> {
        vec![
            ("apexY", ParamValue::Float(200.0)),
            ("haemType", ParamValue::from("Hyphaema")),
        ]
    }

    // A hyphaema in one eye says nothing about the other.
    fn will_sync(&self) -> bool {
        false
    }

    fn derive(&self, state: &ParamState) -> Vec<(&'static str, ParamValue)> {
        let percent = (CHAMBER_FLOOR - number(state, "apexY")) / CHAMBER_HEIGHT * 100.0;
        vec![("level", ParamValue::Int(percent.round() as i64))]
    }

    fn inverse(
        &self,
        name: &str,
        value: &ParamValue,
        _state: &ParamState,
    ) -> Vec<(&'static str, ParamValue)> {
        match (name, value.as_f64()) {
            ("level", Some(percent)) => vec![(
                "apexY",
                ParamValue::Float(CHAMBER_FLOOR - percent / 100.0 * CHAMBER_HEIGHT),
            )],
            _ => Vec::new(),
        }
    }
}
