//! Optic disc cup, sized by the cup-to-disc ratio.

use super::DoodleModel;
use crate::drawing::Eye;
use crate::params::{
    NumericRange, ParamKind, ParamSpec, ParamState, ParamType, ParamValue, Range, number, round_to,
};

const MODES: &[&str] = &["Basic", "Expert"];

/// Radius of the disc in doodle units.
const DISC_RADIUS: f64 = 300.0;

static PARAMETERS: [ParamSpec; 3] = [
    ParamSpec::simple("apexY", -300.0, -30.0).animated(),
    ParamSpec::new(
        "cdRatio",
        ParamKind::Derived,
        ParamType::Float,
        Range::Numeric(NumericRange::new(0.1, 1.0)),
    )
    .with_precision(1),
    ParamSpec::other_list("mode", MODES),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct OpticCup;

impl DoodleModel for OpticCup {
    fn parameters(&self) -> &'static [ParamSpec] {
        &PARAMETERS
    }

    fn defaults(&self, _eye: Eye) -> Vec<(&'static str, ParamValue)> {
        vec![
            ("apexY", ParamValue::Float(-150.0)),
            ("mode", ParamValue::from("Basic")),
        ]
    }

    fn derive(&self, state: &ParamState) -> Vec<(&'static str, ParamValue)> {
        let ratio = -number(state, "apexY") / DISC_RADIUS;
        vec![("cdRatio", ParamValue::Float(round_to(ratio, 1)))]
    }

    fn inverse(
        &self,
        name: &str,
        value: &ParamValue,
        _state: &ParamState,
    ) -> Vec<(&'static str, ParamValue)> {
        match (name, value.as_f64()) {
            ("cdRatio", Some(ratio)) => vec![("apexY", ParamValue::Float(-ratio * DISC_RADIUS))],
            _ => Vec::new(),
        }
    }
}
