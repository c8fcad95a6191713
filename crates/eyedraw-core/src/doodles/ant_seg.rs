//! Anterior segment: iris and pupil.

use super::{DoodleModel, band};
use crate::drawing::Eye;
use crate::params::{ParamKind, ParamSpec, ParamState, ParamType, ParamValue, Range, number};

const PUPIL_SIZES: &[&str] = &["Large", "Medium", "Small"];
const COLOURS: &[&str] = &["Blue", "Brown", "Gray", "Green"];

static PARAMETERS: [ParamSpec; 4] = [
    ParamSpec::simple("apexY", -280.0, -60.0).animated(),
    ParamSpec::derived_list("pupilSize", PUPIL_SIZES),
    ParamSpec::new("pxe", ParamKind::Other, ParamType::Bool, Range::Any),
    ParamSpec::other_list("colour", COLOURS),
];

/// The pupil edge sits at `apexY`; its size category follows from it.
#[derive(Debug, Clone, Copy, Default)]
pub struct AntSeg;

impl DoodleModel for AntSeg {
    fn parameters(&self) -> &'static [ParamSpec] {
        &PARAMETERS
    }

    fn defaults(&self, _eye: Eye) -> Vec<(&'static str, ParamValue)> {
        vec![
            ("apexY", ParamValue::Float(-260.0)),
            ("pxe", ParamValue::Bool(false)),
            ("colour", ParamValue::from("Blue")),
        ]
    }

    fn derive(&self, state: &ParamState) -> Vec<(&'static str, ParamValue)> {
        let apex_y = number(state, "apexY");
        vec![(
            "pupilSize",
            band(apex_y, &[(-200.0, "Large"), (-100.0, "Medium")], "Small"),
        )]
    }

    fn inverse(
        &self,
        name: &str,
        value: &ParamValue,
        _state: &ParamState,
    ) -> Vec<(&'static str, ParamValue)> {
        let apex_y = match (name, value.as_str()) {
            ("pupilSize", Some("Large")) => -260.0,
            ("pupilSize", Some("Medium")) => -200.0,
            ("pupilSize", Some("Small")) => -100.0,
            _ => return Vec::new(),
        };
        vec![("apexY", ParamValue::Float(apex_y))]
    }
}
