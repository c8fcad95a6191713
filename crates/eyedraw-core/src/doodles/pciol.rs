//! Posterior chamber intraocular lens.

use super::{DoodleModel, band};
use crate::drawing::Eye;
use crate::params::{ParamSpec, ParamState, ParamValue, number};
use kurbo::Vec2;
use std::f64::consts::FRAC_PI_4;

const CENTRATION: &[&str] = &[
    "Well centred",
    "Slightly decentred",
    "Moderately decentred",
    "Severely decentred",
];
const FIXATION: &[&str] = &["In-the-bag", "Partly in the bag", "Ciliary sulcus"];

static PARAMETERS: [ParamSpec; 6] = [
    ParamSpec::simple("originX", -200.0, 200.0).animated(),
    ParamSpec::simple("originY", -200.0, 200.0).animated(),
    ParamSpec::angle("rotation"),
    ParamSpec::simple("scaleX", 0.8, 1.3).with_precision(2).animated(),
    ParamSpec::derived_list("centration", CENTRATION),
    ParamSpec::derived_list("fixation", FIXATION),
];

/// Decentration in doodle units that each centration label stands for.
fn decentration_for(label: &str) -> Option<f64> {
    match label {
        "Well centred" => Some(0.0),
        "Slightly decentred" => Some(40.0),
        "Moderately decentred" => Some(80.0),
        "Severely decentred" => Some(120.0),
        _ => None,
    }
}

/// The optic is centred on `originX`/`originY`; a lens in the sulcus is drawn larger.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pciol;

impl DoodleModel for Pciol {
    fn parameters(&self) -> &'static [ParamSpec] {
        &PARAMETERS
    }

    // Haptics mirror between eyes.
    fn defaults(&self, eye: Eye) -> Vec<(&'static str, ParamValue)> {
        let rotation = match eye {
            Eye::Right => FRAC_PI_4,
            Eye::Left => 7.0 * FRAC_PI_4,
        };
        vec![
            ("originX", ParamValue::Float(0.0)),
            ("originY", ParamValue::Float(0.0)),
            ("rotation", ParamValue::Float(rotation)),
            ("scaleX", ParamValue::Float(1.0)),
        ]
    }

    fn derive(&self, state: &ParamState) -> Vec<(&'static str, ParamValue)> {
        let offset = Vec2::new(number(state, "originX"), number(state, "originY"));
        vec![
            (
                "centration",
                band(
                    offset.hypot(),
                    &[
                        (20.0, "Well centred"),
                        (60.0, "Slightly decentred"),
                        (100.0, "Moderately decentred"),
                    ],
                    "Severely decentred",
                ),
            ),
            (
                "fixation",
                band(
                    number(state, "scaleX"),
                    &[(1.05, "In-the-bag"), (1.15, "Partly in the bag")],
                    "Ciliary sulcus",
                ),
            ),
        ]
    }

    fn inverse(
        &self,
        name: &str,
        value: &ParamValue,
        state: &ParamState,
    ) -> Vec<(&'static str, ParamValue)> {
        match (name, value.as_str()) {
            ("centration", Some(label)) => {
                let Some(distance) = decentration_for(label) else {
                    return Vec::new();
                };
                // Keep the current direction of decentration, inferior by default.
                let offset = Vec2::new(number(state, "originX"), number(state, "originY"));
                let direction = if offset.hypot() > f64::EPSILON {
                    offset.normalize()
                } else {
                    Vec2::new(0.0, 1.0)
                };
                let target = direction * distance;
                vec![
                    ("originX", ParamValue::Float(target.x)),
                    ("originY", ParamValue::Float(target.y)),
                ]
            }
            ("fixation", Some(label)) => {
                let scale = match label {
                    "In-the-bag" => 1.0,
                    "Partly in the bag" => 1.1,
                    "Ciliary sulcus" => 1.2,
                    _ => return Vec::new(),
                };
                vec![("scaleX", ParamValue::Float(scale))]
            }
            _ => Vec::new(),
        }
    }
}
