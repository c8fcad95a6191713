//! Nuclear sclerotic cataract.

use super::{DoodleModel, band};
use crate::drawing::Eye;
use crate::params::{ParamSpec, ParamState, ParamValue, number};

const GRADES: &[&str] = &["Mild", "Moderate", "Brunescent"];

static PARAMETERS: [ParamSpec; 4] = [
    ParamSpec::simple("originX", -500.0, 500.0),
    ParamSpec::simple("originY", -500.0, 500.0),
    ParamSpec::simple("apexY", -180.0, 0.0).animated(),
    ParamSpec::derived_list("grade", GRADES),
];

/// Density handle at `apexY`: the closer to the centre, the denser the nucleus.
#[derive(Debug, Clone, Copy, Default)]
pub struct NuclearCataract;

impl DoodleModel for NuclearCataract {
    fn parameters(&self) -> &'static [ParamSpec] {
        &PARAMETERS
    }

    fn defaults(&self, _eye: Eye) -> Vec<(&'static str, ParamValue)> {
        vec![
            ("originX", ParamValue::Float(0.0)),
            ("originY", ParamValue::Float(0.0)),
            ("apexY", ParamValue::Float(-180.0)),
        ]
    }

    fn derive(&self, state: &ParamState) -> Vec<(&'static str, ParamValue)> {
        let apex_y = number(state, "apexY");
        vec![(
            "grade",
            band(apex_y, &[(-120.0, "Mild"), (-60.0, "Moderate")], "Brunescent"),
        )]
    }

    fn inverse(
        &self,
        name: &str,
        value: &ParamValue,
        _state: &ParamState,
    ) -> Vec<(&'static str, ParamValue)> {
        let apex_y = match (name, value.as_str()) {
            ("grade", Some("Mild")) => -180.0,
            ("grade", Some("Moderate")) => -100.0,
            ("grade", Some("Brunescent")) => 0.0,
            _ => return Vec::new(),
        };
        vec![("apexY", ParamValue::Float(apex_y))]
    }
}
