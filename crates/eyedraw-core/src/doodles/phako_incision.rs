//! Phacoemulsification incision.
//!
//! The incision sits on a circle of `radius` around the limbus, centred on
//! `rotation` and spanning `arc` radians. The radius band decides the site;
//! scleral tunnels are kept narrower than corneal or limbal ones.

use super::{DoodleModel, band};
use crate::drawing::Eye;
use crate::params::{
    NumericRange, ParamKind, ParamSpec, ParamState, ParamType, ParamValue, Range, number, round_to,
};
use std::f64::consts::PI;

const SITES: &[&str] = &["Corneal", "Limbal", "Scleral"];
const TYPES: &[&str] = &["Pocket", "Section"];

/// Millimetres per doodle unit (corneal radius of 380 units is about 6mm).
const MM_PER_UNIT: f64 = 6.0 / 380.0;

/// Radius at which an incision stops being corneal.
const LIMBAL_RADIUS: f64 = 400.0;
/// Radius at which an incision becomes scleral.
const SCLERAL_RADIUS: f64 = 440.0;

/// Arc allowed once the incision is scleral.
const SCLERAL_ARC: NumericRange = NumericRange::new(0.2, 0.8);

static PARAMETERS: [ParamSpec; 7] = [
    ParamSpec::angle("rotation").animated(),
    ParamSpec::simple("radius", 330.0, 500.0).animated(),
    ParamSpec::simple("arc", 0.2, 1.2).with_precision(3).animated(),
    ParamSpec::new(
        "incisionMeridian",
        ParamKind::Derived,
        ParamType::Int,
        Range::Modular(NumericRange::new(0.0, 360.0)),
    ),
    ParamSpec::derived_list("incisionSite", SITES),
    ParamSpec::new(
        "incisionLength",
        ParamKind::Derived,
        ParamType::Float,
        Range::Numeric(NumericRange::new(0.0, 10.0)),
    )
    .with_precision(1),
    ParamSpec::other_list("incisionType", TYPES),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct PhakoIncision;

/// Clinical meridian in degrees (0 at 3 o'clock, counter-clockwise) of a
/// rotation measured clockwise from 12 o'clock.
fn meridian(rotation: f64) -> i64 {
    let degrees = (450.0 - rotation.to_degrees()).round();
    degrees.rem_euclid(360.0) as i64
}

fn rotation_for_meridian(meridian: f64) -> f64 {
    (450.0 - meridian).rem_euclid(360.0).to_radians()
}

impl DoodleModel for PhakoIncision {
    fn parameters(&self) -> &'static [ParamSpec] {
        &PARAMETERS
    }

    // Temporal approach: 9 o'clock on a right eye, 3 o'clock on a left eye.
    fn defaults(&self, eye: Eye) -> Vec<(&'static str, ParamValue)> {
        let rotation = match eye {
            Eye::Right => 3.0 * PI / 2.0,
            Eye::Left => PI / 2.0,
        };
        vec![
            ("rotation", ParamValue::Float(round_to(rotation, 6))),
            ("radius", ParamValue::Float(376.0)),
            ("arc", ParamValue::Float(0.4)),
            ("incisionType", ParamValue::from("Pocket")),
        ]
    }

    fn conditional_ranges(&self, state: &ParamState) -> Vec<(&'static str, NumericRange)> {
        if number(state, "radius") >= SCLERAL_RADIUS {
            vec![("arc", SCLERAL_ARC)]
        } else {
            Vec::new()
        }
    }

    fn derive(&self, state: &ParamState) -> Vec<(&'static str, ParamValue)> {
        let radius = number(state, "radius");
        let length = number(state, "arc") * radius * MM_PER_UNIT;
        vec![
            (
                "incisionMeridian",
                ParamValue::Int(meridian(number(state, "rotation"))),
            ),
            (
                "incisionSite",
                band(radius, &[(LIMBAL_RADIUS, "Corneal"), (SCLERAL_RADIUS, "Limbal")], "Scleral"),
            ),
            ("incisionLength", ParamValue::Float(round_to(length, 1))),
        ]
    }

    fn inverse(
        &self,
        name: &str,
        value: &ParamValue,
        state: &ParamState,
    ) -> Vec<(&'static str, ParamValue)> {
        match name {
            "incisionMeridian" => value
                .as_f64()
                .map(|m| vec![("rotation", ParamValue::Float(rotation_for_meridian(m)))])
                .unwrap_or_default(),
            "incisionSite" => {
                let radius = match value.as_str() {
                    Some("Corneal") => 376.0,
                    Some("Limbal") => 420.0,
                    Some("Scleral") => 460.0,
                    _ => return Vec::new(),
                };
                vec![("radius", ParamValue::Float(radius))]
            }
            "incisionLength" => {
                let radius = number(state, "radius");
                match value.as_f64() {
                    Some(length) if radius > 0.0 => {
                        vec![("arc", ParamValue::Float(length / (radius * MM_PER_UNIT)))]
                    }
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meridian_mapping() {
        assert_eq!(meridian(3.0 * PI / 2.0), 180);
        assert_eq!(meridian(PI / 2.0), 0);
        assert_eq!(meridian(0.0), 90);
        assert_eq!(meridian(PI), 270);
        for m in [0.0, 45.0, 180.0, 359.0] {
            assert_eq!(meridian(rotation_for_meridian(m)) as f64, m);
        }
    }

    #[test]
    fn test_scleral_radius_narrows_arc() {
        let mut state = ParamState::new();
        state.insert("radius", ParamValue::Float(376.0));
        assert!(PhakoIncision.conditional_ranges(&state).is_empty());
        state.insert("radius", ParamValue::Float(460.0));
        assert_eq!(PhakoIncision.conditional_ranges(&state), vec![("arc", SCLERAL_ARC)]);
    }

    #[test]
    fn test_defaults_mirror_by_eye() {
        let right = PhakoIncision.defaults(Eye::Right);
        let left = PhakoIncision.defaults(Eye::Left);
        assert_ne!(right[0].1, left[0].1);
    }
}
