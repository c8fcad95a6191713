//! Constraint resolution for a single parameter change.
//!
//! Resolution is one pass over a fixed pipeline:
//!
//! 1. a derived parameter is mapped back to the simple values it implies;
//! 2. conditional ranges are recomputed from the proposed state;
//! 3. the changed simple values are clamped into those ranges, and any other
//!    simple value whose range narrowed is clamped as well;
//! 4. every derived parameter is recomputed from the clamped state.
//!
//! The pipeline never calls back into itself, so a dependency of A on B and of
//! B on A cannot cycle.

use crate::doodles::DoodleClass;
use crate::params::{NumericRange, ParamKind, ParamSpec, ParamState, ParamValue, Range};
use std::collections::BTreeMap;

/// One parameter assignment produced by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamUpdate {
    pub name: &'static str,
    pub value: ParamValue,
    /// Interpolate towards `value` instead of snapping to it.
    pub animate: bool,
}

/// Ordered assignments resolving one change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resolution {
    pub updates: Vec<ParamUpdate>,
}

impl Resolution {
    /// Look up the value assigned to a parameter.
    pub fn value(&self, name: &str) -> Option<&ParamValue> {
        self.updates.iter().find(|u| u.name == name).map(|u| &u.value)
    }

    /// Apply every assignment to a state.
    pub fn apply_to(&self, state: &mut ParamState) {
        for update in &self.updates {
            state.insert(update.name, update.value.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Resolve setting `spec` to `value` on a doodle of `class` whose settled values are `state`.
///
/// The result lists the changed parameter (or the simple parameters a derived
/// value maps to) first, then simple parameters re-clamped by a narrowed
/// range, then every derived parameter. `animate` requests interpolation,
/// which is granted only to simple parameters whose table entry animates.
pub fn resolve(
    class: DoodleClass,
    spec: &ParamSpec,
    value: &ParamValue,
    state: &ParamState,
    animate: bool,
) -> Resolution {
    let model = class.model();
    let mut next = state.clone();
    let mut updates = Vec::new();

    let changed: Vec<(&'static ParamSpec, ParamValue)> = match spec.kind {
        ParamKind::Simple => class
            .parameter(spec.name)
            .map(|s| vec![(s, value.clone())])
            .unwrap_or_default(),
        // An enumeration value outside the list has nothing to map back to.
        ParamKind::Derived if matches!(spec.range, Range::List(_)) && !spec.is_legal(value, None) => {
            Vec::new()
        }
        ParamKind::Derived => {
            let requested = spec.normalize(value, None, state.get(spec.name));
            model
                .inverse(spec.name, &requested, state)
                .into_iter()
                .filter_map(|(name, v)| class.parameter(name).map(|s| (s, v)))
                .filter(|(s, _)| s.kind == ParamKind::Simple)
                .collect()
        }
        ParamKind::Other => {
            let normalized = spec.normalize(value, None, state.get(spec.name));
            next.insert(spec.name, normalized.clone());
            updates.push(ParamUpdate {
                name: spec.name,
                value: normalized,
                animate: false,
            });
            Vec::new()
        }
    };

    // Propose the changes within their static ranges so conditional ranges
    // see where the doodle is heading.
    for (s, v) in &changed {
        next.insert(s.name, s.normalize(v, None, state.get(s.name)));
    }
    let ranges: BTreeMap<&'static str, NumericRange> =
        model.conditional_ranges(&next).into_iter().collect();

    for (s, v) in &changed {
        let clamped = s.normalize(v, ranges.get(s.name).copied(), state.get(s.name));
        next.insert(s.name, clamped.clone());
        updates.push(ParamUpdate {
            name: s.name,
            value: clamped,
            animate: animate && s.animate,
        });
    }

    for (name, range) in &ranges {
        if changed.iter().any(|(s, _)| s.name == *name) {
            continue;
        }
        let (Some(s), Some(current)) = (class.parameter(name), next.get(name).cloned()) else {
            continue;
        };
        let clamped = s.normalize(&current, Some(*range), Some(&current));
        if !clamped.approx_eq(&current) {
            next.insert(s.name, clamped.clone());
            updates.push(ParamUpdate {
                name: s.name,
                value: clamped,
                animate: animate && s.animate,
            });
        }
    }

    for (name, v) in model.derive(&next) {
        let Some(s) = class.parameter(name) else {
            continue;
        };
        let derived = s.normalize(&v, None, next.get(name));
        next.insert(s.name, derived.clone());
        updates.push(ParamUpdate {
            name: s.name,
            value: derived,
            animate: false,
        });
    }

    Resolution { updates }
}

/// Recompute every derived parameter of `state` in place.
pub fn derive_all(class: DoodleClass, state: &mut ParamState) {
    for (name, v) in class.model().derive(state) {
        if let Some(s) = class.parameter(name) {
            let derived = s.normalize(&v, None, state.get(name));
            state.insert(s.name, derived);
        }
    }
}

/// Clamp every simple parameter of `state` into its (possibly conditional) range.
pub fn clamp_all(class: DoodleClass, state: &mut ParamState) {
    let ranges: BTreeMap<&'static str, NumericRange> =
        class.model().conditional_ranges(state).into_iter().collect();
    for spec in class.parameters().iter().filter(|s| s.kind != ParamKind::Derived) {
        let current = state.get(spec.name).cloned();
        let value = current.clone().unwrap_or_else(|| spec.initial_value());
        let clamped = spec.normalize(&value, ranges.get(spec.name).copied(), current.as_ref());
        state.insert(spec.name, clamped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::Eye;
    use crate::params::ParamType;

    fn initial_state(class: DoodleClass) -> ParamState {
        let mut state: ParamState = class
            .parameters()
            .iter()
            .map(|s| (s.name, s.initial_value()))
            .collect();
        for (name, v) in class.model().defaults(Eye::Right) {
            state.insert(name, v);
        }
        clamp_all(class, &mut state);
        derive_all(class, &mut state);
        state
    }

    fn set(class: DoodleClass, state: &ParamState, name: &str, value: ParamValue) -> Resolution {
        let spec = class.parameter(name).expect("declared parameter");
        resolve(class, spec, &value, state, false)
    }

    fn sample_values(spec: &ParamSpec) -> Vec<ParamValue> {
        match (spec.ty, spec.numeric_range()) {
            (ParamType::Float | ParamType::Int, Some(r)) => {
                let span = r.max - r.min;
                [r.min - span, r.min, r.min + span * 0.37, (r.min + r.max) / 2.0, r.max, r.max + span]
                    .into_iter()
                    .map(ParamValue::Float)
                    .collect()
            }
            _ => match spec.range {
                Range::List(items) => {
                    items.iter().map(|i| ParamValue::from(*i)).chain(["bogus".into()]).collect()
                }
                _ => vec![ParamValue::Bool(true), ParamValue::Bool(false)],
            },
        }
    }

    #[test]
    fn test_simple_change_updates_derived() {
        let class = DoodleClass::AntSeg;
        let state = initial_state(class);
        assert_eq!(state["pupilSize"], "Large".into());

        let resolution = set(class, &state, "apexY", ParamValue::Float(-150.0));
        assert_eq!(resolution.updates[0].name, "apexY");
        assert_eq!(resolution.value("apexY"), Some(&ParamValue::Float(-150.0)));
        assert_eq!(resolution.value("pupilSize"), Some(&"Medium".into()));
    }

    #[test]
    fn test_derived_change_maps_to_simple() {
        let class = DoodleClass::AntSeg;
        let state = initial_state(class);
        let resolution = set(class, &state, "pupilSize", "Small".into());
        assert_eq!(resolution.updates[0].name, "apexY");
        assert_eq!(resolution.value("apexY"), Some(&ParamValue::Float(-100.0)));
        assert_eq!(resolution.value("pupilSize"), Some(&"Small".into()));
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let class = DoodleClass::OpticCup;
        let state = initial_state(class);
        let resolution = set(class, &state, "apexY", ParamValue::Float(-1000.0));
        assert_eq!(resolution.value("apexY"), Some(&ParamValue::Float(-300.0)));
        assert_eq!(resolution.value("cdRatio"), Some(&ParamValue::Float(1.0)));

        let resolution = set(class, &state, "cdRatio", ParamValue::Float(0.0));
        assert_eq!(resolution.value("cdRatio"), Some(&ParamValue::Float(0.1)));
        assert_eq!(resolution.value("apexY"), Some(&ParamValue::Float(-30.0)));
    }

    #[test]
    fn test_unknown_enumeration_keeps_current() {
        let class = DoodleClass::NuclearCataract;
        let state = initial_state(class);
        let resolution = set(class, &state, "grade", "Total".into());
        assert_eq!(resolution.value("grade"), Some(&state["grade"]));
        assert_eq!(resolution.value("apexY"), None);

        let mut moved = state.clone();
        set(class, &state, "apexY", ParamValue::Float(-90.0)).apply_to(&mut moved);
        let resolution = set(class, &moved, "grade", "Total".into());
        assert_eq!(resolution.value("grade"), Some(&"Moderate".into()));
        assert_eq!(resolution.value("apexY"), None);
    }

    #[test]
    fn test_scleral_radius_clamps_existing_arc() {
        let class = DoodleClass::PhakoIncision;
        let mut state = initial_state(class);
        let widen = set(class, &state, "arc", ParamValue::Float(1.1));
        widen.apply_to(&mut state);
        assert_eq!(state["arc"], ParamValue::Float(1.1));

        let resolution = set(class, &state, "radius", ParamValue::Float(470.0));
        let names: Vec<_> = resolution.updates.iter().map(|u| u.name).collect();
        assert_eq!(
            names,
            vec!["radius", "arc", "incisionMeridian", "incisionSite", "incisionLength"]
        );
        assert_eq!(resolution.value("arc"), Some(&ParamValue::Float(0.8)));
        assert_eq!(resolution.value("incisionSite"), Some(&"Scleral".into()));
        // Length follows the clamped arc, not the one requested earlier.
        let expected = crate::params::round_to(0.8 * 470.0 * 6.0 / 380.0, 1);
        assert_eq!(resolution.value("incisionLength"), Some(&ParamValue::Float(expected)));
    }

    #[test]
    fn test_arc_clamped_into_conditional_range() {
        let class = DoodleClass::PhakoIncision;
        let mut state = initial_state(class);
        set(class, &state, "incisionSite", "Scleral".into()).apply_to(&mut state);
        assert_eq!(state["radius"], ParamValue::Float(460.0));

        let resolution = set(class, &state, "arc", ParamValue::Float(1.2));
        assert_eq!(resolution.value("arc"), Some(&ParamValue::Float(0.8)));
    }

    #[test]
    fn test_other_parameter_has_no_side_effects() {
        let class = DoodleClass::AntSeg;
        let state = initial_state(class);
        let resolution = set(class, &state, "colour", "Brown".into());
        assert_eq!(resolution.updates[0].name, "colour");
        assert_eq!(resolution.value("apexY"), None);
        assert_eq!(resolution.value("pupilSize"), Some(&state["pupilSize"]));
    }

    #[test]
    fn test_animation_only_for_animated_simple_parameters() {
        let class = DoodleClass::PhakoIncision;
        let state = initial_state(class);
        let spec = class.parameter("incisionSite").unwrap();
        let resolution = resolve(class, spec, &"Limbal".into(), &state, true);
        for update in &resolution.updates {
            assert_eq!(update.animate, update.name == "radius", "{}", update.name);
        }
        let spec = class.parameter("radius").unwrap();
        let resolution = resolve(class, spec, &ParamValue::Float(420.0), &state, false);
        assert!(resolution.updates.iter().all(|u| !u.animate));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        for class in DoodleClass::ALL {
            let state = initial_state(class);
            for spec in class.parameters() {
                for value in sample_values(spec) {
                    let once = resolve(class, spec, &value, &state, false);
                    let again = resolve(class, spec, &value, &state, false);
                    assert_eq!(once, again, "{class}.{} = {value}", spec.name);

                    let mut applied = state.clone();
                    once.apply_to(&mut applied);
                    let mut twice = applied.clone();
                    resolve(class, spec, &value, &applied, false).apply_to(&mut twice);
                    for (name, v) in &applied {
                        assert!(
                            v.approx_eq(&twice[name]),
                            "{class}.{} = {value} oscillates on {name}: {v} vs {}",
                            spec.name,
                            twice[name]
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_values_stay_in_range() {
        for class in DoodleClass::ALL {
            let state = initial_state(class);
            for spec in class.parameters() {
                for value in sample_values(spec) {
                    let mut next = state.clone();
                    resolve(class, spec, &value, &state, false).apply_to(&mut next);
                    let ranges: BTreeMap<_, _> =
                        class.model().conditional_ranges(&next).into_iter().collect();
                    for param in class.parameters() {
                        let v = &next[param.name];
                        assert!(
                            param.is_legal(v, ranges.get(param.name).copied()),
                            "{class}.{} = {value} left {} at {v}",
                            spec.name,
                            param.name
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_derived_consistent_after_resolution() {
        for class in DoodleClass::ALL {
            let state = initial_state(class);
            for spec in class.parameters() {
                for value in sample_values(spec) {
                    let mut next = state.clone();
                    resolve(class, spec, &value, &state, false).apply_to(&mut next);
                    let mut recomputed = next.clone();
                    derive_all(class, &mut recomputed);
                    assert_eq!(next, recomputed, "{class}.{} = {value}", spec.name);
                }
            }
        }
    }

    #[test]
    fn test_derived_request_round_trips_to_itself() {
        let class = DoodleClass::OpticCup;
        let state = initial_state(class);
        for ratio in [0.1, 0.3, 0.55, 0.7, 1.0] {
            let resolution = set(class, &state, "cdRatio", ParamValue::Float(ratio));
            let expected = crate::params::round_to(ratio, 1);
            assert_eq!(resolution.value("cdRatio"), Some(&ParamValue::Float(expected)));
        }
    }
}
