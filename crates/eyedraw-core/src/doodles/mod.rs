//! Doodle class catalogue.
//!
//! Every supported doodle is a variant of [`DoodleClass`]. Each variant
//! dispatches to a [`DoodleModel`] holding the class's parameter table,
//! default routine and dependency functions. Drawing code for the classes
//! lives in the rendering layer, not here.

mod ant_seg;
mod hyphaema;
mod nuclear_cataract;
mod optic_cup;
mod pciol;
mod phako_incision;

pub use ant_seg::AntSeg;
pub use hyphaema::Hyphaema;
pub use nuclear_cataract::NuclearCataract;
pub use optic_cup::OpticCup;
pub use pciol::Pciol;
pub use phako_incision::PhakoIncision;

use crate::drawing::Eye;
use crate::params::{NumericRange, ParamSpec, ParamState, ParamValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Per-class behaviour of a doodle.
///
/// The dependency functions are pure: they only read the state passed in.
pub trait DoodleModel: Sync {
    /// Parameter table of the class.
    fn parameters(&self) -> &'static [ParamSpec];

    /// Initial values for a new doodle. Parameters left out get the
    /// table's initial value; derived parameters are always recomputed.
    fn defaults(&self, eye: Eye) -> Vec<(&'static str, ParamValue)>;

    /// Whether new doodles of this class take part in sync as slaves.
    fn will_sync(&self) -> bool {
        true
    }

    /// Ranges of simple parameters that depend on the values of others.
    fn conditional_ranges(&self, _state: &ParamState) -> Vec<(&'static str, NumericRange)> {
        Vec::new()
    }

    /// Every derived parameter computed from the simple parameters in `state`.
    fn derive(&self, state: &ParamState) -> Vec<(&'static str, ParamValue)>;

    /// Simple parameter values implied by setting derived parameter `name`.
    fn inverse(
        &self,
        name: &str,
        value: &ParamValue,
        state: &ParamState,
    ) -> Vec<(&'static str, ParamValue)>;
}

/// Error for doodle class names that are not in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown doodle class: {0}")]
pub struct UnknownClass(pub String);

/// Enumerated doodle classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DoodleClass {
    AntSeg,
    NuclearCataract,
    OpticCup,
    PhakoIncision,
    #[serde(rename = "PCIOL")]
    Pciol,
    Hyphaema,
}

impl DoodleClass {
    pub const ALL: [DoodleClass; 6] = [
        DoodleClass::AntSeg,
        DoodleClass::NuclearCataract,
        DoodleClass::OpticCup,
        DoodleClass::PhakoIncision,
        DoodleClass::Pciol,
        DoodleClass::Hyphaema,
    ];

    /// The model implementing this class.
    pub fn model(self) -> &'static dyn DoodleModel {
        match self {
            DoodleClass::AntSeg => &AntSeg,
            DoodleClass::NuclearCataract => &NuclearCataract,
            DoodleClass::OpticCup => &OpticCup,
            DoodleClass::PhakoIncision => &PhakoIncision,
            DoodleClass::Pciol => &Pciol,
            DoodleClass::Hyphaema => &Hyphaema,
        }
    }

    /// Class name as used in saved drawings and sync tables.
    pub fn name(self) -> &'static str {
        match self {
            DoodleClass::AntSeg => "AntSeg",
            DoodleClass::NuclearCataract => "NuclearCataract",
            DoodleClass::OpticCup => "OpticCup",
            DoodleClass::PhakoIncision => "PhakoIncision",
            DoodleClass::Pciol => "PCIOL",
            DoodleClass::Hyphaema => "Hyphaema",
        }
    }

    pub fn parameters(self) -> &'static [ParamSpec] {
        self.model().parameters()
    }

    /// Look up a declared parameter by name.
    pub fn parameter(self, name: &str) -> Option<&'static ParamSpec> {
        self.parameters().iter().find(|spec| spec.name == name)
    }

    /// Check if the class declares a parameter.
    pub fn declares(self, name: &str) -> bool {
        self.parameter(name).is_some()
    }
}

impl fmt::Display for DoodleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DoodleClass {
    type Err = UnknownClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DoodleClass::ALL
            .into_iter()
            .find(|class| class.name() == s)
            .ok_or_else(|| UnknownClass(s.to_string()))
    }
}

/// Pick the band label for `value` from `(upper bound, label)` pairs,
/// falling back to `last` above every bound.
pub(crate) fn band(value: f64, bands: &[(f64, &'static str)], last: &'static str) -> ParamValue {
    let label = bands
        .iter()
        .find(|(upper, _)| value < *upper)
        .map(|(_, label)| *label)
        .unwrap_or(last);
    ParamValue::from(label)
}
