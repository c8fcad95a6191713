//! Saved drawing format.
//!
//! A drawing is stored as a JSON array with one record per doodle, back to
//! front:
//!
//! ```json
//! [{ "subclass": "OpticCup", "apexY": -150, "mode": "Basic" }]
//! ```
//!
//! Records carry simple and other parameters. Derived parameters are never
//! stored; they are recomputed when the record is loaded.

use crate::doodle::Doodle;
use crate::doodles::{DoodleClass, UnknownClass};
use crate::drawing::Eye;
use crate::params::{ParamKind, ParamState, ParamValue};
use crate::resolver;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Invalid saved drawing: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    UnknownClass(#[from] UnknownClass),
}

/// Result type for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

/// One saved doodle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoodleRecord {
    pub subclass: String,
    #[serde(flatten)]
    pub params: BTreeMap<String, ParamValue>,
}

impl DoodleRecord {
    pub fn from_doodle(doodle: &Doodle) -> Self {
        Self {
            subclass: doodle.class().name().to_string(),
            params: doodle
                .stored_values()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
        }
    }

    /// Record the stored parameters of `state` for a doodle of `class`.
    pub fn from_state(class: DoodleClass, state: &ParamState) -> Self {
        Self {
            subclass: class.name().to_string(),
            params: class
                .parameters()
                .iter()
                .filter(|spec| spec.kind != ParamKind::Derived)
                .filter_map(|spec| state.get(spec.name).map(|v| (spec.name.to_string(), v.clone())))
                .collect(),
        }
    }

    /// Rebuild a doodle, starting from the class defaults for `eye`.
    ///
    /// Stored values are normalized into range; derived values and names the
    /// class does not declare are ignored.
    pub fn into_doodle(self, eye: Eye) -> PersistResult<Doodle> {
        let class: DoodleClass = self.subclass.parse()?;
        let mut doodle = Doodle::new(class, eye);
        let mut values = doodle.values().clone();

        for (name, value) in &self.params {
            match class.parameter(name) {
                Some(spec) if spec.kind != ParamKind::Derived => {
                    let normalized = spec.normalize(value, None, values.get(spec.name));
                    values.insert(spec.name, normalized);
                }
                Some(_) => log::debug!("Ignoring stored derived parameter {class}.{name}"),
                None => log::debug!("Ignoring unknown parameter {class}.{name}"),
            }
        }

        resolver::clamp_all(class, &mut values);
        resolver::derive_all(class, &mut values);
        doodle.replace_values(values);
        Ok(doodle)
    }
}

/// Serialize records (back to front) into the saved format.
pub fn to_json(records: &[DoodleRecord]) -> PersistResult<String> {
    Ok(serde_json::to_string(records)?)
}

/// Parse the saved format. An empty string is an empty drawing.
pub fn from_json(json: &str) -> PersistResult<Vec<DoodleRecord>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(json)?)
}
