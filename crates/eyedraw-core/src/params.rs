//! Parameter values and the declarative per-class parameter tables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Tolerance used when comparing numeric parameter values.
pub const VALUE_EPSILON: f64 = 1e-9;

/// Current parameter values of one doodle, keyed by parameter name.
pub type ParamState = BTreeMap<&'static str, ParamValue>;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    /// Numeric view of the value (ints and floats only).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// String view of the value (strings only).
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Check if the value is an int or a float.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ParamValue::Int(_) | ParamValue::Float(_))
    }

    /// Compare two values, treating ints and floats as numbers with a small tolerance.
    pub fn approx_eq(&self, other: &ParamValue) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => (a - b).abs() < VALUE_EPSILON,
            _ => self == other,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

/// How a parameter relates to the others of its doodle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Directly manipulated by the user (apex, origin, rotation, scale).
    Simple,
    /// Computed from simple parameters, never set by user interaction.
    Derived,
    /// Validated auxiliary state with no derivation.
    Other,
}

/// Value type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Float,
    Int,
    String,
    Bool,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::Float => "float",
            ParamType::Int => "int",
            ParamType::String => "string",
            ParamType::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// An inclusive numeric interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min - VALUE_EPSILON && value <= self.max + VALUE_EPSILON
    }

    /// Wrap a value into `[min, max)`.
    pub fn wrap(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return self.min;
        }
        let wrapped = self.min + (value - self.min).rem_euclid(span);
        if wrapped >= self.max { self.min } else { wrapped }
    }
}

/// Legal values of a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Range {
    /// No constraint (bools, free text).
    Any,
    /// Inclusive numeric bounds; out-of-range values are clamped.
    Numeric(NumericRange),
    /// Numeric bounds that wrap around (angles).
    Modular(NumericRange),
    /// Enumerated legal strings.
    List(&'static [&'static str]),
}

/// Error parsing a form field value for a parameter.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot parse {text:?} as {ty}")]
pub struct ParseValueError {
    pub text: String,
    pub ty: ParamType,
}

/// Declaration of one parameter of a doodle class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub ty: ParamType,
    pub range: Range,
    /// Decimal places kept when storing and displaying numeric values.
    pub precision: u32,
    /// Whether changes applied from bindings or sync are interpolated.
    pub animate: bool,
}

impl ParamSpec {
    pub const fn new(name: &'static str, kind: ParamKind, ty: ParamType, range: Range) -> Self {
        Self {
            name,
            kind,
            ty,
            range,
            precision: 0,
            animate: false,
        }
    }

    /// A simple float clamped to `[min, max]`.
    pub const fn simple(name: &'static str, min: f64, max: f64) -> Self {
        Self::new(
            name,
            ParamKind::Simple,
            ParamType::Float,
            Range::Numeric(NumericRange::new(min, max)),
        )
    }

    /// A simple float angle wrapping in `[0, 2π)`.
    pub const fn angle(name: &'static str) -> Self {
        Self::new(
            name,
            ParamKind::Simple,
            ParamType::Float,
            Range::Modular(NumericRange::new(0.0, std::f64::consts::TAU)),
        )
        .with_precision(6)
    }

    /// A derived string taking one of `items`.
    pub const fn derived_list(name: &'static str, items: &'static [&'static str]) -> Self {
        Self::new(name, ParamKind::Derived, ParamType::String, Range::List(items))
    }

    /// An auxiliary string taking one of `items`.
    pub const fn other_list(name: &'static str, items: &'static [&'static str]) -> Self {
        Self::new(name, ParamKind::Other, ParamType::String, Range::List(items))
    }

    pub const fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    pub const fn animated(mut self) -> Self {
        self.animate = true;
        self
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.ty, ParamType::Float | ParamType::Int)
    }

    /// Static numeric range, if any.
    pub fn numeric_range(&self) -> Option<NumericRange> {
        match self.range {
            Range::Numeric(r) | Range::Modular(r) => Some(r),
            _ => None,
        }
    }

    /// Value used when nothing better is known.
    pub fn initial_value(&self) -> ParamValue {
        match (self.ty, self.range) {
            (ParamType::Bool, _) => ParamValue::Bool(false),
            (_, Range::List(items)) => ParamValue::Str(items.first().copied().unwrap_or_default().to_string()),
            (ParamType::String, _) => ParamValue::Str(String::new()),
            (ty, range) => {
                let v = match range {
                    Range::Numeric(r) => r.clamp(0.0),
                    Range::Modular(r) => r.min,
                    _ => 0.0,
                };
                if ty == ParamType::Int {
                    ParamValue::Int(v.round() as i64)
                } else {
                    ParamValue::Float(v)
                }
            }
        }
    }

    /// Coerce, constrain and round `value` into a legal value of this parameter.
    ///
    /// `range` overrides the static numeric range when a conditional range is in
    /// force. Values that cannot be coerced, and strings missing from an
    /// enumeration, fall back to `current`.
    pub fn normalize(
        &self,
        value: &ParamValue,
        range: Option<NumericRange>,
        current: Option<&ParamValue>,
    ) -> ParamValue {
        match self.ty {
            ParamType::Float | ParamType::Int => {
                let number = value
                    .as_f64()
                    .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()));
                let Some(v) = number.filter(|v| v.is_finite()) else {
                    return self.fallback(current);
                };
                let v = self.constrain(v, range);
                if self.ty == ParamType::Int {
                    ParamValue::Int(v.round() as i64)
                } else {
                    ParamValue::Float(v)
                }
            }
            ParamType::String => {
                let text = match value {
                    ParamValue::Str(s) => s.clone(),
                    other => other.to_string(),
                };
                match self.range {
                    Range::List(items) if !items.contains(&text.as_str()) => self.fallback(current),
                    _ => ParamValue::Str(text),
                }
            }
            ParamType::Bool => match value {
                ParamValue::Bool(b) => ParamValue::Bool(*b),
                ParamValue::Int(i) => ParamValue::Bool(*i != 0),
                ParamValue::Str(s) => parse_bool(s)
                    .map(ParamValue::Bool)
                    .unwrap_or_else(|| self.fallback(current)),
                ParamValue::Float(_) => self.fallback(current),
            },
        }
    }

    /// Parse form field text into a (not yet normalized) value.
    pub fn parse(&self, text: &str) -> Result<ParamValue, ParseValueError> {
        let error = || ParseValueError {
            text: text.to_string(),
            ty: self.ty,
        };
        match self.ty {
            ParamType::Float | ParamType::Int => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(ParamValue::Float)
                .ok_or_else(error),
            ParamType::Bool => parse_bool(text).map(ParamValue::Bool).ok_or_else(error),
            ParamType::String => Ok(ParamValue::Str(text.trim().to_string())),
        }
    }

    /// Format a value for a form field.
    pub fn format(&self, value: &ParamValue) -> String {
        match (self.ty, value.as_f64()) {
            (ParamType::Float, Some(v)) => format!("{:.*}", self.precision as usize, v),
            _ => value.to_string(),
        }
    }

    /// Check whether `value` is legal under `range` (or the static range).
    pub fn is_legal(&self, value: &ParamValue, range: Option<NumericRange>) -> bool {
        match (self.range, value) {
            (Range::List(items), ParamValue::Str(s)) => items.contains(&s.as_str()),
            (Range::Numeric(r), v) | (Range::Modular(r), v) if v.is_numeric() => {
                let r = range.unwrap_or(r);
                v.as_f64().is_some_and(|x| r.contains(x))
            }
            (Range::Any, _) => true,
            _ => false,
        }
    }

    fn constrain(&self, value: f64, range: Option<NumericRange>) -> f64 {
        match self.range {
            Range::Modular(r) => {
                let r = range.unwrap_or(r);
                r.wrap(round_to(r.wrap(value), self.precision))
            }
            Range::Numeric(r) => {
                let r = range.unwrap_or(r);
                // Rounding can step past a bound that is not on the precision grid.
                r.clamp(round_to(r.clamp(value), self.precision))
            }
            _ => round_to(value, self.precision),
        }
    }

    fn fallback(&self, current: Option<&ParamValue>) -> ParamValue {
        current.cloned().unwrap_or_else(|| self.initial_value())
    }
}

/// Round to a number of decimal places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Read a numeric parameter from a state, defaulting to zero.
pub fn number(state: &ParamState, name: &str) -> f64 {
    state.get(name).and_then(ParamValue::as_f64).unwrap_or(0.0)
}

/// Read a string parameter from a state, defaulting to empty.
pub fn text<'a>(state: &'a ParamState, name: &str) -> &'a str {
    state.get(name).and_then(ParamValue::as_str).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZES: &[&str] = &["Large", "Medium", "Small"];

    #[test]
    fn test_numeric_clamp_and_round() {
        let spec = ParamSpec::simple("apexY", -280.0, -60.0);
        assert_eq!(spec.normalize(&ParamValue::Float(-300.0), None, None), ParamValue::Float(-280.0));
        assert_eq!(spec.normalize(&ParamValue::Float(-100.4), None, None), ParamValue::Float(-100.0));
        assert_eq!(spec.normalize(&ParamValue::Int(0), None, None), ParamValue::Float(-60.0));
    }

    #[test]
    fn test_range_override() {
        let spec = ParamSpec::simple("arc", 0.2, 1.2).with_precision(3);
        let narrowed = NumericRange::new(0.2, 0.8);
        assert_eq!(spec.normalize(&ParamValue::Float(1.0), Some(narrowed), None), ParamValue::Float(0.8));
        assert_eq!(spec.normalize(&ParamValue::Float(1.0), None, None), ParamValue::Float(1.0));
    }

    #[test]
    fn test_modular_wraps() {
        let spec = ParamSpec::angle("rotation");
        let v = spec.normalize(&ParamValue::Float(std::f64::consts::TAU + 1.0), None, None);
        assert!(v.approx_eq(&ParamValue::Float(1.0)));
        let v = spec.normalize(&ParamValue::Float(-1.0), None, None);
        assert!(v.approx_eq(&ParamValue::Float(round_to(std::f64::consts::TAU - 1.0, 6))));
    }

    #[test]
    fn test_modular_int_never_reaches_max() {
        let spec = ParamSpec::new(
            "incisionMeridian",
            ParamKind::Derived,
            ParamType::Int,
            Range::Modular(NumericRange::new(0.0, 360.0)),
        );
        assert_eq!(spec.normalize(&ParamValue::Float(359.7), None, None), ParamValue::Int(0));
        assert_eq!(spec.normalize(&ParamValue::Float(-90.0), None, None), ParamValue::Int(270));
    }

    #[test]
    fn test_list_falls_back_to_current() {
        let spec = ParamSpec::derived_list("pupilSize", SIZES);
        let current = ParamValue::from("Medium");
        assert_eq!(spec.normalize(&"Small".into(), None, Some(&current)), "Small".into());
        assert_eq!(spec.normalize(&"Huge".into(), None, Some(&current)), current);
        assert_eq!(spec.normalize(&"Huge".into(), None, None), "Large".into());
    }

    #[test]
    fn test_parse_and_format() {
        let spec = ParamSpec::simple("apexY", -280.0, -60.0).with_precision(1);
        assert_eq!(spec.parse(" -120.5 "), Ok(ParamValue::Float(-120.5)));
        assert!(spec.parse("abc").is_err());
        assert_eq!(spec.format(&ParamValue::Float(-120.0)), "-120.0");

        let flag = ParamSpec::new("pxe", ParamKind::Other, ParamType::Bool, Range::Any);
        assert_eq!(flag.parse("TRUE"), Ok(ParamValue::Bool(true)));
        assert!(flag.parse("maybe").is_err());
    }

    #[test]
    fn test_approx_eq_mixes_ints_and_floats() {
        assert!(ParamValue::Int(5).approx_eq(&ParamValue::Float(5.0)));
        assert!(!ParamValue::Int(5).approx_eq(&ParamValue::Float(5.1)));
        assert!(!ParamValue::from("5").approx_eq(&ParamValue::Int(5)));
    }

    #[test]
    fn test_untagged_serde() {
        let values: Vec<ParamValue> = serde_json::from_str(r#"[true, 3, -2.5, "Large"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                ParamValue::Bool(true),
                ParamValue::Int(3),
                ParamValue::Float(-2.5),
                ParamValue::from("Large"),
            ]
        );
    }
}
