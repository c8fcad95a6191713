//! Drawings and parameter mutation.
//!
//! A [`Drawing`] owns its doodles (back to front), the animation stepper, the
//! form field bindings and a [`NotificationBus`]. Every parameter change goes
//! through [`Drawing::apply_change`], which resolves it against the settled
//! state of the doodle, applies the result, refreshes bound fields and then
//! publishes one `ParameterChanged` notification per changed parameter.

use crate::animation::{AnimationConfig, Animator};
use crate::bindings::FieldBindings;
use crate::doodle::{Doodle, DoodleId};
use crate::doodles::DoodleClass;
use crate::notification::{
    ChangeSource, Listener, Notification, NotificationBus, NotificationKind, ParameterChange,
    SubscriptionId,
};
use crate::params::{ParamKind, ParamSpec, ParamState, ParamValue, ParseValueError};
use crate::persist::{self, DoodleRecord, PersistError};
use crate::resolver;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Identifier of a drawing, unique within a registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawingId(String);

impl DrawingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DrawingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DrawingId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DrawingId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Eye a drawing depicts. Some class defaults mirror between eyes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Eye {
    #[default]
    Right,
    Left,
}

impl fmt::Display for Eye {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eye::Right => f.write_str("right"),
            Eye::Left => f.write_str("left"),
        }
    }
}

/// Drawing errors.
#[derive(Debug, Error)]
pub enum DrawingError {
    #[error("Doodle not found: {0}")]
    DoodleNotFound(DoodleId),
    #[error("{class} has no parameter {parameter}")]
    UnknownParameter { class: DoodleClass, parameter: String },
    #[error("{class}.{parameter} is not a simple parameter")]
    NotSimple {
        class: DoodleClass,
        parameter: &'static str,
    },
    #[error("Field is not bound: {0}")]
    UnboundField(String),
    #[error(transparent)]
    Parse(#[from] ParseValueError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Result type for drawing operations.
pub type DrawingResult<T> = Result<T, DrawingError>;

/// One drawing surface and its doodles.
#[derive(Debug)]
pub struct Drawing {
    id: DrawingId,
    eye: Eye,
    doodles: HashMap<DoodleId, Doodle>,
    /// Back to front.
    order: Vec<DoodleId>,
    selected: Option<DoodleId>,
    bus: NotificationBus,
    animator: Animator,
    bindings: FieldBindings,
    repaint_generation: u64,
}

impl Drawing {
    pub fn new(id: impl Into<DrawingId>, eye: Eye) -> Self {
        Self::with_animation(id, eye, AnimationConfig::default())
    }

    pub fn with_animation(id: impl Into<DrawingId>, eye: Eye, animation: AnimationConfig) -> Self {
        Self {
            id: id.into(),
            eye,
            doodles: HashMap::new(),
            order: Vec::new(),
            selected: None,
            bus: NotificationBus::new(),
            animator: Animator::new(animation),
            bindings: FieldBindings::new(),
            repaint_generation: 0,
        }
    }

    pub fn id(&self) -> &DrawingId {
        &self.id
    }

    pub fn eye(&self) -> Eye {
        self.eye
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut NotificationBus {
        &mut self.bus
    }

    pub fn subscribe(&mut self, kinds: &[NotificationKind], listener: Rc<dyn Listener>) -> SubscriptionId {
        self.bus.subscribe(kinds, listener)
    }

    /// Announce that the drawing is initialized.
    pub fn ready(&self) {
        self.bus.publish(&Notification::Ready {
            drawing: self.id.clone(),
        });
    }

    // --- Doodles ---

    /// Add a doodle of `class` with its defaults, in front of the others.
    pub fn add_doodle(&mut self, class: DoodleClass) -> DoodleId {
        self.insert_doodle(Doodle::new(class, self.eye))
    }

    /// Add a doodle, then resolve `params` on it in order before it is published.
    pub fn add_doodle_with(
        &mut self,
        class: DoodleClass,
        params: &[(&str, ParamValue)],
    ) -> DrawingResult<DoodleId> {
        let mut doodle = Doodle::new(class, self.eye);
        let mut state = doodle.values().clone();
        for (name, value) in params {
            let spec = lookup(class, name)?;
            resolver::resolve(class, spec, value, &state, false).apply_to(&mut state);
        }
        doodle.replace_values(state);
        Ok(self.insert_doodle(doodle))
    }

    fn insert_doodle(&mut self, doodle: Doodle) -> DoodleId {
        let id = doodle.id();
        let class = doodle.class();
        self.order.push(id);
        self.doodles.insert(id, doodle);
        self.refresh_bindings(class);
        self.bus.publish(&Notification::DoodleAdded {
            drawing: self.id.clone(),
            doodle: id,
            class,
        });
        id
    }

    /// Remove a doodle, stopping its animations.
    pub fn delete_doodle(&mut self, id: DoodleId) -> DrawingResult<Doodle> {
        let doodle = self.doodles.remove(&id).ok_or(DrawingError::DoodleNotFound(id))?;
        self.order.retain(|&d| d != id);
        self.animator.cancel_doodle(id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.refresh_bindings(doodle.class());
        self.bus.publish(&Notification::DoodleDeleted {
            drawing: self.id.clone(),
            doodle: id,
            class: doodle.class(),
        });
        Ok(doodle)
    }

    /// Remove every doodle. Returns the number removed.
    pub fn delete_all_doodles(&mut self) -> usize {
        let ids = self.order.clone();
        ids.into_iter()
            .filter_map(|id| self.delete_doodle(id).ok())
            .count()
    }

    pub fn doodle(&self, id: DoodleId) -> Option<&Doodle> {
        self.doodles.get(&id)
    }

    /// Doodles back to front.
    pub fn doodles(&self) -> impl Iterator<Item = &Doodle> {
        self.order.iter().filter_map(|id| self.doodles.get(id))
    }

    /// The backmost doodle of `class`.
    pub fn first_doodle_of_class(&self, class: DoodleClass) -> Option<&Doodle> {
        self.doodles().find(|d| d.class() == class)
    }

    pub fn doodle_count(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Bring a doodle to the front (topmost). Returns false if it is not on the drawing.
    pub fn bring_to_front(&mut self, id: DoodleId) -> bool {
        if !self.doodles.contains_key(&id) {
            return false;
        }
        self.order.retain(|&d| d != id);
        self.order.push(id);
        true
    }

    /// Send a doodle to the back (bottommost). Returns false if it is not on the drawing.
    pub fn send_to_back(&mut self, id: DoodleId) -> bool {
        if !self.doodles.contains_key(&id) {
            return false;
        }
        self.order.retain(|&d| d != id);
        self.order.insert(0, id);
        true
    }

    /// Select a doodle, or clear the selection with `None`.
    pub fn select_doodle(&mut self, id: Option<DoodleId>) -> DrawingResult<()> {
        if let Some(id) = id {
            if !self.doodles.contains_key(&id) {
                return Err(DrawingError::DoodleNotFound(id));
            }
        }
        if self.selected != id {
            self.selected = id;
            self.bus.publish(&Notification::DoodleSelected {
                drawing: self.id.clone(),
                doodle: id,
            });
        }
        Ok(())
    }

    pub fn selected(&self) -> Option<DoodleId> {
        self.selected
    }

    /// Opt one doodle in or out of receiving synced changes.
    pub fn set_will_sync(&mut self, id: DoodleId, will_sync: bool) -> DrawingResult<()> {
        let doodle = self.doodles.get_mut(&id).ok_or(DrawingError::DoodleNotFound(id))?;
        doodle.set_will_sync(will_sync);
        Ok(())
    }

    // --- Parameters ---

    /// Live value of a parameter, as painted.
    pub fn value(&self, id: DoodleId, name: &str) -> Option<&ParamValue> {
        self.doodles.get(&id).and_then(|d| d.value(name))
    }

    /// Value of a parameter once in-flight animations complete.
    pub fn settled_value(&self, id: DoodleId, name: &str) -> Option<ParamValue> {
        let doodle = self.doodles.get(&id)?;
        settled_state(doodle, &self.animator).remove(name)
    }

    /// Set a simple parameter from direct manipulation, without animation.
    pub fn set_simple_parameter(
        &mut self,
        id: DoodleId,
        name: &str,
        value: impl Into<ParamValue>,
    ) -> DrawingResult<Vec<ParameterChange>> {
        let class = self.doodle_class(id)?;
        let spec = lookup(class, name)?;
        if spec.kind != ParamKind::Simple {
            return Err(DrawingError::NotSimple {
                class,
                parameter: spec.name,
            });
        }
        let changes = self.apply_change(id, name, value.into(), ChangeSource::User, false)?;
        if !changes.is_empty() {
            self.repaint();
        }
        Ok(changes)
    }

    /// Set any parameter from form field text, animating where the parameter allows.
    pub fn set_parameter_from_string(
        &mut self,
        id: DoodleId,
        name: &str,
        text: &str,
    ) -> DrawingResult<Vec<ParameterChange>> {
        let class = self.doodle_class(id)?;
        let value = lookup(class, name)?.parse(text)?;
        let changes = self.apply_change(id, name, value, ChangeSource::Binding, true)?;
        if !changes.is_empty() {
            self.repaint();
        }
        Ok(changes)
    }

    /// Resolve and apply one parameter change, then publish what changed.
    ///
    /// Returns the changes in resolution order. Values equal to the settled
    /// value are not reported. Does not repaint.
    pub fn apply_change(
        &mut self,
        id: DoodleId,
        name: &str,
        value: ParamValue,
        source: ChangeSource,
        animate: bool,
    ) -> DrawingResult<Vec<ParameterChange>> {
        let doodle = self.doodles.get_mut(&id).ok_or(DrawingError::DoodleNotFound(id))?;
        let class = doodle.class();
        let spec = lookup(class, name)?;
        let settled = settled_state(doodle, &self.animator);
        let resolution = resolver::resolve(class, spec, &value, &settled, animate);

        let mut changes = Vec::new();
        for update in resolution.updates {
            let Some(old_value) = settled.get(update.name) else {
                continue;
            };
            if old_value.approx_eq(&update.value) {
                continue;
            }
            let live = doodle.number(update.name);
            let started = match (update.animate, live, update.value.as_f64(), class.parameter(update.name)) {
                (true, Some(from), Some(to), Some(s)) => self.animator.start(id, s, from, to),
                _ => false,
            };
            if !started {
                self.animator.cancel(id, update.name);
                doodle.set_value(update.name, update.value.clone());
            }
            changes.push(ParameterChange {
                drawing: self.id.clone(),
                doodle: id,
                class,
                parameter: update.name,
                value: update.value,
                old_value: old_value.clone(),
                source,
                derived_from: None,
            });
        }

        if changes.iter().any(|c| c.parameter == spec.name) {
            for change in changes.iter_mut().filter(|c| c.parameter != spec.name) {
                change.derived_from = Some(spec.name);
            }
        }

        if !changes.is_empty() {
            self.refresh_bindings(class);
            for change in &changes {
                self.bus.publish(&Notification::ParameterChanged(change.clone()));
            }
        }
        Ok(changes)
    }

    fn doodle_class(&self, id: DoodleId) -> DrawingResult<DoodleClass> {
        self.doodles
            .get(&id)
            .map(Doodle::class)
            .ok_or(DrawingError::DoodleNotFound(id))
    }

    // --- Rendering ---

    /// Ask the rendering layer to redraw.
    pub fn repaint(&mut self) {
        self.repaint_generation += 1;
        self.bus.publish(&Notification::Repaint {
            drawing: self.id.clone(),
            generation: self.repaint_generation,
        });
    }

    /// Number of repaints requested so far.
    pub fn repaint_count(&self) -> u64 {
        self.repaint_generation
    }

    /// Advance in-flight animations by `dt` seconds, repainting if anything moved.
    pub fn step_animations(&mut self, dt: f64) -> bool {
        let frames = self.animator.step(dt);
        if frames.is_empty() {
            return false;
        }
        for frame in frames {
            let Some(doodle) = self.doodles.get_mut(&frame.doodle) else {
                continue;
            };
            if let Some(spec) = doodle.class().parameter(frame.parameter) {
                let value = spec.normalize(&ParamValue::Float(frame.value), None, doodle.value(spec.name));
                doodle.set_value(spec.name, value);
            }
        }
        self.repaint();
        true
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    // --- Field bindings ---

    /// Bind a form field to a parameter of `class`.
    pub fn bind_field(&mut self, class: DoodleClass, name: &str, field: impl Into<String>) -> DrawingResult<()> {
        let spec = lookup(class, name)?;
        self.bindings.bind(class, spec.name, field);
        self.refresh_bindings(class);
        Ok(())
    }

    /// Feed edited field text back into the first doodle of the bound class.
    ///
    /// Nothing happens if the drawing has no doodle of that class.
    pub fn field_changed(&mut self, field: &str, text: &str) -> DrawingResult<Vec<ParameterChange>> {
        let (class, name) = self
            .bindings
            .binding_for_field(field)
            .ok_or_else(|| DrawingError::UnboundField(field.to_string()))?;
        let Some(id) = self.first_doodle_of_class(class).map(Doodle::id) else {
            log::debug!("No {class} on drawing {} for field {field}", self.id);
            return Ok(Vec::new());
        };
        self.set_parameter_from_string(id, name, text)
    }

    pub fn field_value(&self, field: &str) -> Option<&str> {
        self.bindings.field_value(field)
    }

    /// Every bound field with its text.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.fields()
    }

    fn refresh_bindings(&mut self, class: DoodleClass) {
        if self.bindings.is_empty() {
            return;
        }
        let Some(doodle) = self.doodles().find(|d| d.class() == class) else {
            self.bindings.clear_class(class);
            return;
        };
        let state = settled_state(doodle, &self.animator);
        let texts: Vec<(String, String)> = self
            .bindings
            .fields_for(class)
            .filter_map(|(name, field)| {
                let spec = class.parameter(name)?;
                let value = state.get(name)?;
                Some((field.to_string(), spec.format(value)))
            })
            .collect();
        for (field, text) in texts {
            self.bindings.write(&field, text);
        }
    }

    // --- Persistence ---

    /// Serialize the doodles, back to front, with their settled values.
    pub fn save(&self) -> DrawingResult<String> {
        let records: Vec<DoodleRecord> = self
            .doodles()
            .map(|d| DoodleRecord::from_state(d.class(), &settled_state(d, &self.animator)))
            .collect();
        Ok(persist::to_json(&records)?)
    }

    /// Add the doodles of a saved drawing in front of the existing ones.
    ///
    /// Nothing is added if any record fails to load. Publishes
    /// `DoodlesLoaded` and repaints. Returns the number of doodles added.
    pub fn load(&mut self, json: &str) -> DrawingResult<usize> {
        let doodles = persist::from_json(json)?
            .into_iter()
            .map(|record| record.into_doodle(self.eye))
            .collect::<Result<Vec<_>, _>>()?;
        let count = doodles.len();
        let mut classes = Vec::new();
        for doodle in doodles {
            if !classes.contains(&doodle.class()) {
                classes.push(doodle.class());
            }
            self.order.push(doodle.id());
            self.doodles.insert(doodle.id(), doodle);
        }
        for class in classes {
            self.refresh_bindings(class);
        }
        log::debug!("Loaded {count} doodles into drawing {}", self.id);
        self.bus.publish(&Notification::DoodlesLoaded {
            drawing: self.id.clone(),
            count,
        });
        self.repaint();
        Ok(count)
    }
}

fn lookup(class: DoodleClass, name: &str) -> DrawingResult<&'static ParamSpec> {
    class
        .parameter(name)
        .ok_or_else(|| DrawingError::UnknownParameter {
            class,
            parameter: name.to_string(),
        })
}

/// Values of a doodle with in-flight animations replaced by their targets.
fn settled_state(doodle: &Doodle, animator: &Animator) -> ParamState {
    let mut state = doodle.values().clone();
    for (name, target) in animator.targets(doodle.id()) {
        if let Some(spec) = doodle.class().parameter(name) {
            let value = spec.normalize(&ParamValue::Float(target), None, state.get(name));
            state.insert(spec.name, value);
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Ease;
    use std::cell::RefCell;

    fn drawing() -> Drawing {
        Drawing::with_animation(
            "right",
            Eye::Right,
            AnimationConfig {
                duration_secs: 1.0,
                ease: Ease::Linear,
            },
        )
    }

    fn record_kinds(drawing: &mut Drawing) -> Rc<RefCell<Vec<NotificationKind>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        drawing.subscribe(
            &[
                NotificationKind::DoodleAdded,
                NotificationKind::DoodleDeleted,
                NotificationKind::DoodleSelected,
                NotificationKind::ParameterChanged,
                NotificationKind::Repaint,
                NotificationKind::DoodlesLoaded,
            ],
            Rc::new(move |n: &Notification| -> Result<(), crate::ListenerError> {
                sink.borrow_mut().push(n.kind());
                Ok(())
            }),
        );
        log
    }

    #[test]
    fn test_doodle_order() {
        let mut drawing = drawing();
        let a = drawing.add_doodle(DoodleClass::AntSeg);
        let b = drawing.add_doodle(DoodleClass::OpticCup);
        let c = drawing.add_doodle(DoodleClass::AntSeg);
        assert_eq!(drawing.first_doodle_of_class(DoodleClass::AntSeg).map(Doodle::id), Some(a));

        assert!(drawing.send_to_back(c));
        let order: Vec<_> = drawing.doodles().map(Doodle::id).collect();
        assert_eq!(order, vec![c, a, b]);
        assert_eq!(drawing.first_doodle_of_class(DoodleClass::AntSeg).map(Doodle::id), Some(c));

        assert!(drawing.bring_to_front(c));
        assert!(!drawing.bring_to_front(uuid::Uuid::new_v4()));
        assert!(drawing.delete_doodle(a).is_ok());
        assert!(matches!(drawing.delete_doodle(a), Err(DrawingError::DoodleNotFound(_))));
        assert_eq!(drawing.delete_all_doodles(), 2);
        assert!(drawing.is_empty());
    }

    #[test]
    fn test_simple_change_updates_derived_and_notifies() {
        let mut drawing = drawing();
        let id = drawing.add_doodle(DoodleClass::AntSeg);
        let log = record_kinds(&mut drawing);

        let changes = drawing.set_simple_parameter(id, "apexY", -150.0).unwrap();
        let names: Vec<_> = changes.iter().map(|c| c.parameter).collect();
        assert_eq!(names, vec!["apexY", "pupilSize"]);
        assert_eq!(changes[1].old_value, "Large".into());
        assert_eq!(changes[1].value, "Medium".into());
        assert!(changes.iter().all(|c| c.source == ChangeSource::User));
        assert_eq!(changes[0].derived_from, None);
        assert_eq!(changes[1].derived_from, Some("apexY"));
        assert_eq!(drawing.value(id, "apexY"), Some(&ParamValue::Float(-150.0)));

        assert_eq!(
            *log.borrow(),
            vec![
                NotificationKind::ParameterChanged,
                NotificationKind::ParameterChanged,
                NotificationKind::Repaint
            ]
        );

        // Same value again is not a change.
        assert!(drawing.set_simple_parameter(id, "apexY", -150.0).unwrap().is_empty());
        assert_eq!(drawing.repaint_count(), 1);
    }

    #[test]
    fn test_set_simple_rejects_other_kinds() {
        let mut drawing = drawing();
        let id = drawing.add_doodle(DoodleClass::AntSeg);
        assert!(matches!(
            drawing.set_simple_parameter(id, "pupilSize", "Small"),
            Err(DrawingError::NotSimple { .. })
        ));
        assert!(matches!(
            drawing.set_simple_parameter(id, "grade", 1.0),
            Err(DrawingError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_string_change_animates_simple_values() {
        let mut drawing = drawing();
        let id = drawing.add_doodle(DoodleClass::OpticCup);

        let changes = drawing.set_parameter_from_string(id, "cdRatio", "0.8").unwrap();
        assert_eq!(changes.len(), 2);
        assert!(drawing.is_animating());
        // Live value still where it was, derived value and settled value already final.
        assert_eq!(drawing.value(id, "apexY"), Some(&ParamValue::Float(-150.0)));
        assert_eq!(drawing.settled_value(id, "apexY"), Some(ParamValue::Float(-240.0)));
        assert_eq!(drawing.value(id, "cdRatio"), Some(&ParamValue::Float(0.8)));

        assert!(drawing.step_animations(0.5));
        assert_eq!(drawing.value(id, "apexY"), Some(&ParamValue::Float(-195.0)));
        assert!(drawing.step_animations(0.6));
        assert_eq!(drawing.value(id, "apexY"), Some(&ParamValue::Float(-240.0)));
        assert!(!drawing.is_animating());
        assert!(!drawing.step_animations(0.1));
    }

    #[test]
    fn test_direct_change_cancels_animation() {
        let mut drawing = drawing();
        let id = drawing.add_doodle(DoodleClass::OpticCup);
        drawing.set_parameter_from_string(id, "cdRatio", "0.8").unwrap();
        drawing.step_animations(0.5);

        drawing.set_simple_parameter(id, "apexY", -60.0).unwrap();
        assert!(!drawing.is_animating());
        assert_eq!(drawing.value(id, "apexY"), Some(&ParamValue::Float(-60.0)));
        assert_eq!(drawing.value(id, "cdRatio"), Some(&ParamValue::Float(0.2)));
    }

    #[test]
    fn test_side_effect_of_unreported_edit_is_untagged() {
        let mut drawing = drawing();
        let id = drawing.add_doodle(DoodleClass::OpticCup);
        drawing.set_simple_parameter(id, "apexY", -155.0).unwrap();

        // The ratio already reads 0.5, so only the snapped apex is reported.
        let changes = drawing.set_parameter_from_string(id, "cdRatio", "0.5").unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].parameter, "apexY");
        assert_eq!(changes[0].derived_from, None);
        assert_eq!(drawing.settled_value(id, "apexY"), Some(ParamValue::Float(-150.0)));
    }

    #[test]
    fn test_unparsable_text() {
        let mut drawing = drawing();
        let id = drawing.add_doodle(DoodleClass::OpticCup);
        assert!(matches!(
            drawing.set_parameter_from_string(id, "cdRatio", "wide"),
            Err(DrawingError::Parse(_))
        ));
        assert_eq!(drawing.value(id, "apexY"), Some(&ParamValue::Float(-150.0)));
    }

    #[test]
    fn test_field_bindings_follow_values() {
        let mut drawing = drawing();
        drawing.bind_field(DoodleClass::OpticCup, "cdRatio", "cd_ratio").unwrap();
        assert_eq!(drawing.field_value("cd_ratio"), Some(""));
        assert!(drawing.bind_field(DoodleClass::OpticCup, "size", "x").is_err());

        let id = drawing.add_doodle(DoodleClass::OpticCup);
        assert_eq!(drawing.field_value("cd_ratio"), Some("0.5"));

        drawing.set_simple_parameter(id, "apexY", -270.0).unwrap();
        assert_eq!(drawing.field_value("cd_ratio"), Some("0.9"));

        drawing.field_changed("cd_ratio", "0.3").unwrap();
        assert_eq!(drawing.settled_value(id, "apexY"), Some(ParamValue::Float(-90.0)));
        assert_eq!(drawing.field_value("cd_ratio"), Some("0.3"));
        assert!(matches!(
            drawing.field_changed("nope", "1"),
            Err(DrawingError::UnboundField(_))
        ));

        drawing.delete_doodle(id).unwrap();
        assert_eq!(drawing.field_value("cd_ratio"), Some(""));
        assert!(drawing.field_changed("cd_ratio", "0.4").unwrap().is_empty());
    }

    #[test]
    fn test_add_doodle_with_parameters() {
        let mut drawing = drawing();
        let id = drawing
            .add_doodle_with(DoodleClass::PhakoIncision, &[("incisionSite", "Scleral".into())])
            .unwrap();
        assert_eq!(drawing.value(id, "radius"), Some(&ParamValue::Float(460.0)));
        assert_eq!(drawing.value(id, "incisionSite"), Some(&"Scleral".into()));
        assert!(
            drawing
                .add_doodle_with(DoodleClass::PhakoIncision, &[("depth", 1.0.into())])
                .is_err()
        );
    }

    #[test]
    fn test_selection() {
        let mut drawing = drawing();
        let id = drawing.add_doodle(DoodleClass::AntSeg);
        let log = record_kinds(&mut drawing);
        drawing.select_doodle(Some(id)).unwrap();
        drawing.select_doodle(Some(id)).unwrap();
        assert_eq!(drawing.selected(), Some(id));
        assert!(drawing.select_doodle(Some(uuid::Uuid::new_v4())).is_err());
        drawing.delete_doodle(id).unwrap();
        assert_eq!(drawing.selected(), None);
        assert_eq!(
            *log.borrow(),
            vec![NotificationKind::DoodleSelected, NotificationKind::DoodleDeleted]
        );
    }

    #[test]
    fn test_save_and_load() {
        let mut drawing = drawing();
        let id = drawing.add_doodle(DoodleClass::OpticCup);
        drawing.set_parameter_from_string(id, "cdRatio", "0.8").unwrap();
        // Saved mid-animation: the target is stored.
        let json = drawing.save().unwrap();
        assert!(json.contains("-240"));
        assert!(!json.contains("cdRatio"));

        let mut other = Drawing::new("copy", Eye::Left);
        let log = record_kinds(&mut other);
        assert_eq!(other.load(&json).unwrap(), 1);
        let cup = other.first_doodle_of_class(DoodleClass::OpticCup).unwrap();
        assert_eq!(cup.value("cdRatio"), Some(&ParamValue::Float(0.8)));
        assert_eq!(
            *log.borrow(),
            vec![NotificationKind::DoodlesLoaded, NotificationKind::Repaint]
        );

        assert!(other.load(r#"[{"subclass":"Fundus"}]"#).is_err());
        assert_eq!(other.doodle_count(), 1);
    }
}
