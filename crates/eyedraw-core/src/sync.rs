//! Master/slave parameter synchronization between drawings.
//!
//! A [`SyncConfig`] maps each master drawing to a [`SyncMapping`]: for every
//! slave drawing, which master classes drive which slave classes, and through
//! which parameters. The [`SyncCoordinator`] listens for `ParameterChanged` on
//! the master drawings and replays each change on the first doodle of every
//! mapped slave class.
//!
//! String and boolean values replace the slave value. Numeric values are
//! applied as an increment, `slave + (new - old)`, so an offset between the
//! pair survives. Changes that were themselves produced by sync are never
//! propagated again, and a side effect of an edit is not replayed on a slave
//! that receives the edit itself.

use crate::doodles::DoodleClass;
use crate::drawing::{Drawing, DrawingError, DrawingId};
use crate::notification::{
    ChangeSource, Listener, ListenerError, Notification, NotificationKind, ParameterChange,
    SubscriptionId,
};
use crate::params::ParamValue;
use crate::registry::DrawingRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use thiserror::Error;

/// Parameters kept in step for one (master class, slave class) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncParameters {
    pub parameters: Vec<String>,
}

impl SyncParameters {
    pub fn contains(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p == name)
    }
}

/// Sync table of one master drawing: slave drawing → master class → slave class → parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncMapping(BTreeMap<DrawingId, BTreeMap<DoodleClass, BTreeMap<DoodleClass, SyncParameters>>>);

impl SyncMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`SyncMapping::add`].
    pub fn with(
        mut self,
        slave: impl Into<DrawingId>,
        master_class: DoodleClass,
        slave_class: DoodleClass,
        parameters: &[&str],
    ) -> Self {
        self.add(slave, master_class, slave_class, parameters);
        self
    }

    /// Sync `parameters` of `master_class` doodles onto `slave_class` doodles of `slave`.
    pub fn add(
        &mut self,
        slave: impl Into<DrawingId>,
        master_class: DoodleClass,
        slave_class: DoodleClass,
        parameters: &[&str],
    ) {
        let entry = self
            .0
            .entry(slave.into())
            .or_default()
            .entry(master_class)
            .or_default()
            .entry(slave_class)
            .or_default();
        for name in parameters {
            if !entry.contains(name) {
                entry.parameters.push(name.to_string());
            }
        }
    }

    /// Slave drawings and the slave classes each maps for `master_class`.
    pub fn slaves_for(
        &self,
        master_class: DoodleClass,
    ) -> impl Iterator<Item = (&DrawingId, &BTreeMap<DoodleClass, SyncParameters>)> {
        self.0
            .iter()
            .filter_map(move |(slave, classes)| classes.get(&master_class).map(|c| (slave, c)))
    }

    /// Slave drawing ids named by the mapping.
    pub fn slave_drawings(&self) -> impl Iterator<Item = &DrawingId> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Sync tables of every master drawing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncConfig(BTreeMap<DrawingId, SyncMapping>);

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_master(mut self, master: impl Into<DrawingId>, mapping: SyncMapping) -> Self {
        self.insert(master, mapping);
        self
    }

    pub fn insert(&mut self, master: impl Into<DrawingId>, mapping: SyncMapping) {
        self.0.insert(master.into(), mapping);
    }

    pub fn mapping_for(&self, master: &DrawingId) -> Option<&SyncMapping> {
        self.0.get(master)
    }

    pub fn masters(&self) -> impl Iterator<Item = &DrawingId> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Sync failures. None of them stop propagation to other slaves.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Unknown drawing: {0}")]
    UnknownDrawing(DrawingId),
    #[error("Drawing {0} is busy")]
    DrawingBusy(DrawingId),
    #[error("Drawing registry has been dropped")]
    RegistryDropped,
    #[error("Failed to sync {parameter} onto drawing {drawing}: {source}")]
    Apply {
        drawing: DrawingId,
        parameter: &'static str,
        source: DrawingError,
    },
}

/// What happened for one slave class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaveOutcome {
    /// The change was applied, producing this many parameter changes.
    Applied(usize),
    NoSlaveDoodle,
    WillNotSync,
    /// The parameter is not listed for the class pair.
    NotMapped,
    /// The slave class does not declare the parameter.
    NotDeclared,
    /// The slave already holds the new value.
    AlreadyEqual,
    /// A side effect of a synced parameter; the slave recomputed it when that
    /// parameter was replayed.
    Recomputed,
    /// The slave drawing could not be reached or rejected the change.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlaveResult {
    pub drawing: DrawingId,
    pub class: DoodleClass,
    pub outcome: SlaveOutcome,
}

/// Result of propagating one change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub results: Vec<SlaveResult>,
    /// Slave drawings repainted, once each.
    pub repainted: Vec<DrawingId>,
}

impl SyncReport {
    pub fn outcome(&self, drawing: &DrawingId, class: DoodleClass) -> Option<SlaveOutcome> {
        self.results
            .iter()
            .find(|r| &r.drawing == drawing && r.class == class)
            .map(|r| r.outcome)
    }

    /// Total parameter changes applied to slaves.
    pub fn applied(&self) -> usize {
        self.results
            .iter()
            .map(|r| match r.outcome {
                SlaveOutcome::Applied(n) => n,
                _ => 0,
            })
            .sum()
    }
}

type ErrorReporter = Box<dyn Fn(&SyncError)>;

/// Replays master parameter changes on slave drawings.
pub struct SyncCoordinator {
    registry: Weak<DrawingRegistry>,
    config: SyncConfig,
    reporter: ErrorReporter,
}

impl SyncCoordinator {
    /// Create a coordinator that logs sync errors.
    pub fn new(registry: &Rc<DrawingRegistry>, config: SyncConfig) -> Self {
        Self {
            registry: Rc::downgrade(registry),
            config,
            reporter: Box::new(|e: &SyncError| log::error!("Sync error: {e}")),
        }
    }

    /// Replace the error callback.
    pub fn with_error_reporter(mut self, reporter: impl Fn(&SyncError) + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Subscribe to `ParameterChanged` on every master drawing in the registry.
    ///
    /// Masters that are not registered are reported and skipped.
    pub fn attach(self: &Rc<Self>) -> Vec<(DrawingId, SubscriptionId)> {
        let Some(registry) = self.registry.upgrade() else {
            (self.reporter)(&SyncError::RegistryDropped);
            return Vec::new();
        };
        let mut subscriptions = Vec::new();
        for master in self.config.masters() {
            let Some(drawing) = registry.get(master) else {
                (self.reporter)(&SyncError::UnknownDrawing(master.clone()));
                continue;
            };
            let Ok(mut drawing) = drawing.try_borrow_mut() else {
                (self.reporter)(&SyncError::DrawingBusy(master.clone()));
                continue;
            };
            subscriptions.push((master.clone(), self.attach_to(&mut drawing)));
        }
        subscriptions
    }

    /// Subscribe to `ParameterChanged` on one drawing.
    pub fn attach_to(self: &Rc<Self>, drawing: &mut Drawing) -> SubscriptionId {
        let listener: Rc<dyn Listener> = self.clone();
        drawing.subscribe(&[NotificationKind::ParameterChanged], listener)
    }

    /// Replay one master change on every mapped slave.
    pub fn propagate(&self, change: &ParameterChange) -> SyncReport {
        let mut report = SyncReport::default();
        if change.source == ChangeSource::Sync {
            return report;
        }
        let Some(mapping) = self.config.mapping_for(&change.drawing) else {
            return report;
        };
        let Some(registry) = self.registry.upgrade() else {
            (self.reporter)(&SyncError::RegistryDropped);
            return report;
        };

        for (slave_id, classes) in mapping.slaves_for(change.class) {
            let unresolved = |report: &mut SyncReport| {
                for class in classes.keys() {
                    report.results.push(SlaveResult {
                        drawing: slave_id.clone(),
                        class: *class,
                        outcome: SlaveOutcome::Unresolved,
                    });
                }
            };
            let Some(slave) = registry.get(slave_id) else {
                (self.reporter)(&SyncError::UnknownDrawing(slave_id.clone()));
                unresolved(&mut report);
                continue;
            };
            let Ok(mut slave) = slave.try_borrow_mut() else {
                (self.reporter)(&SyncError::DrawingBusy(slave_id.clone()));
                unresolved(&mut report);
                continue;
            };

            let mut applied = 0;
            for (slave_class, parameters) in classes {
                let outcome = self.apply_to_slave(&mut slave, *slave_class, parameters, change);
                if let SlaveOutcome::Applied(n) = outcome {
                    applied += n;
                }
                log::debug!(
                    "Sync {}.{} from {} onto {}/{}: {:?}",
                    change.class,
                    change.parameter,
                    change.drawing,
                    slave_id,
                    slave_class,
                    outcome
                );
                report.results.push(SlaveResult {
                    drawing: slave_id.clone(),
                    class: *slave_class,
                    outcome,
                });
            }
            if applied > 0 {
                slave.repaint();
                report.repainted.push(slave_id.clone());
            }
        }
        report
    }

    fn apply_to_slave(
        &self,
        slave: &mut Drawing,
        class: DoodleClass,
        parameters: &SyncParameters,
        change: &ParameterChange,
    ) -> SlaveOutcome {
        let Some(doodle) = slave.first_doodle_of_class(class) else {
            return SlaveOutcome::NoSlaveDoodle;
        };
        if !doodle.will_sync() {
            return SlaveOutcome::WillNotSync;
        }
        if !parameters.contains(change.parameter) {
            return SlaveOutcome::NotMapped;
        }
        if !class.declares(change.parameter) {
            return SlaveOutcome::NotDeclared;
        }
        if let Some(cause) = change.derived_from {
            if parameters.contains(cause) && class.declares(cause) {
                return SlaveOutcome::Recomputed;
            }
        }
        let id = doodle.id();
        let Some(current) = slave.settled_value(id, change.parameter) else {
            return SlaveOutcome::NotDeclared;
        };
        if current.approx_eq(&change.value) {
            return SlaveOutcome::AlreadyEqual;
        }

        let incremental = match (current.as_f64(), change.value.as_f64(), change.old_value.as_f64()) {
            (Some(slave_value), Some(new), Some(old)) => Some(ParamValue::Float(slave_value + (new - old))),
            _ => None,
        };
        let (value, animate) = match incremental {
            Some(value) => (value, false),
            None => (change.value.clone(), true),
        };

        match slave.apply_change(id, change.parameter, value, ChangeSource::Sync, animate) {
            Ok(changes) if changes.is_empty() => SlaveOutcome::AlreadyEqual,
            Ok(changes) => SlaveOutcome::Applied(changes.len()),
            Err(source) => {
                (self.reporter)(&SyncError::Apply {
                    drawing: slave.id().clone(),
                    parameter: change.parameter,
                    source,
                });
                SlaveOutcome::Unresolved
            }
        }
    }
}

impl Listener for SyncCoordinator {
    fn notify(&self, notification: &Notification) -> Result<(), ListenerError> {
        if let Notification::ParameterChanged(change) = notification {
            self.propagate(change);
        }
        Ok(())
    }
}

impl fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
