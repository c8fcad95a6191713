//! Per-drawing publish/subscribe.
//!
//! Each [`Drawing`](crate::Drawing) owns one [`NotificationBus`]. Listeners
//! subscribe to one or more [`NotificationKind`]s and receive typed
//! [`Notification`] payloads synchronously, in subscription order.

use crate::doodle::DoodleId;
use crate::doodles::DoodleClass;
use crate::drawing::DrawingId;
use crate::params::ParamValue;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Kinds of notification a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Ready,
    DoodlesLoaded,
    DoodleAdded,
    DoodleDeleted,
    DoodleSelected,
    ParameterChanged,
    Repaint,
}

/// What caused a parameter change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    /// Direct manipulation in the rendering layer.
    User,
    /// A bound form field was edited.
    Binding,
    /// Propagated from another drawing by the sync coordinator.
    Sync,
}

/// A single parameter change on one doodle.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterChange {
    pub drawing: DrawingId,
    pub doodle: DoodleId,
    pub class: DoodleClass,
    pub parameter: &'static str,
    pub value: ParamValue,
    pub old_value: ParamValue,
    pub source: ChangeSource,
    /// The edited parameter, when this change is a side effect of editing it
    /// and that edit is reported alongside.
    pub derived_from: Option<&'static str>,
}

/// Notification payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Ready {
        drawing: DrawingId,
    },
    DoodlesLoaded {
        drawing: DrawingId,
        count: usize,
    },
    DoodleAdded {
        drawing: DrawingId,
        doodle: DoodleId,
        class: DoodleClass,
    },
    DoodleDeleted {
        drawing: DrawingId,
        doodle: DoodleId,
        class: DoodleClass,
    },
    DoodleSelected {
        drawing: DrawingId,
        doodle: Option<DoodleId>,
    },
    ParameterChanged(ParameterChange),
    Repaint {
        drawing: DrawingId,
        generation: u64,
    },
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::Ready { .. } => NotificationKind::Ready,
            Notification::DoodlesLoaded { .. } => NotificationKind::DoodlesLoaded,
            Notification::DoodleAdded { .. } => NotificationKind::DoodleAdded,
            Notification::DoodleDeleted { .. } => NotificationKind::DoodleDeleted,
            Notification::DoodleSelected { .. } => NotificationKind::DoodleSelected,
            Notification::ParameterChanged(_) => NotificationKind::ParameterChanged,
            Notification::Repaint { .. } => NotificationKind::Repaint,
        }
    }

    /// Drawing that published the notification.
    pub fn drawing(&self) -> &DrawingId {
        match self {
            Notification::Ready { drawing }
            | Notification::DoodlesLoaded { drawing, .. }
            | Notification::DoodleAdded { drawing, .. }
            | Notification::DoodleDeleted { drawing, .. }
            | Notification::DoodleSelected { drawing, .. }
            | Notification::Repaint { drawing, .. } => drawing,
            Notification::ParameterChanged(change) => &change.drawing,
        }
    }
}

/// Failure reported by a listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Receiver of notifications.
///
/// Listeners get the payload only; the publishing drawing is busy while
/// notifications are delivered.
pub trait Listener {
    fn notify(&self, notification: &Notification) -> Result<(), ListenerError>;
}

impl<F> Listener for F
where
    F: Fn(&Notification) -> Result<(), ListenerError>,
{
    fn notify(&self, notification: &Notification) -> Result<(), ListenerError> {
        self(notification)
    }
}

/// Handle returned by [`NotificationBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    kinds: Vec<NotificationKind>,
    listener: Rc<dyn Listener>,
}

/// Synchronous notification dispatcher owned by one drawing.
#[derive(Default)]
pub struct NotificationBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for every kind in `kinds`.
    pub fn subscribe(&mut self, kinds: &[NotificationKind], listener: Rc<dyn Listener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            kinds: kinds.to_vec(),
            listener,
        });
        id
    }

    /// Remove a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    /// Deliver a notification to every listener subscribed to its kind.
    ///
    /// A failing listener is logged and skipped. Returns the number of failures.
    pub fn publish(&self, notification: &Notification) -> usize {
        let kind = notification.kind();
        let mut failures = 0;
        for subscription in self.subscriptions.iter().filter(|s| s.kinds.contains(&kind)) {
            if let Err(e) = subscription.listener.notify(notification) {
                failures += 1;
                log::warn!(
                    "Listener {:?} failed on {:?} from drawing {}: {}",
                    subscription.id,
                    kind,
                    notification.drawing(),
                    e
                );
            }
        }
        failures
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Check if anything listens for `kind`.
    pub fn has_listeners(&self, kind: NotificationKind) -> bool {
        self.subscriptions.iter().any(|s| s.kinds.contains(&kind))
    }
}

impl fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationBus")
            .field("listeners", &self.subscriptions.len())
            .finish()
    }
}
