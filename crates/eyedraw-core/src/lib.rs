//! EyeDraw Core Library
//!
//! Parameter constraint resolution for clinical doodles, per-drawing
//! notifications and master/slave synchronization between drawings.
//! Rendering is left to the host.

pub mod animation;
pub mod bindings;
pub mod config;
pub mod doodle;
pub mod doodles;
pub mod drawing;
pub mod notification;
pub mod params;
pub mod persist;
pub mod registry;
pub mod resolver;
pub mod sync;

pub use animation::{AnimationConfig, Animator, Ease};
pub use config::{ConfigError, DrawingConfig, EditorConfig};
pub use doodle::{Doodle, DoodleId};
pub use doodles::{DoodleClass, DoodleModel, UnknownClass};
pub use drawing::{Drawing, DrawingError, DrawingId, DrawingResult, Eye};
pub use notification::{
    ChangeSource, Listener, ListenerError, Notification, NotificationBus, NotificationKind,
    ParameterChange, SubscriptionId,
};
pub use params::{ParamKind, ParamSpec, ParamType, ParamValue, Range};
pub use persist::{DoodleRecord, PersistError};
pub use registry::DrawingRegistry;
pub use resolver::{Resolution, resolve};
pub use sync::{SlaveOutcome, SyncConfig, SyncCoordinator, SyncError, SyncMapping, SyncReport};
