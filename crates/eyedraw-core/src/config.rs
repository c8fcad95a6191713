//! Editor configuration.
//!
//! Describes the drawings on a page, their initial doodles and field
//! bindings, the sync table and animation settings. Loaded from JSON:
//!
//! ```json
//! {
//!   "drawings": [
//!     { "id": "right", "eye": "right", "doodles": ["OpticCup"],
//!       "bindings": { "cd_ratio": { "class": "OpticCup", "parameter": "cdRatio" } } },
//!     { "id": "left", "eye": "left", "doodles": ["OpticCup"] }
//!   ],
//!   "sync": { "right": { "left": { "OpticCup": { "OpticCup": { "parameters": ["cdRatio"] } } } } },
//!   "animation": { "duration_secs": 0.3, "ease": "in_out_quad" }
//! }
//! ```

use crate::animation::AnimationConfig;
use crate::doodles::DoodleClass;
use crate::drawing::{Drawing, DrawingError, DrawingId, Eye};
use crate::registry::DrawingRegistry;
use crate::sync::{SyncConfig, SyncCoordinator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Invalid configuration: {0}")]
    Json(String),
    #[error("Drawing {id}: {source}")]
    Drawing { id: DrawingId, source: DrawingError },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A form field bound to a doodle parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldBinding {
    pub class: DoodleClass,
    pub parameter: String,
}

/// One drawing on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingConfig {
    pub id: DrawingId,
    #[serde(default)]
    pub eye: Eye,
    /// Doodles added when the drawing is created, back to front.
    #[serde(default)]
    pub doodles: Vec<DoodleClass>,
    /// Field id → bound parameter.
    #[serde(default)]
    pub bindings: BTreeMap<String, FieldBinding>,
}

impl DrawingConfig {
    pub fn new(id: impl Into<DrawingId>, eye: Eye) -> Self {
        Self {
            id: id.into(),
            eye,
            doodles: Vec::new(),
            bindings: BTreeMap::new(),
        }
    }
}

/// Page configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub drawings: Vec<DrawingConfig>,
    pub sync: SyncConfig,
    pub animation: AnimationConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            drawings: vec![
                DrawingConfig::new("right", Eye::Right),
                DrawingConfig::new("left", Eye::Left),
            ],
            sync: SyncConfig::default(),
            animation: AnimationConfig::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))
    }

    /// Read a configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let json = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&json)
            .map_err(|e| ConfigError::Json(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Create and register every drawing, then attach a sync coordinator.
    ///
    /// Each drawing publishes `Ready` once everything is wired.
    pub fn build(&self, registry: &Rc<DrawingRegistry>) -> ConfigResult<Rc<SyncCoordinator>> {
        for config in &self.drawings {
            let drawing = self.build_drawing(config).map_err(|source| ConfigError::Drawing {
                id: config.id.clone(),
                source,
            })?;
            registry.register(drawing);
        }

        for master in self.sync.masters() {
            let known = self.drawings.iter().any(|d| &d.id == master);
            if !known {
                log::warn!("Sync table names unknown master drawing {master}");
            }
        }

        let coordinator = Rc::new(SyncCoordinator::new(registry, self.sync.clone()));
        coordinator.attach();

        for id in registry.ids() {
            if let Some(drawing) = registry.get(&id) {
                drawing.borrow().ready();
            }
        }
        log::info!(
            "Configured {} drawings, {} sync masters",
            self.drawings.len(),
            self.sync.masters().count()
        );
        Ok(coordinator)
    }

    fn build_drawing(&self, config: &DrawingConfig) -> Result<Drawing, DrawingError> {
        let mut drawing = Drawing::with_animation(config.id.clone(), config.eye, self.animation);
        for (field, binding) in &config.bindings {
            drawing.bind_field(binding.class, &binding.parameter, field.clone())?;
        }
        for class in &config.doodles {
            drawing.add_doodle(*class);
        }
        Ok(drawing)
    }
}
