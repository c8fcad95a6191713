//! EyeDraw command line harness.
//!
//! Builds the drawings described by a configuration file, loads saved
//! drawings, applies parameter edits as a user would, lets animations settle
//! and prints every drawing in the saved format.

mod edit;

use clap::Parser;
use edit::{Edit, Load};
use eyedraw_core::{ConfigError, Doodle, DrawingError, DrawingId, DrawingRegistry, EditorConfig};
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use thiserror::Error;

/// Upper bound on animation steps before giving up on settling.
const MAX_FRAMES: usize = 10_000;

#[derive(Parser, Debug)]
#[command(name = "eyedraw", version, about = "Edit and synchronize EyeDraw drawings")]
struct Cli {
    /// Page configuration JSON. Defaults to an unsynchronized right/left pair.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Load a saved drawing before editing (repeatable).
    #[arg(long = "load", value_name = "DRAWING=FILE")]
    loads: Vec<Load>,

    /// Apply a parameter edit, adding the doodle if the drawing has none (repeatable).
    #[arg(long = "set", value_name = "DRAWING:CLASS:PARAM=VALUE")]
    edits: Vec<Edit>,

    /// Animation time step in seconds.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    frame: f64,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Drawing {0}: {1}")]
    Drawing(DrawingId, DrawingError),
    #[error("Unknown drawing: {0}")]
    UnknownDrawing(DrawingId),
    #[error("Failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("Failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    let registry = Rc::new(DrawingRegistry::new());
    let _coordinator = config.build(&registry)?;

    for load in &cli.loads {
        let json = fs::read_to_string(&load.path).map_err(|source| AppError::Read {
            path: load.path.clone(),
            source,
        })?;
        let drawing = registry
            .get(&load.drawing)
            .ok_or_else(|| AppError::UnknownDrawing(load.drawing.clone()))?;
        let count = drawing
            .borrow_mut()
            .load(&json)
            .map_err(|e| AppError::Drawing(load.drawing.clone(), e))?;
        log::info!("Loaded {count} doodles into {}", load.drawing);
    }

    for edit in &cli.edits {
        apply_edit(&registry, edit)?;
    }

    settle(&registry, cli.frame);

    let mut output = serde_json::Map::new();
    for id in registry.ids() {
        let Some(drawing) = registry.get(&id) else {
            continue;
        };
        let saved = drawing
            .borrow()
            .save()
            .map_err(|e| AppError::Drawing(id.clone(), e))?;
        output.insert(id.to_string(), serde_json::from_str(&saved)?);
    }
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn apply_edit(registry: &DrawingRegistry, edit: &Edit) -> Result<(), AppError> {
    let drawing = registry
        .get(&edit.drawing)
        .ok_or_else(|| AppError::UnknownDrawing(edit.drawing.clone()))?;
    let mut drawing = drawing.borrow_mut();
    let existing = drawing.first_doodle_of_class(edit.class).map(Doodle::id);
    let id = match existing {
        Some(id) => id,
        None => drawing.add_doodle(edit.class),
    };
    let changes = drawing
        .set_parameter_from_string(id, &edit.parameter, &edit.value)
        .map_err(|e| AppError::Drawing(edit.drawing.clone(), e))?;
    log::debug!(
        "{}:{}:{} changed {} parameters",
        edit.drawing,
        edit.class,
        edit.parameter,
        changes.len()
    );
    Ok(())
}

/// Step every drawing until no animation is in flight.
fn settle(registry: &DrawingRegistry, dt: f64) {
    let dt = if dt > 0.0 { dt } else { 1.0 / 60.0 };
    for _ in 0..MAX_FRAMES {
        let mut moved = false;
        for id in registry.ids() {
            if let Some(drawing) = registry.get(&id) {
                moved |= drawing.borrow_mut().step_animations(dt);
            }
        }
        if !moved {
            return;
        }
    }
    log::warn!("Animations still running after {MAX_FRAMES} frames");
}
