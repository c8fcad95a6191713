//! Drawing registry.

use crate::drawing::{Drawing, DrawingId};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Every drawing on the page, by id.
///
/// Constructed once by the host and shared through `Rc`. Drawings are held
/// as `Rc<RefCell<_>>` so the sync coordinator can reach slave drawings
/// while a master drawing is publishing.
#[derive(Debug, Default)]
pub struct DrawingRegistry {
    drawings: RefCell<BTreeMap<DrawingId, Rc<RefCell<Drawing>>>>,
}

impl DrawingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a drawing under its own id, replacing any drawing with that id.
    pub fn register(&self, drawing: Drawing) -> Rc<RefCell<Drawing>> {
        let id = drawing.id().clone();
        let drawing = Rc::new(RefCell::new(drawing));
        if self
            .drawings
            .borrow_mut()
            .insert(id.clone(), drawing.clone())
            .is_some()
        {
            log::warn!("Drawing {id} registered twice; replacing the earlier one");
        }
        drawing
    }

    pub fn get(&self, id: &DrawingId) -> Option<Rc<RefCell<Drawing>>> {
        self.drawings.borrow().get(id).cloned()
    }

    pub fn remove(&self, id: &DrawingId) -> Option<Rc<RefCell<Drawing>>> {
        self.drawings.borrow_mut().remove(id)
    }

    /// Drop every registered drawing.
    pub fn reset(&self) {
        self.drawings.borrow_mut().clear();
    }

    pub fn ids(&self) -> Vec<DrawingId> {
        self.drawings.borrow().keys().cloned().collect()
    }

    pub fn contains(&self, id: &DrawingId) -> bool {
        self.drawings.borrow().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.drawings.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawings.borrow().is_empty()
    }
}
