//! Draw-surface capability consumed by the edit session.

use crate::models::Geometry;

/// The map collaborator's editable layer, reduced to what the engine needs.
///
/// Implementations own the in-progress geometry between `attach` and
/// `detach`; the engine only reads it back when saving.
pub trait DrawSurface {
    /// Show an editable layer, seeded with `initial` when editing an existing
    /// feature or empty when drawing a new one.
    fn attach(&mut self, initial: Option<&Geometry>);

    /// Geometry currently held by the surface, `None` when nothing is drawn.
    fn current_geometry(&self) -> Option<Geometry>;

    /// Remove the editable layer and discard its geometry.
    fn detach(&mut self);
}

/// Headless in-memory surface used by the CLI, the worker and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SketchSurface {
    geometry: Option<Geometry>,
    attached: bool,
    attach_count: usize,
    detach_count: usize,
}

impl SketchSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the drawn geometry, as a user dragging vertices would.
    ///
    /// Ignored while detached.
    pub fn set_geometry(&mut self, geometry: Geometry) -> bool {
        if !self.attached {
            return false;
        }
        self.geometry = Some(geometry);
        true
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn attach_count(&self) -> usize {
        self.attach_count
    }

    pub fn detach_count(&self) -> usize {
        self.detach_count
    }
}

impl DrawSurface for SketchSurface {
    fn attach(&mut self, initial: Option<&Geometry>) {
        self.geometry = initial.cloned();
        self.attached = true;
        self.attach_count += 1;
    }

    fn current_geometry(&self) -> Option<Geometry> {
        if self.attached {
            self.geometry.clone()
        } else {
            None
        }
    }

    fn detach(&mut self) {
        self.geometry = None;
        self.attached = false;
        self.detach_count += 1;
    }
}
