//! Single-feature edit session state machine.
//!
//! `Idle -> Drawing -> Saving -> Idle` creates a feature,
//! `Idle -> Editing -> Saving -> Idle` updates one. A failed save returns to
//! the phase it started from so the drawn geometry survives.

use crate::constants::{SEED_ATTRIBUTE, SEED_ATTRIBUTE_VALUE};
use crate::error::{Result, WfsError};
use crate::models::{Feature, Geometry, Properties};
use crate::surface::DrawSurface;
use serde_json::Value;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPhase {
    Idle,
    Drawing,
    Editing,
    Saving,
}

impl fmt::Display for EditPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Drawing => "drawing",
            Self::Editing => "editing",
            Self::Saving => "saving",
        };
        f.write_str(label)
    }
}

/// The write a save will perform.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveRequest {
    Insert {
        geometry: Geometry,
        properties: Properties,
    },
    Update {
        feature_id: Option<String>,
        geometry: Geometry,
        properties: Properties,
    },
}

impl SaveRequest {
    pub fn geometry(&self) -> &Geometry {
        match self {
            Self::Insert { geometry, .. } | Self::Update { geometry, .. } => geometry,
        }
    }
}

/// Owns the draw surface and the feature under edit.
#[derive(Debug)]
pub struct EditSession<S: DrawSurface> {
    phase: EditPhase,
    /// Phase to return to when a save fails.
    resume_phase: EditPhase,
    feature: Option<Feature>,
    attributes: Properties,
    surface: S,
    attached: bool,
}

impl<S: DrawSurface> EditSession<S> {
    pub fn new(surface: S) -> Self {
        Self {
            phase: EditPhase::Idle,
            resume_phase: EditPhase::Idle,
            feature: None,
            attributes: Properties::new(),
            surface,
            attached: false,
        }
    }

    pub fn phase(&self) -> EditPhase {
        self.phase
    }

    /// The existing feature being edited, `None` while idle or drawing.
    pub fn feature(&self) -> Option<&Feature> {
        self.feature.as_ref()
    }

    /// Working attributes that a save will write.
    pub fn attributes(&self) -> &Properties {
        &self.attributes
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable surface access for the collaborator that draws on it.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn has_working_layer(&self) -> bool {
        self.attached
    }

    fn transition_error(&self, action: &str) -> WfsError {
        WfsError::InvalidTransition {
            from: self.phase.to_string(),
            action: action.to_string(),
        }
    }

    fn enter(&mut self, phase: EditPhase) {
        debug!(from = %self.phase, to = %phase, "edit session transition");
        self.phase = phase;
    }

    /// Start editing an existing feature.
    ///
    /// # Errors
    /// - [`WfsError::InvalidTransition`] unless idle.
    /// - [`WfsError::UnsupportedGeometry`] when the geometry kind cannot be saved.
    pub fn begin_edit(&mut self, feature: Feature) -> Result<()> {
        if self.phase != EditPhase::Idle {
            return Err(self.transition_error("begin edit"));
        }
        if let Geometry::Unsupported { kind, .. } = &feature.geometry {
            return Err(WfsError::UnsupportedGeometry { kind: kind.clone() });
        }
        self.surface.attach(Some(&feature.geometry));
        self.attached = true;
        self.attributes = feature.properties.clone();
        info!(feature_id = ?feature.id, "editing feature");
        self.feature = Some(feature);
        self.enter(EditPhase::Editing);
        Ok(())
    }

    /// Start drawing a new feature on an empty surface.
    ///
    /// # Errors
    /// Returns [`WfsError::InvalidTransition`] unless idle.
    pub fn begin_draw(&mut self) -> Result<()> {
        if self.phase != EditPhase::Idle {
            return Err(self.transition_error("begin drawing"));
        }
        self.surface.attach(None);
        self.attached = true;
        self.feature = None;
        self.attributes = Properties::new();
        self.attributes.insert(
            SEED_ATTRIBUTE.to_string(),
            Value::String(SEED_ATTRIBUTE_VALUE.to_string()),
        );
        self.enter(EditPhase::Drawing);
        Ok(())
    }

    /// Change one working attribute.
    ///
    /// # Errors
    /// Returns [`WfsError::InvalidTransition`] unless drawing or editing.
    pub fn set_attribute(&mut self, key: &str, value: Value) -> Result<()> {
        if !matches!(self.phase, EditPhase::Drawing | EditPhase::Editing) {
            return Err(self.transition_error("set attribute"));
        }
        self.attributes.insert(key.to_string(), value);
        Ok(())
    }

    /// Read back the surface geometry and describe the pending write.
    ///
    /// Does not change phase; the caller builds the transaction and then calls
    /// [`Self::mark_saving`].
    ///
    /// # Errors
    /// - [`WfsError::InvalidTransition`] unless drawing or editing.
    /// - [`WfsError::InvalidGeometry`] when the surface holds nothing.
    /// - Any [`Geometry::validate`] failure.
    pub fn save_request(&self) -> Result<SaveRequest> {
        if !matches!(self.phase, EditPhase::Drawing | EditPhase::Editing) {
            return Err(self.transition_error("save"));
        }
        let geometry = self
            .surface
            .current_geometry()
            .ok_or_else(|| WfsError::InvalidGeometry("nothing drawn".to_string()))?;
        if geometry.is_empty() && !matches!(geometry, Geometry::Unsupported { .. }) {
            return Err(WfsError::InvalidGeometry(
                "geometry has no coordinates".to_string(),
            ));
        }
        geometry.validate()?;

        let properties = self.attributes.clone();
        Ok(match &self.feature {
            Some(feature) => SaveRequest::Update {
                feature_id: feature.id.clone(),
                geometry,
                properties,
            },
            None => SaveRequest::Insert {
                geometry,
                properties,
            },
        })
    }

    /// Enter `Saving` once the transaction body has been built.
    ///
    /// # Errors
    /// Returns [`WfsError::InvalidTransition`] unless drawing or editing.
    pub fn mark_saving(&mut self) -> Result<()> {
        if !matches!(self.phase, EditPhase::Drawing | EditPhase::Editing) {
            return Err(self.transition_error("save"));
        }
        self.resume_phase = self.phase;
        self.enter(EditPhase::Saving);
        Ok(())
    }

    /// The save round-trip failed; return to the phase it started from.
    ///
    /// Returns `false` when the session was reset while the save was in flight.
    pub fn save_failed(&mut self) -> bool {
        if self.phase != EditPhase::Saving {
            return false;
        }
        let resume = self.resume_phase;
        self.enter(resume);
        true
    }

    /// The save round-trip succeeded; detach and go idle.
    ///
    /// Returns `false` when the session was reset while the save was in flight.
    pub fn save_succeeded(&mut self) -> bool {
        if self.phase != EditPhase::Saving {
            return false;
        }
        self.clear();
        true
    }

    /// Abandon the session without transacting.
    ///
    /// Cancelling an idle session is a no-op.
    pub fn cancel(&mut self) {
        if self.phase != EditPhase::Idle {
            info!(phase = %self.phase, "edit cancelled");
        }
        self.clear();
    }

    /// Force the session back to idle, e.g. on a collection switch.
    ///
    /// Returns `true` when an in-progress session was discarded.
    pub fn reset(&mut self) -> bool {
        let discarded = self.phase != EditPhase::Idle;
        if discarded {
            info!(phase = %self.phase, "edit session discarded");
        }
        self.clear();
        discarded
    }

    fn clear(&mut self) {
        if self.attached {
            self.surface.detach();
            self.attached = false;
        }
        self.feature = None;
        self.attributes = Properties::new();
        self.resume_phase = EditPhase::Idle;
        if self.phase != EditPhase::Idle {
            self.enter(EditPhase::Idle);
        }
    }
}
