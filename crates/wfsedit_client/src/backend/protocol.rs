//! Protocol types for the engine worker.

use serde_json::Value;
use wfsedit_core::session::EditPhase;
use wfsedit_core::{CollectionRef, Feature, FeatureCollectionSnapshot, Geometry, TransactionOutcome};

/// Commands issued by the front end for the worker to execute.
#[derive(Debug)]
pub enum CoreCmd {
    /// Discover the server's feature types.
    ListCollections,
    /// Make a collection active, fetching it when needed.
    ActivateCollection { collection: CollectionRef },
    /// Refetch the active collection.
    Refresh,
    /// Highlight a feature of the current snapshot.
    SelectFeature { id: String },
    /// Start editing a snapshot feature by id.
    BeginEdit { id: String },
    /// Start drawing a new feature.
    BeginDraw,
    /// Replace the geometry on the draw surface.
    SetGeometry { geometry: Geometry },
    SetAttribute { key: String, value: Value },
    /// Insert or update the feature under edit.
    SaveEdit,
    CancelEdit,
    /// Delete a snapshot feature by id.
    ///
    /// `confirmed` carries the user's answer to the confirmation prompt.
    Delete { id: String, confirmed: bool },
}

/// Which command family produced an error, so the front end can route it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorSource {
    Fetch,
    Edit,
    Save,
    Delete,
    Other,
}

/// Events produced by the worker and polled by the front end.
#[derive(Debug)]
pub enum CoreEvent {
    CollectionsLoaded { items: Vec<CollectionRef> },
    /// The snapshot was replaced by a fetch result.
    SnapshotChanged { snapshot: FeatureCollectionSnapshot },
    FeatureSelected { feature: Feature },
    /// The edit session moved to a new phase.
    SessionChanged {
        phase: EditPhase,
        feature_id: Option<String>,
    },
    /// A save reached the server. `refreshed` is false when the follow-up
    /// fetch failed.
    Saved {
        outcome: TransactionOutcome,
        refreshed: bool,
    },
    Deleted {
        id: String,
        outcome: TransactionOutcome,
        refreshed: bool,
    },
    Error {
        source: CoreErrorSource,
        message: String,
    },
}
