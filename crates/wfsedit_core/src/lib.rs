//! Core domain library for wfsedit (geometry, WFS-T documents, edit state).

/// Collection discovery from WFS capabilities documents.
pub mod capabilities;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants used across wfsedit crates.
pub mod constants;
/// Engine error taxonomy.
pub mod error;
/// GML encoding and decoding of geometries.
pub mod gml;
/// Data models for features, geometries and collections.
pub mod models;
/// WFS-T response classification.
pub mod response;
/// Edit session state machine.
pub mod session;
/// Feature collection snapshot ownership and refetch bookkeeping.
pub mod store;
/// Draw-surface capability used by the edit session.
pub mod surface;
/// WFS-T transaction document construction.
pub mod transaction;
/// Element tree used to build request documents.
pub mod xml;

pub use config::Config;
pub use constants::*;
pub use error::{Result, TransportFailure, WfsError};
pub use models::{CollectionRef, Feature, FeatureCollectionSnapshot, Geometry};
pub use response::TransactionOutcome;
pub use session::{EditPhase, EditSession};
pub use store::FeatureStore;
pub use surface::{DrawSurface, SketchSurface};
pub use transaction::TransactionBuilder;
