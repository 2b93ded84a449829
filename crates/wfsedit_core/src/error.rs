//! Error taxonomy for the WFS-T engine.
use thiserror::Error;

/// Why a transport-level call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// The server answered with a non-2xx status.
    Status(u16),
    /// No response arrived (DNS, refused connection, reset, timeout).
    Connection(String),
}

impl std::fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(status) => write!(f, "HTTP status {}", status),
            Self::Connection(cause) => write!(f, "connection failed: {}", cause),
        }
    }
}

/// Top-level engine error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WfsError {
    #[error("Unsupported geometry: {kind}")]
    UnsupportedGeometry { kind: String },

    #[error("Feature has no server-assigned id")]
    MissingFeatureId,

    #[error("Transport error: {0}")]
    Transport(TransportFailure),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Feature '{0}' not found")]
    FeatureNotFound(String),

    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    #[error("'{0}' is not a valid feature type name")]
    InvalidTypeName(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No active collection")]
    NoActiveCollection,

    #[error("Collection '{0}' is not editable")]
    ReadOnlyCollection(String),

    #[error("Cannot {action} while {from}")]
    InvalidTransition { from: String, action: String },

    #[error("Delete was not confirmed")]
    DeleteNotConfirmed,
}

impl WfsError {
    /// Whether the error was raised before any network call was attempted.
    pub fn is_precondition(&self) -> bool {
        !matches!(self, Self::Transport(_) | Self::Fetch(_))
    }
}

pub type Result<T> = std::result::Result<T, WfsError>;
