//! Network side of wfsedit: WFS transport, the sync engine and its worker.

/// Command/event worker that owns an engine on a background thread.
pub mod backend;
/// Orchestration of builder, transport, interpreter and refetch.
pub mod engine;
/// WFS GetFeature / GetCapabilities / Transaction requests.
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use engine::{Engine, WriteOutcome};
pub use transport::{HttpTransport, WfsTransport};
