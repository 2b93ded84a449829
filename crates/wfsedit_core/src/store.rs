//! Owner of the active collection and its feature snapshot.
//!
//! Snapshots are only ever replaced wholesale by a fetch result. Each fetch is
//! tagged at issue time; a result is applied only if its collection is still
//! active and no newer fetch has already been applied.

use crate::error::{Result, WfsError};
use crate::models::{CollectionRef, Feature, FeatureCollectionSnapshot};
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, info, warn};

/// Identifies one issued fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    /// Qualified collection name at issue time.
    pub collection: String,
    pub seq: u64,
}

/// What happened to a fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchApplied {
    Applied { revision: u64, features: usize },
    /// The collection is no longer active.
    DiscardedInactive,
    /// A newer fetch was already applied.
    DiscardedStale,
}

/// Notification sent to subscribers after a snapshot replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotChanged {
    pub collection: Option<String>,
    pub revision: u64,
    pub feature_count: usize,
}

/// Result of activating a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Same collection, already fetched: nothing to do.
    Unchanged,
    /// Same collection but never fetched successfully.
    NeedsFetch,
    /// A different collection became active; the old snapshot was dropped.
    Switched,
}

#[derive(Debug, Default)]
pub struct FeatureStore {
    active: Option<CollectionRef>,
    snapshot: FeatureCollectionSnapshot,
    next_seq: u64,
    applied_seq: Option<u64>,
    last_fetched: Option<String>,
    selected: Option<String>,
    subscribers: Vec<Sender<SnapshotChanged>>,
}

impl FeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&CollectionRef> {
        self.active.as_ref()
    }

    /// Active collection or [`WfsError::NoActiveCollection`].
    pub fn require_active(&self) -> Result<&CollectionRef> {
        self.active.as_ref().ok_or(WfsError::NoActiveCollection)
    }

    pub fn snapshot(&self) -> &FeatureCollectionSnapshot {
        &self.snapshot
    }

    /// Register for snapshot-changed notifications.
    ///
    /// Dropping the receiver unsubscribes on the next notification.
    pub fn subscribe(&mut self) -> Receiver<SnapshotChanged> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self) {
        let event = SnapshotChanged {
            collection: self.snapshot.collection.clone(),
            revision: self.snapshot.revision,
            feature_count: self.snapshot.len(),
        };
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn replace_snapshot(&mut self, collection: Option<String>, features: Vec<Feature>) {
        let revision = self.snapshot.revision.saturating_add(1);
        self.snapshot = FeatureCollectionSnapshot {
            collection,
            features,
            revision,
        };
        if let Some(id) = self.selected.as_deref() {
            if self.snapshot.find(id).is_none() {
                self.selected = None;
            }
        }
        self.notify();
    }

    /// Make `collection` the single active collection.
    ///
    /// Switching drops the previous snapshot and selection. Re-activating the
    /// collection that was last fetched is a no-op apart from refreshing its
    /// `editable` flag.
    pub fn activate(&mut self, collection: CollectionRef) -> Activation {
        let same = self
            .active
            .as_ref()
            .is_some_and(|active| active.namespace_qualified_name == collection.namespace_qualified_name);
        if same {
            let fetched = self.last_fetched.as_deref()
                == Some(collection.namespace_qualified_name.as_str());
            self.active = Some(collection);
            return if fetched {
                Activation::Unchanged
            } else {
                Activation::NeedsFetch
            };
        }

        info!(collection = %collection.namespace_qualified_name, "activating collection");
        let name = collection.namespace_qualified_name.clone();
        self.active = Some(collection);
        self.last_fetched = None;
        self.selected = None;
        self.replace_snapshot(Some(name), Vec::new());
        Activation::Switched
    }

    /// Clear the active collection and its snapshot.
    pub fn deactivate(&mut self) {
        if self.active.take().is_some() {
            self.last_fetched = None;
            self.selected = None;
            self.replace_snapshot(None, Vec::new());
        }
    }

    /// Tag a fetch of the active collection.
    ///
    /// # Errors
    /// Returns [`WfsError::NoActiveCollection`] when nothing is active.
    pub fn issue_fetch(&mut self) -> Result<FetchTicket> {
        let collection = self.require_active()?.namespace_qualified_name.clone();
        self.next_seq = self.next_seq.saturating_add(1);
        let ticket = FetchTicket {
            collection,
            seq: self.next_seq,
        };
        debug!(collection = %ticket.collection, seq = ticket.seq, "fetch issued");
        Ok(ticket)
    }

    /// Apply the outcome of a fetch issued with [`Self::issue_fetch`].
    ///
    /// A failed fetch leaves the snapshot untouched.
    ///
    /// # Errors
    /// Propagates the fetch error when the ticket is still current.
    pub fn apply(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<Feature>>,
    ) -> Result<FetchApplied> {
        let active = self
            .active
            .as_ref()
            .map(|active| active.namespace_qualified_name.as_str());
        if active != Some(ticket.collection.as_str()) {
            debug!(collection = %ticket.collection, seq = ticket.seq, "discarding fetch for inactive collection");
            return Ok(FetchApplied::DiscardedInactive);
        }
        if self.applied_seq.is_some_and(|applied| applied > ticket.seq) {
            debug!(collection = %ticket.collection, seq = ticket.seq, "discarding stale fetch");
            return Ok(FetchApplied::DiscardedStale);
        }

        let features = match result {
            Ok(features) => features,
            Err(err) => {
                warn!(collection = %ticket.collection, "fetch failed, keeping previous snapshot: {}", err);
                return Err(err);
            }
        };
        let count = features.len();
        self.applied_seq = Some(ticket.seq);
        self.last_fetched = Some(ticket.collection.clone());
        self.replace_snapshot(Some(ticket.collection.clone()), features);
        info!(
            collection = %ticket.collection,
            revision = self.snapshot.revision,
            features = count,
            "snapshot replaced"
        );
        Ok(FetchApplied::Applied {
            revision: self.snapshot.revision,
            features: count,
        })
    }

    /// Highlight a feature by id.
    ///
    /// # Errors
    /// Returns [`WfsError::FeatureNotFound`] when the snapshot has no such feature.
    pub fn select(&mut self, id: &str) -> Result<&Feature> {
        let feature = self
            .snapshot
            .find(id)
            .ok_or_else(|| WfsError::FeatureNotFound(id.to_string()))?;
        self.selected = Some(id.to_string());
        Ok(feature)
    }

    pub fn selected(&self) -> Option<&Feature> {
        self.selected
            .as_deref()
            .and_then(|id| self.snapshot.find(id))
    }
}
