//! The WFS-T synchronization engine.
//!
//! Every successful write is followed by exactly one refetch of the active
//! collection, whatever the response interpreter concluded. There is no local
//! patching of the snapshot.

use crate::transport::WfsTransport;
use crossbeam_channel::Receiver;
use serde_json::Value;
use tracing::{info, warn};
use wfsedit_core::response::interpret;
use wfsedit_core::session::SaveRequest;
use wfsedit_core::store::{Activation, FetchApplied, SnapshotChanged};
use wfsedit_core::{
    CollectionRef, Config, DrawSurface, EditSession, Feature, FeatureCollectionSnapshot,
    FeatureStore, Result, TransactionBuilder, TransactionOutcome, WfsError,
};

/// Result of a write that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    pub outcome: TransactionOutcome,
    /// The refetch that followed the write. A failure here does not undo the
    /// write; the previous snapshot stays in place.
    pub refresh: Result<FetchApplied>,
}

/// Owns the feature store, the edit session and the transport.
pub struct Engine<T: WfsTransport, S: DrawSurface> {
    transport: T,
    builder: TransactionBuilder,
    namespace_prefix: String,
    store: FeatureStore,
    session: EditSession<S>,
}

impl<T: WfsTransport, S: DrawSurface> Engine<T, S> {
    pub fn new(config: &Config, transport: T, surface: S) -> Self {
        Self {
            transport,
            builder: TransactionBuilder::from_config(config),
            namespace_prefix: config.namespace_prefix.clone(),
            store: FeatureStore::new(),
            session: EditSession::new(surface),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &FeatureStore {
        &self.store
    }

    pub fn session(&self) -> &EditSession<S> {
        &self.session
    }

    /// The draw surface, for the collaborator that edits geometry on it.
    pub fn surface_mut(&mut self) -> &mut S {
        self.session.surface_mut()
    }

    pub fn current_snapshot(&self) -> &FeatureCollectionSnapshot {
        self.store.snapshot()
    }

    /// Receive a notification each time the snapshot is replaced.
    pub fn subscribe(&mut self) -> Receiver<SnapshotChanged> {
        self.store.subscribe()
    }

    /// Discover the server's feature types.
    ///
    /// # Errors
    /// Returns [`WfsError::Fetch`] or [`WfsError::Xml`] from the transport.
    pub async fn list_collections(&self) -> Result<Vec<CollectionRef>> {
        self.transport
            .list_collections(&self.namespace_prefix)
            .await
    }

    /// Make `collection` active and fetch it if needed.
    ///
    /// Switching collections drops any in-progress edit and its working layer
    /// without issuing a transaction.
    ///
    /// # Errors
    /// Returns the fetch error; the engine stays on the new collection.
    pub async fn activate_collection(&mut self, collection: CollectionRef) -> Result<Activation> {
        let activation = self.store.activate(collection);
        match activation {
            Activation::Unchanged => return Ok(activation),
            Activation::Switched => {
                self.session.reset();
            }
            Activation::NeedsFetch => {}
        }
        self.refetch().await?;
        Ok(activation)
    }

    /// Clear the active collection, its snapshot and any edit.
    pub fn deactivate(&mut self) {
        self.session.reset();
        self.store.deactivate();
    }

    /// Fetch the active collection and apply the result.
    ///
    /// # Errors
    /// - [`WfsError::NoActiveCollection`] when nothing is active.
    /// - [`WfsError::Fetch`] when the request or parse fails; the snapshot is kept.
    pub async fn refetch(&mut self) -> Result<FetchApplied> {
        let ticket = self.store.issue_fetch()?;
        let result = self.transport.get_features(&ticket.collection).await;
        self.store.apply(&ticket, result)
    }

    /// Highlight a feature of the current snapshot.
    ///
    /// # Errors
    /// Returns [`WfsError::FeatureNotFound`] for unknown ids.
    pub fn select_feature(&mut self, id: &str) -> Result<&Feature> {
        self.store.select(id)
    }

    fn require_editable(&self) -> Result<&CollectionRef> {
        let collection = self.store.require_active()?;
        if !collection.editable {
            return Err(WfsError::ReadOnlyCollection(
                collection.namespace_qualified_name.clone(),
            ));
        }
        Ok(collection)
    }

    /// Start editing `feature` on the draw surface.
    ///
    /// # Errors
    /// Collection, transition and geometry-kind preconditions.
    pub fn begin_edit(&mut self, feature: Feature) -> Result<()> {
        self.require_editable()?;
        self.session.begin_edit(feature)
    }

    /// Start editing the snapshot feature with id `id`.
    ///
    /// # Errors
    /// As [`Self::begin_edit`], plus [`WfsError::FeatureNotFound`].
    pub fn begin_edit_by_id(&mut self, id: &str) -> Result<()> {
        let feature = self
            .store
            .snapshot()
            .find(id)
            .cloned()
            .ok_or_else(|| WfsError::FeatureNotFound(id.to_string()))?;
        self.begin_edit(feature)
    }

    /// Start drawing a new feature.
    ///
    /// # Errors
    /// Collection and transition preconditions.
    pub fn begin_draw(&mut self) -> Result<()> {
        self.require_editable()?;
        self.session.begin_draw()
    }

    /// Edit one attribute of the feature under edit.
    ///
    /// Keys must belong to the collection schema once one is known.
    ///
    /// # Errors
    /// [`WfsError::InvalidAttribute`] for unknown keys, or a transition error.
    pub fn set_attribute(&mut self, key: &str, value: Value) -> Result<()> {
        let schema = self.store.snapshot().schema();
        if !schema.is_empty() && !schema.contains(&key) && !self.session.attributes().contains_key(key)
        {
            return Err(WfsError::InvalidAttribute(format!(
                "'{}' is not an attribute of this collection",
                key
            )));
        }
        self.session.set_attribute(key, value)
    }

    /// Abandon the current edit without transacting.
    pub fn cancel_edit(&mut self) {
        self.session.cancel();
    }

    async fn transact(&self, body: String) -> Result<TransactionOutcome> {
        let raw = self.transport.send_transaction(body).await?;
        let outcome = interpret(&raw);
        match &outcome {
            TransactionOutcome::InsertOk { feature_id } => {
                info!(feature_id = %feature_id, "insert succeeded")
            }
            TransactionOutcome::UpdateOk => info!("update succeeded"),
            TransactionOutcome::DeleteOk => info!("delete succeeded"),
            TransactionOutcome::Unrecognized { raw_text } => {
                warn!(response = %raw_text, "transaction response unrecognized")
            }
        }
        Ok(outcome)
    }

    /// Persist the session: Insert when drawing, Update when editing.
    ///
    /// Precondition failures (nothing drawn, unsupported geometry, missing id)
    /// leave the session where it was and send nothing. Transport failures
    /// return the session to drawing/editing. On success the surface is
    /// detached, the session goes idle and the collection is refetched once.
    ///
    /// # Errors
    /// Any precondition or transport error.
    pub async fn save_edit(&mut self) -> Result<WriteOutcome> {
        let type_name = self.require_editable()?.namespace_qualified_name.clone();
        let request = self.session.save_request()?;
        let body = match &request {
            SaveRequest::Insert {
                geometry,
                properties,
            } => self.builder.build_insert(&type_name, geometry, properties)?,
            SaveRequest::Update {
                feature_id,
                geometry,
                properties,
            } => self.builder.build_update(
                &type_name,
                feature_id.as_deref(),
                geometry,
                properties,
            )?,
        };

        self.session.mark_saving()?;
        let outcome = match self.transact(body).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("save failed: {}", err);
                self.session.save_failed();
                return Err(err);
            }
        };
        self.session.save_succeeded();
        let refresh = self.refetch().await;
        Ok(WriteOutcome { outcome, refresh })
    }

    /// Delete `feature` once `confirm` approves it.
    ///
    /// `confirm` is only asked once the request can be built, so a feature
    /// without an id is rejected without prompting.
    ///
    /// Independent of the edit session, except that an edit of the same
    /// feature is discarded after the delete succeeds.
    ///
    /// # Errors
    /// - [`WfsError::DeleteNotConfirmed`] when `confirm` returns `false`.
    /// - Collection, missing-id and transport errors.
    pub async fn confirm_delete<F>(&mut self, feature: &Feature, confirm: F) -> Result<WriteOutcome>
    where
        F: FnOnce(&Feature) -> bool,
    {
        let type_name = self.require_editable()?.namespace_qualified_name.clone();
        let body = self
            .builder
            .build_delete(&type_name, feature.id.as_deref())?;
        if !confirm(feature) {
            info!(feature_id = ?feature.id, "delete declined");
            return Err(WfsError::DeleteNotConfirmed);
        }
        let outcome = self.transact(body).await?;

        let editing_deleted = self
            .session
            .feature()
            .is_some_and(|edited| edited.id.is_some() && edited.id == feature.id);
        if editing_deleted {
            self.session.reset();
        }
        let refresh = self.refetch().await;
        Ok(WriteOutcome { outcome, refresh })
    }
}
