//! In-memory transport that records every request.

use crate::transport::WfsTransport;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use wfsedit_core::{CollectionRef, Feature, Result, WfsError};

pub(crate) const INSERT_OK: &str = r#"<wfs:WFS_TransactionResponse xmlns:wfs="http://www.opengis.net/wfs" xmlns:ogc="http://www.opengis.net/ogc"><wfs:InsertResult><ogc:FeatureId fid="places.7"/></wfs:InsertResult><wfs:TransactionResult><wfs:Status><wfs:SUCCESS/></wfs:Status></wfs:TransactionResult></wfs:WFS_TransactionResponse>"#;
pub(crate) const UPDATE_OK: &str = r#"<wfs:WFS_TransactionResponse xmlns:wfs="http://www.opengis.net/wfs"><wfs:UpdateResult/></wfs:WFS_TransactionResponse>"#;
pub(crate) const DELETE_OK: &str = r#"<wfs:WFS_TransactionResponse xmlns:wfs="http://www.opengis.net/wfs"><wfs:DeleteResult/></wfs:WFS_TransactionResponse>"#;

#[derive(Debug, Default)]
struct FakeState {
    features: HashMap<String, Vec<Feature>>,
    fetch_failures: HashMap<String, WfsError>,
    responses: VecDeque<Result<String>>,
    collections: Vec<CollectionRef>,
    transactions: Vec<String>,
    fetches: Vec<String>,
}

/// Cloned handles share state, so a test can keep one after moving the other
/// into an engine.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake transport lock")
    }

    pub(crate) fn set_features(&self, collection: &str, features: Vec<Feature>) {
        let mut state = self.state();
        state.fetch_failures.remove(collection);
        state.features.insert(collection.to_string(), features);
    }

    pub(crate) fn fail_fetch(&self, collection: &str, err: WfsError) {
        self.state()
            .fetch_failures
            .insert(collection.to_string(), err);
    }

    pub(crate) fn push_response(&self, response: Result<String>) {
        self.state().responses.push_back(response);
    }

    pub(crate) fn set_collections(&self, collections: Vec<CollectionRef>) {
        self.state().collections = collections;
    }

    pub(crate) fn transactions(&self) -> Vec<String> {
        self.state().transactions.clone()
    }

    pub(crate) fn fetch_count(&self, collection: &str) -> usize {
        self.state()
            .fetches
            .iter()
            .filter(|fetched| fetched.as_str() == collection)
            .count()
    }

    pub(crate) fn total_fetches(&self) -> usize {
        self.state().fetches.len()
    }
}

#[async_trait]
impl WfsTransport for FakeTransport {
    async fn send_transaction(&self, body: String) -> Result<String> {
        let mut state = self.state();
        state.transactions.push(body);
        state
            .responses
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }

    async fn get_features(&self, type_name: &str) -> Result<Vec<Feature>> {
        let mut state = self.state();
        state.fetches.push(type_name.to_string());
        if let Some(err) = state.fetch_failures.get(type_name) {
            return Err(err.clone());
        }
        Ok(state.features.get(type_name).cloned().unwrap_or_default())
    }

    async fn list_collections(&self, _default_prefix: &str) -> Result<Vec<CollectionRef>> {
        Ok(self.state().collections.clone())
    }
}
