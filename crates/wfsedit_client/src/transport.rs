//! HTTP transport for WFS requests.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use wfsedit_core::capabilities::parse_feature_types;
use wfsedit_core::models::feature::parse_feature_collection;
use wfsedit_core::{CollectionRef, Config, Feature, Result, TransportFailure, WfsError, WFS_VERSION};

/// Everything the engine needs from a WFS server.
///
/// Implementations must not touch engine state; sequencing (such as the
/// refetch after a write) is the caller's job.
#[async_trait]
pub trait WfsTransport: Send + Sync {
    /// POST a transaction body and return the raw response text.
    ///
    /// Non-2xx statuses and connection failures are errors; the body of a
    /// failed response is not interpreted.
    async fn send_transaction(&self, body: String) -> Result<String>;

    /// GET the entire named collection as GeoJSON.
    async fn get_features(&self, type_name: &str) -> Result<Vec<Feature>>;

    /// List the feature types advertised by the server.
    async fn list_collections(&self, default_prefix: &str) -> Result<Vec<CollectionRef>>;
}

/// `reqwest`-backed transport against one WFS endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            http,
        }
    }

    /// Build a transport from configuration, applying the optional timeout.
    ///
    /// # Errors
    /// Returns [`WfsError::Config`] when the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| WfsError::Config(format!("http client: {}", err)))?;
        Ok(Self::new(config.endpoint.as_str(), http))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_text(&self, query: &[(&str, &str)]) -> Result<(String, Option<String>)> {
        let resp = self
            .http
            .get(&self.endpoint)
            .query(query)
            .send()
            .await
            .map_err(|err| WfsError::Fetch(err.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(WfsError::Fetch(format!("HTTP status {}", status.as_u16())));
        }
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = resp
            .text()
            .await
            .map_err(|err| WfsError::Fetch(err.to_string()))?;
        Ok((body, content_type))
    }
}

fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|value| value.to_ascii_lowercase().contains("json"))
}

#[async_trait]
impl WfsTransport for HttpTransport {
    async fn send_transaction(&self, body: String) -> Result<String> {
        debug!(endpoint = %self.endpoint, bytes = body.len(), "sending transaction");
        let resp = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|err| WfsError::Transport(TransportFailure::Connection(err.to_string())))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(WfsError::Transport(TransportFailure::Status(status.as_u16())));
        }
        resp.text()
            .await
            .map_err(|err| WfsError::Transport(TransportFailure::Connection(err.to_string())))
    }

    async fn get_features(&self, type_name: &str) -> Result<Vec<Feature>> {
        let (body, content_type) = self
            .get_text(&[
                ("service", "WFS"),
                ("version", WFS_VERSION),
                ("request", "GetFeature"),
                ("typeName", type_name),
                ("outputFormat", "application/json"),
            ])
            .await?;
        // GeoServer reports errors as XML exception reports with a 200 status.
        if !is_json_content_type(content_type.as_deref()) {
            return Err(WfsError::Fetch(format!(
                "unexpected content type {}",
                content_type.as_deref().unwrap_or("(none)")
            )));
        }
        parse_feature_collection(&body)
    }

    async fn list_collections(&self, default_prefix: &str) -> Result<Vec<CollectionRef>> {
        let (body, _) = self
            .get_text(&[
                ("service", "WFS"),
                ("version", WFS_VERSION),
                ("request", "GetCapabilities"),
            ])
            .await?;
        parse_feature_types(&body, default_prefix)
    }
}
