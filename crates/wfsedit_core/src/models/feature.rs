//! Feature records and the fetched collection snapshot.

use super::geometry::{Bounds, Geometry};
use crate::error::{Result, WfsError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered attribute mapping; values are strings, numbers or null.
pub type Properties = Map<String, Value>;

/// One geographic record: geometry, attributes and server identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    /// `None` until the server assigns an id on insert.
    pub id: Option<String>,
    pub geometry: Geometry,
    pub properties: Properties,
}

#[derive(Debug, Deserialize)]
struct WireFeature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    geometry: Option<Value>,
    #[serde(default)]
    properties: Option<Properties>,
}

#[derive(Debug, Deserialize)]
struct WireCollection {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    features: Vec<WireFeature>,
}

impl Feature {
    /// Create an unsaved feature with no server id.
    pub fn new(geometry: Geometry, properties: Properties) -> Self {
        Self {
            id: None,
            geometry,
            properties,
        }
    }

    fn from_wire(wire: WireFeature) -> Result<Self> {
        let properties = wire.properties.unwrap_or_default();
        // GeoServer may omit the top-level id and carry it as an attribute instead.
        let id = wire
            .id
            .as_ref()
            .and_then(id_text)
            .or_else(|| properties.get("id").and_then(id_text));
        let geometry = match wire.geometry {
            Some(value) => Geometry::from_geojson(&value)?,
            None => Geometry::from_geojson(&Value::Null)?,
        };
        Ok(Self {
            id,
            geometry,
            properties,
        })
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Render an attribute value as transaction text.
///
/// # Returns
/// `None` for null, the raw text for strings and the JSON rendering otherwise.
pub fn property_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        other => Some(other.to_string()),
    }
}

/// Parse a GeoJSON `FeatureCollection` body into features.
///
/// # Errors
/// Returns [`WfsError::Fetch`] when the body is not a feature collection or a
/// feature geometry is malformed.
pub fn parse_feature_collection(body: &str) -> Result<Vec<Feature>> {
    let wire: WireCollection = serde_json::from_str(body)
        .map_err(|err| WfsError::Fetch(format!("invalid feature collection: {}", err)))?;
    if let Some(kind) = wire.kind.as_deref() {
        if kind != "FeatureCollection" {
            return Err(WfsError::Fetch(format!(
                "expected FeatureCollection, got {}",
                kind
            )));
        }
    }
    wire.features
        .into_iter()
        .map(|feature| {
            Feature::from_wire(feature)
                .map_err(|err| WfsError::Fetch(format!("invalid feature: {}", err)))
        })
        .collect()
}

/// The most recently applied feature list for the active collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureCollectionSnapshot {
    /// Qualified name of the collection this snapshot was fetched for.
    pub collection: Option<String>,
    pub features: Vec<Feature>,
    /// Bumped every time a fetch result is applied.
    pub revision: u64,
}

/// One page of a snapshot, 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturePage<'a> {
    pub page: usize,
    pub total_pages: usize,
    pub features: &'a [Feature],
}

impl FeaturePage<'_> {
    /// Bounding box of every feature on this page.
    pub fn bounds(&self) -> Option<Bounds> {
        self.features
            .iter()
            .filter_map(|feature| feature.geometry.bounds())
            .reduce(Bounds::union)
    }
}

impl FeatureCollectionSnapshot {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Look up a feature by server id.
    pub fn find(&self, id: &str) -> Option<&Feature> {
        self.features
            .iter()
            .find(|feature| feature.id.as_deref() == Some(id))
    }

    /// Attribute keys of the collection, taken from the first feature.
    ///
    /// The schema is not known before the first fetch, so an empty snapshot
    /// yields an empty schema.
    pub fn schema(&self) -> Vec<&str> {
        self.features
            .first()
            .map(|feature| feature.properties.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Slice out a 1-based page, clamping to the valid range.
    ///
    /// # Arguments
    /// - `page`: Requested page; `0` is treated as `1`.
    /// - `page_size`: Features per page; `0` is treated as `1`.
    pub fn page(&self, page: usize, page_size: usize) -> FeaturePage<'_> {
        let page_size = page_size.max(1);
        let total_pages = self.features.len().div_ceil(page_size).max(1);
        let page = page.clamp(1, total_pages);
        let start = ((page - 1) * page_size).min(self.features.len());
        let end = (start + page_size).min(self.features.len());
        FeaturePage {
            page,
            total_pages,
            features: &self.features[start..end],
        }
    }
}
