//! Geometry model and its GeoJSON mapping.

use crate::error::{Result, WfsError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};

/// A single lon/lat position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned lon/lat bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    fn from_coord(coord: Coord) -> Self {
        Self {
            min_x: coord.x,
            min_y: coord.y,
            max_x: coord.x,
            max_y: coord.y,
        }
    }

    fn extend(&mut self, coord: Coord) {
        self.min_x = self.min_x.min(coord.x);
        self.min_y = self.min_y.min(coord.y);
        self.max_x = self.max_x.max(coord.x);
        self.max_y = self.max_y.max(coord.y);
    }

    /// Smallest box covering both `self` and `other`.
    pub fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// Geometry kinds the engine can edit, plus a passthrough for everything else.
///
/// Polygon rings are stored exterior first. `Unsupported` keeps the original
/// GeoJSON so features of other kinds still render and list.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coord),
    LineString(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    Polygon(Vec<Vec<Coord>>),
    Unsupported { kind: String, raw: Value },
}

impl Geometry {
    /// GeoJSON type name of this geometry.
    pub fn kind(&self) -> &str {
        match self {
            Self::Point(_) => "Point",
            Self::LineString(_) => "LineString",
            Self::MultiLineString(_) => "MultiLineString",
            Self::Polygon(_) => "Polygon",
            Self::Unsupported { kind, .. } => kind.as_str(),
        }
    }

    /// Whether the geometry carries no coordinates at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Point(_) => false,
            Self::LineString(coords) => coords.is_empty(),
            Self::MultiLineString(parts) | Self::Polygon(parts) => {
                parts.iter().all(|part| part.is_empty())
            }
            Self::Unsupported { .. } => true,
        }
    }

    /// Check the structural invariants required before encoding.
    ///
    /// # Errors
    /// - [`WfsError::UnsupportedGeometry`] for kinds outside the editable set.
    /// - [`WfsError::InvalidGeometry`] for empty sequences or non-finite values.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Err(WfsError::InvalidGeometry(reason.to_string()));
        match self {
            Self::Unsupported { kind, .. } => Err(WfsError::UnsupportedGeometry {
                kind: kind.clone(),
            }),
            Self::Point(coord) => {
                if coord.is_finite() {
                    Ok(())
                } else {
                    invalid("point has non-finite coordinates")
                }
            }
            Self::LineString(coords) => validate_sequence(coords, "line string"),
            Self::MultiLineString(parts) => {
                if parts.is_empty() {
                    return invalid("multi line string has no parts");
                }
                parts
                    .iter()
                    .try_for_each(|part| validate_sequence(part, "line string part"))
            }
            Self::Polygon(rings) => {
                if rings.is_empty() {
                    return invalid("polygon has no rings");
                }
                rings
                    .iter()
                    .try_for_each(|ring| validate_sequence(ring, "polygon ring"))
            }
        }
    }

    /// Bounding box over every coordinate, `None` when there are none.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut coords = self.coords();
        let first = coords.next()?;
        let mut bounds = Bounds::from_coord(first);
        for coord in coords {
            bounds.extend(coord);
        }
        Some(bounds)
    }

    fn coords(&self) -> Box<dyn Iterator<Item = Coord> + '_> {
        match self {
            Self::Point(coord) => Box::new(std::iter::once(*coord)),
            Self::LineString(coords) => Box::new(coords.iter().copied()),
            Self::MultiLineString(parts) | Self::Polygon(parts) => {
                Box::new(parts.iter().flatten().copied())
            }
            Self::Unsupported { .. } => Box::new(std::iter::empty()),
        }
    }

    /// Build a geometry from a GeoJSON geometry object.
    ///
    /// `null` and unknown types become [`Geometry::Unsupported`]; malformed
    /// coordinates for a known type are an error.
    ///
    /// # Errors
    /// Returns [`WfsError::InvalidGeometry`] when a known type has malformed
    /// coordinates.
    pub fn from_geojson(value: &Value) -> Result<Self> {
        let Some(kind) = value.get("type").and_then(Value::as_str) else {
            return Ok(Self::Unsupported {
                kind: "null".to_string(),
                raw: value.clone(),
            });
        };
        let coordinates = value.get("coordinates").unwrap_or(&Value::Null);
        match kind {
            "Point" => Ok(Self::Point(parse_position(coordinates)?)),
            "LineString" => Ok(Self::LineString(parse_positions(coordinates)?)),
            "MultiLineString" => Ok(Self::MultiLineString(parse_nested(coordinates)?)),
            "Polygon" => Ok(Self::Polygon(parse_nested(coordinates)?)),
            other => Ok(Self::Unsupported {
                kind: other.to_string(),
                raw: value.clone(),
            }),
        }
    }

    /// Render as a GeoJSON geometry object.
    pub fn to_geojson(&self) -> Value {
        let pos = |c: &Coord| json!([c.x, c.y]);
        let line = |coords: &[Coord]| Value::Array(coords.iter().map(pos).collect());
        match self {
            Self::Point(coord) => json!({ "type": "Point", "coordinates": pos(coord) }),
            Self::LineString(coords) => {
                json!({ "type": "LineString", "coordinates": line(coords.as_slice()) })
            }
            Self::MultiLineString(parts) => json!({
                "type": "MultiLineString",
                "coordinates": parts.iter().map(|p| line(p.as_slice())).collect::<Vec<_>>(),
            }),
            Self::Polygon(rings) => json!({
                "type": "Polygon",
                "coordinates": rings.iter().map(|r| line(r.as_slice())).collect::<Vec<_>>(),
            }),
            Self::Unsupported { raw, .. } => raw.clone(),
        }
    }
}

fn validate_sequence(coords: &[Coord], label: &str) -> Result<()> {
    if coords.is_empty() {
        return Err(WfsError::InvalidGeometry(format!("{} is empty", label)));
    }
    if coords.iter().any(|coord| !coord.is_finite()) {
        return Err(WfsError::InvalidGeometry(format!(
            "{} has non-finite coordinates",
            label
        )));
    }
    Ok(())
}

fn parse_position(value: &Value) -> Result<Coord> {
    let malformed = || WfsError::InvalidGeometry(format!("malformed position: {}", value));
    let items = value.as_array().ok_or_else(malformed)?;
    // Positions may carry altitude; only lon/lat are kept.
    match (
        items.first().and_then(Value::as_f64),
        items.get(1).and_then(Value::as_f64),
    ) {
        (Some(x), Some(y)) => Ok(Coord::new(x, y)),
        _ => Err(malformed()),
    }
}

fn parse_positions(value: &Value) -> Result<Vec<Coord>> {
    value
        .as_array()
        .ok_or_else(|| WfsError::InvalidGeometry(format!("expected position list: {}", value)))?
        .iter()
        .map(parse_position)
        .collect()
}

fn parse_nested(value: &Value) -> Result<Vec<Vec<Coord>>> {
    value
        .as_array()
        .ok_or_else(|| WfsError::InvalidGeometry(format!("expected nested lists: {}", value)))?
        .iter()
        .map(parse_positions)
        .collect()
}

impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_geojson().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Geometry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Geometry::from_geojson(&value).map_err(serde::de::Error::custom)
    }
}
