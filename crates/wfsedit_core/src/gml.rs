//! GML 2 geometry fragments for WFS-T request bodies.
//!
//! `encode` produces the `gml:*` element placed inside a transaction's geometry
//! property. `decode` reads such a fragment back; the engine itself consumes
//! GeoJSON from GetFeature and only needs `decode` for diagnostics.

use crate::constants::SRS_NAME;
use crate::error::{Result, WfsError};
use crate::models::{Coord, Geometry};
use crate::xml::XmlElement;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;

fn coordinates_text(coords: &[Coord]) -> String {
    coords
        .iter()
        .map(|coord| format!("{},{}", coord.x, coord.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn coordinates(coords: &[Coord]) -> XmlElement {
    XmlElement::new("gml:coordinates").text(coordinates_text(coords))
}

fn line_string(coords: &[Coord]) -> XmlElement {
    XmlElement::new("gml:LineString").child(coordinates(coords))
}

/// Build the GML element tree for `geometry`.
///
/// Polygon interior rings are not encoded; only the exterior boundary is
/// written.
///
/// # Errors
/// - [`WfsError::UnsupportedGeometry`] for kinds other than Point, LineString,
///   MultiLineString and Polygon.
/// - [`WfsError::InvalidGeometry`] for empty coordinate sequences.
pub fn encode_element(geometry: &Geometry) -> Result<XmlElement> {
    geometry.validate()?;
    let element = match geometry {
        Geometry::Point(coord) => XmlElement::new("gml:Point")
            .attr("srsName", SRS_NAME)
            .child(coordinates(std::slice::from_ref(coord))),
        Geometry::LineString(coords) => line_string(coords).attr("srsName", SRS_NAME),
        Geometry::Polygon(rings) => {
            if rings.len() > 1 {
                warn!(
                    holes = rings.len() - 1,
                    "polygon interior rings are not encoded"
                );
            }
            let exterior = XmlElement::new("gml:LinearRing").child(coordinates(&rings[0]));
            XmlElement::new("gml:Polygon")
                .attr("srsName", SRS_NAME)
                .child(XmlElement::new("gml:outerBoundaryIs").child(exterior))
        }
        Geometry::MultiLineString(parts) => XmlElement::new("gml:MultiLineString")
            .attr("srsName", SRS_NAME)
            .children(
                parts
                    .iter()
                    .map(|part| XmlElement::new("gml:lineStringMember").child(line_string(part))),
            ),
        Geometry::Unsupported { kind, .. } => {
            return Err(WfsError::UnsupportedGeometry { kind: kind.clone() })
        }
    };
    Ok(element)
}

/// Encode `geometry` as a GML fragment string.
///
/// # Errors
/// Same as [`encode_element`]; nothing is emitted on failure.
pub fn encode(geometry: &Geometry) -> Result<String> {
    encode_element(geometry)?.to_xml_string()
}

fn parse_tuple(tuple: &str) -> Result<Coord> {
    let mut parts = tuple.split(',');
    let x = parts.next().and_then(|v| v.trim().parse::<f64>().ok());
    let y = parts.next().and_then(|v| v.trim().parse::<f64>().ok());
    match (x, y) {
        (Some(x), Some(y)) => Ok(Coord::new(x, y)),
        _ => Err(WfsError::Xml(format!("malformed coordinate tuple '{}'", tuple))),
    }
}

fn parse_coordinates(text: &str) -> Result<Vec<Coord>> {
    text.split_whitespace().map(parse_tuple).collect()
}

fn parse_pos_list(text: &str) -> Result<Vec<Coord>> {
    let values = text
        .split_whitespace()
        .map(|v| {
            v.parse::<f64>()
                .map_err(|_| WfsError::Xml(format!("malformed ordinate '{}'", v)))
        })
        .collect::<Result<Vec<f64>>>()?;
    if values.len() % 2 != 0 {
        return Err(WfsError::Xml("odd number of ordinates in posList".to_string()));
    }
    Ok(values
        .chunks_exact(2)
        .map(|pair| Coord::new(pair[0], pair[1]))
        .collect())
}

/// Decode a GML geometry fragment.
///
/// Reads `gml:coordinates` (and GML 3 `gml:pos`/`gml:posList`) blocks in
/// document order; polygon rings and multi-line parts map one block each.
///
/// # Errors
/// - [`WfsError::Xml`] for malformed XML or coordinate text.
/// - [`WfsError::UnsupportedGeometry`] for unknown root elements.
/// - [`WfsError::InvalidGeometry`] when the blocks do not fit the root kind.
pub fn decode(fragment: &str) -> Result<Geometry> {
    let mut reader = Reader::from_str(fragment);
    let mut root: Option<String> = None;
    let mut blocks: Vec<Vec<Coord>> = Vec::new();
    let mut current: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let local = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if root.is_none() {
                    root = Some(local);
                } else if matches!(local.as_str(), "coordinates" | "pos" | "posList") {
                    current = Some(local);
                    text.clear();
                }
            }
            Ok(Event::Text(ref e)) => {
                if current.is_some() {
                    let unescaped = e.unescape().map_err(|err| WfsError::Xml(err.to_string()))?;
                    text.push_str(&unescaped);
                }
            }
            Ok(Event::End(_)) => {
                if let Some(kind) = current.take() {
                    let coords = if kind == "coordinates" {
                        parse_coordinates(&text)?
                    } else {
                        parse_pos_list(&text)?
                    };
                    blocks.push(coords);
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(WfsError::Xml(err.to_string())),
            _ => {}
        }
    }

    let root = root.ok_or_else(|| WfsError::Xml("empty GML fragment".to_string()))?;
    let shape_error = |reason: &str| WfsError::InvalidGeometry(format!("{}: {}", root, reason));
    let geometry = match root.as_str() {
        "Point" => {
            let mut coords = blocks.into_iter().flatten();
            match (coords.next(), coords.next()) {
                (Some(coord), None) => Geometry::Point(coord),
                _ => return Err(shape_error("expected exactly one position")),
            }
        }
        "LineString" => {
            if blocks.len() != 1 {
                return Err(shape_error("expected one coordinate block"));
            }
            Geometry::LineString(blocks.into_iter().flatten().collect())
        }
        "Polygon" => Geometry::Polygon(blocks),
        "MultiLineString" => Geometry::MultiLineString(blocks),
        other => {
            return Err(WfsError::UnsupportedGeometry {
                kind: other.to_string(),
            })
        }
    };
    geometry.validate()?;
    Ok(geometry)
}
