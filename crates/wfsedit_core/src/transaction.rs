//! WFS-T 1.0.0 Insert / Update / Delete documents.
//!
//! Every document carries exactly one operation on exactly one feature.

use crate::config::Config;
use crate::constants::{GML_NAMESPACE_URI, OGC_NAMESPACE_URI, WFS_NAMESPACE_URI, WFS_VERSION};
use crate::error::{Result, WfsError};
use crate::gml;
use crate::models::feature::property_text;
use crate::models::{Geometry, Properties};
use crate::xml::XmlElement;

/// Builds transaction bodies for one feature-type namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionBuilder {
    namespace_prefix: String,
    namespace_uri: String,
    geometry_property: String,
}

impl TransactionBuilder {
    pub fn new(
        namespace_prefix: impl Into<String>,
        namespace_uri: impl Into<String>,
        geometry_property: impl Into<String>,
    ) -> Self {
        Self {
            namespace_prefix: namespace_prefix.into(),
            namespace_uri: namespace_uri.into(),
            geometry_property: geometry_property.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.namespace_prefix.as_str(),
            config.namespace_uri.as_str(),
            config.geometry_property.as_str(),
        )
    }

    fn transaction(&self) -> XmlElement {
        XmlElement::new("wfs:Transaction")
            .attr("service", "WFS")
            .attr("version", WFS_VERSION)
            .attr("xmlns:wfs", WFS_NAMESPACE_URI)
            .attr("xmlns:gml", GML_NAMESPACE_URI)
            .attr("xmlns:ogc", OGC_NAMESPACE_URI)
            .attr(
                format!("xmlns:{}", self.namespace_prefix),
                self.namespace_uri.as_str(),
            )
    }

    /// Qualify `type_name` with the configured prefix unless already prefixed.
    fn qualified(&self, type_name: &str) -> String {
        if type_name.contains(':') {
            type_name.to_string()
        } else {
            format!("{}:{}", self.namespace_prefix, type_name)
        }
    }

    /// Build an Insert of one feature.
    ///
    /// # Arguments
    /// - `type_name`: Collection name; unprefixed names get the configured prefix.
    /// - `geometry`: Geometry written into the geometry property.
    /// - `properties`: Seed attributes; null values are omitted.
    ///
    /// # Errors
    /// - [`WfsError::UnsupportedGeometry`] / [`WfsError::InvalidGeometry`] from the codec.
    /// - [`WfsError::InvalidAttribute`] when an attribute key is not an XML name.
    /// - [`WfsError::InvalidTypeName`] when `type_name` is not an XML name.
    pub fn build_insert(
        &self,
        type_name: &str,
        geometry: &Geometry,
        properties: &Properties,
    ) -> Result<String> {
        let geometry = gml::encode_element(geometry)?;
        let feature_type = self.qualified(type_name);
        ensure_type_name(&feature_type)?;
        let prefix = feature_type
            .split_once(':')
            .map(|(prefix, _)| prefix)
            .unwrap_or(self.namespace_prefix.as_str());

        let mut feature = XmlElement::new(feature_type.as_str()).child(
            XmlElement::new(format!("{}:{}", prefix, self.geometry_property)).child(geometry),
        );
        for (key, value) in properties {
            if key == &self.geometry_property {
                continue;
            }
            ensure_attribute_name(key)?;
            if let Some(text) = property_text(value) {
                feature = feature.child(XmlElement::new(format!("{}:{}", prefix, key)).text(text));
            }
        }

        self.transaction()
            .child(XmlElement::new("wfs:Insert").child(feature))
            .to_xml_string()
    }

    /// Build an Update setting the geometry and every attribute of one feature.
    ///
    /// # Errors
    /// - [`WfsError::MissingFeatureId`] when `feature_id` is `None` or empty.
    /// - Codec and name errors as for [`Self::build_insert`].
    pub fn build_update(
        &self,
        type_name: &str,
        feature_id: Option<&str>,
        geometry: &Geometry,
        properties: &Properties,
    ) -> Result<String> {
        ensure_type_name(type_name)?;
        let feature_id = require_id(feature_id)?;
        let geometry = gml::encode_element(geometry)?;

        let mut update = XmlElement::new("wfs:Update")
            .attr("typeName", type_name)
            .child(
                XmlElement::new("wfs:Property")
                    .child(XmlElement::new("wfs:Name").text(self.geometry_property.as_str()))
                    .child(XmlElement::new("wfs:Value").child(geometry)),
            );
        for (key, value) in properties {
            if key == &self.geometry_property {
                continue;
            }
            ensure_attribute_name(key)?;
            let mut property =
                XmlElement::new("wfs:Property").child(XmlElement::new("wfs:Name").text(key.as_str()));
            // A property without a value clears the attribute.
            if let Some(text) = property_text(value) {
                property = property.child(XmlElement::new("wfs:Value").text(text));
            }
            update = update.child(property);
        }

        self.transaction()
            .child(update.child(feature_filter(feature_id)))
            .to_xml_string()
    }

    /// Build a Delete of one feature.
    ///
    /// # Errors
    /// - [`WfsError::InvalidTypeName`] when `type_name` is not an XML name.
    /// - [`WfsError::MissingFeatureId`] when `feature_id` is `None` or empty.
    pub fn build_delete(&self, type_name: &str, feature_id: Option<&str>) -> Result<String> {
        ensure_type_name(type_name)?;
        let feature_id = require_id(feature_id)?;
        self.transaction()
            .child(
                XmlElement::new("wfs:Delete")
                    .attr("typeName", type_name)
                    .child(feature_filter(feature_id)),
            )
            .to_xml_string()
    }
}

fn require_id(feature_id: Option<&str>) -> Result<&str> {
    match feature_id.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(WfsError::MissingFeatureId),
    }
}

fn feature_filter(feature_id: &str) -> XmlElement {
    XmlElement::new("ogc:Filter").child(XmlElement::new("ogc:FeatureId").attr("fid", feature_id))
}

fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    valid_start && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn ensure_attribute_name(key: &str) -> Result<()> {
    if is_xml_name(key) {
        Ok(())
    } else {
        Err(WfsError::InvalidAttribute(format!(
            "'{}' is not a valid attribute name",
            key
        )))
    }
}

/// Type names may carry one namespace prefix; both halves must be XML names.
fn ensure_type_name(type_name: &str) -> Result<()> {
    let valid = match type_name.split_once(':') {
        Some((prefix, local)) => is_xml_name(prefix) && is_xml_name(local),
        None => is_xml_name(type_name),
    };
    if valid {
        Ok(())
    } else {
        Err(WfsError::InvalidTypeName(type_name.to_string()))
    }
}

#[cfg(test)]
mod tests;
