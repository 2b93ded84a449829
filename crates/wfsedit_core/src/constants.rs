//! Shared constants used across wfsedit crates.

/// Default WFS endpoint used for both GetFeature and Transaction requests.
pub const DEFAULT_WFS_ENDPOINT: &str = "http://localhost:8080/geoserver/ne/ows";

/// WFS protocol version spoken on the wire.
pub const WFS_VERSION: &str = "1.0.0";

/// Default feature-type namespace prefix.
pub const DEFAULT_NAMESPACE_PREFIX: &str = "ne";
/// Default feature-type namespace URI bound to [`DEFAULT_NAMESPACE_PREFIX`].
pub const DEFAULT_NAMESPACE_URI: &str = "http://www.naturalearthdata.com";

/// Default name of the geometry attribute on every feature type.
pub const DEFAULT_GEOMETRY_PROPERTY: &str = "geom";

/// Spatial reference system assumed for every coordinate.
pub const SRS_NAME: &str = "EPSG:4326";

/// Default page size for feature listings.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Attribute seeded on newly drawn features.
pub const SEED_ATTRIBUTE: &str = "name";
/// Placeholder value for [`SEED_ATTRIBUTE`].
pub const SEED_ATTRIBUTE_VALUE: &str = "New feature";

/// Feature id reported when an insert result carries no `FeatureId`.
pub const UNKNOWN_FEATURE_ID: &str = "unknown";

/// XML namespace URIs declared on every transaction document.
pub const WFS_NAMESPACE_URI: &str = "http://www.opengis.net/wfs";
/// GML namespace URI.
pub const GML_NAMESPACE_URI: &str = "http://www.opengis.net/gml";
/// OGC filter namespace URI.
pub const OGC_NAMESPACE_URI: &str = "http://www.opengis.net/ogc";
