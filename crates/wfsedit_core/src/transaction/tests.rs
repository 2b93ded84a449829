use super::TransactionBuilder;
use crate::error::WfsError;
use crate::models::{Coord, Geometry, Properties};
use serde_json::{json, Value};

fn builder() -> TransactionBuilder {
    TransactionBuilder::new("ne", "http://www.naturalearthdata.com", "geom")
}

fn props(value: Value) -> Properties {
    value.as_object().cloned().expect("object")
}

fn point() -> Geometry {
    Geometry::Point(Coord::new(78.4867, 17.3850))
}

#[test]
fn insert_point_declares_namespaces_and_wraps_gml() {
    let body = builder()
        .build_insert("features", &point(), &props(json!({ "name": "New feature" })))
        .expect("insert");

    assert!(body.starts_with(r#"<wfs:Transaction service="WFS" version="1.0.0""#), "{}", body);
    for decl in [
        r#"xmlns:wfs="http://www.opengis.net/wfs""#,
        r#"xmlns:gml="http://www.opengis.net/gml""#,
        r#"xmlns:ogc="http://www.opengis.net/ogc""#,
        r#"xmlns:ne="http://www.naturalearthdata.com""#,
    ] {
        assert!(body.contains(decl), "missing {} in {}", decl, body);
    }
    assert!(body.contains(
        r#"<wfs:Insert><ne:features><ne:geom><gml:Point srsName="EPSG:4326"><gml:coordinates>78.4867,17.385</gml:coordinates></gml:Point></ne:geom><ne:name>New feature</ne:name></ne:features></wfs:Insert>"#
    ), "{}", body);
}

#[test]
fn insert_keeps_existing_prefix() {
    let body = builder()
        .build_insert("topp:roads", &point(), &Properties::new())
        .expect("insert");
    assert!(body.contains("<topp:roads><topp:geom>"), "{}", body);
}

#[test]
fn insert_rejects_unsupported_geometry_before_building() {
    let geometry = Geometry::Unsupported {
        kind: "MultiPoint".to_string(),
        raw: Value::Null,
    };
    assert_eq!(
        builder().build_insert("features", &geometry, &Properties::new()),
        Err(WfsError::UnsupportedGeometry {
            kind: "MultiPoint".to_string()
        })
    );
}

#[test]
fn update_lists_geometry_then_attributes_then_filter() {
    let body = builder()
        .build_update(
            "ne:features",
            Some("features.42"),
            &point(),
            &props(json!({ "name": "Charminar", "population": 12, "note": null })),
        )
        .expect("update");

    let geom = body.find("<wfs:Name>geom</wfs:Name>").expect("geom property");
    let name = body.find("<wfs:Name>name</wfs:Name>").expect("name property");
    let filter = body.find("<ogc:Filter>").expect("filter");
    assert!(geom < name && name < filter, "{}", body);
    assert!(body.contains(r#"<wfs:Update typeName="ne:features">"#));
    assert!(body.contains("<wfs:Value>Charminar</wfs:Value>"));
    assert!(body.contains("<wfs:Value>12</wfs:Value>"));
    assert!(body.contains("<wfs:Property><wfs:Name>note</wfs:Name></wfs:Property>"), "{}", body);
    assert!(body.contains(r#"<ogc:FeatureId fid="features.42"/>"#));
}

#[test]
fn update_and_delete_require_feature_id() {
    let b = builder();
    assert_eq!(
        b.build_update("features", None, &point(), &Properties::new()),
        Err(WfsError::MissingFeatureId)
    );
    assert_eq!(
        b.build_update("features", Some("  "), &point(), &Properties::new()),
        Err(WfsError::MissingFeatureId)
    );
    assert_eq!(b.build_delete("features", None), Err(WfsError::MissingFeatureId));
}

#[test]
fn delete_filters_on_feature_id() {
    let body = builder()
        .build_delete("features", Some("features.42"))
        .expect("delete");
    assert!(body.contains(r#"<wfs:Delete typeName="features">"#), "{}", body);
    assert!(body.contains(r#"<ogc:Filter><ogc:FeatureId fid="features.42"/></ogc:Filter>"#));
    assert!(!body.contains("wfs:Property"));
}

#[test]
fn attribute_values_are_escaped() {
    let body = builder()
        .build_update(
            "features",
            Some("features.1"),
            &point(),
            &props(json!({ "name": "A & B <east>" })),
        )
        .expect("update");
    assert!(body.contains("A &amp; B &lt;east&gt;"), "{}", body);
}

#[test]
fn attribute_keys_must_be_xml_names() {
    let result = builder().build_insert(
        "features",
        &point(),
        &props(json!({ "bad key": "x" })),
    );
    assert!(matches!(result, Err(WfsError::InvalidAttribute(_))));
}

#[test]
fn insert_skips_attribute_named_like_geometry_property() {
    let body = builder()
        .build_insert(
            "features",
            &point(),
            &props(json!({ "geom": "x", "name": "n" })),
        )
        .expect("insert");
    assert_eq!(body.matches("<ne:geom>").count(), 1, "{}", body);
    assert!(body.contains("<ne:name>n</ne:name>"), "{}", body);
}

#[test]
fn type_names_must_be_xml_names() {
    let b = builder();
    assert_eq!(
        b.build_insert("my roads", &point(), &props(json!({}))),
        Err(WfsError::InvalidTypeName("ne:my roads".to_string()))
    );
    assert_eq!(
        b.build_update("ne:my roads", Some("roads.1"), &point(), &props(json!({}))),
        Err(WfsError::InvalidTypeName("ne:my roads".to_string()))
    );
    assert_eq!(
        b.build_delete("a:b:c", Some("roads.1")),
        Err(WfsError::InvalidTypeName("a:b:c".to_string()))
    );
    assert!(b.build_delete("topp:roads", Some("roads.1")).is_ok());
}
