//! HTTP transport and engine round-trips against a mock WFS server.

use serde_json::json;
use wfsedit_client::{Engine, HttpTransport, WfsTransport};
use wfsedit_core::models::Coord;
use wfsedit_core::{
    CollectionRef, Config, EditPhase, Geometry, SketchSurface, TransactionOutcome,
    TransportFailure, WfsError,
};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OWS_PATH: &str = "/geoserver/ne/ows";

fn transport_for(server: &MockServer) -> HttpTransport {
    HttpTransport::new(format!("{}{}", server.uri(), OWS_PATH), reqwest::Client::new())
}

fn places_json() -> serde_json::Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "places.1",
                "geometry": { "type": "Point", "coordinates": [78.47, 17.36] },
                "properties": { "name": "Charminar" }
            },
            {
                "type": "Feature",
                "id": "places.2",
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[0, 0], [1, 0], [1, 1], [0, 0]]]]
                },
                "properties": { "name": "Islands" }
            }
        ]
    })
}

#[tokio::test]
async fn get_features_sends_wfs_query_and_parses_geojson() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(OWS_PATH))
        .and(query_param("service", "WFS"))
        .and(query_param("version", "1.0.0"))
        .and(query_param("request", "GetFeature"))
        .and(query_param("typeName", "ne:places"))
        .and(query_param("outputFormat", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(places_json()))
        .expect(1)
        .mount(&server)
        .await;

    let features = transport_for(&server)
        .get_features("ne:places")
        .await
        .expect("features");

    assert_eq!(features.len(), 2);
    assert_eq!(features[0].id.as_deref(), Some("places.1"));
    assert_eq!(features[0].geometry, Geometry::Point(Coord::new(78.47, 17.36)));
    assert_eq!(features[1].geometry.kind(), "MultiPolygon");
}

#[tokio::test]
async fn get_features_rejects_exception_reports() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(OWS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<ServiceExceptionReport><ServiceException>Unknown type</ServiceException></ServiceExceptionReport>",
            "text/xml",
        ))
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .get_features("ne:nothing")
        .await
        .expect_err("xml body");

    assert!(matches!(err, WfsError::Fetch(ref msg) if msg.contains("text/xml")), "{:?}", err);
}

#[tokio::test]
async fn get_features_maps_http_errors_to_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .get_features("ne:places")
        .await
        .expect_err("503");

    assert_eq!(err, WfsError::Fetch("HTTP status 503".to_string()));
}

#[tokio::test]
async fn transaction_posts_xml_and_returns_raw_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(OWS_PATH))
        .and(header("content-type", "text/xml"))
        .and(body_string_contains("<wfs:Transaction"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<wfs:DeleteResult/>"))
        .expect(1)
        .mount(&server)
        .await;

    let raw = transport_for(&server)
        .send_transaction("<wfs:Transaction/>".to_string())
        .await
        .expect("post");

    assert_eq!(raw, "<wfs:DeleteResult/>");
}

#[tokio::test]
async fn transaction_status_errors_are_transport_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>boom</html>"))
        .mount(&server)
        .await;

    let err = transport_for(&server)
        .send_transaction("<wfs:Transaction/>".to_string())
        .await
        .expect_err("500");

    assert_eq!(err, WfsError::Transport(TransportFailure::Status(500)));
}

#[tokio::test]
async fn unreachable_server_is_a_connection_failure() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("free port")
        .port();
    let transport = HttpTransport::new(
        format!("http://127.0.0.1:{}{}", port, OWS_PATH),
        reqwest::Client::new(),
    );

    let err = transport
        .send_transaction("<wfs:Transaction/>".to_string())
        .await
        .expect_err("closed port");

    assert!(matches!(
        err,
        WfsError::Transport(TransportFailure::Connection(_))
    ));
}

#[tokio::test]
async fn capabilities_list_feature_types() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("request", "GetCapabilities"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<WFS_Capabilities xmlns="http://www.opengis.net/wfs"><FeatureTypeList>
                <FeatureType><Name>ne:places</Name><Title>Populated places</Title></FeatureType>
                <FeatureType><Name>roads</Name></FeatureType>
            </FeatureTypeList></WFS_Capabilities>"#,
            "text/xml",
        ))
        .mount(&server)
        .await;

    let collections = transport_for(&server)
        .list_collections("ne")
        .await
        .expect("capabilities");

    let names: Vec<&str> = collections
        .iter()
        .map(|c| c.namespace_qualified_name.as_str())
        .collect();
    assert_eq!(names, vec!["ne:places", "ne:roads"]);
    assert_eq!(collections[0].label(), "Populated places");
}

#[tokio::test]
async fn engine_insert_round_trip_refetches_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("request", "GetFeature"))
        .respond_with(ResponseTemplate::new(200).set_body_json(places_json()))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("<wfs:Insert><ne:places><ne:geom>"))
        .and(body_string_contains("<gml:coordinates>2,3</gml:coordinates>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<wfs:WFS_TransactionResponse xmlns:wfs="http://www.opengis.net/wfs" xmlns:ogc="http://www.opengis.net/ogc"><wfs:InsertResult><ogc:FeatureId fid="places.3"/></wfs:InsertResult></wfs:WFS_TransactionResponse>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut engine = Engine::new(
        &Config::default(),
        transport_for(&server),
        SketchSurface::new(),
    );
    engine
        .activate_collection(CollectionRef::new("places", "ne", true))
        .await
        .expect("activate");
    engine.begin_draw().expect("draw");
    engine
        .surface_mut()
        .set_geometry(Geometry::Point(Coord::new(2.0, 3.0)));

    let written = engine.save_edit().await.expect("save");

    assert_eq!(
        written.outcome,
        TransactionOutcome::InsertOk {
            feature_id: "places.3".to_string()
        }
    );
    assert!(written.refresh.is_ok());
    assert_eq!(engine.session().phase(), EditPhase::Idle);
    assert_eq!(engine.current_snapshot().revision, 3);
}

#[tokio::test]
async fn editing_unsupported_geometry_is_refused() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(places_json()))
        .mount(&server)
        .await;

    let mut engine = Engine::new(
        &Config::default(),
        transport_for(&server),
        SketchSurface::new(),
    );
    engine
        .activate_collection(CollectionRef::new("places", "ne", true))
        .await
        .expect("activate");

    assert_eq!(
        engine.begin_edit_by_id("places.2"),
        Err(WfsError::UnsupportedGeometry {
            kind: "MultiPolygon".to_string()
        })
    );
    assert!(server.received_requests().await.is_some_and(|requests| requests
        .iter()
        .all(|request| request.method.as_str() == "GET")));
}
