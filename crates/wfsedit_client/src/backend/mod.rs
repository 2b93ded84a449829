//! Worker wiring for front ends that cannot block on the network.
//!
//! This module exposes the command/event protocol plus the worker spawn helper.

mod protocol;
mod worker;

pub use protocol::{CoreCmd, CoreErrorSource, CoreEvent};
pub use worker::{spawn_backend, BackendHandle};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::test_support::{FakeTransport, INSERT_OK};
    use serde_json::{json, Map};
    use std::time::Duration;
    use wfsedit_core::models::Coord;
    use wfsedit_core::{
        CollectionRef, Config, EditPhase, Feature, Geometry, SketchSurface, TransactionOutcome,
    };

    fn recv_event(rx: &crossbeam_channel::Receiver<CoreEvent>) -> CoreEvent {
        rx.recv_timeout(Duration::from_secs(2))
            .expect("expected backend event")
    }

    /// Skip events until one matches `want`.
    fn recv_until<F>(rx: &crossbeam_channel::Receiver<CoreEvent>, want: F) -> CoreEvent
    where
        F: Fn(&CoreEvent) -> bool,
    {
        loop {
            let event = recv_event(rx);
            if want(&event) {
                return event;
            }
        }
    }

    fn place(id: &str) -> Feature {
        let mut properties = Map::new();
        properties.insert("name".to_string(), json!(id));
        Feature {
            id: Some(id.to_string()),
            geometry: Geometry::Point(Coord::new(1.0, 2.0)),
            properties,
        }
    }

    fn spawn_with(transport: &FakeTransport) -> BackendHandle {
        spawn_backend(Engine::new(
            &Config::default(),
            transport.clone(),
            SketchSurface::new(),
        ))
    }

    fn activate(backend: &BackendHandle) {
        backend
            .cmd_tx
            .send(CoreCmd::ActivateCollection {
                collection: CollectionRef::new("places", "ne", true),
            })
            .expect("send activate");
    }

    #[test]
    fn backend_loads_collection_snapshot() {
        let transport = FakeTransport::new();
        transport.set_features("ne:places", vec![place("places.1"), place("places.2")]);
        let backend = spawn_with(&transport);

        activate(&backend);

        match recv_event(&backend.evt_rx) {
            CoreEvent::SnapshotChanged { snapshot } => {
                assert_eq!(snapshot.collection.as_deref(), Some("ne:places"));
                assert_eq!(snapshot.len(), 2);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn backend_lists_collections() {
        let transport = FakeTransport::new();
        transport.set_collections(vec![
            CollectionRef::new("places", "ne", true),
            CollectionRef::new("roads", "ne", true),
        ]);
        let backend = spawn_with(&transport);

        backend
            .cmd_tx
            .send(CoreCmd::ListCollections)
            .expect("send list");

        match recv_event(&backend.evt_rx) {
            CoreEvent::CollectionsLoaded { items } => {
                let names: Vec<&str> = items.iter().map(|c| c.name.as_str()).collect();
                assert_eq!(names, vec!["places", "roads"]);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn backend_draws_saves_and_refreshes() {
        let transport = FakeTransport::new();
        transport.set_features("ne:places", vec![place("places.1")]);
        let backend = spawn_with(&transport);
        activate(&backend);
        recv_until(&backend.evt_rx, |e| {
            matches!(e, CoreEvent::SnapshotChanged { .. })
        });

        backend.cmd_tx.send(CoreCmd::BeginDraw).expect("send draw");
        match recv_event(&backend.evt_rx) {
            CoreEvent::SessionChanged { phase, feature_id } => {
                assert_eq!(phase, EditPhase::Drawing);
                assert_eq!(feature_id, None);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        transport.push_response(Ok(INSERT_OK.to_string()));
        transport.set_features("ne:places", vec![place("places.1"), place("places.7")]);
        backend
            .cmd_tx
            .send(CoreCmd::SetGeometry {
                geometry: Geometry::Point(Coord::new(2.0, 3.0)),
            })
            .expect("send geometry");
        backend.cmd_tx.send(CoreCmd::SaveEdit).expect("send save");

        match recv_event(&backend.evt_rx) {
            CoreEvent::Saved { outcome, refreshed } => {
                assert_eq!(
                    outcome,
                    TransactionOutcome::InsertOk {
                        feature_id: "places.7".to_string()
                    }
                );
                assert!(refreshed);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        match recv_event(&backend.evt_rx) {
            CoreEvent::SessionChanged { phase, .. } => assert_eq!(phase, EditPhase::Idle),
            other => panic!("unexpected event: {:?}", other),
        }
        match recv_event(&backend.evt_rx) {
            CoreEvent::SnapshotChanged { snapshot } => assert_eq!(snapshot.len(), 2),
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(transport.transactions().len(), 1);
        assert_eq!(transport.fetch_count("ne:places"), 2);
    }

    #[test]
    fn backend_reports_save_without_geometry() {
        let transport = FakeTransport::new();
        let backend = spawn_with(&transport);
        activate(&backend);
        backend.cmd_tx.send(CoreCmd::BeginDraw).expect("send draw");
        backend.cmd_tx.send(CoreCmd::SaveEdit).expect("send save");

        match recv_until(&backend.evt_rx, |e| matches!(e, CoreEvent::Error { .. })) {
            CoreEvent::Error { source, message } => {
                assert_eq!(source, CoreErrorSource::Save);
                assert!(message.contains("nothing drawn"), "{}", message);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(transport.transactions().is_empty());
    }

    #[test]
    fn backend_respects_declined_delete() {
        let transport = FakeTransport::new();
        transport.set_features("ne:places", vec![place("places.1")]);
        let backend = spawn_with(&transport);
        activate(&backend);

        backend
            .cmd_tx
            .send(CoreCmd::Delete {
                id: "places.1".to_string(),
                confirmed: false,
            })
            .expect("send delete");

        match recv_until(&backend.evt_rx, |e| matches!(e, CoreEvent::Error { .. })) {
            CoreEvent::Error { source, .. } => assert_eq!(source, CoreErrorSource::Delete),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(transport.transactions().is_empty());
    }

    #[test]
    fn backend_selects_feature_and_reports_missing() {
        let transport = FakeTransport::new();
        transport.set_features("ne:places", vec![place("places.1")]);
        let backend = spawn_with(&transport);
        activate(&backend);

        backend
            .cmd_tx
            .send(CoreCmd::SelectFeature {
                id: "places.1".to_string(),
            })
            .expect("send select");
        match recv_until(&backend.evt_rx, |e| {
            matches!(e, CoreEvent::FeatureSelected { .. })
        }) {
            CoreEvent::FeatureSelected { feature } => {
                assert_eq!(feature.id.as_deref(), Some("places.1"))
            }
            other => panic!("unexpected event: {:?}", other),
        }

        backend
            .cmd_tx
            .send(CoreCmd::SelectFeature {
                id: "places.9".to_string(),
            })
            .expect("send select missing");
        match recv_event(&backend.evt_rx) {
            CoreEvent::Error { message, .. } => assert!(message.contains("places.9"), "{}", message),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
