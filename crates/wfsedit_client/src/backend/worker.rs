//! Background worker thread that owns the engine.

use crate::backend::{CoreCmd, CoreErrorSource, CoreEvent};
use crate::engine::Engine;
use crate::transport::WfsTransport;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::thread;
use std::time::Instant;
use tokio::runtime::{Builder, Runtime};
use tracing::{error, info};
use wfsedit_core::config::env_flag_enabled;
use wfsedit_core::store::SnapshotChanged;
use wfsedit_core::{EditPhase, SketchSurface, WfsError};

/// Handle for sending commands to, and receiving events from, the worker.
pub struct BackendHandle {
    pub cmd_tx: Sender<CoreCmd>,
    pub evt_rx: Receiver<CoreEvent>,
}

fn send_error(evt_tx: &Sender<CoreEvent>, source: CoreErrorSource, message: String) {
    let _ = evt_tx.send(CoreEvent::Error { source, message });
}

struct WorkerState<T: WfsTransport> {
    engine: Engine<T, SketchSurface>,
    runtime: Runtime,
    evt_tx: Sender<CoreEvent>,
    snapshot_rx: Receiver<SnapshotChanged>,
    last_phase: EditPhase,
    perf_log_enabled: bool,
}

impl<T: WfsTransport> WorkerState<T> {
    fn fail(&self, source: CoreErrorSource, context: &str, err: WfsError) {
        if err.is_precondition() {
            info!("{} rejected: {}", context, err);
        } else {
            error!("backend {} failed: {}", context, err);
        }
        send_error(&self.evt_tx, source, format!("{} failed: {}", context, err));
    }

    fn handle(&mut self, cmd: CoreCmd) {
        match cmd {
            CoreCmd::ListCollections => {
                match self.runtime.block_on(self.engine.list_collections()) {
                    Ok(items) => {
                        let _ = self.evt_tx.send(CoreEvent::CollectionsLoaded { items });
                    }
                    Err(err) => self.fail(CoreErrorSource::Fetch, "List collections", err),
                }
            }
            CoreCmd::ActivateCollection { collection } => {
                if let Err(err) = self
                    .runtime
                    .block_on(self.engine.activate_collection(collection))
                {
                    self.fail(CoreErrorSource::Fetch, "Load collection", err);
                }
            }
            CoreCmd::Refresh => {
                if let Err(err) = self.runtime.block_on(self.engine.refetch()) {
                    self.fail(CoreErrorSource::Fetch, "Refresh", err);
                }
            }
            CoreCmd::SelectFeature { id } => match self.engine.select_feature(&id) {
                Ok(feature) => {
                    let feature = feature.clone();
                    let _ = self.evt_tx.send(CoreEvent::FeatureSelected { feature });
                }
                Err(err) => self.fail(CoreErrorSource::Other, "Select", err),
            },
            CoreCmd::BeginEdit { id } => {
                if let Err(err) = self.engine.begin_edit_by_id(&id) {
                    self.fail(CoreErrorSource::Edit, "Begin edit", err);
                }
            }
            CoreCmd::BeginDraw => {
                if let Err(err) = self.engine.begin_draw() {
                    self.fail(CoreErrorSource::Edit, "Begin draw", err);
                }
            }
            CoreCmd::SetGeometry { geometry } => {
                if !self.engine.surface_mut().set_geometry(geometry) {
                    send_error(
                        &self.evt_tx,
                        CoreErrorSource::Edit,
                        "Set geometry failed: no feature is being edited".to_string(),
                    );
                }
            }
            CoreCmd::SetAttribute { key, value } => {
                if let Err(err) = self.engine.set_attribute(&key, value) {
                    self.fail(CoreErrorSource::Edit, "Set attribute", err);
                }
            }
            CoreCmd::SaveEdit => match self.runtime.block_on(self.engine.save_edit()) {
                Ok(written) => {
                    let refreshed = written.refresh.is_ok();
                    let _ = self.evt_tx.send(CoreEvent::Saved {
                        outcome: written.outcome,
                        refreshed,
                    });
                }
                Err(err) => self.fail(CoreErrorSource::Save, "Save", err),
            },
            CoreCmd::CancelEdit => self.engine.cancel_edit(),
            CoreCmd::Delete { id, confirmed } => {
                let feature = match self.engine.current_snapshot().find(&id) {
                    Some(feature) => feature.clone(),
                    None => {
                        self.fail(
                            CoreErrorSource::Delete,
                            "Delete",
                            WfsError::FeatureNotFound(id),
                        );
                        return;
                    }
                };
                match self
                    .runtime
                    .block_on(self.engine.confirm_delete(&feature, |_| confirmed))
                {
                    Ok(written) => {
                        let refreshed = written.refresh.is_ok();
                        let _ = self.evt_tx.send(CoreEvent::Deleted {
                            id,
                            outcome: written.outcome,
                            refreshed,
                        });
                    }
                    Err(err) => self.fail(CoreErrorSource::Delete, "Delete", err),
                }
            }
        }
    }

    /// Forward state changes caused by the last command.
    fn publish_changes(&mut self) {
        let phase = self.engine.session().phase();
        if phase != self.last_phase {
            self.last_phase = phase;
            let feature_id = self
                .engine
                .session()
                .feature()
                .and_then(|feature| feature.id.clone());
            let _ = self
                .evt_tx
                .send(CoreEvent::SessionChanged { phase, feature_id });
        }
        // Several replacements within one command collapse into one event.
        if self.snapshot_rx.try_iter().count() > 0 {
            let snapshot = self.engine.current_snapshot().clone();
            let _ = self.evt_tx.send(CoreEvent::SnapshotChanged { snapshot });
        }
    }
}

fn command_name(cmd: &CoreCmd) -> &'static str {
    match cmd {
        CoreCmd::ListCollections => "list_collections",
        CoreCmd::ActivateCollection { .. } => "activate_collection",
        CoreCmd::Refresh => "refresh",
        CoreCmd::SelectFeature { .. } => "select_feature",
        CoreCmd::BeginEdit { .. } => "begin_edit",
        CoreCmd::BeginDraw => "begin_draw",
        CoreCmd::SetGeometry { .. } => "set_geometry",
        CoreCmd::SetAttribute { .. } => "set_attribute",
        CoreCmd::SaveEdit => "save_edit",
        CoreCmd::CancelEdit => "cancel_edit",
        CoreCmd::Delete { .. } => "delete",
    }
}

/// Spawn the worker thread that drives the engine.
///
/// Network round-trips run on a single-threaded runtime owned by the worker,
/// so commands are handled strictly in the order they are sent and the front
/// end never blocks.
///
/// # Returns
/// A [`BackendHandle`] containing the command sender and event receiver.
///
/// # Panics
/// Panics if the worker thread cannot be spawned.
pub fn spawn_backend<T>(mut engine: Engine<T, SketchSurface>) -> BackendHandle
where
    T: WfsTransport + 'static,
{
    let (cmd_tx, cmd_rx) = unbounded::<CoreCmd>();
    let (evt_tx, evt_rx) = unbounded();

    thread::Builder::new()
        .name("wfsedit-backend".to_string())
        .spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to start backend runtime: {}", err);
                    send_error(
                        &evt_tx,
                        CoreErrorSource::Other,
                        format!("Backend unavailable: {}", err),
                    );
                    return;
                }
            };
            let snapshot_rx = engine.subscribe();
            let last_phase = engine.session().phase();
            let mut state = WorkerState {
                engine,
                runtime,
                evt_tx,
                snapshot_rx,
                last_phase,
                perf_log_enabled: env_flag_enabled("WFSEDIT_BACKEND_PERF_LOG"),
            };
            for cmd in cmd_rx.iter() {
                let started = Instant::now();
                let op = command_name(&cmd);
                state.handle(cmd);
                state.publish_changes();
                if state.perf_log_enabled {
                    info!(
                        target: "wfsedit_client::backend_perf",
                        op = op,
                        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
                        features = state.engine.current_snapshot().len(),
                        phase = %state.engine.session().phase(),
                        "backend command perf"
                    );
                }
            }
        })
        .expect("spawn backend thread");

    BackendHandle { cmd_tx, evt_rx }
}
