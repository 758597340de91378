//! Mesh Manager - one read / reconcile / write pass against a device

use std::sync::Arc;

use rsvp_mesh_common::{CommandApi, MeshResult};
use tracing::info;

use crate::config::MeshConfig;
use crate::emitter::emit;
use crate::events::{EventSink, TracingSink};
use crate::filter::filter;
use crate::reader::read_device_state;
use crate::reconciler::{reconcile, ReconcileStats};

/// Outcome of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Routes learned from the protocol
    pub routes: usize,
    /// Routes that passed the prefix list
    pub targets: usize,
    /// Whether a configuration transaction was submitted
    pub applied: bool,
    pub stats: ReconcileStats,
}

/// Mesh Manager
///
/// Holds everything a run needs except the device state, which is read
/// fresh from the device on every [`MeshMgr::run`]. Two managers running
/// against the same device at the same time can race each other; callers
/// must serialize runs (e.g. a scheduler lock).
pub struct MeshMgr<A> {
    api: A,
    config: MeshConfig,
    sink: Arc<dyn EventSink>,
}

impl<A: CommandApi> MeshMgr<A> {
    /// Create a new MeshMgr that logs events through tracing
    pub fn new(api: A, config: MeshConfig) -> Self {
        Self {
            api,
            config,
            sink: Arc::new(TracingSink),
        }
    }

    /// Replace the event sink (builder pattern)
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Runs one reconciliation pass at time `now` (unix seconds).
    ///
    /// Nothing is written when reading the device state fails. Events are
    /// recorded only once the transaction has been accepted.
    pub async fn run(&self, now: i64) -> MeshResult<RunSummary> {
        self.config.validate()?;

        let state = read_device_state(&self.api, &self.config).await?;
        let targets = filter(&state.routes, &state.prefix_list);

        info!(
            protocol = %self.config.protocol,
            routes = state.routes.len(),
            targets = targets.len(),
            tunnels = state.tunnels.len(),
            "Reconciling tunnel mesh"
        );

        let params = self.config.params(state.template);
        let result = reconcile(&targets, &state.tunnels, &params, now);

        let applied = emit(&self.api, &result.delta).await?;
        for event in &result.events {
            self.sink.record(event);
        }

        let stats = result.stats;
        info!(
            desired = stats.desired,
            created = stats.created,
            cleared = stats.cleared,
            unchanged = stats.unchanged,
            marked = stats.marked,
            removed = stats.removed,
            waiting = stats.waiting,
            "Tunnel mesh reconciled"
        );

        Ok(RunSummary {
            routes: state.routes.len(),
            targets: targets.len(),
            applied,
            stats,
        })
    }
}
