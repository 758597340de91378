//! Config emitter
//!
//! Wraps a [`ConfigDelta`] into one configuration transaction and submits
//! it in a single command API request.

use rsvp_mesh_common::{CommandApi, MeshResult, API_LEVEL};
use tracing::{debug, error, info};

use crate::commands::{ENTER_RSVP_CONTEXT, EXIT_AND_PERSIST};
use crate::reconciler::ConfigDelta;

/// Builds the full command list for a delta: enter the RSVP context, apply
/// the delta statements, leave configuration mode and save.
pub fn build_transaction(delta: &ConfigDelta) -> Vec<String> {
    let body = delta.statements();
    let mut cmds =
        Vec::with_capacity(ENTER_RSVP_CONTEXT.len() + body.len() + EXIT_AND_PERSIST.len());
    cmds.extend(ENTER_RSVP_CONTEXT.iter().map(|s| s.to_string()));
    cmds.extend(body);
    cmds.extend(EXIT_AND_PERSIST.iter().map(|s| s.to_string()));
    cmds
}

/// Submits the delta.
///
/// Returns `Ok(false)` without contacting the device when the delta is
/// empty. A failed submission is returned as is and never retried.
pub async fn emit<A>(api: &A, delta: &ConfigDelta) -> MeshResult<bool>
where
    A: CommandApi + ?Sized,
{
    if delta.is_empty() {
        debug!("No configuration changes");
        return Ok(false);
    }

    let cmds = build_transaction(delta);
    info!(operations = delta.len(), statements = cmds.len(), "Applying configuration");

    if let Err(e) = api.run_cmds(API_LEVEL, &cmds).await {
        error!(error = %e, "Configuration transaction failed");
        return Err(e);
    }

    Ok(true)
}
