//! Command API abstraction.
//!
//! The device is driven exclusively through ordered command lists: each
//! request carries a list of CLI commands and yields one structured JSON
//! result per command. Reading state and pushing configuration both go
//! through [`CommandApi::run_cmds`].

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{MeshError, MeshResult};

/// API level passed with every request.
pub const API_LEVEL: u32 = 1;

/// Request/response interface to the device command API.
///
/// Implementations must return exactly one result per command, in order,
/// or fail the whole request. A configuration transaction submitted in one
/// call is either applied completely or not at all.
#[async_trait]
pub trait CommandApi: Send + Sync {
    /// Runs an ordered list of commands at the given API level.
    async fn run_cmds(&self, level: u32, cmds: &[String]) -> MeshResult<Vec<Value>>;

    /// Runs a single show command and returns its result.
    async fn run_cmd(&self, cmd: &str) -> MeshResult<Value> {
        let mut results = self.run_cmds(API_LEVEL, &[cmd.to_string()]).await?;
        if results.len() != 1 {
            return Err(MeshError::invalid_response(
                cmd,
                format!("expected 1 result, got {}", results.len()),
            ));
        }
        Ok(results.remove(0))
    }
}
