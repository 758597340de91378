//! JSON-RPC command API client.
//!
//! Sends `runCmds` requests over HTTP and maps JSON-RPC failures into
//! [`MeshError`] values.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::api::CommandApi;
use crate::config::ApiConfig;
use crate::error::{MeshError, MeshResult};

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: RunCmdsParams<'a>,
    id: String,
}

#[derive(Debug, Serialize)]
struct RunCmdsParams<'a> {
    version: u32,
    cmds: &'a [String],
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// HTTP JSON-RPC client for the device command API.
pub struct EapiClient {
    http: reqwest::Client,
    config: ApiConfig,
    next_id: AtomicU64,
}

impl EapiClient {
    /// Creates a client for the configured endpoint.
    pub fn new(config: ApiConfig) -> MeshResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MeshError::transport("init", e.to_string()))?;

        Ok(Self {
            http,
            config,
            next_id: AtomicU64::new(1),
        })
    }
}

#[async_trait]
impl CommandApi for EapiClient {
    async fn run_cmds(&self, level: u32, cmds: &[String]) -> MeshResult<Vec<Value>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "runCmds",
            params: RunCmdsParams {
                version: level,
                cmds,
                format: "json",
            },
            id: format!("rsvp-meshmgrd-{}", id),
        };

        debug!(url = %self.config.url, id = id, count = cmds.len(), "Sending runCmds");
        trace!(cmds = ?cmds, "runCmds payload");

        let mut builder = self.http.post(&self.config.url).json(&request);
        if let Some(creds) = &self.config.credentials {
            builder = builder.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| MeshError::transport("send", e.to_string()))?
            .error_for_status()
            .map_err(|e| MeshError::transport("status", e.to_string()))?;

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| MeshError::transport("decode", e.to_string()))?;

        if let Some(error) = body.error {
            warn!(code = error.code, message = %error.message, "runCmds rejected");
            return Err(MeshError::Api {
                code: error.code,
                message: error.message,
            });
        }

        let results = body.result.ok_or_else(|| {
            MeshError::invalid_response(summary(cmds), "response has neither result nor error")
        })?;

        if results.len() != cmds.len() {
            return Err(MeshError::invalid_response(
                summary(cmds),
                format!("expected {} results, got {}", cmds.len(), results.len()),
            ));
        }

        Ok(results)
    }
}

fn summary(cmds: &[String]) -> String {
    match cmds {
        [] => String::new(),
        [only] => only.clone(),
        [first, rest @ ..] => format!("{} (+{} more)", first, rest.len()),
    }
}
