//! rsvp-meshmgrd - RSVP-TE auto tunnel mesh manager
//!
//! Performs a single reconciliation pass and exits. Schedule it
//! periodically (cron, systemd timer) and make sure runs never overlap.
//!
//! The device is reached through the eAPI JSON-RPC endpoint over HTTP(S),
//! `http://localhost:8080/command-api` unless `MESH_EAPI_URL` says
//! otherwise. The local unix socket is not supported, so the device must
//! run the eAPI HTTP server, e.g.:
//!
//! ```text
//! management http-server
//!    protocol http localhost
//! management api http-commands
//!    no shutdown
//! ```
//!
//! `MESH_EAPI_USERNAME` / `MESH_EAPI_PASSWORD` enable basic auth and
//! `MESH_EAPI_TIMEOUT_SECS` bounds each request.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use rsvp_mesh_common::{ApiConfig, EapiClient, MeshError};
use rsvp_meshmgrd::{MeshConfig, MeshMgr, RunSummary};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exit status for device or operator configuration errors
const EXIT_CONFIG_ERROR: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = MeshConfig::parse();

    init_logging();

    info!("--- Starting rsvp-meshmgrd ---");

    match run(config).await {
        Ok(summary) => {
            info!(
                targets = summary.targets,
                applied = summary.applied,
                "rsvp-meshmgrd run complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("rsvp-meshmgrd run failed: {:#}", e);
            let config_error = e
                .downcast_ref::<MeshError>()
                .is_some_and(MeshError::is_config_error);
            if config_error {
                ExitCode::from(EXIT_CONFIG_ERROR)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(config: MeshConfig) -> anyhow::Result<RunSummary> {
    let api_config = ApiConfig::from_env()?;
    info!(url = %api_config.url, "Using command API");

    let api = EapiClient::new(api_config)?;
    let mgr = MeshMgr::new(api, config);

    let now = chrono::Utc::now().timestamp();
    let summary = mgr
        .run(now)
        .await
        .context("tunnel mesh reconciliation")?;
    Ok(summary)
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();
}
