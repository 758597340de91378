//! Common infrastructure for the RSVP-TE auto tunnel mesh manager.
//!
//! - [`error`]: Error taxonomy for a reconciliation run
//! - [`api`]: The [`CommandApi`] request/response interface to the device
//! - [`eapi`]: JSON-RPC over HTTP implementation of [`CommandApi`]
//! - [`config`]: Transport configuration loaded from the environment
//!
//! Only `http://` and `https://` endpoints are supported. On the device this
//! requires the eAPI HTTP server (`management api http-commands`), typically
//! bound to localhost; the `unix:` command API socket is not reachable
//! through this client.
//!
//! # Example
//!
//! ```ignore
//! use rsvp_mesh_common::{ApiConfig, CommandApi, EapiClient, MeshResult};
//!
//! async fn show_version() -> MeshResult<serde_json::Value> {
//!     let api = EapiClient::new(ApiConfig::from_env()?)?;
//!     api.run_cmd("show version").await
//! }
//! ```

pub mod api;
pub mod config;
pub mod eapi;
pub mod error;

// Re-export commonly used items at crate root
pub use api::{CommandApi, API_LEVEL};
pub use config::{ApiConfig, Credentials};
pub use eapi::EapiClient;
pub use error::{MeshError, MeshResult};
