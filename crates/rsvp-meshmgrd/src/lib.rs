//! RSVP-TE Auto Tunnel Mesh Manager
//!
//! rsvp-meshmgrd keeps a mesh of RSVP-TE LSPs toward the /32 loopbacks
//! learned from ISIS or OSPF, handling:
//! - Route and prefix-list discovery through the device command API
//! - Prefix-list filtering of candidate destinations (first match wins)
//! - Creation of `count` parallel LSPs per destination from a template
//! - A grace period, recorded as a `timeout: <unix seconds>` tunnel
//!   comment, before tunnels toward vanished destinations are removed
//! - One atomic configuration transaction per run
//!
//! The device must have the eAPI HTTP server enabled (by default the
//! `localhost` endpoint on port 8080); the local unix socket is not used.
//!
//! The manager keeps no state of its own between runs. It is meant to be
//! started periodically by an external scheduler, and runs against the
//! same device must not overlap.

pub mod commands;
pub mod config;
pub mod emitter;
pub mod events;
pub mod filter;
pub mod mesh_mgr;
pub mod reader;
pub mod reconciler;
pub mod tables;
pub mod types;

pub use config::MeshConfig;
pub use events::{EventAction, EventSink, MemorySink, MeshEvent, TracingSink};
pub use mesh_mgr::{MeshMgr, RunSummary};
pub use reconciler::{reconcile, ConfigDelta, ReconcileStats, Reconciliation, TunnelOp};
pub use types::{ExistingTunnel, MeshParams, PrefixListEntry, Protocol, Route, TunnelName};
