//! Test fixtures for common mesh scenarios
//!
//! Provides reusable device setups for manager testing

use serde_json::{json, Value};

use crate::device::{SimulatedDevice, TunnelConfig};

/// Name of the template tunnel used by the fixtures
pub const TEMPLATE_NAME: &str = "AUTOMESH-TEMPLATE";

/// Name of the prefix list used by the fixtures
pub const PREFIX_LIST_NAME: &str = "LOOPBACKS";

/// Tunnel name prefix used by the fixtures
pub const MESH_PREFIX: &str = "LSP";

/// Statements of the fixture template, in configuration order
pub fn template_cmds() -> Vec<String> {
    vec![
        "path-selection dynamic".to_string(),
        "priority setup 5 hold 5".to_string(),
        "bandwidth auto".to_string(),
    ]
}

/// One raw `show ip prefix-list` entry
pub fn prefix_entry(seq: u32, action: &str, prefix: &str) -> Value {
    json!({"seqno": seq, "filterType": action, "prefix": prefix})
}

/// A permit-everything prefix list
pub fn permit_all() -> Vec<Value> {
    vec![prefix_entry(10, "permit", "0.0.0.0/0")]
}

/// Device with the fixture template and prefix list, and the given
/// host routes for `protocol`
pub fn mesh_device(protocol: &str, routes: &[&str], prefix_list: Vec<Value>) -> SimulatedDevice {
    SimulatedDevice::new()
        .with_tunnel(TEMPLATE_NAME, TunnelConfig::new(template_cmds()))
        .with_routes(protocol, routes)
        .with_prefix_list(PREFIX_LIST_NAME, prefix_list)
}

/// Configuration of a mesh tunnel as the manager creates it
pub fn mesh_tunnel(target: &str) -> TunnelConfig {
    let mut cmds = template_cmds();
    cmds.push(format!("destination ip {}", target));
    cmds.push("no shutdown".to_string());
    TunnelConfig::new(cmds)
}

/// Configuration of a mesh tunnel whose grace period started at `mark`
pub fn marked_mesh_tunnel(target: &str, mark: i64) -> TunnelConfig {
    mesh_tunnel(target).with_comment(format!("timeout: {}", mark))
}

/// Name of LSP `index` toward `target`, with the fixture prefix
pub fn mesh_name(target: &str, index: u32) -> String {
    format!("{}-{}-{}", MESH_PREFIX, target, index)
}
