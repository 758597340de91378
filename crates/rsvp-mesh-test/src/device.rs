//! Simulated device for end-to-end tests
//!
//! Answers the show commands the manager issues and applies configuration
//! transactions to an in-memory model of the RSVP tunnel section. A
//! transaction is applied to a copy of the model and committed only if
//! every statement was accepted, mirroring the all-or-nothing behavior of
//! the real command API.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rsvp_mesh_common::{CommandApi, MeshError, MeshResult};
use serde_json::{json, Map, Value};
use tracing::debug;

/// JSON-RPC error code returned for rejected commands
pub const INVALID_COMMAND: i64 = 1002;

/// Configuration of one RSVP tunnel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TunnelConfig {
    pub cmds: Vec<String>,
    pub comments: Vec<String>,
}

impl TunnelConfig {
    pub fn new<I, S>(cmds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cmds: cmds.into_iter().map(Into::into).collect(),
            comments: Vec::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }

    fn add_cmd(&mut self, cmd: &str) {
        if !self.cmds.iter().any(|c| c == cmd) {
            self.cmds.push(cmd.to_string());
        }
    }
}

#[derive(Debug, Clone, Default)]
struct DeviceModel {
    rsvp_present: bool,
    tunnels: Vec<(String, TunnelConfig)>,
    routes: HashMap<String, Vec<String>>,
    prefix_lists: HashMap<String, Vec<Value>>,
    saves: usize,
}

impl DeviceModel {
    fn tunnel_mut(&mut self, name: &str) -> &mut TunnelConfig {
        let pos = match self.tunnels.iter().position(|(n, _)| n == name) {
            Some(pos) => pos,
            None => {
                self.tunnels.push((name.to_string(), TunnelConfig::default()));
                self.tunnels.len() - 1
            }
        };
        &mut self.tunnels[pos].1
    }

    fn remove_tunnel(&mut self, name: &str) -> bool {
        let before = self.tunnels.len();
        self.tunnels.retain(|(n, _)| n != name);
        self.tunnels.len() != before
    }

    fn running_config(&self) -> Value {
        let mut root = Map::new();
        if self.rsvp_present {
            let mut tunnels = Map::new();
            for (name, tunnel) in &self.tunnels {
                let cmds: Map<String, Value> = tunnel
                    .cmds
                    .iter()
                    .map(|c| (c.clone(), Value::Null))
                    .collect();
                tunnels.insert(
                    format!("tunnel {}", name),
                    json!({"cmds": cmds, "comments": tunnel.comments}),
                );
            }
            root.insert(
                "router traffic-engineering".to_string(),
                json!({
                    "cmds": {"rsvp": {"cmds": tunnels, "comments": []}},
                    "comments": []
                }),
            );
        }
        json!({"cmds": root, "comments": []})
    }

    fn route_table(&self, protocol: &str) -> Value {
        match self.routes.get(protocol) {
            Some(routes) => {
                let routes: Map<String, Value> = routes
                    .iter()
                    .map(|r| (r.clone(), json!({"routeType": protocol})))
                    .collect();
                json!({"vrfs": {"default": {"routes": routes}}})
            }
            None => json!({"vrfs": {}}),
        }
    }

    fn prefix_list(&self, name: &str) -> Value {
        match self.prefix_lists.get(name) {
            Some(entries) => json!({"ipPrefixLists": {name: {"ipPrefixEntries": entries}}}),
            None => json!({"ipPrefixLists": {}}),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Exec,
    Config,
    TrafficEngineering,
    Rsvp,
    Tunnel(String),
}

fn rejected(cmd: &str) -> MeshError {
    MeshError::Api {
        code: INVALID_COMMAND,
        message: format!("CLI command failed: invalid command '{}'", cmd),
    }
}

/// Applies configuration statements to `model`.
fn apply(model: &mut DeviceModel, cmds: &[String]) -> MeshResult<()> {
    let mut mode = Mode::Exec;

    for cmd in cmds {
        let cmd = cmd.as_str();
        mode = match (&mode, cmd) {
            (_, "end") => Mode::Exec,
            (Mode::Exec, "configure") => Mode::Config,
            (Mode::Exec, "write") => {
                model.saves += 1;
                Mode::Exec
            }
            (Mode::Config, "router traffic-engineering") => Mode::TrafficEngineering,
            (Mode::TrafficEngineering, "rsvp") => {
                model.rsvp_present = true;
                Mode::Rsvp
            }
            (Mode::Rsvp | Mode::Tunnel(_), _) if cmd.starts_with("tunnel ") => {
                let name = &cmd["tunnel ".len()..];
                model.tunnel_mut(name);
                Mode::Tunnel(name.to_string())
            }
            (Mode::Rsvp | Mode::Tunnel(_), _) if cmd.starts_with("no tunnel ") => {
                let name = &cmd["no tunnel ".len()..];
                if !model.remove_tunnel(name) {
                    return Err(rejected(cmd));
                }
                Mode::Rsvp
            }
            (Mode::Tunnel(_), "exit") => Mode::Rsvp,
            (Mode::Tunnel(name), _) => {
                let tunnel = model.tunnel_mut(name);
                if let Some(comment) = cmd.strip_prefix("!! ") {
                    tunnel.comments.push(comment.to_string());
                } else if cmd == "no comment" {
                    tunnel.comments.clear();
                } else {
                    tunnel.add_cmd(cmd);
                }
                mode.clone()
            }
            _ => return Err(rejected(cmd)),
        };
    }

    Ok(())
}

/// In-memory device implementing [`CommandApi`]
#[derive(Debug, Default)]
pub struct SimulatedDevice {
    model: Mutex<DeviceModel>,
    requests: Mutex<Vec<Vec<String>>>,
    fail_writes: bool,
}

impl SimulatedDevice {
    /// Create a device with an empty RSVP section and nothing else
    pub fn new() -> Self {
        let device = Self::default();
        device.lock_model().rsvp_present = true;
        device
    }

    /// Remove the traffic-engineering section from the running configuration
    pub fn without_rsvp(self) -> Self {
        self.lock_model().rsvp_present = false;
        self
    }

    /// Add a tunnel to the RSVP section (builder pattern)
    pub fn with_tunnel(self, name: &str, config: TunnelConfig) -> Self {
        *self.lock_model().tunnel_mut(name) = config;
        self
    }

    /// Set the host routes of a protocol (builder pattern)
    pub fn with_routes(self, protocol: &str, routes: &[&str]) -> Self {
        self.lock_model().routes.insert(
            protocol.to_string(),
            routes.iter().map(|r| r.to_string()).collect(),
        );
        self
    }

    /// Define a prefix list from raw entries (builder pattern)
    pub fn with_prefix_list(self, name: &str, entries: Vec<Value>) -> Self {
        self.lock_model()
            .prefix_lists
            .insert(name.to_string(), entries);
        self
    }

    /// Reject every configuration transaction (builder pattern)
    pub fn with_failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Replace the routes of a protocol between runs
    pub fn set_routes(&self, protocol: &str, routes: &[&str]) {
        self.lock_model().routes.insert(
            protocol.to_string(),
            routes.iter().map(|r| r.to_string()).collect(),
        );
    }

    /// Returns the configuration of a tunnel, if present
    pub fn tunnel(&self, name: &str) -> Option<TunnelConfig> {
        self.lock_model()
            .tunnels
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.clone())
    }

    /// Returns all configured tunnel names in order
    pub fn tunnel_names(&self) -> Vec<String> {
        self.lock_model()
            .tunnels
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Returns every request received, in order
    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Returns the configuration transactions received, in order
    pub fn transactions(&self) -> Vec<Vec<String>> {
        self.requests()
            .into_iter()
            .filter(|r| is_transaction(r))
            .collect()
    }

    /// Returns how many times the configuration was saved
    pub fn saves(&self) -> usize {
        self.lock_model().saves
    }

    fn lock_model(&self) -> std::sync::MutexGuard<'_, DeviceModel> {
        // A poisoned model only happens after a panicking test thread.
        self.model.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn show(&self, cmd: &str) -> MeshResult<Value> {
        let model = self.lock_model();
        if cmd == "show running-config" {
            Ok(model.running_config())
        } else if let Some(protocol) = cmd.strip_prefix("show ip route ") {
            Ok(model.route_table(protocol))
        } else if let Some(name) = cmd.strip_prefix("show ip prefix-list ") {
            Ok(model.prefix_list(name))
        } else {
            Err(rejected(cmd))
        }
    }
}

fn is_transaction(cmds: &[String]) -> bool {
    cmds.first().map(String::as_str) == Some("configure")
}

#[async_trait]
impl CommandApi for SimulatedDevice {
    async fn run_cmds(&self, _level: u32, cmds: &[String]) -> MeshResult<Vec<Value>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(cmds.to_vec());
        }

        if is_transaction(cmds) {
            if self.fail_writes {
                return Err(MeshError::transport("send", "connection reset by peer"));
            }
            let mut model = self.lock_model();
            let mut staged = model.clone();
            apply(&mut staged, cmds)?;
            *model = staged;
            debug!(statements = cmds.len(), "Simulated device committed transaction");
            return Ok(vec![json!({}); cmds.len()]);
        }

        cmds.iter().map(|cmd| self.show(cmd)).collect()
    }
}
