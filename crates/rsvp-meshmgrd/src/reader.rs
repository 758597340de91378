//! Device state reader
//!
//! Turns the raw JSON answers of the command API into typed entities.
//! Everything downstream works on [`DeviceState`] only.

use ipnetwork::Ipv4Network;
use once_cell::sync::Lazy;
use regex::Regex;
use rsvp_mesh_common::{CommandApi, MeshError, MeshResult};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::MeshConfig;
use crate::tables::{
    config_sections, prefix_list_fields, route_fields, show_ip_route, show_prefix_list,
    timeout_comment, SHOW_RUNNING_CONFIG,
};
use crate::types::{
    ExistingTunnel, FilterAction, PrefixListEntry, Protocol, Route, TunnelNamePattern,
};

/// Matches a grace period comment, e.g. `timeout: 1700000000`.
static TIMEOUT_COMMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^{}([0-9]+)\s*$", timeout_comment::LABEL))
        .expect("Invalid regex pattern")
});

/// Typed snapshot of everything a run needs from the device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceState {
    /// Statements of the LSP template, in device order.
    pub template: Vec<String>,
    /// Host routes of the selected protocol, in device order.
    pub routes: Vec<Route>,
    /// Entries of the selected prefix list, in device order.
    pub prefix_list: Vec<PrefixListEntry>,
    /// Mesh tunnels currently configured, in device order.
    pub tunnels: Vec<ExistingTunnel>,
}

/// Reads and parses the device state for one run.
///
/// Issues three requests: running configuration, route table, prefix list.
/// Any missing piece aborts the run before anything is written.
pub async fn read_device_state<A>(api: &A, config: &MeshConfig) -> MeshResult<DeviceState>
where
    A: CommandApi + ?Sized,
{
    let running_config = api.run_cmd(SHOW_RUNNING_CONFIG).await?;
    let route_table = api.run_cmd(&show_ip_route(config.protocol)).await?;
    let prefix_list = api.run_cmd(&show_prefix_list(&config.prefix_list)).await?;

    let pattern = TunnelNamePattern::new(&config.prefix)?;
    let rsvp = rsvp_section(&running_config);

    let template = parse_template(rsvp, &config.template)?;
    let routes = parse_routes(&route_table, config.protocol)?;
    let prefix_list = parse_prefix_list(&prefix_list, &config.prefix_list)?;
    let tunnels = rsvp.map(|s| parse_tunnels(s, &pattern)).unwrap_or_default();

    debug!(
        template = template.len(),
        routes = routes.len(),
        prefix_list = prefix_list.len(),
        tunnels = tunnels.len(),
        "Device state read"
    );

    Ok(DeviceState {
        template,
        routes,
        prefix_list,
        tunnels,
    })
}

/// Returns `section[name].cmds`, if present.
fn sub_cmds<'a>(section: &'a Map<String, Value>, name: &str) -> Option<&'a Map<String, Value>> {
    section
        .get(name)?
        .get(config_sections::CMDS)?
        .as_object()
}

/// Locates `router traffic-engineering › rsvp` in the running configuration.
pub fn rsvp_section(running_config: &Value) -> Option<&Map<String, Value>> {
    let root = running_config.get(config_sections::CMDS)?.as_object()?;
    let te = sub_cmds(root, config_sections::TRAFFIC_ENGINEERING)?;
    sub_cmds(te, config_sections::RSVP)
}

/// Extracts the statements of `tunnel <template>`.
pub fn parse_template(
    rsvp: Option<&Map<String, Value>>,
    template: &str,
) -> MeshResult<Vec<String>> {
    let key = format!("{}{}", config_sections::TUNNEL_KEY_PREFIX, template);
    let entry = rsvp
        .and_then(|section| section.get(&key))
        .ok_or_else(|| MeshError::missing_state("LSP template", template))?;

    Ok(entry
        .get(config_sections::CMDS)
        .and_then(Value::as_object)
        .map(|cmds| cmds.keys().cloned().collect())
        .unwrap_or_default())
}

/// Extracts the /32 routes of the default VRF.
///
/// Only keys carrying an explicit `/32` length are host routes.
pub fn parse_routes(route_table: &Value, protocol: Protocol) -> MeshResult<Vec<Route>> {
    let routes = route_table
        .get(route_fields::VRFS)
        .and_then(|vrfs| vrfs.get(route_fields::DEFAULT_VRF))
        .and_then(|vrf| vrf.get(route_fields::ROUTES))
        .and_then(Value::as_object)
        .ok_or_else(|| MeshError::missing_state("route table", protocol.as_str()))?;

    Ok(routes
        .keys()
        .filter(|key| key.split_once('/').map(|(_, len)| len) == Some("32"))
        .filter_map(|key| match key.parse::<Ipv4Network>() {
            Ok(net) => Some(Route::new(net.ip())),
            Err(e) => {
                debug!(route = %key, error = %e, "Skipping unparseable route");
                None
            }
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct RawPrefixEntry {
    #[serde(rename = "seqno", default)]
    seq: Option<u32>,
    #[serde(rename = "filterType")]
    filter_type: String,
    prefix: String,
}

#[derive(Debug, Error)]
enum EntryError {
    #[error("malformed entry: {0}")]
    Shape(#[from] serde_json::Error),
    #[error("invalid prefix '{0}'")]
    Prefix(String),
    #[error("{0}")]
    FilterType(String),
}

fn parse_entry(value: &Value) -> Result<PrefixListEntry, EntryError> {
    let raw = RawPrefixEntry::deserialize(value)?;
    let prefix: Ipv4Network = raw
        .prefix
        .parse()
        .map_err(|_| EntryError::Prefix(raw.prefix.clone()))?;
    let action: FilterAction = raw.filter_type.parse().map_err(EntryError::FilterType)?;

    let entry = PrefixListEntry::new(prefix, action);
    Ok(match raw.seq {
        Some(seq) => entry.with_seq(seq),
        None => entry,
    })
}

/// Extracts the entries of prefix list `name`, keeping device order.
pub fn parse_prefix_list(value: &Value, name: &str) -> MeshResult<Vec<PrefixListEntry>> {
    let entries = value
        .get(prefix_list_fields::PREFIX_LISTS)
        .and_then(|lists| lists.get(name))
        .ok_or_else(|| MeshError::missing_state("prefix-list", name))?
        .get(prefix_list_fields::ENTRIES)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    Ok(entries
        .iter()
        .filter_map(|raw| match parse_entry(raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(
                    prefix_list = %name,
                    seq = ?raw.get(prefix_list_fields::SEQNO),
                    error = %e,
                    "Skipping prefix-list entry"
                );
                None
            }
        })
        .collect())
}

/// Extracts the configured tunnels that belong to the mesh.
pub fn parse_tunnels(
    rsvp: &Map<String, Value>,
    pattern: &TunnelNamePattern,
) -> Vec<ExistingTunnel> {
    rsvp.iter()
        .filter_map(|(key, options)| {
            let raw = key.strip_prefix(config_sections::TUNNEL_KEY_PREFIX)?;
            let Some(name) = pattern.parse(raw) else {
                debug!(tunnel = %raw, "Ignoring tunnel outside the mesh");
                return None;
            };

            let comments = options
                .get(config_sections::COMMENTS)
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();

            let mut tunnel = ExistingTunnel::new(name);
            tunnel.other_comments = parse_other_comments(comments);
            Some(match parse_timeout_mark(comments) {
                Some(mark) => tunnel.with_timeout_mark(mark),
                None => tunnel,
            })
        })
        .collect()
}

/// Returns the comment lines that are not timeout marks.
pub fn parse_other_comments(comments: &[Value]) -> Vec<String> {
    comments
        .iter()
        .filter_map(Value::as_str)
        .filter(|line| !line.starts_with(timeout_comment::LABEL))
        .map(str::to_string)
        .collect()
}

/// Reads the grace period start from a tunnel's comment lines.
///
/// When several lines carry a mark, the last one wins.
pub fn parse_timeout_mark(comments: &[Value]) -> Option<i64> {
    comments
        .iter()
        .filter_map(Value::as_str)
        .filter(|line| line.starts_with(timeout_comment::LABEL))
        .filter_map(|line| {
            let mark = TIMEOUT_COMMENT_RE
                .captures(line)
                .and_then(|caps| caps[1].parse::<i64>().ok());
            if mark.is_none() {
                warn!(comment = %line, "Ignoring malformed timeout comment");
            }
            mark
        })
        .last()
}
