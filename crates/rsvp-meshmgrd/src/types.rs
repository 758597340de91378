//! Tunnel mesh type definitions

use std::fmt;
use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;
use regex::Regex;
use rsvp_mesh_common::{MeshError, MeshResult};

/// Routing protocol whose host routes become tunnel destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Protocol {
    Isis,
    Ospf,
}

impl Protocol {
    /// Returns the protocol keyword used in show commands.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Isis => "isis",
            Protocol::Ospf => "ospf",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A /32 host route learned from the routing protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    pub address: Ipv4Addr,
}

impl Route {
    pub fn new(address: Ipv4Addr) -> Self {
        Self { address }
    }
}

/// Prefix-list entry action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    Permit,
    Deny,
}

impl std::str::FromStr for FilterAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "permit" => Ok(FilterAction::Permit),
            "deny" => Ok(FilterAction::Deny),
            other => Err(format!("Unknown filter type: {}", other)),
        }
    }
}

/// One rule of a prefix list. Position in the list decides precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixListEntry {
    /// Device sequence number, kept for logging only.
    pub seq: Option<u32>,
    pub prefix: Ipv4Network,
    pub action: FilterAction,
}

impl PrefixListEntry {
    pub fn new(prefix: Ipv4Network, action: FilterAction) -> Self {
        Self {
            seq: None,
            prefix,
            action,
        }
    }

    pub fn permit(prefix: Ipv4Network) -> Self {
        Self::new(prefix, FilterAction::Permit)
    }

    pub fn deny(prefix: Ipv4Network) -> Self {
        Self::new(prefix, FilterAction::Deny)
    }

    pub fn with_seq(mut self, seq: u32) -> Self {
        self.seq = Some(seq);
        self
    }

    /// CIDR containment: `(ip & mask) == (network & mask)`.
    ///
    /// A zero-length prefix matches every address.
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let mask = prefix_mask(self.prefix.prefix());
        (u32::from(ip) & mask) == (u32::from(self.prefix.ip()) & mask)
    }
}

/// Netmask for a prefix length in `[0, 32]`.
pub fn prefix_mask(prefix_len: u8) -> u32 {
    u32::MAX
        .checked_shl(32 - u32::from(prefix_len.min(32)))
        .unwrap_or(0)
}

/// Route that survived prefix-list filtering.
pub type Target = Route;

/// Name of one LSP of the mesh: `<prefix>-<target>-<index>`.
///
/// Names are fully determined by the run parameters, so the name alone
/// identifies which target and which parallel LSP a tunnel belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TunnelName(String);

impl TunnelName {
    /// Builds the canonical name for LSP `index` toward `target`.
    pub fn new(prefix: &str, target: Ipv4Addr, index: u32) -> Self {
        Self(format!("{}-{}-{}", prefix, target, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TunnelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Matcher for configured tunnel names of one mesh.
#[derive(Debug, Clone)]
pub struct TunnelNamePattern {
    re: Regex,
}

impl TunnelNamePattern {
    /// Compiles the pattern `<prefix>-<dotted quad>-<integer>`.
    pub fn new(prefix: &str) -> MeshResult<Self> {
        let pattern = format!(
            r"^{}-[0-9]+\.[0-9]+\.[0-9]+\.[0-9]+-[0-9]+$",
            regex::escape(prefix)
        );
        let re = Regex::new(&pattern)
            .map_err(|e| MeshError::invalid_config("prefix", e.to_string()))?;
        Ok(Self { re })
    }

    /// Accepts a configured tunnel name if it follows the naming convention.
    pub fn parse(&self, name: &str) -> Option<TunnelName> {
        self.re
            .is_match(name)
            .then(|| TunnelName(name.to_string()))
    }
}

/// A mesh tunnel present in the running configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingTunnel {
    pub name: TunnelName,
    /// Unix time at which the tunnel was first seen as no longer needed.
    pub timeout_mark: Option<i64>,
    /// Comment lines other than the timeout mark, in device order.
    pub other_comments: Vec<String>,
}

impl ExistingTunnel {
    pub fn new(name: TunnelName) -> Self {
        Self {
            name,
            timeout_mark: None,
            other_comments: Vec::new(),
        }
    }

    pub fn with_timeout_mark(mut self, mark: i64) -> Self {
        self.timeout_mark = Some(mark);
        self
    }

    pub fn with_comment(mut self, line: impl Into<String>) -> Self {
        self.other_comments.push(line.into());
        self
    }

    pub fn is_marked(&self) -> bool {
        self.timeout_mark.is_some()
    }
}

/// Parameters of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshParams {
    /// Tunnel name prefix.
    pub prefix: String,
    /// Parallel LSPs per target.
    pub count: u32,
    /// Grace period before an unneeded tunnel is removed, in minutes.
    pub timeout_minutes: u64,
    /// Statements replayed into every new tunnel.
    pub template: Vec<String>,
}

impl MeshParams {
    pub fn new(prefix: impl Into<String>, count: u32, timeout_minutes: u64) -> Self {
        Self {
            prefix: prefix.into(),
            count,
            timeout_minutes,
            template: Vec::new(),
        }
    }

    pub fn with_template(mut self, template: Vec<String>) -> Self {
        self.template = template;
        self
    }

    /// Grace period in seconds.
    pub fn timeout_secs(&self) -> i64 {
        i64::try_from(self.timeout_minutes.saturating_mul(60)).unwrap_or(i64::MAX)
    }
}
