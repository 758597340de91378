//! Command strings and response keys for rsvp-meshmgrd

use crate::types::Protocol;

// Show commands
pub const SHOW_RUNNING_CONFIG: &str = "show running-config";

pub fn show_ip_route(protocol: Protocol) -> String {
    format!("show ip route {}", protocol)
}

pub fn show_prefix_list(name: &str) -> String {
    format!("show ip prefix-list {}", name)
}

/// Running-config sections leading to the RSVP tunnels
pub mod config_sections {
    pub const CMDS: &str = "cmds";
    pub const COMMENTS: &str = "comments";
    pub const TRAFFIC_ENGINEERING: &str = "router traffic-engineering";
    pub const RSVP: &str = "rsvp";
    pub const TUNNEL_KEY_PREFIX: &str = "tunnel ";
}

/// `show ip route <protocol>` fields
pub mod route_fields {
    pub const VRFS: &str = "vrfs";
    pub const DEFAULT_VRF: &str = "default";
    pub const ROUTES: &str = "routes";
}

/// `show ip prefix-list <name>` fields
pub mod prefix_list_fields {
    pub const PREFIX_LISTS: &str = "ipPrefixLists";
    pub const ENTRIES: &str = "ipPrefixEntries";
    pub const SEQNO: &str = "seqno";
}

/// Comment marking a tunnel whose grace period has started
pub mod timeout_comment {
    pub const LABEL: &str = "timeout: ";
}
