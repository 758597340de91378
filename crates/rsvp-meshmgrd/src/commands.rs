//! Configuration statement builders for mesh tunnel operations

use std::net::Ipv4Addr;

use crate::tables::{config_sections, timeout_comment};
use crate::types::TunnelName;

/// Statements entering the RSVP configuration context
pub const ENTER_RSVP_CONTEXT: [&str; 3] = [
    "configure",
    config_sections::TRAFFIC_ENGINEERING,
    config_sections::RSVP,
];

/// Statements leaving configuration mode and saving the result
pub const EXIT_AND_PERSIST: [&str; 2] = ["end", "write"];

/// Build tunnel submode entry statement
pub fn build_enter_tunnel_cmd(name: &TunnelName) -> String {
    format!("{}{}", config_sections::TUNNEL_KEY_PREFIX, name)
}

/// Build tunnel submode exit statement
pub fn build_exit_cmd() -> String {
    "exit".to_string()
}

/// Build tunnel destination statement
pub fn build_destination_cmd(target: Ipv4Addr) -> String {
    format!("destination ip {}", target)
}

/// Build tunnel enable statement
pub fn build_no_shutdown_cmd() -> String {
    "no shutdown".to_string()
}

/// Build a statement appending one comment line to the current block
pub fn build_comment_cmd(line: &str) -> String {
    format!("!! {}", line)
}

/// Build the comment line recording the start of the grace period
pub fn build_set_timeout_cmd(now: i64) -> String {
    build_comment_cmd(&format!("{}{}", timeout_comment::LABEL, now))
}

/// Build the statement removing all comment lines of the current block
pub fn build_clear_comment_cmd() -> String {
    "no comment".to_string()
}

/// Build tunnel deletion statement
pub fn build_del_tunnel_cmd(name: &TunnelName) -> String {
    format!("no {}{}", config_sections::TUNNEL_KEY_PREFIX, name)
}

/// Build the full statement block creating a tunnel from the template
pub fn build_create_tunnel_cmds(
    name: &TunnelName,
    template: &[String],
    target: Ipv4Addr,
) -> Vec<String> {
    let mut cmds = Vec::with_capacity(template.len() + 4);
    cmds.push(build_enter_tunnel_cmd(name));
    cmds.extend(template.iter().cloned());
    cmds.push(build_destination_cmd(target));
    cmds.push(build_no_shutdown_cmd());
    cmds.push(build_exit_cmd());
    cmds
}
