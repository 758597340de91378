//! Prefix-list filtering of candidate routes

use tracing::trace;

use crate::types::{FilterAction, PrefixListEntry, Route, Target};

/// Applies a prefix list to a set of routes.
///
/// Entries are evaluated in list order. Each entry partitions the routes
/// that no earlier entry has classified: permitted routes become targets,
/// denied routes are dropped, the rest move on to the next entry. Routes
/// that no entry matches are dropped as well.
pub fn filter(routes: &[Route], entries: &[PrefixListEntry]) -> Vec<Target> {
    let mut targets = Vec::new();
    let mut remaining = routes.to_vec();

    for entry in entries {
        if remaining.is_empty() {
            break;
        }

        let (matched, rest): (Vec<Route>, Vec<Route>) = remaining
            .into_iter()
            .partition(|route| entry.contains(route.address));

        trace!(
            seq = ?entry.seq,
            prefix = %entry.prefix,
            action = ?entry.action,
            matched = matched.len(),
            "Prefix-list entry applied"
        );

        if entry.action == FilterAction::Permit {
            for route in matched {
                if !targets.contains(&route) {
                    targets.push(route);
                }
            }
        }
        remaining = rest;
    }

    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;

    fn route(s: &str) -> Route {
        Route::new(s.parse::<Ipv4Addr>().unwrap())
    }

    fn permit(s: &str) -> PrefixListEntry {
        PrefixListEntry::permit(s.parse().unwrap())
    }

    fn deny(s: &str) -> PrefixListEntry {
        PrefixListEntry::deny(s.parse().unwrap())
    }

    #[test]
    fn test_first_match_wins() {
        let routes = vec![route("10.1.2.3")];
        let entries = vec![deny("10.0.0.0/8"), permit("10.1.0.0/16")];
        assert!(filter(&routes, &entries).is_empty());
    }

    #[test]
    fn test_permit_before_deny() {
        let routes = vec![route("10.1.2.3")];
        let entries = vec![permit("10.1.0.0/16"), deny("10.0.0.0/8")];
        assert_eq!(filter(&routes, &entries), vec![route("10.1.2.3")]);
    }

    #[test]
    fn test_unmatched_routes_dropped() {
        let routes = vec![route("192.0.2.1"), route("10.0.0.1")];
        let entries = vec![permit("10.0.0.0/8")];
        assert_eq!(filter(&routes, &entries), vec![route("10.0.0.1")]);
    }

    #[test]
    fn test_empty_prefix_list_drops_everything() {
        let routes = vec![route("10.0.0.1"), route("10.0.0.2")];
        assert!(filter(&routes, &[]).is_empty());
    }

    #[test]
    fn test_match_all_prefix() {
        let routes = vec![route("10.0.0.1"), route("172.16.0.1"), route("192.0.2.1")];
        let entries = vec![deny("172.16.0.0/12"), permit("0.0.0.0/0")];
        assert_eq!(
            filter(&routes, &entries),
            vec![route("10.0.0.1"), route("192.0.2.1")]
        );
    }

    #[test]
    fn test_target_order_follows_entries_then_routes() {
        let routes = vec![
            route("10.0.0.2"),
            route("192.168.0.1"),
            route("10.0.0.1"),
            route("192.168.0.2"),
        ];
        let entries = vec![permit("192.168.0.0/16"), permit("10.0.0.0/8")];
        assert_eq!(
            filter(&routes, &entries),
            vec![
                route("192.168.0.1"),
                route("192.168.0.2"),
                route("10.0.0.2"),
                route("10.0.0.1"),
            ]
        );
    }

    #[test]
    fn test_duplicate_routes_yield_one_target() {
        let routes = vec![route("10.0.0.1"), route("10.0.0.1")];
        let entries = vec![permit("10.0.0.0/8")];
        assert_eq!(filter(&routes, &entries), vec![route("10.0.0.1")]);
    }

    #[test]
    fn test_host_entry() {
        let routes = vec![route("10.0.0.1"), route("10.0.0.2")];
        let entries = vec![deny("10.0.0.1/32"), permit("10.0.0.0/24")];
        assert_eq!(filter(&routes, &entries), vec![route("10.0.0.2")]);
    }
}
