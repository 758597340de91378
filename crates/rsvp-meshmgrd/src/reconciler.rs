//! Tunnel mesh reconciliation
//!
//! Compares the desired mesh (targets × parallel LSP index) with the mesh
//! tunnels present on the device and decides, per tunnel, which lifecycle
//! operation to apply:
//!
//! | Desired | Exists | Timeout mark      | Operation   |
//! |---------|--------|-------------------|-------------|
//! | yes     | no     | -                 | create      |
//! | yes     | yes    | present           | clear mark  |
//! | yes     | yes    | absent            | none        |
//! | no      | yes    | absent            | set mark    |
//! | no      | yes    | older than timeout| delete      |
//! | no      | yes    | within timeout    | none        |
//!
//! The reconciler only manages existence and the grace period. It never
//! compares the contents of a tunnel that already exists with the template.

use std::collections::{HashMap, HashSet};
use std::net::Ipv4Addr;

use crate::commands::{
    build_clear_comment_cmd, build_comment_cmd, build_create_tunnel_cmds, build_del_tunnel_cmd,
    build_enter_tunnel_cmd, build_exit_cmd, build_set_timeout_cmd,
};
use crate::events::{EventAction, MeshEvent};
use crate::types::{ExistingTunnel, MeshParams, Target, TunnelName};

/// One configuration change decided by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TunnelOp {
    /// Create the tunnel from the template toward `target`.
    Create { name: TunnelName, target: Ipv4Addr },
    /// Remove the timeout mark of a tunnel that is needed again.
    ///
    /// Comments can only be removed all at once, so the other comment
    /// lines of the tunnel are written back afterwards.
    ClearMark {
        name: TunnelName,
        kept_comments: Vec<String>,
    },
    /// Start the grace period of a tunnel that is no longer needed.
    SetMark { name: TunnelName, at: i64 },
    /// Remove a tunnel whose grace period has elapsed.
    Delete { name: TunnelName },
}

impl TunnelOp {
    pub fn name(&self) -> &TunnelName {
        match self {
            TunnelOp::Create { name, .. }
            | TunnelOp::ClearMark { name, .. }
            | TunnelOp::SetMark { name, .. }
            | TunnelOp::Delete { name } => name,
        }
    }

    pub fn event_action(&self) -> EventAction {
        match self {
            TunnelOp::Create { .. } => EventAction::Created,
            TunnelOp::ClearMark { .. } => EventAction::TimeoutCleared,
            TunnelOp::SetMark { .. } => EventAction::TimeoutStarted,
            TunnelOp::Delete { .. } => EventAction::Removed,
        }
    }

    pub fn event(&self) -> MeshEvent {
        MeshEvent::new(self.name().clone(), self.event_action())
    }

    /// Renders the operation as statements of the RSVP context.
    pub fn statements(&self, template: &[String]) -> Vec<String> {
        match self {
            TunnelOp::Create { name, target } => build_create_tunnel_cmds(name, template, *target),
            TunnelOp::ClearMark {
                name,
                kept_comments,
            } => {
                let mut cmds = Vec::with_capacity(kept_comments.len() + 3);
                cmds.push(build_enter_tunnel_cmd(name));
                cmds.push(build_clear_comment_cmd());
                cmds.extend(kept_comments.iter().map(|line| build_comment_cmd(line)));
                cmds.push(build_exit_cmd());
                cmds
            }
            TunnelOp::SetMark { name, at } => vec![
                build_enter_tunnel_cmd(name),
                build_set_timeout_cmd(*at),
                build_exit_cmd(),
            ],
            TunnelOp::Delete { name } => vec![build_del_tunnel_cmd(name)],
        }
    }
}

/// Ordered configuration changes of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDelta {
    template: Vec<String>,
    ops: Vec<TunnelOp>,
}

impl ConfigDelta {
    pub fn new(template: Vec<String>) -> Self {
        Self {
            template,
            ops: Vec::new(),
        }
    }

    pub fn push(&mut self, op: TunnelOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[TunnelOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Renders every operation, in order, as RSVP context statements.
    pub fn statements(&self) -> Vec<String> {
        self.ops
            .iter()
            .flat_map(|op| op.statements(&self.template))
            .collect()
    }
}

/// Per-run tunnel counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub desired: usize,
    pub created: usize,
    pub cleared: usize,
    pub unchanged: usize,
    pub marked: usize,
    pub removed: usize,
    /// Unneeded tunnels still inside their grace period.
    pub waiting: usize,
}

/// Outcome of a reconciliation: the delta plus one event per operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub delta: ConfigDelta,
    pub events: Vec<MeshEvent>,
    pub stats: ReconcileStats,
}

impl Reconciliation {
    fn apply(&mut self, op: TunnelOp) {
        match op {
            TunnelOp::Create { .. } => self.stats.created += 1,
            TunnelOp::ClearMark { .. } => self.stats.cleared += 1,
            TunnelOp::SetMark { .. } => self.stats.marked += 1,
            TunnelOp::Delete { .. } => self.stats.removed += 1,
        }
        self.events.push(op.event());
        self.delta.push(op);
    }
}

/// Computes the configuration delta converging the device toward the
/// desired mesh.
///
/// Pure function of its inputs: the same targets, tunnels, parameters and
/// `now` always yield the same result. Operations for desired tunnels come
/// first (target order, then LSP index), followed by operations for
/// unneeded tunnels (device order).
pub fn reconcile(
    targets: &[Target],
    existing: &[ExistingTunnel],
    params: &MeshParams,
    now: i64,
) -> Reconciliation {
    let mut result = Reconciliation {
        delta: ConfigDelta::new(params.template.clone()),
        ..Default::default()
    };

    let by_name: HashMap<&TunnelName, &ExistingTunnel> =
        existing.iter().map(|t| (&t.name, t)).collect();
    let mut desired: HashSet<TunnelName> = HashSet::new();

    for target in targets {
        for index in 0..params.count {
            let name = TunnelName::new(&params.prefix, target.address, index);
            if !desired.insert(name.clone()) {
                continue;
            }

            match by_name.get(&name) {
                Some(tunnel) if tunnel.is_marked() => {
                    result.apply(TunnelOp::ClearMark {
                        name,
                        kept_comments: tunnel.other_comments.clone(),
                    });
                }
                Some(_) => result.stats.unchanged += 1,
                None => result.apply(TunnelOp::Create {
                    name,
                    target: target.address,
                }),
            }
        }
    }
    result.stats.desired = desired.len();

    let grace = params.timeout_secs();
    for tunnel in existing.iter().filter(|t| !desired.contains(&t.name)) {
        match tunnel.timeout_mark {
            None => result.apply(TunnelOp::SetMark {
                name: tunnel.name.clone(),
                at: now,
            }),
            Some(mark) if now.saturating_sub(mark) > grace => {
                result.apply(TunnelOp::Delete {
                    name: tunnel.name.clone(),
                });
            }
            Some(_) => result.stats.waiting += 1,
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Route;
    use pretty_assertions::assert_eq;

    const NOW: i64 = 1_700_000_000;

    fn target(s: &str) -> Target {
        Route::new(s.parse().unwrap())
    }

    fn name(addr: &str, index: u32) -> TunnelName {
        TunnelName::new("LSP", addr.parse().unwrap(), index)
    }

    fn params(count: u32, timeout_minutes: u64) -> MeshParams {
        MeshParams::new("LSP", count, timeout_minutes)
            .with_template(vec!["path-selection dynamic".to_string()])
    }

    #[test]
    fn test_create_parallel_lsps() {
        let result = reconcile(&[target("1.2.3.4")], &[], &params(2, 60), NOW);

        assert_eq!(
            result.delta.ops(),
            &[
                TunnelOp::Create {
                    name: name("1.2.3.4", 0),
                    target: "1.2.3.4".parse().unwrap(),
                },
                TunnelOp::Create {
                    name: name("1.2.3.4", 1),
                    target: "1.2.3.4".parse().unwrap(),
                },
            ]
        );
        assert_eq!(
            result.delta.statements(),
            vec![
                "tunnel LSP-1.2.3.4-0",
                "path-selection dynamic",
                "destination ip 1.2.3.4",
                "no shutdown",
                "exit",
                "tunnel LSP-1.2.3.4-1",
                "path-selection dynamic",
                "destination ip 1.2.3.4",
                "no shutdown",
                "exit",
            ]
        );
        assert_eq!(result.stats.created, 2);
        assert_eq!(result.stats.desired, 2);
    }

    #[test]
    fn test_existing_unmarked_tunnel_untouched() {
        let existing = vec![ExistingTunnel::new(name("1.2.3.4", 0))];
        let result = reconcile(&[target("1.2.3.4")], &existing, &params(1, 60), NOW);

        assert!(result.delta.is_empty());
        assert!(result.events.is_empty());
        assert_eq!(result.stats.unchanged, 1);
    }

    #[test]
    fn test_resurrection_clears_mark() {
        let existing = vec![ExistingTunnel::new(name("1.2.3.4", 0)).with_timeout_mark(NOW - 10)];
        let result = reconcile(&[target("1.2.3.4")], &existing, &params(1, 60), NOW);

        assert_eq!(
            result.delta.ops(),
            &[TunnelOp::ClearMark {
                name: name("1.2.3.4", 0),
                kept_comments: vec![],
            }]
        );
        assert_eq!(
            result.delta.statements(),
            vec!["tunnel LSP-1.2.3.4-0", "no comment", "exit"]
        );
        assert_eq!(
            result.events,
            vec![MeshEvent::new(name("1.2.3.4", 0), EventAction::TimeoutCleared)]
        );
    }

    #[test]
    fn test_clear_mark_keeps_other_comments() {
        let existing = vec![ExistingTunnel::new(name("1.2.3.4", 0))
            .with_comment("owner: noc-team ticket 42")
            .with_timeout_mark(NOW - 1000)];
        let result = reconcile(&[target("1.2.3.4")], &existing, &params(1, 60), NOW);

        assert_eq!(
            result.delta.statements(),
            vec![
                "tunnel LSP-1.2.3.4-0",
                "no comment",
                "!! owner: noc-team ticket 42",
                "exit",
            ]
        );
        assert_eq!(result.stats.cleared, 1);
    }

    #[test]
    fn test_resurrection_even_after_grace_period() {
        // A desired tunnel is never deleted, however old its mark.
        let existing = vec![ExistingTunnel::new(name("1.2.3.4", 0)).with_timeout_mark(NOW - 999_999)];
        let result = reconcile(&[target("1.2.3.4")], &existing, &params(1, 1), NOW);
        assert_eq!(
            result.delta.ops(),
            &[TunnelOp::ClearMark {
                name: name("1.2.3.4", 0),
                kept_comments: vec![],
            }]
        );
    }

    #[test]
    fn test_orphan_starts_timeout() {
        let existing = vec![ExistingTunnel::new(name("9.9.9.9", 0))];
        let result = reconcile(&[], &existing, &params(1, 60), NOW);

        assert_eq!(
            result.delta.ops(),
            &[TunnelOp::SetMark {
                name: name("9.9.9.9", 0),
                at: NOW,
            }]
        );
        assert_eq!(
            result.delta.statements(),
            vec!["tunnel LSP-9.9.9.9-0", "!! timeout: 1700000000", "exit"]
        );
        assert_eq!(
            result.events,
            vec![MeshEvent::new(name("9.9.9.9", 0), EventAction::TimeoutStarted)]
        );
    }

    #[test]
    fn test_orphan_deleted_after_timeout() {
        let existing = vec![ExistingTunnel::new(name("9.9.9.9", 0)).with_timeout_mark(NOW - 3601)];
        let result = reconcile(&[], &existing, &params(1, 60), NOW);

        assert_eq!(
            result.delta.ops(),
            &[TunnelOp::Delete {
                name: name("9.9.9.9", 0)
            }]
        );
        assert_eq!(result.delta.statements(), vec!["no tunnel LSP-9.9.9.9-0"]);
        assert_eq!(
            result.events[0].to_string(),
            "RSVP auto-tunnel-mesh: tunnel LSP-9.9.9.9-0 removed (timeout)"
        );
    }

    #[test]
    fn test_grace_period_boundary() {
        let timeout_minutes = 30;
        let grace = (timeout_minutes * 60) as i64;

        let past = vec![ExistingTunnel::new(name("9.9.9.9", 0)).with_timeout_mark(NOW - grace - 1)];
        let result = reconcile(&[], &past, &params(1, timeout_minutes), NOW);
        assert_eq!(result.delta.len(), 1);
        assert!(matches!(result.delta.ops()[0], TunnelOp::Delete { .. }));

        let exact = vec![ExistingTunnel::new(name("9.9.9.9", 0)).with_timeout_mark(NOW - grace)];
        let result = reconcile(&[], &exact, &params(1, timeout_minutes), NOW);
        assert!(result.delta.is_empty());

        let within = vec![ExistingTunnel::new(name("9.9.9.9", 0)).with_timeout_mark(NOW - grace + 1)];
        let result = reconcile(&[], &within, &params(1, timeout_minutes), NOW);
        assert!(result.delta.is_empty());
        assert!(result.events.is_empty());
        assert_eq!(result.stats.waiting, 1);
    }

    #[test]
    fn test_zero_timeout_deletes_on_next_run() {
        let marked = vec![ExistingTunnel::new(name("9.9.9.9", 0)).with_timeout_mark(NOW - 1)];
        let result = reconcile(&[], &marked, &params(1, 0), NOW);
        assert!(matches!(result.delta.ops()[0], TunnelOp::Delete { .. }));

        // Marked in this very second: not older than zero seconds yet.
        let fresh = vec![ExistingTunnel::new(name("9.9.9.9", 0)).with_timeout_mark(NOW)];
        assert!(reconcile(&[], &fresh, &params(1, 0), NOW).delta.is_empty());
    }

    #[test]
    fn test_mark_in_the_future_waits() {
        let existing = vec![ExistingTunnel::new(name("9.9.9.9", 0)).with_timeout_mark(NOW + 500)];
        let result = reconcile(&[], &existing, &params(1, 0), NOW);
        assert!(result.delta.is_empty());
    }

    #[test]
    fn test_reduced_count_orphans_extra_lsps() {
        let existing = vec![
            ExistingTunnel::new(name("1.2.3.4", 0)),
            ExistingTunnel::new(name("1.2.3.4", 1)),
            ExistingTunnel::new(name("1.2.3.4", 2)),
        ];
        let result = reconcile(&[target("1.2.3.4")], &existing, &params(2, 60), NOW);
        assert_eq!(
            result.delta.ops(),
            &[TunnelOp::SetMark {
                name: name("1.2.3.4", 2),
                at: NOW,
            }]
        );
    }

    #[test]
    fn test_desired_operations_precede_orphan_operations() {
        let existing = vec![
            ExistingTunnel::new(name("9.9.9.9", 0)),
            ExistingTunnel::new(name("8.8.8.8", 0)).with_timeout_mark(NOW - 7200),
            ExistingTunnel::new(name("1.2.3.4", 0)).with_timeout_mark(NOW - 5),
        ];
        let targets = vec![target("5.5.5.5"), target("1.2.3.4")];
        let result = reconcile(&targets, &existing, &params(1, 60), NOW);

        let actions: Vec<(String, EventAction)> = result
            .events
            .iter()
            .map(|e| (e.tunnel.to_string(), e.action))
            .collect();
        assert_eq!(
            actions,
            vec![
                ("LSP-5.5.5.5-0".to_string(), EventAction::Created),
                ("LSP-1.2.3.4-0".to_string(), EventAction::TimeoutCleared),
                ("LSP-9.9.9.9-0".to_string(), EventAction::TimeoutStarted),
                ("LSP-8.8.8.8-0".to_string(), EventAction::Removed),
            ]
        );
        assert_eq!(result.events.len(), result.delta.len());
    }

    #[test]
    fn test_duplicate_targets_create_once() {
        let targets = vec![target("1.2.3.4"), target("1.2.3.4")];
        let result = reconcile(&targets, &[], &params(1, 60), NOW);
        assert_eq!(result.delta.len(), 1);
    }

    #[test]
    fn test_deterministic() {
        let existing = vec![
            ExistingTunnel::new(name("9.9.9.9", 0)),
            ExistingTunnel::new(name("8.8.8.8", 1)).with_timeout_mark(NOW - 100),
        ];
        let targets = vec![target("1.1.1.1"), target("2.2.2.2"), target("8.8.8.8")];

        let first = reconcile(&targets, &existing, &params(3, 5), NOW);
        let second = reconcile(&targets, &existing, &params(3, 5), NOW);
        assert_eq!(first, second);
    }
}
