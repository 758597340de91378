//! Tunnel lifecycle events
//!
//! Every operation the reconciler decides on is reported as one
//! [`MeshEvent`]. Events are an observability sink only: nothing reads
//! them back to make decisions.

use std::fmt;
use std::sync::Mutex;

use tracing::info;

use crate::types::TunnelName;

/// Lifecycle action taken on a tunnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    Created,
    TimeoutCleared,
    TimeoutStarted,
    Removed,
}

impl EventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::Created => "created",
            EventAction::TimeoutCleared => "timeout cleared",
            EventAction::TimeoutStarted => "timeout started",
            EventAction::Removed => "removed (timeout)",
        }
    }
}

/// One tunnel lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshEvent {
    pub tunnel: TunnelName,
    pub action: EventAction,
}

impl MeshEvent {
    pub fn new(tunnel: TunnelName, action: EventAction) -> Self {
        Self { tunnel, action }
    }
}

impl fmt::Display for MeshEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RSVP auto-tunnel-mesh: tunnel {} {}",
            self.tunnel,
            self.action.as_str()
        )
    }
}

/// Destination for tunnel lifecycle events.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &MeshEvent);
}

/// Writes events to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &MeshEvent) {
        info!(tunnel = %event.tunnel, action = event.action.as_str(), "{}", event);
    }
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<MeshEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events in order.
    pub fn events(&self) -> Vec<MeshEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Returns the recorded events rendered as log lines.
    pub fn lines(&self) -> Vec<String> {
        self.events().iter().map(ToString::to_string).collect()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &MeshEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn name() -> TunnelName {
        TunnelName::new("LSP", Ipv4Addr::new(1, 2, 3, 4), 0)
    }

    #[test]
    fn test_event_display() {
        let cases = [
            (EventAction::Created, "created"),
            (EventAction::TimeoutCleared, "timeout cleared"),
            (EventAction::TimeoutStarted, "timeout started"),
            (EventAction::Removed, "removed (timeout)"),
        ];
        for (action, text) in cases {
            assert_eq!(
                MeshEvent::new(name(), action).to_string(),
                format!("RSVP auto-tunnel-mesh: tunnel LSP-1.2.3.4-0 {}", text)
            );
        }
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        sink.record(&MeshEvent::new(name(), EventAction::Created));
        sink.record(&MeshEvent::new(name(), EventAction::TimeoutStarted));

        assert_eq!(sink.events().len(), 2);
        assert_eq!(
            sink.lines(),
            vec![
                "RSVP auto-tunnel-mesh: tunnel LSP-1.2.3.4-0 created",
                "RSVP auto-tunnel-mesh: tunnel LSP-1.2.3.4-0 timeout started",
            ]
        );
    }
}
