//! Typed signals between the widget and its host page.

use std::time::Duration;

use shopway_core::{Position, TransportMode};
use tokio::sync::broadcast;

use crate::orchestrator::PendingRequest;
use crate::sheet::drag::PointerInput;
use crate::sheet::SheetInput;
use crate::state::Field;
use crate::view_model::RouteSummary;

/// Everything that crosses the boundary to the surrounding page, in both
/// directions.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Origin picked by geolocation or by hand.
    PositionReady { lat: f64, lng: f64, label: String },
    CommerceChosen { commerce_id: i64 },
    RouteComputed { commerce_id: i64, summary: RouteSummary },
    RouteFailed { field: Field, message: String },
    /// The commerce has no configured route; its details are shown alone.
    RouteUnavailable { commerce_id: i64 },
    StopRoute,
}

/// Fan-out of outbound signals. Emitting with no subscriber is fine.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Signal>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.sender.subscribe()
    }

    pub fn emit(&self, signal: Signal) {
        if self.sender.send(signal).is_err() {
            tracing::trace!("signal emitted with no subscriber");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Inbound work for the widget event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetCommand {
    Signal(Signal),
    Sheet(SheetInput),
    Pointer(PointerInput),
    ClusterClicked(usize),
    SetTransportMode(TransportMode),
    /// The visitor panned or zoomed the map.
    ViewChanged { center: Position, zoom: f64 },
    Resize { width: f64, height: f64 },
    ToggleExpanded,
    Unmount,
}

/// Side effects the orchestrator asks its driver to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch(PendingRequest),
    ScheduleCollapse(Duration),
    CancelCollapse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_emitted_signals() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.emit(Signal::CommerceChosen { commerce_id: 7 });
        bus.emit(Signal::StopRoute);
        assert_eq!(rx.recv().await.unwrap(), Signal::CommerceChosen { commerce_id: 7 });
        assert_eq!(rx.recv().await.unwrap(), Signal::StopRoute);
    }

    #[test]
    fn emit_without_subscriber_does_not_panic() {
        let bus = EventBus::new(0);
        bus.emit(Signal::StopRoute);
    }
}
