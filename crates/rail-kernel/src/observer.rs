//! Observer hooks for occupancy and train progress.
//!
//! Actors call these synchronously from their handlers, so implementations
//! must return quickly. Anything slow belongs behind [`ChannelObserver`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::error;

use crate::ids::{ComponentId, StationId, TrainId};
use crate::journey::TrainState;
use crate::location::Location;

/// Receives network events. Every method defaults to a no-op.
pub trait NetworkObserver: Send + Sync {
    /// A segment or switch changed holder. `None` means it is now free.
    fn on_occupancy_changed(&self, _component: ComponentId, _holder: Option<TrainId>) {}

    fn on_train_state_changed(&self, _train: TrainId, _state: TrainState) {}

    fn on_train_moved(&self, _train: TrainId, _location: Location) {}

    /// Route search found nothing, or there was nowhere to start from.
    fn on_no_path_found(&self, _train: TrainId, _destination: StationId) {}

    fn on_journey_complete(&self, _train: TrainId, _destination: StationId) {}

    /// A train arrived at (`true`) or departed from (`false`) a station.
    fn on_station_traffic(&self, _station: StationId, _train: TrainId, _arrived: bool) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl NetworkObserver for NullObserver {}

/// An event forwarded by [`ChannelObserver`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrainEvent {
    Occupancy {
        component: ComponentId,
        holder: Option<TrainId>,
    },
    StateChanged {
        train: TrainId,
        state: TrainState,
    },
    Moved {
        train: TrainId,
        location: Location,
    },
    NoPathFound {
        train: TrainId,
        destination: StationId,
    },
    JourneyComplete {
        train: TrainId,
        destination: StationId,
    },
    StationTraffic {
        station: StationId,
        train: TrainId,
        arrived: bool,
    },
}

/// Forwards every event to an unbounded channel; never blocks the caller.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<TrainEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TrainEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: TrainEvent) {
        // Receiver may have been dropped
        let _ = self.tx.send(event);
    }
}

impl NetworkObserver for ChannelObserver {
    fn on_occupancy_changed(&self, component: ComponentId, holder: Option<TrainId>) {
        self.forward(TrainEvent::Occupancy { component, holder });
    }

    fn on_train_state_changed(&self, train: TrainId, state: TrainState) {
        self.forward(TrainEvent::StateChanged { train, state });
    }

    fn on_train_moved(&self, train: TrainId, location: Location) {
        self.forward(TrainEvent::Moved { train, location });
    }

    fn on_no_path_found(&self, train: TrainId, destination: StationId) {
        self.forward(TrainEvent::NoPathFound { train, destination });
    }

    fn on_journey_complete(&self, train: TrainId, destination: StationId) {
        self.forward(TrainEvent::JourneyComplete { train, destination });
    }

    fn on_station_traffic(&self, station: StationId, train: TrainId, arrived: bool) {
        self.forward(TrainEvent::StationTraffic {
            station,
            train,
            arrived,
        });
    }
}

/// Tracks current holders and counts mutual-exclusion violations.
///
/// A violation is a component being handed to a train while the ledger
/// still shows a different holder.
#[derive(Debug, Default)]
pub struct OccupancyLedger {
    holders: DashMap<ComponentId, TrainId>,
    violations: AtomicUsize,
    changes: AtomicUsize,
}

impl OccupancyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holder(&self, component: ComponentId) -> Option<TrainId> {
        self.holders.get(&component).map(|entry| *entry.value())
    }

    /// Number of components currently held.
    pub fn held_count(&self) -> usize {
        self.holders.len()
    }

    pub fn violations(&self) -> usize {
        self.violations.load(Ordering::SeqCst)
    }

    /// Total occupancy changes observed.
    pub fn changes(&self) -> usize {
        self.changes.load(Ordering::SeqCst)
    }
}

impl NetworkObserver for OccupancyLedger {
    fn on_occupancy_changed(&self, component: ComponentId, holder: Option<TrainId>) {
        self.changes.fetch_add(1, Ordering::SeqCst);
        match holder {
            Some(train) => {
                if let Some(previous) = self.holders.insert(component, train)
                    && previous != train
                {
                    self.violations.fetch_add(1, Ordering::SeqCst);
                    error!(
                        component = %component,
                        holder = %previous,
                        intruder = %train,
                        "Mutual exclusion violated"
                    );
                }
            }
            None => {
                self.holders.remove(&component);
            }
        }
    }
}

/// Delivers every event to each observer in turn.
#[derive(Default, Clone)]
pub struct FanoutObserver {
    observers: Vec<Arc<dyn NetworkObserver>>,
}

impl std::fmt::Debug for FanoutObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutObserver")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl FanoutObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn NetworkObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl NetworkObserver for FanoutObserver {
    fn on_occupancy_changed(&self, component: ComponentId, holder: Option<TrainId>) {
        for o in &self.observers {
            o.on_occupancy_changed(component, holder);
        }
    }

    fn on_train_state_changed(&self, train: TrainId, state: TrainState) {
        for o in &self.observers {
            o.on_train_state_changed(train, state);
        }
    }

    fn on_train_moved(&self, train: TrainId, location: Location) {
        for o in &self.observers {
            o.on_train_moved(train, location);
        }
    }

    fn on_no_path_found(&self, train: TrainId, destination: StationId) {
        for o in &self.observers {
            o.on_no_path_found(train, destination);
        }
    }

    fn on_journey_complete(&self, train: TrainId, destination: StationId) {
        for o in &self.observers {
            o.on_journey_complete(train, destination);
        }
    }

    fn on_station_traffic(&self, station: StationId, train: TrainId, arrived: bool) {
        for o in &self.observers {
            o.on_station_traffic(station, train, arrived);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SegmentId;

    const SEG: ComponentId = ComponentId::Segment(SegmentId(0));

    #[test]
    fn test_ledger_tracks_holders() {
        let ledger = OccupancyLedger::new();
        ledger.on_occupancy_changed(SEG, Some(TrainId(1)));
        assert_eq!(ledger.holder(SEG), Some(TrainId(1)));
        assert_eq!(ledger.held_count(), 1);

        // Re-entrant grant to the same train is fine
        ledger.on_occupancy_changed(SEG, Some(TrainId(1)));
        assert_eq!(ledger.violations(), 0);

        ledger.on_occupancy_changed(SEG, None);
        assert_eq!(ledger.holder(SEG), None);
        assert_eq!(ledger.changes(), 3);
    }

    #[test]
    fn test_ledger_counts_violation() {
        let ledger = OccupancyLedger::new();
        ledger.on_occupancy_changed(SEG, Some(TrainId(1)));
        ledger.on_occupancy_changed(SEG, Some(TrainId(2)));
        assert_eq!(ledger.violations(), 1);
    }

    #[test]
    fn test_fanout_and_channel() {
        let ledger = Arc::new(OccupancyLedger::new());
        let (channel, mut rx) = ChannelObserver::new();
        let fanout = FanoutObserver::new()
            .with(ledger.clone())
            .with(Arc::new(channel));

        fanout.on_occupancy_changed(SEG, Some(TrainId(4)));
        fanout.on_train_state_changed(TrainId(4), TrainState::Moving);

        assert_eq!(ledger.holder(SEG), Some(TrainId(4)));
        assert_eq!(
            rx.try_recv().unwrap(),
            TrainEvent::Occupancy {
                component: SEG,
                holder: Some(TrainId(4))
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            TrainEvent::StateChanged {
                train: TrainId(4),
                state: TrainState::Moving
            }
        );
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = TrainEvent::NoPathFound {
            train: TrainId(2),
            destination: StationId(1),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"event":"no_path_found","train":2,"destination":1}"#);
    }
}
