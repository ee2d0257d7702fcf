//! Messages exchanged between rail actors.
//!
//! Requests carry a [`TrainRef`] so the component can answer the train
//! directly. Every request and response also carries the journey
//! correlation id of the leg it belongs to; trains drop responses for legs
//! they have already abandoned.

use std::fmt;

use acton_reactive::prelude::ActorHandle;

use crate::ids::{ComponentId, StationId, TrainId};
use crate::location::{Direction, Location};

/// Protocol message kinds, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    RouteRequest,
    RouteResponse,
    LockRequest,
    LockResponse,
    MoveRequest,
    MoveResponse,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A message belonging to the route/lock/move handshake.
pub trait ProtocolMessage {
    const KIND: MessageKind;

    /// Journey correlation id.
    fn journey(&self) -> &str;
}

/// The requesting train: its id plus the handle replies go to.
#[derive(Debug, Clone)]
pub struct TrainRef {
    pub id: TrainId,
    pub handle: ActorHandle,
}

// ============================================================================
// Component protocol (train -> segment/switch -> train)
// ============================================================================

/// Search for a route starting at the receiving component.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub journey: String,
    pub train: TrainRef,
    /// Where the train stands, on the receiving component
    pub position: Location,
    pub destination: Location,
    pub direction: Direction,
}

/// Result of a route search.
#[derive(Debug, Clone)]
pub struct RouteResponse {
    pub journey: String,
    /// Component the search was rooted at
    pub origin: ComponentId,
    /// Ordered route starting with `origin`, `None` if unreachable
    pub path: Option<Vec<ComponentId>>,
    /// Free-text diagnostic
    pub note: String,
}

/// Ask for exclusive occupancy of the receiving component.
#[derive(Debug, Clone)]
pub struct LockRequest {
    pub journey: String,
    pub train: TrainRef,
}

#[derive(Debug, Clone)]
pub struct LockResponse {
    pub journey: String,
    pub component: ComponentId,
    pub granted: bool,
}

/// Ask to move through the receiving component.
///
/// Granted if the component is free or already held by the same train.
#[derive(Debug, Clone)]
pub struct MoveRequest {
    pub journey: String,
    pub train: TrainRef,
}

#[derive(Debug, Clone)]
pub struct MoveResponse {
    pub journey: String,
    pub component: ComponentId,
    pub granted: bool,
}

/// Clear the receiving component's holder. Unconditional and idempotent.
#[derive(Debug, Clone)]
pub struct Release {
    pub train: TrainId,
}

// ============================================================================
// Train control
// ============================================================================

/// Start a journey toward `destination`, optionally stopping at `via` first.
#[derive(Debug, Clone)]
pub struct BeginJourney {
    pub destination: StationId,
    pub via: Option<StationId>,
}

/// A timed wait that a train scheduled for itself has elapsed.
#[derive(Debug, Clone)]
pub struct TrainWakeup {
    pub journey: String,
    pub wakeup: Wakeup,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wakeup {
    /// Ask the denied component again
    RetryLock,
    /// Backoff elapsed, restart the locking pass from the first component
    RestartLocking,
    /// Ask again for a denied move
    RetryMove,
    /// The train has reached this point
    StepComplete(Location),
}

// ============================================================================
// Station notices
// ============================================================================

#[derive(Debug, Clone)]
pub struct TrainArrived {
    pub train: TrainId,
}

#[derive(Debug, Clone)]
pub struct TrainDeparted {
    pub train: TrainId,
}

macro_rules! protocol_message {
    ($($ty:ident),* $(,)?) => {
        $(
            impl ProtocolMessage for $ty {
                const KIND: MessageKind = MessageKind::$ty;

                fn journey(&self) -> &str {
                    &self.journey
                }
            }
        )*
    };
}

protocol_message!(
    RouteRequest,
    RouteResponse,
    LockRequest,
    LockResponse,
    MoveRequest,
    MoveResponse,
);

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of<M: ProtocolMessage>(_: &M) -> MessageKind {
        M::KIND
    }

    #[test]
    fn test_kinds_and_journey() {
        let response = LockResponse {
            journey: "journey_abc".to_string(),
            component: ComponentId::Segment(crate::ids::SegmentId(3)),
            granted: false,
        };
        assert_eq!(kind_of(&response), MessageKind::LockResponse);
        assert_eq!(response.journey(), "journey_abc");
        assert_eq!(MessageKind::MoveRequest.to_string(), "MoveRequest");
    }
}
